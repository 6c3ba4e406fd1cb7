use super::Transaction;
use alloy::{
    primitives::{Address, U256},
    sol,
    sol_types::SolCall,
};

sol! {
    #[derive(Debug)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

impl IERC20::transferCall {
    /// Wraps the transfer into an account [`Transaction`] against `token`.
    pub fn into_transaction(self, token: Address) -> Transaction {
        Transaction::call(token, U256::ZERO, self.abi_encode().into())
    }
}
