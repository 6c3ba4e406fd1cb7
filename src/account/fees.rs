//! Fee discovery and payment.

use crate::{
    error::AccountError,
    relayer::Relayer,
    types::{
        FeeOption, IERC20, RelayerSimulateResult, SimulateResult, SimulatedFeeToken, Transaction,
        rpc::SimulateArgs,
    },
};
use alloy::primitives::{Bytes, U256};
use tracing::{debug, instrument};

/// Decimals assumed for fee tokens that do not report any.
pub const DEFAULT_FEE_TOKEN_DECIMALS: u8 = 18;

/// Scale applied to USD prices before they enter integer arithmetic.
const PRICE_SCALE: f64 = 1e8;

/// Negotiates the relaying fee of execute calls.
#[derive(Clone, Copy)]
pub struct FeeNegotiator<'a> {
    relayer: &'a dyn Relayer,
}

impl<'a> FeeNegotiator<'a> {
    /// Creates a negotiator simulating through `relayer`.
    pub fn new(relayer: &'a dyn Relayer) -> Self {
        Self { relayer }
    }

    /// Simulates the execute call of `args` and prices each candidate fee token.
    #[instrument(skip_all, fields(target = %args.target, token = ?args.token))]
    pub async fn simulate(&self, args: &SimulateArgs) -> Result<SimulateResult, AccountError> {
        let result = self.relayer.simulate(args).await.map_err(AccountError::simulating)?;
        debug!(is_fee_required = result.is_fee_required, tokens = result.fee_tokens.len());
        fee_options(result)
    }

    /// Builds the call paying `fee`.
    ///
    /// Returns `None` without a fee or for a zero amount. Native fees are plain value
    /// transfers, token fees are ERC-20 transfers.
    pub fn build_fee_call(fee: Option<&FeeOption>) -> Option<Transaction> {
        let fee = fee.filter(|fee| !fee.amount.is_zero())?;
        if fee.is_native() {
            return Some(Transaction::call(fee.to, fee.amount, Bytes::new()));
        }
        Some(IERC20::transferCall { to: fee.to, amount: fee.amount }.into_transaction(fee.token))
    }
}

impl std::fmt::Debug for FeeNegotiator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeeNegotiator").finish_non_exhaustive()
    }
}

/// Prices the fee tokens of a relayer simulation.
///
/// Tokens whose amount cannot be computed keep an amount of zero and carry the reason in
/// [`FeeOption::error`].
pub fn fee_options(result: RelayerSimulateResult) -> Result<SimulateResult, AccountError> {
    if !result.is_fee_required {
        return Ok(SimulateResult { is_fee_required: false, fee_options: Vec::new() });
    }

    let fee_options = result
        .fee_tokens
        .into_iter()
        .map(|token| {
            let decimals = token.decimals.unwrap_or(DEFAULT_FEE_TOKEN_DECIMALS);
            if decimals > DEFAULT_FEE_TOKEN_DECIMALS {
                return Err(AccountError::SimulationFailed(format!(
                    "fee token {} has {decimals} decimals",
                    token.token
                )));
            }
            let (amount, error) =
                match fee_amount(result.gas_price, result.discount, decimals, &token) {
                    Ok(amount) => (amount, token.error),
                    Err(err) => (U256::ZERO, Some(token.error.unwrap_or(err))),
                };
            Ok(FeeOption {
                token: token.token,
                to: result.fee_receiver,
                amount,
                decimals,
                name: token.name,
                symbol: token.symbol,
                error,
            })
        })
        .collect::<Result<_, _>>()?;

    Ok(SimulateResult { is_fee_required: true, fee_options })
}

/// Computes the fee owed in `token`, in its smallest unit.
///
/// ```text
/// gasPrice * gasUsed * ceil(nativePrice * 1e8) * discount
///     / ceil(tokenPrice * 1e8) / 100 / 10^(18 - decimals) + 1
/// ```
///
/// Divisions truncate. The trailing `+ 1` keeps rounding from underpaying the relayer.
pub fn fee_amount(
    gas_price: U256,
    discount: u64,
    decimals: u8,
    token: &SimulatedFeeToken,
) -> Result<U256, String> {
    let native_price = scaled_price(token.native_token_price)?;
    let token_price = scaled_price(token.token_price)?;
    if token_price.is_zero() {
        return Err(format!("fee token {} has no price", token.token));
    }
    let exponent = DEFAULT_FEE_TOKEN_DECIMALS
        .checked_sub(decimals)
        .ok_or_else(|| format!("fee token {} has {decimals} decimals", token.token))?;

    let overflow = || format!("fee amount of {} overflows", token.token);
    let amount = gas_price
        .checked_mul(token.gas_used)
        .and_then(|v| v.checked_mul(native_price))
        .and_then(|v| v.checked_mul(U256::from(discount)))
        .ok_or_else(overflow)?;

    Ok(amount / token_price / U256::from(100) / U256::from(10).pow(U256::from(exponent))
        + U256::from(1))
}

/// `ceil(price * 1e8)` as an integer.
fn scaled_price(price: f64) -> Result<U256, String> {
    let scaled = (price * PRICE_SCALE).ceil();
    if !scaled.is_finite() || scaled < 0.0 || scaled > u128::MAX as f64 {
        return Err(format!("invalid token price {price}"));
    }
    Ok(U256::from(scaled as u128))
}
