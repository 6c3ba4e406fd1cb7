//! Shared primitive types.
mod call;
pub use call::*;

mod erc20;
pub use erc20::*;

mod execute;
pub use execute::*;

mod factory;
pub use factory::*;

mod fee;
pub use fee::*;

mod keyset;
pub use keyset::*;

mod receipt;
pub use receipt::*;

pub mod rpc;
