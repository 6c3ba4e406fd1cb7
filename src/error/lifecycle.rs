use thiserror::Error;

/// Errors raised by the account lifecycle gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The account has not been initialized yet.
    #[error(
        "The smartAccount instance has not been initialized, please initialize the smartAccount"
    )]
    Uninitialized,
    /// The account was destroyed and must be discarded.
    #[error(
        "The smartAccount instance has been destroyed, please reinitialize a new smartAccount"
    )]
    Destroyed,
}
