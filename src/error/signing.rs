use thiserror::Error;

/// Errors produced while signing with the keyset.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The signer returned an empty signature.
    ///
    /// Displays as [`SIGNATURE_MISSING`](super::SIGNATURE_MISSING).
    #[error("signature missing")]
    MissingSignature,
    /// No key exists at the requested index.
    #[error("no key at keyset index {0}")]
    UnknownKey(usize),
    /// The key at the requested index has no signer attached.
    #[error("key at keyset index {0} cannot sign")]
    NotASigner(usize),
    /// The underlying signer failed.
    #[error(transparent)]
    Signer(#[from] eyre::Error),
}
