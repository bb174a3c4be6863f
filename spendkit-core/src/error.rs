//! Error types for mnemonic and seed operations.

/// Errors that can occur while building a [`Wallet`](crate::Wallet).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid mnemonic phrase or entropy.
    #[error("mnemonic error: {0}")]
    Mnemonic(#[from] bip39::Error),
    /// Invalid word count for mnemonic generation.
    #[error("invalid word count {0}, must be 12, 15, 18, 21, or 24")]
    InvalidWordCount(usize),
}

/// A convenient Result type alias for spendkit-core operations.
pub type Result<T> = core::result::Result<T, Error>;
