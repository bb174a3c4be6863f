//! Error types for Bitcoin key, address and transaction operations.

use crate::Network;

/// Reasons an address string or output script could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AddressDecodeError {
    /// The string contains characters outside the Base58 alphabet.
    #[error("invalid base58 encoding")]
    InvalidBase58,
    /// The Base58Check checksum does not match the payload.
    #[error("base58 checksum mismatch")]
    InvalidChecksum,
    /// The decoded payload has the wrong length.
    #[error("invalid payload length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected payload length in bytes.
        expected: usize,
        /// Actual payload length in bytes.
        actual: usize,
    },
    /// The version byte is not known on any supported network.
    #[error("unknown address version byte 0x{0:02x}")]
    UnknownVersion(u8),
    /// The address belongs to a different network than requested.
    #[error("address is not valid on {expected}")]
    WrongNetwork {
        /// The network the caller asked for.
        expected: Network,
    },
    /// The Bech32 payload is malformed.
    #[error("invalid bech32 address: {0}")]
    Bech32(String),
    /// The output script matches no address template.
    #[error("script has no address form")]
    UnrecognizedScript,
}

/// Errors that can occur during Bitcoin wallet and transaction operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Address or output script decoding failed.
    #[error("address decode error: {0}")]
    AddressDecode(#[from] AddressDecodeError),
    /// The seed is not usable as BIP32 input.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),
    /// A child index is outside the 31-bit range.
    #[error("invalid child index {0}, must be below 2^31")]
    InvalidChildIndex(u32),
    /// A derivation path string could not be parsed.
    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),
    /// A derivation step produced an invalid key (IL >= n or zero key).
    #[error("derivation produced an invalid key at index {0}")]
    InvalidDerivedKey(u32),
    /// The derivation tree is limited to 255 levels.
    #[error("maximum derivation depth exceeded")]
    MaxDepthExceeded,
    /// Hardened children cannot be derived from a public key.
    #[error("hardened derivation requires a private key")]
    HardenedDerivationRequired,
    /// An xprv / xpub string could not be parsed.
    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),
    /// A transaction output cannot be built.
    #[error("invalid output {index}: {reason}")]
    InvalidOutput {
        /// Position of the offending output.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
    /// Outputs spend more than the inputs provide.
    #[error("insufficient funds: inputs provide {available} sat, outputs need {required} sat")]
    InsufficientFunds {
        /// Sum of input amounts.
        available: u64,
        /// Sum of output amounts.
        required: u64,
    },
    /// The transaction structure is invalid.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// An input index does not exist.
    #[error("input index {index} out of range ({count} inputs)")]
    InputIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of inputs in the transaction.
        count: usize,
    },
    /// Serialization was requested before every input was signed.
    #[error("transaction is not finalized: {signed} of {total} inputs signed")]
    NotFinalized {
        /// Inputs that carry a signature.
        signed: usize,
        /// Total number of inputs.
        total: usize,
    },
    /// The key, the input type and the spent script do not agree.
    #[error("signing error: {0}")]
    Signing(String),
    /// The spent scriptPubKey is not a supported input type.
    #[error("unsupported input script: {0}")]
    InvalidInputType(String),
    /// Invalid secp256k1 private key.
    #[error("invalid private key")]
    InvalidPrivateKey,
    /// Invalid secp256k1 public key.
    #[error("invalid public key")]
    InvalidPublicKey,
    /// Invalid WIF string.
    #[error("invalid WIF: {0}")]
    InvalidWif(String),
    /// Invalid hex input.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// Mnemonic / seed error from the core crate.
    #[error(transparent)]
    Wallet(#[from] spendkit_core::Error),
}
