//! Mnemonic-backed seed holder.

use bip39::Mnemonic;
use zeroize::Zeroizing;

use crate::{Error, Result};

/// Word counts accepted by BIP39.
const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// A BIP39 mnemonic together with the seed it produces.
///
/// The seed is the only thing Bitcoin derivation needs; the mnemonic is kept
/// so that it can be shown back to the user once. Both are zeroized on drop.
///
/// The same mnemonic with a different passphrase yields an unrelated seed.
#[derive(Debug)]
pub struct Wallet {
    mnemonic: Zeroizing<String>,
    seed: Zeroizing<[u8; 64]>,
    has_passphrase: bool,
}

impl Wallet {
    /// Generate a new wallet with a random mnemonic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWordCount`] unless `word_count` is 12, 15, 18,
    /// 21 or 24.
    #[cfg(feature = "rand")]
    pub fn generate(word_count: usize, passphrase: Option<&str>) -> Result<Self> {
        if !VALID_WORD_COUNTS.contains(&word_count) {
            return Err(Error::InvalidWordCount(word_count));
        }

        let mnemonic = Mnemonic::generate(word_count)?;
        Ok(Self::from_parsed(&mnemonic, passphrase))
    }

    /// Create a wallet from raw entropy (16, 20, 24, 28 or 32 bytes).
    ///
    /// # Errors
    ///
    /// Returns an error if the entropy length is invalid.
    pub fn from_entropy(entropy: &[u8], passphrase: Option<&str>) -> Result<Self> {
        let mnemonic = Mnemonic::from_entropy(entropy)?;
        Ok(Self::from_parsed(&mnemonic, passphrase))
    }

    /// Create a wallet from an existing mnemonic phrase.
    ///
    /// # Errors
    ///
    /// Returns an error if the phrase is not a valid BIP39 mnemonic.
    pub fn from_mnemonic(phrase: &str, passphrase: Option<&str>) -> Result<Self> {
        let mnemonic: Mnemonic = phrase.parse()?;
        Ok(Self::from_parsed(&mnemonic, passphrase))
    }

    fn from_parsed(mnemonic: &Mnemonic, passphrase: Option<&str>) -> Self {
        let passphrase = passphrase.unwrap_or("");

        Self {
            mnemonic: Zeroizing::new(mnemonic.to_string()),
            seed: Zeroizing::new(mnemonic.to_seed(passphrase)),
            has_passphrase: !passphrase.is_empty(),
        }
    }

    /// The mnemonic phrase.
    ///
    /// **Security Warning**: this value reconstructs every derived key.
    #[inline]
    #[must_use]
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// The 64-byte seed used as BIP32 input.
    #[inline]
    #[must_use]
    pub fn seed(&self) -> &[u8; 64] {
        &self.seed
    }

    /// Whether a non-empty passphrase was mixed into the seed.
    #[must_use]
    pub const fn has_passphrase(&self) -> bool {
        self.has_passphrase
    }

    /// Number of words in the mnemonic.
    #[inline]
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.mnemonic.split_whitespace().count()
    }
}
