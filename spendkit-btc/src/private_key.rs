//! Bitcoin private key implementation.

use core::fmt;

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};
use k256::elliptic_curve::rand_core::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::encoding::{base58check_decode, base58check_encode};
use crate::public_key::PublicKey;
use crate::{Error, Network, Result};

/// secp256k1 private key plus the compression flag of its public key.
///
/// The secret scalar lives in a k256 [`SigningKey`], which zeroizes itself on
/// drop.
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
    compressed: bool,
}

impl PrivateKey {
    /// Create a new random compressed private key.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            inner: SigningKey::random(rng),
            compressed: true,
        }
    }

    /// Create a new random compressed private key from the thread RNG.
    #[cfg(feature = "rand")]
    #[must_use]
    pub fn generate() -> Self {
        Self::random(&mut rand::thread_rng())
    }

    /// Create from a raw 32-byte secret. The key is marked compressed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrivateKey`] if the bytes are not 32 long or
    /// are not a valid scalar (zero or at least the curve order).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(Error::InvalidPrivateKey);
        }
        let inner = SigningKey::from_slice(bytes).map_err(|_| Error::InvalidPrivateKey)?;
        Ok(Self {
            inner,
            compressed: true,
        })
    }

    /// Create from a 64-character hex secret, with or without `0x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex is malformed or the key is invalid.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let hex_key = hex_key.trim();
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = Zeroizing::new(hex::decode(hex_key)?);
        Self::from_bytes(&bytes)
    }

    pub(crate) const fn from_signing_key(inner: SigningKey, compressed: bool) -> Self {
        Self { inner, compressed }
    }

    /// Return a copy with the given compression flag.
    #[must_use]
    pub fn with_compression(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Check if the public key is serialized compressed.
    #[inline]
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Serialize to the raw 32-byte secret.
    #[must_use]
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.inner.to_bytes().into())
    }

    /// Serialize to lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.to_bytes().as_slice()))
    }

    /// Get the corresponding public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(*self.inner.verifying_key(), self.compressed)
    }

    pub(crate) const fn signing_key(&self) -> &SigningKey {
        &self.inner
    }

    /// Import from WIF (Wallet Import Format).
    ///
    /// Returns the key together with the network its prefix belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWif`] on a bad encoding, checksum, prefix or
    /// compression flag.
    pub fn from_wif(wif: &str) -> Result<(Self, Network)> {
        let decoded = Zeroizing::new(
            base58check_decode(wif.trim()).map_err(|e| Error::InvalidWif(e.to_string()))?,
        );

        // prefix + 32-byte key, optionally followed by the 0x01 compression flag
        let compressed = match decoded.len() {
            33 => false,
            34 if decoded[33] == 0x01 => true,
            34 => return Err(Error::InvalidWif("invalid compression flag".to_string())),
            len => return Err(Error::InvalidWif(format!("invalid length {len}"))),
        };

        let network = Network::from_wif_prefix(decoded[0]).ok_or_else(|| {
            Error::InvalidWif(format!("unknown network prefix 0x{:02x}", decoded[0]))
        })?;

        let inner = SigningKey::from_slice(&decoded[1..33]).map_err(|_| Error::InvalidPrivateKey)?;

        Ok((Self { inner, compressed }, network))
    }

    /// Export as WIF (Wallet Import Format).
    #[must_use]
    pub fn to_wif(&self, network: Network) -> Zeroizing<String> {
        let mut payload = Zeroizing::new(Vec::with_capacity(33));
        payload.extend_from_slice(&*self.to_bytes());
        if self.compressed {
            payload.push(0x01);
        }

        Zeroizing::new(base58check_encode(
            &[network.params().wif_prefix],
            &payload,
        ))
    }

    /// Sign a 32-byte digest with RFC6979 deterministic ECDSA.
    ///
    /// The signature is normalized to low-S.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signing`] if the backend rejects the digest.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<Signature> {
        let signature: Signature = self
            .inner
            .sign_prehash(digest)
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(signature.normalize_s().unwrap_or(signature))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED], compressed={})", self.compressed)
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner && self.compressed == other.compressed
    }
}

impl Eq for PrivateKey {}

impl core::str::FromStr for PrivateKey {
    type Err = Error;

    /// Parse from WIF or hex. The network of a WIF string is discarded.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if (51..=52).contains(&s.len())
            && let Ok((key, _)) = Self::from_wif(s)
        {
            return Ok(key);
        }

        Self::from_hex(s)
    }
}
