//! Bitcoin public key implementation.

use core::fmt;

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};

use crate::hash::hash160;
use crate::{Error, Result};

/// secp256k1 public key with its serialization format.
///
/// Compression matters: the compressed and uncompressed encodings of the same
/// point hash to different addresses.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
    compressed: bool,
}

impl PublicKey {
    pub(crate) const fn from_verifying_key(inner: VerifyingKey, compressed: bool) -> Self {
        Self { inner, compressed }
    }

    /// Parse a SEC1 encoded key: 33 bytes compressed or 65 bytes uncompressed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPublicKey`] for any other length or a point
    /// that is not on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let compressed = match bytes.len() {
            33 => true,
            65 => false,
            _ => return Err(Error::InvalidPublicKey),
        };
        let inner = VerifyingKey::from_sec1_bytes(bytes).map_err(|_| Error::InvalidPublicKey)?;
        Ok(Self { inner, compressed })
    }

    /// Parse a hex encoded SEC1 key.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex or the key is invalid.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(hex_key.trim())?)
    }

    /// Check if using compressed format.
    #[inline]
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Serialize in this key's own format (33 or 65 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner
            .to_encoded_point(self.compressed)
            .as_bytes()
            .to_vec()
    }

    /// Serialize to compressed bytes (33 bytes).
    #[must_use]
    pub fn to_compressed_bytes(&self) -> [u8; 33] {
        let point = self.inner.to_encoded_point(true);
        let mut result = [0u8; 33];
        result.copy_from_slice(point.as_bytes());
        result
    }

    /// Serialize to uncompressed bytes (65 bytes).
    #[must_use]
    pub fn to_uncompressed_bytes(&self) -> [u8; 65] {
        let point = self.inner.to_encoded_point(false);
        let mut result = [0u8; 65];
        result.copy_from_slice(point.as_bytes());
        result
    }

    /// Hex of [`Self::to_bytes`].
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// HASH160 of the serialized key, the payload of P2PKH and P2WPKH.
    #[must_use]
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }

    pub(crate) const fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }

    /// Verify an ECDSA signature over a 32-byte digest.
    ///
    /// High-S signatures are rejected.
    #[must_use]
    pub fn verify_prehash(&self, digest: &[u8; 32], signature: &Signature) -> bool {
        signature.normalize_s().is_none() && self.inner.verify_prehash(digest, signature).is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
