//! Hash functions used by Bitcoin key, address and transaction code.

use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

type HmacSha512 = Hmac<Sha512>;

/// Compute SHA-256.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute double SHA-256 (txids, sighashes, Base58Check checksums).
#[inline]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute RIPEMD-160.
#[inline]
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// Compute HASH160, RIPEMD-160 over SHA-256.
#[inline]
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// Compute HMAC-SHA512 and split the output into its left and right halves.
pub fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> ([u8; 32], [u8; 32]) {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    let result = mac.finalize().into_bytes();

    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&result[..32]);
    right.copy_from_slice(&result[32..]);
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_double_sha256_empty() {
        assert_eq!(
            hex::encode(double_sha256(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_ripemd160_hello() {
        assert_eq!(
            hex::encode(ripemd160(b"hello")),
            "108f07b8382412612c048d07d13f814118445acd"
        );
    }

    #[test]
    fn test_hash160_hello() {
        assert_eq!(
            hex::encode(hash160(b"hello")),
            "b6a9c8c230722b7c748331a8b450f05566dc7d0f"
        );
    }

    #[test]
    fn test_hmac_sha512_bip32_master() {
        let seed = hex_literal::hex!("000102030405060708090a0b0c0d0e0f");
        let (key, chain_code) = hmac_sha512(b"Bitcoin seed", &[&seed[..]]);
        assert_eq!(
            hex::encode(key),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
        assert_eq!(
            hex::encode(chain_code),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
    }
}
