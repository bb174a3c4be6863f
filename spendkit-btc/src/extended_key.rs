//! BIP-32 Hierarchical Deterministic (HD) key derivation.

use core::fmt;

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::PrimeField;
use k256::{NonZeroScalar, Scalar};
use zeroize::{Zeroize, Zeroizing};

use crate::encoding::{base58check_decode, base58check_encode};
use crate::hash::hmac_sha512;
use crate::keypair::KeyPair;
use crate::path::{ChildNumber, DerivationPath};
use crate::private_key::PrivateKey;
use crate::public_key::PublicKey;
use crate::xpub::ExtendedPublicKey;
use crate::{Error, Network, Result};

/// HMAC key of the master key computation.
const MASTER_KEY_SALT: &[u8] = b"Bitcoin seed";

/// Serialized extended key length, before the checksum.
pub(crate) const EXTENDED_KEY_LEN: usize = 78;

/// BIP-32 Extended Private Key.
#[derive(Clone)]
pub struct ExtendedPrivateKey {
    private_key: PrivateKey,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: ChildNumber,
    network: Network,
}

impl Drop for ExtendedPrivateKey {
    fn drop(&mut self) {
        self.chain_code.zeroize();
    }
}

impl ExtendedPrivateKey {
    /// Create the master key from a 16 to 64 byte seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeed`] for a seed of any other length and
    /// [`Error::InvalidDerivedKey`] if the master secret is out of range.
    pub fn from_seed(seed: &[u8], network: Network) -> Result<Self> {
        if !(16..=64).contains(&seed.len()) {
            return Err(Error::InvalidSeed(format!(
                "seed must be 16 to 64 bytes, got {}",
                seed.len()
            )));
        }

        let (key, chain_code) = hmac_sha512(MASTER_KEY_SALT, &[seed]);
        let key = Zeroizing::new(key);
        let signing_key =
            SigningKey::from_slice(key.as_slice()).map_err(|_| Error::InvalidDerivedKey(0))?;

        Ok(Self {
            private_key: PrivateKey::from_signing_key(signing_key, true),
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: ChildNumber::Normal(0),
            network,
        })
    }

    /// Create the master key from a hex encoded seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeed`] if the hex does not decode.
    pub fn from_seed_hex(seed_hex: &str, network: Network) -> Result<Self> {
        let seed = Zeroizing::new(
            hex::decode(seed_hex.trim()).map_err(|e| Error::InvalidSeed(e.to_string()))?,
        );
        Self::from_seed(&seed, network)
    }

    /// Derive the child key at `child`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChildIndex`] for an index `>= 2^31`,
    /// [`Error::MaxDepthExceeded`] at depth 255 and
    /// [`Error::InvalidDerivedKey`] when `IL >= n` or the child key is zero.
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self> {
        let child = child.validate()?;
        if self.depth == u8::MAX {
            return Err(Error::MaxDepthExceeded);
        }

        let index = child.to_u32().to_be_bytes();
        let (il, chain_code) = if child.is_hardened() {
            let secret = self.private_key.to_bytes();
            hmac_sha512(&self.chain_code, &[&[0u8][..], secret.as_slice(), &index[..]])
        } else {
            let public_key = self.public_key().to_compressed_bytes();
            hmac_sha512(&self.chain_code, &[&public_key[..], &index[..]])
        };
        let il = Zeroizing::new(il);

        let tweak: Option<Scalar> = Scalar::from_repr((*il).into()).into();
        let tweak = tweak.ok_or(Error::InvalidDerivedKey(child.to_u32()))?;
        let parent: Scalar = *self.private_key.signing_key().as_nonzero_scalar().as_ref();

        let child_scalar: Option<NonZeroScalar> = NonZeroScalar::new(tweak + parent).into();
        let child_scalar = child_scalar.ok_or(Error::InvalidDerivedKey(child.to_u32()))?;

        Ok(Self {
            private_key: PrivateKey::from_signing_key(SigningKey::from(child_scalar), true),
            chain_code,
            depth: self.depth + 1,
            parent_fingerprint: self.fingerprint(),
            child_number: child,
            network: self.network,
        })
    }

    /// Apply every step of `path` in order.
    ///
    /// # Errors
    ///
    /// Fails with the first error of any step.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.children()
            .iter()
            .try_fold(self.clone(), |key, child| key.derive_child(*child))
    }

    /// The private key at this node.
    #[inline]
    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The public key at this node.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    /// This node as a [`KeyPair`] on its network.
    #[must_use]
    pub fn to_key_pair(&self) -> KeyPair {
        KeyPair::new(self.private_key.clone(), self.network)
    }

    /// The neutered key for watch-only derivation.
    #[must_use]
    pub fn to_extended_public_key(&self) -> ExtendedPublicKey {
        ExtendedPublicKey::new(
            self.public_key(),
            self.chain_code,
            self.depth,
            self.parent_fingerprint,
            self.child_number,
            self.network,
        )
    }

    /// The chain code.
    #[inline]
    #[must_use]
    pub const fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Depth in the tree, 0 for the master key.
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    /// First four bytes of the parent's public key hash.
    #[inline]
    #[must_use]
    pub const fn parent_fingerprint(&self) -> &[u8; 4] {
        &self.parent_fingerprint
    }

    /// First four bytes of this key's public key hash.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 4] {
        let hash = self.public_key().hash160();
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// The child number that produced this key.
    #[inline]
    #[must_use]
    pub const fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    /// The network.
    #[inline]
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Serialize to xprv / tprv.
    #[must_use]
    pub fn to_xprv(&self) -> Zeroizing<String> {
        let mut data = Zeroizing::new(Vec::with_capacity(EXTENDED_KEY_LEN - 4));
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.to_u32().to_be_bytes());
        data.extend_from_slice(&self.chain_code);
        data.push(0x00);
        data.extend_from_slice(self.private_key.to_bytes().as_slice());

        Zeroizing::new(base58check_encode(
            &self.network.params().xprv_version,
            &data,
        ))
    }

    /// Parse an xprv / tprv string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtendedKey`] on a bad encoding, length,
    /// version or key.
    pub fn from_xprv(xprv: &str) -> Result<Self> {
        let data = Zeroizing::new(
            base58check_decode(xprv.trim()).map_err(|e| Error::InvalidExtendedKey(e.to_string()))?,
        );
        if data.len() != EXTENDED_KEY_LEN {
            return Err(Error::InvalidExtendedKey(format!(
                "expected {EXTENDED_KEY_LEN} bytes, got {}",
                data.len()
            )));
        }

        let network = Network::ALL
            .into_iter()
            .find(|network| data[..4] == network.params().xprv_version)
            .ok_or_else(|| Error::InvalidExtendedKey("unknown xprv version".to_string()))?;

        if data[45] != 0x00 {
            return Err(Error::InvalidExtendedKey(
                "private key must be prefixed with 0x00".to_string(),
            ));
        }
        let private_key = PrivateKey::from_bytes(&data[46..78])
            .map_err(|_| Error::InvalidExtendedKey("invalid private key".to_string()))?;

        let (depth, parent_fingerprint, child_number) = parse_key_origin(&data)?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        Ok(Self {
            private_key,
            chain_code,
            depth,
            parent_fingerprint,
            child_number,
            network,
        })
    }
}

/// Depth, parent fingerprint and child number of a serialized extended key.
///
/// A master key (depth 0) must have a zero fingerprint and child number.
pub(crate) fn parse_key_origin(data: &[u8]) -> Result<(u8, [u8; 4], ChildNumber)> {
    let depth = data[4];
    let parent_fingerprint = [data[5], data[6], data[7], data[8]];
    let child_number = u32::from_be_bytes([data[9], data[10], data[11], data[12]]);

    if depth == 0 && (parent_fingerprint != [0u8; 4] || child_number != 0) {
        return Err(Error::InvalidExtendedKey(
            "zero depth with non-zero parent fingerprint or child number".to_string(),
        ));
    }
    Ok((depth, parent_fingerprint, ChildNumber::from(child_number)))
}

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivateKey")
            .field("depth", &self.depth)
            .field("child_number", &self.child_number)
            .field("network", &self.network)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}
