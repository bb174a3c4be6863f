//! BIP-32 Extended Public Key.
//!
//! Watch-only derivation: only non-hardened children can be derived, and the
//! result matches the public half of private derivation along the same path.

use core::fmt;

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, ProjectivePoint, Scalar};

use crate::address::Address;
use crate::encoding::{base58check_decode, base58check_encode};
use crate::extended_key::{EXTENDED_KEY_LEN, parse_key_origin};
use crate::hash::hmac_sha512;
use crate::path::{ChildNumber, DerivationPath};
use crate::public_key::PublicKey;
use crate::{AddressType, Error, Network, Result};

/// BIP-32 Extended Public Key.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    public_key: PublicKey,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: ChildNumber,
    network: Network,
}

impl ExtendedPublicKey {
    pub(crate) const fn new(
        public_key: PublicKey,
        chain_code: [u8; 32],
        depth: u8,
        parent_fingerprint: [u8; 4],
        child_number: ChildNumber,
        network: Network,
    ) -> Self {
        Self {
            public_key,
            chain_code,
            depth,
            parent_fingerprint,
            child_number,
            network,
        }
    }

    /// Derive a non-hardened child.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChildIndex`] for an index `>= 2^31`,
    /// [`Error::HardenedDerivationRequired`] for a hardened child,
    /// [`Error::MaxDepthExceeded`] at depth 255 and
    /// [`Error::InvalidDerivedKey`] when `IL >= n` or the child is the point at
    /// infinity.
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self> {
        let child = child.validate()?;
        if child.is_hardened() {
            return Err(Error::HardenedDerivationRequired);
        }
        if self.depth == u8::MAX {
            return Err(Error::MaxDepthExceeded);
        }

        let parent_bytes = self.public_key.to_compressed_bytes();
        let (il, chain_code) = hmac_sha512(
            &self.chain_code,
            &[&parent_bytes[..], &child.to_u32().to_be_bytes()[..]],
        );

        let tweak: Option<Scalar> = Scalar::from_repr(il.into()).into();
        let tweak = tweak.ok_or(Error::InvalidDerivedKey(child.to_u32()))?;

        // Ki = point(IL) + Kpar
        let parent_point = ProjectivePoint::from(*self.public_key.verifying_key().as_affine());
        let child_point = AffinePoint::from(ProjectivePoint::GENERATOR * tweak + parent_point);
        let verifying_key = VerifyingKey::from_affine(child_point)
            .map_err(|_| Error::InvalidDerivedKey(child.to_u32()))?;

        let parent_hash = self.public_key.hash160();

        Ok(Self {
            public_key: PublicKey::from_verifying_key(verifying_key, true),
            chain_code,
            depth: self.depth + 1,
            parent_fingerprint: [parent_hash[0], parent_hash[1], parent_hash[2], parent_hash[3]],
            child_number: child,
            network: self.network,
        })
    }

    /// Apply every step of `path`, all of which must be non-hardened.
    ///
    /// # Errors
    ///
    /// Fails with the first error of any step.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.children()
            .iter()
            .try_fold(self.clone(), |key, child| key.derive_child(*child))
    }

    /// The public key at this node.
    #[inline]
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The address of the given type at this node.
    ///
    /// # Errors
    ///
    /// Never fails for a key from derivation or xpub parsing, both of which
    /// are compressed.
    pub fn address(&self, address_type: AddressType) -> Result<Address> {
        Address::from_public_key(&self.public_key, self.network, address_type)
    }

    /// The chain code.
    #[inline]
    #[must_use]
    pub const fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Depth in the tree.
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

    /// Serialize to xpub / tpub.
    #[must_use]
    pub fn to_xpub(&self) -> String {
        let mut data = Vec::with_capacity(EXTENDED_KEY_LEN - 4);
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.to_u32().to_be_bytes());
        data.extend_from_slice(&self.chain_code);
        data.extend_from_slice(&self.public_key.to_compressed_bytes());

        base58check_encode(&self.network.params().xpub_version, &data)
    }

    /// Parse an xpub / tpub string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtendedKey`] on a bad encoding, length,
    /// version or point.
    pub fn from_xpub(xpub: &str) -> Result<Self> {
        let data = base58check_decode(xpub.trim())
            .map_err(|e| Error::InvalidExtendedKey(e.to_string()))?;
        if data.len() != EXTENDED_KEY_LEN {
            return Err(Error::InvalidExtendedKey(format!(
                "expected {EXTENDED_KEY_LEN} bytes, got {}",
                data.len()
            )));
        }

        let network = Network::ALL
            .into_iter()
            .find(|network| data[..4] == network.params().xpub_version)
            .ok_or_else(|| Error::InvalidExtendedKey("unknown xpub version".to_string()))?;

        let public_key = PublicKey::from_bytes(&data[45..78])
            .map_err(|_| Error::InvalidExtendedKey("invalid public key".to_string()))?;

        let (depth, parent_fingerprint, child_number) = parse_key_origin(&data)?;
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        Ok(Self {
            public_key,
            chain_code,
            depth,
            parent_fingerprint,
            child_number,
            network,
        })
    }
}

impl fmt::Debug for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPublicKey")
            .field("depth", &self.depth)
            .field("child_number", &self.child_number)
            .field("network", &self.network)
            .finish()
    }
}

impl fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xpub())
    }
}
