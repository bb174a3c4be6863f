//! A private key bound to its public key and network.

use zeroize::Zeroizing;

use crate::address::{Address, p2wpkh_script};
use crate::private_key::PrivateKey;
use crate::public_key::PublicKey;
use crate::script::Script;
use crate::{AddressType, Network, Result};

/// Key material for one address: private key, its public key and the network
/// its encodings target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
    network: Network,
}

impl KeyPair {
    /// Bind a private key to a network.
    #[must_use]
    pub fn new(private_key: PrivateKey, network: Network) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
            network,
        }
    }

    /// Generate a random compressed key pair.
    #[cfg(feature = "rand")]
    #[must_use]
    pub fn generate(network: Network) -> Self {
        Self::new(PrivateKey::generate(), network)
    }

    /// Import a WIF key; the network comes from its prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the WIF is invalid.
    pub fn from_wif(wif: &str) -> Result<Self> {
        let (private_key, network) = PrivateKey::from_wif(wif)?;
        Ok(Self::new(private_key, network))
    }

    /// Import a raw 32-byte secret as a compressed key.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid secret.
    pub fn from_bytes(bytes: &[u8], network: Network) -> Result<Self> {
        Ok(Self::new(PrivateKey::from_bytes(bytes)?, network))
    }

    /// Import a hex secret as a compressed key.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex or the secret is invalid.
    pub fn from_private_key_hex(hex_key: &str, network: Network) -> Result<Self> {
        Ok(Self::new(PrivateKey::from_hex(hex_key)?, network))
    }

    /// The private key.
    #[inline]
    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The public key.
    #[inline]
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The network.
    #[inline]
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Whether the public key is serialized compressed.
    #[inline]
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.private_key.is_compressed()
    }

    /// The private key in WIF for this pair's network.
    #[must_use]
    pub fn to_wif(&self) -> Zeroizing<String> {
        self.private_key.to_wif(self.network)
    }

    /// The address of the given type.
    ///
    /// # Errors
    ///
    /// Segwit types fail for an uncompressed key.
    pub fn address(&self, address_type: AddressType) -> Result<Address> {
        Address::from_public_key(&self.public_key, self.network, address_type)
    }

    /// The scriptPubKey that the address of the given type pays to.
    ///
    /// # Errors
    ///
    /// Segwit types fail for an uncompressed key.
    pub fn script_pubkey(&self, address_type: AddressType) -> Result<Script> {
        Ok(self.address(address_type)?.script_pubkey().clone())
    }

    /// The P2WPKH program used as the P2SH-P2WPKH redeem script.
    ///
    /// # Errors
    ///
    /// Fails for an uncompressed key.
    pub fn redeem_script(&self) -> Result<Script> {
        p2wpkh_script(&self.public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TESTNET_WIF: &str = "cVVdic9ir4UjZsSXgds6fCRAD1GEYnhVZLNgfDKH31g67Q21yF38";

    #[test]
    fn test_from_wif_addresses() {
        let pair = KeyPair::from_wif(TESTNET_WIF).unwrap();
        assert_eq!(pair.network(), Network::Testnet);
        assert_eq!(
            pair.address(AddressType::P2wpkh).unwrap().as_str(),
            "tb1q7f0pjwhc3jzzv0w4uurm589506glv2dg2qy7ze"
        );
        assert_eq!(pair.to_wif().as_str(), TESTNET_WIF);
    }

    #[test]
    fn test_redeem_script_matches_p2wpkh_output() {
        let pair = KeyPair::from_wif(TESTNET_WIF).unwrap();
        assert_eq!(
            pair.redeem_script().unwrap(),
            pair.script_pubkey(AddressType::P2wpkh).unwrap()
        );
    }

    #[cfg(feature = "rand")]
    #[test]
    fn test_generate_is_compressed() {
        let pair = KeyPair::generate(Network::Mainnet);
        assert!(pair.is_compressed());
        assert!(
            pair.address(AddressType::P2pkh)
                .unwrap()
                .as_str()
                .starts_with('1')
        );
    }

    #[test]
    fn test_from_hex_rejects_out_of_range() {
        let order = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";
        assert!(KeyPair::from_private_key_hex(order, Network::Mainnet).is_err());
    }
}
