//! Standard (non-HD) Bitcoin wallet implementation.
//!
//! A standard wallet uses a single private key, without mnemonic or HD
//! derivation.

use zeroize::Zeroizing;

use crate::address::Address;
use crate::keypair::KeyPair;
use crate::{AddressType, Network, Result};

/// A standard Bitcoin wallet with a single private key.
///
/// # Example
///
/// ```
/// use spendkit_btc::{AddressType, Network, StandardWallet};
///
/// let wallet = StandardWallet::generate(Network::Testnet, AddressType::P2wpkh).unwrap();
/// assert!(wallet.address_string().starts_with("tb1q"));
/// ```
#[derive(Debug, Clone)]
pub struct StandardWallet {
    key_pair: KeyPair,
    address: Address,
    address_type: AddressType,
}

impl StandardWallet {
    /// Wrap an existing key pair.
    ///
    /// # Errors
    ///
    /// Returns an error if a segwit type is requested for an uncompressed key.
    pub fn from_key_pair(key_pair: KeyPair, address_type: AddressType) -> Result<Self> {
        let address = key_pair.address(address_type)?;
        Ok(Self {
            key_pair,
            address,
            address_type,
        })
    }

    /// Generate a new standard wallet with a random private key.
    ///
    /// # Errors
    ///
    /// Generated keys are compressed, so every address type succeeds.
    #[cfg(feature = "rand")]
    pub fn generate(network: Network, address_type: AddressType) -> Result<Self> {
        Self::from_key_pair(KeyPair::generate(network), address_type)
    }

    /// Import a wallet from a WIF (Wallet Import Format) private key.
    ///
    /// The network is taken from the WIF prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the WIF is invalid, or an uncompressed WIF is
    /// used with a segwit address type.
    pub fn from_wif(wif: &str, address_type: AddressType) -> Result<Self> {
        Self::from_key_pair(KeyPair::from_wif(wif)?, address_type)
    }

    /// Import a wallet from a hex-encoded private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex is invalid.
    pub fn from_private_key_hex(
        hex_key: &str,
        network: Network,
        address_type: AddressType,
    ) -> Result<Self> {
        Self::from_key_pair(
            KeyPair::from_private_key_hex(hex_key, network)?,
            address_type,
        )
    }

    /// Get the private key in hex format (zeroized on drop).
    #[inline]
    #[must_use]
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        self.key_pair.private_key().to_hex()
    }

    /// Get the private key in WIF format (zeroized on drop).
    #[inline]
    #[must_use]
    pub fn private_key_wif(&self) -> Zeroizing<String> {
        self.key_pair.to_wif()
    }

    /// Get the public key in hex format.
    #[inline]
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        self.key_pair.public_key().to_hex()
    }

    /// Hex of the P2WPKH redeem script, for P2SH-P2WPKH wallets only.
    #[must_use]
    pub fn redeem_script_hex(&self) -> Option<String> {
        match self.address_type {
            AddressType::P2shP2wpkh => self.key_pair.redeem_script().ok().map(|s| s.to_hex()),
            AddressType::P2pkh | AddressType::P2wpkh => None,
        }
    }

    /// Get the Bitcoin address.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Get the address as a string.
    #[inline]
    #[must_use]
    pub fn address_string(&self) -> String {
        self.address.to_string()
    }

    /// The underlying key pair.
    #[must_use]
    pub const fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Get the network.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.key_pair.network()
    }

    /// Get the address type.
    #[must_use]
    pub const fn address_type(&self) -> AddressType {
        self.address_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "rand")]
    #[test]
    fn test_generate_each_type() {
        let legacy = StandardWallet::generate(Network::Mainnet, AddressType::P2pkh).unwrap();
        assert!(legacy.address_string().starts_with('1'));

        let nested = StandardWallet::generate(Network::Mainnet, AddressType::P2shP2wpkh).unwrap();
        assert!(nested.address_string().starts_with('3'));
        assert!(nested.redeem_script_hex().is_some());

        let native = StandardWallet::generate(Network::Testnet, AddressType::P2wpkh).unwrap();
        assert!(native.address_string().starts_with("tb1q"));
        assert_eq!(native.network(), Network::Testnet);
    }

    #[test]
    fn test_from_wif() {
        let wallet = StandardWallet::from_wif(
            "cQgGRrrWJupvyoVCRJws9onkaTK9XBtuUUL7sXVz8JcLZbTPgHkc",
            AddressType::P2shP2wpkh,
        )
        .unwrap();
        assert_eq!(wallet.address_string(), "2NGXWDDCsPFXJ3M6TJHcvYBuGix3AgWF7Nh");
        assert_eq!(
            wallet.redeem_script_hex().as_deref(),
            Some("00143bbb347d7904b15468493dbae780aeb35fdf876c")
        );
    }

    #[test]
    fn test_from_private_key_hex() {
        let wallet = StandardWallet::from_private_key_hex(
            "0x0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d",
            Network::Mainnet,
            AddressType::P2pkh,
        )
        .unwrap();
        assert_eq!(
            wallet.private_key_wif().as_str(),
            "KwdMAjGmerYanjeui5SHS7JkmpZvVipYvB2LJGU1ZxJwYvP98617"
        );
        assert_eq!(
            wallet.private_key_hex().as_str(),
            "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d"
        );
        assert!(wallet.redeem_script_hex().is_none());
    }

    #[test]
    fn test_uncompressed_wif_rejects_segwit() {
        let wif = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ";
        assert!(StandardWallet::from_wif(wif, AddressType::P2wpkh).is_err());
        assert!(StandardWallet::from_wif(wif, AddressType::P2pkh).is_ok());
    }

    #[test]
    fn test_invalid_hex() {
        assert!(
            StandardWallet::from_private_key_hex("zz", Network::Mainnet, AddressType::P2wpkh)
                .is_err()
        );
    }
}
