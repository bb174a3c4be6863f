//! Bitcoin address derivation from a seed.

use spendkit_core::Wallet;
use tracing::debug;
use zeroize::Zeroizing;

use crate::extended_key::ExtendedPrivateKey;
use crate::keypair::KeyPair;
use crate::path::DerivationPath;
use crate::{AddressType, Error, Network, Result};

/// Derive the key pair at `path` from a raw seed.
///
/// # Errors
///
/// Returns [`Error::InvalidSeed`] for a seed outside 16 to 64 bytes and any
/// derivation error along the path.
pub fn derive(seed: &[u8], path: &DerivationPath, network: Network) -> Result<KeyPair> {
    Ok(ExtendedPrivateKey::from_seed(seed, network)?
        .derive_path(path)?
        .to_key_pair())
}

/// Bitcoin address deriver from a wallet seed.
///
/// Follows BIP32 with BIP44/49/84 path layouts. The purpose of a path only
/// selects the address encoding; key derivation is the same for all of them.
#[derive(Debug)]
pub struct Deriver {
    master_key: ExtendedPrivateKey,
    network: Network,
}

/// A derived Bitcoin address with associated keys.
#[derive(Debug)]
pub struct DerivedAddress {
    /// Derivation path used.
    pub path: DerivationPath,
    /// Private key in WIF format.
    pub private_key_wif: Zeroizing<String>,
    /// Public key in hex format.
    pub public_key_hex: String,
    /// Bitcoin address.
    pub address: String,
    /// Redeem script hex, present for P2SH-P2WPKH only.
    pub redeem_script_hex: Option<String>,
    /// Address type.
    pub address_type: AddressType,
}

impl Deriver {
    /// Create a new Bitcoin deriver from a wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the master key derivation fails.
    pub fn new(wallet: &Wallet, network: Network) -> Result<Self> {
        Self::from_seed(wallet.seed(), network)
    }

    /// Create a deriver from a raw 16 to 64 byte seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeed`] for a seed of any other length.
    pub fn from_seed(seed: &[u8], network: Network) -> Result<Self> {
        Ok(Self {
            master_key: ExtendedPrivateKey::from_seed(seed, network)?,
            network,
        })
    }

    /// Create a deriver from a hex encoded seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeed`] if the hex does not decode or has the
    /// wrong length.
    pub fn from_seed_hex(seed_hex: &str, network: Network) -> Result<Self> {
        Ok(Self {
            master_key: ExtendedPrivateKey::from_seed_hex(seed_hex, network)?,
            network,
        })
    }

    /// Derive an address using BIP44/49/84 standard path.
    ///
    /// # Arguments
    ///
    /// * `address_type` - Type of address (determines BIP purpose: 44/49/84)
    /// * `account` - Account index (usually 0)
    /// * `change` - Whether this is a change address
    /// * `address_index` - Address index within the account
    ///
    /// # Errors
    ///
    /// Returns an error if derivation fails.
    pub fn derive(
        &self,
        address_type: AddressType,
        account: u32,
        change: bool,
        address_index: u32,
    ) -> Result<DerivedAddress> {
        let path =
            DerivationPath::bip_standard(address_type, self.network, account, change, address_index)?;
        self.derive_at_path(&path, address_type)
    }

    /// Derive an address at a custom derivation path.
    ///
    /// # Errors
    ///
    /// Returns an error if derivation fails.
    pub fn derive_at_path(
        &self,
        path: &DerivationPath,
        address_type: AddressType,
    ) -> Result<DerivedAddress> {
        let key_pair = self.derive_key(path)?;
        let address = key_pair.address(address_type)?;
        let redeem_script_hex = match address_type {
            AddressType::P2shP2wpkh => Some(key_pair.redeem_script()?.to_hex()),
            AddressType::P2pkh | AddressType::P2wpkh => None,
        };

        debug!(%path, %address, ?address_type, "derived address");

        Ok(DerivedAddress {
            path: path.clone(),
            private_key_wif: key_pair.to_wif(),
            public_key_hex: key_pair.public_key().to_hex(),
            address: address.to_string(),
            redeem_script_hex,
            address_type,
        })
    }

    /// Derive an address, choosing its type from the path's purpose
    /// (44, 49 or 84).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDerivationPath`] if the first step is not a
    /// hardened 44, 49 or 84.
    pub fn derive_by_purpose(&self, path: &DerivationPath) -> Result<DerivedAddress> {
        let address_type = path
            .purpose()
            .and_then(AddressType::from_purpose)
            .ok_or_else(|| {
                Error::InvalidDerivationPath(format!(
                    "'{path}' does not start with purpose 44', 49' or 84'"
                ))
            })?;
        self.derive_at_path(path, address_type)
    }

    /// Derive multiple addresses in sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if any derivation fails.
    pub fn derive_many(
        &self,
        address_type: AddressType,
        account: u32,
        change: bool,
        start_index: u32,
        count: u32,
    ) -> Result<Vec<DerivedAddress>> {
        let end = start_index
            .checked_add(count)
            .ok_or(Error::InvalidChildIndex(u32::MAX))?;
        (start_index..end)
            .map(|index| self.derive(address_type, account, change, index))
            .collect()
    }

    /// Derive the key pair at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if derivation fails.
    pub fn derive_key(&self, path: &DerivationPath) -> Result<KeyPair> {
        Ok(self.master_key.derive_path(path)?.to_key_pair())
    }

    /// The master extended private key.
    #[must_use]
    pub const fn master_key(&self) -> &ExtendedPrivateKey {
        &self.master_key
    }

    /// Get the network.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const TEST_SEED_1: &[u8] = &hex_literal::hex!("000102030405060708090a0b0c0d0e0f");

    fn test_wallet() -> Wallet {
        Wallet::from_mnemonic(TEST_MNEMONIC, None).unwrap()
    }

    #[test]
    fn test_derive_p2wpkh() {
        let wallet = test_wallet();
        let deriver = Deriver::new(&wallet, Network::Mainnet).unwrap();
        let addr = deriver.derive(AddressType::P2wpkh, 0, false, 0).unwrap();

        assert_eq!(addr.address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
        assert_eq!(addr.path.to_string(), "m/84'/0'/0'/0/0");
        assert_eq!(
            addr.private_key_wif.as_str(),
            "KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d"
        );
        assert!(addr.redeem_script_hex.is_none());
    }

    #[test]
    fn test_derive_p2pkh() {
        let wallet = test_wallet();
        let deriver = Deriver::new(&wallet, Network::Mainnet).unwrap();
        let addr = deriver.derive(AddressType::P2pkh, 0, false, 0).unwrap();

        assert_eq!(addr.address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
        assert_eq!(addr.path.to_string(), "m/44'/0'/0'/0/0");
    }

    #[test]
    fn test_derive_p2sh() {
        let wallet = test_wallet();
        let deriver = Deriver::new(&wallet, Network::Mainnet).unwrap();
        let addr = deriver
            .derive(AddressType::P2shP2wpkh, 0, false, 0)
            .unwrap();

        assert_eq!(addr.address, "37VucYSaXLCAsxYyAPfbSi9eh4iEcbShgf");
        assert_eq!(addr.path.to_string(), "m/49'/0'/0'/0/0");
        assert!(addr.redeem_script_hex.unwrap().starts_with("0014"));
    }

    #[test]
    fn test_derive_from_seed_testnet() {
        let deriver = Deriver::from_seed(TEST_SEED_1, Network::Testnet).unwrap();
        let path: DerivationPath = "m/84'/1'/0'/0/0".parse().unwrap();
        let addr = deriver.derive_by_purpose(&path).unwrap();

        assert_eq!(addr.address, "tb1q7f0pjwhc3jzzv0w4uurm589506glv2dg2qy7ze");
        assert_eq!(
            addr.private_key_wif.as_str(),
            "cVVdic9ir4UjZsSXgds6fCRAD1GEYnhVZLNgfDKH31g67Q21yF38"
        );
        assert_eq!(addr.address_type, AddressType::P2wpkh);
    }

    #[test]
    fn test_derive_by_purpose_selects_encoding() {
        let deriver = Deriver::from_seed_hex("000102030405060708090a0b0c0d0e0f", Network::Testnet)
            .unwrap();

        let legacy = deriver
            .derive_by_purpose(&"m/44'/1'/0'/0/0".parse().unwrap())
            .unwrap();
        assert_eq!(legacy.address, "mr2WYNhNLNzTUmaSo9w5LKQDpth5umfk9Y");

        let nested = deriver
            .derive_by_purpose(&"m/49'/1'/0'/0/0".parse().unwrap())
            .unwrap();
        assert_eq!(nested.address, "2NGXWDDCsPFXJ3M6TJHcvYBuGix3AgWF7Nh");
        assert_eq!(
            nested.redeem_script_hex.as_deref(),
            Some("00143bbb347d7904b15468493dbae780aeb35fdf876c")
        );

        assert!(matches!(
            deriver.derive_by_purpose(&"m/86'/1'/0'/0/0".parse().unwrap()),
            Err(Error::InvalidDerivationPath(_))
        ));
    }

    #[test]
    fn test_free_derive_matches_deriver() {
        let path: DerivationPath = "m/84'/0'/0'/0/0".parse().unwrap();
        let key_pair = derive(TEST_SEED_1, &path, Network::Mainnet).unwrap();
        assert_eq!(
            key_pair.address(AddressType::P2wpkh).unwrap().as_str(),
            "bc1qpux3z758ulsxg69eptaakukraanqwtdxe5yy4c"
        );
    }

    #[test]
    fn test_one_segment_changes_address() {
        let deriver = Deriver::from_seed(TEST_SEED_1, Network::Mainnet).unwrap();
        let first = deriver.derive(AddressType::P2wpkh, 0, false, 0).unwrap();
        let change = deriver.derive(AddressType::P2wpkh, 0, true, 0).unwrap();
        let again = deriver.derive(AddressType::P2wpkh, 0, false, 0).unwrap();
        assert_ne!(first.address, change.address);
        assert_eq!(first.address, again.address);
    }

    #[test]
    fn test_invalid_seed() {
        assert!(matches!(
            Deriver::from_seed(&[0u8; 8], Network::Mainnet),
            Err(Error::InvalidSeed(_))
        ));
        assert!(matches!(
            Deriver::from_seed_hex("not hex", Network::Mainnet),
            Err(Error::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_derive_many() {
        let wallet = test_wallet();
        let deriver = Deriver::new(&wallet, Network::Mainnet).unwrap();
        let addrs = deriver
            .derive_many(AddressType::P2wpkh, 0, false, 0, 5)
            .unwrap();

        assert_eq!(addrs.len(), 5);
        let mut seen: Vec<&str> = addrs.iter().map(|a| a.address.as_str()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_passphrase_changes_addresses() {
        let wallet1 = Wallet::from_mnemonic(TEST_MNEMONIC, None).unwrap();
        let wallet2 = Wallet::from_mnemonic(TEST_MNEMONIC, Some("password")).unwrap();

        let deriver1 = Deriver::new(&wallet1, Network::Mainnet).unwrap();
        let deriver2 = Deriver::new(&wallet2, Network::Mainnet).unwrap();

        let addr1 = deriver1.derive(AddressType::P2wpkh, 0, false, 0).unwrap();
        let addr2 = deriver2.derive(AddressType::P2wpkh, 0, false, 0).unwrap();

        assert_ne!(addr1.address, addr2.address);
    }
}
