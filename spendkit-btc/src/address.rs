//! Bitcoin address encoding and decoding.
//!
//! Addresses are a human-readable form of an output script. This module maps
//! public keys to P2PKH, P2WPKH and P2SH-P2WPKH addresses, and converts in
//! both directions between address strings and scriptPubKeys.

use core::fmt;

use crate::encoding::{base58check_decode, base58check_encode, bech32_decode, bech32_encode};
use crate::error::AddressDecodeError;
use crate::hash::hash160;
use crate::public_key::PublicKey;
use crate::script::{Script, ScriptType};
use crate::{AddressType, Error, Network, Result};

/// An address together with the output script it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    encoded: String,
    script_pubkey: Script,
    network: Network,
}

impl Address {
    /// Legacy P2PKH address of `public_key`.
    #[must_use]
    pub fn p2pkh(public_key: &PublicKey, network: Network) -> Self {
        let hash = public_key.hash160();
        Self {
            encoded: base58check_encode(&[network.params().pubkey_hash_version], &hash),
            script_pubkey: Script::new_p2pkh(&hash),
            network,
        }
    }

    /// Native segwit P2WPKH address of `public_key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPublicKey`] for an uncompressed key.
    pub fn p2wpkh(public_key: &PublicKey, network: Network) -> Result<Self> {
        let script_pubkey = p2wpkh_script(public_key)?;
        Self::from_script(&script_pubkey, network).map_err(Error::from)
    }

    /// Wrapped segwit P2SH-P2WPKH address of `public_key`.
    ///
    /// The script hash commits to the raw bytes of the P2WPKH redeem script.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPublicKey`] for an uncompressed key.
    pub fn p2sh_p2wpkh(public_key: &PublicKey, network: Network) -> Result<Self> {
        let redeem_script = p2wpkh_script(public_key)?;
        let script_pubkey = Script::new_p2sh(&hash160(redeem_script.as_bytes()));
        Self::from_script(&script_pubkey, network).map_err(Error::from)
    }

    /// Address of `public_key` for the given type.
    ///
    /// # Errors
    ///
    /// Returns an error when a segwit type is asked for an uncompressed key.
    pub fn from_public_key(
        public_key: &PublicKey,
        network: Network,
        address_type: AddressType,
    ) -> Result<Self> {
        match address_type {
            AddressType::P2pkh => Ok(Self::p2pkh(public_key, network)),
            AddressType::P2shP2wpkh => Self::p2sh_p2wpkh(public_key, network),
            AddressType::P2wpkh => Self::p2wpkh(public_key, network),
        }
    }

    /// Parse an address string that must belong to `network`.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressDecodeError`] describing why the string is not a
    /// valid address on `network`.
    pub fn parse(address: &str, network: Network) -> core::result::Result<Self, AddressDecodeError> {
        let script_pubkey = to_output_script(address, network)?;
        let encoded = from_output_script(&script_pubkey, network)?;
        Ok(Self {
            encoded,
            script_pubkey,
            network,
        })
    }

    /// Encode an output script as an address on `network`.
    ///
    /// # Errors
    ///
    /// Returns [`AddressDecodeError::UnrecognizedScript`] for scripts without
    /// an address form.
    pub fn from_script(
        script_pubkey: &Script,
        network: Network,
    ) -> core::result::Result<Self, AddressDecodeError> {
        Ok(Self {
            encoded: from_output_script(script_pubkey, network)?,
            script_pubkey: script_pubkey.clone(),
            network,
        })
    }

    /// The encoded address string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// The output script paying to this address.
    #[inline]
    #[must_use]
    pub const fn script_pubkey(&self) -> &Script {
        &self.script_pubkey
    }

    /// The network the address belongs to.
    #[inline]
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// The template of the output script.
    #[must_use]
    pub fn script_type(&self) -> Option<ScriptType> {
        self.script_pubkey.classify()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.encoded
    }
}

/// Base58Check P2PKH address of `public_key`.
#[must_use]
pub fn p2pkh(public_key: &PublicKey, network: Network) -> String {
    Address::p2pkh(public_key, network).encoded
}

/// `OP_0 <HASH160(pubkey)>`, the P2WPKH output script and redeem script.
///
/// # Errors
///
/// Returns [`Error::InvalidPublicKey`] for an uncompressed key.
pub fn p2wpkh_script(public_key: &PublicKey) -> Result<Script> {
    if !public_key.is_compressed() {
        return Err(Error::InvalidPublicKey);
    }
    Ok(Script::new_p2wpkh(&public_key.hash160()))
}

/// Bech32 P2WPKH address of `public_key`.
///
/// # Errors
///
/// Returns [`Error::InvalidPublicKey`] for an uncompressed key.
pub fn p2wpkh_address(public_key: &PublicKey, network: Network) -> Result<String> {
    Ok(Address::p2wpkh(public_key, network)?.encoded)
}

/// P2SH-P2WPKH address of `public_key` and the hex of its redeem script.
///
/// # Errors
///
/// Returns [`Error::InvalidPublicKey`] for an uncompressed key.
pub fn p2sh_p2wpkh(public_key: &PublicKey, network: Network) -> Result<(String, String)> {
    let redeem_script = p2wpkh_script(public_key)?;
    let address = Address::p2sh_p2wpkh(public_key, network)?;
    Ok((address.encoded, redeem_script.to_hex()))
}

/// Decode an address into the scriptPubKey it pays to.
///
/// Segwit addresses of any witness version decode to their witness program;
/// Base58 addresses decode to P2PKH or P2SH.
///
/// # Errors
///
/// Fails on bad characters, checksum, length, version byte, human-readable
/// part, or an address of the other network.
pub fn to_output_script(
    address: &str,
    network: Network,
) -> core::result::Result<Script, AddressDecodeError> {
    let address = address.trim();

    match bech32_decode(address) {
        Ok((hrp, version, program)) => {
            if hrp != network.params().bech32_hrp {
                return Err(match Network::from_bech32_hrp(&hrp) {
                    Some(_) => AddressDecodeError::WrongNetwork { expected: network },
                    None => AddressDecodeError::Bech32(format!("unknown prefix '{hrp}'")),
                });
            }
            return Script::new_witness_program(version, &program);
        }
        Err(err) if has_segwit_prefix(address) => return Err(err),
        Err(_) => {}
    }

    let payload = base58check_decode(address)?;
    if payload.len() != 21 {
        return Err(AddressDecodeError::InvalidLength {
            expected: 21,
            actual: payload.len(),
        });
    }

    let version = payload[0];
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);

    let params = network.params();
    if version == params.pubkey_hash_version {
        Ok(Script::new_p2pkh(&hash))
    } else if version == params.script_hash_version {
        Ok(Script::new_p2sh(&hash))
    } else if Network::from_address_version(version).is_some() {
        Err(AddressDecodeError::WrongNetwork { expected: network })
    } else {
        Err(AddressDecodeError::UnknownVersion(version))
    }
}

/// Encode a scriptPubKey as an address on `network`.
///
/// # Errors
///
/// Returns [`AddressDecodeError::UnrecognizedScript`] for scripts without an
/// address form.
pub fn from_output_script(
    script_pubkey: &Script,
    network: Network,
) -> core::result::Result<String, AddressDecodeError> {
    let params = network.params();
    match script_pubkey
        .classify()
        .ok_or(AddressDecodeError::UnrecognizedScript)?
    {
        ScriptType::P2pkh(hash) => Ok(base58check_encode(&[params.pubkey_hash_version], &hash)),
        ScriptType::P2sh(hash) => Ok(base58check_encode(&[params.script_hash_version], &hash)),
        ScriptType::P2wpkh(hash) => bech32_encode(params.bech32_hrp, 0, &hash),
        ScriptType::P2wsh(hash) => bech32_encode(params.bech32_hrp, 0, &hash),
        ScriptType::WitnessProgram { version, program } => {
            bech32_encode(params.bech32_hrp, version, &program)
        }
    }
}

/// Whether `address` decodes to an output script on `network`.
#[must_use]
pub fn is_valid_address(address: &str, network: Network) -> bool {
    to_output_script(address, network).is_ok()
}

fn has_segwit_prefix(address: &str) -> bool {
    Network::ALL.into_iter().any(|network| {
        let hrp = network.params().bech32_hrp;
        address
            .get(..hrp.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(hrp))
            && address.as_bytes().get(hrp.len()) == Some(&b'1')
    })
}
