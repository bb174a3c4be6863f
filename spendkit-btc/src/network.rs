//! Bitcoin network types and their static parameter table.

use core::fmt;
use core::str::FromStr;

/// Version bytes and prefixes that differ between networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Canonical network name.
    pub name: &'static str,
    /// Base58 version byte of P2PKH addresses.
    pub pubkey_hash_version: u8,
    /// Base58 version byte of P2SH addresses.
    pub script_hash_version: u8,
    /// Base58 version byte of WIF private keys.
    pub wif_prefix: u8,
    /// Human-readable part of segwit addresses.
    pub bech32_hrp: &'static str,
    /// BIP44 coin type.
    pub coin_type: u32,
    /// BIP32 extended private key version.
    pub xprv_version: [u8; 4],
    /// BIP32 extended public key version.
    pub xpub_version: [u8; 4],
}

const MAINNET_PARAMS: NetworkParams = NetworkParams {
    name: "bitcoin",
    pubkey_hash_version: 0x00,
    script_hash_version: 0x05,
    wif_prefix: 0x80,
    bech32_hrp: "bc",
    coin_type: 0,
    xprv_version: [0x04, 0x88, 0xAD, 0xE4],
    xpub_version: [0x04, 0x88, 0xB2, 0x1E],
};

const TESTNET_PARAMS: NetworkParams = NetworkParams {
    name: "testnet",
    pubkey_hash_version: 0x6f,
    script_hash_version: 0xc4,
    wif_prefix: 0xef,
    bech32_hrp: "tb",
    coin_type: 1,
    xprv_version: [0x04, 0x35, 0x83, 0x94],
    xpub_version: [0x04, 0x35, 0x87, 0xCF],
};

/// Supported Bitcoin networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Bitcoin mainnet.
    #[default]
    Mainnet,
    /// Bitcoin testnet.
    Testnet,
}

impl Network {
    /// Every supported network.
    pub const ALL: [Self; 2] = [Self::Mainnet, Self::Testnet];

    /// Parameter table for this network.
    #[inline]
    #[must_use]
    pub const fn params(self) -> &'static NetworkParams {
        match self {
            Self::Mainnet => &MAINNET_PARAMS,
            Self::Testnet => &TESTNET_PARAMS,
        }
    }

    /// BIP44 coin type for this network.
    #[inline]
    #[must_use]
    pub const fn coin_type(self) -> u32 {
        self.params().coin_type
    }

    /// Network name as string.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.params().name
    }

    /// Find the network whose P2PKH or P2SH version byte is `version`.
    pub fn from_address_version(version: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|network| {
            let params = network.params();
            params.pubkey_hash_version == version || params.script_hash_version == version
        })
    }

    /// Find the network whose WIF prefix is `prefix`.
    pub fn from_wif_prefix(prefix: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|network| network.params().wif_prefix == prefix)
    }

    /// Find the network whose segwit human-readable part is `hrp`.
    pub fn from_bech32_hrp(hrp: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|network| network.params().bech32_hrp.eq_ignore_ascii_case(hrp))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an invalid network string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid network, expected: bitcoin, mainnet, or testnet")]
pub struct ParseNetworkError;

impl FromStr for Network {
    type Err = ParseNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bitcoin" | "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            _ => Err(ParseNetworkError),
        }
    }
}
