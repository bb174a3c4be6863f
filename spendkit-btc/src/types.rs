//! Address type selection for derivation and signing.

use core::fmt;
use core::str::FromStr;

/// Bitcoin address types this crate can derive and spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressType {
    /// Pay to Public Key Hash (Legacy) - starts with 1 or m/n
    P2pkh,
    /// Pay to Script Hash wrapping P2WPKH (`SegWit` compatible) - starts with 3 or 2
    P2shP2wpkh,
    /// Pay to Witness Public Key Hash (Native `SegWit`) - starts with bc1q or tb1q
    #[default]
    P2wpkh,
}

impl AddressType {
    /// Every supported address type.
    pub const ALL: [Self; 3] = [Self::P2pkh, Self::P2shP2wpkh, Self::P2wpkh];

    /// Get the BIP purpose for this address type.
    #[inline]
    #[must_use]
    pub const fn purpose(self) -> u32 {
        match self {
            Self::P2pkh => 44,
            Self::P2shP2wpkh => 49,
            Self::P2wpkh => 84,
        }
    }

    /// Map a BIP purpose (44, 49 or 84) back to its address type.
    #[must_use]
    pub const fn from_purpose(purpose: u32) -> Option<Self> {
        match purpose {
            44 => Some(Self::P2pkh),
            49 => Some(Self::P2shP2wpkh),
            84 => Some(Self::P2wpkh),
            _ => None,
        }
    }

    /// Whether spending this type puts the signature in the witness.
    #[inline]
    #[must_use]
    pub const fn is_segwit(self) -> bool {
        !matches!(self, Self::P2pkh)
    }

    /// Get address type name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P2pkh => "P2PKH (Legacy)",
            Self::P2shP2wpkh => "P2SH-P2WPKH (SegWit)",
            Self::P2wpkh => "P2WPKH (Native SegWit)",
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an invalid address type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid address type, expected: p2pkh, p2sh-p2wpkh, or p2wpkh")]
pub struct ParseAddressTypeError;

impl FromStr for AddressType {
    type Err = ParseAddressTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "p2pkh" | "legacy" | "44" => Ok(Self::P2pkh),
            "p2sh" | "p2sh-p2wpkh" | "segwit" | "nested-segwit" | "49" => Ok(Self::P2shP2wpkh),
            "p2wpkh" | "native-segwit" | "bech32" | "84" => Ok(Self::P2wpkh),
            _ => Err(ParseAddressTypeError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_type_from_str() {
        assert_eq!("legacy".parse::<AddressType>().unwrap(), AddressType::P2pkh);
        assert_eq!(
            "p2sh-p2wpkh".parse::<AddressType>().unwrap(),
            AddressType::P2shP2wpkh
        );
        assert_eq!(
            "segwit".parse::<AddressType>().unwrap(),
            AddressType::P2shP2wpkh
        );
        assert_eq!(
            "Native-SegWit".parse::<AddressType>().unwrap(),
            AddressType::P2wpkh
        );
        assert_eq!("84".parse::<AddressType>().unwrap(), AddressType::P2wpkh);
        assert!("taproot".parse::<AddressType>().is_err());
    }

    #[test]
    fn test_purpose_mapping() {
        for address_type in AddressType::ALL {
            assert_eq!(
                AddressType::from_purpose(address_type.purpose()),
                Some(address_type)
            );
        }
        assert_eq!(AddressType::from_purpose(86), None);
    }

    #[test]
    fn test_address_type_default() {
        assert_eq!(AddressType::default(), AddressType::P2wpkh);
        assert!(!AddressType::P2pkh.is_segwit());
    }
}
