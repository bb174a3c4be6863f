//! BIP32 derivation paths.
//!
//! Paths are written like `m/84'/1'/0'/0/0`; `'`, `h` and `H` mark a hardened
//! step. A path is applied mechanically, no purpose/coin ordering is enforced.

use core::fmt;
use core::str::FromStr;

use crate::{AddressType, Error, Network, Result};

/// A single step in a derivation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChildNumber {
    /// Normal (non-hardened) index: 0 to 2^31 - 1
    Normal(u32),
    /// Hardened index: displayed as n', stored as n
    Hardened(u32),
}

impl ChildNumber {
    /// The offset for hardened indices (2^31).
    pub const HARDENED_OFFSET: u32 = 0x8000_0000;

    /// Create a normal child number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChildIndex`] if `index >= 2^31`.
    pub const fn normal(index: u32) -> Result<Self> {
        if index >= Self::HARDENED_OFFSET {
            Err(Error::InvalidChildIndex(index))
        } else {
            Ok(Self::Normal(index))
        }
    }

    /// Create a hardened child number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChildIndex`] if `index >= 2^31`.
    pub const fn hardened(index: u32) -> Result<Self> {
        if index >= Self::HARDENED_OFFSET {
            Err(Error::InvalidChildIndex(index))
        } else {
            Ok(Self::Hardened(index))
        }
    }

    /// Check that the index fits below 2^31.
    ///
    /// The variants are public, so a value built directly may carry an
    /// index that [`Self::normal`] or [`Self::hardened`] would refuse.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChildIndex`] if the index is `>= 2^31`.
    pub const fn validate(self) -> Result<Self> {
        match self {
            Self::Normal(index) => Self::normal(index),
            Self::Hardened(index) => Self::hardened(index),
        }
    }

    /// Check if this is a hardened index.
    #[must_use]
    pub const fn is_hardened(&self) -> bool {
        matches!(self, Self::Hardened(_))
    }

    /// The index without the hardened flag.
    #[must_use]
    pub const fn index(&self) -> u32 {
        match self {
            Self::Normal(i) | Self::Hardened(i) => *i,
        }
    }

    /// The raw `ser32` value used in derivation, hardened offset included.
    #[must_use]
    pub const fn to_u32(&self) -> u32 {
        match self {
            Self::Normal(i) => *i,
            Self::Hardened(i) => *i | Self::HARDENED_OFFSET,
        }
    }
}

impl From<u32> for ChildNumber {
    fn from(value: u32) -> Self {
        if value >= Self::HARDENED_OFFSET {
            Self::Hardened(value & !Self::HARDENED_OFFSET)
        } else {
            Self::Normal(value)
        }
    }
}

impl From<ChildNumber> for u32 {
    fn from(child: ChildNumber) -> Self {
        child.to_u32()
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal(i) => write!(f, "{i}"),
            Self::Hardened(i) => write!(f, "{i}'"),
        }
    }
}

impl FromStr for ChildNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (digits, hardened) = match s.strip_suffix(['\'', 'h', 'H']) {
            Some(digits) => (digits, true),
            None => (s, false),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidDerivationPath(format!(
                "invalid path component '{s}'"
            )));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidDerivationPath(format!("index out of range '{s}'")))?;

        if hardened {
            Self::hardened(index)
        } else {
            Self::normal(index)
        }
    }
}

/// A BIP32 derivation path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    children: Vec<ChildNumber>,
}

impl DerivationPath {
    /// The empty path (the master key).
    #[must_use]
    pub const fn master() -> Self {
        Self {
            children: Vec::new(),
        }
    }

    /// Create a path from child numbers.
    #[must_use]
    pub const fn new(children: Vec<ChildNumber>) -> Self {
        Self { children }
    }

    /// Create a BIP44/49/84 standard path.
    ///
    /// Format: `m/purpose'/coin_type'/account'/change/address_index`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChildIndex`] if `account` or `address_index`
    /// is not below 2^31.
    pub fn bip_standard(
        address_type: AddressType,
        network: Network,
        account: u32,
        change: bool,
        address_index: u32,
    ) -> Result<Self> {
        Ok(Self {
            children: vec![
                ChildNumber::hardened(address_type.purpose())?,
                ChildNumber::hardened(network.coin_type())?,
                ChildNumber::hardened(account)?,
                ChildNumber::normal(u32::from(change))?,
                ChildNumber::normal(address_index)?,
            ],
        })
    }

    /// The steps in this path.
    #[must_use]
    pub fn children(&self) -> &[ChildNumber] {
        &self.children
    }

    /// Number of steps in this path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.children.len()
    }

    /// Whether this is the master path `m`.
    #[must_use]
    pub fn is_master(&self) -> bool {
        self.children.is_empty()
    }

    /// A copy of this path with `child` appended.
    #[must_use]
    pub fn child(&self, child: ChildNumber) -> Self {
        let mut children = self.children.clone();
        children.push(child);
        Self { children }
    }

    /// The purpose step of a BIP44-style path, if it has one.
    #[must_use]
    pub fn purpose(&self) -> Option<u32> {
        match self.children.first() {
            Some(ChildNumber::Hardened(purpose)) => Some(*purpose),
            _ => None,
        }
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(path: &str) -> Result<Self> {
        let path = path.trim();
        let mut parts = path.split('/');

        match parts.next() {
            Some("m" | "M") => {}
            _ => {
                return Err(Error::InvalidDerivationPath(format!(
                    "path must start with 'm': '{path}'"
                )));
            }
        }

        let children = parts
            .map(str::parse)
            .collect::<Result<Vec<ChildNumber>>>()?;

        if children.len() > usize::from(u8::MAX) {
            return Err(Error::MaxDepthExceeded);
        }

        Ok(Self { children })
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in &self.children {
            write!(f, "/{child}")?;
        }
        Ok(())
    }
}

impl From<Vec<ChildNumber>> for DerivationPath {
    fn from(children: Vec<ChildNumber>) -> Self {
        Self::new(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path: DerivationPath = "m/84'/1'/0'/0/0".parse().unwrap();
        assert_eq!(path.depth(), 5);
        assert_eq!(path.children()[0], ChildNumber::Hardened(84));
        assert_eq!(path.children()[4], ChildNumber::Normal(0));
        assert_eq!(path.to_string(), "m/84'/1'/0'/0/0");
        assert_eq!(path.purpose(), Some(84));
    }

    #[test]
    fn test_hardened_markers() {
        let a: DerivationPath = "m/44h/0H/0'".parse().unwrap();
        assert_eq!(a.to_string(), "m/44'/0'/0'");
    }

    #[test]
    fn test_master() {
        let path: DerivationPath = "m".parse().unwrap();
        assert!(path.is_master());
        assert_eq!(path.to_string(), "m");
    }

    #[test]
    fn test_invalid_paths() {
        assert!(matches!(
            "44'/0'".parse::<DerivationPath>(),
            Err(Error::InvalidDerivationPath(_))
        ));
        assert!(matches!(
            "m/abc".parse::<DerivationPath>(),
            Err(Error::InvalidDerivationPath(_))
        ));
        assert!(matches!(
            "m/0//1".parse::<DerivationPath>(),
            Err(Error::InvalidDerivationPath(_))
        ));
        assert!(matches!(
            "m/2147483648".parse::<DerivationPath>(),
            Err(Error::InvalidChildIndex(0x8000_0000))
        ));
        assert!(matches!(
            "m/2147483648'".parse::<DerivationPath>(),
            Err(Error::InvalidChildIndex(0x8000_0000))
        ));
    }

    #[test]
    fn test_bip_standard() {
        let path =
            DerivationPath::bip_standard(AddressType::P2shP2wpkh, Network::Testnet, 0, true, 7)
                .unwrap();
        assert_eq!(path.to_string(), "m/49'/1'/0'/1/7");
        assert!(
            DerivationPath::bip_standard(AddressType::P2pkh, Network::Mainnet, 1 << 31, false, 0)
                .is_err()
        );
    }

    #[test]
    fn test_child_number_raw() {
        assert_eq!(ChildNumber::Hardened(1).to_u32(), 0x8000_0001);
        assert_eq!(ChildNumber::from(0x8000_0002), ChildNumber::Hardened(2));
        assert!(ChildNumber::Hardened(0).is_hardened());
    }

    #[test]
    fn test_validate_out_of_range() {
        assert_eq!(
            ChildNumber::Normal(0x7fff_ffff).validate().unwrap(),
            ChildNumber::Normal(0x7fff_ffff)
        );
        assert!(matches!(
            ChildNumber::Normal(0x8000_0001).validate(),
            Err(Error::InvalidChildIndex(0x8000_0001))
        ));
        assert!(matches!(
            ChildNumber::Hardened(0x8000_0000).validate(),
            Err(Error::InvalidChildIndex(0x8000_0000))
        ));
    }
}
