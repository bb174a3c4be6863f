//! Bitcoin scripts: typed constructors, classification and push-only parsing.

use core::fmt;

use crate::error::AddressDecodeError;

/// Script opcodes used by the supported templates.
pub mod opcodes {
    /// Push an empty vector; also witness version 0.
    pub const OP_0: u8 = 0x00;
    /// Next byte is the push length.
    pub const OP_PUSHDATA1: u8 = 0x4c;
    /// Next two bytes are the push length.
    pub const OP_PUSHDATA2: u8 = 0x4d;
    /// Next four bytes are the push length.
    pub const OP_PUSHDATA4: u8 = 0x4e;
    /// Push the number 1; also witness version 1.
    pub const OP_1: u8 = 0x51;
    /// Push the number 16; also witness version 16.
    pub const OP_16: u8 = 0x60;
    /// Duplicate the top stack item.
    pub const OP_DUP: u8 = 0x76;
    /// Compare the top two items.
    pub const OP_EQUAL: u8 = 0x87;
    /// `OP_EQUAL` followed by `OP_VERIFY`.
    pub const OP_EQUALVERIFY: u8 = 0x88;
    /// Replace the top item with its HASH160.
    pub const OP_HASH160: u8 = 0xa9;
    /// Check an ECDSA signature against a public key.
    pub const OP_CHECKSIG: u8 = 0xac;
}

use opcodes::{
    OP_0, OP_1, OP_16, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160, OP_PUSHDATA1,
    OP_PUSHDATA2, OP_PUSHDATA4,
};

/// The output templates a script can be recognised as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptType {
    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
    P2pkh([u8; 20]),
    /// `OP_HASH160 <20> OP_EQUAL`
    P2sh([u8; 20]),
    /// `OP_0 <20>`
    P2wpkh([u8; 20]),
    /// `OP_0 <32>`
    P2wsh([u8; 32]),
    /// Any other witness program (version 1 to 16).
    WitnessProgram {
        /// Witness version.
        version: u8,
        /// Witness program, 2 to 40 bytes.
        program: Vec<u8>,
    },
}

impl ScriptType {
    /// Short lowercase name of the template.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::P2pkh(_) => "p2pkh",
            Self::P2sh(_) => "p2sh",
            Self::P2wpkh(_) => "p2wpkh",
            Self::P2wsh(_) => "p2wsh",
            Self::WitnessProgram { .. } => "witness program",
        }
    }
}

/// A serialized script.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    /// The empty script.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Wrap script bytes received from elsewhere, such as a UTXO's
    /// scriptPubKey.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse script bytes from hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex is malformed.
    pub fn from_hex(hex_script: &str) -> crate::Result<Self> {
        Ok(Self(hex::decode(hex_script.trim())?))
    }

    /// `OP_DUP OP_HASH160 <pubkey_hash> OP_EQUALVERIFY OP_CHECKSIG`
    #[must_use]
    pub fn new_p2pkh(pubkey_hash: &[u8; 20]) -> Self {
        let mut script = Vec::with_capacity(25);
        script.push(OP_DUP);
        script.push(OP_HASH160);
        script.push(20);
        script.extend_from_slice(pubkey_hash);
        script.push(OP_EQUALVERIFY);
        script.push(OP_CHECKSIG);
        Self(script)
    }

    /// `OP_HASH160 <script_hash> OP_EQUAL`
    #[must_use]
    pub fn new_p2sh(script_hash: &[u8; 20]) -> Self {
        let mut script = Vec::with_capacity(23);
        script.push(OP_HASH160);
        script.push(20);
        script.extend_from_slice(script_hash);
        script.push(OP_EQUAL);
        Self(script)
    }

    /// `OP_0 <pubkey_hash>`
    #[must_use]
    pub fn new_p2wpkh(pubkey_hash: &[u8; 20]) -> Self {
        let mut script = Vec::with_capacity(22);
        script.push(OP_0);
        script.push(20);
        script.extend_from_slice(pubkey_hash);
        Self(script)
    }

    /// A witness program output: version opcode followed by one push.
    ///
    /// # Errors
    ///
    /// Fails if the version is above 16, the program is not 2 to 40 bytes, or
    /// a version 0 program is neither 20 nor 32 bytes.
    pub fn new_witness_program(version: u8, program: &[u8]) -> Result<Self, AddressDecodeError> {
        if version > 16 {
            return Err(AddressDecodeError::Bech32(format!(
                "invalid witness version {version}"
            )));
        }
        let valid_length = if version == 0 {
            matches!(program.len(), 20 | 32)
        } else {
            (2..=40).contains(&program.len())
        };
        if !valid_length {
            return Err(AddressDecodeError::InvalidLength {
                expected: if version == 0 { 20 } else { 40 },
                actual: program.len(),
            });
        }

        let version_op = if version == 0 { OP_0 } else { OP_1 + version - 1 };
        let mut script = Vec::with_capacity(program.len() + 2);
        script.push(version_op);
        // program is at most 40 bytes, a direct push
        script.push(program.len() as u8);
        script.extend_from_slice(program);
        Ok(Self(script))
    }

    /// Recognise one of the standard output templates.
    #[must_use]
    pub fn classify(&self) -> Option<ScriptType> {
        let s = self.0.as_slice();
        match s {
            [OP_DUP, OP_HASH160, 20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
                Some(ScriptType::P2pkh(hash.try_into().ok()?))
            }
            [OP_HASH160, 20, hash @ .., OP_EQUAL] if hash.len() == 20 => {
                Some(ScriptType::P2sh(hash.try_into().ok()?))
            }
            [OP_0, 20, hash @ ..] if hash.len() == 20 => {
                Some(ScriptType::P2wpkh(hash.try_into().ok()?))
            }
            [OP_0, 32, hash @ ..] if hash.len() == 32 => {
                Some(ScriptType::P2wsh(hash.try_into().ok()?))
            }
            [version @ OP_1..=OP_16, len, program @ ..]
                if usize::from(*len) == program.len() && (2..=40).contains(&program.len()) =>
            {
                Some(ScriptType::WitnessProgram {
                    version: version - OP_1 + 1,
                    program: program.to_vec(),
                })
            }
            _ => None,
        }
    }

    /// The BIP143 script code for a P2WPKH program: the P2PKH script of the
    /// same hash.
    #[must_use]
    pub fn p2wpkh_script_code(&self) -> Option<Self> {
        match self.classify()? {
            ScriptType::P2wpkh(hash) => Some(Self::new_p2pkh(&hash)),
            _ => None,
        }
    }

    /// Split a push-only script into its pushed items.
    ///
    /// Returns `None` if the script contains a non-push opcode or a truncated
    /// push.
    #[must_use]
    pub fn push_items(&self) -> Option<Vec<&[u8]>> {
        let mut items = Vec::new();
        let mut rest = self.0.as_slice();

        while let Some((&op, tail)) = rest.split_first() {
            let (len, tail) = match op {
                OP_0 => (0, tail),
                0x01..=0x4b => (usize::from(op), tail),
                OP_PUSHDATA1 => {
                    let (len, tail) = tail.split_first_chunk::<1>()?;
                    (usize::from(len[0]), tail)
                }
                OP_PUSHDATA2 => {
                    let (len, tail) = tail.split_first_chunk::<2>()?;
                    (usize::from(u16::from_le_bytes(*len)), tail)
                }
                OP_PUSHDATA4 => {
                    let (len, tail) = tail.split_first_chunk::<4>()?;
                    (usize::try_from(u32::from_le_bytes(*len)).ok()?, tail)
                }
                _ => return None,
            };
            if tail.len() < len {
                return None;
            }
            let (item, tail) = tail.split_at(len);
            items.push(item);
            rest = tail;
        }

        Some(items)
    }

    /// Raw script bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Script length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the script is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex of the script bytes.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Builds push-only scripts (scriptSigs) with minimal push encodings.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    bytes: Vec<u8>,
}

impl ScriptBuilder {
    /// Start an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a data item using the smallest push opcode that fits.
    #[must_use]
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        let len = data.len();
        if len == 0 {
            self.bytes.push(OP_0);
        } else if let Ok(small) = u8::try_from(len)
            && small < OP_PUSHDATA1
        {
            self.bytes.push(small);
        } else if let Ok(len) = u8::try_from(len) {
            self.bytes.push(OP_PUSHDATA1);
            self.bytes.push(len);
        } else if let Ok(len) = u16::try_from(len) {
            self.bytes.push(OP_PUSHDATA2);
            self.bytes.extend_from_slice(&len.to_le_bytes());
        } else {
            self.bytes.push(OP_PUSHDATA4);
            // scripts are bounded far below 4 GiB
            self.bytes
                .extend_from_slice(&u32::try_from(len).unwrap_or(u32::MAX).to_le_bytes());
        }
        self.bytes.extend_from_slice(data);
        self
    }

    /// Finish the script.
    #[must_use]
    pub fn into_script(self) -> Script {
        Script(self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: [u8; 20] = hex_literal::hex!("751e76e8199196d454941c45d1b3a323f1433bd6");

    #[test]
    fn test_p2pkh_layout() {
        let script = Script::new_p2pkh(&HASH);
        assert_eq!(script.len(), 25);
        assert_eq!(
            script.to_hex(),
            "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac"
        );
        assert_eq!(script.classify(), Some(ScriptType::P2pkh(HASH)));
    }

    #[test]
    fn test_p2sh_and_p2wpkh_classify() {
        assert_eq!(
            Script::new_p2sh(&HASH).classify(),
            Some(ScriptType::P2sh(HASH))
        );
        assert_eq!(
            Script::new_p2wpkh(&HASH).classify(),
            Some(ScriptType::P2wpkh(HASH))
        );
        assert_eq!(
            Script::new_p2wpkh(&HASH).to_hex(),
            "0014751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn test_witness_programs() {
        let p2wsh = Script::new_witness_program(0, &[7u8; 32]).unwrap();
        assert_eq!(p2wsh.classify(), Some(ScriptType::P2wsh([7u8; 32])));

        let taproot = Script::new_witness_program(1, &[9u8; 32]).unwrap();
        assert_eq!(taproot.as_bytes()[0], OP_1);
        assert_eq!(
            taproot.classify(),
            Some(ScriptType::WitnessProgram {
                version: 1,
                program: vec![9u8; 32]
            })
        );

        assert!(Script::new_witness_program(0, &[0u8; 25]).is_err());
        assert!(Script::new_witness_program(17, &[0u8; 20]).is_err());
        assert!(Script::new_witness_program(2, &[0u8; 41]).is_err());
    }

    #[test]
    fn test_unrecognised_script() {
        assert_eq!(Script::new().classify(), None);
        assert_eq!(Script::from_bytes(vec![0x6a, 0x01, 0x00]).classify(), None);
    }

    #[test]
    fn test_script_code() {
        let code = Script::new_p2wpkh(&HASH).p2wpkh_script_code().unwrap();
        assert_eq!(code, Script::new_p2pkh(&HASH));
        assert!(Script::new_p2pkh(&HASH).p2wpkh_script_code().is_none());
    }

    #[test]
    fn test_builder_push_encodings() {
        let script = ScriptBuilder::new()
            .push_slice(&[])
            .push_slice(&[0xaa; 3])
            .push_slice(&[0xbb; 80])
            .push_slice(&[0xcc; 300])
            .into_script();
        let bytes = script.as_bytes();
        assert_eq!(bytes[0], OP_0);
        assert_eq!(&bytes[1..5], &[0x03, 0xaa, 0xaa, 0xaa]);
        assert_eq!(&bytes[5..7], &[OP_PUSHDATA1, 80]);
        assert_eq!(&bytes[87..90], &[OP_PUSHDATA2, 0x2c, 0x01]);

        let items = script.push_items().unwrap();
        assert_eq!(items.len(), 4);
        assert!(items[0].is_empty());
        assert_eq!(items[2].len(), 80);
        assert_eq!(items[3].len(), 300);
    }

    #[test]
    fn test_push_items_rejects_non_push() {
        assert!(Script::new_p2pkh(&HASH).push_items().is_none());
        assert!(Script::from_bytes(vec![0x05, 0x01]).push_items().is_none());
    }
}
