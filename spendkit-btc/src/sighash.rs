//! Signature hash computation.
//!
//! Two digest algorithms authorize spending an input: the legacy algorithm
//! (pre-segwit outputs) and the BIP143 witness v0 algorithm, which also
//! commits to the value being spent.

use core::fmt;

use tracing::trace;

use crate::hash::double_sha256;
use crate::script::Script;
use crate::transaction::{UnsignedTransaction, write_var_bytes, write_varint};
use crate::{Error, Result};

const SIGHASH_ALL: u32 = 0x01;
const SIGHASH_NONE: u32 = 0x02;
const SIGHASH_SINGLE: u32 = 0x03;
const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Which parts of the transaction a signature commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SigHashType {
    /// Every input and every output.
    #[default]
    All,
    /// Every input, no output.
    None,
    /// Every input and the output at the same index.
    Single,
    /// This input only, every output.
    AllAnyoneCanPay,
    /// This input only, no output.
    NoneAnyoneCanPay,
    /// This input only and the output at the same index.
    SingleAnyoneCanPay,
}

impl SigHashType {
    /// The 32-bit value committed to by the digest.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::All => SIGHASH_ALL,
            Self::None => SIGHASH_NONE,
            Self::Single => SIGHASH_SINGLE,
            Self::AllAnyoneCanPay => SIGHASH_ALL | SIGHASH_ANYONECANPAY,
            Self::NoneAnyoneCanPay => SIGHASH_NONE | SIGHASH_ANYONECANPAY,
            Self::SingleAnyoneCanPay => SIGHASH_SINGLE | SIGHASH_ANYONECANPAY,
        }
    }

    /// The byte appended to a DER signature.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.to_u32() as u8
    }

    /// Parse a standard sighash value.
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            SIGHASH_ALL => Some(Self::All),
            SIGHASH_NONE => Some(Self::None),
            SIGHASH_SINGLE => Some(Self::Single),
            0x81 => Some(Self::AllAnyoneCanPay),
            0x82 => Some(Self::NoneAnyoneCanPay),
            0x83 => Some(Self::SingleAnyoneCanPay),
            _ => None,
        }
    }

    /// Whether only the signed input is committed to.
    #[must_use]
    pub const fn anyone_can_pay(self) -> bool {
        matches!(
            self,
            Self::AllAnyoneCanPay | Self::NoneAnyoneCanPay | Self::SingleAnyoneCanPay
        )
    }

    const fn is_none(self) -> bool {
        matches!(self, Self::None | Self::NoneAnyoneCanPay)
    }

    pub(crate) const fn is_single(self) -> bool {
        matches!(self, Self::Single | Self::SingleAnyoneCanPay)
    }
}

impl fmt::Display for SigHashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "ALL",
            Self::None => "NONE",
            Self::Single => "SINGLE",
            Self::AllAnyoneCanPay => "ALL|ANYONECANPAY",
            Self::NoneAnyoneCanPay => "NONE|ANYONECANPAY",
            Self::SingleAnyoneCanPay => "SINGLE|ANYONECANPAY",
        })
    }
}

/// The three intermediate BIP143 hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bip143Hashes {
    pub(crate) prevouts: [u8; 32],
    pub(crate) sequence: [u8; 32],
    pub(crate) outputs: [u8; 32],
}

impl UnsignedTransaction {
    fn check_input_index(&self, index: usize) -> Result<()> {
        if index < self.inputs.len() {
            Ok(())
        } else {
            Err(Error::InputIndexOutOfRange {
                index,
                count: self.inputs.len(),
            })
        }
    }

    /// Legacy signature hash of input `index`.
    ///
    /// The signed input's scriptSig is replaced by `script_code`, every other
    /// scriptSig is emptied and the serialization without witness data is
    /// hashed together with the sighash type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputIndexOutOfRange`] for a missing input.
    pub fn legacy_sighash(
        &self,
        index: usize,
        script_code: &Script,
        sighash_type: SigHashType,
    ) -> Result<[u8; 32]> {
        self.check_input_index(index)?;

        // Consensus quirk: SINGLE without a matching output signs the number one.
        if sighash_type.is_single() && index >= self.outputs.len() {
            let mut one = [0u8; 32];
            one[0] = 0x01;
            return Ok(one);
        }

        let mut data = Vec::with_capacity(128 + script_code.len());
        data.extend_from_slice(&self.version.to_le_bytes());

        let signed_only = sighash_type.anyone_can_pay();
        let input_count = if signed_only { 1 } else { self.inputs.len() };
        write_varint(&mut data, input_count as u64);
        for (i, input) in self.inputs.iter().enumerate() {
            if signed_only && i != index {
                continue;
            }
            input.previous_output.write(&mut data);
            if i == index {
                write_var_bytes(&mut data, script_code.as_bytes());
            } else {
                write_varint(&mut data, 0);
            }
            let sequence = if i != index && (sighash_type.is_none() || sighash_type.is_single())
            {
                0
            } else {
                input.sequence
            };
            data.extend_from_slice(&sequence.to_le_bytes());
        }

        if sighash_type.is_none() {
            write_varint(&mut data, 0);
        } else if sighash_type.is_single() {
            write_varint(&mut data, index as u64 + 1);
            for _ in 0..index {
                // Blanked output: value -1, empty script
                data.extend_from_slice(&u64::MAX.to_le_bytes());
                write_varint(&mut data, 0);
            }
            self.outputs[index].write(&mut data);
        } else {
            write_varint(&mut data, self.outputs.len() as u64);
            for output in &self.outputs {
                output.write(&mut data);
            }
        }

        data.extend_from_slice(&self.lock_time.to_le_bytes());
        data.extend_from_slice(&sighash_type.to_u32().to_le_bytes());

        let digest = double_sha256(&data);
        trace!(index, %sighash_type, digest = %hex::encode(digest), "legacy sighash");
        Ok(digest)
    }

    pub(crate) fn bip143_hashes(&self, index: usize, sighash_type: SigHashType) -> Bip143Hashes {
        let prevouts = if sighash_type.anyone_can_pay() {
            [0u8; 32]
        } else {
            let mut data = Vec::with_capacity(self.inputs.len() * 36);
            for input in &self.inputs {
                input.previous_output.write(&mut data);
            }
            double_sha256(&data)
        };

        let sequence = if sighash_type.anyone_can_pay()
            || sighash_type.is_single()
            || sighash_type.is_none()
        {
            [0u8; 32]
        } else {
            let mut data = Vec::with_capacity(self.inputs.len() * 4);
            for input in &self.inputs {
                data.extend_from_slice(&input.sequence.to_le_bytes());
            }
            double_sha256(&data)
        };

        let outputs = if !sighash_type.is_single() && !sighash_type.is_none() {
            let mut data = Vec::with_capacity(self.outputs.len() * 34);
            for output in &self.outputs {
                output.write(&mut data);
            }
            double_sha256(&data)
        } else if let Some(output) = self.outputs.get(index)
            && sighash_type.is_single()
        {
            let mut data = Vec::with_capacity(34);
            output.write(&mut data);
            double_sha256(&data)
        } else {
            [0u8; 32]
        };

        Bip143Hashes {
            prevouts,
            sequence,
            outputs,
        }
    }

    /// BIP143 preimage of input `index` before double hashing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputIndexOutOfRange`] for a missing input.
    pub fn segwit_v0_preimage(
        &self,
        index: usize,
        script_code: &Script,
        amount: u64,
        sighash_type: SigHashType,
    ) -> Result<Vec<u8>> {
        self.check_input_index(index)?;
        let input = &self.inputs[index];
        let hashes = self.bip143_hashes(index, sighash_type);

        let mut data = Vec::with_capacity(160 + script_code.len());
        data.extend_from_slice(&self.version.to_le_bytes());
        data.extend_from_slice(&hashes.prevouts);
        data.extend_from_slice(&hashes.sequence);
        input.previous_output.write(&mut data);
        write_var_bytes(&mut data, script_code.as_bytes());
        data.extend_from_slice(&amount.to_le_bytes());
        data.extend_from_slice(&input.sequence.to_le_bytes());
        data.extend_from_slice(&hashes.outputs);
        data.extend_from_slice(&self.lock_time.to_le_bytes());
        data.extend_from_slice(&sighash_type.to_u32().to_le_bytes());
        Ok(data)
    }

    /// BIP143 witness v0 signature hash of input `index`.
    ///
    /// `script_code` for P2WPKH is the P2PKH script of the key hash and
    /// `amount` is the value of the output being spent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputIndexOutOfRange`] for a missing input.
    pub fn segwit_v0_sighash(
        &self,
        index: usize,
        script_code: &Script,
        amount: u64,
        sighash_type: SigHashType,
    ) -> Result<[u8; 32]> {
        let preimage = self.segwit_v0_preimage(index, script_code, amount, sighash_type)?;
        let digest = double_sha256(&preimage);
        trace!(index, amount, %sighash_type, digest = %hex::encode(digest), "segwit v0 sighash");
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::transaction::{OutPoint, TxIn, TxOut, Txid};

    // BIP143 native P2WPKH example
    fn bip143_tx() -> UnsignedTransaction {
        UnsignedTransaction {
            version: 1,
            inputs: vec![
                TxIn::new(
                    OutPoint::new(
                        Txid::from_byte_array(hex!(
                            "fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f"
                        )),
                        0,
                    ),
                    None,
                )
                .with_sequence(0xffff_ffee),
                TxIn::new(
                    OutPoint::new(
                        Txid::from_byte_array(hex!(
                            "ef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a"
                        )),
                        1,
                    ),
                    None,
                ),
            ],
            outputs: vec![
                TxOut::new(
                    112_340_000,
                    Script::new_p2pkh(&hex!("8280b37df378db99f66f85c95a783a76ac7a6d59")),
                ),
                TxOut::new(
                    223_450_000,
                    Script::new_p2pkh(&hex!("3bde42dbee7e4dbe6a21b2d50ce2f0167faa8159")),
                ),
            ],
            lock_time: 17,
        }
    }

    fn bip143_script_code() -> Script {
        Script::new_p2pkh(&hex!("1d0f172a0ecb48aee1be1f2687d2963ae33f71a1"))
    }

    #[test]
    fn test_bip143_unsigned_serialization() {
        assert_eq!(
            bip143_tx().to_hex(),
            "0100000002fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f0000000000eeffffffef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a0100000000ffffffff02202cb206000000001976a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac9093510d000000001976a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac11000000"
        );
    }

    #[test]
    fn test_bip143_intermediate_hashes() {
        let hashes = bip143_tx().bip143_hashes(1, SigHashType::All);
        assert_eq!(
            hashes.prevouts,
            hex!("96b827c8483d4e9b96712b6713a7b68d6e8003a781feba36c31143470b4efd37")
        );
        assert_eq!(
            hashes.sequence,
            hex!("52b0a642eea2fb7ae638c36f6252b6750293dbe574a806984b8e4d8548339a3b")
        );
        assert_eq!(
            hashes.outputs,
            hex!("863ef3e1a92afbfdb97f31ad0fc7683ee943e9abcf2501590ff8f6551f47e5e5")
        );
    }

    #[test]
    fn test_bip143_sighash() {
        let digest = bip143_tx()
            .segwit_v0_sighash(1, &bip143_script_code(), 600_000_000, SigHashType::All)
            .unwrap();
        assert_eq!(
            digest,
            hex!("c37af31116d1b27caf68aae9e3ac82f1477929014d5b917657d0eb49478cb670")
        );
    }

    #[test]
    fn test_bip143_zeroed_hashes() {
        let tx = bip143_tx();

        let acp = tx.bip143_hashes(0, SigHashType::AllAnyoneCanPay);
        assert_eq!(acp.prevouts, [0u8; 32]);
        assert_eq!(acp.sequence, [0u8; 32]);
        assert_ne!(acp.outputs, [0u8; 32]);

        let none = tx.bip143_hashes(0, SigHashType::None);
        assert_ne!(none.prevouts, [0u8; 32]);
        assert_eq!(none.sequence, [0u8; 32]);
        assert_eq!(none.outputs, [0u8; 32]);

        let single = tx.bip143_hashes(1, SigHashType::Single);
        let mut one_output = Vec::new();
        tx.outputs[1].write(&mut one_output);
        assert_eq!(single.outputs, double_sha256(&one_output));

        let mut extra = tx.clone();
        extra.inputs.push(extra.inputs[0].clone());
        assert_eq!(extra.bip143_hashes(2, SigHashType::Single).outputs, [0u8; 32]);
    }

    #[test]
    fn test_legacy_and_witness_differ() {
        let tx = bip143_tx();
        let code = bip143_script_code();
        let legacy = tx.legacy_sighash(1, &code, SigHashType::All).unwrap();
        let witness = tx
            .segwit_v0_sighash(1, &code, 600_000_000, SigHashType::All)
            .unwrap();
        assert_ne!(legacy, witness);
        assert_eq!(legacy, tx.legacy_sighash(1, &code, SigHashType::All).unwrap());
    }

    #[test]
    fn test_legacy_sighash_types_differ() {
        let tx = bip143_tx();
        let code = bip143_script_code();
        let all = tx.legacy_sighash(0, &code, SigHashType::All).unwrap();
        let none = tx.legacy_sighash(0, &code, SigHashType::None).unwrap();
        let single = tx.legacy_sighash(0, &code, SigHashType::Single).unwrap();
        let acp = tx
            .legacy_sighash(0, &code, SigHashType::AllAnyoneCanPay)
            .unwrap();
        assert_ne!(all, none);
        assert_ne!(all, single);
        assert_ne!(all, acp);
    }

    #[test]
    fn test_legacy_single_out_of_range() {
        let mut tx = bip143_tx();
        tx.inputs.push(tx.inputs[0].clone());
        let digest = tx
            .legacy_sighash(2, &bip143_script_code(), SigHashType::Single)
            .unwrap();
        let mut one = [0u8; 32];
        one[0] = 1;
        assert_eq!(digest, one);
    }

    #[test]
    fn test_index_out_of_range() {
        let tx = bip143_tx();
        assert!(matches!(
            tx.legacy_sighash(2, &bip143_script_code(), SigHashType::All),
            Err(Error::InputIndexOutOfRange { index: 2, count: 2 })
        ));
        assert!(matches!(
            tx.segwit_v0_sighash(5, &bip143_script_code(), 1, SigHashType::All),
            Err(Error::InputIndexOutOfRange { index: 5, count: 2 })
        ));
    }

    #[test]
    fn test_sighash_type_values() {
        for value in [0x01, 0x02, 0x03, 0x81, 0x82, 0x83] {
            let sighash_type = SigHashType::from_u32(value).unwrap();
            assert_eq!(sighash_type.to_u32(), value);
        }
        assert_eq!(SigHashType::from_u32(0x04), None);
        assert_eq!(SigHashType::default().to_byte(), 0x01);
        assert!(SigHashType::SingleAnyoneCanPay.anyone_can_pay());
        assert_eq!(SigHashType::NoneAnyoneCanPay.to_string(), "NONE|ANYONECANPAY");
    }
}
