//! Bitcoin transaction types and wire serialization.
//!
//! An [`UnsignedTransaction`] is immutable once built. Signing produces a
//! [`SignedTransaction`] that carries one optional [`InputAuth`] per input;
//! each signature yields a new value. Only a fully signed transaction can be
//! serialized for broadcast, in legacy format or BIP144 format when any input
//! has witness data.

use core::fmt;
use core::str::FromStr;

use crate::hash::double_sha256;
use crate::script::Script;
use crate::{Error, Result};

/// Transaction ID, stored in internal byte order and shown reversed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Txid([u8; 32]);

impl Txid {
    /// Create from bytes in internal order.
    #[must_use]
    pub const fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Bytes in internal order, as serialized in outpoints.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bitcoin displays txid in reverse byte order
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({self})")
    }
}

impl FromStr for Txid {
    type Err = Error;

    /// Parse the displayed (byte-reversed) hex form.
    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim(), &mut bytes)?;
        bytes.reverse();
        Ok(Self(bytes))
    }
}

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction that created the output.
    pub txid: Txid,
    /// Output index in that transaction.
    pub vout: u32,
}

impl OutPoint {
    /// Create an outpoint.
    #[must_use]
    pub const fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }

    pub(crate) fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.txid.as_bytes());
        buf.extend_from_slice(&self.vout.to_le_bytes());
    }
}

/// The output being spent: its locking script and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrevOut {
    /// Locking script of the spent output.
    pub script_pubkey: Script,
    /// Value of the spent output in satoshis.
    pub amount: u64,
}

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    /// The outpoint being spent.
    pub previous_output: OutPoint,
    /// The spent output. Required to sign witness inputs.
    pub prev_out: Option<PrevOut>,
    /// Sequence number.
    pub sequence: u32,
}

impl TxIn {
    /// Final sequence: no RBF, no relative lock time.
    pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;
    /// Sequence that signals BIP125 replace-by-fee.
    pub const SEQUENCE_RBF: u32 = 0xffff_fffd;

    /// Create an input with the final sequence.
    #[must_use]
    pub const fn new(previous_output: OutPoint, prev_out: Option<PrevOut>) -> Self {
        Self {
            previous_output,
            prev_out,
            sequence: Self::SEQUENCE_FINAL,
        }
    }

    /// Opt this input into replace-by-fee.
    #[must_use]
    pub const fn with_rbf(mut self) -> Self {
        self.sequence = Self::SEQUENCE_RBF;
        self
    }

    /// Set an explicit sequence number.
    #[must_use]
    pub const fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    /// Value in satoshis.
    pub amount: u64,
    /// Locking script.
    pub script_pubkey: Script,
}

impl TxOut {
    /// Create an output.
    #[must_use]
    pub const fn new(amount: u64, script_pubkey: Script) -> Self {
        Self {
            amount,
            script_pubkey,
        }
    }

    pub(crate) fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.amount.to_le_bytes());
        write_var_bytes(buf, self.script_pubkey.as_bytes());
    }
}

/// A transaction before any input is signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    /// Transaction version.
    pub version: i32,
    /// Transaction inputs.
    pub inputs: Vec<TxIn>,
    /// Transaction outputs.
    pub outputs: Vec<TxOut>,
    /// Lock time.
    pub lock_time: u32,
}

impl Default for UnsignedTransaction {
    fn default() -> Self {
        Self {
            version: 2,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }
}

impl UnsignedTransaction {
    /// Create an empty version 2 transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize with empty scriptSigs and no witness.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serialize(self, &vec![None; self.inputs.len()], false)
    }

    /// Hex of [`Self::to_bytes`].
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Sum of input values, if every input carries its [`PrevOut`].
    #[must_use]
    pub fn total_input_amount(&self) -> Option<u64> {
        self.inputs
            .iter()
            .try_fold(0u64, |sum, input| sum.checked_add(input.prev_out.as_ref()?.amount))
    }

    /// Sum of output values.
    #[must_use]
    pub fn total_output_amount(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |sum, output| sum.saturating_add(output.amount))
    }

    /// Inputs minus outputs, if every input value is known.
    #[must_use]
    pub fn fee(&self) -> Option<u64> {
        self.total_input_amount()?
            .checked_sub(self.total_output_amount())
    }
}

/// The data that authorizes spending one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputAuth {
    /// Unlocking script.
    pub script_sig: Script,
    /// Witness stack, empty for legacy inputs.
    pub witness: Vec<Vec<u8>>,
}

/// How far signing has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningState {
    /// No input is signed.
    Unsigned,
    /// Some but not all inputs are signed.
    PartiallySigned,
    /// Every input is signed.
    Finalized,
}

/// A transaction with per-input authorization data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    unsigned: UnsignedTransaction,
    auth: Vec<Option<InputAuth>>,
}

impl From<UnsignedTransaction> for SignedTransaction {
    fn from(unsigned: UnsignedTransaction) -> Self {
        let auth = vec![None; unsigned.inputs.len()];
        Self { unsigned, auth }
    }
}

impl SignedTransaction {
    /// The transaction being signed.
    #[must_use]
    pub const fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    /// Authorization data of input `index`, if signed.
    #[must_use]
    pub fn input_auth(&self, index: usize) -> Option<&InputAuth> {
        self.auth.get(index)?.as_ref()
    }

    /// A copy of this transaction with input `index` authorized by `auth`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputIndexOutOfRange`] for a missing input.
    pub fn with_input_auth(&self, index: usize, auth: InputAuth) -> Result<Self> {
        let count = self.auth.len();
        let mut next = self.clone();
        let slot = next
            .auth
            .get_mut(index)
            .ok_or(Error::InputIndexOutOfRange { index, count })?;
        *slot = Some(auth);
        Ok(next)
    }

    /// Number of signed inputs.
    #[must_use]
    pub fn signed_count(&self) -> usize {
        self.auth.iter().filter(|auth| auth.is_some()).count()
    }

    /// Current signing state.
    #[must_use]
    pub fn state(&self) -> SigningState {
        match self.signed_count() {
            0 => SigningState::Unsigned,
            n if n == self.auth.len() => SigningState::Finalized,
            _ => SigningState::PartiallySigned,
        }
    }

    /// Whether every input is signed.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.state() == SigningState::Finalized
    }

    fn ensure_finalized(&self) -> Result<()> {
        if self.is_finalized() {
            Ok(())
        } else {
            Err(Error::NotFinalized {
                signed: self.signed_count(),
                total: self.auth.len(),
            })
        }
    }

    fn has_witness(&self) -> bool {
        self.auth
            .iter()
            .flatten()
            .any(|auth| !auth.witness.is_empty())
    }

    /// Wire serialization, BIP144 when any input has witness data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] unless every input is signed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.ensure_finalized()?;
        Ok(serialize(&self.unsigned, &self.auth, self.has_witness()))
    }

    /// Hex of [`Self::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] unless every input is signed.
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Transaction ID: hash of the serialization without witness data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] unless every input is signed.
    pub fn txid(&self) -> Result<Txid> {
        self.ensure_finalized()?;
        Ok(Txid(double_sha256(&serialize(
            &self.unsigned,
            &self.auth,
            false,
        ))))
    }

    /// Witness transaction ID: hash of the full serialization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] unless every input is signed.
    pub fn wtxid(&self) -> Result<Txid> {
        Ok(Txid(double_sha256(&self.to_bytes()?)))
    }

    /// BIP141 weight: base size times three plus total size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] unless every input is signed.
    pub fn weight(&self) -> Result<usize> {
        let total_size = self.to_bytes()?.len();
        let base_size = serialize(&self.unsigned, &self.auth, false).len();
        Ok(base_size * 3 + total_size)
    }

    /// Virtual size in vbytes, weight / 4 rounded up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] unless every input is signed.
    pub fn vsize(&self) -> Result<usize> {
        Ok(self.weight()?.div_ceil(4))
    }
}

fn serialize(tx: &UnsignedTransaction, auth: &[Option<InputAuth>], with_witness: bool) -> Vec<u8> {
    let mut data = Vec::with_capacity(10 + tx.inputs.len() * 148 + tx.outputs.len() * 34);

    data.extend_from_slice(&tx.version.to_le_bytes());

    if with_witness {
        data.push(0x00); // marker
        data.push(0x01); // flag
    }

    write_varint(&mut data, tx.inputs.len() as u64);
    for (input, auth) in tx.inputs.iter().zip(auth) {
        input.previous_output.write(&mut data);
        let script_sig = auth.as_ref().map_or(&[][..], |auth| auth.script_sig.as_bytes());
        write_var_bytes(&mut data, script_sig);
        data.extend_from_slice(&input.sequence.to_le_bytes());
    }

    write_varint(&mut data, tx.outputs.len() as u64);
    for output in &tx.outputs {
        output.write(&mut data);
    }

    if with_witness {
        for auth in auth {
            let witness = auth.as_ref().map_or(&[][..], |auth| auth.witness.as_slice());
            write_varint(&mut data, witness.len() as u64);
            for item in witness {
                write_var_bytes(&mut data, item);
            }
        }
    }

    data.extend_from_slice(&tx.lock_time.to_le_bytes());
    data
}

/// Write a Bitcoin CompactSize integer.
pub(crate) fn write_varint(data: &mut Vec<u8>, value: u64) {
    match value {
        0..=252 => data.push(value as u8),
        253..=0xffff => {
            data.push(0xfd);
            data.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            data.push(0xfe);
            data.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            data.push(0xff);
            data.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Write a CompactSize length followed by the bytes.
pub(crate) fn write_var_bytes(data: &mut Vec<u8>, bytes: &[u8]) {
    write_varint(data, bytes.len() as u64);
    data.extend_from_slice(bytes);
}
