//! Input signing and template verification.
//!
//! Supports P2PKH, native P2WPKH and P2SH-wrapped P2WPKH inputs. Signatures
//! are RFC6979 deterministic ECDSA, normalized to low-S, DER encoded with the
//! sighash type byte appended.

use k256::ecdsa::Signature;
use tracing::debug;

use crate::hash::hash160;
use crate::keypair::KeyPair;
use crate::public_key::PublicKey;
use crate::script::{Script, ScriptBuilder, ScriptType};
use crate::sighash::SigHashType;
use crate::transaction::{InputAuth, SignedTransaction, TxIn, UnsignedTransaction};
use crate::{AddressType, Error, Result};

/// Signs transaction inputs with a fixed sighash type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signer {
    sighash_type: SigHashType,
}

impl Signer {
    /// A signer committing to every input and output.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sighash_type: SigHashType::All,
        }
    }

    /// A signer using `sighash_type`.
    #[must_use]
    pub const fn with_sighash_type(sighash_type: SigHashType) -> Self {
        Self { sighash_type }
    }

    /// The sighash type this signer commits to.
    #[must_use]
    pub const fn sighash_type(&self) -> SigHashType {
        self.sighash_type
    }

    /// Sign input `index` as an `input_type` spend, returning a new transaction.
    ///
    /// A legacy input without its previous output is signed against the
    /// P2PKH script of `key`.
    ///
    /// # Errors
    ///
    /// - [`Error::InputIndexOutOfRange`] for a missing input.
    /// - [`Error::InvalidInputType`] when the spent script is not P2PKH, P2SH
    ///   or P2WPKH.
    /// - [`Error::Signing`] when the spent script is of another type than
    ///   `input_type`, does not commit to `key`, or a witness input lacks its
    ///   previous output or uses an uncompressed key. Also when signing with
    ///   SIGHASH_SINGLE an input that has no output at the same index, whose
    ///   signature would commit to no outputs at all.
    pub fn sign(
        &self,
        tx: &SignedTransaction,
        index: usize,
        key: &KeyPair,
        input_type: AddressType,
    ) -> Result<SignedTransaction> {
        let unsigned = tx.unsigned();
        let input = input_at(unsigned, index)?;
        if self.sighash_type.is_single() && index >= unsigned.outputs.len() {
            return Err(Error::Signing(format!(
                "SIGHASH_SINGLE input {index} has no matching output"
            )));
        }
        let public_key = key.public_key();
        let key_hash = public_key.hash160();

        if input_type.is_segwit() && !public_key.is_compressed() {
            return Err(Error::Signing(
                "witness inputs require a compressed key".to_string(),
            ));
        }

        let script_pubkey = match (&input.prev_out, input_type) {
            (Some(prev_out), _) => prev_out.script_pubkey.clone(),
            (None, AddressType::P2pkh) => Script::new_p2pkh(&key_hash),
            (None, AddressType::P2wpkh | AddressType::P2shP2wpkh) => {
                return Err(Error::Signing(format!(
                    "input {index} needs its previous output to sign as {input_type}"
                )));
            }
        };

        let script_type = script_pubkey
            .classify()
            .ok_or_else(|| Error::InvalidInputType("nonstandard".to_string()))?;
        let found = input_type_of(&script_type)?;
        if found != input_type {
            return Err(Error::Signing(format!(
                "input {index} spends {found}, not {input_type}"
            )));
        }

        let auth = match script_type {
            ScriptType::P2pkh(hash) => {
                check_committed(hash, key_hash)?;
                let digest = unsigned.legacy_sighash(index, &script_pubkey, self.sighash_type)?;
                let signature = self.signature_bytes(key, &digest)?;
                InputAuth {
                    script_sig: ScriptBuilder::new()
                        .push_slice(&signature)
                        .push_slice(&public_key.to_bytes())
                        .into_script(),
                    witness: Vec::new(),
                }
            }
            ScriptType::P2wpkh(hash) => {
                check_committed(hash, key_hash)?;
                InputAuth {
                    script_sig: Script::new(),
                    witness: self.witness(unsigned, index, key, input)?,
                }
            }
            ScriptType::P2sh(hash) => {
                let redeem_script = key.redeem_script()?;
                check_committed(hash, hash160(redeem_script.as_bytes()))?;
                InputAuth {
                    script_sig: ScriptBuilder::new()
                        .push_slice(redeem_script.as_bytes())
                        .into_script(),
                    witness: self.witness(unsigned, index, key, input)?,
                }
            }
            ScriptType::P2wsh(_) | ScriptType::WitnessProgram { .. } => {
                return Err(Error::InvalidInputType(script_type.name().to_string()));
            }
        };

        debug!(
            index,
            %input_type,
            sighash_type = %self.sighash_type,
            public_key = %public_key,
            "signed input"
        );
        tx.with_input_auth(index, auth)
    }

    /// Sign every input with the same key and input type.
    ///
    /// # Errors
    ///
    /// Fails with the first input that cannot be signed.
    pub fn sign_all(
        &self,
        tx: UnsignedTransaction,
        key: &KeyPair,
        input_type: AddressType,
    ) -> Result<SignedTransaction> {
        let count = tx.inputs.len();
        (0..count).try_fold(SignedTransaction::from(tx), |signed, index| {
            self.sign(&signed, index, key, input_type)
        })
    }

    fn witness(
        &self,
        unsigned: &UnsignedTransaction,
        index: usize,
        key: &KeyPair,
        input: &TxIn,
    ) -> Result<Vec<Vec<u8>>> {
        let amount = input.prev_out.as_ref().map_or(0, |prev_out| prev_out.amount);
        let script_code = Script::new_p2pkh(&key.public_key().hash160());
        let digest = unsigned.segwit_v0_sighash(index, &script_code, amount, self.sighash_type)?;
        Ok(vec![
            self.signature_bytes(key, &digest)?,
            key.public_key().to_bytes(),
        ])
    }

    fn signature_bytes(&self, key: &KeyPair, digest: &[u8; 32]) -> Result<Vec<u8>> {
        let signature = key.private_key().sign_prehash(digest)?;
        let mut bytes = signature.to_der().as_bytes().to_vec();
        bytes.push(self.sighash_type.to_byte());
        Ok(bytes)
    }
}

/// Sign input `index` with SIGHASH_ALL.
///
/// # Errors
///
/// See [`Signer::sign`].
pub fn sign(
    tx: &SignedTransaction,
    index: usize,
    key: &KeyPair,
    input_type: AddressType,
) -> Result<SignedTransaction> {
    Signer::new().sign(tx, index, key, input_type)
}

/// Check the authorization of input `index` against its previous output.
///
/// Recognizes the three templates produced by [`Signer`]: the public key
/// must hash to the spent script, a P2SH redeem script must be the P2WPKH
/// program of that key, and the signature must be valid for the recomputed
/// sighash. This is not a script interpreter.
///
/// Returns `Ok(false)` for an unsigned input or a failed check.
///
/// # Errors
///
/// - [`Error::InputIndexOutOfRange`] for a missing input.
/// - [`Error::InvalidTransaction`] when the input lacks its previous output.
/// - [`Error::InvalidInputType`] for an unsupported spent script.
pub fn verify_input(tx: &SignedTransaction, index: usize) -> Result<bool> {
    let unsigned = tx.unsigned();
    let input = input_at(unsigned, index)?;
    let prev_out = input.prev_out.as_ref().ok_or_else(|| {
        Error::InvalidTransaction(format!("input {index} has no previous output"))
    })?;
    let Some(auth) = tx.input_auth(index) else {
        return Ok(false);
    };
    let script_type = prev_out
        .script_pubkey
        .classify()
        .ok_or_else(|| Error::InvalidInputType("nonstandard".to_string()))?;

    let verified = match script_type {
        ScriptType::P2pkh(hash) => {
            let items = auth.script_sig.push_items().unwrap_or_default();
            let [signature, public_key] = items.as_slice() else {
                return Ok(false);
            };
            auth.witness.is_empty()
                && check_signature(signature, public_key, hash, |sighash_type| {
                    unsigned.legacy_sighash(index, &prev_out.script_pubkey, sighash_type)
                })?
        }
        ScriptType::P2wpkh(hash) => {
            auth.script_sig.is_empty()
                && verify_witness(unsigned, index, prev_out.amount, &auth.witness, hash)?
        }
        ScriptType::P2sh(script_hash) => {
            let items = auth.script_sig.push_items().unwrap_or_default();
            let [redeem_script] = items.as_slice() else {
                return Ok(false);
            };
            let redeem_script = Script::from_bytes(redeem_script.to_vec());
            match redeem_script.classify() {
                Some(ScriptType::P2wpkh(hash))
                    if hash160(redeem_script.as_bytes()) == script_hash =>
                {
                    verify_witness(unsigned, index, prev_out.amount, &auth.witness, hash)?
                }
                _ => false,
            }
        }
        ScriptType::P2wsh(_) | ScriptType::WitnessProgram { .. } => {
            return Err(Error::InvalidInputType(script_type.name().to_string()));
        }
    };
    Ok(verified)
}

fn verify_witness(
    unsigned: &UnsignedTransaction,
    index: usize,
    amount: u64,
    witness: &[Vec<u8>],
    key_hash: [u8; 20],
) -> Result<bool> {
    let [signature, public_key] = witness else {
        return Ok(false);
    };
    let script_code = Script::new_p2pkh(&key_hash);
    check_signature(signature, public_key, key_hash, |sighash_type| {
        unsigned.segwit_v0_sighash(index, &script_code, amount, sighash_type)
    })
}

fn check_signature(
    signature: &[u8],
    public_key: &[u8],
    key_hash: [u8; 20],
    sighash: impl FnOnce(SigHashType) -> Result<[u8; 32]>,
) -> Result<bool> {
    if hash160(public_key) != key_hash {
        return Ok(false);
    }
    let Ok(public_key) = PublicKey::from_bytes(public_key) else {
        return Ok(false);
    };
    let Some((&type_byte, der)) = signature.split_last() else {
        return Ok(false);
    };
    let Some(sighash_type) = SigHashType::from_u32(u32::from(type_byte)) else {
        return Ok(false);
    };
    let Ok(signature) = Signature::from_der(der) else {
        return Ok(false);
    };
    let digest = sighash(sighash_type)?;
    Ok(public_key.verify_prehash(&digest, &signature))
}

fn input_at(unsigned: &UnsignedTransaction, index: usize) -> Result<&TxIn> {
    unsigned
        .inputs
        .get(index)
        .ok_or(Error::InputIndexOutOfRange {
            index,
            count: unsigned.inputs.len(),
        })
}

fn input_type_of(script_type: &ScriptType) -> Result<AddressType> {
    match script_type {
        ScriptType::P2pkh(_) => Ok(AddressType::P2pkh),
        ScriptType::P2sh(_) => Ok(AddressType::P2shP2wpkh),
        ScriptType::P2wpkh(_) => Ok(AddressType::P2wpkh),
        ScriptType::P2wsh(_) | ScriptType::WitnessProgram { .. } => {
            Err(Error::InvalidInputType(script_type.name().to_string()))
        }
    }
}

fn check_committed(expected: [u8; 20], actual: [u8; 20]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::Signing(
            "key does not match the spent script".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransactionBuilder;
    use crate::transaction::{OutPoint, PrevOut, SigningState, Txid};
    use crate::{Network, PrivateKey};

    const P2WPKH_WIF: &str = "cVVdic9ir4UjZsSXgds6fCRAD1GEYnhVZLNgfDKH31g67Q21yF38";
    const PREV_TXID: &str = "cd9515d966925d8cb86738a3521773f97222ebcddaefa54e366b2321b3aeae37";

    fn spend(key: &KeyPair, input_type: AddressType, destination: &str) -> UnsignedTransaction {
        let prev_out = PrevOut {
            script_pubkey: key.script_pubkey(input_type).unwrap(),
            amount: 100_000,
        };
        let change = key.address(input_type).unwrap();
        TransactionBuilder::new(Network::Testnet)
            .add_input(TxIn::new(
                OutPoint::new(PREV_TXID.parse::<Txid>().unwrap(), 0),
                Some(prev_out),
            ))
            .add_output(destination, 90_000)
            .add_output(change.as_str(), 9_000)
            .build()
            .unwrap()
    }

    #[test]
    fn test_sign_p2wpkh_vector() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        let tx = spend(
            &key,
            AddressType::P2wpkh,
            "tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0",
        );
        assert_eq!(
            tx.to_hex(),
            "020000000137aeaeb321236b364ea5efdacdeb2272f9731752a33867b88c5d9266d91595cd0000000000ffffffff02905f0100000000001600148cb207091e78536c16d50b093fed32f8c68b85f82823000000000000160014f25e193af88c84263dd5e707ba1cb47e91f629a800000000"
        );

        let signed = Signer::new().sign_all(tx, &key, AddressType::P2wpkh).unwrap();
        assert_eq!(signed.state(), SigningState::Finalized);
        assert_eq!(
            signed.to_hex().unwrap(),
            "0200000000010137aeaeb321236b364ea5efdacdeb2272f9731752a33867b88c5d9266d91595cd0000000000ffffffff02905f0100000000001600148cb207091e78536c16d50b093fed32f8c68b85f82823000000000000160014f25e193af88c84263dd5e707ba1cb47e91f629a802483045022100ceb01f2db3e4452a2e8bbdd616497f0c9226ea0e8d2dd708cd4f0a34d948af8502205a844d2a52527eb7c0e507dcaf98a5d287e0648deea50861e436c872c4b916e10121020c7f4de1cc760fc068775b1513d67d0a7802f0b4b1c61aa85784ebf722905b2700000000"
        );
        assert!(signed.input_auth(0).unwrap().script_sig.is_empty());
        assert!(verify_input(&signed, 0).unwrap());
    }

    #[test]
    fn test_deterministic() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        let tx = SignedTransaction::from(spend(
            &key,
            AddressType::P2wpkh,
            "tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0",
        ));
        let first = sign(&tx, 0, &key, AddressType::P2wpkh).unwrap();
        let second = sign(&tx, 0, &key, AddressType::P2wpkh).unwrap();
        assert_eq!(first, second);
        assert_eq!(tx.state(), SigningState::Unsigned);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        let tx = SignedTransaction::from(spend(
            &key,
            AddressType::P2pkh,
            "n3b3ebu35pK5AQ3dKHR27qHqCCrTSCHEaG",
        ));
        assert!(matches!(
            sign(&tx, 0, &key, AddressType::P2wpkh),
            Err(Error::Signing(_))
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        let other = KeyPair::from_private_key_hex(
            "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d",
            Network::Testnet,
        )
        .unwrap();
        for input_type in AddressType::ALL {
            let tx = SignedTransaction::from(spend(
                &key,
                input_type,
                "tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0",
            ));
            assert!(matches!(
                sign(&tx, 0, &other, input_type),
                Err(Error::Signing(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_script() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        let tx = TransactionBuilder::new(Network::Testnet)
            .add_input(TxIn::new(
                OutPoint::new(Txid::from_byte_array([1; 32]), 0),
                Some(PrevOut {
                    script_pubkey: Script::new_witness_program(0, &[0x44; 32]).unwrap(),
                    amount: 10_000,
                }),
            ))
            .add_output("tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0", 5_000)
            .build()
            .unwrap();
        assert!(matches!(
            sign(&tx.into(), 0, &key, AddressType::P2wpkh),
            Err(Error::InvalidInputType(_))
        ));
    }

    #[test]
    fn test_witness_requires_prev_out() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        let mut unsigned = spend(
            &key,
            AddressType::P2wpkh,
            "tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0",
        );
        unsigned.inputs[0].prev_out = None;
        assert!(matches!(
            sign(&unsigned.into(), 0, &key, AddressType::P2wpkh),
            Err(Error::Signing(_))
        ));
    }

    #[test]
    fn test_legacy_without_prev_out() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        let mut unsigned = spend(
            &key,
            AddressType::P2pkh,
            "n3b3ebu35pK5AQ3dKHR27qHqCCrTSCHEaG",
        );
        let with_prev_out = sign(&unsigned.clone().into(), 0, &key, AddressType::P2pkh).unwrap();
        unsigned.inputs[0].prev_out = None;
        let without = sign(&unsigned.into(), 0, &key, AddressType::P2pkh).unwrap();
        assert_eq!(with_prev_out.to_hex().unwrap(), without.to_hex().unwrap());
        assert!(verify_input(&with_prev_out, 0).unwrap());
        assert!(verify_input(&without, 0).is_err());
    }

    #[test]
    fn test_uncompressed_key_legacy_only() {
        let private_key = PrivateKey::from_hex(
            "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d",
        )
        .unwrap()
        .with_compression(false);
        let key = KeyPair::new(private_key, Network::Testnet);
        let prev_out = PrevOut {
            script_pubkey: Script::new_p2wpkh(&key.public_key().hash160()),
            amount: 100_000,
        };
        let tx = TransactionBuilder::new(Network::Testnet)
            .add_input(TxIn::new(
                OutPoint::new(Txid::from_byte_array([2; 32]), 0),
                Some(prev_out),
            ))
            .add_output("tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0", 90_000)
            .build()
            .unwrap();
        assert!(matches!(
            sign(&tx.into(), 0, &key, AddressType::P2wpkh),
            Err(Error::Signing(_))
        ));

        let legacy = spend(&key, AddressType::P2pkh, "n3b3ebu35pK5AQ3dKHR27qHqCCrTSCHEaG");
        let signed = sign(&legacy.into(), 0, &key, AddressType::P2pkh).unwrap();
        assert!(verify_input(&signed, 0).unwrap());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        for input_type in AddressType::ALL {
            let unsigned = spend(&key, input_type, "tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0");
            assert!(!verify_input(&unsigned.clone().into(), 0).unwrap());

            let signed = sign(&unsigned.into(), 0, &key, input_type).unwrap();
            assert!(verify_input(&signed, 0).unwrap());

            let mut tampered = signed.unsigned().clone();
            tampered.outputs[0].amount -= 1;
            let auth = signed.input_auth(0).unwrap().clone();
            let tampered = SignedTransaction::from(tampered)
                .with_input_auth(0, auth)
                .unwrap();
            assert!(!verify_input(&tampered, 0).unwrap());
        }
    }

    #[test]
    fn test_single_without_matching_output() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        let prev_out = PrevOut {
            script_pubkey: key.script_pubkey(AddressType::P2pkh).unwrap(),
            amount: 50_000,
        };
        let unsigned = TransactionBuilder::new(Network::Testnet)
            .add_input(TxIn::new(
                OutPoint::new(Txid::from_byte_array([1; 32]), 0),
                Some(prev_out.clone()),
            ))
            .add_input(TxIn::new(
                OutPoint::new(Txid::from_byte_array([1; 32]), 1),
                Some(prev_out),
            ))
            .add_output("n3b3ebu35pK5AQ3dKHR27qHqCCrTSCHEaG", 90_000)
            .build()
            .unwrap();
        let tx = SignedTransaction::from(unsigned);
        let signer = Signer::with_sighash_type(SigHashType::Single);

        let first = signer.sign(&tx, 0, &key, AddressType::P2pkh).unwrap();
        assert!(verify_input(&first, 0).unwrap());
        assert!(matches!(
            signer.sign(&first, 1, &key, AddressType::P2pkh),
            Err(Error::Signing(_))
        ));
        assert!(matches!(
            Signer::with_sighash_type(SigHashType::SingleAnyoneCanPay).sign(
                &tx,
                1,
                &key,
                AddressType::P2pkh
            ),
            Err(Error::Signing(_))
        ));
        assert!(Signer::new().sign(&first, 1, &key, AddressType::P2pkh).is_ok());
    }

    #[test]
    fn test_index_out_of_range() {
        let key = KeyPair::from_wif(P2WPKH_WIF).unwrap();
        let tx = SignedTransaction::from(spend(
            &key,
            AddressType::P2wpkh,
            "tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0",
        ));
        assert!(matches!(
            sign(&tx, 1, &key, AddressType::P2wpkh),
            Err(Error::InputIndexOutOfRange { index: 1, count: 1 })
        ));
        assert!(matches!(
            verify_input(&tx, 3),
            Err(Error::InputIndexOutOfRange { index: 3, count: 1 })
        ));
    }
}
