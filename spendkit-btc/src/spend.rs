//! Single-UTXO spend: build, sign and serialize in one call.

use tracing::debug;

use crate::builder::TransactionBuilder;
use crate::keypair::KeyPair;
use crate::script::Script;
use crate::signer::Signer;
use crate::transaction::{OutPoint, PrevOut, TxIn, Txid};
use crate::{AddressType, Result};

/// An unspent output controlled by the spending key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    /// Transaction that created the output.
    pub txid: Txid,
    /// Output index.
    pub vout: u32,
    /// Value in satoshis.
    pub amount: u64,
    /// Locking script. Defaults to the key's script for the input type.
    pub script_pubkey: Option<Script>,
}

/// Everything needed to spend one UTXO to a destination plus change.
#[derive(Debug, Clone)]
pub struct SpendRequest {
    /// Key controlling the UTXO.
    pub key: KeyPair,
    /// How the UTXO is locked.
    pub input_type: AddressType,
    /// The output being spent.
    pub utxo: Utxo,
    /// Destination address.
    pub destination: String,
    /// Amount sent to the destination.
    pub amount: u64,
    /// Change address. Defaults to the key's own address of `input_type`.
    pub change_address: Option<String>,
    /// Amount returned as change. Zero omits the change output.
    pub change_amount: u64,
    /// Transaction lock time.
    pub lock_time: u32,
}

/// A signed, serialized spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendResult {
    /// Wire serialization, ready to broadcast.
    pub transaction_hex: String,
    /// Transaction ID.
    pub txid: Txid,
    /// Virtual size in vbytes.
    pub vsize: usize,
    /// Input value minus output values.
    pub fee: u64,
}

/// Build and sign a spend of `request.utxo`.
///
/// # Errors
///
/// Fails when an address does not decode, the outputs exceed the UTXO, or
/// the key does not control the UTXO.
pub fn spend(request: &SpendRequest) -> Result<SpendResult> {
    let key = &request.key;
    let script_pubkey = match &request.utxo.script_pubkey {
        Some(script) => script.clone(),
        None => key.script_pubkey(request.input_type)?,
    };
    let input = TxIn::new(
        OutPoint::new(request.utxo.txid, request.utxo.vout),
        Some(PrevOut {
            script_pubkey,
            amount: request.utxo.amount,
        }),
    );

    let mut builder = TransactionBuilder::new(key.network());
    builder
        .lock_time(request.lock_time)
        .add_input(input)
        .add_output(request.destination.as_str(), request.amount);
    if request.change_amount > 0 {
        match &request.change_address {
            Some(address) => builder.add_output(address.as_str(), request.change_amount),
            None => builder.add_output_script(
                key.script_pubkey(request.input_type)?,
                request.change_amount,
            ),
        };
    }
    let unsigned = builder.build()?;
    let fee = unsigned.fee().unwrap_or_default();

    let signed = Signer::new().sign_all(unsigned, key, request.input_type)?;
    let result = SpendResult {
        transaction_hex: signed.to_hex()?,
        txid: signed.txid()?,
        vsize: signed.vsize()?,
        fee,
    };
    debug!(txid = %result.txid, vsize = result.vsize, fee, "spend signed");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn request(change_amount: u64) -> SpendRequest {
        SpendRequest {
            key: KeyPair::from_wif("cVVdic9ir4UjZsSXgds6fCRAD1GEYnhVZLNgfDKH31g67Q21yF38")
                .unwrap(),
            input_type: AddressType::P2wpkh,
            utxo: Utxo {
                txid: "cd9515d966925d8cb86738a3521773f97222ebcddaefa54e366b2321b3aeae37"
                    .parse()
                    .unwrap(),
                vout: 0,
                amount: 100_000,
                script_pubkey: None,
            },
            destination: "tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0".to_string(),
            amount: 90_000,
            change_address: None,
            change_amount,
            lock_time: 0,
        }
    }

    #[test]
    fn test_spend_with_default_change() {
        let result = spend(&request(9_000)).unwrap();
        assert_eq!(
            result.txid.to_string(),
            "6b4eeaa91897a397efa417ff423292fdb2e7e11893c7445376bd1a0d48bd9ae1"
        );
        assert_eq!(result.vsize, 141);
        assert_eq!(result.fee, 1_000);
    }

    #[test]
    fn test_zero_change_omitted() {
        let result = spend(&request(0)).unwrap();
        assert_eq!(result.fee, 10_000);
        // one output: count byte 0x01 follows the input's sequence
        assert!(result.transaction_hex.contains("ffffffff01905f010000000000"));
    }

    #[test]
    fn test_explicit_change_address() {
        let mut req = request(9_000);
        req.change_address = Some("n3b3ebu35pK5AQ3dKHR27qHqCCrTSCHEaG".to_string());
        let result = spend(&req).unwrap();
        assert!(result.transaction_hex.contains("76a914f218e68f209728c9083e2180ad5c326faf2b4aa988ac"));
    }

    #[test]
    fn test_overspend() {
        let mut req = request(20_000);
        req.amount = 90_000;
        assert!(matches!(
            spend(&req),
            Err(Error::InsufficientFunds {
                available: 100_000,
                required: 110_000
            })
        ));
    }

    #[test]
    fn test_mainnet_destination_on_testnet() {
        let mut req = request(9_000);
        req.destination = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".to_string();
        assert!(matches!(spend(&req), Err(Error::InvalidOutput { index: 0, .. })));
    }
}
