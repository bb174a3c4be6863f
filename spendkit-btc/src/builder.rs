//! Unsigned transaction construction.

use tracing::debug;

use crate::address::{from_output_script, to_output_script};
use crate::script::Script;
use crate::transaction::{TxIn, TxOut, UnsignedTransaction};
use crate::{Error, Network, Result};

/// Largest amount any output may carry: 21,000,000 BTC in satoshis.
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

#[derive(Debug, Clone)]
enum Recipient {
    Address(String),
    Script(Script),
}

/// Builder for an [`UnsignedTransaction`].
///
/// Outputs are validated when [`TransactionBuilder::build`] runs, so errors
/// carry the index of the offending output.
///
/// # Example
///
/// ```
/// use spendkit_btc::{Network, OutPoint, PrevOut, Script, TransactionBuilder, TxIn, Txid};
///
/// let txid: Txid = "cd9515d966925d8cb86738a3521773f97222ebcddaefa54e366b2321b3aeae37"
///     .parse()
///     .unwrap();
/// let prev_out = PrevOut {
///     script_pubkey: Script::new_p2wpkh(&[0u8; 20]),
///     amount: 100_000,
/// };
///
/// let tx = TransactionBuilder::new(Network::Testnet)
///     .add_input(TxIn::new(OutPoint::new(txid, 0), Some(prev_out)))
///     .add_output("tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0", 90_000)
///     .build()
///     .unwrap();
/// assert_eq!(tx.fee(), Some(10_000));
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    network: Network,
    version: i32,
    lock_time: u32,
    inputs: Vec<TxIn>,
    outputs: Vec<(Recipient, u64)>,
}

impl TransactionBuilder {
    /// Create a builder for a version 2 transaction with lock time 0.
    #[must_use]
    pub const fn new(network: Network) -> Self {
        Self {
            network,
            version: 2,
            lock_time: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the transaction version.
    pub fn version(&mut self, version: i32) -> &mut Self {
        self.version = version;
        self
    }

    /// Set the lock time.
    pub fn lock_time(&mut self, lock_time: u32) -> &mut Self {
        self.lock_time = lock_time;
        self
    }

    /// Add an input.
    pub fn add_input(&mut self, input: TxIn) -> &mut Self {
        self.inputs.push(input);
        self
    }

    /// Add an output paying `amount` satoshis to `address`.
    pub fn add_output(&mut self, address: impl Into<String>, amount: u64) -> &mut Self {
        self.outputs.push((Recipient::Address(address.into()), amount));
        self
    }

    /// Add an output paying `amount` satoshis to a raw scriptPubKey.
    ///
    /// The script must still encode as an address on the builder's network.
    pub fn add_output_script(&mut self, script_pubkey: Script, amount: u64) -> &mut Self {
        self.outputs.push((Recipient::Script(script_pubkey), amount));
        self
    }

    /// Validate and assemble the transaction.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTransaction`] without inputs or outputs.
    /// - [`Error::InvalidOutput`] for an address that does not decode on this
    ///   network, or an amount that is zero or above [`MAX_MONEY`].
    /// - [`Error::InsufficientFunds`] when every input amount is known and
    ///   the outputs spend more.
    pub fn build(&self) -> Result<UnsignedTransaction> {
        if self.inputs.is_empty() {
            return Err(Error::InvalidTransaction("no inputs".to_string()));
        }
        if self.outputs.is_empty() {
            return Err(Error::InvalidTransaction("no outputs".to_string()));
        }

        let outputs = self
            .outputs
            .iter()
            .enumerate()
            .map(|(index, (recipient, amount))| self.resolve_output(index, recipient, *amount))
            .collect::<Result<Vec<_>>>()?;

        let tx = UnsignedTransaction {
            version: self.version,
            inputs: self.inputs.clone(),
            outputs,
            lock_time: self.lock_time,
        };

        let required = tx
            .outputs
            .iter()
            .try_fold(0u64, |sum, output| sum.checked_add(output.amount))
            .ok_or_else(|| Error::InvalidTransaction("output total overflows".to_string()))?;
        if required > MAX_MONEY {
            return Err(Error::InvalidTransaction(
                "output total exceeds 21,000,000 BTC".to_string(),
            ));
        }
        if let Some(available) = tx.total_input_amount()
            && required > available
        {
            return Err(Error::InsufficientFunds {
                available,
                required,
            });
        }

        debug!(
            network = %self.network,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            fee = ?tx.fee(),
            "built transaction"
        );
        Ok(tx)
    }

    fn resolve_output(&self, index: usize, recipient: &Recipient, amount: u64) -> Result<TxOut> {
        if amount == 0 {
            return Err(Error::InvalidOutput {
                index,
                reason: "amount is zero".to_string(),
            });
        }
        if amount > MAX_MONEY {
            return Err(Error::InvalidOutput {
                index,
                reason: format!("amount {amount} exceeds 21,000,000 BTC"),
            });
        }

        let script_pubkey = match recipient {
            Recipient::Address(address) => {
                to_output_script(address, self.network).map_err(|e| Error::InvalidOutput {
                    index,
                    reason: e.to_string(),
                })?
            }
            Recipient::Script(script) => {
                from_output_script(script, self.network).map_err(|e| Error::InvalidOutput {
                    index,
                    reason: e.to_string(),
                })?;
                script.clone()
            }
        };
        Ok(TxOut::new(amount, script_pubkey))
    }
}

/// Build an unsigned transaction from inputs and `(address, amount)` pairs.
///
/// # Errors
///
/// See [`TransactionBuilder::build`].
pub fn build<A: AsRef<str>>(
    inputs: Vec<TxIn>,
    outputs: &[(A, u64)],
    lock_time: u32,
    network: Network,
) -> Result<UnsignedTransaction> {
    let mut builder = TransactionBuilder::new(network);
    builder.lock_time(lock_time);
    for input in inputs {
        builder.add_input(input);
    }
    for (address, amount) in outputs {
        builder.add_output(address.as_ref(), *amount);
    }
    builder.build()
}
