//! Bitcoin keys, addresses, HD derivation and transaction signing.
//!
//! Covers the three single-key output types: legacy P2PKH, native segwit
//! P2WPKH and P2SH-wrapped P2WPKH, on mainnet and testnet.
//!
//! # Features
//!
//! - `rand` (default): random key generation for [`KeyPair`] and
//!   [`StandardWallet`]
//!
//! # Usage
//!
//! ```
//! use spendkit_core::Wallet;
//! use spendkit_btc::{AddressType, Deriver, Network};
//!
//! let wallet = Wallet::from_mnemonic(
//!     "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
//!     None,
//! )?;
//! let deriver = Deriver::new(&wallet, Network::Mainnet)?;
//! let derived = deriver.derive(AddressType::P2wpkh, 0, false, 0)?;
//! assert_eq!(derived.address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
//! # Ok::<(), spendkit_btc::Error>(())
//! ```
//!
//! Spending a UTXO:
//!
//! ```
//! use spendkit_btc::{AddressType, KeyPair, SpendRequest, Utxo, spend};
//!
//! let key = KeyPair::from_wif("cVVdic9ir4UjZsSXgds6fCRAD1GEYnhVZLNgfDKH31g67Q21yF38")?;
//! let result = spend(&SpendRequest {
//!     key,
//!     input_type: AddressType::P2wpkh,
//!     utxo: Utxo {
//!         txid: "cd9515d966925d8cb86738a3521773f97222ebcddaefa54e366b2321b3aeae37".parse()?,
//!         vout: 0,
//!         amount: 100_000,
//!         script_pubkey: None,
//!     },
//!     destination: "tb1q3jeqwzg70pfkc9k4pvynlmfjlrrghp0c0hkeq0".to_string(),
//!     amount: 90_000,
//!     change_address: None,
//!     change_amount: 9_000,
//!     lock_time: 0,
//! })?;
//! assert_eq!(result.fee, 1_000);
//! # Ok::<(), spendkit_btc::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod address;
mod builder;
mod deriver;
pub mod encoding;
mod error;
mod extended_key;
pub mod hash;
mod keypair;
mod network;
mod path;
mod private_key;
mod public_key;
mod script;
mod sighash;
mod signer;
mod spend;
mod standard_wallet;
mod transaction;
mod types;
mod xpub;

pub use address::{
    Address, from_output_script, is_valid_address, p2pkh, p2sh_p2wpkh, p2wpkh_address,
    p2wpkh_script, to_output_script,
};
pub use builder::{MAX_MONEY, TransactionBuilder, build};
pub use deriver::{DerivedAddress, Deriver, derive};
pub use error::{AddressDecodeError, Error};
pub use extended_key::ExtendedPrivateKey;
pub use keypair::KeyPair;
pub use network::{Network, NetworkParams, ParseNetworkError};
pub use path::{ChildNumber, DerivationPath};
pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use script::{Script, ScriptBuilder, ScriptType, opcodes};
pub use sighash::SigHashType;
pub use signer::{Signer, sign, verify_input};
pub use spend::{SpendRequest, SpendResult, Utxo, spend};
pub use standard_wallet::StandardWallet;
pub use transaction::{
    InputAuth, OutPoint, PrevOut, SignedTransaction, SigningState, TxIn, TxOut, Txid,
    UnsignedTransaction,
};
pub use types::{AddressType, ParseAddressTypeError};
pub use xpub::ExtendedPublicKey;

/// Result alias for spendkit-btc operations.
pub type Result<T> = core::result::Result<T, Error>;
