//! Core seed handling for the spendkit Bitcoin toolkit.
//!
//! This crate provides the [`Wallet`] type that holds a BIP39 mnemonic and
//! the 64-byte seed derived from it. Chain-specific crates consume the seed
//! for BIP32 derivation.
//!
//! # Example
//!
//! ```
//! use spendkit_core::Wallet;
//!
//! let wallet = Wallet::from_mnemonic(
//!     "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
//!     None,
//! )?;
//! assert_eq!(wallet.seed().len(), 64);
//! # Ok::<(), spendkit_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod error;
mod wallet;

pub use error::{Error, Result};
pub use wallet::Wallet;
