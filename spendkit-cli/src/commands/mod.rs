//! CLI command definitions and handlers.

mod bitcoin;

pub use bitcoin::BitcoinCommand;
use clap::{Parser, Subcommand};

/// spendkit - A Bitcoin wallet and transaction signing CLI tool.
#[derive(Parser)]
#[command(name = "spendkit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Bitcoin wallet operations.
    #[command(name = "btc", alias = "bitcoin")]
    Bitcoin(BitcoinCommand),
}
