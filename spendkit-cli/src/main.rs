//! spendkit - A Bitcoin wallet and transaction signing CLI tool.
//!
//! Generate keys, derive HD addresses and sign single-UTXO spends for
//! P2PKH, P2WPKH and P2SH-P2WPKH outputs.

mod commands;
mod logging;

use clap::Parser;
use commands::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Bitcoin(cmd) => cmd.execute()?,
    }
    Ok(())
}
