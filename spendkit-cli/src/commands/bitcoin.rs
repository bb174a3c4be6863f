//! Bitcoin wallet CLI commands.

use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use spendkit_btc::{
    Address, AddressType, DerivationPath, DerivedAddress, Deriver, Error, KeyPair, Network,
    SpendRequest, StandardWallet, Txid, Utxo, spend,
};
use spendkit_core::Wallet;

/// Bitcoin wallet operations.
#[derive(Args)]
pub struct BitcoinCommand {
    /// Network to use (bitcoin or testnet).
    #[arg(
        short,
        long,
        global = true,
        env = "SPENDKIT_NETWORK",
        default_value = "bitcoin"
    )]
    network: Network,

    #[command(subcommand)]
    command: BitcoinSubcommand,
}

#[derive(Subcommand)]
enum BitcoinSubcommand {
    /// Generate a new wallet (with mnemonic).
    New {
        /// Number of mnemonic words (12, 15, 18, 21, or 24).
        #[arg(short, long, default_value = "12")]
        words: usize,

        /// BIP39 passphrase (optional extra security).
        #[arg(short, long)]
        passphrase: Option<String>,

        /// Address type to generate.
        #[arg(short, long, value_enum, default_value = "native-segwit")]
        address_type: CliAddressType,

        /// Number of addresses to derive.
        #[arg(short, long, default_value = "1")]
        count: u32,
    },

    /// Generate a random single-key wallet (no mnemonic).
    Random {
        /// Address type to generate.
        #[arg(short, long, value_enum, default_value = "native-segwit")]
        address_type: CliAddressType,
    },

    /// Import wallet from mnemonic phrase.
    Import {
        /// BIP39 mnemonic phrase.
        #[arg(short, long)]
        mnemonic: String,

        /// BIP39 passphrase (if used when creating).
        #[arg(short, long)]
        passphrase: Option<String>,

        /// Address type to generate.
        #[arg(short, long, value_enum, default_value = "native-segwit")]
        address_type: CliAddressType,

        /// Number of addresses to derive.
        #[arg(short, long, default_value = "1")]
        count: u32,
    },

    /// Import wallet from a private key (WIF or hex).
    ImportKey {
        /// Private key in WIF format, or 32 bytes of hex.
        #[arg(short, long)]
        key: String,

        /// Address type to generate.
        #[arg(short, long, value_enum, default_value = "native-segwit")]
        address_type: CliAddressType,
    },

    /// Derive an address from a hex seed.
    Derive {
        /// Seed as hex (16 to 64 bytes).
        #[arg(short, long)]
        seed: String,

        /// Derivation path; its purpose selects the address type.
        #[arg(long, conflicts_with = "address_type")]
        path: Option<DerivationPath>,

        /// Address type, deriving the standard path for it.
        #[arg(short, long, value_enum)]
        address_type: Option<CliAddressType>,

        /// Account index for the standard path.
        #[arg(long, default_value = "0")]
        account: u32,

        /// First address index for the standard path.
        #[arg(short, long, default_value = "0")]
        index: u32,

        /// Number of addresses to derive on the standard path.
        #[arg(short, long, default_value = "1")]
        count: u32,
    },

    /// Check that an address is valid on the network.
    Validate {
        /// Address to check.
        address: String,
    },

    /// Sign a spend of one UTXO to a destination plus change.
    Spend {
        /// Private key controlling the UTXO, in WIF format.
        #[arg(short, long)]
        key: String,

        /// How the UTXO is locked.
        #[arg(short, long, value_enum, default_value = "native-segwit")]
        address_type: CliAddressType,

        /// Transaction ID of the UTXO.
        #[arg(long)]
        txid: Txid,

        /// Output index of the UTXO.
        #[arg(long)]
        vout: u32,

        /// Value of the UTXO in satoshis.
        #[arg(long)]
        utxo_amount: u64,

        /// Destination address.
        #[arg(long)]
        to: String,

        /// Amount to send in satoshis.
        #[arg(long)]
        amount: u64,

        /// Fee in satoshis; the rest returns as change.
        #[arg(long)]
        fee: u64,

        /// Change address (defaults to the key's own address).
        #[arg(long)]
        change_address: Option<String>,

        /// Transaction lock time.
        #[arg(long, default_value = "0")]
        lock_time: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliAddressType {
    /// Legacy P2PKH (starts with 1)
    Legacy,
    /// `SegWit` P2SH-P2WPKH (starts with 3)
    Segwit,
    /// Native `SegWit` P2WPKH (starts with bc1q)
    NativeSegwit,
}

impl From<CliAddressType> for AddressType {
    fn from(val: CliAddressType) -> Self {
        match val {
            CliAddressType::Legacy => Self::P2pkh,
            CliAddressType::Segwit => Self::P2shP2wpkh,
            CliAddressType::NativeSegwit => Self::P2wpkh,
        }
    }
}

impl BitcoinCommand {
    /// Execute the Bitcoin command.
    pub fn execute(self) -> Result<(), Box<dyn std::error::Error>> {
        let network = self.network;
        match self.command {
            BitcoinSubcommand::New {
                words,
                passphrase,
                address_type,
                count,
            } => {
                let wallet = Wallet::generate(words, passphrase.as_deref())?;
                let deriver = Deriver::new(&wallet, network)?;
                print_wallet(&wallet, &deriver, address_type.into(), count)?;
            }
            BitcoinSubcommand::Random { address_type } => {
                let wallet = StandardWallet::generate(network, address_type.into())?;
                print_standard_wallet(&wallet);
            }
            BitcoinSubcommand::Import {
                mnemonic,
                passphrase,
                address_type,
                count,
            } => {
                let wallet = Wallet::from_mnemonic(&mnemonic, passphrase.as_deref())?;
                let deriver = Deriver::new(&wallet, network)?;
                print_wallet(&wallet, &deriver, address_type.into(), count)?;
            }
            BitcoinSubcommand::ImportKey { key, address_type } => {
                let wallet = match StandardWallet::from_wif(&key, address_type.into()) {
                    Err(Error::InvalidWif(_)) => {
                        StandardWallet::from_private_key_hex(&key, network, address_type.into())?
                    }
                    other => other?,
                };
                print_standard_wallet(&wallet);
            }
            BitcoinSubcommand::Derive {
                seed,
                path,
                address_type,
                account,
                index,
                count,
            } => {
                let deriver = Deriver::from_seed_hex(&seed, network)?;
                let addresses = match path {
                    Some(path) => vec![deriver.derive_by_purpose(&path)?],
                    None => {
                        let address_type = address_type.map_or(AddressType::P2wpkh, Into::into);
                        deriver.derive_many(address_type, account, false, index, count)?
                    }
                };
                print_derived(network, &addresses);
            }
            BitcoinSubcommand::Validate { address } => {
                let parsed = Address::parse(&address, network)?;
                print_validated(&parsed);
            }
            BitcoinSubcommand::Spend {
                key,
                address_type,
                txid,
                vout,
                utxo_amount,
                to,
                amount,
                fee,
                change_address,
                lock_time,
            } => {
                let key = KeyPair::from_wif(&key)?;
                if key.network() != network {
                    return Err(format!("key is for {}, not {network}", key.network()).into());
                }
                let required = amount.saturating_add(fee);
                let change_amount =
                    utxo_amount
                        .checked_sub(required)
                        .ok_or(Error::InsufficientFunds {
                            available: utxo_amount,
                            required,
                        })?;

                let result = spend(&SpendRequest {
                    key,
                    input_type: address_type.into(),
                    utxo: Utxo {
                        txid,
                        vout,
                        amount: utxo_amount,
                        script_pubkey: None,
                    },
                    destination: to,
                    amount,
                    change_address,
                    change_amount,
                    lock_time,
                })?;
                print_spend(&result, change_amount);
            }
        }
        Ok(())
    }
}

#[rustfmt::skip]
fn print_wallet(
    wallet: &Wallet,
    deriver: &Deriver,
    address_type: AddressType,
    count: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let addresses = deriver.derive_many(address_type, 0, false, 0, count)?;

    println!();
    println!("      {}      {}", "Network".cyan().bold(), deriver.network());
    println!("      {} {}", "Address Type".cyan().bold(), address_type.name());
    println!("      {}     {}", "Mnemonic".cyan().bold(), wallet.mnemonic());
    if wallet.has_passphrase() {
        println!("      {}   {}", "Passphrase".cyan().bold(), "(set)".dimmed());
    }
    println!();
    print_addresses(&addresses);

    Ok(())
}

#[rustfmt::skip]
fn print_derived(network: Network, addresses: &[DerivedAddress]) {
    println!();
    println!("      {}      {}", "Network".cyan().bold(), network);
    if let Some(first) = addresses.first() {
        println!("      {} {}", "Address Type".cyan().bold(), first.address_type.name());
    }
    println!();
    print_addresses(addresses);
}

#[rustfmt::skip]
fn print_addresses(addresses: &[DerivedAddress]) {
    for (i, addr) in addresses.iter().enumerate() {
        if addresses.len() > 1 {
            println!("      {}        {}", "Index".cyan().bold(), format!("[{i}]").dimmed());
        }
        println!("      {}         {}", "Path".cyan().bold(), addr.path);
        println!("      {}      {}", "Address".cyan().bold(), addr.address.green());
        println!("      {}  {}", "Private Key".cyan().bold(), addr.private_key_wif.as_str());
        if let Some(redeem_script) = &addr.redeem_script_hex {
            println!("      {}       {}", "Redeem".cyan().bold(), redeem_script.dimmed());
        }
        if i + 1 < addresses.len() {
            println!();
        }
    }
    println!();
}

#[rustfmt::skip]
fn print_standard_wallet(wallet: &StandardWallet) {
    println!();
    println!("      {}      {}", "Network".cyan().bold(), wallet.network());
    println!("      {} {}", "Address Type".cyan().bold(), wallet.address_type().name());
    println!("      {}      {}", "Address".cyan().bold(), wallet.address_string().green());
    println!("      {}  {}", "Private Key".cyan().bold(), wallet.private_key_wif().as_str());
    println!("      {}   {}", "Public Key".cyan().bold(), wallet.public_key_hex().dimmed());
    if let Some(redeem_script) = wallet.redeem_script_hex() {
        println!("      {}       {}", "Redeem".cyan().bold(), redeem_script.dimmed());
    }
    println!();
}

#[rustfmt::skip]
fn print_validated(address: &Address) {
    let kind = address.script_type().map_or("unknown", |script_type| script_type.name());

    println!();
    println!("      {}      {}", "Address".cyan().bold(), address.as_str().green());
    println!("      {}      {}", "Network".cyan().bold(), address.network());
    println!("      {}         {}", "Type".cyan().bold(), kind);
    println!("      {}       {}", "Script".cyan().bold(), address.script_pubkey().to_hex().dimmed());
    println!();
}

#[rustfmt::skip]
fn print_spend(result: &spendkit_btc::SpendResult, change_amount: u64) {
    println!();
    println!("      {}         {}", "Txid".cyan().bold(), result.txid.to_string().green());
    println!("      {}        {} vB", "Vsize".cyan().bold(), result.vsize);
    println!("      {}          {} sat", "Fee".cyan().bold(), result.fee);
    println!("      {}       {} sat", "Change".cyan().bold(), change_amount);
    println!("      {}  {}", "Transaction".cyan().bold(), result.transaction_hex);
    println!();
}
