//! ALFA Wallet Vault - CLI
//!
//! Command-line interface for accounts, wallets and backups.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use alfa_wallet_vault::{
    EncryptedSecret, NewWallet, VaultError, WalletVaultApi, WalletVaultConfig,
};

#[derive(Parser)]
#[command(name = "alfa-wallet")]
#[command(author = "Karen Tonoyan")]
#[command(version = alfa_wallet_vault::VERSION)]
#[command(about = "ALFA Wallet Vault - Passphrase-sealed wallet keys and encrypted backups")]
struct Cli {
    /// Data directory (overrides config and ALFA_WALLET_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the storage handle of a passphrase
    Handle {
        #[arg(short, long)]
        passphrase: String,
    },

    /// Create a new account
    CreateAccount {
        #[arg(short, long)]
        passphrase: String,
    },

    /// Add a wallet to an account
    AddWallet {
        #[arg(short, long)]
        passphrase: String,

        #[arg(long)]
        address: String,

        #[arg(long)]
        network: String,

        /// Private key as hex (optional 0x)
        #[arg(long)]
        private_key: String,

        #[arg(long)]
        mnemonic: Option<String>,

        #[arg(long)]
        label: Option<String>,
    },

    /// List wallets of an account
    ListWallets {
        #[arg(short, long)]
        passphrase: String,

        /// Only wallets on this network
        #[arg(long)]
        network: Option<String>,
    },

    /// Decrypt a wallet's private key or mnemonic
    Reveal {
        /// Wallet ID
        id: String,

        #[arg(short, long)]
        passphrase: String,

        /// Reveal the mnemonic instead of the private key
        #[arg(long)]
        mnemonic: bool,
    },

    /// Export an account as an encrypted backup
    Export {
        /// Output file (transport text, or PNG with --image)
        output: PathBuf,

        /// Account passphrase
        #[arg(short, long)]
        passphrase: String,

        /// Backup passphrase (defaults to the account passphrase)
        #[arg(short, long)]
        backup_passphrase: Option<String>,

        /// Hide the backup inside a PNG
        #[arg(long)]
        image: bool,

        /// Carrier PNG to use with --image (a plain one is generated otherwise)
        #[arg(long, requires = "image")]
        carrier: Option<PathBuf>,
    },

    /// Restore an encrypted backup
    Import {
        /// Backup file (transport text, or PNG with --image)
        input: PathBuf,

        /// Backup passphrase
        #[arg(short, long)]
        passphrase: String,

        /// Read the backup from a PNG
        #[arg(long)]
        image: bool,
    },

    /// Seal a raw hex secret and print the envelope as JSON
    Seal {
        secret: String,

        #[arg(short, long)]
        passphrase: String,
    },

    /// Unseal a JSON envelope file and print the secret
    Unseal {
        envelope: PathBuf,

        #[arg(short, long)]
        passphrase: String,
    },

    /// Delete an account and all its wallets
    DeleteAccount {
        #[arg(short, long)]
        passphrase: String,

        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", error_line(&e));
        std::process::exit(1);
    }
}

/// The single line printed for a failed command
fn error_line(e: &anyhow::Error) -> String {
    match e.downcast_ref::<VaultError>() {
        Some(vault_error) if vault_error.is_data_loss() => {
            format!("⚠️ {}", vault_error.user_message())
        }
        Some(vault_error) => format!("Error: {}", vault_error.user_message()),
        None => format!("Error: {:#}", e),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<WalletVaultConfig> {
    let mut config = match &cli.config {
        Some(path) => WalletVaultConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => WalletVaultConfig::from_env(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let api = WalletVaultApi::new(load_config(&cli)?)?;

    match cli.command {
        Commands::Handle { passphrase } => {
            println!("{}", api.handle_for(&passphrase));
        }

        Commands::CreateAccount { passphrase } => {
            println!("🔐 Creating account...");
            let handle = api.create_account(&passphrase)?;
            println!("✅ Account created: {}", handle);
        }

        Commands::AddWallet {
            passphrase,
            address,
            network,
            private_key,
            mnemonic,
            label,
        } => {
            api.unlock(&passphrase)?;
            let mut wallet = NewWallet::new(&address, &network, &private_key);
            wallet.mnemonic = mnemonic;
            wallet.label = label;

            let record = api.add_wallet(&wallet)?;
            api.lock();
            println!("✅ Wallet added with ID: {}", record.id);
        }

        Commands::ListWallets {
            passphrase,
            network,
        } => {
            api.unlock(&passphrase)?;
            let wallets = match network {
                Some(network) => api.wallets_by_network(&network)?,
                None => api.list_wallets()?,
            };
            api.lock();

            if wallets.is_empty() {
                println!("📭 No wallets in this account");
            } else {
                println!("👛 Wallets ({}):", wallets.len());
                println!("{:-<72}", "");
                for wallet in wallets {
                    let seed = if wallet.has_mnemonic() { "🌱" } else { "  " };
                    println!(
                        "{} {} - {} [{}] {}",
                        seed,
                        wallet.id,
                        wallet.address,
                        wallet.network,
                        wallet.label.as_deref().unwrap_or("")
                    );
                }
            }
        }

        Commands::Reveal {
            id,
            passphrase,
            mnemonic,
        } => {
            api.unlock(&passphrase)?;
            let revealed = if mnemonic {
                api.reveal_mnemonic(&id)?
            } else {
                Some(api.reveal_private_key(&id)?)
            };
            api.lock();

            match revealed {
                Some(secret) => println!("{}", secret.expose()),
                None => bail!("wallet {} has no mnemonic", id),
            }
        }

        Commands::Export {
            output,
            passphrase,
            backup_passphrase,
            image,
            carrier,
        } => {
            let handle = api.accounts().open_account(&passphrase)?;
            let backup_passphrase = backup_passphrase.as_deref().unwrap_or(&passphrase);
            println!("📤 Exporting account {}...", handle);

            if image {
                let carrier_png = match &carrier {
                    Some(path) => Some(
                        std::fs::read(path)
                            .with_context(|| format!("reading carrier {}", path.display()))?,
                    ),
                    None => None,
                };
                let png =
                    api.export_to_image(handle.as_str(), backup_passphrase, carrier_png.as_deref())?;
                std::fs::write(&output, png)?;
            } else {
                let transport = api.export_vault(handle.as_str(), backup_passphrase)?;
                std::fs::write(&output, transport)?;
            }
            println!("✅ Backup written to: {}", output.display());
        }

        Commands::Import {
            input,
            passphrase,
            image,
        } => {
            println!("📥 Importing backup: {}", input.display());
            let data =
                std::fs::read(&input).with_context(|| format!("reading {}", input.display()))?;

            let result = if image {
                api.import_from_image(&data, &passphrase)
            } else {
                let transport = String::from_utf8(data).context("backup file is not text")?;
                api.import_vault(&transport, &passphrase)
            };

            let name = result?;
            println!("✅ Restored partition: {}", name);
        }

        Commands::Seal { secret, passphrase } => {
            let sealed = api.seal_secret(&secret, &passphrase)?;
            println!("{}", serde_json::to_string_pretty(&sealed)?);
        }

        Commands::Unseal {
            envelope,
            passphrase,
        } => {
            let data = std::fs::read(&envelope)
                .with_context(|| format!("reading {}", envelope.display()))?;
            let sealed: EncryptedSecret =
                serde_json::from_slice(&data).context("envelope is not valid JSON")?;
            let revealed = api.unseal_secret(&sealed, &passphrase)?;
            println!("{}", revealed.expose());
        }

        Commands::DeleteAccount { passphrase, yes } => {
            if !yes {
                bail!("refusing to delete without --yes");
            }
            api.unlock(&passphrase)?;
            if api.delete_current_account()? {
                println!("🗑️ Account deleted");
            }
        }
    }

    Ok(())
}
