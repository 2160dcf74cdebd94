//! Evidence CLI
//!
//! Command-line interface for sealing evidence, fingerprinting it and moving
//! it through a failover pool of storage endpoints.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "evidence")]
#[command(about = "Seal, fingerprint and archive evidence for a designated recipient", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Custom storage directory for keys and configuration
    #[arg(long, global = true, env = "EVIDENCE_DIR")]
    storage_dir: Option<PathBuf>,

    /// Transfer configuration file (defaults to <storage-dir>/transfer.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the recipient key pair for an identity
    Keygen {
        /// Identity name
        #[arg(short, long, default_value = commands::DEFAULT_IDENTITY)]
        identity: String,

        /// Replace an existing key pair; evidence sealed for the old key becomes unreadable
        #[arg(long)]
        force: bool,
    },

    /// Print an identity's public key for senders
    ExportKey {
        /// Identity name
        #[arg(short, long, default_value = commands::DEFAULT_IDENTITY)]
        identity: String,

        /// Emit PEM instead of base64 DER
        #[arg(long)]
        pem: bool,

        /// Write the key to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Seal a file for a recipient
    Seal {
        /// Recipient public key, or a file containing it
        #[arg(short, long)]
        recipient: String,

        /// File to seal
        input: PathBuf,

        /// Where to write the sealed blob
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Open a sealed blob with an identity's private key
    Unseal {
        /// Identity name
        #[arg(short, long, default_value = commands::DEFAULT_IDENTITY)]
        identity: String,

        /// Sealed blob
        input: PathBuf,

        /// Where to write the recovered file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the SHA-256 fingerprint of a file
    Fingerprint {
        /// File to fingerprint
        file: PathBuf,

        /// Fail unless the fingerprint equals this hex value
        #[arg(long)]
        expect: Option<String>,
    },

    /// Upload a file through the write pool
    Store {
        /// File to upload
        file: PathBuf,

        /// Seal for this recipient (public key or key file) before uploading
        #[arg(long)]
        seal_for: Option<String>,

        /// Write a provenance record (JSON) to this path
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Download a blob through the read pool
    Fetch {
        /// Handle returned by `store`
        handle: String,

        /// Where to write the downloaded (or unsealed) bytes
        #[arg(short, long)]
        output: PathBuf,

        /// Expected fingerprint of the stored bytes
        #[arg(long)]
        expect: Option<String>,

        /// Unseal with the identity's private key after download
        #[arg(long)]
        unseal: bool,

        /// Identity used with --unseal
        #[arg(short, long, default_value = commands::DEFAULT_IDENTITY)]
        identity: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "evidence=debug,evidence_lib=debug"
    } else {
        "evidence=info,evidence_lib=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        if let Some(evidence_err) = err.downcast_ref::<evidence_lib::EvidenceError>() {
            tracing::debug!(
                code = evidence_err.code() as i32,
                retryable = evidence_err.is_retryable(),
                "command failed"
            );
        }
        ui::error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let storage_dir = cli.storage_dir.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("evidence")
    });
    let config_path = cli
        .config
        .unwrap_or_else(|| storage_dir.join(commands::TRANSFER_CONFIG_FILE));

    tracing::debug!(storage_dir = %storage_dir.display(), "resolved storage directory");

    match cli.command {
        Commands::Keygen { identity, force } => {
            commands::keys::keygen(&storage_dir, &identity, force, cli.verbose).await
        }
        Commands::ExportKey {
            identity,
            pem,
            output,
        } => commands::keys::export(&storage_dir, &identity, pem, output.as_deref()).await,
        Commands::Seal {
            recipient,
            input,
            output,
        } => commands::seal::seal(&recipient, &input, &output, cli.verbose),
        Commands::Unseal {
            identity,
            input,
            output,
        } => commands::seal::unseal(&storage_dir, &identity, &input, &output).await,
        Commands::Fingerprint { file, expect } => {
            commands::fingerprint::run(&file, expect.as_deref())
        }
        Commands::Store {
            file,
            seal_for,
            record,
        } => {
            commands::transfer::store(
                &config_path,
                &file,
                seal_for.as_deref(),
                record.as_deref(),
                cli.verbose,
            )
            .await
        }
        Commands::Fetch {
            handle,
            output,
            expect,
            unseal,
            identity,
        } => {
            let unseal_identity = unseal.then_some(identity.as_str());
            commands::transfer::fetch(
                &config_path,
                &storage_dir,
                &handle,
                &output,
                expect.as_deref(),
                unseal_identity,
            )
            .await
        }
    }
}
