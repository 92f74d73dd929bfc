// ============================================
// File: crates/sigil-node/src/main.rs
// ============================================
//! # Sigil Node Entry Point
//!
//! ## Creation Reason
//! Main entry point for the `sigil-node` binary.
//! Handles CLI parsing, logging setup, and command dispatch.
//!
//! ## Usage
//! ```bash
//! # Step 1: Each peer creates an identity and shares its public key
//! sigil-node keygen --out /etc/sigil/node_key.json
//! sigil-node pubkey --key /etc/sigil/node_key.json
//!
//! # Step 2: Put the other peer's key under [peer] signing_key, then
//! sigil-node listen --config /etc/sigil/node.toml
//! sigil-node send --config /etc/sigil/node.toml --message hello
//!
//! # Other commands
//! sigil-node validate --config /etc/sigil/node.toml
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `RUST_LOG` overrides the configured log level
//! - `--seed` replaces `[session].seed`; both peers must use the same value
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sigil_core::SigningKeyPair;
use sigil_node::{identity, Client, LoggingHandler, NodeConfig, Server};

const DEFAULT_CONFIG: &str = "/etc/sigil/node.toml";

// ============================================
// CLI Definition
// ============================================

/// Sigil authenticated encrypted channel node
#[derive(Parser, Debug)]
#[command(name = "sigil-node")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new Ed448 identity file
    Keygen {
        /// Where to write the identity
        #[arg(short, long)]
        out: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the signing public key of an identity file
    Pubkey {
        /// Identity file
        #[arg(short, long)]
        key: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = KeyFormat::Hex)]
        format: KeyFormat,
    },

    /// Accept connections and log every decrypted message
    Listen {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Nonce seed, overrides [session].seed
        #[arg(long)]
        seed: Option<String>,
    },

    /// Connect to the configured peer and send messages
    Send {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Message to send; repeat to send several in order
        #[arg(short, long, required = true)]
        message: Vec<String>,

        /// Nonce seed, overrides [session].seed
        #[arg(long)]
        seed: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KeyFormat {
    Hex,
    Base64,
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Listen and send initialize logging once their config is loaded
    if !matches!(cli.command, Commands::Listen { .. } | Commands::Send { .. }) {
        init_logging("info");
    }

    // Execute command
    let result = match cli.command {
        Commands::Keygen { out, force } => cmd_keygen(out, force).await,
        Commands::Pubkey { key, format } => cmd_pubkey(key, format).await,
        Commands::Listen { config, seed } => cmd_listen(config, seed).await,
        Commands::Send {
            config,
            message,
            seed,
        } => cmd_send(config, message, seed).await,
        Commands::Validate { config } => cmd_validate(config).await,
    };

    // Handle errors
    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Generates and saves a new identity.
async fn cmd_keygen(out: PathBuf, force: bool) -> anyhow::Result<()> {
    if out.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            out.display()
        );
    }

    let identity = SigningKeyPair::generate();
    identity::save(&identity, &out).await?;

    println!("✅ Identity written to {}", out.display());
    println!("   Public key: {}", identity.public_key().to_hex());
    Ok(())
}

/// Prints the public key of an identity file.
async fn cmd_pubkey(key: PathBuf, format: KeyFormat) -> anyhow::Result<()> {
    let identity = identity::load(&key).await?;

    match format {
        KeyFormat::Hex => println!("{}", identity.public_key().to_hex()),
        KeyFormat::Base64 => println!("{}", identity.public_key().to_base64()),
    }
    Ok(())
}

/// Runs the server until Ctrl+C.
async fn cmd_listen(config_path: PathBuf, seed: Option<String>) -> anyhow::Result<()> {
    let config = load_config(&config_path, seed).await?;

    let identity = identity::load(&config.identity.key_file).await?;
    let server = Server::new(config, identity, Arc::new(LoggingHandler::new()))?;
    server.run().await?;
    Ok(())
}

/// Sends messages to the configured peer.
async fn cmd_send(
    config_path: PathBuf,
    messages: Vec<String>,
    seed: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(&config_path, seed).await?;

    let identity = identity::load(&config.identity.key_file).await?;
    let client = Client::new(config, identity)?;
    let sent = client.send(&messages).await?;

    info!("Sent {} message(s)", sent);
    Ok(())
}

/// Validates configuration file.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    let config = NodeConfig::load(&config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Listen:      {}", config.network.listen_addr);
    println!("   Peer:        {}", config.network.peer_addr);
    println!("   Max frame:   {} bytes", config.network.max_frame_size);
    println!();
    println!("Identity:");
    println!("   Key file:    {}", config.identity.key_file);
    println!();
    println!("Peer:");
    match config.peer_signing_key() {
        Ok(key) => println!("   Signing key: {key}"),
        Err(_) => println!("   Signing key: ⚠️  not set (required for listen/send)"),
    }
    println!();
    println!("Session:");
    println!(
        "   Seed:        {}",
        if config.session.seed.is_some() { "configured" } else { "derived from session key" }
    );
    println!("   AD length:   {} bytes", config.associated_data().len());
    println!("   Handshake:   {}s timeout", config.session.handshake_timeout_secs);
    println!();

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads config, applies the `--seed` override and initializes logging
/// with the configured level.
async fn load_config(path: &Path, seed: Option<String>) -> anyhow::Result<NodeConfig> {
    let loaded = NodeConfig::load(path).await.and_then(|mut config| {
        if let Some(seed) = seed {
            config.session.seed = Some(seed);
            config.validate()?;
        }
        Ok(config)
    });

    match loaded {
        Ok(config) => {
            init_logging(&config.logging.level);
            Ok(config)
        }
        Err(e) => {
            init_logging("info");
            Err(e.into())
        }
    }
}
