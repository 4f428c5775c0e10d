//! CLI application for invoice scanning and record integrity.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{audit, batch, config, extract, seal, verify};

/// Invoice scanner - extract invoice fields, seal records, and inspect the audit log
#[derive(Parser)]
#[command(name = "invscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract invoice fields from a text or image file
    Extract(extract::ExtractArgs),

    /// Extract fields from multiple files
    Batch(batch::BatchArgs),

    /// Seal a JSON record with its content digest
    Seal(seal::SealArgs),

    /// Verify sealed JSON records
    Verify(verify::VerifyArgs),

    /// Inspect or append to the audit log
    Audit(audit::AuditArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Seal(args) => seal::run(args, config_path),
        Commands::Verify(args) => verify::run(args),
        Commands::Audit(args) => audit::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
