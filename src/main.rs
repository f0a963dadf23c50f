//! `rulegrid` CLI - Extract tables, diagrams and atomic rules from documents

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rulegrid::{
    extract_document_async, load_config, load_config_from, open_document, CancelFlag,
    ExtractionError, ExtractionResult, Extractor,
};

#[derive(Parser)]
#[command(name = "rulegrid")]
#[command(about = "Recover tables, diagrams and atomic rules from rendered documents")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a document and print the result
    Extract {
        /// JSON glyph document (or PDF when built with the `pdf` feature)
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Config file (defaults to ~/.config/rulegrid/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// The full result as pretty JSON
    Json,
    /// Tables as markdown
    Markdown,
    /// One atomic rule per line
    Rules,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract {
            file,
            format,
            config,
        } => {
            cmd_extract(&file, format, config.as_deref()).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn cmd_extract(file: &Path, format: OutputFormat, config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => load_config_from(path)?,
        None => load_config().context("failed to load default config")?,
    };
    let extractor = Extractor::new(config);

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = match open_document(file) {
        Ok(source) => extract_document_async(extractor, source, cancel).await,
        Err(e) => ExtractionResult::failure(ExtractionError::Input(e).to_string()),
    };

    if !result.success {
        let message = result.error_message.unwrap_or_default();
        bail!("{}: {message}", file.display());
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result).context("failed to encode result")?;
            println!("{json}");
        }
        OutputFormat::Markdown => {
            println!("{}", result.tables_markdown());
        }
        OutputFormat::Rules => {
            for rule in &result.atomic_rules {
                println!("{rule}");
            }
        }
    }

    Ok(())
}
