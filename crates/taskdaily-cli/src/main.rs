//! taskdaily: command-line front end for the TaskDaily hashtag engine.
//!
//! Extracts hashtags, replays autocomplete sessions, segments text for
//! highlighting and indexes daily entry files through the autosaver.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdaily_core::{defaults, EngineConfig};

#[derive(Parser)]
#[command(name = "taskdaily")]
#[command(author, version, about = "Hashtag tools for TaskDaily tasks and journal entries")]
#[command(propagate_version = true)]
struct Cli {
    /// Engine config file (default: $XDG_CONFIG_HOME/taskdaily/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hashtags in a piece of text
    Extract {
        /// Text to scan (reads stdin when omitted)
        text: Option<String>,

        /// Collapse repeated names
        #[arg(short, long)]
        distinct: bool,

        /// Print a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Replay an autocomplete session and print the resulting state
    Suggest {
        /// Text in the input
        text: String,

        /// Caret byte offset (default: end of text)
        #[arg(short, long)]
        cursor: Option<usize>,

        /// Known tags, in registry order
        #[arg(short, long, value_delimiter = ',', required = true)]
        tags: Vec<String>,

        /// Press ArrowDown this many times
        #[arg(long, default_value_t = 0)]
        down: usize,

        /// Press ArrowUp this many times
        #[arg(long, default_value_t = 0)]
        up: usize,

        /// Press Enter to accept the highlighted candidate
        #[arg(long)]
        select: bool,
    },

    /// Split text into plain and hashtag runs with palette colors
    Segments {
        /// Text to split (reads stdin when omitted)
        text: Option<String>,

        /// Number of palette colors
        #[arg(short, long, default_value_t = defaults::TAG_PALETTE_SIZE)]
        palette: usize,
    },

    /// List daily entry lines that mention a tag, newest first
    Mentions {
        /// Tag name, with or without the leading '#'
        tag: String,

        /// Daily entry files named YYYY-MM-DD.<ext>
        #[arg(short, long = "file", required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Print JSON instead of tab-separated lines
        #[arg(long)]
        json: bool,
    },

    /// Save daily entry files through the autosaver and report their tags
    Index {
        /// Daily entry files named YYYY-MM-DD.<ext>
        #[arg(short, long = "file", required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Only report entries carrying every one of these tags
        #[arg(long)]
        filter: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: defaults::LOG_FILTER)
    let _file_guard = init_logging();

    match cli.command {
        Commands::Extract {
            text,
            distinct,
            json,
        } => {
            let text = commands::read_text(text)?;
            let names = commands::extract(&text, distinct);
            if json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
        }
        Commands::Suggest {
            text,
            cursor,
            tags,
            down,
            up,
            select,
        } => {
            let report = commands::suggest(&text, cursor, &tags, down, up, select);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Segments { text, palette } => {
            let palette = commands::check_palette(palette)?;
            let text = commands::read_text(text)?;
            let segments = commands::segments(&text, palette);
            println!("{}", serde_json::to_string_pretty(&segments)?);
        }
        Commands::Mentions { tag, files, json } => {
            let lines = commands::mentions(&tag, &files)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
            } else {
                for line in lines {
                    println!("{}\t{}", line.date, line.text);
                }
            }
        }
        Commands::Index { files, filter } => {
            let config = load_config(cli.config.as_deref())?;
            let report = commands::index(&files, &filter, &config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::load().context("failed to load engine config")?,
    };
    info!(
        debounce_ms = config.autosave.debounce_ms,
        autosave_enabled = config.autosave.enabled,
        max_name_len = config.tags.max_name_len,
        "Engine config loaded"
    );
    Ok(config)
}

/// Initialize tracing. Console output goes to stderr so that command output
/// on stdout stays machine-readable.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| defaults::LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("taskdaily.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );

    file_guard
}
