//! # Zotero Digest CLI (`zdigest`)
//!
//! Builds the digest for one library and delivers it. Meant to run once a
//! day from cron or CI; with no subcommand it performs a full run.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `zdigest` / `zdigest run` | Resolve, fetch, classify, print, post to Slack, save state |
//! | `zdigest run --dry-run` | Print the digest only |
//! | `zdigest library` | Show the resolved library and visible groups |
//! | `zdigest window` | Show the activity window for right now |
//!
//! ## Examples
//!
//! ```bash
//! # Daily run for the only group the key can see
//! ZOTERO_API_KEY=... zdigest
//!
//! # A week's worth, printed but not posted
//! ZOTERO_API_KEY=... zdigest run --days 7 --dry-run
//!
//! # Settings from a file, secrets from the environment
//! ZOTERO_API_KEY=... zdigest --config ./config/zdigest.toml
//! ```

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};

use zotero_digest::catalog::zotero::ZoteroClient;
use zotero_digest::config::{self, Config};
use zotero_digest::digest::{run_digest, RunOptions};
use zotero_digest::library::show_library;
use zotero_digest::logging;
use zotero_digest::window::show_window;

/// Zotero Digest — new and actively-read papers from a Zotero library,
/// printed and posted to Slack.
///
/// Configuration comes from environment variables (ZOTERO_API_KEY,
/// LIBRARY_TYPE, GROUP_NAME, ...) layered over an optional TOML file.
#[derive(Parser)]
#[command(name = "zdigest", version, about)]
struct Cli {
    /// Path to a configuration file (TOML).
    ///
    /// Defaults to `./config/zdigest.toml` when that file exists.
    /// Environment variables override values from the file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and deliver the digest (the default).
    Run(RunArgs),

    /// Resolve the target library and list the groups the key can see.
    Library,

    /// Print the activity window a run started now would use.
    ///
    /// Makes no network calls.
    Window {
        /// Window length in days (defaults to WINDOW_DAYS).
        #[arg(long)]
        days: Option<u32>,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Window length in days (defaults to WINDOW_DAYS).
    #[arg(long)]
    days: Option<u32>,

    /// Print the digest without posting it or updating the state file.
    #[arg(long)]
    dry_run: bool,

    /// Run even on Saturday or Sunday.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;
    logging::init(cfg.debug_filter);

    let now = Utc::now().with_timezone(&cfg.timezone);

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let options = RunOptions {
                days: window_days(args.days, &cfg)?,
                dry_run: args.dry_run,
                force: args.force,
            };
            let catalog = zotero_client(&cfg)?;
            run_digest(&cfg, &catalog, now, &options).await?;
        }
        Commands::Library => {
            let catalog = zotero_client(&cfg)?;
            show_library(&cfg, &catalog).await?;
        }
        Commands::Window { days } => {
            show_window(now, window_days(days, &cfg)?);
        }
    }

    Ok(())
}

fn zotero_client(cfg: &Config) -> anyhow::Result<ZoteroClient> {
    Ok(ZoteroClient::new(&cfg.api_base, cfg.api_key()?))
}

fn window_days(flag: Option<u32>, cfg: &Config) -> anyhow::Result<u32> {
    match flag {
        Some(0) => anyhow::bail!("--days must be >= 1"),
        Some(days) => Ok(days),
        None => Ok(cfg.window_days),
    }
}
