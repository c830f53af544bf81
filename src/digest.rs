//! Digest run orchestration.
//!
//! Coordinates one run end to end, strictly in order:
//! weekend check → library → window → fetch → classify → print →
//! deliver → persist state.
//!
//! Only configuration, access and fetch failures abort the run. Child
//! lookups during classification and webhook delivery recover locally.
//! State is written last, so a failed run leaves the previous state intact.

use anyhow::Result;
use chrono::{DateTime, Weekday};
use chrono_tz::Tz;

use crate::catalog::Catalog;
use crate::classify::classify;
use crate::config::Config;
use crate::fetch::fetch_recent_activity;
use crate::library::resolve_library;
use crate::models::{DigestSummary, LibraryRef};
use crate::present::{render_console, render_slack};
use crate::state::{default_state_path, load_state, save_state, RunState};
use crate::webhook::{deliver, Delivery};
use crate::window::{compute_window, weekday_name, weekend_day, ActivityWindow};

/// Per-invocation switches from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Requested window length in days.
    pub days: u32,
    /// Print only: no webhook, no state write.
    pub dry_run: bool,
    /// Run even on a weekend.
    pub force: bool,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            days: config.window_days,
            dry_run: false,
            force: false,
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// Weekend; nothing was fetched.
    Skipped(Weekday),
    Completed {
        library: LibraryRef,
        summary: DigestSummary,
        state: RunState,
    },
}

/// Execute a full run as of `now`.
pub async fn run_digest(
    config: &Config,
    catalog: &dyn Catalog,
    now: DateTime<Tz>,
    options: &RunOptions,
) -> Result<RunOutcome> {
    if config.skip_weekends && !options.force {
        if let Some(day) = weekend_day(&now) {
            println!(
                "Weekend ({}) - no digest generated. Run again on Monday for weekend summary.",
                weekday_name(day)
            );
            println!("To override: SKIP_WEEKENDS=0 zdigest (or zdigest run --force)");
            return Ok(RunOutcome::Skipped(day));
        }
    }

    let library = resolve_library(catalog, &config.library).await?;
    println!(
        "Using Zotero library: {}{} | window={}d",
        library,
        config
            .library
            .collection
            .as_ref()
            .map(|c| format!(" (collection={})", c))
            .unwrap_or_default(),
        options.days
    );

    let state_path = config
        .state_path
        .clone()
        .unwrap_or_else(|| default_state_path(&library));
    let mut state = load_state(&state_path)?;

    let window = compute_window(now, options.days);
    let (summary, library_version) = collect_digest(config, catalog, &library, &window).await?;
    state.observe_version(library_version);

    print!("{}", render_console(&summary, &window));

    if options.dry_run {
        tracing::info!("dry run: skipping delivery and state update");
    } else {
        match deliver(config.webhook_url.as_deref(), &render_slack(&summary, &window)).await {
            Delivery::Disabled => {}
            Delivery::Sent => println!("✓ Sent digest to Slack"),
            Delivery::Failed(e) => println!("✗ Failed to send to Slack: {:#}", e),
        }
        save_state(&state_path, &state)?;
        tracing::debug!(path = %state_path.display(), last_version = state.last_version, "state saved");
    }

    Ok(RunOutcome::Completed {
        library,
        summary,
        state,
    })
}

/// Fetch the newest page and classify it.
///
/// Returns the summary and the library version reported with the page.
pub async fn collect_digest(
    config: &Config,
    catalog: &dyn Catalog,
    library: &LibraryRef,
    window: &ActivityWindow,
) -> Result<(DigestSummary, Option<i64>)> {
    let page = fetch_recent_activity(catalog, library, config.library.collection.as_deref()).await?;
    let summary = classify(catalog, config, library, window, &page.items).await;
    Ok((summary, page.library_version))
}
