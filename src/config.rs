//! Run configuration.
//!
//! Settings come from two layers, later wins:
//!
//! 1. An optional TOML file (`--config`, default `./config/zdigest.toml`).
//! 2. Environment variables, using the names the digest has always read
//!    (`ZOTERO_API_KEY`, `LIBRARY_TYPE`, `WINDOW_DAYS`, ...).
//!
//! The result is a single immutable [`Config`] built once in `main` and
//! passed by reference to every pipeline stage.
//!
//! ```toml
//! debug_filter = false
//!
//! [zotero]
//! api_key = "..."
//!
//! [library]
//! type = "groups"
//! group_name = "Reading Group"
//! # id = "123456"
//! # collection = "ABCD2345"
//!
//! [digest]
//! timezone = "America/Los_Angeles"
//! window_days = 1
//! auto_annotation_threshold = 1
//! skip_weekends = true
//! # paper_types = ["journalArticle", "preprint"]
//!
//! [webhook]
//! # url = "https://hooks.slack.com/services/..."
//!
//! [state]
//! # path = "state.json"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::catalog::zotero::DEFAULT_API_BASE;
use crate::models::LibraryKind;

/// Config file read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_PATH: &str = "./config/zdigest.toml";

pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

/// Item types counted as papers unless `PAPER_TYPES` overrides them.
pub const DEFAULT_PAPER_TYPES: &[&str] = &[
    "journalArticle",
    "conferencePaper",
    "preprint",
    "report",
    "book",
    "bookSection",
    "thesis",
    "manuscript",
    "blogPost",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Required only by commands that call the catalog.
    pub api_key: Option<String>,
    pub api_base: String,
    pub library: LibrarySettings,
    pub timezone: Tz,
    /// Requested window length in days (≥ 1).
    pub window_days: u32,
    /// Notes/annotations added within this many minutes of their paper
    /// are treated as generated by tooling.
    pub auto_annotation_threshold: i64,
    pub paper_types: HashSet<String>,
    pub skip_weekends: bool,
    pub debug_filter: bool,
    pub webhook_url: Option<String>,
    pub state_path: Option<PathBuf>,
}

/// How the target library is selected.
#[derive(Debug, Clone)]
pub struct LibrarySettings {
    pub kind: LibraryKind,
    pub id: Option<String>,
    pub group_name: Option<String>,
    pub collection: Option<String>,
}

impl Config {
    /// A config with every default applied and only the credential set.
    pub fn minimal(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            api_base: DEFAULT_API_BASE.to_string(),
            library: LibrarySettings {
                kind: LibraryKind::Group,
                id: None,
                group_name: None,
                collection: None,
            },
            timezone: chrono_tz::America::Los_Angeles,
            window_days: 1,
            auto_annotation_threshold: 1,
            paper_types: default_paper_types(),
            skip_weekends: true,
            debug_filter: false,
            webhook_url: None,
            state_path: None,
        }
    }

    /// The catalog credential, or an error naming where to set it.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("ZOTERO_API_KEY is not set (environment or [zotero].api_key)")
    }

    pub fn is_paper_type(&self, item_type: &str) -> bool {
        self.paper_types.contains(item_type)
    }

    /// Merge a parsed file with environment lookups and validate.
    ///
    /// `env` returns the raw value of a variable; blank values count as
    /// unset.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            env(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = var("ZOTERO_API_KEY").or(non_blank(file.zotero.api_key));

        let api_base = var("ZOTERO_API_BASE")
            .or(file.zotero.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let kind_raw = var("LIBRARY_TYPE")
            .or(file.library.kind)
            .unwrap_or_else(|| "groups".to_string());
        let Some(kind) = LibraryKind::parse(&kind_raw) else {
            bail!(
                "LIBRARY_TYPE must be 'users' or 'groups', got '{}'",
                kind_raw
            );
        };

        let tz_raw = var("LOCAL_TZ")
            .or(file.digest.timezone)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = tz_raw
            .parse()
            .map_err(|_| anyhow::anyhow!("LOCAL_TZ '{}' is not a known IANA time zone", tz_raw))?;

        let window_days = match var("WINDOW_DAYS") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| anyhow::anyhow!("WINDOW_DAYS must be a whole number, got '{}'", raw))?,
            None => file.digest.window_days.unwrap_or(1),
        };
        if window_days == 0 {
            bail!("WINDOW_DAYS must be >= 1");
        }

        let auto_annotation_threshold = match var("AUTO_ANNOTATION_THRESHOLD") {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                anyhow::anyhow!(
                    "AUTO_ANNOTATION_THRESHOLD must be a whole number of minutes, got '{}'",
                    raw
                )
            })?,
            None => file.digest.auto_annotation_threshold.unwrap_or(1),
        };

        let paper_types = match var("PAPER_TYPES") {
            Some(raw) => parse_paper_types(raw.split(',')),
            None => file
                .digest
                .paper_types
                .map(|types| parse_paper_types(types.iter().map(String::as_str)))
                .unwrap_or_default(),
        };
        let paper_types = if paper_types.is_empty() {
            default_paper_types()
        } else {
            paper_types
        };

        let skip_weekends = var("SKIP_WEEKENDS")
            .map(|v| is_truthy(&v))
            .or(file.digest.skip_weekends)
            .unwrap_or(true);

        let debug_filter = var("DEBUG_FILTER")
            .map(|v| is_truthy(&v))
            .or(file.debug_filter)
            .unwrap_or(false);

        Ok(Self {
            api_key,
            api_base,
            library: LibrarySettings {
                kind,
                id: var("LIBRARY_ID").or(non_blank(file.library.id)),
                group_name: var("GROUP_NAME").or(non_blank(file.library.group_name)),
                collection: var("ZOTERO_COLLECTION").or(non_blank(file.library.collection)),
            },
            timezone,
            window_days,
            auto_annotation_threshold,
            paper_types,
            skip_weekends,
            debug_filter,
            webhook_url: var("SLACK_WEBHOOK_URL").or(non_blank(file.webhook.url)),
            state_path: var("STATE_PATH")
                .map(PathBuf::from)
                .or(file.state.path),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// File layer
// ═══════════════════════════════════════════════════════════════════════

/// The TOML file shape. Every field is optional.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub debug_filter: Option<bool>,
    #[serde(default)]
    pub zotero: ZoteroSection,
    #[serde(default)]
    pub library: LibrarySection,
    #[serde(default)]
    pub digest: DigestSection,
    #[serde(default)]
    pub webhook: WebhookSection,
    #[serde(default)]
    pub state: StateSection,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ZoteroSection {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LibrarySection {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    pub group_name: Option<String>,
    pub collection: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DigestSection {
    pub timezone: Option<String>,
    pub window_days: Option<u32>,
    pub auto_annotation_threshold: Option<i64>,
    pub paper_types: Option<Vec<String>>,
    pub skip_weekends: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookSection {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StateSection {
    pub path: Option<PathBuf>,
}

/// Load configuration from an optional file plus the process environment.
///
/// An explicit `path` must exist; without one, [`DEFAULT_CONFIG_PATH`] is
/// read only if present.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let file = match path {
        Some(p) => read_file_config(p)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                read_file_config(default)?
            } else {
                FileConfig::default()
            }
        }
    };

    Config::resolve(file, |name| std::env::var(name).ok())
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn default_paper_types() -> HashSet<String> {
    DEFAULT_PAPER_TYPES.iter().map(|t| t.to_string()).collect()
}

fn parse_paper_types<'a>(raw: impl Iterator<Item = &'a str>) -> HashSet<String> {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
