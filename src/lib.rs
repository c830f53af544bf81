//! # Zotero Digest
//!
//! A periodic digest of activity in a Zotero library: papers added in the
//! last day (or since Friday, on a Monday) and papers people are reading,
//! as shown by their notes and annotations. The digest is printed to the
//! console and posted to a Slack webhook.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────┐   ┌─────────┐   ┌───────────┐   ┌───────────┐
//! │ Library  │──▶│ Window │──▶│  Fetch  │──▶│ Classify  │──▶│  Present  │
//! │ resolver │   │        │   │ 1 page  │   │ + parents │   │ CLI/Slack │
//! └──────────┘   └────────┘   └─────────┘   └───────────┘   └───────────┘
//!       │                          │              │
//!       └──────────────────────────┴──────────────┘
//!                        Catalog (Zotero Web API)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export ZOTERO_API_KEY=...
//! export GROUP_NAME="Reading Group"
//! zdigest                 # resolve, fetch, print, post, save state
//! zdigest run --dry-run   # print only
//! zdigest library         # show which library would be used
//! zdigest window          # show the time window for today
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | File + environment configuration |
//! | [`models`] | Items, library references, digest summary |
//! | [`catalog`] | Catalog trait, Zotero client, in-memory catalog |
//! | [`library`] | Target library resolution |
//! | [`window`] | Activity window and weekend rules |
//! | [`fetch`] | Recent-items page |
//! | [`classify`] | Partitioning and noise filtering |
//! | [`parents`] | Child → paper resolution |
//! | [`present`] | Console and Slack rendering |
//! | [`webhook`] | Slack delivery |
//! | [`state`] | Persisted library version |
//! | [`digest`] | Run orchestration |
//! | [`logging`] | tracing subscriber setup |

pub mod catalog;
pub mod classify;
pub mod config;
pub mod digest;
pub mod fetch;
pub mod library;
pub mod logging;
pub mod models;
pub mod parents;
pub mod present;
pub mod state;
pub mod webhook;
pub mod window;
