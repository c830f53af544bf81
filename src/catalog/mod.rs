//! Catalog access abstraction.
//!
//! The [`Catalog`] trait covers every read the digest makes against the
//! remote item catalog: key identity, group listing, the recent-items page
//! and single-item lookups. Two implementations ship with the crate:
//!
//! | Implementation | Purpose |
//! |----------------|---------|
//! | [`zotero::ZoteroClient`] | Zotero Web API v3 over HTTPS (reqwest) |
//! | [`memory::MemoryCatalog`] | Fixed in-memory library for tests |
//!
//! Calls are `async` but the pipeline awaits them one at a time.

pub mod memory;
pub mod zotero;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Group, Item, KeyInfo, LibraryRef};

/// Failure of a single catalog call.
///
/// Access failures are split out by status so callers can tell a bad id
/// from a key lacking permissions.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{resource} not found (404)")]
    NotFound { resource: String },

    #[error("access to {resource} forbidden (403)")]
    Forbidden { resource: String },

    #[error("catalog API error {status} for {resource}: {body}")]
    Status {
        status: u16,
        resource: String,
        body: String,
    },

    #[error("request for {resource} failed: {source}")]
    Transport {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response for {resource}: {message}")]
    Decode { resource: String, message: String },
}

impl CatalogError {
    /// The API path the failing call targeted.
    pub fn resource(&self) -> &str {
        match self {
            CatalogError::NotFound { resource }
            | CatalogError::Forbidden { resource }
            | CatalogError::Status { resource, .. }
            | CatalogError::Transport { resource, .. }
            | CatalogError::Decode { resource, .. } => resource,
        }
    }
}

/// Parameters for the recent-items listing.
///
/// Sort order is fixed: `dateModified`, descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    /// Restrict to one collection key.
    pub collection: Option<String>,
    /// Page size.
    pub limit: usize,
}

/// One page of items plus the library version the server reported.
#[derive(Debug, Clone, Default)]
pub struct ItemPage {
    pub items: Vec<Item>,
    /// `Last-Modified-Version` response header, when present and numeric.
    pub library_version: Option<i64>,
}

/// Read-only access to a reference catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Who owns the configured credential.
    async fn current_key(&self) -> Result<KeyInfo, CatalogError>;

    /// Every group library visible to `user_id`.
    async fn groups_for_user(&self, user_id: &str) -> Result<Vec<Group>, CatalogError>;

    /// A single group by id; used to check existence and access.
    async fn group(&self, group_id: &str) -> Result<Group, CatalogError>;

    /// The most recently modified items of a library, newest first.
    async fn recent_items(
        &self,
        library: &LibraryRef,
        query: &ItemQuery,
    ) -> Result<ItemPage, CatalogError>;

    /// A single item by key.
    async fn item(&self, library: &LibraryRef, key: &str) -> Result<Item, CatalogError>;
}
