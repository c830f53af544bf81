//! Zotero Web API (v3) client.
//!
//! Thin wrapper around `reqwest` that authenticates every request with the
//! `Zotero-API-Key` header and maps HTTP failures onto [`CatalogError`].
//! One attempt per call, no retries: a failed request is reported to the
//! caller as-is.
//!
//! # Endpoints
//!
//! | Call | Endpoint |
//! |------|----------|
//! | [`current_key`](Catalog::current_key) | `GET /keys/current` |
//! | [`groups_for_user`](Catalog::groups_for_user) | `GET /users/{id}/groups` |
//! | [`group`](Catalog::group) | `GET /groups/{id}` |
//! | [`recent_items`](Catalog::recent_items) | `GET /{type}/{id}/items?sort=dateModified&direction=desc&limit=N` |
//! | [`item`](Catalog::item) | `GET /{type}/{id}/items/{key}` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Catalog, CatalogError, ItemPage, ItemQuery};
use crate::models::{Group, Item, KeyInfo, LibraryRef};

pub const DEFAULT_API_BASE: &str = "https://api.zotero.org";

const API_VERSION: &str = "3";
const VERSION_HEADER: &str = "Last-Modified-Version";

/// Timeout for identity and group calls.
const ACCOUNT_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for item listing and item lookups.
const ITEMS_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP-backed [`Catalog`].
pub struct ZoteroClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
}

impl ZoteroClient {
    pub fn new(base: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn get(
        &self,
        resource: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Response, CatalogError> {
        let url = format!("{}/{}", self.base, resource);
        tracing::trace!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .header("Zotero-API-Version", API_VERSION)
            .header("Zotero-API-Key", &self.api_key)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| CatalogError::Transport {
                resource: resource.to_string(),
                source,
            })?;

        check_status(resource, response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        timeout: Duration,
    ) -> Result<T, CatalogError> {
        let response = self.get(resource, &[], timeout).await?;
        decode(resource, response).await
    }
}

#[async_trait]
impl Catalog for ZoteroClient {
    async fn current_key(&self) -> Result<KeyInfo, CatalogError> {
        let resource = "keys/current";
        let json: Value = self.get_json(resource, ACCOUNT_TIMEOUT).await?;
        KeyInfo::from_json(&json).ok_or_else(|| CatalogError::Decode {
            resource: resource.to_string(),
            message: "missing userID".to_string(),
        })
    }

    async fn groups_for_user(&self, user_id: &str) -> Result<Vec<Group>, CatalogError> {
        let resource = format!("users/{}/groups", user_id);
        let raw: Vec<Value> = self.get_json(&resource, ACCOUNT_TIMEOUT).await?;
        Ok(raw.iter().filter_map(Group::from_json).collect())
    }

    async fn group(&self, group_id: &str) -> Result<Group, CatalogError> {
        let resource = format!("groups/{}", group_id);
        let json: Value = self.get_json(&resource, ACCOUNT_TIMEOUT).await?;
        Group::from_json(&json).ok_or_else(|| CatalogError::Decode {
            resource,
            message: "missing group id".to_string(),
        })
    }

    async fn recent_items(
        &self,
        library: &LibraryRef,
        query: &ItemQuery,
    ) -> Result<ItemPage, CatalogError> {
        let resource = format!("{}/items", library.path());

        let mut params = vec![("format", "json".to_string())];
        if let Some(ref collection) = query.collection {
            params.push(("collection", collection.clone()));
        }
        params.push(("sort", "dateModified".to_string()));
        params.push(("direction", "desc".to_string()));
        params.push(("limit", query.limit.to_string()));

        let response = self.get(&resource, &params, ITEMS_TIMEOUT).await?;
        let library_version = library_version(response.headers());
        let items: Vec<Item> = decode(&resource, response).await?;

        Ok(ItemPage {
            items,
            library_version,
        })
    }

    async fn item(&self, library: &LibraryRef, key: &str) -> Result<Item, CatalogError> {
        let resource = format!("{}/items/{}", library.path(), key);
        self.get_json(&resource, ITEMS_TIMEOUT).await
    }
}

async fn check_status(resource: &str, response: Response) -> Result<Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let resource = resource.to_string();
    match status.as_u16() {
        404 => Err(CatalogError::NotFound { resource }),
        403 => Err(CatalogError::Forbidden { resource }),
        code => {
            let body = response.text().await.unwrap_or_default();
            Err(CatalogError::Status {
                status: code,
                resource,
                body,
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(resource: &str, response: Response) -> Result<T, CatalogError> {
    response.json::<T>().await.map_err(|e| CatalogError::Decode {
        resource: resource.to_string(),
        message: e.to_string(),
    })
}

/// Numeric `Last-Modified-Version`, ignoring absent or malformed values.
fn library_version(headers: &HeaderMap) -> Option<i64> {
    let raw = headers.get(VERSION_HEADER)?.to_str().ok()?;
    match raw.trim().parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::debug!(value = raw, "ignoring non-numeric {}", VERSION_HEADER);
            None
        }
    }
}
