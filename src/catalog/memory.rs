//! In-memory [`Catalog`] implementation for tests.
//!
//! Holds one key identity, a list of visible groups and a single library's
//! items. Items are either on the recent-items page or only reachable by
//! key (parents that were not modified recently). Lookups can be made to
//! fail per key, the page listing can be made to fail outright, and every single-item lookup is counted so tests can assert
//! how many network calls a stage would have made.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Catalog, CatalogError, ItemPage, ItemQuery};
use crate::models::{Group, Item, KeyInfo, LibraryRef};

/// In-memory catalog. Build it with the `with_*` methods.
pub struct MemoryCatalog {
    key: KeyInfo,
    groups: Vec<Group>,
    forbidden_groups: HashSet<String>,
    page: Vec<Item>,
    by_key: HashMap<String, Item>,
    failing_keys: HashSet<String>,
    failing_page: bool,
    library_version: Option<i64>,
    lookups: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new(user_id: &str) -> Self {
        Self {
            key: KeyInfo {
                user_id: user_id.to_string(),
                username: None,
            },
            groups: Vec::new(),
            forbidden_groups: HashSet::new(),
            page: Vec::new(),
            by_key: HashMap::new(),
            failing_keys: HashSet::new(),
            failing_page: false,
            library_version: None,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_group(mut self, id: &str, name: &str) -> Self {
        self.groups.push(Group {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// A group that exists but the key cannot read.
    pub fn with_forbidden_group(mut self, id: &str) -> Self {
        self.forbidden_groups.insert(id.to_string());
        self
    }

    /// An item that appears on the recent-items page (and by key).
    pub fn with_item(mut self, item: Item) -> Self {
        self.by_key.insert(item.key.clone(), item.clone());
        self.page.push(item);
        self
    }

    /// An item reachable only by key.
    pub fn with_hidden_item(mut self, item: Item) -> Self {
        self.by_key.insert(item.key.clone(), item);
        self
    }

    /// Make lookups of `key` fail with a server error.
    pub fn with_failing_key(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    /// Make the recent-items listing fail with a server error.
    pub fn with_failing_page(mut self) -> Self {
        self.failing_page = true;
        self
    }

    pub fn with_library_version(mut self, version: i64) -> Self {
        self.library_version = Some(version);
        self
    }

    /// Number of single-item lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn current_key(&self) -> Result<KeyInfo, CatalogError> {
        Ok(self.key.clone())
    }

    async fn groups_for_user(&self, _user_id: &str) -> Result<Vec<Group>, CatalogError> {
        Ok(self.groups.clone())
    }

    async fn group(&self, group_id: &str) -> Result<Group, CatalogError> {
        let resource = format!("groups/{}", group_id);
        if self.forbidden_groups.contains(group_id) {
            return Err(CatalogError::Forbidden { resource });
        }
        self.groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or(CatalogError::NotFound { resource })
    }

    async fn recent_items(
        &self,
        library: &LibraryRef,
        query: &ItemQuery,
    ) -> Result<ItemPage, CatalogError> {
        if self.failing_page {
            return Err(CatalogError::Status {
                status: 503,
                resource: format!("{}/items", library.path()),
                body: "induced failure".to_string(),
            });
        }
        let mut items = self.page.clone();
        // RFC 3339 strings in one zone sort chronologically.
        items.sort_by(|a, b| b.data.date_modified.cmp(&a.data.date_modified));
        items.truncate(query.limit);
        Ok(ItemPage {
            items,
            library_version: self.library_version,
        })
    }

    async fn item(&self, library: &LibraryRef, key: &str) -> Result<Item, CatalogError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let resource = format!("{}/items/{}", library.path(), key);
        if self.failing_keys.contains(key) {
            return Err(CatalogError::Status {
                status: 500,
                resource,
                body: "induced failure".to_string(),
            });
        }
        self.by_key
            .get(key)
            .cloned()
            .ok_or(CatalogError::NotFound { resource })
    }
}
