//! Activity fetching.
//!
//! A run always reads the single newest page of the library: the
//! [`PAGE_SIZE`] most recently modified items, optionally scoped to one
//! collection. There is no pagination and no delta sync against the stored
//! library version, so a library that changes more than a page's worth
//! between runs loses the older changes.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::catalog::{Catalog, ItemPage, ItemQuery};
use crate::models::LibraryRef;

/// Items per run.
pub const PAGE_SIZE: usize = 100;

pub async fn fetch_recent_activity(
    catalog: &dyn Catalog,
    library: &LibraryRef,
    collection: Option<&str>,
) -> Result<ItemPage> {
    let query = ItemQuery {
        collection: collection.map(str::to_string),
        limit: PAGE_SIZE,
    };

    let page = catalog
        .recent_items(library, &query)
        .await
        .with_context(|| format!("Failed to fetch recent items from {}", library))?;

    tracing::debug!("API returned {} items", page.items.len());
    if !page.items.is_empty() {
        let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
        for item in &page.items {
            *by_type.entry(item.item_type()).or_default() += 1;
        }
        tracing::debug!("Item types: {:?}", by_type);
    }

    Ok(page)
}
