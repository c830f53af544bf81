//! Child → paper resolution.
//!
//! Notes hang directly off their paper; annotations usually hang off an
//! attachment (the PDF) which in turn hangs off the paper. Each hop is one
//! catalog lookup, and nothing is cached: two notes on the same paper fetch
//! it twice.

use std::collections::HashSet;

use crate::catalog::{Catalog, CatalogError};
use crate::config::Config;
use crate::models::{Item, LibraryRef};

/// Walk `item` up to the item that owns it.
///
/// Returns `Ok(None)` when the item has no parent, or its parent is an
/// attachment with no parent of its own. The returned item is not checked
/// against the paper types; callers decide whether it counts.
pub async fn resolve_bibliographic_ancestor(
    catalog: &dyn Catalog,
    library: &LibraryRef,
    item: &Item,
) -> Result<Option<Item>, CatalogError> {
    let Some(parent_key) = item.parent_key() else {
        return Ok(None);
    };

    let parent = catalog.item(library, parent_key).await?;
    if !parent.is_attachment() {
        return Ok(Some(parent));
    }

    match parent.parent_key() {
        Some(grand_key) => Ok(Some(catalog.item(library, grand_key).await?)),
        // Orphaned attachment: no paper, so the timing check is skipped.
        None => Ok(None),
    }
}

/// Papers that own at least one of `children`, deduplicated by key in
/// first-seen order.
///
/// Lookup errors skip the child and the loop continues.
pub async fn collect_read_papers(
    catalog: &dyn Catalog,
    config: &Config,
    library: &LibraryRef,
    children: &[&Item],
) -> Vec<Item> {
    let mut seen = HashSet::new();
    let mut papers = Vec::new();

    for child in children {
        let paper = match resolve_bibliographic_ancestor(catalog, library, child).await {
            Ok(Some(paper)) => paper,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(child = %child.key, error = %e, "skipping child after lookup error");
                continue;
            }
        };

        if !config.is_paper_type(paper.item_type()) {
            continue;
        }

        tracing::debug!(
            "{} '{}' linked to paper '{}'",
            child.item_type(),
            truncate(&child.display_title(), 30),
            truncate(&paper.display_title(), 30)
        );

        if seen.insert(paper.key.clone()) {
            papers.push(paper);
        }
    }

    papers
}

/// First `max` characters of `s`.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalog;
    use crate::models::{ItemData, LibraryKind};

    fn item(key: &str, item_type: &str, parent: Option<&str>) -> Item {
        Item {
            key: key.to_string(),
            data: ItemData {
                item_type: item_type.to_string(),
                parent_item: parent.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn lib() -> LibraryRef {
        LibraryRef::new(LibraryKind::Group, "10")
    }

    #[tokio::test]
    async fn note_resolves_to_direct_parent() {
        let catalog = MemoryCatalog::new("1").with_hidden_item(item("P1", "journalArticle", None));
        let note = item("N1", "note", Some("P1"));

        let paper = resolve_bibliographic_ancestor(&catalog, &lib(), &note)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paper.key, "P1");
        assert_eq!(catalog.lookups(), 1);
    }

    #[tokio::test]
    async fn annotation_walks_through_attachment() {
        let catalog = MemoryCatalog::new("1")
            .with_hidden_item(item("P1", "preprint", None))
            .with_hidden_item(item("A1", "attachment", Some("P1")));
        let annotation = item("AN1", "annotation", Some("A1"));

        let paper = resolve_bibliographic_ancestor(&catalog, &lib(), &annotation)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paper.key, "P1");
        assert_eq!(catalog.lookups(), 2);
    }

    #[tokio::test]
    async fn orphans_resolve_to_none() {
        let catalog =
            MemoryCatalog::new("1").with_hidden_item(item("A1", "attachment", None));

        let no_parent = item("N1", "note", None);
        assert!(resolve_bibliographic_ancestor(&catalog, &lib(), &no_parent)
            .await
            .unwrap()
            .is_none());
        assert_eq!(catalog.lookups(), 0);

        let standalone_attachment_child = item("AN1", "annotation", Some("A1"));
        assert!(
            resolve_bibliographic_ancestor(&catalog, &lib(), &standalone_attachment_child)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn lookup_error_propagates() {
        let catalog = MemoryCatalog::new("1").with_failing_key("P1");
        let note = item("N1", "note", Some("P1"));
        assert!(resolve_bibliographic_ancestor(&catalog, &lib(), &note)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn read_papers_dedup_skip_errors_and_non_papers() {
        let catalog = MemoryCatalog::new("1")
            .with_hidden_item(item("P1", "journalArticle", None))
            .with_hidden_item(item("P2", "book", None))
            .with_hidden_item(item("W1", "webpage", None))
            .with_hidden_item(item("A1", "attachment", Some("P1")))
            .with_failing_key("BROKEN");
        let config = Config::minimal("k");

        let children = [
            item("N1", "note", Some("P1")),
            item("AN1", "annotation", Some("A1")),
            item("N2", "note", Some("BROKEN")),
            item("N3", "note", Some("W1")),
            item("N4", "note", Some("P2")),
            item("N5", "note", None),
        ];
        let refs: Vec<&Item> = children.iter().collect();

        let papers = collect_read_papers(&catalog, &config, &lib(), &refs).await;
        let keys: Vec<&str> = papers.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["P1", "P2"]);
    }
}
