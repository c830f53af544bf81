//! Classification of a fetched page into a [`DigestSummary`].
//!
//! # Pipeline
//!
//! ```text
//! page ──▶ partition ──▶ papers ──────── in window ───────────────▶ new_papers
//!              │
//!              ├──▶ notes ───────┐                ┌─ in window ──▶ notes
//!              └──▶ annotations ─┴─▶ meaningful? ─┤
//!                                                 └─ any time ──▶ parents ──▶ read_papers
//! ```
//!
//! # Meaningful notes and annotations
//!
//! Reference managers create some annotations and notes automatically when
//! a paper is imported. In shared libraries these are filtered out: a child
//! counts only if it has a recorded creator and was added more than
//! `auto_annotation_threshold` minutes after its paper. A missing creator
//! rejects the child; a failed or empty parent lookup keeps it. Personal
//! libraries skip the check entirely.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::models::{dedup_by_key, DigestSummary, Item, ItemKind, LibraryRef};
use crate::parents::{collect_read_papers, resolve_bibliographic_ancestor, truncate};
use crate::window::ActivityWindow;

/// A page split by item kind. Attachments and other types are dropped.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub notes: Vec<&'a Item>,
    pub annotations: Vec<&'a Item>,
    pub papers: Vec<&'a Item>,
}

pub fn partition<'a>(items: &'a [Item], config: &Config) -> Partition<'a> {
    let mut out = Partition::default();
    for item in items {
        match item.kind(&config.paper_types) {
            ItemKind::Note => out.notes.push(item),
            ItemKind::Annotation => out.annotations.push(item),
            ItemKind::Bibliographic => out.papers.push(item),
            ItemKind::Attachment | ItemKind::Other => {}
        }
    }
    out
}

/// Whether the item was added inside the window. Items without a readable
/// `dateAdded` are outside.
pub fn in_window(item: &Item, window: &ActivityWindow) -> bool {
    item.added_at().is_some_and(|ts| window.contains(ts))
}

/// Whether a note or annotation reflects a person's activity rather than
/// import tooling.
pub async fn is_meaningful(
    catalog: &dyn Catalog,
    config: &Config,
    library: &LibraryRef,
    item: &Item,
) -> bool {
    if library.is_personal() {
        return true;
    }

    let Some(creator) = item.creator_id() else {
        tracing::debug!(item = %item.key, "no createdByUser; excluding");
        return false;
    };

    let paper = match resolve_bibliographic_ancestor(catalog, library, item).await {
        Ok(Some(paper)) => paper,
        Ok(None) => {
            tracing::debug!(item = %item.key, "no parent paper; including");
            return true;
        }
        Err(e) => {
            tracing::debug!(item = %item.key, "Error checking annotation timing: {}", e);
            return true;
        }
    };

    let (Some(added), Some(paper_added)) = (item.added_at(), paper.added_at()) else {
        tracing::debug!(item = %item.key, "unreadable dateAdded; including");
        return true;
    };

    let minutes = (added - paper_added).num_milliseconds() as f64 / 60_000.0;
    let include = minutes > config.auto_annotation_threshold as f64;

    tracing::debug!(
        "{} '{}' on '{}'",
        capitalize(item.item_type()),
        truncate(&item.display_title(), 50),
        truncate(&paper.display_title(), 30)
    );
    tracing::debug!(
        "  - createdBy: {} ({})",
        item.creator_label().unwrap_or_else(|| creator.clone()),
        creator
    );
    tracing::debug!(
        "  - time_diff: {:.1}min, threshold: {}min",
        minutes,
        config.auto_annotation_threshold
    );
    tracing::debug!("  - include: {}", include);

    include
}

/// Classify a fetched page.
///
/// Each note and annotation is checked for meaningfulness once; the
/// windowed lists and `read_papers` both draw from that result.
pub async fn classify(
    catalog: &dyn Catalog,
    config: &Config,
    library: &LibraryRef,
    window: &ActivityWindow,
    items: &[Item],
) -> DigestSummary {
    let groups = partition(items, config);

    let new_papers: Vec<Item> = groups
        .papers
        .iter()
        .filter(|it| in_window(it, window))
        .map(|it| (*it).clone())
        .collect();

    let mut meaningful_notes = Vec::new();
    for note in &groups.notes {
        if is_meaningful(catalog, config, library, note).await {
            meaningful_notes.push(*note);
        }
    }

    let mut meaningful_annotations = Vec::new();
    for annotation in &groups.annotations {
        if is_meaningful(catalog, config, library, annotation).await {
            meaningful_annotations.push(*annotation);
        }
    }

    let notes = windowed(&meaningful_notes, window);
    let annotations = windowed(&meaningful_annotations, window);

    tracing::debug!(
        "Before filtering - papers: {}, notes: {}, annotations: {}",
        groups.papers.len(),
        groups.notes.len(),
        groups.annotations.len()
    );
    tracing::debug!(
        "After time window filter - papers: {}, notes: {}, annotations: {}",
        new_papers.len(),
        groups.notes.iter().filter(|it| in_window(it, window)).count(),
        groups
            .annotations
            .iter()
            .filter(|it| in_window(it, window))
            .count()
    );
    tracing::debug!(
        "After timing filter ({}min threshold) - notes: {}, annotations: {}",
        config.auto_annotation_threshold,
        notes.len(),
        annotations.len()
    );
    tracing::debug!("Time window: {} to {}", window.start, window.end);
    if !groups.annotations.is_empty() {
        tracing::debug!("Sample annotation dates:");
        for ann in groups.annotations.iter().take(3) {
            tracing::debug!(
                "  - {} - dateAdded: {}",
                truncate(&ann.display_title(), 30),
                ann.data.date_added.as_deref().unwrap_or("N/A")
            );
        }
    }

    let children: Vec<&Item> = meaningful_notes
        .iter()
        .chain(meaningful_annotations.iter())
        .copied()
        .collect();
    let read_papers = collect_read_papers(catalog, config, library, &children).await;

    DigestSummary {
        new_papers: dedup_by_key(new_papers),
        notes,
        annotations,
        read_papers,
    }
}

fn windowed(items: &[&Item], window: &ActivityWindow) -> Vec<Item> {
    dedup_by_key(
        items
            .iter()
            .filter(|it| in_window(it, window))
            .map(|it| (*it).clone())
            .collect(),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
