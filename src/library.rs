//! Target library resolution.
//!
//! Turns the library settings into a single [`LibraryRef`], asking the
//! catalog who owns the API key and which groups it can see. Every failure
//! here is a configuration problem, so errors carry a message that tells
//! the operator what to change (and lists valid choices where there are
//! any).

use anyhow::{bail, Context, Result};

use crate::catalog::{Catalog, CatalogError};
use crate::config::{Config, LibrarySettings};
use crate::models::{Group, LibraryKind, LibraryRef};

/// Resolve the library a run should read.
///
/// # Rules
///
/// 1. The key owner's user id is always looked up first.
/// 2. An explicit id wins. A group id equal to the owner's user id is
///    rejected; any other group id is checked for existence and access.
/// 3. Without an id, a personal library resolves to the owner's id.
/// 4. Without an id, a group library is picked by `GROUP_NAME`
///    (case-insensitive), or is the only group visible to the key.
pub async fn resolve_library(
    catalog: &dyn Catalog,
    settings: &LibrarySettings,
) -> Result<LibraryRef> {
    let key = catalog
        .current_key()
        .await
        .context("Failed to look up the owner of ZOTERO_API_KEY")?;
    let user_id = key.user_id;

    if let Some(ref id) = settings.id {
        if settings.kind == LibraryKind::Group {
            if *id == user_id {
                bail!(
                    "LIBRARY_ID looks like your userID. For groups, set the group's numeric id or GROUP_NAME."
                );
            }
            verify_group_access(catalog, id).await?;
        }
        return Ok(LibraryRef::new(settings.kind, id.clone()));
    }

    if settings.kind == LibraryKind::User {
        return Ok(LibraryRef::new(LibraryKind::User, user_id));
    }

    let groups = catalog
        .groups_for_user(&user_id)
        .await
        .with_context(|| format!("Failed to list groups for user {}", user_id))?;

    if let Some(ref name) = settings.group_name {
        let wanted = name.to_lowercase();
        return match groups.iter().find(|g| g.name.to_lowercase() == wanted) {
            Some(g) => Ok(LibraryRef::new(LibraryKind::Group, g.id.clone())),
            None => bail!(
                "GROUP_NAME=\"{}\" not found. Available: {}",
                name,
                format_choices(&groups)
            ),
        };
    }

    match groups.as_slice() {
        [only] => Ok(LibraryRef::new(LibraryKind::Group, only.id.clone())),
        [] => bail!("No groups available to this API key."),
        _ => bail!(
            "Multiple groups found. Set LIBRARY_ID or GROUP_NAME. Choices: {}",
            format_choices(&groups)
        ),
    }
}

async fn verify_group_access(catalog: &dyn Catalog, id: &str) -> Result<()> {
    match catalog.group(id).await {
        Ok(_) => Ok(()),
        Err(CatalogError::NotFound { .. }) => bail!("Group {} not found.", id),
        Err(CatalogError::Forbidden { .. }) => bail!(
            "No access to group {}. Edit your API key permissions on zotero.org.",
            id
        ),
        Err(e) => Err(anyhow::Error::new(e).context(format!("Failed to verify group {}", id))),
    }
}

/// `name=id` pairs, comma separated.
fn format_choices(groups: &[Group]) -> String {
    groups
        .iter()
        .map(|g| format!("{}={}", g.name, g.id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `zdigest library`: print the resolved library and what the key can see.
pub async fn show_library(config: &Config, catalog: &dyn Catalog) -> Result<()> {
    let library = resolve_library(catalog, &config.library).await?;
    let key = catalog.current_key().await?;

    println!("Library:     {}", library);
    if let Some(ref collection) = config.library.collection {
        println!("Collection:  {}", collection);
    }
    println!(
        "Key owner:   {}{}",
        key.user_id,
        key.username
            .map(|u| format!(" ({})", u))
            .unwrap_or_default()
    );

    let groups = catalog.groups_for_user(&key.user_id).await?;
    if groups.is_empty() {
        println!("Groups:      none");
        return Ok(());
    }

    println!();
    println!("  {:<12} {:<8} NAME", "GROUP ID", "TARGET");
    for g in &groups {
        let target = library.kind == LibraryKind::Group && library.id == g.id;
        println!(
            "  {:<12} {:<8} {}",
            g.id,
            if target { "*" } else { "" },
            g.name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::memory::MemoryCatalog;

    fn settings(kind: LibraryKind, id: Option<&str>, group_name: Option<&str>) -> LibrarySettings {
        LibrarySettings {
            kind,
            id: id.map(str::to_string),
            group_name: group_name.map(str::to_string),
            collection: None,
        }
    }

    #[tokio::test]
    async fn personal_library_uses_key_owner() {
        let catalog = MemoryCatalog::new("555");
        let lib = resolve_library(&catalog, &settings(LibraryKind::User, None, None))
            .await
            .unwrap();
        assert_eq!(lib, LibraryRef::new(LibraryKind::User, "555"));
    }

    #[tokio::test]
    async fn explicit_user_id_is_accepted_as_is() {
        let catalog = MemoryCatalog::new("555");
        let lib = resolve_library(&catalog, &settings(LibraryKind::User, Some("777"), None))
            .await
            .unwrap();
        assert_eq!(lib.to_string(), "users/777");
    }

    #[tokio::test]
    async fn group_id_equal_to_user_id_rejected() {
        let catalog = MemoryCatalog::new("555").with_group("555", "Odd");
        let err = resolve_library(&catalog, &settings(LibraryKind::Group, Some("555"), None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("looks like your userID"));
    }

    #[tokio::test]
    async fn explicit_group_checked_for_access() {
        let catalog = MemoryCatalog::new("1")
            .with_group("10", "Lab")
            .with_forbidden_group("11");

        let ok = resolve_library(&catalog, &settings(LibraryKind::Group, Some("10"), None))
            .await
            .unwrap();
        assert_eq!(ok.to_string(), "groups/10");

        let forbidden = resolve_library(&catalog, &settings(LibraryKind::Group, Some("11"), None))
            .await
            .unwrap_err();
        assert!(forbidden.to_string().contains("No access to group 11"));

        let missing = resolve_library(&catalog, &settings(LibraryKind::Group, Some("12"), None))
            .await
            .unwrap_err();
        assert_eq!(missing.to_string(), "Group 12 not found.");
    }

    #[tokio::test]
    async fn group_selected_by_name_case_insensitive() {
        let catalog = MemoryCatalog::new("1")
            .with_group("10", "Lab")
            .with_group("20", "Journal Club");
        let lib = resolve_library(
            &catalog,
            &settings(LibraryKind::Group, None, Some("journal club")),
        )
        .await
        .unwrap();
        assert_eq!(lib.id, "20");
    }

    #[tokio::test]
    async fn unknown_group_name_lists_choices() {
        let catalog = MemoryCatalog::new("1")
            .with_group("10", "Lab")
            .with_group("20", "Journal Club");
        let err = resolve_library(&catalog, &settings(LibraryKind::Group, None, Some("Nope")))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("GROUP_NAME=\"Nope\" not found"));
        assert!(msg.contains("Lab=10, Journal Club=20"));
    }

    #[tokio::test]
    async fn single_group_auto_selected() {
        let catalog = MemoryCatalog::new("1").with_group("10", "Lab");
        let lib = resolve_library(&catalog, &settings(LibraryKind::Group, None, None))
            .await
            .unwrap();
        assert_eq!(lib, LibraryRef::new(LibraryKind::Group, "10"));
    }

    #[tokio::test]
    async fn zero_or_many_groups_fail() {
        let none = MemoryCatalog::new("1");
        let err = resolve_library(&none, &settings(LibraryKind::Group, None, None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No groups available to this API key.");

        let many = MemoryCatalog::new("1")
            .with_group("10", "Lab")
            .with_group("20", "Club");
        let err = resolve_library(&many, &settings(LibraryKind::Group, None, None))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Multiple groups found."));
        assert!(msg.contains("Lab=10, Club=20"));
    }
}
