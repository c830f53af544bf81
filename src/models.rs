//! Core data models used throughout the digest pipeline.
//!
//! These types mirror the JSON records returned by the Zotero Web API (v3)
//! closely enough to deserialize them directly, plus the handful of derived
//! types (library reference, digest summary) that flow between pipeline
//! stages.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder title for items with neither a title nor a note body.
pub const UNTITLED: &str = "(untitled)";

/// Maximum number of characters taken from a note's first line when it
/// stands in for a title.
pub const NOTE_TITLE_CHARS: usize = 80;

// ═══════════════════════════════════════════════════════════════════════
// Library
// ═══════════════════════════════════════════════════════════════════════

/// Whether a library belongs to a single user or is shared by a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    /// A personal library owned by the API key holder.
    User,
    /// A shared (group) library.
    Group,
}

impl LibraryKind {
    /// Path segment used by the Web API (`users` / `groups`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            LibraryKind::User => "users",
            LibraryKind::Group => "groups",
        }
    }

    /// Parse the `LIBRARY_TYPE` setting. Accepts the API's own spelling
    /// (`users`, `groups`) as well as `user`/`personal` and `group`/`shared`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "users" | "user" | "personal" => Some(LibraryKind::User),
            "groups" | "group" | "shared" => Some(LibraryKind::Group),
            _ => None,
        }
    }
}

/// The library a run targets. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryRef {
    pub kind: LibraryKind,
    pub id: String,
}

impl LibraryRef {
    pub fn new(kind: LibraryKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn is_personal(&self) -> bool {
        self.kind == LibraryKind::User
    }

    /// API path prefix, e.g. `groups/12345`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.kind.path_segment(), self.id)
    }
}

impl fmt::Display for LibraryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Identity of the API key holder, from `GET /keys/current`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub user_id: String,
    pub username: Option<String>,
}

impl KeyInfo {
    /// Build from the raw `/keys/current` response. Returns `None` when the
    /// response carries no `userID`.
    pub fn from_json(json: &Value) -> Option<Self> {
        let user_id = json.get("userID").and_then(scalar_to_string)?;
        let username = json
            .get("username")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Some(Self { user_id, username })
    }
}

/// A shared library visible to the key holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
}

impl Group {
    /// Build from one entry of `GET /users/{id}/groups` or `GET /groups/{id}`.
    ///
    /// The id may sit at the top level or under `data`; the name usually
    /// sits under `data.name`.
    pub fn from_json(json: &Value) -> Option<Self> {
        let data = json.get("data");
        let id = json
            .get("id")
            .and_then(scalar_to_string)
            .or_else(|| data.and_then(|d| d.get("id")).and_then(scalar_to_string))?;
        let name = data
            .and_then(|d| d.get("name"))
            .or_else(|| json.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();
        Some(Self { id, name })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Items
// ═══════════════════════════════════════════════════════════════════════

/// A library item as returned by the items endpoints (`format=json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable item identity within its library.
    pub key: String,
    #[serde(default)]
    pub data: ItemData,
    #[serde(default)]
    pub meta: ItemMeta,
    #[serde(default)]
    pub links: ItemLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    #[serde(default)]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    #[serde(
        default,
        deserialize_with = "parent_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_item: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMeta {
    /// Either a user object (`{"id": 1, "username": "..."}`) or a bare id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_user: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<Link>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: String,
}

/// Coarse classification of an item by its `itemType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Note,
    Annotation,
    Attachment,
    /// Any type in the configured bibliographic set.
    Bibliographic,
    Other,
}

impl ItemKind {
    pub fn of(item_type: &str, paper_types: &HashSet<String>) -> Self {
        match item_type {
            "note" => ItemKind::Note,
            "annotation" => ItemKind::Annotation,
            "attachment" => ItemKind::Attachment,
            t if paper_types.contains(t) => ItemKind::Bibliographic,
            _ => ItemKind::Other,
        }
    }
}

impl Item {
    pub fn item_type(&self) -> &str {
        &self.data.item_type
    }

    pub fn kind(&self, paper_types: &HashSet<String>) -> ItemKind {
        ItemKind::of(&self.data.item_type, paper_types)
    }

    pub fn is_attachment(&self) -> bool {
        self.data.item_type == "attachment"
    }

    pub fn parent_key(&self) -> Option<&str> {
        self.data.parent_item.as_deref()
    }

    /// When the item was added, or `None` if the field is absent or not
    /// RFC 3339.
    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        self.data.date_added.as_deref().and_then(parse_timestamp)
    }

    /// Id of the user who created the item, if recorded.
    ///
    /// Empty ids count as missing.
    pub fn creator_id(&self) -> Option<String> {
        let created_by = self.meta.created_by_user.as_ref()?;
        let id = match created_by {
            Value::Object(map) => map.get("id").and_then(scalar_to_string),
            other => scalar_to_string(other),
        }?;
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// Username of the creator, falling back to the creator id.
    pub fn creator_label(&self) -> Option<String> {
        self.meta
            .created_by_user
            .as_ref()
            .and_then(|v| v.get("username"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.creator_id())
    }

    /// Human-readable title: the explicit title, else the first line of
    /// the note body (at most [`NOTE_TITLE_CHARS`] characters), else
    /// [`UNTITLED`].
    pub fn display_title(&self) -> String {
        if let Some(title) = self.data.title.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        if let Some(note) = self.data.note.as_deref().filter(|n| !n.is_empty()) {
            let first_line = note.lines().next().unwrap_or_default();
            return first_line.chars().take(NOTE_TITLE_CHARS).collect();
        }
        UNTITLED.to_string()
    }

    /// Web link for the item, preferring the `alternate` (zotero.org) link
    /// over the API `self` link.
    pub fn link(&self) -> Option<&str> {
        self.links
            .alternate
            .as_ref()
            .map(|l| l.href.as_str())
            .filter(|h| !h.is_empty())
            .or_else(|| {
                self.links
                    .self_link
                    .as_ref()
                    .map(|l| l.href.as_str())
                    .filter(|h| !h.is_empty())
            })
    }
}

/// Parse an API timestamp (`2024-03-01T09:15:00Z`).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `parentItem` is a key string on child items; tolerate `false`/`null`.
fn parent_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Digest output
// ═══════════════════════════════════════════════════════════════════════

/// The result of one classification pass.
///
/// Every list is deduplicated by item key and keeps first-seen order.
#[derive(Debug, Clone, Default)]
pub struct DigestSummary {
    /// Bibliographic items added inside the window.
    pub new_papers: Vec<Item>,
    /// Meaningful notes added inside the window.
    pub notes: Vec<Item>,
    /// Meaningful annotations added inside the window.
    pub annotations: Vec<Item>,
    /// Papers with at least one meaningful note or annotation on the
    /// fetched page, regardless of when that child was added.
    pub read_papers: Vec<Item>,
}

impl DigestSummary {
    pub fn new_paper_keys(&self) -> Vec<&str> {
        self.new_papers.iter().map(|i| i.key.as_str()).collect()
    }

    pub fn note_keys(&self) -> Vec<&str> {
        self.notes.iter().map(|i| i.key.as_str()).collect()
    }

    pub fn annotation_keys(&self) -> Vec<&str> {
        self.annotations.iter().map(|i| i.key.as_str()).collect()
    }

    pub fn read_paper_keys(&self) -> Vec<&str> {
        self.read_papers.iter().map(|i| i.key.as_str()).collect()
    }
}

/// Keep the first item per key, preserving order.
pub fn dedup_by_key(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.key.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item_from(value: Value) -> Item {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn deserializes_api_record() {
        let item = item_from(json!({
            "key": "ABCD2345",
            "version": 12,
            "links": {
                "self": {"href": "https://api.zotero.org/groups/1/items/ABCD2345"},
                "alternate": {"href": "https://www.zotero.org/groups/1/items/ABCD2345"}
            },
            "meta": {"createdByUser": {"id": 77, "username": "ada"}, "numChildren": 2},
            "data": {
                "key": "ABCD2345",
                "itemType": "journalArticle",
                "title": "On Computable Numbers",
                "dateAdded": "2024-03-01T09:15:00Z",
                "dateModified": "2024-03-02T10:00:00Z",
                "creators": []
            }
        }));
        assert_eq!(item.item_type(), "journalArticle");
        assert_eq!(item.creator_id().as_deref(), Some("77"));
        assert_eq!(item.creator_label().as_deref(), Some("ada"));
        assert_eq!(
            item.link(),
            Some("https://www.zotero.org/groups/1/items/ABCD2345")
        );
        assert_eq!(
            item.added_at().unwrap().to_rfc3339(),
            "2024-03-01T09:15:00+00:00"
        );
    }

    #[test]
    fn parent_item_false_is_none() {
        let item = item_from(json!({"key": "N1", "data": {"itemType": "note", "parentItem": false}}));
        assert_eq!(item.parent_key(), None);
    }

    #[test]
    fn creator_missing_or_empty() {
        let none = item_from(json!({"key": "A", "data": {"itemType": "note"}}));
        assert_eq!(none.creator_id(), None);

        let empty_obj = item_from(json!({"key": "B", "meta": {"createdByUser": {}}}));
        assert_eq!(empty_obj.creator_id(), None);

        let bare = item_from(json!({"key": "C", "meta": {"createdByUser": 42}}));
        assert_eq!(bare.creator_id().as_deref(), Some("42"));
    }

    #[test]
    fn display_title_fallbacks() {
        let titled = item_from(json!({"key": "A", "data": {"title": "Paper"}}));
        assert_eq!(titled.display_title(), "Paper");

        let long_line = "x".repeat(120);
        let note = item_from(json!({
            "key": "B",
            "data": {"title": "", "note": format!("{}\nsecond line", long_line)}
        }));
        assert_eq!(note.display_title().chars().count(), NOTE_TITLE_CHARS);

        let bare = item_from(json!({"key": "C", "data": {"itemType": "annotation"}}));
        assert_eq!(bare.display_title(), UNTITLED);
    }

    #[test]
    fn link_falls_back_to_self() {
        let item = item_from(json!({
            "key": "A",
            "links": {"self": {"href": "https://api.zotero.org/users/1/items/A"}}
        }));
        assert_eq!(item.link(), Some("https://api.zotero.org/users/1/items/A"));

        let none = item_from(json!({"key": "B"}));
        assert_eq!(none.link(), None);
    }

    #[test]
    fn unparsable_date_is_none() {
        let item = item_from(json!({"key": "A", "data": {"dateAdded": "yesterday"}}));
        assert_eq!(item.added_at(), None);
    }

    #[test]
    fn group_from_nested_or_flat() {
        let nested = Group::from_json(&json!({"id": 12, "data": {"id": 12, "name": " Lab "}})).unwrap();
        assert_eq!(nested, Group { id: "12".into(), name: "Lab".into() });

        let flat = Group::from_json(&json!({"data": {"id": 5}, "name": "Reading"})).unwrap();
        assert_eq!(flat, Group { id: "5".into(), name: "Reading".into() });

        assert!(Group::from_json(&json!({"name": "no id"})).is_none());
    }

    #[test]
    fn library_kind_aliases() {
        assert_eq!(LibraryKind::parse("users"), Some(LibraryKind::User));
        assert_eq!(LibraryKind::parse("Personal"), Some(LibraryKind::User));
        assert_eq!(LibraryKind::parse("groups"), Some(LibraryKind::Group));
        assert_eq!(LibraryKind::parse("shared"), Some(LibraryKind::Group));
        assert_eq!(LibraryKind::parse("team"), None);
        assert_eq!(LibraryRef::new(LibraryKind::Group, "9").to_string(), "groups/9");
    }

    #[test]
    fn dedup_keeps_first() {
        let a1 = item_from(json!({"key": "A", "data": {"title": "first"}}));
        let b = item_from(json!({"key": "B"}));
        let a2 = item_from(json!({"key": "A", "data": {"title": "second"}}));
        let out = dedup_by_key(vec![a1, b, a2]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].display_title(), "first");
    }
}
