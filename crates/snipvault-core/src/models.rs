use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a tag in the hierarchy: a pure container, a leaf that only
/// carries snippets, or both at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Folder,
    Leaf,
    Both,
}

impl TagType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Leaf => "leaf",
            Self::Both => "both",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "folder" => Some(Self::Folder),
            "leaf" => Some(Self::Leaf),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// Which store a row came from. Secondary rows are read-only for this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Primary,
    Secondary,
}

impl Origin {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(Self::Primary),
            "secondary" => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// Read/search merge mode for the repository. Writes always target the
/// primary store regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreMode {
    PrimaryOnly,
    SecondaryOnly,
    Hybrid,
}

impl StoreMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryOnly => "primary-only",
            Self::SecondaryOnly => "secondary-only",
            Self::Hybrid => "hybrid",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary-only" => Some(Self::PrimaryOnly),
            "secondary-only" => Some(Self::SecondaryOnly),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }

    #[must_use]
    pub fn includes_secondary(self) -> bool {
        matches!(self, Self::SecondaryOnly | Self::Hybrid)
    }
}

/// A tag row as persisted, without derived fields. Internal currency between
/// the store and the path resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRow {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    #[serde(rename = "type")]
    pub tag_type: TagType,
    pub icon: String,
    pub color: String,
    pub description: Option<String>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable tag snapshot handed to callers: the persisted row plus the
/// resolved hierarchy path and the store it came from. Editing a record
/// never touches store state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    #[serde(rename = "type")]
    pub tag_type: TagType,
    pub icon: String,
    pub color: String,
    pub description: Option<String>,
    pub position: i64,
    pub full_path: String,
    pub origin: Origin,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TagRecord {
    #[must_use]
    pub fn from_row(row: TagRow, full_path: String, origin: Origin) -> Self {
        Self {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
            tag_type: row.tag_type,
            icon: row.icon,
            color: row.color,
            description: row.description,
            position: row.position,
            full_path,
            origin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Immutable snippet snapshot handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetRecord {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub usage_count: i64,
    pub last_used: Option<DateTime<Utc>>,
    pub origin: Origin,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for snippet creation. `tag_ids` may repeat; duplicates collapse to
/// one association row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnippetDraft {
    pub name: String,
    pub code: String,
    pub language: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// Partial update for a snippet. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct SnippetChanges {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

impl SnippetChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.description.is_none()
            && self.language.is_none()
    }
}
