//! Item Entity
//!
//! A node in a workspace hierarchy (single parent).

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Prefix of client-generated ids awaiting a server id
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Item type determines behavior and appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Container for other items
    Folder,
    /// Rich text document
    #[default]
    Note,
    /// Video reference
    Video,
    /// Checklist
    Task,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Folder => "folder",
            ItemType::Note => "note",
            ItemType::Video => "video",
            ItemType::Task => "task",
        }
    }

    /// Only containers accept "inside" drops
    pub fn is_container(&self) -> bool {
        match self {
            ItemType::Folder => true,
            ItemType::Note | ItemType::Video | ItemType::Task => false,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ItemType::Folder => "folder",
            ItemType::Note => "file-text",
            ItemType::Video => "play-circle",
            ItemType::Task => "check-square",
        }
    }
}

impl std::str::FromStr for ItemType {
    type Err = super::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(ItemType::Folder),
            "note" => Ok(ItemType::Note),
            "video" => Ok(ItemType::Video),
            "task" => Ok(ItemType::Task),
            other => Err(super::DomainError::InvalidInput(format!("unknown item type '{}'", other))),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A folder, note, video or task inside a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub workspace_id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub title: String,
    /// Rich text (HTML/JSON) or a serialized checklist for tasks
    #[serde(default)]
    pub content: Option<String>,
    /// Parent item ID (None = root level)
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Position within siblings
    #[serde(default)]
    pub order_index: i64,
    /// False while the item sits in the trash
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Item {
    /// Create a new root item with default values
    pub fn new(
        id: impl Into<String>,
        workspace_id: impl Into<String>,
        item_type: ItemType,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            workspace_id: workspace_id.into(),
            item_type,
            title: title.into(),
            content: None,
            parent_id: None,
            order_index: 0,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    /// Builder-style parent and position
    pub fn under(mut self, parent_id: Option<&str>, order_index: i64) -> Self {
        self.parent_id = parent_id.map(str::to_string);
        self.order_index = order_index;
        self
    }

    /// Check if this is a root item (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Client-generated id not yet confirmed by the backend
    pub fn is_temporary(&self) -> bool {
        is_temp_id(&self.id)
    }
}

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Fresh client-side id for an optimistic create
pub fn new_temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4().simple())
}

impl Entity for Item {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
