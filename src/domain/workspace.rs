//! Workspace domain entity

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Workspace represents an isolated set of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

impl Entity for Workspace {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Workspace {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}
