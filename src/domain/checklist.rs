//! Task checklists
//!
//! Task items store their checklist as JSON in `Item::content`.

use serde::{Deserialize, Serialize};

use super::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checklist {
    pub entries: Vec<ChecklistEntry>,
}

impl Checklist {
    /// Parse task content. Missing or blank content is an empty checklist.
    pub fn parse(content: Option<&str>) -> DomainResult<Self> {
        match content.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| DomainError::InvalidInput(format!("malformed checklist: {}", e))),
        }
    }

    pub fn to_content(&self) -> DomainResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.entries.push(ChecklistEntry { text: text.into(), done: false });
    }

    /// Flip an entry; returns the new state, or None if out of range
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let entry = self.entries.get_mut(index)?;
        entry.done = !entry.done;
        Some(entry.done)
    }

    /// (done, total)
    pub fn progress(&self) -> (usize, usize) {
        let done = self.entries.iter().filter(|e| e.done).count();
        (done, self.entries.len())
    }
}
