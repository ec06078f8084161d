//! Domain Layer
//!
//! Contains all domain entities and core abstractions.

mod entity;
mod item;
mod workspace;
mod pending;
mod checklist;

pub use entity::{upsert, DomainError, DomainResult, Entity};
pub use item::{is_temp_id, new_temp_id, Item, ItemType, TEMP_ID_PREFIX};
pub use workspace::Workspace;
pub use pending::{FileChanges, OperationKind, OperationType, OrderUpdate, PendingOperation};
pub use checklist::{Checklist, ChecklistEntry};
