//! Repository Layer
//!
//! Durable local storage: the pending operation queue and persisted client
//! state. Item data itself lives on the backend.

mod db;
mod pending_repo;
mod client_state_repo;


pub use db::{init_db, DbConn};
pub use pending_repo::PendingRepository;
pub use client_state_repo::ClientStateRepository;
