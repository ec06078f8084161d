//! Remote API Layer
//!
//! REST client for the backend that owns persistence. This is the only
//! layer that produces user-visible errors.

mod client;
mod error;
mod models;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{HttpApi, USER_ID_HEADER};
pub use error::{error_message, ApiError, ApiResult};
pub use models::{
    AiGenerateRequest, AiGenerateResponse, BatchSyncRequest, BatchSyncResponse, NewFile,
    NewWorkspace, OperationResult, OrderPatch, SyncFilesResponse, WorkspaceProgress,
};
pub use traits::RemoteApi;
