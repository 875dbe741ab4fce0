//! The remote record store the list is mirrored from.
//!
//! [`RemoteStore`] is the only way the controller talks to persistent state.
//! Two implementations ship with the crate:
//!
//! - [`TodoDb`](sea::TodoDb): a SeaORM connection over a `todos` table
//! - [`MemoryStore`](memory::MemoryStore): in-process, with fault injection for tests

pub mod memory;
pub mod sea;

use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

use crate::task::{Task, TaskId, TaskPatch};

/// Failure reported by a store. Opaque to the controller.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The four operations a store exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListAll,
    InsertOne,
    DeleteById,
    UpdateById,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::ListAll,
        Operation::InsertOne,
        Operation::DeleteById,
        Operation::UpdateById,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::ListAll => "listAll",
            Operation::InsertOne => "insertOne",
            Operation::DeleteById => "deleteById",
            Operation::UpdateById => "updateById",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single collection of task records.
///
/// No retry, ordering or idempotency guarantees are expected of an
/// implementation: a call either fails or takes effect once.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// All records, newest `created_at` first.
    async fn list_all(&self) -> Result<Vec<Task>, StoreError>;

    /// Create a record from non-empty text. The returned record carries the
    /// store-assigned `id` and `created_at` and starts out not completed.
    async fn insert_one(&self, task: &str) -> Result<Task, StoreError>;

    /// Remove the record with `id`. Unknown ids are acknowledged.
    async fn delete_by_id(&self, id: &TaskId) -> Result<(), StoreError>;

    /// Write the set fields of `fields` to the record with `id`.
    /// Unknown ids are acknowledged.
    async fn update_by_id(&self, id: &TaskId, fields: &TaskPatch) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<S> {
    async fn list_all(&self) -> Result<Vec<Task>, StoreError> {
        (**self).list_all().await
    }

    async fn insert_one(&self, task: &str) -> Result<Task, StoreError> {
        (**self).insert_one(task).await
    }

    async fn delete_by_id(&self, id: &TaskId) -> Result<(), StoreError> {
        (**self).delete_by_id(id).await
    }

    async fn update_by_id(&self, id: &TaskId, fields: &TaskPatch) -> Result<(), StoreError> {
        (**self).update_by_id(id, fields).await
    }
}

/// Reject text that is empty once surrounding whitespace is ignored.
pub(crate) fn validate_text(task: &str) -> Result<(), StoreError> {
    if task.trim().is_empty() {
        return Err(StoreError::Validation("task text must not be empty".into()));
    }
    Ok(())
}
