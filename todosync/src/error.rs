use thiserror::Error;

use crate::store::{Operation, StoreError};

/// The one way a list operation can fail: the store call it depends on did
/// not succeed, so nothing was mirrored locally.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{op} failed: {cause}")]
    RemoteOperationFailed {
        op: Operation,
        #[source]
        cause: StoreError,
    },
}

impl SyncError {
    pub(crate) fn remote(op: Operation, cause: StoreError) -> Self {
        SyncError::RemoteOperationFailed { op, cause }
    }

    /// The store operation that failed.
    pub fn operation(&self) -> Operation {
        match self {
            SyncError::RemoteOperationFailed { op, .. } => *op,
        }
    }
}
