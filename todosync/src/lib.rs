//! # todosync
//!
//! A to-do list that stays in step with a remote record store.
//!
//! [`TodoList`] holds the ordered list a UI shows and routes every mutation
//! through a [`RemoteStore`]: the store call happens first and the local list
//! only changes once the store has confirmed it. There is no optimistic
//! update and therefore nothing to roll back.
//!
//! ## Quick start
//!
//! ```ignore
//! use todosync::{TaskPatch, TodoDbBuilder, TodoList};
//!
//! let db = TodoDbBuilder::new("sqlite:./todos.db?mode=rwc").build().await?;
//! let list = TodoList::new(db);
//! list.initialize().await?;
//!
//! let task = list.add("buy milk").await?;
//! list.update(&task.id, TaskPatch::completed(true)).await?;
//! list.delete(&task.id).await?;
//! ```
//!
//! ## Key types
//!
//! - [`TodoList`]: the synchronized list
//! - [`RemoteStore`]: the store interface, with [`TodoDb`] (SeaORM) and
//!   [`MemoryStore`] implementations
//! - [`TodoHandlers`]: UI callbacks that report failures instead of returning them
//! - [`SyncError`]: the single failure kind

pub mod controller;
pub mod error;
pub mod store;
pub mod surface;
pub mod task;

pub use controller::{ChangeKind, ListChange, Snapshot, TodoList};
pub use error::SyncError;
pub use store::memory::MemoryStore;
pub use store::sea::{TodoDb, TodoDbBuilder};
pub use store::{Operation, RemoteStore, StoreError};
pub use surface::{Diagnostics, LogDiagnostics, RenderSurface, TodoHandlers};
pub use task::{Task, TaskId, TaskPatch};

// Re-export sea-orm for users of the library
pub use sea_orm;
