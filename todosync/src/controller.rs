//! The synchronized list.
//!
//! [`TodoList`] owns the ordered sequence of tasks shown to the user and
//! routes every mutation through a [`RemoteStore`]. The store call always
//! comes first; the local list only changes once the store has confirmed the
//! write. A failed call leaves the list exactly as it was, so the local copy
//! can never reach a state the store never reached.
//!
//! Operations take `&self` and may overlap while they wait on the store. No
//! ordering is enforced between overlapping operations: each mirror step is
//! applied when its store call returns, and the last one applied wins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use crate::error::SyncError;
use crate::store::{Operation, RemoteStore};
use crate::task::{Task, TaskId, TaskPatch};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// What a mirror step did to the local list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// The whole list was replaced from `list_all`.
    Loaded,
    Added(TaskId),
    Removed(TaskId),
    Updated(TaskId),
}

/// Emitted after every applied mirror step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListChange {
    /// List version after the change.
    pub version: u64,
    pub kind: ChangeKind,
}

/// A consistent copy of the list at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u64,
    pub items: Vec<Task>,
}

#[derive(Debug, Default)]
struct ListState {
    items: Vec<Task>,
    version: u64,
}

struct Shared<S> {
    store: S,
    state: RwLock<ListState>,
    initialized: AtomicBool,
    change_tx: broadcast::Sender<ListChange>,
}

/// In-memory task list mirrored from a [`RemoteStore`].
///
/// Cloning is cheap and every clone shares the same list.
pub struct TodoList<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for TodoList<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: RemoteStore> TodoList<S> {
    /// Create an empty list over `store`. Nothing is fetched until
    /// [`initialize`](Self::initialize) runs.
    pub fn new(store: S) -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                store,
                state: RwLock::new(ListState::default()),
                initialized: AtomicBool::new(false),
                change_tx,
            }),
        }
    }

    /// The store this list mirrors.
    pub fn store(&self) -> &S {
        &self.shared.store
    }

    /// Load the list from the store on first activation.
    ///
    /// Only the first call reaches the store, whether it succeeds or not.
    /// Later calls log a warning and return `Ok(())` without touching the
    /// list; use [`refresh`](Self::refresh) to re-fetch deliberately.
    pub async fn initialize(&self) -> Result<(), SyncError> {
        if self.shared.initialized.swap(true, Ordering::SeqCst) {
            log::warn!("todo list already initialized; ignoring repeated initialize");
            return Ok(());
        }
        self.load().await
    }

    /// Re-fetch the whole list and replace the local copy on success.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.load().await
    }

    async fn load(&self) -> Result<(), SyncError> {
        let tasks = self
            .shared
            .store
            .list_all()
            .await
            .map_err(|e| SyncError::remote(Operation::ListAll, e))?;

        log::debug!("loaded {} todos", tasks.len());
        self.mirror(|items| {
            *items = tasks;
            Some(ChangeKind::Loaded)
        });
        Ok(())
    }

    /// Insert `text` in the store, then place the returned record at the head
    /// of the list.
    pub async fn add(&self, text: &str) -> Result<Task, SyncError> {
        let task = self
            .shared
            .store
            .insert_one(text)
            .await
            .map_err(|e| SyncError::remote(Operation::InsertOne, e))?;

        let added = task.clone();
        self.mirror(move |items| {
            let before = items.len();
            items.retain(|t| t.id != task.id);
            if items.len() != before {
                log::warn!("store returned id {} already in the list; replacing it", task.id);
            }
            let id = task.id.clone();
            items.insert(0, task);
            Some(ChangeKind::Added(id))
        });
        Ok(added)
    }

    /// Delete `id` in the store, then drop it from the list.
    pub async fn delete(&self, id: &TaskId) -> Result<(), SyncError> {
        self.shared
            .store
            .delete_by_id(id)
            .await
            .map_err(|e| SyncError::remote(Operation::DeleteById, e))?;

        self.mirror(|items| {
            let before = items.len();
            items.retain(|t| &t.id != id);
            (items.len() != before).then(|| ChangeKind::Removed(id.clone()))
        });
        Ok(())
    }

    /// Write `fields` to `id` in the store, then merge them into the matching
    /// item without moving it.
    pub async fn update(&self, id: &TaskId, fields: TaskPatch) -> Result<(), SyncError> {
        self.shared
            .store
            .update_by_id(id, &fields)
            .await
            .map_err(|e| SyncError::remote(Operation::UpdateById, e))?;

        self.mirror(|items| {
            let item = items.iter_mut().find(|t| &t.id == id)?;
            fields.apply_to(item);
            Some(ChangeKind::Updated(id.clone()))
        });
        Ok(())
    }

    /// Subscribe to changes applied from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ListChange> {
        self.shared.change_tx.subscribe()
    }

    /// Apply a confirmed change to the local list and announce it.
    ///
    /// `change` returns `None` when it left the list as it was (an id the
    /// store acknowledged but the list does not hold); the version stays put
    /// and nothing is announced.
    fn mirror(&self, change: impl FnOnce(&mut Vec<Task>) -> Option<ChangeKind>) {
        let notification = {
            let mut state = self.shared.state.write().unwrap();
            let Some(kind) = change(&mut state.items) else {
                return;
            };
            state.version += 1;
            ListChange {
                version: state.version,
                kind,
            }
        };
        // No receivers is fine.
        let _ = self.shared.change_tx.send(notification);
    }
}

impl<S> TodoList<S> {
    /// Current items, newest first.
    pub fn items(&self) -> Vec<Task> {
        self.shared.state.read().unwrap().items.clone()
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.shared
            .state
            .read()
            .unwrap()
            .items
            .iter()
            .find(|t| &t.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.state.read().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of mirror steps that changed the list so far.
    pub fn version(&self) -> u64 {
        self.shared.state.read().unwrap().version
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.shared.state.read().unwrap();
        Snapshot {
            version: state.version,
            items: state.items.clone(),
        }
    }

    /// Run `f` against the current items without cloning them.
    ///
    /// The list stays read-locked while `f` runs, so `f` must not call back
    /// into this list; a waiting writer would deadlock it.
    pub fn with_items<R>(&self, f: impl FnOnce(&[Task]) -> R) -> R {
        f(&self.shared.state.read().unwrap().items)
    }
}
