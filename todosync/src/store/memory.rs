//! In-process store.
//!
//! Keeps records in a `Vec` behind a mutex and lets callers inject failures
//! per operation, which makes it the natural test double for the controller.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{validate_text, Operation, RemoteStore, StoreError};
use crate::task::{CreationClock, Task, TaskId, TaskPatch};

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    next_id: u64,
    clock: CreationClock,
    fail_next: HashSet<Operation>,
    fail_always: HashSet<Operation>,
    calls: HashMap<Operation, usize>,
}

impl Inner {
    /// Count the call and decide whether it should fail.
    fn enter(&mut self, op: Operation) -> Result<(), StoreError> {
        *self.calls.entry(op).or_default() += 1;
        if self.fail_next.remove(&op) || self.fail_always.contains(&op) {
            log::debug!("memory store: injected failure for {op}");
            return Err(StoreError::Unavailable(format!("injected {op} failure")));
        }
        Ok(())
    }

    fn sorted(&self) -> Vec<Task> {
        let mut tasks = self.tasks.clone();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }
}

/// A [`RemoteStore`] that lives entirely in memory.
///
/// Ids are assigned from a counter starting at `"1"`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records. New ids continue after the
    /// largest numeric id seen and new timestamps after the latest one.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks
            .iter()
            .filter_map(|t| t.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let mut clock = CreationClock::default();
        if let Some(latest) = tasks.iter().map(|t| t.created_at).max() {
            clock.advance_past(latest);
        }
        Self {
            inner: Mutex::new(Inner {
                tasks,
                next_id,
                clock,
                ..Default::default()
            }),
        }
    }

    /// Make the next call of `op` fail.
    pub fn fail_next(&self, op: Operation) {
        self.inner.lock().unwrap().fail_next.insert(op);
    }

    /// Make every call of `op` fail until [`recover`](Self::recover) is called.
    pub fn fail_always(&self, op: Operation) {
        self.inner.lock().unwrap().fail_always.insert(op);
    }

    /// Clear any injected failure for `op`.
    pub fn recover(&self, op: Operation) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next.remove(&op);
        inner.fail_always.remove(&op);
    }

    /// Number of calls made to `op`, failed ones included.
    pub fn calls(&self, op: Operation) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    /// Current contents, newest first.
    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().unwrap().sorted()
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Task>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(Operation::ListAll)?;
        Ok(inner.sorted())
    }

    async fn insert_one(&self, task: &str) -> Result<Task, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(Operation::InsertOne)?;
        validate_text(task)?;

        let created_at = inner.clock.next()?;
        inner.next_id += 1;
        let record = Task {
            id: TaskId::new(inner.next_id.to_string()),
            task: task.to_string(),
            completed: false,
            created_at,
        };
        inner.tasks.push(record.clone());
        Ok(record)
    }

    async fn delete_by_id(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(Operation::DeleteById)?;
        inner.tasks.retain(|t| &t.id != id);
        Ok(())
    }

    async fn update_by_id(&self, id: &TaskId, fields: &TaskPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(Operation::UpdateById)?;
        for task in inner.tasks.iter_mut().filter(|t| &t.id == id) {
            fields.apply_to(task);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_ids_and_newest_first() {
        let store = MemoryStore::new();
        let a = store.insert_one("first").await.unwrap();
        let b = store.insert_one("second").await.unwrap();

        assert_eq!(a.id.as_str(), "1");
        assert_eq!(b.id.as_str(), "2");
        assert!(!a.completed);
        assert!(b.created_at > a.created_at);

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed, vec![b, a]);
    }

    #[tokio::test]
    async fn test_insert_rejects_blank_text() {
        let store = MemoryStore::new();
        let err = store.insert_one("   ").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_seeded_store_continues_ids() {
        let seed = Task {
            id: TaskId::new("7"),
            task: "seeded".into(),
            completed: true,
            created_at: i64::MAX / 2,
        };
        let store = MemoryStore::with_tasks(vec![seed.clone()]);
        let added = store.insert_one("next").await.unwrap();
        assert_eq!(added.id.as_str(), "8");
        assert!(added.created_at > seed.created_at);
    }

    #[tokio::test]
    async fn test_insert_after_max_timestamp_fails_cleanly() {
        let seed = Task {
            id: TaskId::new("1"),
            task: "from the far future".into(),
            completed: false,
            created_at: i64::MAX,
        };
        let store = MemoryStore::with_tasks(vec![seed.clone()]);

        for _ in 0..2 {
            let err = store.insert_one("next").await.unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)));
        }
        assert_eq!(store.tasks(), vec![seed]);
        assert!(store.delete_by_id(&TaskId::new("1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_next_only_fails_once() {
        let store = MemoryStore::new();
        store.fail_next(Operation::InsertOne);

        assert!(matches!(
            store.insert_one("x").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.insert_one("x").await.is_ok());
        assert_eq!(store.calls(Operation::InsertOne), 2);
    }

    #[tokio::test]
    async fn test_fail_always_until_recovered() {
        let store = MemoryStore::new();
        store.fail_always(Operation::ListAll);
        assert!(store.list_all().await.is_err());
        assert!(store.list_all().await.is_err());

        store.recover(Operation::ListAll);
        assert!(store.list_all().await.is_ok());
        assert_eq!(store.calls(Operation::ListAll), 3);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_acknowledged() {
        let store = MemoryStore::new();
        let missing = TaskId::new("404");
        assert!(store.delete_by_id(&missing).await.is_ok());
        assert!(
            store
                .update_by_id(&missing, &TaskPatch::completed(true))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let a = store.insert_one("a").await.unwrap();
        let b = store.insert_one("b").await.unwrap();

        store
            .update_by_id(&a.id, &TaskPatch::completed(true))
            .await
            .unwrap();
        store.delete_by_id(&b.id).await.unwrap();

        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, a.id);
        assert!(tasks[0].completed);
    }
}
