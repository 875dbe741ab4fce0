//! Task records and the field sets used to create and patch them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Store-assigned identifier of a task record.
///
/// Opaque to the controller: it is only ever compared for equality and handed
/// back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A single to-do item as held by the remote store.
///
/// `id` and `created_at` are assigned by the store on insertion and never
/// change afterwards. `created_at` is in Unix epoch microseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub task: String,
    pub completed: bool,
    pub created_at: i64,
}

/// Partial field set for an update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Patch that only changes the text.
    pub fn text(task: impl Into<String>) -> Self {
        Self {
            task: Some(task.into()),
            completed: None,
        }
    }

    /// Patch that only changes the completion flag.
    pub fn completed(completed: bool) -> Self {
        Self {
            task: None,
            completed: Some(completed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.task.is_none() && self.completed.is_none()
    }

    /// Merge the set fields into `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(text) = &self.task {
            task.task = text.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// Hands out strictly increasing creation timestamps.
///
/// Wall-clock time is used while it moves forward; if it stalls or steps back
/// the previous value plus one is used instead, so a freshly inserted record
/// always sorts ahead of every earlier one. Once the last timestamp is
/// `i64::MAX` no later one exists and `next` fails.
#[derive(Debug, Default)]
pub(crate) struct CreationClock {
    last: i64,
}

impl CreationClock {
    pub(crate) fn next(&mut self) -> Result<i64, StoreError> {
        let floor = self.last.checked_add(1).ok_or_else(|| {
            StoreError::Validation("creation timestamp exhausted".into())
        })?;
        let next = now_micros().max(floor);
        self.last = next;
        Ok(next)
    }

    /// Ensure every later timestamp is greater than `created_at`.
    pub(crate) fn advance_past(&mut self, created_at: i64) {
        self.last = self.last.max(created_at);
    }
}

fn now_micros() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or_default()
}
