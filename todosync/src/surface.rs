//! The UI boundary.
//!
//! A UI drives the list through [`TodoHandlers`]: one input callback
//! (`on_add`) and three item callbacks (`on_delete`, `on_toggle`, `on_edit`).
//! Handlers never return errors. A failed operation is reported once to a
//! [`Diagnostics`] sink and the list is left as it was.

use std::sync::Arc;

use crate::controller::TodoList;
use crate::error::SyncError;
use crate::store::RemoteStore;
use crate::task::{Task, TaskId, TaskPatch};

/// Something that can show the current list.
pub trait RenderSurface {
    fn render(&self, items: &[Task]);
}

/// Where failed operations are reported.
pub trait Diagnostics: Send + Sync {
    fn report(&self, error: &SyncError);
}

/// Reports failures through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, error: &SyncError) {
        log::error!("{error}");
    }
}

/// Callbacks a UI wires its input and list widgets to.
pub struct TodoHandlers<S> {
    list: TodoList<S>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl<S> Clone for TodoHandlers<S> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }
}

impl<S: RemoteStore> TodoHandlers<S> {
    pub fn new(list: TodoList<S>) -> Self {
        Self::with_diagnostics(list, Arc::new(LogDiagnostics))
    }

    pub fn with_diagnostics(list: TodoList<S>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { list, diagnostics }
    }

    pub fn list(&self) -> &TodoList<S> {
        &self.list
    }

    /// Activate the list. Returns whether the initial load succeeded.
    pub async fn on_mount(&self) -> bool {
        let result = self.list.initialize().await;
        self.settle(result)
    }

    /// Submit new task text. Blank input never reaches the store.
    pub async fn on_add(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            log::debug!("ignoring blank todo input");
            return false;
        }
        let result = self.list.add(text).await.map(|_| ());
        self.settle(result)
    }

    pub async fn on_delete(&self, id: &TaskId) -> bool {
        let result = self.list.delete(id).await;
        self.settle(result)
    }

    /// Set the completion flag of `id`.
    pub async fn on_toggle(&self, id: &TaskId, completed: bool) -> bool {
        let result = self.list.update(id, TaskPatch::completed(completed)).await;
        self.settle(result)
    }

    /// Replace the text of `id`.
    pub async fn on_edit(&self, id: &TaskId, text: &str) -> bool {
        let result = self.list.update(id, TaskPatch::text(text)).await;
        self.settle(result)
    }

    /// Render a copy of the current items. `surface` may read the list again.
    pub fn render_to(&self, surface: &dyn RenderSurface) {
        let items = self.list.items();
        surface.render(&items);
    }

    fn settle(&self, result: Result<(), SyncError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                self.diagnostics.report(&e);
                false
            }
        }
    }
}
