use std::sync::Arc;

use parking_lot::Mutex;

use crate::tasks::Task;

/// Shared, append-only list of a controller's tasks.
///
/// Renderers get a clone at creation time and read it whenever they draw;
/// tasks added during the run show up in later snapshots.
#[derive(Clone, Default)]
pub struct TaskView {
    tasks: Arc<Mutex<Vec<Arc<Task>>>>,
}

impl TaskView {
    /// Current tasks, in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<Task>> {
        self.tasks.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Arc<Task>> {
        self.tasks.lock().get(index).cloned()
    }

    pub(crate) fn push(&self, task: Arc<Task>) {
        self.tasks.lock().push(task);
    }
}

impl std::fmt::Debug for TaskView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.snapshot().iter()).finish()
    }
}
