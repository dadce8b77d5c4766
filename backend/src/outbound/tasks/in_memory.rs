//! Process-local provisioning task registry.
//!
//! Records live only as long as the process. Finished records beyond the
//! retention limit are evicted oldest first; pending records are never
//! evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::ports::ProvisioningTaskRegistry;
use crate::domain::{ProvisioningTask, TaskId, TaskStatus};

const DEFAULT_RETAINED_FINISHED: usize = 1024;

#[derive(Default)]
struct Inner {
    tasks: HashMap<TaskId, ProvisioningTask>,
    finished: VecDeque<TaskId>,
}

/// In-memory [`ProvisioningTaskRegistry`].
pub struct InMemoryTaskRegistry {
    inner: Mutex<Inner>,
    retain_finished: usize,
}

impl Default for InMemoryTaskRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_FINISHED)
    }
}

impl InMemoryTaskRegistry {
    /// Registry keeping at most `retain_finished` finished records.
    pub fn with_retention(retain_finished: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            retain_finished: retain_finished.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProvisioningTaskRegistry for InMemoryTaskRegistry {
    fn record(&self, task: ProvisioningTask) {
        self.lock().tasks.insert(task.id, task);
    }

    fn complete(&self, id: TaskId, status: TaskStatus, at: DateTime<Utc>) {
        let mut inner = self.lock();
        let Some(task) = inner.tasks.get_mut(&id) else {
            debug!(task_id = %id, "completion for unknown task ignored");
            return;
        };
        if task.status.is_finished() {
            return;
        }
        task.status = status;
        task.finished_at = Some(at);
        inner.finished.push_back(id);

        while inner.finished.len() > self.retain_finished {
            if let Some(evicted) = inner.finished.pop_front() {
                inner.tasks.remove(&evicted);
            }
        }
    }

    fn find(&self, id: TaskId) -> Option<ProvisioningTask> {
        self.lock().tasks.get(&id).cloned()
    }
}
