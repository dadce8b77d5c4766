//! Port recording the outcome of asynchronous provisioning tasks.

use chrono::{DateTime, Utc};

use crate::domain::{ProvisioningTask, TaskId, TaskStatus};

/// Store of task records, queried by the task status endpoint.
#[cfg_attr(test, mockall::automock)]
pub trait ProvisioningTaskRegistry: Send + Sync {
    /// Record a newly started task.
    fn record(&self, task: ProvisioningTask);

    /// Mark a task finished. Unknown identifiers are ignored.
    fn complete(&self, id: TaskId, status: TaskStatus, at: DateTime<Utc>);

    /// Look a task up.
    fn find(&self, id: TaskId) -> Option<ProvisioningTask>;
}
