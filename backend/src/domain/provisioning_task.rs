//! Tracked asynchronous provisioning work.
//!
//! Script runs that do not block the request are recorded here so a client
//! can poll for the outcome instead of the failure being lost.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeviceId, Hostname};

/// Provisioning script to run for a hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptAction {
    /// Stage the PXE boot directory structure.
    AddDevice,
    /// Remove the on-disk boot and deploy directories.
    DeleteDevice,
    /// Stage a fresh deployment image.
    DeployDevice,
}

impl ScriptAction {
    /// Script base name, without extension.
    pub const fn script_name(self) -> &'static str {
        match self {
            Self::AddDevice => "add-device",
            Self::DeleteDevice => "delete-device",
            Self::DeployDevice => "deploy-device",
        }
    }
}

impl fmt::Display for ScriptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

/// Identifier of a tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a tracked task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum TaskStatus {
    Pending,
    Succeeded,
    Failed { reason: String },
}

impl TaskStatus {
    /// Whether the task has reached a final state.
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Record of one asynchronous script run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningTask {
    pub id: TaskId,
    pub action: ScriptAction,
    pub device: DeviceId,
    pub hostname: Hostname,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProvisioningTask {
    /// Start a pending task.
    pub fn pending(
        action: ScriptAction,
        device: DeviceId,
        hostname: Hostname,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::random(),
            action,
            device,
            hostname,
            status: TaskStatus::Pending,
            created_at: now,
            finished_at: None,
        }
    }
}
