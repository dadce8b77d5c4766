//! Port for provisioning scripts that stage or remove on-disk boot files.

use async_trait::async_trait;

use crate::domain::{Hostname, ScriptAction};

use super::define_port_error;

define_port_error! {
    /// Errors raised by script runners.
    pub enum ScriptError {
        /// The script process could not be started.
        Spawn { message: String } => "script could not be started: {message}",
        /// The script exited unsuccessfully.
        Exit { status: String } => "script exited unsuccessfully: {status}",
        /// The script did not finish in time and was killed.
        Timeout { seconds: u64 } => "script timed out after {seconds}s",
    }
}

/// Runs a provisioning script with the hostname as its sole argument.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run `action` for `hostname` and wait for it to finish.
    async fn run(&self, action: ScriptAction, hostname: &Hostname) -> Result<(), ScriptError>;
}
