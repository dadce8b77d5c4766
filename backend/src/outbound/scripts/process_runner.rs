//! Script runner spawning `<scripts_dir>/<action>.sh <hostname>` via `sh`.
//!
//! The hostname is passed as a single argument and never interpolated into a
//! shell command line. A run that outlives the configured timeout is killed.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::ports::{ScriptError, ScriptRunner};
use crate::domain::{Hostname, ScriptAction};

const OUTPUT_PREVIEW_LIMIT: usize = 240;

/// Runs provisioning scripts from a fixed directory.
pub struct ProcessScriptRunner {
    scripts_dir: PathBuf,
    timeout: Duration,
}

impl ProcessScriptRunner {
    /// Create a runner for scripts in `scripts_dir`, each bounded by `timeout`.
    pub fn new(scripts_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            timeout,
        }
    }

    /// Directory scripts are resolved against.
    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    fn locate(&self, action: ScriptAction) -> Result<PathBuf, ScriptError> {
        let file_name = format!("{}.sh", action.script_name());
        let dir = Dir::open_ambient_dir(&self.scripts_dir, ambient_authority()).map_err(|err| {
            ScriptError::spawn(format!(
                "cannot open scripts directory {}: {err}",
                self.scripts_dir.display()
            ))
        })?;
        let metadata = dir
            .metadata(&file_name)
            .map_err(|err| ScriptError::spawn(format!("{file_name}: {err}")))?;
        if !metadata.is_file() {
            return Err(ScriptError::spawn(format!("{file_name} is not a file")));
        }
        Ok(self.scripts_dir.join(file_name))
    }
}

#[async_trait]
impl ScriptRunner for ProcessScriptRunner {
    async fn run(&self, action: ScriptAction, hostname: &Hostname) -> Result<(), ScriptError> {
        let script = self.locate(action)?;
        debug!(script = %script.display(), %hostname, "running provisioning script");

        let child = Command::new("sh")
            .arg(&script)
            .arg(hostname.as_ref())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ScriptError::spawn(err.to_string()))?;

        // Dropping the pending wait drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ScriptError::timeout(self.timeout.as_secs()))?
            .map_err(|err| ScriptError::spawn(err.to_string()))?;

        if output.status.success() {
            debug!(%action, %hostname, stdout = %preview(&output.stdout), "script succeeded");
            return Ok(());
        }
        warn!(
            %action,
            %hostname,
            status = %output.status,
            stderr = %preview(&output.stderr),
            "script failed"
        );
        Err(ScriptError::exit(output.status.to_string()))
    }
}

fn preview(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.chars().count() > OUTPUT_PREVIEW_LIMIT {
        let head: String = trimmed.chars().take(OUTPUT_PREVIEW_LIMIT).collect();
        format!("{head}...")
    } else {
        trimmed.to_owned()
    }
}
