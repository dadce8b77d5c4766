//! Provisioning script adapters.

mod process_runner;

pub use process_runner::ProcessScriptRunner;
