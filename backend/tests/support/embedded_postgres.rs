//! Embedded PostgreSQL bootstrap for the Diesel adapter suites.
//!
//! Each test gets a fresh temporary database on the shared cluster with the
//! embedded migrations applied. Set `SKIP_TEST_CLUSTER=1` to skip the suites
//! where the cluster cannot start; otherwise setup failures fail the test.

use std::fmt::Display;
use std::time::Duration;

use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use rubus_api::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use tokio::runtime::Runtime;

const SHARED_CLUSTER_RETRIES: usize = 5;
const SHARED_CLUSTER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// A migrated temporary database plus a runtime to drive the async adapters.
pub struct TestDatabase {
    pub pool: DbPool,
    pub runtime: Runtime,
    _database: TemporaryDatabase,
}

/// Returns true when `SKIP_TEST_CLUSTER` is set to a truthy value.
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip with a marker when allowed, otherwise fail loudly.
pub fn handle_cluster_setup_failure<T>(reason: impl Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt < SHARED_CLUSTER_RETRIES => {
                eprintln!("pg-embed: attempt {attempt} failed, retrying: {error:?}");
                std::thread::sleep(SHARED_CLUSTER_RETRY_DELAY);
                attempt += 1;
            }
            Err(error) => return Err(format!("{error:?}")),
        }
    }
}

fn provision() -> Result<TestDatabase, String> {
    let cluster = shared_cluster()?;
    let database = cluster
        .temporary_database(format!("test_{}", uuid::Uuid::new_v4()))
        .map_err(|error| format!("create temporary database: {error:?}"))?;
    let runtime = Runtime::new().map_err(|error| format!("tokio runtime: {error}"))?;
    let url = database.url().to_owned();

    runtime
        .block_on(run_migrations(&url))
        .map_err(|error| error.to_string())?;
    let pool = runtime
        .block_on(DbPool::new(PoolConfig::new(url).with_max_size(4)))
        .map_err(|error| error.to_string())?;

    Ok(TestDatabase {
        pool,
        runtime,
        _database: database,
    })
}

/// Provision a migrated database, or `None` when the cluster is skipped.
pub fn test_database() -> Option<TestDatabase> {
    match provision() {
        Ok(database) => Some(database),
        Err(error) => handle_cluster_setup_failure(error),
    }
}
