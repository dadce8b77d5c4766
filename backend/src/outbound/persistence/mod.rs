//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the user and device
//! repository ports backed by PostgreSQL via Diesel with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. Access rules live in the domain services.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leak to the domain layer.
//! - **Strongly typed errors**: Database failures are mapped to the
//!   persistence error enums declared next to each port.
//!
//! # Example
//!
//! ```ignore
//! use rubus_api::outbound::persistence::{DbPool, PoolConfig, DieselDeviceRepository};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/rubus")).await?;
//! let devices = DieselDeviceRepository::new(pool);
//! ```

mod diesel_device_repository;
mod diesel_error_mapping;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_device_repository::DieselDeviceRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
