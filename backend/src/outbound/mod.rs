//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **provider**: HTTP client for the PoE switch provider
//! - **scripts**: process runner for provisioning scripts
//! - **security**: bcrypt password hashing and JWT session tokens
//! - **tasks**: in-process registry of background provisioning runs
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod persistence;
pub mod provider;
pub mod scripts;
pub mod security;
pub mod tasks;
