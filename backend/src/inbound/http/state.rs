//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AuthService, DeviceService, UserService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn AuthService>,
    pub users: Arc<dyn UserService>,
    pub devices: Arc<dyn DeviceService>,
}

impl HttpState {
    /// Bundle the driving ports.
    pub fn new(
        auth: Arc<dyn AuthService>,
        users: Arc<dyn UserService>,
        devices: Arc<dyn DeviceService>,
    ) -> Self {
        Self {
            auth,
            users,
            devices,
        }
    }
}
