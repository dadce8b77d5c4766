//! HTTP server configuration object.

use std::net::SocketAddr;

use actix_web::web;
use rubus_api::inbound::http::state::HttpState;

/// Everything the HTTP server needs once adapters are wired.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) http_state: web::Data<HttpState>,
}

impl ServerConfig {
    /// Bundle the bind address with the handler state.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, http_state: web::Data<HttpState>) -> Self {
        Self {
            bind_addr,
            http_state,
        }
    }
}
