//! Power-control provider adapters.
//!
//! This module provides a thin HTTP implementation of the `PowerControl`
//! port against the PoE switch provider service.

mod dto;
mod http_power_control;

pub use http_power_control::HttpPowerControl;
