//! Device data model.
//!
//! A device is identified by the physical switch port it is wired to. Its
//! lifecycle state is derived from the stored fields rather than kept in a
//! separate column.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::UserId;

/// Maximum hostname length accepted for a device.
pub const HOSTNAME_MAX: usize = 253;

/// Maximum length of a single dot-separated hostname label.
pub const HOSTNAME_LABEL_MAX: usize = 63;

/// Validation errors for device fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceValidationError {
    #[error("device id must be a positive port number")]
    InvalidId,
    #[error("hostname must not be empty")]
    EmptyHostname,
    #[error("hostname must be at most {max} characters")]
    HostnameTooLong { max: usize },
    #[error("hostname may only contain letters, digits, dots, or hyphens")]
    HostnameInvalidCharacters,
    #[error("hostname labels must be 1 to {max} characters and not start or end with a hyphen")]
    HostnameInvalidLabel { max: usize },
}

/// Device identifier; equal to its switch port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct DeviceId(i32);

impl DeviceId {
    /// Validate and construct a [`DeviceId`].
    pub fn new(port: i32) -> Result<Self, DeviceValidationError> {
        if port <= 0 {
            return Err(DeviceValidationError::InvalidId);
        }
        Ok(Self(port))
    }

    /// Switch port number.
    pub const fn port(self) -> i32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DeviceId> for i32 {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

impl TryFrom<i32> for DeviceId {
    type Error = DeviceValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Network hostname of a device. Passed verbatim to provisioning scripts, so
/// the accepted alphabet is restricted and every dot-separated label must be
/// a non-empty RFC 1123 label (no `.` or `..` path components).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hostname(String);

impl Hostname {
    /// Validate and construct a [`Hostname`].
    pub fn new(hostname: impl Into<String>) -> Result<Self, DeviceValidationError> {
        let hostname = hostname.into();
        if hostname.is_empty() {
            return Err(DeviceValidationError::EmptyHostname);
        }
        if hostname.len() > HOSTNAME_MAX {
            return Err(DeviceValidationError::HostnameTooLong { max: HOSTNAME_MAX });
        }
        let valid = hostname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !valid {
            return Err(DeviceValidationError::HostnameInvalidCharacters);
        }
        if !hostname.split('.').all(is_valid_label) {
            return Err(DeviceValidationError::HostnameInvalidLabel {
                max: HOSTNAME_LABEL_MAX,
            });
        }
        Ok(Self(hostname))
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= HOSTNAME_LABEL_MAX
        && !label.starts_with('-')
        && !label.ends_with('-')
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Hostname> for String {
    fn from(value: Hostname) -> Self {
        value.0
    }
}

impl TryFrom<String> for Hostname {
    type Error = DeviceValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Ownership state of a registered device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Unowned,
    Owned(UserId),
}

/// Power sub-state, orthogonal to ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off,
    On,
}

impl PowerState {
    /// Stored flag value for this state.
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// A registered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    pub hostname: Hostname,
    pub is_turn_on: bool,
    pub owner: Option<UserId>,
}

impl Device {
    /// Construct an unowned, powered-off device.
    pub fn new(id: DeviceId, hostname: Hostname) -> Self {
        Self {
            id,
            hostname,
            is_turn_on: false,
            owner: None,
        }
    }

    /// Derived ownership state.
    pub fn ownership(&self) -> Ownership {
        match self.owner {
            Some(owner) => Ownership::Owned(owner),
            None => Ownership::Unowned,
        }
    }

    /// Derived power state.
    pub fn power(&self) -> PowerState {
        if self.is_turn_on {
            PowerState::On
        } else {
            PowerState::Off
        }
    }
}
