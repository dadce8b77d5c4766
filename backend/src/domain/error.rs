//! Domain-level error types.
//!
//! These errors are transport agnostic. The HTTP adapter maps each code to a
//! status line and serialises the error as `{ "status": <int>, "error": <msg> }`.

use serde::{Deserialize, Serialize};

/// Stable failure category shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    BadRequest,
    /// Authentication failed, is missing, or the caller lacks access.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The request collides with existing state (duplicate key, owned device).
    Conflict,
    /// An unexpected error occurred inside the domain or a collaborator.
    InternalError,
}

impl ErrorCode {
    /// HTTP-style numeric status carried on the wire.
    ///
    /// # Examples
    /// ```
    /// use rubus_api::domain::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::Conflict.status(), 409);
    /// ```
    pub const fn status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::InternalError => 500,
        }
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` is never empty once trimmed of whitespace; blank messages are
///   replaced with a generic one for the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ErrorDto", try_from = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
}

impl Error {
    /// Create a new error for `code`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            default_message(code).to_owned()
        } else {
            message
        };
        Self { code, message }
    }

    /// Stable failure category.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Convenience constructor for [`ErrorCode::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Generic message used when a caller supplies a blank one, and as the
/// redacted wire message for internal failures.
pub fn default_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::BadRequest => "Bad Request Error",
        ErrorCode::Unauthorized => "Unauthorized",
        ErrorCode::Forbidden => "Forbidden",
        ErrorCode::NotFound => "Not Found",
        ErrorCode::Conflict => "Conflict",
        ErrorCode::InternalError => "Internal Server Error",
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

/// Wire shape of [`Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorDto {
    status: u16,
    error: String,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            status: value.code.status(),
            error: value.message,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = String;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let code = match value.status {
            400 => ErrorCode::BadRequest,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            500 => ErrorCode::InternalError,
            other => return Err(format!("unknown error status {other}")),
        };
        Ok(Self::new(code, value.error))
    }
}
