use serde::{Deserialize, Serialize};

/// Common ID types
pub type UserId = i64;

/// Uniform response envelope returned by every API endpoint.
///
/// Clients branch on `success`; the HTTP status is kept in line with it
/// (200 for `true`, 400/401/500 for `false`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub message: String,
    pub success: bool,
    pub data: Option<T>,
    pub errors: Option<Vec<String>>,
}

impl<T> ResultEnvelope<T> {
    /// Successful outcome carrying a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            success: true,
            data: Some(data),
            errors: None,
        }
    }

    /// Successful outcome with nothing to return (e.g. a lookup that found no match)
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
            data: None,
            errors: None,
        }
    }

    /// Successful outcome whose payload may be absent
    pub fn maybe(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            message: message.into(),
            success: true,
            data,
            errors: None,
        }
    }
}

impl ResultEnvelope<()> {
    /// Failed outcome, optionally listing field-level errors
    pub fn failure(message: impl Into<String>, errors: Option<Vec<String>>) -> Self {
        Self {
            message: message.into(),
            success: false,
            data: None,
            errors,
        }
    }
}
