use std::string::FromUtf8Error;

use strum_macros::{Display, EnumIter, EnumString};

/// Names of the [`crate::LightState`] attributes, as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Power,
    Duration,
    Brightness,
    Color,
    Kelvin,
}

impl Field {
    /// Human readable description of the accepted values.
    pub fn domain(&self) -> &'static str {
        match self {
            Field::Power => "a boolean",
            Field::Duration => "an integer between 0 and 3600",
            Field::Brightness => "an integer between 0 and 100",
            Field::Color => "an array of 3 integers between 0 and 255",
            Field::Kelvin => "an integer between 2500 and 9000",
        }
    }
}

/// A light state attribute was given a value outside its domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("light {field} must be {domain}, got {value}")]
pub struct ValidationError {
    pub field: Field,
    pub value: String,
    pub domain: &'static str,
}

impl ValidationError {
    pub fn new(field: Field, value: impl std::fmt::Display) -> Self {
        ValidationError {
            field,
            value: value.to_string(),
            domain: field.domain(),
        }
    }
}

/// All error types that can occur when talking to lights.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A state attribute failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Attempted to apply a [`crate::LightState`] that changes nothing.
    #[error("invalid state; no attributes set")]
    NoAttribute,

    /// No registry knows a light with this name.
    #[error("light {0:?} not found")]
    LightNotFound(String),

    /// A network socket operation failed while communicating with a light.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// The device answered, but refused the command.
    #[error("device rejected {method}: {reason}")]
    Rejected { method: String, reason: String },

    /// A device reply could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// A reply from a light contained invalid UTF-8.
    #[error("utf8 decoding error: {0:?}")]
    Utf8Decode(FromUtf8Error),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a socket error for an operation that ran out of time
    pub fn timed_out(action: &str) -> Self {
        Error::socket(
            action,
            std::io::Error::new(std::io::ErrorKind::TimedOut, format!("{action} timeout")),
        )
    }

    /// Create a new rejected command error
    pub fn rejected(method: &str, reason: impl std::fmt::Display) -> Self {
        Error::Rejected {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_field_names_its_domain() {
        for field in Field::iter() {
            assert_eq!(Field::from_str(&field.to_string()).unwrap(), field);
            let err = ValidationError::new(field, "x");
            assert_eq!(
                err.to_string(),
                format!("light {} must be {}, got x", field, field.domain())
            );
        }
        assert_eq!(Field::iter().count(), 5);
    }
}
