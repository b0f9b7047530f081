use thiserror::Error;

use crate::query::TripType;

/// Failures while turning a [`Request`](crate::query::Request) into bytes or a URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("value {0} does not fit in a 64-bit varint")]
    ValueTooLarge(u128),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl EncodeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures while reading a blob or URL back into a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("message truncated: needed {needed} more byte(s) at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("varint at offset {0} is longer than 10 bytes or exceeds 64 bits")]
    Overflow(usize),

    #[error("invalid base64 in tfs parameter: {0}")]
    InvalidBase64(String),

    #[error("malformed date \"{0}\" (expected YYYY-MM-DD)")]
    MalformedDate(String),

    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("trip type {trip} expects {expected} leg(s), found {found}")]
    InconsistentLegCount {
        trip: TripType,
        expected: &'static str,
        found: usize,
    },

    #[error("invalid field tag {0}")]
    InvalidTag(u64),

    #[error("unsupported wire type {wire_type} for field {field}")]
    UnsupportedWireType { field: u32, wire_type: u8 },

    #[error("field {field} has wire type {found}, expected {expected}")]
    WireTypeMismatch {
        field: &'static str,
        expected: u8,
        found: u8,
    },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Failures while translating a SerpApi-style parameter dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompatError {
    #[error("parameters must be a JSON object")]
    NotAnObject,

    #[error("missing required parameter \"{0}\"")]
    MissingKey(&'static str),

    #[error("parameter \"{key}\" must be {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },

    #[error("parameter \"{key}\" has unsupported value {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}
