//! Error taxonomy for schema enforcement
//!
//! Construction-time violations (malformed schema definitions) fail fast:
//! a malformed schema is a programmer error, not a recoverable condition.
//! `validate` reports data-shape violations through its return value so
//! callers can inspect them without unwinding; `normalise` propagates them
//! with `?` since a partially-invalid mutated record must not be returned.
//!
//! Error codes:
//! - TE_INVALID_ARGUMENT
//! - TE_INVALID_SCHEMA
//! - TE_MISSING_TYPE_DESCRIPTOR
//! - TE_INVALID_TYPE_DESCRIPTOR
//! - TE_UNKNOWN_ORDER
//! - TE_MISSING_FIELDS
//! - TE_REDUNDANT_FIELDS
//! - TE_INVALID_VALUE

use std::fmt;

use thiserror::Error;

/// Result type for enforcement operations.
pub type EnforceResult<T> = Result<T, EnforceError>;

/// Stable string codes, one per [`EnforceError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidArgument,
    InvalidSchema,
    MissingTypeDescriptor,
    InvalidTypeDescriptor,
    UnknownOrder,
    MissingFields,
    RedundantFields,
    InvalidValue,
}

impl ErrorCode {
    /// Returns the stable string code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "TE_INVALID_ARGUMENT",
            ErrorCode::InvalidSchema => "TE_INVALID_SCHEMA",
            ErrorCode::MissingTypeDescriptor => "TE_MISSING_TYPE_DESCRIPTOR",
            ErrorCode::InvalidTypeDescriptor => "TE_INVALID_TYPE_DESCRIPTOR",
            ErrorCode::UnknownOrder => "TE_UNKNOWN_ORDER",
            ErrorCode::MissingFields => "TE_MISSING_FIELDS",
            ErrorCode::RedundantFields => "TE_REDUNDANT_FIELDS",
            ErrorCode::InvalidValue => "TE_INVALID_VALUE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Schema enforcement errors with full context.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EnforceError {
    /// A caller-supplied argument had an unusable shape.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// An order's definition is not a mapping of field names to descriptors.
    #[error("Invalid schema for order '{order}': expected a mapping of field names to type descriptors")]
    InvalidSchema { order: String },

    /// A field declared no type descriptor at all.
    #[error("Missing type descriptor for field '{field}' in order '{order}'")]
    MissingTypeDescriptor { order: String, field: String },

    /// A field's descriptor does not resolve to a usable constructor.
    #[error("Invalid type descriptor for field '{field}' in order '{order}': {reason}")]
    InvalidTypeDescriptor {
        order: String,
        field: String,
        reason: String,
    },

    /// The order name is not registered.
    #[error("Unknown order '{order}'")]
    UnknownOrder { order: String },

    /// Declared fields absent from the record.
    #[error("Missing fields '{}' in order '{}'", .fields.join(", "), .order)]
    MissingFields { order: String, fields: Vec<String> },

    /// Record keys not declared by the order.
    #[error("Redundant fields '{}' in order '{}'", .fields.join(", "), .order)]
    RedundantFields { order: String, fields: Vec<String> },

    /// A present field's value does not match its declared type.
    #[error("Invalid value '{field}' in order '{order}'. Expected {expected}")]
    InvalidValue {
        order: String,
        field: String,
        expected: String,
    },
}

impl EnforceError {
    /// Create an invalid argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create an invalid schema error.
    pub fn invalid_schema(order: impl Into<String>) -> Self {
        Self::InvalidSchema {
            order: order.into(),
        }
    }

    /// Create a missing type descriptor error.
    pub fn missing_type_descriptor(order: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingTypeDescriptor {
            order: order.into(),
            field: field.into(),
        }
    }

    /// Create an invalid type descriptor error.
    pub fn invalid_type_descriptor(
        order: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTypeDescriptor {
            order: order.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown order error.
    pub fn unknown_order(order: impl Into<String>) -> Self {
        Self::UnknownOrder {
            order: order.into(),
        }
    }

    /// Create a missing fields error.
    pub fn missing_fields(order: impl Into<String>, fields: Vec<String>) -> Self {
        Self::MissingFields {
            order: order.into(),
            fields,
        }
    }

    /// Create a redundant fields error.
    pub fn redundant_fields(order: impl Into<String>, fields: Vec<String>) -> Self {
        Self::RedundantFields {
            order: order.into(),
            fields,
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(
        order: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            order: order.into(),
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Returns the stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EnforceError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            EnforceError::InvalidSchema { .. } => ErrorCode::InvalidSchema,
            EnforceError::MissingTypeDescriptor { .. } => ErrorCode::MissingTypeDescriptor,
            EnforceError::InvalidTypeDescriptor { .. } => ErrorCode::InvalidTypeDescriptor,
            EnforceError::UnknownOrder { .. } => ErrorCode::UnknownOrder,
            EnforceError::MissingFields { .. } => ErrorCode::MissingFields,
            EnforceError::RedundantFields { .. } => ErrorCode::RedundantFields,
            EnforceError::InvalidValue { .. } => ErrorCode::InvalidValue,
        }
    }
}
