//! Error types for sift_filter

use thiserror::Error;

use crate::field::FieldType;

/// Errors raised by the filter engine
///
/// Unknown ids on mutating calls are not errors: the model ignores them.
/// Everything here is a wiring mistake between a widget and the field it
/// was bound to.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Accessor called with an id the filter never declared
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// Two descriptors in one declaration share an id
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),

    /// Accessor presupposes metadata this field does not carry
    #[error("field `{id}` ({field_type}) has no {what}")]
    NotApplicable {
        id: String,
        field_type: FieldType,
        what: &'static str,
    },

    /// Handler factory bound to a field of another type
    #[error("handler for {expected} fields bound to `{id}`, which is a {actual} field")]
    HandlerMismatch {
        id: String,
        expected: FieldType,
        actual: FieldType,
    },

    /// Time components outside the 12-hour clock
    #[error("invalid time {hours}:{minutes:02}:{seconds:02}")]
    InvalidTime { hours: u32, minutes: u32, seconds: u32 },

    #[error("`{0}` is neither AM nor PM")]
    InvalidPeriod(String),

    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    #[error("unknown field type `{0}`")]
    UnknownFieldType(String),
}

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;
