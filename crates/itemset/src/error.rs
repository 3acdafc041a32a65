use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error surface for the query-set engine.
///
/// Validation errors are raised synchronously at chaining time, before any
/// remote call; remote failures surface only at first cache fill.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("unknown field name '{field}' in {origin}()")]
    InvalidField { field: String, origin: CallSite },

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error("expected exactly one item, found 0")]
    NotFound,

    #[error("expected exactly one item, found {count}")]
    NotUnique { count: usize },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl Error {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

///
/// CallSite
///
/// Chaining call that originated a validation failure, so error messages
/// name the offending call.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallSite {
    Filter,
    Exclude,
    Only,
    OrderBy,
    Values,
    ValuesList,
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Filter => "filter",
            Self::Exclude => "exclude",
            Self::Only => "only",
            Self::OrderBy => "order_by",
            Self::Values => "values",
            Self::ValuesList => "values_list",
        };
        write!(f, "{label}")
    }
}

///
/// ArgumentError
///
/// Shape and arity violations, raised at chaining time.
///

#[derive(Debug, ThisError)]
pub enum ArgumentError {
    #[error("reverse() only makes sense when order_by fields are set")]
    ReverseWithoutOrder,

    #[error("{origin}() requires at least one field name")]
    RequiresFields { origin: CallSite },

    #[error("values_list_flat() requires exactly one field name, found {found}")]
    FlatRequiresOneField { found: usize },
}

///
/// RemoteError
///
/// Opaque failure from a remote collaborator. Propagated unchanged; the
/// engine performs no retry and does not suppress it.
///

#[derive(Debug, ThisError)]
#[error("remote service failure: {message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_names_originating_call() {
        let err = Error::InvalidField {
            field: "subjekt".into(),
            origin: CallSite::OrderBy,
        };
        assert_eq!(err.to_string(), "unknown field name 'subjekt' in order_by()");
    }

    #[test]
    fn flat_arity_message_carries_found_count() {
        let err = Error::from(ArgumentError::FlatRequiresOneField { found: 2 });
        assert_eq!(
            err.to_string(),
            "values_list_flat() requires exactly one field name, found 2"
        );
    }

    #[test]
    fn remote_failure_is_transparent() {
        let err = Error::from(RemoteError::new("service unavailable"));
        assert_eq!(err.to_string(), "remote service failure: service unavailable");
    }
}
