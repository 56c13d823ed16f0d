//! Error types for evaluation, member access and source generation.

use std::error::Error as StdError;

pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while evaluating or assigning through an expression tree.
#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    /// Navigation step attempted on a null source.
    #[error("source is null for {operation}(null, \"{name}\")")]
    NullSource {
        operation: &'static str,
        name: String,
    },

    /// The target has no member with the requested name.
    #[error("no member '{name}' on {target}")]
    NoSuchMember { target: String, name: String },

    /// The member exists but neither the policy nor the host made it accessible.
    #[error("member '{member}' of {class} is not accessible")]
    Inaccessible { class: String, member: String },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("type error: {0}")]
    TypeError(String),

    #[error("method '{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("expression is not assignable: {0}")]
    NotAssignable(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    /// Failure reported by a host accessor or method.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EvalError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    pub fn no_such_member(target: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NoSuchMember {
            target: target.into(),
            name: name.into(),
        }
    }

    pub fn null_source(operation: &'static str, name: impl Into<String>) -> Self {
        Self::NullSource {
            operation,
            name: name.into(),
        }
    }

    /// Wraps an arbitrary host failure.
    pub fn host<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Other(anyhow::Error::new(err))
    }
}

/// Contract violations on the elevation protocol.
///
/// These indicate a caller bug (a token that `setup` could not have
/// produced, or a release without a matching grant), not a runtime
/// condition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error(
        "improper restore state [true] for target [{target}], member [{member}], propertyName [{property}]"
    )]
    ImproperRestore {
        target: String,
        member: String,
        property: String,
    },

    #[error("restore of member [{member}] without a matching elevation")]
    Unbalanced { member: String },
}

/// Failure while generating a source fragment.
///
/// Every cause is flattened into this one kind; the original error stays
/// reachable through [`std::error::Error::source`].
#[derive(thiserror::Error, Debug)]
#[error("cannot generate source for `{expression}`: {source}")]
pub struct GenerationError {
    pub expression: String,
    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

impl GenerationError {
    pub fn new<E>(expression: impl Into<String>, cause: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self {
            expression: expression.into(),
            source: cause.into(),
        }
    }
}
