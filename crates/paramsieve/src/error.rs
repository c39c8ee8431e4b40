//! Error types for the paramsieve crate.
//!
//! Errors fall into two disjoint classes:
//!
//! - [`InvalidArgument`]: the request carried a value that cannot be turned
//!   into a predicate. These are recoverable, and a filter configured with
//!   `ignore_failure` swallows them.
//! - [`ConfigError`]: the filters themselves are wired up wrong (unknown
//!   handler, bad pattern, duplicate names). These are never swallowed.

use thiserror::Error;

/// Boxed cause of a failed type conversion.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A request-driven failure: the input could not be coerced or applied.
#[derive(Debug, Error)]
pub enum InvalidArgument {
    /// The raw value could not be converted to the target type.
    #[error("value '{value}' not coercible to '{target}'")]
    NotCoercible {
        value: String,
        target: &'static str,
        #[source]
        source: BoxError,
    },

    /// The raw value did not fully match the filter's pattern.
    #[error("value '{value}' does not match pattern '{pattern}'")]
    PatternMismatch { value: String, pattern: String },

    /// One part of a comma-separated value was malformed.
    #[error("value '{value}' is not proper CSV")]
    InvalidList {
        value: String,
        #[source]
        source: Box<InvalidArgument>,
    },

    /// Every alternative of a choice filter rejected the value.
    ///
    /// The individual rejections are kept, in alternative order, for
    /// diagnostics; the message itself only names the value.
    #[error("invalid value: '{value}'")]
    NoAlternative {
        value: String,
        rejections: Vec<InvalidArgument>,
    },

    /// The filter has neither a condition nor a handler to apply.
    #[error("both handler and condition were not found")]
    NoPredicate,

    /// The parameters handed to a filter set were not a mapping.
    #[error("invalid parameters, expected a mapping, found '{found}'")]
    NotAMapping { found: String },

    /// A parameter's values could not be read as strings.
    #[error("parameter '{name}' must be a string or a list of strings")]
    MalformedParameter { name: String },

    /// A member of a filter set failed.
    #[error("filter '{name}' rejected its argument")]
    Member {
        name: String,
        #[source]
        source: Box<InvalidArgument>,
    },

    /// A handler refused the coerced value.
    #[error("{message}")]
    Rejected { message: String },
}

impl InvalidArgument {
    /// Creates a handler rejection with the given message.
    pub fn rejected(message: impl Into<String>) -> Self {
        InvalidArgument::Rejected {
            message: message.into(),
        }
    }

    /// Returns the name of the failing filter-set member, if any.
    pub fn member_name(&self) -> Option<&str> {
        match self {
            InvalidArgument::Member { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Follows `Member` wrappers down to the error that started the failure.
    pub fn root(&self) -> &InvalidArgument {
        match self {
            InvalidArgument::Member { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the path of member names from the outermost set inwards.
    pub fn member_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let InvalidArgument::Member { name, source } = current {
            path.push(name.as_str());
            current = source;
        }
        path
    }
}

/// A construction-time (programmer) error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The pattern given to a pattern filter does not compile.
    #[error("invalid pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A filter names a handler that its context does not register.
    #[error("handler '{name}' not found in context")]
    UnknownHandler { name: String },

    /// A filter names a handler whose shape cannot take the coerced value.
    #[error("handler '{name}' must accept {expected}")]
    HandlerMismatch {
        name: String,
        expected: &'static str,
    },

    /// Two members of one filter set share a name.
    #[error("filter '{name}' is registered twice")]
    DuplicateFilter { name: String },

    /// Two handlers of one filter set share a name.
    #[error("handler '{name}' is registered twice")]
    DuplicateHandler { name: String },
}

/// Any error a filter can produce.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error(transparent)]
    Invalid(#[from] InvalidArgument),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FilterError {
    /// Returns `true` for request-driven failures.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, FilterError::Invalid(_))
    }

    /// Returns the request-driven failure, if this is one.
    pub fn as_invalid_argument(&self) -> Option<&InvalidArgument> {
        match self {
            FilterError::Invalid(e) => Some(e),
            FilterError::Config(_) => None,
        }
    }
}

/// Result type for filtering operations.
pub type Result<T> = std::result::Result<T, FilterError>;
