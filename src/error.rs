//! Configuration errors raised at model-definition time.
//!
//! These always indicate programmer error and are always propagated. Data-driven
//! validation failures are never represented here; they accumulate in
//! [`Errors`](crate::validations::Errors) instead.

use thiserror::Error;

/// Fatal error produced while declaring callbacks or validation rules.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The rule kind has no registered factory.
    #[error("unknown validation rule `{kind}`")]
    UnknownRule { kind: String },

    /// `validates` was called without any attributes.
    #[error("at least one attribute must be supplied")]
    NoAttributes,

    /// `validates` was called without any rule specs.
    #[error("at least one validation rule must be supplied")]
    NoRules,

    /// A rule was configured without an option it cannot work without.
    #[error("rule `{kind}` requires the `{option}` option")]
    MissingOption {
        kind: &'static str,
        option: &'static str,
    },

    /// A format rule was configured with an unparsable pattern.
    #[error("invalid format pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
