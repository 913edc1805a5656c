//! Declarative validations for model types.
//!
//! Rules are declared once at model-definition time through
//! [`ModelClass::validates`](crate::ModelClass::validates) (shorthand specs
//! resolved through the [`RuleTable`](registry::RuleTable)) or registered
//! directly as [`Rule`](rule::Rule) instances. Failures accumulate in the
//! instance's [`Errors`] collection; configuration mistakes fail fast with
//! [`ConfigurationError`](crate::ConfigurationError).

pub mod errors;
pub mod options;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod uniqueness;

pub use errors::{ErrorEntry, Errors, BASE};
pub use options::{Argument, Membership, RuleOptions, RuleSpecs, SharedDefaults, Shorthand};
pub use registry::{RuleFactory, RuleTable};
pub use rule::{is_blank, Rule};
pub use rules::{
    ExclusionRule, FormatRule, InclusionRule, LengthRule, NumericalityRule, PresenceRule,
};
pub use uniqueness::UniquenessRule;
