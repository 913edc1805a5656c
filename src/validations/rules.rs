//! Built-in attribute validation rules.

use regex::Regex;
use serde_json::Value;
use std::fmt;

use crate::error::ConfigurationError;
use crate::record::Record;
use crate::validations::errors::Errors;
use crate::validations::options::{Argument, RuleOptions};
use crate::validations::rule::{is_blank, Rule};

/// Value must not be blank.
pub struct PresenceRule<M> {
    options: RuleOptions<M>,
}

impl<M> PresenceRule<M> {
    pub fn new(options: RuleOptions<M>) -> Self {
        Self { options }
    }
}

impl<M: Record> Rule<M> for PresenceRule<M> {
    fn kind(&self) -> &'static str {
        "presence"
    }

    fn options(&self) -> &RuleOptions<M> {
        &self.options
    }

    fn validate_each(&self, _record: &M, attribute: &str, value: &Value, errors: &mut Errors) {
        if is_blank(value) {
            errors.add_entry(attribute, self.options.error_entry("blank"));
        }
    }
}

impl<M> fmt::Debug for PresenceRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceRule").field("options", &self.options).finish()
    }
}

/// String value must match the configured pattern.
pub struct FormatRule<M> {
    options: RuleOptions<M>,
    pattern: Regex,
}

impl<M> FormatRule<M> {
    /// Build the rule, compiling the `with` pattern. Fails at definition time
    /// when the pattern is missing or unparsable.
    pub fn new(options: RuleOptions<M>) -> Result<Self, ConfigurationError> {
        let pattern = match &options.argument {
            Some(Argument::With(Value::String(pattern))) => Regex::new(pattern)?,
            _ => {
                return Err(ConfigurationError::MissingOption {
                    kind: "format",
                    option: "with",
                })
            }
        };
        Ok(Self { options, pattern })
    }
}

impl<M: Record> Rule<M> for FormatRule<M> {
    fn kind(&self) -> &'static str {
        "format"
    }

    fn options(&self) -> &RuleOptions<M> {
        &self.options
    }

    fn validate_each(&self, _record: &M, attribute: &str, value: &Value, errors: &mut Errors) {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if !self.pattern.is_match(&text) {
            errors.add_entry(
                attribute,
                self.options.error_entry("invalid").param("value", value.clone()),
            );
        }
    }
}

impl<M> fmt::Debug for FormatRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRule")
            .field("pattern", &self.pattern.as_str())
            .field("options", &self.options)
            .finish()
    }
}

/// Character count must satisfy the configured bounds or membership.
pub struct LengthRule<M> {
    options: RuleOptions<M>,
}

impl<M> LengthRule<M> {
    pub fn new(options: RuleOptions<M>) -> Self {
        Self { options }
    }
}

fn value_length(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        other => other.to_string().chars().count(),
    }
}

impl<M: Record> Rule<M> for LengthRule<M> {
    fn kind(&self) -> &'static str {
        "length"
    }

    fn options(&self) -> &RuleOptions<M> {
        &self.options
    }

    fn validate_each(&self, _record: &M, attribute: &str, value: &Value, errors: &mut Errors) {
        let length = value_length(value);

        if let Some(Argument::In(membership)) = &self.options.argument {
            if !membership.contains(&Value::from(length as i64)) {
                errors.add_entry(
                    attribute,
                    self.options.error_entry("wrong_length").param("actual", length),
                );
            }
            return;
        }

        if let Some(minimum) = self.options.minimum {
            if length < minimum {
                errors.add_entry(
                    attribute,
                    self.options
                        .error_entry("too_short")
                        .param("count", minimum)
                        .param("actual", length),
                );
                return;
            }
        }
        if let Some(maximum) = self.options.maximum {
            if length > maximum {
                errors.add_entry(
                    attribute,
                    self.options
                        .error_entry("too_long")
                        .param("count", maximum)
                        .param("actual", length),
                );
            }
        }
    }
}

impl<M> fmt::Debug for LengthRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LengthRule").field("options", &self.options).finish()
    }
}

/// Value must be a member of the configured set.
pub struct InclusionRule<M> {
    options: RuleOptions<M>,
}

impl<M> InclusionRule<M> {
    pub fn new(options: RuleOptions<M>) -> Result<Self, ConfigurationError> {
        match options.argument {
            Some(Argument::In(_)) => Ok(Self { options }),
            _ => Err(ConfigurationError::MissingOption {
                kind: "inclusion",
                option: "in",
            }),
        }
    }
}

impl<M: Record> Rule<M> for InclusionRule<M> {
    fn kind(&self) -> &'static str {
        "inclusion"
    }

    fn options(&self) -> &RuleOptions<M> {
        &self.options
    }

    fn validate_each(&self, _record: &M, attribute: &str, value: &Value, errors: &mut Errors) {
        if let Some(Argument::In(membership)) = &self.options.argument {
            if !membership.contains(value) {
                errors.add_entry(
                    attribute,
                    self.options.error_entry("inclusion").param("value", value.clone()),
                );
            }
        }
    }
}

impl<M> fmt::Debug for InclusionRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InclusionRule").field("options", &self.options).finish()
    }
}

/// Value must not be a member of the configured set.
pub struct ExclusionRule<M> {
    options: RuleOptions<M>,
}

impl<M> ExclusionRule<M> {
    pub fn new(options: RuleOptions<M>) -> Result<Self, ConfigurationError> {
        match options.argument {
            Some(Argument::In(_)) => Ok(Self { options }),
            _ => Err(ConfigurationError::MissingOption {
                kind: "exclusion",
                option: "in",
            }),
        }
    }
}

impl<M: Record> Rule<M> for ExclusionRule<M> {
    fn kind(&self) -> &'static str {
        "exclusion"
    }

    fn options(&self) -> &RuleOptions<M> {
        &self.options
    }

    fn validate_each(&self, _record: &M, attribute: &str, value: &Value, errors: &mut Errors) {
        if let Some(Argument::In(membership)) = &self.options.argument {
            if membership.contains(value) {
                errors.add_entry(
                    attribute,
                    self.options.error_entry("exclusion").param("value", value.clone()),
                );
            }
        }
    }
}

impl<M> fmt::Debug for ExclusionRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusionRule").field("options", &self.options).finish()
    }
}

/// Value must be numeric, or a string parsing as a number.
pub struct NumericalityRule<M> {
    options: RuleOptions<M>,
}

impl<M> NumericalityRule<M> {
    pub fn new(options: RuleOptions<M>) -> Self {
        Self { options }
    }
}

impl<M: Record> Rule<M> for NumericalityRule<M> {
    fn kind(&self) -> &'static str {
        "numericality"
    }

    fn options(&self) -> &RuleOptions<M> {
        &self.options
    }

    fn validate_each(&self, _record: &M, attribute: &str, value: &Value, errors: &mut Errors) {
        let numeric = match value {
            Value::Number(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        };
        if !numeric {
            errors.add_entry(
                attribute,
                self.options
                    .error_entry("not_a_number")
                    .param("value", value.clone()),
            );
        }
    }
}

impl<M> fmt::Debug for NumericalityRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericalityRule").field("options", &self.options).finish()
    }
}
