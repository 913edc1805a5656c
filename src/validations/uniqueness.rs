//! Uniqueness validation against the host persistence layer.

use serde_json::Value;
use std::fmt;
use tracing::trace;

use crate::record::{AttributeCriterion, Record};
use crate::validations::errors::Errors;
use crate::validations::options::RuleOptions;
use crate::validations::rule::Rule;

/// Value must be unique across persisted records, optionally scoped by
/// additional attributes.
///
/// The check issues one blocking count query per target attribute. A persisted
/// record is excluded from its own query, so updating a record never conflicts
/// with itself. With `only_if_modified`, updates skip the query entirely when
/// neither the target nor any scope attribute changed since load. Reads only;
/// safe to re-enter.
pub struct UniquenessRule<M> {
    options: RuleOptions<M>,
}

impl<M> UniquenessRule<M> {
    pub fn new(mut options: RuleOptions<M>) -> Self {
        if options.case_sensitive.is_none() {
            options.case_sensitive = Some(true);
        }
        Self { options }
    }
}

impl<M: Record> Rule<M> for UniquenessRule<M> {
    fn kind(&self) -> &'static str {
        "uniqueness"
    }

    fn options(&self) -> &RuleOptions<M> {
        &self.options
    }

    fn validate_each(&self, record: &M, attribute: &str, value: &Value, errors: &mut Errors) {
        let mut keys = vec![attribute.to_string()];
        keys.extend(self.options.scope.iter().cloned());

        if self.options.checks_modified_only() && !record.is_new() {
            let changed = record.changed_attributes();
            if !keys.iter().any(|key| changed.contains(key)) {
                trace!(attribute, "uniqueness re-check skipped, no key attribute changed");
                return;
            }
        }

        let criteria: Vec<AttributeCriterion> = keys
            .iter()
            .map(|key| AttributeCriterion {
                attribute: key.clone(),
                value: if key == attribute {
                    value.clone()
                } else {
                    record.read_attribute_for_validation(key)
                },
                case_sensitive: self.options.is_case_sensitive(),
            })
            .collect();

        let own_pk = if record.is_new() {
            None
        } else {
            record.primary_key()
        };
        let conflicts = record.count_matching(&criteria, own_pk.as_ref());

        if conflicts > 0 {
            errors.add_entry(
                attribute,
                self.options.error_entry("taken").param("value", value.clone()),
            );
        }
    }
}

impl<M> fmt::Debug for UniquenessRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniquenessRule").field("options", &self.options).finish()
    }
}
