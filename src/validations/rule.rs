//! The validator rule contract.

use serde_json::Value;
use std::fmt;

use crate::error::ConfigurationError;
use crate::record::Record;
use crate::validations::errors::Errors;
use crate::validations::options::RuleOptions;

/// Whether a value counts as blank: null, whitespace-only string, or an
/// empty collection.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// A reusable, configurable unit of validation logic.
///
/// Attribute-targeted rules implement [`validate_each`](Rule::validate_each);
/// whole-record rules declare no attributes and implement
/// [`validate_record`](Rule::validate_record). Guard conditions (`if`,
/// `unless`, `on`) are evaluated by the chain entry wrapping the rule, not
/// here; `allow_nil` and `allow_blank` are honored by the provided
/// [`validate`](Rule::validate) driver.
pub trait Rule<M: Record>: fmt::Debug + Send + Sync {
    /// The rule kind, used as the error kind prefix and registry key.
    fn kind(&self) -> &'static str;

    /// The rule's canonical configuration.
    fn options(&self) -> &RuleOptions<M>;

    /// One-time hook invoked when the rule is registered on a model type.
    fn setup(&mut self) -> Result<(), ConfigurationError> {
        Ok(())
    }

    /// Validate a single attribute value, recording failures.
    fn validate_each(&self, record: &M, attribute: &str, value: &Value, errors: &mut Errors);

    /// Validate the record as a whole. Only called for rules declaring no
    /// attributes.
    fn validate_record(&self, _record: &M, _errors: &mut Errors) {}

    /// Run the rule over its declared attributes.
    fn validate(&self, record: &M, errors: &mut Errors) {
        let options = self.options();
        if options.attributes.is_empty() {
            self.validate_record(record, errors);
            return;
        }
        for attribute in &options.attributes {
            let value = record.read_attribute_for_validation(attribute);
            if value.is_null() && options.allows_nil() {
                continue;
            }
            if is_blank(&value) && options.allows_blank() {
                continue;
            }
            self.validate_each(record, attribute, &value, errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blankness() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!("   ")));
        assert!(is_blank(&json!([])));
        assert!(!is_blank(&json!("x")));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
    }
}
