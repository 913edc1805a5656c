//! The contract a host ORM model must satisfy.

use serde_json::Value;
use std::sync::OnceLock;

use crate::validations::Errors;

/// One attribute/value pair in a uniqueness query.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeCriterion {
    /// The attribute (column) to match on.
    pub attribute: String,
    /// The value the existing record must equal.
    pub value: Value,
    /// Whether string comparison is exact. Hosts may ignore this for
    /// non-text columns.
    pub case_sensitive: bool,
}

/// Per-instance adapter state, held by the model instance as a field.
///
/// The error collection is created lazily on first mutable access.
#[derive(Debug, Default)]
pub struct ModelState {
    errors: Option<Errors>,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the error collection. Instances that have never been
    /// validated report an empty collection.
    pub fn errors(&self) -> &Errors {
        self.errors.as_ref().unwrap_or_else(|| empty_errors())
    }

    /// The error collection, created on first access.
    pub fn errors_mut(&mut self) -> &mut Errors {
        self.errors.get_or_insert_with(Errors::new)
    }
}

fn empty_errors() -> &'static Errors {
    static EMPTY: OnceLock<Errors> = OnceLock::new();
    EMPTY.get_or_init(Errors::new)
}

/// Host ORM model contract.
///
/// Everything the adapters need from the underlying ORM: attribute access,
/// dirty tracking, persistence predicates, and a count query for uniqueness
/// checks. The instance additionally holds a [`ModelState`] field so the
/// adapters themselves stay stateless.
pub trait Record: 'static {
    /// Read an attribute value by name. Missing attributes read as null.
    fn read_attribute(&self, name: &str) -> Value;

    /// Attributes changed since the record was loaded.
    fn changed_attributes(&self) -> Vec<String>;

    /// The primary key value, if the record has one assigned.
    fn primary_key(&self) -> Option<Value>;

    /// Whether the record has never been persisted.
    fn is_new(&self) -> bool;

    /// Count persisted records matching every criterion, optionally excluding
    /// the record with the given primary key. Blocking; the host's own query
    /// semantics apply.
    fn count_matching(&self, criteria: &[AttributeCriterion], excluding_pk: Option<&Value>)
        -> u64;

    /// The per-instance adapter state field.
    fn state(&self) -> &ModelState;

    /// Mutable access to the per-instance adapter state field.
    fn state_mut(&mut self) -> &mut ModelState;

    /// Generic accessor rule implementations go through, so they stay agnostic
    /// of how attributes are stored.
    fn read_attribute_for_validation(&self, attribute: &str) -> Value {
        self.read_attribute(attribute)
    }

    /// The instance's validation errors.
    fn errors(&self) -> &Errors {
        self.state().errors()
    }

    /// Mutable access to the instance's validation errors, created lazily.
    fn errors_mut(&mut self) -> &mut Errors {
        self.state_mut().errors_mut()
    }
}
