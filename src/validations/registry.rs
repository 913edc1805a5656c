//! Rule-kind resolution.
//!
//! Rule kinds are resolved through an explicit registration table rather than
//! name reflection: each kind maps to a factory building the concrete rule
//! from canonical options. The built-in kinds are seeded at construction;
//! custom kinds register at model-definition time.

use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::error::ConfigurationError;
use crate::record::Record;
use crate::validations::options::RuleOptions;
use crate::validations::rule::Rule;
use crate::validations::rules::{
    ExclusionRule, FormatRule, InclusionRule, LengthRule, NumericalityRule, PresenceRule,
};
use crate::validations::uniqueness::UniquenessRule;

/// Factory building a rule instance from its canonical options.
pub type RuleFactory<M> =
    Box<dyn Fn(RuleOptions<M>) -> Result<Box<dyn Rule<M>>, ConfigurationError> + Send + Sync>;

/// Mapping from rule-kind name to rule factory.
pub struct RuleTable<M: Record> {
    factories: HashMap<String, RuleFactory<M>>,
}

impl<M: Record> RuleTable<M> {
    /// An empty table with no kinds registered.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A table seeded with the built-in rule kinds.
    pub fn with_builtins() -> Self {
        let mut table = Self::empty();
        table.register("presence", |options| {
            Ok(Box::new(PresenceRule::new(options)) as Box<dyn Rule<M>>)
        });
        table.register("format", |options| {
            FormatRule::new(options).map(|rule| Box::new(rule) as Box<dyn Rule<M>>)
        });
        table.register("length", |options| {
            Ok(Box::new(LengthRule::new(options)) as Box<dyn Rule<M>>)
        });
        table.register("inclusion", |options| {
            InclusionRule::new(options).map(|rule| Box::new(rule) as Box<dyn Rule<M>>)
        });
        table.register("exclusion", |options| {
            ExclusionRule::new(options).map(|rule| Box::new(rule) as Box<dyn Rule<M>>)
        });
        table.register("numericality", |options| {
            Ok(Box::new(NumericalityRule::new(options)) as Box<dyn Rule<M>>)
        });
        table.register("uniqueness", |options| {
            Ok(Box::new(UniquenessRule::new(options)) as Box<dyn Rule<M>>)
        });
        table
    }

    /// Register a factory for a rule kind, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(RuleOptions<M>) -> Result<Box<dyn Rule<M>>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        let kind = kind.into();
        debug!(kind = %kind, "registering rule kind");
        self.factories.insert(kind, Box::new(factory));
    }

    /// Check whether a kind is registered.
    pub fn knows(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Build a rule for a kind. Fails with a configuration error for
    /// unregistered kinds.
    pub fn build(
        &self,
        kind: &str,
        options: RuleOptions<M>,
    ) -> Result<Box<dyn Rule<M>>, ConfigurationError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ConfigurationError::UnknownRule {
                kind: kind.to_string(),
            })?;
        factory(options)
    }
}

impl<M: Record> fmt::Debug for RuleTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("RuleTable").field("kinds", &kinds).finish()
    }
}
