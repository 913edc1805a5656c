//! Per-model-type definition: callback chains, validator registry, naming.
//!
//! A [`ModelClass`] is built once at model-definition time, then treated as
//! immutable and shared process-wide (typically behind an `Arc` or a
//! `LazyLock`). Instances flow through its run-time entry points together with
//! a closure performing the host ORM's underlying operation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::callbacks::{Callback, CallbackOptions, ChainSet, ChainSpec};
use crate::context::{Context, Lifecycle, RunContext};
use crate::error::ConfigurationError;
use crate::naming::ModelName;
use crate::record::Record;
use crate::validations::options::{RuleOptions, RuleSpecs};
use crate::validations::registry::RuleTable;
use crate::validations::rule::Rule;

/// The definition a model type owns: its chains, validator registrations, and
/// naming data.
pub struct ModelClass<M: Record> {
    name: ModelName,
    chains: ChainSet<M>,
    rules: HashMap<Option<String>, Vec<Arc<dyn Rule<M>>>>,
    kinds: RuleTable<M>,
}

impl<M: Record> ModelClass<M> {
    /// Create a definition with the five lifecycle chains and the validate
    /// chain in place. The validation chain is terminable: a `false` return
    /// from a before_validation step halts it.
    pub fn new(name: impl Into<String>) -> Self {
        let mut chains = ChainSet::new();
        for lifecycle in [
            Lifecycle::Save,
            Lifecycle::Create,
            Lifecycle::Update,
            Lifecycle::Destroy,
        ] {
            chains.define(lifecycle, ChainSpec::default());
        }
        chains.define(Lifecycle::Validation, ChainSpec { terminable: true });
        chains.define(Lifecycle::Validate, ChainSpec::default());

        Self {
            name: ModelName::new(name),
            chains,
            rules: HashMap::new(),
            kinds: RuleTable::with_builtins(),
        }
    }

    pub fn model_name(&self) -> &ModelName {
        &self.name
    }

    // --- definition-time: callbacks ---

    /// Register a callback before a lifecycle operation.
    pub fn before(
        &mut self,
        lifecycle: Lifecycle,
        f: impl Fn(&mut M) -> bool + Send + Sync + 'static,
    ) {
        self.before_with(lifecycle, CallbackOptions::new(), f);
    }

    /// Register a guarded callback before a lifecycle operation.
    pub fn before_with(
        &mut self,
        lifecycle: Lifecycle,
        options: CallbackOptions<M>,
        f: impl Fn(&mut M) -> bool + Send + Sync + 'static,
    ) {
        self.chains
            .register(lifecycle, Callback::before(f).with_options(options));
    }

    /// Register a callback after a lifecycle operation.
    pub fn after(
        &mut self,
        lifecycle: Lifecycle,
        f: impl Fn(&mut M) -> bool + Send + Sync + 'static,
    ) {
        self.after_with(lifecycle, CallbackOptions::new(), f);
    }

    /// Register a guarded callback after a lifecycle operation.
    pub fn after_with(
        &mut self,
        lifecycle: Lifecycle,
        options: CallbackOptions<M>,
        f: impl Fn(&mut M) -> bool + Send + Sync + 'static,
    ) {
        self.chains
            .register(lifecycle, Callback::after(f).with_options(options));
    }

    /// Register a callback wrapping a lifecycle operation.
    pub fn around(
        &mut self,
        lifecycle: Lifecycle,
        f: impl Fn(&mut M, &mut dyn FnMut(&mut M) -> bool) -> bool + Send + Sync + 'static,
    ) {
        self.around_with(lifecycle, CallbackOptions::new(), f);
    }

    /// Register a guarded callback wrapping a lifecycle operation.
    pub fn around_with(
        &mut self,
        lifecycle: Lifecycle,
        options: CallbackOptions<M>,
        f: impl Fn(&mut M, &mut dyn FnMut(&mut M) -> bool) -> bool + Send + Sync + 'static,
    ) {
        self.chains
            .register(lifecycle, Callback::around(f).with_options(options));
    }

    // --- definition-time: validations ---

    /// Register a whole-record validation step.
    pub fn validate_step(&mut self, f: impl Fn(&mut M) -> bool + Send + Sync + 'static) {
        self.validate_step_with(CallbackOptions::new(), f);
    }

    /// Register a guarded whole-record validation step. The `on` restriction
    /// compiles into a guard over the run's lifecycle context.
    pub fn validate_step_with(
        &mut self,
        options: CallbackOptions<M>,
        f: impl Fn(&mut M) -> bool + Send + Sync + 'static,
    ) {
        self.chains
            .register(Lifecycle::Validate, Callback::before(f).with_options(options));
    }

    /// Register a rule instance: run its setup hook, file it in the
    /// per-attribute registry, and append it as a validate step guarded by its
    /// own `if`/`unless`/`on` options.
    pub fn add_rule(&mut self, mut rule: Box<dyn Rule<M>>) -> Result<(), ConfigurationError> {
        rule.setup()?;
        let rule: Arc<dyn Rule<M>> = Arc::from(rule);

        let attributes = rule.options().attributes.clone();
        if attributes.is_empty() {
            self.rules.entry(None).or_default().push(rule.clone());
        } else {
            for attribute in attributes {
                self.rules
                    .entry(Some(attribute))
                    .or_default()
                    .push(rule.clone());
            }
        }

        let guards = CallbackOptions::from(rule.options());
        let step = rule.clone();
        debug!(model = %self.name, kind = rule.kind(), "registering validator");
        self.chains.register(
            Lifecycle::Validate,
            Callback::before(move |record: &mut M| {
                // Lift the collection out so the rule can read the record
                // while recording failures.
                let mut errors = std::mem::take(record.errors_mut());
                step.validate(record, &mut errors);
                *record.errors_mut() = errors;
                true
            })
            .with_options(guards),
        );
        Ok(())
    }

    /// Register several pre-built rule instances at once.
    pub fn validates_with(
        &mut self,
        rules: Vec<Box<dyn Rule<M>>>,
    ) -> Result<(), ConfigurationError> {
        for rule in rules {
            self.add_rule(rule)?;
        }
        Ok(())
    }

    /// Declarative entry point: attach the given rule kinds to attributes.
    ///
    /// Each shorthand spec is normalized, filled from the shared defaults, and
    /// resolved through the rule table. Fails when no attributes or no rule
    /// specs are supplied, or when a kind is unknown.
    pub fn validates(
        &mut self,
        attributes: &[&str],
        specs: RuleSpecs<M>,
    ) -> Result<(), ConfigurationError> {
        if attributes.is_empty() {
            return Err(ConfigurationError::NoAttributes);
        }
        if specs.is_empty() {
            return Err(ConfigurationError::NoRules);
        }

        let (rules, defaults) = specs.into_parts();
        for (kind, shorthand) in rules {
            let mut options = shorthand.normalize();
            options.merge_defaults(&defaults);
            options.attributes = attributes.iter().map(|s| s.to_string()).collect();
            let rule = self.kinds.build(&kind, options)?;
            self.add_rule(rule)?;
        }
        Ok(())
    }

    /// Register a custom rule kind for later use in `validates`.
    pub fn register_rule_kind<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(RuleOptions<M>) -> Result<Box<dyn Rule<M>>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.kinds.register(kind, factory);
    }

    /// Rules registered for an attribute, or the attribute-agnostic rules for
    /// `None`.
    pub fn rules_on(&self, attribute: Option<&str>) -> &[Arc<dyn Rule<M>>] {
        let key = attribute.map(|s| s.to_string());
        self.rules.get(&key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    // --- run-time entry points ---

    /// Run a save: the save chain wraps the create or update chain (picked by
    /// the record's persistence state), which wraps the underlying operation.
    /// Every chain entry sees the create/update lifecycle context.
    pub fn save(&self, record: &mut M, op: &mut dyn FnMut(&mut M) -> bool) -> bool {
        if record.is_new() {
            self.create(record, op)
        } else {
            self.update(record, op)
        }
    }

    /// Run the save and create chains around the underlying insert operation.
    pub fn create(&self, record: &mut M, op: &mut dyn FnMut(&mut M) -> bool) -> bool {
        self.persist(Lifecycle::Create, Context::Create, record, op)
    }

    /// Run the save and update chains around the underlying update operation.
    pub fn update(&self, record: &mut M, op: &mut dyn FnMut(&mut M) -> bool) -> bool {
        self.persist(Lifecycle::Update, Context::Update, record, op)
    }

    /// Run the destroy chain around the underlying delete operation.
    pub fn destroy(&self, record: &mut M, op: &mut dyn FnMut(&mut M) -> bool) -> bool {
        let ctx = RunContext::new(Lifecycle::Destroy);
        self.chains.run(Lifecycle::Destroy, record, &ctx, op)
    }

    fn persist(
        &self,
        inner: Lifecycle,
        context: Context,
        record: &mut M,
        op: &mut dyn FnMut(&mut M) -> bool,
    ) -> bool {
        let outer = RunContext {
            lifecycle: Lifecycle::Save,
            context: Some(context.clone()),
        };
        self.chains.run(Lifecycle::Save, record, &outer, &mut |r| {
            let ctx = RunContext {
                lifecycle: inner,
                context: Some(context.clone()),
            };
            self.chains.run(inner, r, &ctx, op)
        })
    }

    /// Run a full validation pass: clear the error collection, then run the
    /// validation chain around the base (inherited) validation followed by the
    /// validate chain.
    ///
    /// Returns `false` when the validation chain was halted by a
    /// before_validation step.
    pub fn validate(
        &self,
        record: &mut M,
        context: Option<Context>,
        base: &mut dyn FnMut(&mut M) -> bool,
    ) -> bool {
        record.errors_mut().clear();
        let outer = RunContext {
            lifecycle: Lifecycle::Validation,
            context: context.clone(),
        };
        self.chains.run(Lifecycle::Validation, record, &outer, &mut |r| {
            let result = base(r);
            let inner = RunContext {
                lifecycle: Lifecycle::Validate,
                context: context.clone(),
            };
            self.chains.run(Lifecycle::Validate, r, &inner, &mut |_| true);
            result
        })
    }

    /// Whether the record passes validation under the given context.
    ///
    /// A halted validation chain counts as invalid.
    pub fn valid(&self, record: &mut M, context: Option<Context>) -> bool {
        let completed = self.validate(record, context, &mut |_| true);
        completed && record.errors().is_empty()
    }

    /// Logical negation of [`valid`](Self::valid).
    pub fn invalid(&self, record: &mut M, context: Option<Context>) -> bool {
        !self.valid(record, context)
    }
}

impl<M: Record> fmt::Debug for ModelClass<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClass")
            .field("name", &self.name)
            .field("chains", &self.chains)
            .field("kinds", &self.kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockRecord;
    use serde_json::{json, Value};

    #[test]
    fn validates_requires_attributes_and_rules() {
        let mut class = ModelClass::<MockRecord>::new("User");

        let result = class.validates(&[], RuleSpecs::new().rule("presence", true));
        assert!(matches!(result, Err(ConfigurationError::NoAttributes)));

        let result = class.validates(&["email"], RuleSpecs::new());
        assert!(matches!(result, Err(ConfigurationError::NoRules)));
    }

    #[test]
    fn validates_rejects_unknown_kinds() {
        let mut class = ModelClass::<MockRecord>::new("User");
        let result = class.validates(&["email"], RuleSpecs::new().rule("acceptance", true));
        assert!(matches!(
            result,
            Err(ConfigurationError::UnknownRule { kind }) if kind == "acceptance"
        ));
    }

    #[test]
    fn rules_are_filed_per_attribute() {
        let mut class = ModelClass::<MockRecord>::new("User");
        class
            .validates(
                &["email", "name"],
                RuleSpecs::new().rule("presence", true),
            )
            .unwrap();

        assert_eq!(class.rules_on(Some("email")).len(), 1);
        assert_eq!(class.rules_on(Some("name")).len(), 1);
        assert!(class.rules_on(None).is_empty());
    }

    #[test]
    fn presence_errors_surface_on_the_instance() {
        let mut class = ModelClass::<MockRecord>::new("User");
        class
            .validates(&["name"], RuleSpecs::new().rule("presence", true))
            .unwrap();

        let mut record = MockRecord::new();
        assert!(!class.valid(&mut record, None));
        assert_eq!(record.errors().get("name").unwrap()[0].kind, "blank");

        let mut record = MockRecord::new().set("name", json!("bob"));
        assert!(class.valid(&mut record, None));
    }

    #[test]
    fn errors_are_rebuilt_each_run() {
        let mut class = ModelClass::<MockRecord>::new("User");
        class
            .validates(&["name"], RuleSpecs::new().rule("presence", true))
            .unwrap();

        let mut record = MockRecord::new();
        assert!(!class.valid(&mut record, None));
        assert_eq!(record.errors().len(), 1);

        // Fixing the attribute clears the stale error on the next run.
        record.attrs.insert("name".to_string(), json!("bob"));
        assert!(class.valid(&mut record, None));
        assert!(record.errors().is_empty());
    }

    #[test]
    fn on_restriction_limits_rule_to_context() {
        let mut class = ModelClass::<MockRecord>::new("User");
        class
            .validates(
                &["name"],
                RuleSpecs::new().rule("presence", true).on(Context::Create),
            )
            .unwrap();

        let mut record = MockRecord::new();
        assert!(class.valid(&mut record, Some(Context::Update)));
        assert!(!class.valid(&mut record, Some(Context::Create)));
        // No context at all does not satisfy the restriction either.
        assert!(class.valid(&mut record, None));
    }

    #[test]
    fn save_chain_wraps_the_create_chain() {
        let mut class = ModelClass::<MockRecord>::new("User");
        class.before(Lifecycle::Save, |r: &mut MockRecord| {
            r.attrs.insert("order".to_string(), json!(["before_save"]));
            true
        });
        class.before(Lifecycle::Create, |r: &mut MockRecord| {
            if let Value::Array(items) = r.attrs.get_mut("order").unwrap() {
                items.push(json!("before_create"));
            }
            true
        });
        class.after(Lifecycle::Save, |r: &mut MockRecord| {
            if let Value::Array(items) = r.attrs.get_mut("order").unwrap() {
                items.push(json!("after_save"));
            }
            true
        });

        let mut record = MockRecord::new();
        class.save(&mut record, &mut |r| {
            if let Value::Array(items) = r.attrs.get_mut("order").unwrap() {
                items.push(json!("op"));
            }
            true
        });
        assert_eq!(
            record.read_attribute("order"),
            json!(["before_save", "before_create", "op", "after_save"])
        );
    }

    #[test]
    fn save_dispatches_on_persistence_state() {
        let mut class = ModelClass::<MockRecord>::new("User");
        class.before(Lifecycle::Update, |r: &mut MockRecord| {
            r.attrs.insert("updated".to_string(), json!(true));
            true
        });

        let mut record = MockRecord::new().persisted_with_pk(1);
        class.save(&mut record, &mut |_| true);
        assert_eq!(record.read_attribute("updated"), json!(true));

        let mut record = MockRecord::new();
        class.save(&mut record, &mut |_| true);
        assert!(record.read_attribute("updated").is_null());
    }

    #[test]
    fn validate_step_runs_custom_logic() {
        let mut class = ModelClass::<MockRecord>::new("Comment");
        class.validate_step(|record: &mut MockRecord| {
            if record.read_attribute("author").is_null() {
                record.errors_mut().add(crate::validations::BASE, "invalid");
            }
            true
        });

        let mut record = MockRecord::new();
        assert!(!class.valid(&mut record, None));
        assert_eq!(record.errors().get(crate::validations::BASE).unwrap().len(), 1);
    }

    #[test]
    fn halted_validation_chain_is_invalid_and_skips_afters() {
        let mut class = ModelClass::<MockRecord>::new("User");
        class.before(Lifecycle::Validation, |_| false);
        class.after(Lifecycle::Validation, |record| {
            record.attrs.insert("after_ran".to_string(), json!(true));
            true
        });

        let mut record = MockRecord::new();
        assert!(!class.valid(&mut record, None));
        assert!(record.errors().is_empty());
        assert!(record.read_attribute("after_ran").is_null());
    }

    #[test]
    fn before_validation_can_mutate_before_rules_run() {
        let mut class = ModelClass::<MockRecord>::new("Person");
        class
            .validates(&["name"], RuleSpecs::new().rule("length", RuleOptions::new().maximum(6)))
            .unwrap();
        class.before(Lifecycle::Validation, |record: &mut MockRecord| {
            if let serde_json::Value::String(s) = record.read_attribute("name") {
                record
                    .attrs
                    .insert("name".to_string(), json!(s.trim().to_string()));
            }
            true
        });

        let mut record = MockRecord::new().set("name", json!("  bob  "));
        assert!(class.valid(&mut record, None));
        assert_eq!(record.read_attribute("name"), json!("bob"));
    }

    #[test]
    fn custom_rule_kind_round_trip() {
        use crate::validations::errors::Errors;

        #[derive(Debug)]
        struct EmailShaped {
            options: RuleOptions<MockRecord>,
        }
        impl Rule<MockRecord> for EmailShaped {
            fn kind(&self) -> &'static str {
                "email_shaped"
            }
            fn options(&self) -> &RuleOptions<MockRecord> {
                &self.options
            }
            fn validate_each(
                &self,
                _record: &MockRecord,
                attribute: &str,
                value: &Value,
                errors: &mut Errors,
            ) {
                let ok = value.as_str().map(|s| s.contains('@')).unwrap_or(false);
                if !ok {
                    errors.add_entry(attribute, self.options.error_entry("invalid"));
                }
            }
        }

        let mut class = ModelClass::<MockRecord>::new("User");
        class.register_rule_kind("email_shaped", |options| {
            Ok(Box::new(EmailShaped { options }) as Box<dyn Rule<MockRecord>>)
        });
        class
            .validates(&["email"], RuleSpecs::new().rule("email_shaped", true))
            .unwrap();

        let mut record = MockRecord::new().set("email", json!("not-an-email"));
        assert!(!class.valid(&mut record, None));
    }
}
