//! Canonical rule configuration and shorthand normalization.
//!
//! `validates` accepts shorthand values per rule kind; normalization translates
//! them into one canonical [`RuleOptions`] structure. Precedence: call-site
//! options override shared defaults, which override rule defaults.

use serde_json::Value;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::callbacks::{CallbackOptions, Guard};
use crate::context::{Context, RunContext};
use crate::validations::errors::ErrorEntry;

/// Membership test backing `in` arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    /// An explicit sequence of allowed values.
    List(Vec<Value>),
    /// An inclusive integer range.
    Range(RangeInclusive<i64>),
}

impl Membership {
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Membership::List(items) => items.contains(value),
            Membership::Range(range) => {
                value.as_i64().map(|n| range.contains(&n)).unwrap_or(false)
            }
        }
    }
}

/// The positional argument a shorthand value normalized into.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Ranges and sequences, e.g. inclusion sets and length bounds.
    In(Membership),
    /// Patterns and scalars, e.g. a format regex.
    With(Value),
}

/// Canonical configuration for one validator rule.
///
/// Tri-state booleans stay `None` until set, so shared defaults can fill only
/// the fields a rule did not configure itself.
pub struct RuleOptions<M> {
    /// Attributes the rule declares interest in; empty for whole-record rules.
    pub attributes: Vec<String>,
    /// Custom error message overriding the kind's default text.
    pub message: Option<String>,
    /// Lifecycle contexts the rule is restricted to.
    pub on: Vec<Context>,
    /// Skip the rule when the value is null.
    pub allow_nil: Option<bool>,
    /// Skip the rule when the value is blank.
    pub allow_blank: Option<bool>,
    /// Exact string matching for uniqueness queries. Defaults to true.
    pub case_sensitive: Option<bool>,
    /// Additional attributes limiting the scope of a uniqueness constraint.
    pub scope: Vec<String>,
    /// Re-check uniqueness only when a relevant attribute changed.
    pub only_if_modified: Option<bool>,
    /// Minimum length bound.
    pub minimum: Option<usize>,
    /// Maximum length bound.
    pub maximum: Option<usize>,
    /// The normalized shorthand argument, if any.
    pub argument: Option<Argument>,
    /// Predicates that must all hold for the rule to run.
    pub if_guards: Vec<Guard<M>>,
    /// Predicates that must all fail for the rule to run.
    pub unless_guards: Vec<Guard<M>>,
}

impl<M> Default for RuleOptions<M> {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            message: None,
            on: Vec::new(),
            allow_nil: None,
            allow_blank: None,
            case_sensitive: None,
            scope: Vec::new(),
            only_if_modified: None,
            minimum: None,
            maximum: None,
            argument: None,
            if_guards: Vec::new(),
            unless_guards: Vec::new(),
        }
    }
}

impl<M> RuleOptions<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn on(mut self, context: Context) -> Self {
        self.on.push(context);
        self
    }

    pub fn allow_nil(mut self, allow: bool) -> Self {
        self.allow_nil = Some(allow);
        self
    }

    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = Some(allow);
        self
    }

    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }

    pub fn scope(mut self, attribute: impl Into<String>) -> Self {
        self.scope.push(attribute.into());
        self
    }

    pub fn only_if_modified(mut self, only: bool) -> Self {
        self.only_if_modified = Some(only);
        self
    }

    pub fn minimum(mut self, minimum: usize) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: usize) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn within(mut self, membership: Membership) -> Self {
        self.argument = Some(Argument::In(membership));
        self
    }

    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.argument = Some(Argument::With(value.into()));
        self
    }

    pub fn when(mut self, guard: impl Fn(&M, &RunContext) -> bool + Send + Sync + 'static) -> Self {
        self.if_guards.push(Arc::new(guard));
        self
    }

    pub fn unless(
        mut self,
        guard: impl Fn(&M, &RunContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.unless_guards.push(Arc::new(guard));
        self
    }

    pub fn allows_nil(&self) -> bool {
        self.allow_nil.unwrap_or(false)
    }

    pub fn allows_blank(&self) -> bool {
        self.allow_blank.unwrap_or(false)
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive.unwrap_or(true)
    }

    pub fn checks_modified_only(&self) -> bool {
        self.only_if_modified.unwrap_or(false)
    }

    /// Prepare an error entry for this rule, applying the custom message.
    pub fn error_entry(&self, kind: &str) -> ErrorEntry {
        let mut entry = ErrorEntry::new(kind);
        if let Some(message) = &self.message {
            entry = entry.with_message(message.clone());
        }
        entry
    }

    /// Fill unset fields from shared defaults. Fields the rule configured
    /// itself win.
    pub fn merge_defaults(&mut self, defaults: &SharedDefaults<M>) {
        if self.if_guards.is_empty() {
            self.if_guards = defaults.if_guards.clone();
        }
        if self.unless_guards.is_empty() {
            self.unless_guards = defaults.unless_guards.clone();
        }
        if self.on.is_empty() {
            self.on = defaults.on.clone();
        }
        if self.allow_nil.is_none() {
            self.allow_nil = defaults.allow_nil;
        }
        if self.allow_blank.is_none() {
            self.allow_blank = defaults.allow_blank;
        }
    }
}

impl<M> fmt::Debug for RuleOptions<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleOptions")
            .field("attributes", &self.attributes)
            .field("message", &self.message)
            .field("on", &self.on)
            .field("allow_nil", &self.allow_nil)
            .field("allow_blank", &self.allow_blank)
            .field("case_sensitive", &self.case_sensitive)
            .field("scope", &self.scope)
            .field("only_if_modified", &self.only_if_modified)
            .field("minimum", &self.minimum)
            .field("maximum", &self.maximum)
            .field("argument", &self.argument)
            .field("if_guards", &self.if_guards.len())
            .field("unless_guards", &self.unless_guards.len())
            .finish()
    }
}

impl<M> From<&RuleOptions<M>> for CallbackOptions<M> {
    fn from(options: &RuleOptions<M>) -> Self {
        Self {
            if_guards: options.if_guards.clone(),
            unless_guards: options.unless_guards.clone(),
            on: options.on.clone(),
        }
    }
}

/// Shorthand configuration value accepted by `validates`, one per rule kind.
pub enum Shorthand<M> {
    /// The bare `true` flag: rule enabled with empty options.
    Enabled,
    /// A structured options value, used as-is.
    Options(RuleOptions<M>),
    /// A range, normalized to the `in` argument.
    Range(RangeInclusive<i64>),
    /// A sequence, normalized to the `in` argument.
    List(Vec<Value>),
    /// Any other scalar or pattern, normalized to the `with` argument.
    Value(Value),
}

impl<M> Shorthand<M> {
    /// Translate the shorthand into canonical options.
    pub fn normalize(self) -> RuleOptions<M> {
        match self {
            Shorthand::Enabled => RuleOptions::new(),
            Shorthand::Options(options) => options,
            Shorthand::Range(range) => RuleOptions::new().within(Membership::Range(range)),
            Shorthand::List(items) => RuleOptions::new().within(Membership::List(items)),
            Shorthand::Value(value) => RuleOptions::new().with(value),
        }
    }
}

impl<M> fmt::Debug for Shorthand<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shorthand::Enabled => f.write_str("Enabled"),
            Shorthand::Options(options) => f.debug_tuple("Options").field(options).finish(),
            Shorthand::Range(range) => f.debug_tuple("Range").field(range).finish(),
            Shorthand::List(items) => f.debug_tuple("List").field(items).finish(),
            Shorthand::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl<M> From<bool> for Shorthand<M> {
    fn from(flag: bool) -> Self {
        if flag {
            Shorthand::Enabled
        } else {
            Shorthand::Value(Value::Bool(false))
        }
    }
}

impl<M> From<RangeInclusive<i64>> for Shorthand<M> {
    fn from(range: RangeInclusive<i64>) -> Self {
        Shorthand::Range(range)
    }
}

impl<M> From<Vec<Value>> for Shorthand<M> {
    fn from(items: Vec<Value>) -> Self {
        Shorthand::List(items)
    }
}

impl<M> From<Value> for Shorthand<M> {
    fn from(value: Value) -> Self {
        Shorthand::Value(value)
    }
}

impl<M> From<&str> for Shorthand<M> {
    fn from(pattern: &str) -> Self {
        Shorthand::Value(Value::String(pattern.to_string()))
    }
}

impl<M> From<RuleOptions<M>> for Shorthand<M> {
    fn from(options: RuleOptions<M>) -> Self {
        Shorthand::Options(options)
    }
}

/// Shared defaults extracted from the global keys of a `validates` call.
pub struct SharedDefaults<M> {
    pub(crate) if_guards: Vec<Guard<M>>,
    pub(crate) unless_guards: Vec<Guard<M>>,
    pub(crate) on: Vec<Context>,
    pub(crate) allow_nil: Option<bool>,
    pub(crate) allow_blank: Option<bool>,
}

impl<M> Default for SharedDefaults<M> {
    fn default() -> Self {
        Self {
            if_guards: Vec::new(),
            unless_guards: Vec::new(),
            on: Vec::new(),
            allow_nil: None,
            allow_blank: None,
        }
    }
}

/// The declarative payload of a `validates` call: ordered rule specs plus the
/// shared defaults applied to each of them.
pub struct RuleSpecs<M> {
    rules: Vec<(String, Shorthand<M>)>,
    defaults: SharedDefaults<M>,
}

impl<M> Default for RuleSpecs<M> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            defaults: SharedDefaults::default(),
        }
    }
}

impl<M> RuleSpecs<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule kind with its shorthand configuration.
    pub fn rule(mut self, kind: impl Into<String>, spec: impl Into<Shorthand<M>>) -> Self {
        self.rules.push((kind.into(), spec.into()));
        self
    }

    /// Restrict every rule to a lifecycle context (unless overridden per rule).
    pub fn on(mut self, context: Context) -> Self {
        self.defaults.on.push(context);
        self
    }

    /// Guard every rule with a predicate (unless overridden per rule).
    pub fn when(mut self, guard: impl Fn(&M, &RunContext) -> bool + Send + Sync + 'static) -> Self {
        self.defaults.if_guards.push(Arc::new(guard));
        self
    }

    /// Skip every rule when the predicate holds (unless overridden per rule).
    pub fn unless(
        mut self,
        guard: impl Fn(&M, &RunContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.defaults.unless_guards.push(Arc::new(guard));
        self
    }

    /// Default `allow_nil` for every rule that does not set it.
    pub fn allow_nil(mut self, allow: bool) -> Self {
        self.defaults.allow_nil = Some(allow);
        self
    }

    /// Default `allow_blank` for every rule that does not set it.
    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.defaults.allow_blank = Some(allow);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<(String, Shorthand<M>)>, SharedDefaults<M>) {
        (self.rules, self.defaults)
    }
}

impl<M> fmt::Debug for RuleSpecs<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSpecs")
            .field("rules", &self.rules)
            .finish()
    }
}
