//! Named callback chains executed around model lifecycle operations.
//!
//! A chain holds before, around, and after entries registered at model-definition
//! time. Running a chain executes entries in registration order within each
//! phase, honoring per-entry guards, with the around entries nesting over a
//! continuation that performs the underlying operation. An empty chain runs the
//! underlying operation unchanged.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

use crate::context::{Context, Lifecycle, RunContext};

/// Predicate controlling whether a chain entry executes for a given call.
pub type Guard<M> = Arc<dyn Fn(&M, &RunContext) -> bool + Send + Sync>;

/// A before/after callback. Returning `false` terminates a terminable chain.
pub type CallbackFn<M> = Arc<dyn Fn(&mut M) -> bool + Send + Sync>;

/// An around callback. Receives a continuation that runs the rest of the
/// pipeline, including the underlying operation.
pub type AroundFn<M> =
    Arc<dyn Fn(&mut M, &mut dyn FnMut(&mut M) -> bool) -> bool + Send + Sync>;

/// Phase a callback runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    Around,
    After,
}

/// Conditions attached to a callback registration.
///
/// The `on` restriction compiles into the same guard check as `if`/`unless`,
/// so every position handles lifecycle contexts identically.
pub struct CallbackOptions<M> {
    pub(crate) if_guards: Vec<Guard<M>>,
    pub(crate) unless_guards: Vec<Guard<M>>,
    pub(crate) on: Vec<Context>,
}

impl<M> Default for CallbackOptions<M> {
    fn default() -> Self {
        Self {
            if_guards: Vec::new(),
            unless_guards: Vec::new(),
            on: Vec::new(),
        }
    }
}

impl<M> CallbackOptions<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the callback only when the predicate holds.
    pub fn when(mut self, guard: impl Fn(&M, &RunContext) -> bool + Send + Sync + 'static) -> Self {
        self.if_guards.push(Arc::new(guard));
        self
    }

    /// Skip the callback when the predicate holds.
    pub fn unless(
        mut self,
        guard: impl Fn(&M, &RunContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.unless_guards.push(Arc::new(guard));
        self
    }

    /// Restrict the callback to a lifecycle context.
    pub fn on(mut self, context: Context) -> Self {
        self.on.push(context);
        self
    }

    pub(crate) fn allows(&self, record: &M, ctx: &RunContext) -> bool {
        if !ctx.matches(&self.on) {
            return false;
        }
        self.if_guards.iter().all(|guard| guard(record, ctx))
            && self.unless_guards.iter().all(|guard| !guard(record, ctx))
    }
}

impl<M> fmt::Debug for CallbackOptions<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackOptions")
            .field("if_guards", &self.if_guards.len())
            .field("unless_guards", &self.unless_guards.len())
            .field("on", &self.on)
            .finish()
    }
}

enum Target<M> {
    Plain(CallbackFn<M>),
    Around(AroundFn<M>),
}

/// A registered chain entry.
pub struct Callback<M> {
    position: Position,
    target: Target<M>,
    options: CallbackOptions<M>,
}

impl<M> Callback<M> {
    /// A callback running before the underlying operation.
    pub fn before(f: impl Fn(&mut M) -> bool + Send + Sync + 'static) -> Self {
        Self {
            position: Position::Before,
            target: Target::Plain(Arc::new(f)),
            options: CallbackOptions::new(),
        }
    }

    /// A callback running after the underlying operation.
    pub fn after(f: impl Fn(&mut M) -> bool + Send + Sync + 'static) -> Self {
        Self {
            position: Position::After,
            target: Target::Plain(Arc::new(f)),
            options: CallbackOptions::new(),
        }
    }

    /// A callback wrapping the underlying operation. It must invoke the
    /// continuation to run the rest of the pipeline.
    pub fn around(
        f: impl Fn(&mut M, &mut dyn FnMut(&mut M) -> bool) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            position: Position::Around,
            target: Target::Around(Arc::new(f)),
            options: CallbackOptions::new(),
        }
    }

    /// Attach guard conditions.
    pub fn with_options(mut self, options: CallbackOptions<M>) -> Self {
        self.options = options;
        self
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

impl<M> fmt::Debug for Callback<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("position", &self.position)
            .field("options", &self.options)
            .finish()
    }
}

/// Chain behavior fixed at definition time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainSpec {
    /// When set, a `false` return from a before or around callback halts the
    /// chain: the underlying operation and after entries are skipped.
    pub terminable: bool,
}

/// An ordered callback chain for one lifecycle name.
pub struct Chain<M> {
    name: Lifecycle,
    terminable: bool,
    before: Vec<Callback<M>>,
    around: Vec<Callback<M>>,
    after: Vec<Callback<M>>,
}

impl<M> Chain<M> {
    fn new(name: Lifecycle, spec: ChainSpec) -> Self {
        Self {
            name,
            terminable: spec.terminable,
            before: Vec::new(),
            around: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Append an entry to its phase, preserving registration order.
    pub fn push(&mut self, callback: Callback<M>) {
        match callback.position {
            Position::Before => self.before.push(callback),
            Position::Around => self.around.push(callback),
            Position::After => self.after.push(callback),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.around.is_empty() && self.after.is_empty()
    }

    /// Execute the chain around the underlying operation.
    ///
    /// Returns `false` when a terminable chain was halted, otherwise the result
    /// of the underlying operation.
    pub fn run(
        &self,
        record: &mut M,
        ctx: &RunContext,
        op: &mut dyn FnMut(&mut M) -> bool,
    ) -> bool {
        trace!(chain = %self.name, "running callback chain");
        for callback in &self.before {
            if !callback.options.allows(record, ctx) {
                continue;
            }
            if let Target::Plain(f) = &callback.target {
                if !f(record) && self.terminable {
                    trace!(chain = %self.name, "chain terminated by before callback");
                    return false;
                }
            }
        }

        let result = self.run_arounds(0, record, ctx, op);
        if self.terminable && !result {
            return false;
        }

        for callback in &self.after {
            if !callback.options.allows(record, ctx) {
                continue;
            }
            if let Target::Plain(f) = &callback.target {
                f(record);
            }
        }
        result
    }

    fn run_arounds(
        &self,
        index: usize,
        record: &mut M,
        ctx: &RunContext,
        op: &mut dyn FnMut(&mut M) -> bool,
    ) -> bool {
        let Some(callback) = self.around.get(index) else {
            return op(record);
        };
        if !callback.options.allows(record, ctx) {
            return self.run_arounds(index + 1, record, ctx, op);
        }
        match &callback.target {
            Target::Around(f) => {
                f(record, &mut |r| self.run_arounds(index + 1, r, ctx, &mut *op))
            }
            Target::Plain(_) => self.run_arounds(index + 1, record, ctx, op),
        }
    }
}

impl<M> fmt::Debug for Chain<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("terminable", &self.terminable)
            .field("before", &self.before.len())
            .field("around", &self.around.len())
            .field("after", &self.after.len())
            .finish()
    }
}

/// The set of named chains a model type owns.
pub struct ChainSet<M> {
    chains: HashMap<Lifecycle, Chain<M>>,
}

impl<M> Default for ChainSet<M> {
    fn default() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }
}

impl<M> ChainSet<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty chain under the given name. Idempotent: re-defining an
    /// existing chain keeps it and its entries.
    pub fn define(&mut self, name: Lifecycle, spec: ChainSpec) {
        self.chains.entry(name).or_insert_with(|| Chain::new(name, spec));
    }

    /// Append a callback to a chain, defining the chain with default behavior
    /// if it does not exist yet.
    pub fn register(&mut self, name: Lifecycle, callback: Callback<M>) {
        self.chains
            .entry(name)
            .or_insert_with(|| Chain::new(name, ChainSpec::default()))
            .push(callback);
    }

    pub fn get(&self, name: Lifecycle) -> Option<&Chain<M>> {
        self.chains.get(&name)
    }

    /// Run a chain around the underlying operation. An undefined chain runs the
    /// operation unchanged.
    pub fn run(
        &self,
        name: Lifecycle,
        record: &mut M,
        ctx: &RunContext,
        op: &mut dyn FnMut(&mut M) -> bool,
    ) -> bool {
        match self.chains.get(&name) {
            Some(chain) => chain.run(record, ctx, op),
            None => op(record),
        }
    }
}

impl<M> fmt::Debug for ChainSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.chains.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Doc {
        log: Vec<&'static str>,
        saved: bool,
    }

    fn save_ctx() -> RunContext {
        RunContext::new(Lifecycle::Save)
    }

    #[test]
    fn empty_chain_runs_operation_unchanged() {
        let chain: Chain<Doc> = Chain::new(Lifecycle::Save, ChainSpec::default());
        let mut doc = Doc::default();
        let result = chain.run(&mut doc, &save_ctx(), &mut |d| {
            d.saved = true;
            true
        });
        assert!(result);
        assert!(doc.saved);
    }

    #[test]
    fn phases_run_in_registration_order() {
        let mut chain: Chain<Doc> = Chain::new(Lifecycle::Save, ChainSpec::default());
        chain.push(Callback::before(|d: &mut Doc| {
            d.log.push("before_1");
            true
        }));
        chain.push(Callback::before(|d: &mut Doc| {
            d.log.push("before_2");
            true
        }));
        chain.push(Callback::after(|d: &mut Doc| {
            d.log.push("after");
            true
        }));
        chain.push(Callback::around(|d: &mut Doc, cont| {
            d.log.push("around_in");
            let result = cont(d);
            d.log.push("around_out");
            result
        }));

        let mut doc = Doc::default();
        chain.run(&mut doc, &save_ctx(), &mut |d| {
            d.log.push("op");
            true
        });
        assert_eq!(
            doc.log,
            vec!["before_1", "before_2", "around_in", "op", "around_out", "after"]
        );
    }

    #[test]
    fn around_entries_nest() {
        let mut chain: Chain<Doc> = Chain::new(Lifecycle::Save, ChainSpec::default());
        chain.push(Callback::around(|d: &mut Doc, cont| {
            d.log.push("outer_in");
            let result = cont(d);
            d.log.push("outer_out");
            result
        }));
        chain.push(Callback::around(|d: &mut Doc, cont| {
            d.log.push("inner_in");
            let result = cont(d);
            d.log.push("inner_out");
            result
        }));

        let mut doc = Doc::default();
        chain.run(&mut doc, &save_ctx(), &mut |d| {
            d.log.push("op");
            true
        });
        assert_eq!(
            doc.log,
            vec!["outer_in", "inner_in", "op", "inner_out", "outer_out"]
        );
    }

    #[test]
    fn guarded_out_entries_are_skipped() {
        let mut chain: Chain<Doc> = Chain::new(Lifecycle::Save, ChainSpec::default());
        chain.push(
            Callback::before(|d: &mut Doc| {
                d.log.push("guarded");
                true
            })
            .with_options(CallbackOptions::new().when(|_, _| false)),
        );
        chain.push(Callback::before(|d: &mut Doc| {
            d.log.push("open");
            true
        }));

        let mut doc = Doc::default();
        chain.run(&mut doc, &save_ctx(), &mut |_| true);
        assert_eq!(doc.log, vec!["open"]);
    }

    #[test]
    fn unless_guard_inverts() {
        let mut chain: Chain<Doc> = Chain::new(Lifecycle::Save, ChainSpec::default());
        chain.push(
            Callback::before(|d: &mut Doc| {
                d.log.push("skipped");
                true
            })
            .with_options(CallbackOptions::new().unless(|_, _| true)),
        );

        let mut doc = Doc::default();
        chain.run(&mut doc, &save_ctx(), &mut |_| true);
        assert!(doc.log.is_empty());
    }

    #[test]
    fn terminable_chain_halts_on_false() {
        let mut chain: Chain<Doc> = Chain::new(Lifecycle::Validation, ChainSpec { terminable: true });
        chain.push(Callback::before(|_: &mut Doc| false));
        chain.push(Callback::after(|d: &mut Doc| {
            d.log.push("after");
            true
        }));

        let mut doc = Doc::default();
        let result = chain.run(&mut doc, &save_ctx(), &mut |d| {
            d.saved = true;
            true
        });
        assert!(!result);
        assert!(!doc.saved);
        assert!(doc.log.is_empty());
    }

    #[test]
    fn non_terminable_chain_ignores_false() {
        let mut chain: Chain<Doc> = Chain::new(Lifecycle::Save, ChainSpec::default());
        chain.push(Callback::before(|_: &mut Doc| false));

        let mut doc = Doc::default();
        let result = chain.run(&mut doc, &save_ctx(), &mut |d| {
            d.saved = true;
            true
        });
        assert!(result);
        assert!(doc.saved);
    }

    #[test]
    fn define_is_idempotent() {
        let mut chains: ChainSet<Doc> = ChainSet::new();
        chains.define(Lifecycle::Save, ChainSpec::default());
        chains.register(Lifecycle::Save, Callback::before(|_: &mut Doc| true));
        chains.define(Lifecycle::Save, ChainSpec::default());

        assert!(!chains.get(Lifecycle::Save).unwrap().is_empty());
    }

    #[test]
    fn on_restriction_compiles_to_guard() {
        let mut chain: Chain<Doc> = Chain::new(Lifecycle::Validate, ChainSpec::default());
        chain.push(
            Callback::before(|d: &mut Doc| {
                d.log.push("create_only");
                true
            })
            .with_options(CallbackOptions::new().on(Context::Create)),
        );

        let mut doc = Doc::default();
        let ctx = RunContext::with_context(Lifecycle::Validate, Context::Update);
        chain.run(&mut doc, &ctx, &mut |_| true);
        assert!(doc.log.is_empty());

        let ctx = RunContext::with_context(Lifecycle::Validate, Context::Create);
        chain.run(&mut doc, &ctx, &mut |_| true);
        assert_eq!(doc.log, vec!["create_only"]);
    }
}
