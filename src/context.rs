//! Lifecycle names and the per-run execution context.

use serde::{Deserialize, Serialize};

/// Named callback chains a model type owns.
///
/// The first five are wired to the host ORM's lifecycle entry points; `Validate`
/// holds the registered validator rules and user validation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Save,
    Create,
    Update,
    Destroy,
    Validation,
    Validate,
}

impl Lifecycle {
    /// Get the chain name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Lifecycle::Save => "save",
            Lifecycle::Create => "create",
            Lifecycle::Update => "update",
            Lifecycle::Destroy => "destroy",
            Lifecycle::Validation => "validation",
            Lifecycle::Validate => "validate",
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lifecycle context restricting when a callback or rule applies (the `on` option).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    /// Applies when creating new records.
    Create,
    /// Applies when updating existing records.
    Update,
    /// Custom context with a name.
    Custom(String),
}

impl Context {
    /// Create a custom context.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Get the context name as a string.
    pub fn name(&self) -> &str {
        match self {
            Context::Create => "create",
            Context::Update => "update",
            Context::Custom(name) => name,
        }
    }
}

impl From<&str> for Context {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "create" => Context::Create,
            "update" => Context::Update,
            other => Context::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Execution context passed to every guard while a chain runs.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// The chain currently executing.
    pub lifecycle: Lifecycle,
    /// The lifecycle context of the current operation, if any.
    pub context: Option<Context>,
}

impl RunContext {
    /// Create a run context with no lifecycle context.
    pub fn new(lifecycle: Lifecycle) -> Self {
        Self {
            lifecycle,
            context: None,
        }
    }

    /// Create a run context for a specific lifecycle context.
    pub fn with_context(lifecycle: Lifecycle, context: Context) -> Self {
        Self {
            lifecycle,
            context: Some(context),
        }
    }

    /// Check whether this run satisfies an `on` restriction.
    ///
    /// An empty restriction always matches. A non-empty restriction matches only
    /// when the current operation carries one of the allowed contexts.
    pub fn matches(&self, allowed: &[Context]) -> bool {
        if allowed.is_empty() {
            return true;
        }
        match &self.context {
            Some(context) => allowed.contains(context),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_from_str() {
        assert_eq!(Context::from("create"), Context::Create);
        assert_eq!(Context::from("update"), Context::Update);
        assert_eq!(
            Context::from("import"),
            Context::Custom("import".to_string())
        );
    }

    #[test]
    fn empty_restriction_always_matches() {
        let ctx = RunContext::new(Lifecycle::Validate);
        assert!(ctx.matches(&[]));

        let ctx = RunContext::with_context(Lifecycle::Validate, Context::Update);
        assert!(ctx.matches(&[]));
    }

    #[test]
    fn restriction_requires_matching_context() {
        let allowed = [Context::Create];

        let ctx = RunContext::with_context(Lifecycle::Validate, Context::Create);
        assert!(ctx.matches(&allowed));

        let ctx = RunContext::with_context(Lifecycle::Validate, Context::Update);
        assert!(!ctx.matches(&allowed));

        // No context at all never satisfies a restriction.
        let ctx = RunContext::new(Lifecycle::Validate);
        assert!(!ctx.matches(&allowed));
    }

    #[test]
    fn context_serialization() {
        let json = serde_json::to_string(&Context::Create).unwrap();
        assert_eq!(json, "\"create\"");

        let parsed: Context = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Context::Create);
    }
}
