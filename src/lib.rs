//! # modelkit
//!
//! ORM adapter glue: lifecycle callback chains, declarative validations, and
//! naming/translation conventions for model types.
//!
//! A host ORM implements [`Record`] for its model instances, builds one
//! [`ModelClass`] per model type at definition time, and threads its own
//! save/create/update/destroy operations through the class's run-time entry
//! points.
//!
//! ## Example
//!
//! ```rust,ignore
//! use modelkit::prelude::*;
//! use serde_json::json;
//!
//! let mut class = ModelClass::<User>::new("User");
//! class.before(Lifecycle::Save, |user: &mut User| {
//!     user.touch();
//!     true
//! });
//! class.validates(
//!     &["email"],
//!     RuleSpecs::new()
//!         .rule("presence", true)
//!         .rule("uniqueness", RuleOptions::new().case_sensitive(false)),
//! )?;
//!
//! let mut user = User::new();
//! if class.valid(&mut user, Some(Context::Create)) {
//!     class.create(&mut user, &mut |u| u.insert_row());
//! } else {
//!     for message in user.errors().full_messages() {
//!         eprintln!("{message}");
//!     }
//! }
//! ```
//!
//! ## Built-in rule kinds
//!
//! - `presence` - value must not be blank
//! - `format` - string must match a regex pattern
//! - `length` - string/array length bounds or exact membership
//! - `inclusion` / `exclusion` - value membership in a set or range
//! - `numericality` - value must be numeric
//! - `uniqueness` - value must be unique among persisted records
//!
//! Custom kinds register through
//! [`ModelClass::register_rule_kind`] and resolve in `validates` like the
//! built-ins.

pub mod callbacks;
pub mod context;
pub mod error;
pub mod model;
pub mod naming;
pub mod record;
pub mod validations;

#[cfg(test)]
pub(crate) mod test_support;

pub use callbacks::{Callback, CallbackOptions, Chain, ChainSet, ChainSpec, Position};
pub use context::{Context, Lifecycle, RunContext};
pub use error::ConfigurationError;
pub use model::ModelClass;
pub use naming::{i18n_scope, translation_keys, ModelName, Naming};
pub use record::{AttributeCriterion, ModelState, Record};
pub use validations::{
    is_blank, Argument, ErrorEntry, Errors, Membership, Rule, RuleOptions, RuleSpecs, RuleTable,
    Shorthand, BASE,
};

/// Common imports for hosts wiring up the adapters.
pub mod prelude {
    pub use crate::callbacks::CallbackOptions;
    pub use crate::context::{Context, Lifecycle};
    pub use crate::error::ConfigurationError;
    pub use crate::model::ModelClass;
    pub use crate::naming::{ModelName, Naming};
    pub use crate::record::{AttributeCriterion, ModelState, Record};
    pub use crate::validations::{Errors, Rule, RuleOptions, RuleSpecs};
}
