//! Model naming and translation-key conventions.
//!
//! The host localization layer resolves error messages and attribute labels by
//! walking a fallback chain of keys. This module supplies the library's i18n
//! namespace, the per-model [`ModelName`] data, and the key-building convention.

use serde::{Deserialize, Serialize};

/// The namespace identifying this library's translations.
pub const I18N_SCOPE: &str = "modelkit";

/// Get the i18n scope for message lookup.
pub fn i18n_scope() -> &'static str {
    I18N_SCOPE
}

/// Naming data derived from a model type's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelName {
    /// The type name as declared, e.g. `BlogPost`.
    pub name: String,
    /// Snake-cased singular form, e.g. `blog_post`.
    pub singular: String,
    /// Human-readable form, e.g. `Blog post`.
    pub human: String,
    /// Key used in translation lookups.
    pub i18n_key: String,
}

impl ModelName {
    /// Derive naming data from a type name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let singular = snake_case(&name);
        let human = humanize(&singular);
        let i18n_key = singular.clone();
        Self {
            name,
            singular,
            human,
            i18n_key,
        }
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Model-naming capability, most useful for building translation fallbacks.
pub trait Naming {
    /// The naming data for this type.
    fn model_name() -> ModelName;

    /// Every ancestor exposing a model name, most specific first.
    ///
    /// Types with no declared ancestry report only themselves.
    fn lookup_ancestors() -> Vec<ModelName> {
        vec![Self::model_name()]
    }
}

/// Build the ordered fallback chain of translation keys for an error message.
///
/// One key per ancestor, most specific first, followed by the library-wide
/// default key for the error kind.
pub fn translation_keys(ancestors: &[ModelName], attribute: &str, kind: &str) -> Vec<String> {
    let mut keys: Vec<String> = ancestors
        .iter()
        .map(|model| {
            format!(
                "{I18N_SCOPE}.errors.models.{}.attributes.{attribute}.{kind}",
                model.i18n_key
            )
        })
        .collect();
    keys.push(format!("{I18N_SCOPE}.errors.messages.{kind}"));
    keys
}

pub(crate) fn snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub(crate) fn humanize(s: &str) -> String {
    let spaced = s.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
