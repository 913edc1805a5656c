//! Mock record used by unit tests across modules.

use serde_json::{json, Value};
use std::cell::Cell;
use std::collections::HashMap;

use crate::record::{AttributeCriterion, ModelState, Record};

#[derive(Default)]
pub(crate) struct MockRecord {
    pub attrs: HashMap<String, Value>,
    pub changed: Vec<String>,
    pub pk: Option<Value>,
    pub persisted: bool,
    /// Existing rows visible to uniqueness queries; `id` plays the pk column.
    pub rows: Vec<HashMap<String, Value>>,
    pub queries: Cell<usize>,
    pub state: ModelState,
}

impl MockRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: Value) -> Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    pub fn persisted_with_pk(mut self, pk: i64) -> Self {
        self.pk = Some(json!(pk));
        self.persisted = true;
        self
    }

    pub fn mark_changed(mut self, name: &str) -> Self {
        self.changed.push(name.to_string());
        self
    }

    pub fn row(mut self, pairs: &[(&str, Value)]) -> Self {
        let row = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        self.rows.push(row);
        self
    }
}

impl Record for MockRecord {
    fn read_attribute(&self, name: &str) -> Value {
        self.attrs.get(name).cloned().unwrap_or(Value::Null)
    }

    fn changed_attributes(&self) -> Vec<String> {
        self.changed.clone()
    }

    fn primary_key(&self) -> Option<Value> {
        self.pk.clone()
    }

    fn is_new(&self) -> bool {
        !self.persisted
    }

    fn count_matching(
        &self,
        criteria: &[AttributeCriterion],
        excluding_pk: Option<&Value>,
    ) -> u64 {
        self.queries.set(self.queries.get() + 1);
        self.rows
            .iter()
            .filter(|row| {
                if let Some(excluded) = excluding_pk {
                    if row.get("id") == Some(excluded) {
                        return false;
                    }
                }
                criteria.iter().all(|criterion| {
                    let stored = row
                        .get(&criterion.attribute)
                        .cloned()
                        .unwrap_or(Value::Null);
                    if !criterion.case_sensitive {
                        if let (Value::String(a), Value::String(b)) = (&stored, &criterion.value)
                        {
                            return a.to_lowercase() == b.to_lowercase();
                        }
                    }
                    stored == criterion.value
                })
            })
            .count() as u64
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}
