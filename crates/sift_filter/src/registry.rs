//! Base registry
//!
//! The declared fields, captured once when a filter is built. The model
//! restores from it on `reset`, `clear` and `add_field`; nothing mutates it
//! afterwards.

use indexmap::IndexMap;

use crate::error::{FilterError, Result};
use crate::field::FieldDescriptor;

/// Live field map keyed by id, in declaration order
pub type FilterState = IndexMap<String, FieldDescriptor>;

/// Immutable, ordered snapshot of the declared fields
#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    fields: FilterState,
}

impl FieldRegistry {
    /// Index `fields` by id
    ///
    /// Each descriptor's `order` becomes its declaration position. Ids must
    /// be unique.
    pub fn new(fields: impl IntoIterator<Item = FieldDescriptor>) -> Result<Self> {
        let mut map = FilterState::new();
        for (position, mut field) in fields.into_iter().enumerate() {
            if map.contains_key(&field.id) {
                return Err(FilterError::DuplicateField(field.id));
            }
            field.order = position as u32;
            map.insert(field.id.clone(), field);
        }
        Ok(Self { fields: map })
    }

    pub fn get(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fields.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A fresh copy of the initial state
    pub fn snapshot(&self) -> FilterState {
        self.fields.clone()
    }
}
