//! Filter model engine
//!
//! [`FilterModel`] owns the live [`FilterState`] of one filter and is the
//! only writer of it. Widgets read and write through the
//! [`FilterModelRef`] contract; per-field handlers hold a clone of the
//! model handle and an id, never a private copy of the state.
//!
//! Removing a field is a soft delete. The declared field set never changes
//! shape: a "removed" field is hidden and its value/operator are reset.
//!
//! ```rust
//! use sift_filter::builders::{number, text};
//! use sift_filter::prelude::*;
//!
//! let filter = FilterModel::builder()
//!     .field(text("name", "Alice", Operator::Includes).visible(true))
//!     .field(number("age", 25.0, Operator::Equals))
//!     .build()
//!     .unwrap();
//!
//! filter.add_field("age");
//! filter.patch_field_value("age", Some(FieldValue::Number(30.0)));
//!
//! let visible: Vec<String> = filter.fields_array().into_iter().map(|f| f.id).collect();
//! assert_eq!(visible, ["name", "age"]);
//! assert_eq!(filter.payload().len(), 2);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use sift_core::reactive::{
    run_deferred, shared_graph, Derived, Effect, ReactiveGraph, SharedGraph, State,
};

use crate::error::{FilterError, Result};
use crate::field::{
    FieldDescriptor, FieldMeta, FieldType, FieldValue, MinMax, NumericOptions, SelectOption,
};
use crate::operator::Operator;
use crate::parser::{parse_filter, FilterPayload};
use crate::registry::{FieldRegistry, FilterState};
use crate::resource::{ItemFormatter, ResourceOptions, ResourceRequest};

/// Read/write contract every field widget is written against
pub trait FilterModelRef {
    /// Snapshot of the whole live state
    fn value(&self) -> FilterState;

    /// Visible fields, ascending by `order`
    fn fields_array(&self) -> Vec<FieldDescriptor>;

    /// Hidden fields, in declaration order
    fn available_fields(&self) -> Vec<FieldDescriptor>;

    /// Restore the declared state, visibility included
    fn reset(&self);

    /// Hide every field, restoring each one's declared value and operator
    fn clear(&self);

    fn patch_field_operator(&self, id: &str, operator: Operator);

    fn patch_field_value(&self, id: &str, value: Option<FieldValue>);

    /// Soft-delete one field: hide it and null its value and operator
    fn clean_field(&self, id: &str);

    /// Show a declared field at the end of the visible list, seeded from
    /// its declared value and operator
    fn add_field(&self, id: &str);

    fn field_value(&self, id: &str) -> Result<Option<FieldValue>>;

    fn field_operator(&self, id: &str) -> Result<Option<Operator>>;

    /// Option list of a select or combobox
    fn field_options(&self, id: &str) -> Result<Vec<SelectOption>>;

    /// Number configuration; all `None` for other types
    fn field_numeric_options(&self, id: &str) -> Result<NumericOptions>;

    /// Bounds; both `None` for types without bounds
    fn field_min_max(&self, id: &str) -> Result<MinMax>;

    /// Only text fields can be required
    fn field_required(&self, id: &str) -> Result<bool>;

    fn field_placeholder(&self, id: &str) -> Result<Option<String>>;

    fn field_item_to_string(&self, id: &str) -> Result<ItemFormatter>;

    fn field_resource_options(&self, id: &str) -> Result<ResourceOptions>;

    fn field_resource_request(&self, id: &str) -> Result<ResourceRequest>;

    fn field_type(&self, id: &str) -> Result<FieldType>;

    /// Label, falling back to the id
    fn field_label(&self, id: &str) -> Result<String>;
}

struct ModelInner {
    base: FieldRegistry,
    state: State<FilterState>,
    /// Last order handed out by `add_field`
    next_order: Cell<u32>,
    fields_array: Derived<Vec<FieldDescriptor>>,
    available_fields: Derived<Vec<FieldDescriptor>>,
}

/// Reactive store over one filter's fields
///
/// Cloning is cheap and every clone addresses the same state.
#[derive(Clone)]
pub struct FilterModel {
    inner: Rc<ModelInner>,
}

impl FilterModel {
    /// Build a model on its own reactive graph
    pub fn new(fields: impl IntoIterator<Item = FieldDescriptor>) -> Result<Self> {
        Self::with_graph(&shared_graph(), fields)
    }

    /// Build a model on an existing graph
    pub fn with_graph(
        graph: &SharedGraph,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) -> Result<Self> {
        let base = FieldRegistry::new(fields)?;
        let state = State::new(graph, base.snapshot());
        let signal = state.signal();

        let (fields_array, available_fields) = {
            let mut g = graph.borrow_mut();
            let visible = g.create_derived(move |g| {
                g.with(signal, |s| {
                    let mut fields: Vec<FieldDescriptor> =
                        s.values().filter(|f| f.visible).cloned().collect();
                    fields.sort_by_key(|f| f.order);
                    fields
                })
                .unwrap_or_default()
            });
            let hidden = g.create_derived(move |g| {
                g.with(signal, |s| s.values().filter(|f| !f.visible).cloned().collect())
                    .unwrap_or_default()
            });
            (visible, hidden)
        };

        tracing::debug!(fields = base.len(), "filter model built");

        Ok(Self {
            inner: Rc::new(ModelInner {
                next_order: Cell::new(base.len() as u32),
                base,
                state,
                fields_array,
                available_fields,
            }),
        })
    }

    pub fn builder() -> FilterModelBuilder {
        FilterModelBuilder::default()
    }

    /// The declared fields
    pub fn base(&self) -> &FieldRegistry {
        &self.inner.base
    }

    /// Declared descriptor of a field
    pub fn base_field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.inner.base.get(id)
    }

    /// Declared value of a field
    pub fn base_value(&self, id: &str) -> Result<Option<FieldValue>> {
        self.inner
            .base
            .get(id)
            .map(|seed| seed.value.clone())
            .ok_or_else(|| FilterError::UnknownField(id.to_string()))
    }

    /// Declared operator of a field
    pub fn base_operator(&self, id: &str) -> Result<Option<Operator>> {
        self.inner
            .base
            .get(id)
            .map(|seed| seed.operator)
            .ok_or_else(|| FilterError::UnknownField(id.to_string()))
    }

    pub fn graph(&self) -> &SharedGraph {
        self.inner.state.graph()
    }

    /// Borrow the live state without cloning it
    pub fn with_value<R>(&self, f: impl FnOnce(&FilterState) -> R) -> Option<R> {
        self.inner.state.with(f)
    }

    /// Live copy of one descriptor
    pub fn field_descriptor(&self, id: &str) -> Result<FieldDescriptor> {
        self.read(id, FieldDescriptor::clone)
    }

    /// Parsed payload of the current state
    pub fn payload(&self) -> FilterPayload {
        self.with_value(parse_filter).unwrap_or_default()
    }

    /// Run `callback` now and after every state change
    ///
    /// The callback runs once the change is complete and may read or write
    /// the model. Changes made from inside a callback are delivered after
    /// it returns, in order.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&FilterState) + 'static,
    {
        let signal = self.inner.state.signal();
        let callback = Rc::new(RefCell::new(callback));
        let effect = self.graph().borrow_mut().create_effect(move |g| {
            if let Some(state) = g.get(signal) {
                let callback = Rc::clone(&callback);
                g.defer(move || {
                    let mut callback = callback.borrow_mut();
                    (&mut *callback)(&state);
                });
            }
        });
        run_deferred(self.graph());
        Subscription {
            graph: Rc::downgrade(self.graph()),
            effect: Some(effect),
        }
    }

    fn read<R>(&self, id: &str, f: impl FnOnce(&FieldDescriptor) -> R) -> Result<R> {
        self.with_value(|s| s.get(id).map(f))
            .flatten()
            .ok_or_else(|| FilterError::UnknownField(id.to_string()))
    }

    fn not_applicable(&self, field: &FieldDescriptor, what: &'static str) -> FilterError {
        FilterError::NotApplicable {
            id: field.id.clone(),
            field_type: field.field_type(),
            what,
        }
    }

    fn derived(&self, derived: Derived<Vec<FieldDescriptor>>) -> Vec<FieldDescriptor> {
        self.graph()
            .borrow_mut()
            .get_derived(derived)
            .unwrap_or_default()
    }
}

impl FilterModelRef for FilterModel {
    fn value(&self) -> FilterState {
        self.inner.state.get()
    }

    fn fields_array(&self) -> Vec<FieldDescriptor> {
        self.derived(self.inner.fields_array)
    }

    fn available_fields(&self) -> Vec<FieldDescriptor> {
        self.derived(self.inner.available_fields)
    }

    fn reset(&self) {
        self.inner.state.set(self.inner.base.snapshot());
        tracing::debug!("filter reset");
    }

    fn clear(&self) {
        let base = &self.inner.base;
        self.inner.state.update(|s| {
            for (id, field) in s.iter_mut() {
                if let Some(seed) = base.get(id) {
                    *field = FieldDescriptor {
                        visible: false,
                        order: 0,
                        ..seed.clone()
                    };
                }
            }
        });
        tracing::debug!("filter cleared");
    }

    fn patch_field_operator(&self, id: &str, operator: Operator) {
        if !self.inner.base.contains(id) {
            tracing::trace!(field = id, "ignoring operator patch for unknown field");
            return;
        }
        self.inner.state.update(|s| {
            if let Some(field) = s.get_mut(id) {
                field.operator = Some(operator);
            }
        });
        tracing::debug!(field = id, %operator, "operator patched");
    }

    fn patch_field_value(&self, id: &str, value: Option<FieldValue>) {
        let Some(field_type) = self.inner.base.get(id).map(FieldDescriptor::field_type) else {
            tracing::trace!(field = id, "ignoring value patch for unknown field");
            return;
        };
        if let Some(v) = &value {
            if !v.accepts(field_type) {
                tracing::warn!(
                    field = id,
                    %field_type,
                    value = ?v,
                    "ignoring value of the wrong shape"
                );
                return;
            }
        }
        self.inner.state.update(|s| {
            if let Some(field) = s.get_mut(id) {
                field.value = value;
            }
        });
        tracing::debug!(field = id, "value patched");
    }

    fn clean_field(&self, id: &str) {
        if !self.inner.base.contains(id) {
            tracing::trace!(field = id, "ignoring clean for unknown field");
            return;
        }
        self.inner.state.update(|s| {
            if let Some(field) = s.get_mut(id) {
                // Date widgets need a concrete day to render
                field.value = match field.field_type() {
                    FieldType::Date => Some(FieldValue::Date(chrono::Local::now().naive_local())),
                    _ => None,
                };
                field.operator = None;
                field.visible = false;
            }
        });
        tracing::debug!(field = id, "field cleaned");
    }

    fn add_field(&self, id: &str) {
        let Some(seed) = self.inner.base.get(id) else {
            tracing::trace!(field = id, "ignoring add for unknown field");
            return;
        };
        let order = self.inner.next_order.get() + 1;
        self.inner.next_order.set(order);
        let added = FieldDescriptor {
            order,
            visible: true,
            ..seed.clone()
        };
        self.inner.state.update(|s| {
            s.insert(id.to_string(), added);
        });
        tracing::debug!(field = id, order, "field added");
    }

    fn field_value(&self, id: &str) -> Result<Option<FieldValue>> {
        self.read(id, |f| f.value.clone())
    }

    fn field_operator(&self, id: &str) -> Result<Option<Operator>> {
        self.read(id, |f| f.operator)
    }

    fn field_options(&self, id: &str) -> Result<Vec<SelectOption>> {
        self.read(id, |f| match f.meta.options() {
            Some(options) => Ok(options.to_vec()),
            None => Err(self.not_applicable(f, "options")),
        })?
    }

    fn field_numeric_options(&self, id: &str) -> Result<NumericOptions> {
        self.read(id, |f| match f.meta {
            FieldMeta::Number { min, max, step } => NumericOptions { min, max, step },
            _ => NumericOptions::default(),
        })
    }

    fn field_min_max(&self, id: &str) -> Result<MinMax> {
        self.read(id, |f| f.meta.min_max().unwrap_or_default())
    }

    fn field_required(&self, id: &str) -> Result<bool> {
        self.read(id, |f| matches!(f.meta, FieldMeta::Text { required: true, .. }))
    }

    fn field_placeholder(&self, id: &str) -> Result<Option<String>> {
        let slot = self.read(id, |f| f.meta.placeholder().map(|p| p.map(str::to_string)))?;
        Ok(match slot {
            Some(placeholder) => placeholder,
            // Types without a placeholder hint at their declared value
            None => self.base_value(id)?.map(|value| value.to_string()),
        })
    }

    fn field_item_to_string(&self, id: &str) -> Result<ItemFormatter> {
        self.read(id, |f| match &f.meta {
            FieldMeta::AsyncCombobox { item_to_string, .. } => item_to_string.clone(),
            _ => ItemFormatter::default(),
        })
    }

    fn field_resource_options(&self, id: &str) -> Result<ResourceOptions> {
        self.read(id, |f| match &f.meta {
            FieldMeta::AsyncCombobox {
                resource_options: Some(options),
                ..
            } => Ok(options.clone()),
            FieldMeta::AsyncCombobox { .. } => Err(self.not_applicable(f, "resource options")),
            _ => Err(self.not_applicable(f, "async resource")),
        })?
    }

    fn field_resource_request(&self, id: &str) -> Result<ResourceRequest> {
        self.read(id, |f| match &f.meta {
            FieldMeta::AsyncCombobox {
                request: Some(request),
                ..
            } => Ok(request.clone()),
            FieldMeta::AsyncCombobox { .. } => Err(self.not_applicable(f, "resource request")),
            _ => Err(self.not_applicable(f, "async resource")),
        })?
    }

    fn field_type(&self, id: &str) -> Result<FieldType> {
        self.read(id, FieldDescriptor::field_type)
    }

    fn field_label(&self, id: &str) -> Result<String> {
        self.read(id, |f| f.display_label().to_string())
    }
}

impl fmt::Debug for FilterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterModel")
            .field("fields", &self.inner.base.len())
            .field("next_order", &self.inner.next_order.get())
            .finish()
    }
}

/// Collects fields for a [`FilterModel`]
#[derive(Default)]
pub struct FilterModelBuilder {
    fields: Vec<FieldDescriptor>,
    graph: Option<SharedGraph>,
}

impl FilterModelBuilder {
    /// Declare the next field; declaration order is display order
    pub fn field(mut self, field: impl Into<FieldDescriptor>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Place the model on an existing reactive graph
    pub fn graph(mut self, graph: &SharedGraph) -> Self {
        self.graph = Some(Rc::clone(graph));
        self
    }

    pub fn build(self) -> Result<FilterModel> {
        match self.graph {
            Some(graph) => FilterModel::with_graph(&graph, self.fields),
            None => FilterModel::new(self.fields),
        }
    }
}

/// Keeps a [`FilterModel::subscribe`] callback alive
///
/// Dropping it stops notifications.
pub struct Subscription {
    graph: Weak<RefCell<ReactiveGraph>>,
    effect: Option<Effect>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.dispose();
    }

    fn dispose(&mut self) {
        let Some(effect) = self.effect.take() else {
            return;
        };
        if let Some(graph) = self.graph.upgrade() {
            if let Ok(mut graph) = graph.try_borrow_mut() {
                graph.dispose_effect(effect);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}
