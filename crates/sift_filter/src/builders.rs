//! Field descriptor builders
//!
//! One builder function per field type, each taking the id, the initial
//! value and the initial operator, followed by chainable option setters:
//!
//! ```rust
//! use sift_filter::builders::{boolean, number, select, text};
//! use sift_filter::{FieldDescriptor, Operator, SelectOption};
//!
//! let fields: Vec<FieldDescriptor> = vec![
//!     text("name", "", Operator::Includes).required(true).visible(true).into(),
//!     number("age", 0.0, Operator::GreaterThan).min(0.0).max(120.0).step(1.0).into(),
//!     boolean("isActive", Some(true)).into(),
//!     select("role", None, Operator::Is)
//!         .option(SelectOption::new("admin", "Admin"))
//!         .option(SelectOption::new("user", "User"))
//!         .into(),
//! ];
//! assert!(fields.iter().all(|f| f.order == 0));
//! ```
//!
//! Builders are pure. They copy their options verbatim and check nothing
//! across fields: bounds are not compared with the value, ids are not
//! checked for uniqueness (the registry does that).

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::field::{FieldDescriptor, FieldMeta, FieldValue, SelectOption};
use crate::operator::Operator;
use crate::resource::{ItemFormatter, ResourceOptions, ResourceRequest};

/// Settings every field type shares
#[derive(Clone, Debug)]
struct Common {
    id: String,
    label: Option<String>,
    visible: bool,
}

impl Common {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            visible: false,
        }
    }

    fn into_descriptor(
        self,
        value: Option<FieldValue>,
        operator: Option<Operator>,
        meta: FieldMeta,
    ) -> FieldDescriptor {
        FieldDescriptor {
            id: self.id,
            label: self.label,
            value,
            operator,
            order: 0,
            visible: self.visible,
            meta,
        }
    }
}

macro_rules! common_setters {
    ($builder:ident) => {
        impl $builder {
            /// Show the field when the filter is first built
            pub fn visible(mut self, visible: bool) -> Self {
                self.common.visible = visible;
                self
            }

            /// Label shown instead of the id
            pub fn label(mut self, label: impl Into<String>) -> Self {
                self.common.label = Some(label.into());
                self
            }

            pub fn build(self) -> FieldDescriptor {
                self.into()
            }
        }
    };
}

// ============================================================================
// Text
// ============================================================================

#[derive(Clone, Debug)]
pub struct TextField {
    common: Common,
    value: String,
    operator: Operator,
    required: bool,
    placeholder: Option<String>,
}

common_setters!(TextField);

impl TextField {
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

impl From<TextField> for FieldDescriptor {
    fn from(b: TextField) -> Self {
        b.common.into_descriptor(
            Some(FieldValue::Text(b.value)),
            Some(b.operator),
            FieldMeta::Text {
                required: b.required,
                placeholder: b.placeholder,
            },
        )
    }
}

/// Free-text field
pub fn text(id: impl Into<String>, value: impl Into<String>, operator: Operator) -> TextField {
    TextField {
        common: Common::new(id),
        value: value.into(),
        operator,
        required: false,
        placeholder: None,
    }
}

// ============================================================================
// Number
// ============================================================================

#[derive(Clone, Debug)]
pub struct NumberField {
    common: Common,
    value: f64,
    operator: Operator,
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
}

common_setters!(NumberField);

impl NumberField {
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }
}

impl From<NumberField> for FieldDescriptor {
    fn from(b: NumberField) -> Self {
        b.common.into_descriptor(
            Some(FieldValue::Number(b.value)),
            Some(b.operator),
            FieldMeta::Number {
                min: b.min,
                max: b.max,
                step: b.step,
            },
        )
    }
}

pub fn number(id: impl Into<String>, value: f64, operator: Operator) -> NumberField {
    NumberField {
        common: Common::new(id),
        value,
        operator,
        min: None,
        max: None,
        step: None,
    }
}

// ============================================================================
// Boolean
// ============================================================================

#[derive(Clone, Debug)]
pub struct BooleanField {
    common: Common,
    value: Option<bool>,
}

common_setters!(BooleanField);

impl From<BooleanField> for FieldDescriptor {
    fn from(b: BooleanField) -> Self {
        b.common.into_descriptor(
            b.value.map(FieldValue::Boolean),
            Some(Operator::Is),
            FieldMeta::Boolean,
        )
    }
}

/// Boolean field
///
/// Takes no operator: boolean fields always compare with `is`, since
/// "is not false" style double negatives only confuse.
pub fn boolean(id: impl Into<String>, value: Option<bool>) -> BooleanField {
    BooleanField {
        common: Common::new(id),
        value,
    }
}

// ============================================================================
// Date and time
// ============================================================================

#[derive(Clone, Debug)]
pub struct DateField {
    common: Common,
    value: NaiveDateTime,
    operator: Operator,
    min: Option<NaiveDateTime>,
    max: Option<NaiveDateTime>,
}

common_setters!(DateField);

impl DateField {
    pub fn min(mut self, min: NaiveDateTime) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: NaiveDateTime) -> Self {
        self.max = Some(max);
        self
    }
}

impl From<DateField> for FieldDescriptor {
    fn from(b: DateField) -> Self {
        b.common.into_descriptor(
            Some(FieldValue::Date(b.value)),
            Some(b.operator),
            FieldMeta::Date {
                min: b.min,
                max: b.max,
            },
        )
    }
}

/// Calendar date field; its value is never null
pub fn date(id: impl Into<String>, value: NaiveDateTime, operator: Operator) -> DateField {
    DateField {
        common: Common::new(id),
        value,
        operator,
        min: None,
        max: None,
    }
}

#[derive(Clone, Debug)]
pub struct TimeField {
    common: Common,
    value: NaiveDateTime,
    operator: Operator,
    min: Option<NaiveDateTime>,
    max: Option<NaiveDateTime>,
}

common_setters!(TimeField);

impl TimeField {
    pub fn min(mut self, min: NaiveDateTime) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: NaiveDateTime) -> Self {
        self.max = Some(max);
        self
    }
}

impl From<TimeField> for FieldDescriptor {
    fn from(b: TimeField) -> Self {
        b.common.into_descriptor(
            Some(FieldValue::Time(b.value)),
            Some(b.operator),
            FieldMeta::Time {
                min: b.min,
                max: b.max,
            },
        )
    }
}

/// Time-of-day field, stored as a full timestamp
pub fn time(id: impl Into<String>, value: NaiveDateTime, operator: Operator) -> TimeField {
    TimeField {
        common: Common::new(id),
        value,
        operator,
        min: None,
        max: None,
    }
}

// ============================================================================
// Select and combobox
// ============================================================================

#[derive(Clone, Debug)]
pub struct SelectField {
    common: Common,
    value: Option<String>,
    operator: Operator,
    options: Vec<SelectOption>,
}

common_setters!(SelectField);

impl SelectField {
    pub fn option(mut self, option: SelectOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = SelectOption>) -> Self {
        self.options.extend(options);
        self
    }
}

impl From<SelectField> for FieldDescriptor {
    fn from(b: SelectField) -> Self {
        b.common.into_descriptor(
            b.value.map(FieldValue::Choice),
            Some(b.operator),
            FieldMeta::Select { options: b.options },
        )
    }
}

pub fn select(id: impl Into<String>, value: Option<String>, operator: Operator) -> SelectField {
    SelectField {
        common: Common::new(id),
        value,
        operator,
        options: Vec::new(),
    }
}

#[derive(Clone, Debug)]
pub struct ComboboxField {
    common: Common,
    value: String,
    operator: Operator,
    options: Vec<SelectOption>,
    placeholder: Option<String>,
}

common_setters!(ComboboxField);

impl ComboboxField {
    pub fn option(mut self, option: SelectOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = SelectOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

impl From<ComboboxField> for FieldDescriptor {
    fn from(b: ComboboxField) -> Self {
        b.common.into_descriptor(
            Some(FieldValue::Choice(b.value)),
            Some(b.operator),
            FieldMeta::Combobox {
                options: b.options,
                placeholder: b.placeholder,
            },
        )
    }
}

/// Searchable select over a static option list
pub fn combobox(
    id: impl Into<String>,
    value: impl Into<String>,
    operator: Operator,
) -> ComboboxField {
    ComboboxField {
        common: Common::new(id),
        value: value.into(),
        operator,
        options: Vec::new(),
        placeholder: None,
    }
}

#[derive(Clone, Debug)]
pub struct AsyncComboboxField {
    common: Common,
    value: Option<Value>,
    operator: Operator,
    placeholder: Option<String>,
    request: Option<ResourceRequest>,
    resource_options: Option<ResourceOptions>,
    item_to_string: ItemFormatter,
}

common_setters!(AsyncComboboxField);

impl AsyncComboboxField {
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Request descriptor; its URL may embed [`QUERY_TOKEN`](crate::resource::QUERY_TOKEN)
    pub fn request(mut self, request: ResourceRequest) -> Self {
        self.request = Some(request);
        self
    }

    pub fn resource_options(mut self, options: ResourceOptions) -> Self {
        self.resource_options = Some(options);
        self
    }

    /// Label function for fetched items
    pub fn item_to_string<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + 'static,
    {
        self.item_to_string = ItemFormatter::new(f);
        self
    }
}

impl From<AsyncComboboxField> for FieldDescriptor {
    fn from(b: AsyncComboboxField) -> Self {
        b.common.into_descriptor(
            b.value.map(FieldValue::Item),
            Some(b.operator),
            FieldMeta::AsyncCombobox {
                placeholder: b.placeholder,
                request: b.request,
                resource_options: b.resource_options,
                item_to_string: b.item_to_string,
            },
        )
    }
}

/// Combobox whose options come from a network resource
pub fn async_combobox(
    id: impl Into<String>,
    value: Option<Value>,
    operator: Operator,
) -> AsyncComboboxField {
    AsyncComboboxField {
        common: Common::new(id),
        value,
        operator,
        placeholder: None,
        request: None,
        resource_options: None,
        item_to_string: ItemFormatter::default(),
    }
}

// ============================================================================
// Ranges
// ============================================================================

#[derive(Clone, Debug)]
pub struct RangeField {
    common: Common,
    value: Option<(f64, f64)>,
    operator: Operator,
    min: Option<f64>,
    max: Option<f64>,
}

common_setters!(RangeField);

impl RangeField {
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

impl From<RangeField> for FieldDescriptor {
    fn from(b: RangeField) -> Self {
        b.common.into_descriptor(
            b.value.map(|(min, max)| FieldValue::Range { min, max }),
            Some(b.operator),
            FieldMeta::Range {
                min: b.min,
                max: b.max,
            },
        )
    }
}

/// Numeric range field; `value` is `(low, high)`
pub fn range(id: impl Into<String>, value: Option<(f64, f64)>, operator: Operator) -> RangeField {
    RangeField {
        common: Common::new(id),
        value,
        operator,
        min: None,
        max: None,
    }
}

#[derive(Clone, Debug)]
pub struct DateRangeField {
    common: Common,
    start: NaiveDateTime,
    end: NaiveDateTime,
    operator: Operator,
    min: Option<NaiveDateTime>,
    max: Option<NaiveDateTime>,
}

common_setters!(DateRangeField);

impl DateRangeField {
    pub fn min(mut self, min: NaiveDateTime) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: NaiveDateTime) -> Self {
        self.max = Some(max);
        self
    }
}

impl From<DateRangeField> for FieldDescriptor {
    fn from(b: DateRangeField) -> Self {
        b.common.into_descriptor(
            Some(FieldValue::DateRange {
                start: b.start,
                end: b.end,
            }),
            Some(b.operator),
            FieldMeta::DateRange {
                min: b.min,
                max: b.max,
            },
        )
    }
}

pub fn date_range(
    id: impl Into<String>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    operator: Operator,
) -> DateRangeField {
    DateRangeField {
        common: Common::new(id),
        start,
        end,
        operator,
        min: None,
        max: None,
    }
}
