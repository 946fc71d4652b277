//! Field descriptors
//!
//! A [`FieldDescriptor`] is one declared filter field: its identity, its
//! live value and operator, its place among the visible fields, and the
//! type-specific metadata fixed at construction.
//!
//! The type tag is never stored on its own. It is derived from the
//! [`FieldMeta`] variant, so a descriptor's tag and its metadata cannot
//! disagree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::operator::{
    Operator, BOOLEAN_OPERATORS, EQUALITY_OPERATORS, IDENTITY_OPERATORS, RANGE_OPERATORS,
    TEXT_OPERATORS, TIME_OPERATORS,
};
use crate::resource::{ItemFormatter, ResourceOptions, ResourceRequest};

/// Closed set of field kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "combobox")]
    Combobox,
    #[serde(rename = "asyncCombobox")]
    AsyncCombobox,
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "daterange")]
    DateRange,
}

impl FieldType {
    pub fn all() -> &'static [FieldType] {
        &[
            FieldType::Text,
            FieldType::Number,
            FieldType::Boolean,
            FieldType::Date,
            FieldType::Time,
            FieldType::Select,
            FieldType::Combobox,
            FieldType::AsyncCombobox,
            FieldType::Range,
            FieldType::DateRange,
        ]
    }

    /// Tag name as used on the wire and in form ids
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Select => "select",
            FieldType::Combobox => "combobox",
            FieldType::AsyncCombobox => "asyncCombobox",
            FieldType::Range => "range",
            FieldType::DateRange => "daterange",
        }
    }

    /// Operators a widget of this type offers
    pub fn operators(&self) -> &'static [Operator] {
        match self {
            FieldType::Text => TEXT_OPERATORS,
            FieldType::Number => EQUALITY_OPERATORS,
            FieldType::Boolean => BOOLEAN_OPERATORS,
            FieldType::Date | FieldType::Time => TIME_OPERATORS,
            FieldType::Select | FieldType::Combobox | FieldType::AsyncCombobox => {
                IDENTITY_OPERATORS
            }
            FieldType::Range | FieldType::DateRange => RANGE_OPERATORS,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FilterError::UnknownFieldType(s.to_string()))
    }
}

/// A non-null field value
///
/// "No value entered" is `Option<FieldValue>::None`. Serializes to the
/// plain JSON value, without a tag.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDateTime),
    Time(NaiveDateTime),
    /// Selected option value of a select or combobox
    Choice(String),
    /// Item picked from an async combobox
    Item(serde_json::Value),
    Range { min: f64, max: f64 },
    DateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl FieldValue {
    /// Whether a field of `field_type` stores this shape
    ///
    /// Non-finite numbers are never accepted; they have no JSON form.
    pub fn accepts(&self, field_type: FieldType) -> bool {
        let finite = match self {
            FieldValue::Number(n) => n.is_finite(),
            FieldValue::Range { min, max } => min.is_finite() && max.is_finite(),
            _ => true,
        };
        if !finite {
            return false;
        }
        matches!(
            (field_type, self),
            (FieldType::Text, FieldValue::Text(_))
                | (FieldType::Number, FieldValue::Number(_))
                | (FieldType::Boolean, FieldValue::Boolean(_))
                | (FieldType::Date, FieldValue::Date(_))
                | (FieldType::Time, FieldValue::Time(_))
                | (FieldType::Select, FieldValue::Choice(_))
                | (FieldType::Combobox, FieldValue::Choice(_))
                | (FieldType::AsyncCombobox, FieldValue::Item(_))
                | (FieldType::Range, FieldValue::Range { .. })
                | (FieldType::DateRange, FieldValue::DateRange { .. })
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => Some(s),
            FieldValue::Item(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Date or time value
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Date(d) | FieldValue::Time(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            FieldValue::Range { min, max } => Some((*min, *max)),
            _ => None,
        }
    }

    pub fn as_date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match self {
            FieldValue::DateRange { start, end } => Some((*start, *end)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Time(d) => write!(f, "{}", d.format("%H:%M:%S")),
            FieldValue::Item(serde_json::Value::String(s)) => f.write_str(s),
            FieldValue::Item(v) => write!(f, "{v}"),
            FieldValue::Range { min, max } => write!(f, "{min}..{max}"),
            FieldValue::DateRange { start, end } => write!(
                f,
                "{}..{}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
        }
    }
}

/// An entry of a select or combobox option list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Label shown in the list
    pub label: String,
    /// Value stored when the option is picked
    pub value: serde_json::Value,
}

impl SelectOption {
    pub fn new(value: impl Into<serde_json::Value>, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Whether this option is the stored choice
    ///
    /// Choices are stored as text, so a non-string option value matches
    /// its JSON rendering (`1`, `true`).
    pub fn matches(&self, choice: &str) -> bool {
        match &self.value {
            serde_json::Value::String(s) => s == choice,
            serde_json::Value::Null => false,
            other => other.to_string() == choice,
        }
    }
}

/// A lower or upper bound of a bounded field
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bound {
    Number(f64),
    DateTime(NaiveDateTime),
}

/// Bounds of a number, date, time, range or date-range field
///
/// Both ends are `None` for fields without bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MinMax {
    pub min: Option<Bound>,
    pub max: Option<Bound>,
}

/// Numeric configuration of a number field
///
/// All `None` for every other field type.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NumericOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

/// Type-specific metadata, immutable after construction
#[derive(Clone, Debug, PartialEq)]
pub enum FieldMeta {
    Text {
        required: bool,
        placeholder: Option<String>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    Boolean,
    Date {
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    },
    Time {
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    },
    Select {
        options: Vec<SelectOption>,
    },
    Combobox {
        options: Vec<SelectOption>,
        placeholder: Option<String>,
    },
    AsyncCombobox {
        placeholder: Option<String>,
        request: Option<ResourceRequest>,
        resource_options: Option<ResourceOptions>,
        item_to_string: ItemFormatter,
    },
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
    DateRange {
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    },
}

impl FieldMeta {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldMeta::Text { .. } => FieldType::Text,
            FieldMeta::Number { .. } => FieldType::Number,
            FieldMeta::Boolean => FieldType::Boolean,
            FieldMeta::Date { .. } => FieldType::Date,
            FieldMeta::Time { .. } => FieldType::Time,
            FieldMeta::Select { .. } => FieldType::Select,
            FieldMeta::Combobox { .. } => FieldType::Combobox,
            FieldMeta::AsyncCombobox { .. } => FieldType::AsyncCombobox,
            FieldMeta::Range { .. } => FieldType::Range,
            FieldMeta::DateRange { .. } => FieldType::DateRange,
        }
    }

    /// Option list of select and combobox fields
    pub fn options(&self) -> Option<&[SelectOption]> {
        match self {
            FieldMeta::Select { options } | FieldMeta::Combobox { options, .. } => {
                Some(options.as_slice())
            }
            _ => None,
        }
    }

    /// Placeholder slot: `None` when the type has no placeholder at all,
    /// `Some(None)` when it has one that was left unset
    pub fn placeholder(&self) -> Option<Option<&str>> {
        match self {
            FieldMeta::Text { placeholder, .. }
            | FieldMeta::Combobox { placeholder, .. }
            | FieldMeta::AsyncCombobox { placeholder, .. } => Some(placeholder.as_deref()),
            _ => None,
        }
    }

    /// Bounds of bounded types, `None` for types without a min/max slot
    pub fn min_max(&self) -> Option<MinMax> {
        let num = |v: &Option<f64>| v.map(Bound::Number);
        let date = |v: &Option<NaiveDateTime>| v.map(Bound::DateTime);
        match self {
            FieldMeta::Number { min, max, .. } | FieldMeta::Range { min, max } => Some(MinMax {
                min: num(min),
                max: num(max),
            }),
            FieldMeta::Date { min, max }
            | FieldMeta::Time { min, max }
            | FieldMeta::DateRange { min, max } => Some(MinMax {
                min: date(min),
                max: date(max),
            }),
            _ => None,
        }
    }
}

/// One declared filter field
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    /// Unique within one filter
    pub id: String,
    /// Display label, the id is shown when unset
    pub label: Option<String>,
    pub value: Option<FieldValue>,
    /// `None` once the field has been cleaned
    pub operator: Option<Operator>,
    /// Position among visible fields
    pub order: u32,
    pub visible: bool,
    pub meta: FieldMeta,
}

impl FieldDescriptor {
    pub fn field_type(&self) -> FieldType {
        self.meta.field_type()
    }

    /// Label shown next to the widget
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    #[test]
    fn test_field_type_round_trips_through_tag() {
        for t in FieldType::all() {
            assert_eq!(t.as_str().parse::<FieldType>(), Ok(*t));
        }
        assert_eq!(
            serde_json::to_string(&FieldType::AsyncCombobox).unwrap(),
            "\"asyncCombobox\""
        );
        assert!("checkbox".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_value_shapes() {
        assert!(FieldValue::Choice("admin".into()).accepts(FieldType::Select));
        assert!(FieldValue::Choice("US".into()).accepts(FieldType::Combobox));
        assert!(!FieldValue::Text("x".into()).accepts(FieldType::Select));
        assert!(!FieldValue::Date(at(1, 0)).accepts(FieldType::Time));
        assert!(FieldValue::Range { min: 1.0, max: 2.0 }.accepts(FieldType::Range));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        assert!(!FieldValue::Number(f64::NAN).accepts(FieldType::Number));
        assert!(!FieldValue::Number(f64::INFINITY).accepts(FieldType::Number));
        let open = FieldValue::Range {
            min: f64::NEG_INFINITY,
            max: 2.0,
        };
        assert!(!open.accepts(FieldType::Range));
        let open = FieldValue::Range {
            min: 0.0,
            max: f64::NAN,
        };
        assert!(!open.accepts(FieldType::Range));
    }

    #[test]
    fn test_value_serializes_untagged() {
        let v = serde_json::to_value(FieldValue::Range { min: -1.0, max: 5.0 }).unwrap();
        assert_eq!(v, serde_json::json!({ "min": -1.0, "max": 5.0 }));

        let v = serde_json::to_value(FieldValue::Boolean(false)).unwrap();
        assert_eq!(v, serde_json::json!(false));

        let v = serde_json::to_value(FieldValue::Date(at(14, 30))).unwrap();
        assert_eq!(v, serde_json::json!("2024-03-09T14:30:00"));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(FieldValue::Number(25.0).to_string(), "25");
        assert_eq!(FieldValue::Time(at(9, 5)).to_string(), "09:05:00");
        assert_eq!(
            FieldValue::Item(serde_json::json!("octocat")).to_string(),
            "octocat"
        );
    }

    #[test]
    fn test_meta_bounds() {
        let meta = FieldMeta::Number {
            min: Some(0.0),
            max: None,
            step: Some(1.0),
        };
        assert_eq!(
            meta.min_max(),
            Some(MinMax {
                min: Some(Bound::Number(0.0)),
                max: None
            })
        );
        assert_eq!(FieldMeta::Boolean.min_max(), None);
        assert_eq!(FieldMeta::Boolean.placeholder(), None);
        assert_eq!(
            FieldMeta::Text {
                required: false,
                placeholder: None
            }
            .placeholder(),
            Some(None)
        );
    }
}
