//! Filter declaration files
//!
//! A declaration is a TOML file with one `[[fields]]` table per field, in
//! display order:
//!
//! ```toml
//! [[fields]]
//! type = "number"
//! id = "age"
//! value = 0
//! operator = "greaterThan"
//! min = 0
//! max = 120
//! ```
//!
//! Dates are written as strings: `"now"`, `"2024-06-01"` or
//! `"2024-06-01T09:30:00"`.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use sift_filter::builders;
use sift_filter::{
    FieldDescriptor, FieldType, FilterModel, ItemFormatter, Operator, ResourceOptions,
    ResourceRequest, SelectOption,
};

/// Declaration used when no file is given
const DEMO: &str = include_str!("../filters/demo.toml");

/// A whole filter declaration
#[derive(Debug, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// One `[[fields]]` table
///
/// Keys that do not apply to `type` are ignored.
#[derive(Debug, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub visible: bool,
    /// Defaults to the first operator the type offers
    #[serde(default)]
    pub operator: Option<Operator>,
    #[serde(default)]
    pub value: Option<toml::Value>,
    #[serde(default)]
    pub min: Option<toml::Value>,
    #[serde(default)]
    pub max: Option<toml::Value>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub request: Option<ResourceRequest>,
    #[serde(default)]
    pub resource_options: Option<ResourceOptions>,
    /// Key of fetched objects shown as their label
    #[serde(default)]
    pub item_label: Option<String>,
}

impl FilterConfig {
    /// The built-in demo declaration
    pub fn demo() -> Result<Self> {
        Self::from_toml_str(DEMO).context("Failed to parse built-in demo filter")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `path`, or the demo declaration when `None`
    pub fn load_or_demo(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::demo(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn descriptors(&self) -> Result<Vec<FieldDescriptor>> {
        self.fields.iter().map(FieldConfig::descriptor).collect()
    }

    pub fn build_model(&self) -> Result<FilterModel> {
        let model = FilterModel::new(self.descriptors()?)?;
        tracing::debug!(fields = model.base().len(), "declaration loaded");
        Ok(model)
    }
}

impl FieldConfig {
    fn operator(&self) -> Operator {
        self.operator
            .unwrap_or_else(|| self.field_type.operators()[0])
    }

    /// Turn this table into a descriptor through the matching builder
    pub fn descriptor(&self) -> Result<FieldDescriptor> {
        let id = self.id.as_str();
        let op = self.operator();
        let value = self.value.as_ref();
        let context = || format!("field `{id}`");

        let mut descriptor: FieldDescriptor = match self.field_type {
            FieldType::Text => {
                let text = opt_str(value).with_context(context)?.unwrap_or_default();
                let mut b = builders::text(id, text, op).required(self.required);
                if let Some(p) = &self.placeholder {
                    b = b.placeholder(p);
                }
                b.into()
            }
            FieldType::Number => {
                let number = opt_number(value).with_context(context)?.unwrap_or(0.0);
                let mut b = builders::number(id, number, op);
                if let Some(min) = opt_number(self.min.as_ref()).with_context(context)? {
                    b = b.min(min);
                }
                if let Some(max) = opt_number(self.max.as_ref()).with_context(context)? {
                    b = b.max(max);
                }
                if let Some(step) = self.step {
                    b = b.step(step);
                }
                b.into()
            }
            FieldType::Boolean => {
                let checked = match value {
                    None => None,
                    Some(toml::Value::Boolean(b)) => Some(*b),
                    Some(other) => bail!("field `{id}`: expected a boolean, got {other}"),
                };
                builders::boolean(id, checked).into()
            }
            FieldType::Date => {
                let mut b = builders::date(id, datetime_or_now(value).with_context(context)?, op);
                if let Some(min) = opt_datetime(self.min.as_ref()).with_context(context)? {
                    b = b.min(min);
                }
                if let Some(max) = opt_datetime(self.max.as_ref()).with_context(context)? {
                    b = b.max(max);
                }
                b.into()
            }
            FieldType::Time => {
                let mut b = builders::time(id, datetime_or_now(value).with_context(context)?, op);
                if let Some(min) = opt_datetime(self.min.as_ref()).with_context(context)? {
                    b = b.min(min);
                }
                if let Some(max) = opt_datetime(self.max.as_ref()).with_context(context)? {
                    b = b.max(max);
                }
                b.into()
            }
            FieldType::Select => {
                builders::select(id, opt_str(value).with_context(context)?, op)
                    .options(self.options.iter().cloned())
                    .into()
            }
            FieldType::Combobox => {
                let choice = opt_str(value).with_context(context)?.unwrap_or_default();
                let mut b =
                    builders::combobox(id, choice, op).options(self.options.iter().cloned());
                if let Some(p) = &self.placeholder {
                    b = b.placeholder(p);
                }
                b.into()
            }
            FieldType::AsyncCombobox => {
                let item = value.map(serde_json::to_value).transpose()?;
                let mut b = builders::async_combobox(id, item, op);
                if let Some(p) = &self.placeholder {
                    b = b.placeholder(p);
                }
                if let Some(request) = &self.request {
                    b = b.request(request.clone());
                }
                if let Some(options) = &self.resource_options {
                    b = b.resource_options(options.clone());
                }
                if let Some(key) = &self.item_label {
                    b = b.item_to_string(keyed_label(key.clone()));
                }
                b.into()
            }
            FieldType::Range => {
                let pair = match value {
                    None => None,
                    Some(v) => {
                        let [low, high] = pair_of(v).with_context(context)?;
                        let low = number(low).with_context(context)?;
                        let high = number(high).with_context(context)?;
                        Some((low, high))
                    }
                };
                let mut b = builders::range(id, pair, op);
                if let Some(min) = opt_number(self.min.as_ref()).with_context(context)? {
                    b = b.min(min);
                }
                if let Some(max) = opt_number(self.max.as_ref()).with_context(context)? {
                    b = b.max(max);
                }
                b.into()
            }
            FieldType::DateRange => {
                let (start, end) = match value {
                    None => {
                        let now = now();
                        (now, now)
                    }
                    Some(v) => {
                        let [start, end] = pair_of(v).with_context(context)?;
                        let start = datetime(start).with_context(context)?;
                        let end = datetime(end).with_context(context)?;
                        (start, end)
                    }
                };
                let mut b = builders::date_range(id, start, end, op);
                if let Some(min) = opt_datetime(self.min.as_ref()).with_context(context)? {
                    b = b.min(min);
                }
                if let Some(max) = opt_datetime(self.max.as_ref()).with_context(context)? {
                    b = b.max(max);
                }
                b.into()
            }
        };

        descriptor.label = self.label.clone();
        descriptor.visible = self.visible;
        Ok(descriptor)
    }
}

/// Formatter showing `item[key]`, or the whole item when the key is absent
fn keyed_label(key: String) -> impl Fn(&serde_json::Value) -> String + 'static {
    let fallback = ItemFormatter::default();
    move |item| match item.get(&key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => fallback.format(item),
    }
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Parse `now`, a `YYYY-MM-DD` date or a `YYYY-MM-DDTHH:MM:SS` date-time
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("now") {
        return Ok(now());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("invalid date `{raw}`, expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS"))
}

fn opt_str(value: Option<&toml::Value>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => bail!("expected a string, got {other}"),
    }
}

fn number(value: &toml::Value) -> Result<f64> {
    match value {
        toml::Value::Integer(i) => Ok(*i as f64),
        toml::Value::Float(f) if f.is_finite() => Ok(*f),
        other => bail!("expected a number, got {other}"),
    }
}

fn opt_number(value: Option<&toml::Value>) -> Result<Option<f64>> {
    value.map(number).transpose()
}

fn datetime(value: &toml::Value) -> Result<NaiveDateTime> {
    match value {
        toml::Value::String(s) => parse_datetime(s),
        other => bail!("expected a date string, got {other}"),
    }
}

fn opt_datetime(value: Option<&toml::Value>) -> Result<Option<NaiveDateTime>> {
    value.map(datetime).transpose()
}

fn datetime_or_now(value: Option<&toml::Value>) -> Result<NaiveDateTime> {
    Ok(opt_datetime(value)?.unwrap_or_else(now))
}

fn pair_of(value: &toml::Value) -> Result<[&toml::Value; 2]> {
    match value.as_array().map(Vec::as_slice) {
        Some([a, b]) => Ok([a, b]),
        _ => bail!("expected a two-element array, got {value}"),
    }
}
