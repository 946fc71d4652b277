//! Command-line edits applied to a filter
//!
//! `sift parse` replays a sequence of edits against a freshly built model,
//! the way a user would click through the filter bar.

use anyhow::{anyhow, bail, Context, Result};
use sift_filter::{FieldType, FieldValue, FilterModel, FilterModelRef, Operator};

use crate::config::parse_datetime;

#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
    Add(String),
    Clean(String),
    /// Raw `ID=VALUE`, typed against the field on apply
    Set(String),
    /// Raw `ID=OPERATOR`
    Operator(String),
    Clear,
    Reset,
}

impl Edit {
    pub fn apply(&self, model: &FilterModel) -> Result<()> {
        match self {
            Edit::Add(id) => {
                ensure_declared(model, id)?;
                model.add_field(id);
            }
            Edit::Clean(id) => {
                ensure_declared(model, id)?;
                model.clean_field(id);
            }
            Edit::Set(assignment) => {
                let (id, raw) = split_assignment(assignment)?;
                let field_type = model.field_type(id)?;
                let value = parse_value(field_type, raw)
                    .with_context(|| format!("Invalid value for `{id}`"))?;
                model.patch_field_value(id, value);
            }
            Edit::Operator(assignment) => {
                let (id, raw) = split_assignment(assignment)?;
                ensure_declared(model, id)?;
                let operator: Operator = raw.parse()?;
                model.patch_field_operator(id, operator);
            }
            Edit::Clear => model.clear(),
            Edit::Reset => model.reset(),
        }
        Ok(())
    }
}

/// Apply `edits` in order, stopping at the first failure
pub fn apply_all(model: &FilterModel, edits: &[Edit]) -> Result<()> {
    for edit in edits {
        tracing::debug!(?edit, "applying edit");
        edit.apply(model)?;
    }
    Ok(())
}

/// The model ignores unknown ids; on the command line they are typos
fn ensure_declared(model: &FilterModel, id: &str) -> Result<()> {
    if model.base().contains(id) {
        Ok(())
    } else {
        Err(sift_filter::FilterError::UnknownField(id.to_string()).into())
    }
}

fn split_assignment(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(id, value)| (id.trim(), value))
        .ok_or_else(|| anyhow!("expected ID=VALUE, got `{raw}`"))
}

/// Parse a command-line value for a field of `field_type`
///
/// `null` clears the value. Ranges are written `LOW..HIGH`.
pub fn parse_value(field_type: FieldType, raw: &str) -> Result<Option<FieldValue>> {
    if raw == "null" {
        return Ok(None);
    }
    let value = match field_type {
        FieldType::Text => FieldValue::Text(raw.to_string()),
        FieldType::Number => FieldValue::Number(parse_number(raw)?),
        FieldType::Boolean => FieldValue::Boolean(raw.trim().parse()?),
        FieldType::Date => FieldValue::Date(parse_datetime(raw)?),
        FieldType::Time => FieldValue::Time(parse_datetime(raw)?),
        FieldType::Select | FieldType::Combobox => FieldValue::Choice(raw.to_string()),
        FieldType::AsyncCombobox => FieldValue::Item(
            serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string())),
        ),
        FieldType::Range => {
            let (low, high) = split_range(raw)?;
            FieldValue::Range {
                min: parse_number(low)?,
                max: parse_number(high)?,
            }
        }
        FieldType::DateRange => {
            let (start, end) = split_range(raw)?;
            FieldValue::DateRange {
                start: parse_datetime(start)?,
                end: parse_datetime(end)?,
            }
        }
    };
    Ok(Some(value))
}

/// A finite number; `NaN` and infinities have no JSON form
fn parse_number(raw: &str) -> Result<f64> {
    let number: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("expected a number, got `{raw}`"))?;
    if !number.is_finite() {
        bail!("expected a finite number, got `{raw}`");
    }
    Ok(number)
}

fn split_range(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once("..") {
        Some(pair) => Ok(pair),
        None => bail!("expected LOW..HIGH, got `{raw}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_filter::builders::{number, range, text};

    fn model() -> FilterModel {
        FilterModel::builder()
            .field(text("name", "Alice", Operator::Includes).visible(true))
            .field(number("age", 25.0, Operator::Equals))
            .field(range("price", None, Operator::Between))
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(
            parse_value(FieldType::Number, "42").unwrap(),
            Some(FieldValue::Number(42.0))
        );
        assert_eq!(
            parse_value(FieldType::Range, "1..2.5").unwrap(),
            Some(FieldValue::Range { min: 1.0, max: 2.5 })
        );
        assert_eq!(parse_value(FieldType::Text, "null").unwrap(), None);
        assert_eq!(
            parse_value(FieldType::AsyncCombobox, "octocat").unwrap(),
            Some(FieldValue::Item(serde_json::json!("octocat")))
        );
        assert!(parse_value(FieldType::Boolean, "maybe").is_err());
        assert!(parse_value(FieldType::Range, "5").is_err());
    }

    #[test]
    fn test_non_finite_numbers_fail() {
        assert!(parse_value(FieldType::Number, "NaN").is_err());
        assert!(parse_value(FieldType::Number, "inf").is_err());
        assert!(parse_value(FieldType::Range, "-inf..2").is_err());
        assert!(parse_value(FieldType::Range, "0..NaN").is_err());

        let model = model();
        assert!(Edit::Set("age=NaN".into()).apply(&model).is_err());
        assert_eq!(
            model.field_value("age").unwrap(),
            Some(FieldValue::Number(25.0))
        );
    }

    #[test]
    fn test_edits_apply_in_order() {
        let model = model();
        apply_all(
            &model,
            &[
                Edit::Add("age".into()),
                Edit::Set("age=30".into()),
                Edit::Operator("age=greaterThan".into()),
                Edit::Clean("name".into()),
            ],
        )
        .unwrap();

        let payload = model.payload();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload["age"].value, FieldValue::Number(30.0));
        assert_eq!(payload["age"].operator, Some(Operator::GreaterThan));

        apply_all(&model, &[Edit::Reset]).unwrap();
        assert_eq!(model.payload().keys().collect::<Vec<_>>(), ["name"]);
    }

    #[test]
    fn test_unknown_ids_and_operators_fail() {
        let model = model();
        assert!(Edit::Add("ghost".into()).apply(&model).is_err());
        assert!(Edit::Set("ghost=1".into()).apply(&model).is_err());
        assert!(Edit::Operator("age=almost".into()).apply(&model).is_err());
        assert!(Edit::Set("age".into()).apply(&model).is_err());
    }
}
