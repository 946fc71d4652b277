//! Filter payload
//!
//! The payload is what leaves the filter: one `{id, value, operator}` entry
//! per visible field with a value. Order, visibility and type metadata are
//! stripped.

use indexmap::IndexMap;
use serde::Serialize;

use crate::field::FieldValue;
use crate::operator::Operator;
use crate::registry::FilterState;

/// One active criterion
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PayloadEntry {
    pub id: String,
    pub value: FieldValue,
    pub operator: Option<Operator>,
}

/// Active criteria keyed by field id, in declaration order
pub type FilterPayload = IndexMap<String, PayloadEntry>;

/// Derive the payload of `state`
///
/// Hidden fields and fields without a value are dropped. Falsy values
/// (`""`, `0`, `false`) are kept.
pub fn parse_filter(state: &FilterState) -> FilterPayload {
    state
        .values()
        .filter(|field| field.visible)
        .filter_map(|field| {
            let value = field.value.clone()?;
            Some((
                field.id.clone(),
                PayloadEntry {
                    id: field.id.clone(),
                    value,
                    operator: field.operator,
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{boolean, number, text};
    use crate::model::{FilterModel, FilterModelRef};
    use serde_json::json;

    #[test]
    fn test_visible_text_field() {
        let model = FilterModel::builder()
            .field(text("name", "Alice", Operator::Includes).visible(true))
            .build()
            .unwrap();

        let payload = serde_json::to_value(model.payload()).unwrap();
        assert_eq!(
            payload,
            json!({"name": {"id": "name", "value": "Alice", "operator": "includes"}})
        );
    }

    #[test]
    fn test_null_value_omitted() {
        let model = FilterModel::builder()
            .field(text("name", "Alice", Operator::Includes).visible(true))
            .field(number("age", 30.0, Operator::Equals).visible(true))
            .build()
            .unwrap();

        model.patch_field_value("age", None);
        let payload = model.payload();
        assert!(payload.contains_key("name"));
        assert!(!payload.contains_key("age"));
    }

    #[test]
    fn test_hidden_field_omitted() {
        let model = FilterModel::builder()
            .field(text("email", "x", Operator::Includes).visible(false))
            .build()
            .unwrap();
        assert!(model.payload().is_empty());
    }

    #[test]
    fn test_falsy_values_kept() {
        let model = FilterModel::builder()
            .field(number("count", 0.0, Operator::Equals).visible(true))
            .field(text("q", "", Operator::Includes).visible(true))
            .field(boolean("active", Some(false)).visible(true))
            .build()
            .unwrap();

        let payload = serde_json::to_value(model.payload()).unwrap();
        assert_eq!(payload["count"]["value"], json!(0.0));
        assert_eq!(payload["q"]["value"], json!(""));
        assert_eq!(payload["active"]["value"], json!(false));
    }

    #[test]
    fn test_entries_only_carry_id_value_operator() {
        let model = FilterModel::builder()
            .field(text("a", "1", Operator::Includes).visible(true))
            .field(number("b", 2.0, Operator::Equals).visible(true))
            .field(text("c", "3", Operator::Includes))
            .field(number("d", 4.0, Operator::Equals).visible(true))
            .build()
            .unwrap();
        model.patch_field_value("d", None);

        let payload = serde_json::to_value(parse_filter(&model.value())).unwrap();
        let entries = payload.as_object().unwrap();
        assert_eq!(entries.len(), 2);
        for entry in entries.values() {
            let mut keys: Vec<&String> = entry.as_object().unwrap().keys().collect();
            keys.sort();
            assert_eq!(keys, ["id", "operator", "value"]);
        }
    }

    #[test]
    fn test_all_null_values_give_empty_payload() {
        let model = FilterModel::builder()
            .field(text("name", "Alice", Operator::Includes).visible(true))
            .field(number("age", 30.0, Operator::Equals).visible(true))
            .field(boolean("active", None).visible(true))
            .build()
            .unwrap();
        model.patch_field_value("name", None);
        model.patch_field_value("age", None);

        assert_eq!(model.fields_array().len(), 3);
        assert!(model.payload().is_empty());
        assert_eq!(serde_json::to_value(model.payload()).unwrap(), json!({}));
    }

    #[test]
    fn test_mixed_state_counts_only_visible_non_null() {
        let model = FilterModel::builder()
            .field(text("a", "1", Operator::Includes).visible(true))
            .field(number("b", 2.0, Operator::Equals).visible(true))
            .field(boolean("c", Some(false)).visible(true))
            .field(text("d", "hidden", Operator::Includes))
            .field(number("e", 5.0, Operator::Equals))
            .field(boolean("f", None).visible(true))
            .field(text("g", "x", Operator::Includes).visible(true))
            .build()
            .unwrap();
        model.patch_field_value("g", None);

        let payload = model.payload();
        assert_eq!(payload.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn test_cleaned_field_has_null_operator_in_state_but_is_dropped() {
        let model = FilterModel::builder()
            .field(text("name", "Alice", Operator::Includes).visible(true))
            .build()
            .unwrap();
        model.clean_field("name");
        assert!(model.payload().is_empty());
    }
}
