//! Tag-to-widget dispatch
//!
//! A presentation layer implements [`FieldRenderer`] once, with one method
//! per field type. [`render_filter`] then walks the visible fields in
//! display order and hands each one's typed handler to the matching method.
//! Adding a field type breaks every renderer at compile time.

use crate::error::Result;
use crate::handlers::{
    AsyncComboboxHandler, BooleanHandler, ComboboxHandler, DateHandler, DateRangeHandler,
    FieldHandler, NumberHandler, RangeHandler, SelectHandler, TextHandler, TimeHandler,
};
use crate::model::{FilterModel, FilterModelRef};

/// One widget per field type
pub trait FieldRenderer {
    type Output;

    fn text(&mut self, field: &TextHandler) -> Self::Output;
    fn number(&mut self, field: &NumberHandler) -> Self::Output;
    fn boolean(&mut self, field: &BooleanHandler) -> Self::Output;
    fn date(&mut self, field: &DateHandler) -> Self::Output;
    fn time(&mut self, field: &TimeHandler) -> Self::Output;
    fn select(&mut self, field: &SelectHandler) -> Self::Output;
    fn combobox(&mut self, field: &ComboboxHandler) -> Self::Output;
    fn async_combobox(&mut self, field: &AsyncComboboxHandler) -> Self::Output;
    fn range(&mut self, field: &RangeHandler) -> Self::Output;
    fn date_range(&mut self, field: &DateRangeHandler) -> Self::Output;
}

pub fn render_field<R: FieldRenderer>(renderer: &mut R, handler: &FieldHandler) -> R::Output {
    match handler {
        FieldHandler::Text(h) => renderer.text(h),
        FieldHandler::Number(h) => renderer.number(h),
        FieldHandler::Boolean(h) => renderer.boolean(h),
        FieldHandler::Date(h) => renderer.date(h),
        FieldHandler::Time(h) => renderer.time(h),
        FieldHandler::Select(h) => renderer.select(h),
        FieldHandler::Combobox(h) => renderer.combobox(h),
        FieldHandler::AsyncCombobox(h) => renderer.async_combobox(h),
        FieldHandler::Range(h) => renderer.range(h),
        FieldHandler::DateRange(h) => renderer.date_range(h),
    }
}

/// Render the visible fields of `model` in display order
pub fn render_filter<R: FieldRenderer>(
    renderer: &mut R,
    model: &FilterModel,
) -> Result<Vec<R::Output>> {
    model
        .fields_array()
        .iter()
        .map(|field| {
            let handler = FieldHandler::for_field(&field.id, model)?;
            Ok(render_field(renderer, &handler))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{boolean, number, select, text};
    use crate::operator::Operator;

    /// Records `type:id` for each rendered widget
    struct Recorder;

    impl FieldRenderer for Recorder {
        type Output = String;

        fn text(&mut self, field: &TextHandler) -> String {
            format!("text:{}", field.id())
        }
        fn number(&mut self, field: &NumberHandler) -> String {
            format!("number:{}", field.id())
        }
        fn boolean(&mut self, field: &BooleanHandler) -> String {
            format!("boolean:{}", field.id())
        }
        fn date(&mut self, field: &DateHandler) -> String {
            format!("date:{}", field.id())
        }
        fn time(&mut self, field: &TimeHandler) -> String {
            format!("time:{}", field.id())
        }
        fn select(&mut self, field: &SelectHandler) -> String {
            format!("select:{}", field.id())
        }
        fn combobox(&mut self, field: &ComboboxHandler) -> String {
            format!("combobox:{}", field.id())
        }
        fn async_combobox(&mut self, field: &AsyncComboboxHandler) -> String {
            format!("asyncCombobox:{}", field.id())
        }
        fn range(&mut self, field: &RangeHandler) -> String {
            format!("range:{}", field.id())
        }
        fn date_range(&mut self, field: &DateRangeHandler) -> String {
            format!("daterange:{}", field.id())
        }
    }

    #[test]
    fn test_renders_visible_fields_in_order() {
        let model = FilterModel::builder()
            .field(text("name", "", Operator::Includes).visible(true))
            .field(number("age", 1.0, Operator::Equals))
            .field(boolean("active", Some(true)))
            .field(select("role", None, Operator::Is).visible(true))
            .build()
            .unwrap();

        model.add_field("active");
        let rendered = render_filter(&mut Recorder, &model).unwrap();
        assert_eq!(rendered, vec!["text:name", "select:role", "boolean:active"]);
    }

    #[test]
    fn test_render_field_matches_tag() {
        let model = FilterModel::builder()
            .field(number("age", 1.0, Operator::Equals))
            .build()
            .unwrap();
        let handler = FieldHandler::for_field("age", &model).unwrap();
        assert_eq!(render_field(&mut Recorder, &handler), "number:age");
    }
}
