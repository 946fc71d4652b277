//! Plain-text rendering of filter fields

use sift_filter::dispatch::FieldRenderer;
use sift_filter::handlers::{
    AsyncComboboxHandler, BooleanHandler, ComboboxHandler, DateHandler, DateRangeHandler,
    FieldHandle, NumberHandler, RangeHandler, SelectHandler, TextHandler, TimeHandler,
};
use sift_filter::SelectOption;

/// Renders each field as one terminal line
#[derive(Debug, Default)]
pub struct TextRenderer;

const DATE: &str = "%Y-%m-%d";

impl TextRenderer {
    fn line(&self, field: &FieldHandle, value: String, extra: Option<String>) -> String {
        let operator = field
            .operator()
            .map(|op| op.label().to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "{:<16} {:<14} {:<18} {}",
            field.label(),
            field.field_type().as_str(),
            operator,
            value
        );
        if let Some(extra) = extra {
            line.push_str("  ");
            line.push_str(&extra);
        }
        line
    }
}

fn or_empty(value: Option<String>) -> String {
    value.unwrap_or_else(|| "(empty)".to_string())
}

fn option_list(options: &[SelectOption]) -> String {
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    format!("[{}]", labels.join(", "))
}

impl FieldRenderer for TextRenderer {
    type Output = String;

    fn text(&mut self, field: &TextHandler) -> String {
        let value = format!("{:?}", field.text());
        let extra = field.required().then(|| "required".to_string());
        self.line(field, value, extra)
    }

    fn number(&mut self, field: &NumberHandler) -> String {
        let value = or_empty(field.number().map(|n| n.to_string()));
        let extra = format!("min {} max {} step {}", field.min(), field.max(), field.step());
        self.line(field, value, Some(extra))
    }

    fn boolean(&mut self, field: &BooleanHandler) -> String {
        let value = or_empty(field.checked().map(|b| b.to_string()));
        self.line(field, value, None)
    }

    fn date(&mut self, field: &DateHandler) -> String {
        let value = or_empty(field.date().map(|d| d.format(DATE).to_string()));
        let extra = field.max().map(|max| format!("until {}", max.format(DATE)));
        self.line(field, value, extra)
    }

    fn time(&mut self, field: &TimeHandler) -> String {
        let value = or_empty(field.time_value().map(|t| t.to_string()));
        self.line(field, value, None)
    }

    fn select(&mut self, field: &SelectHandler) -> String {
        let value = or_empty(field.selected().map(|o| o.label));
        self.line(field, value, Some(option_list(&field.options())))
    }

    fn combobox(&mut self, field: &ComboboxHandler) -> String {
        let value = field
            .selected()
            .map(|o| o.label)
            .or_else(|| field.placeholder())
            .unwrap_or_default();
        let extra = format!("{} options", field.options().len());
        self.line(field, value, Some(extra))
    }

    fn async_combobox(&mut self, field: &AsyncComboboxHandler) -> String {
        let value = or_empty(field.item_label());
        let extra = field.request().ok().map(|r| format!("{} {}", r.method, r.url));
        self.line(field, value, extra)
    }

    fn range(&mut self, field: &RangeHandler) -> String {
        let value = or_empty(field.bounds().map(|(low, high)| format!("{low}..{high}")));
        let extra = match (field.min(), field.max()) {
            (Some(min), Some(max)) => Some(format!("within {min}..{max}")),
            _ => None,
        };
        self.line(field, value, extra)
    }

    fn date_range(&mut self, field: &DateRangeHandler) -> String {
        let value = match (field.start(), field.end()) {
            (Some(start), Some(end)) => format!("{}..{}", start.format(DATE), end.format(DATE)),
            _ => or_empty(None),
        };
        self.line(field, value, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_filter::builders::{number, select, text};
    use sift_filter::dispatch::render_filter;
    use sift_filter::{FilterModel, Operator};

    #[test]
    fn test_renders_one_line_per_visible_field() {
        let model = FilterModel::builder()
            .field(text("name", "Ada", Operator::Includes).required(true).visible(true))
            .field(number("age", 36.0, Operator::GreaterThan).max(120.0).visible(true))
            .field(
                select("role", Some("admin".into()), Operator::Is)
                    .option(SelectOption::new("admin", "Admin")),
            )
            .build()
            .unwrap();

        let lines = render_filter(&mut TextRenderer, &model).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("name"));
        assert!(lines[0].contains("\"Ada\""));
        assert!(lines[0].ends_with("required"));
        assert!(lines[1].contains("max 120"));
    }
}
