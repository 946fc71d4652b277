//! Per-type field handlers
//!
//! A handler is the narrow facade one widget uses for one field. It holds
//! the field id and a handle to the model, never a copy of the state, and
//! writes through the same operations the model exposes.
//!
//! Every handler derefs to [`FieldHandle`], the surface all field types
//! share. Type-specific reads and writes sit on the typed handler.
//!
//! ```rust
//! use sift_filter::builders::number;
//! use sift_filter::handlers::{FieldHandler, NumberHandler};
//! use sift_filter::prelude::*;
//!
//! let filter = FilterModel::builder()
//!     .field(number("age", 30.0, Operator::Equals).max(120.0))
//!     .build()
//!     .unwrap();
//!
//! let age = NumberHandler::new("age", &filter).unwrap();
//! assert_eq!(age.form_id(), "number-age");
//! assert_eq!(age.max(), 120.0);
//! assert_eq!(age.step(), 1.0);
//!
//! age.set_number(42.0);
//! assert_eq!(filter.field_value("age").unwrap(), Some(FieldValue::Number(42.0)));
//!
//! assert!(matches!(FieldHandler::for_field("age", &filter), Ok(FieldHandler::Number(_))));
//! ```

use std::ops::Deref;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::error::{FilterError, Result};
use crate::field::{FieldType, FieldValue, SelectOption};
use crate::model::{FilterModel, FilterModelRef};
use crate::operator::Operator;
use crate::resource::{ItemFormatter, QuerySession, ResourceOptions, ResourceRequest};
use crate::time::TimeValue;

/// Largest integer a double holds exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Surface shared by every field handler
#[derive(Clone, Debug)]
pub struct FieldHandle {
    id: String,
    field_type: FieldType,
    model: FilterModel,
}

impl FieldHandle {
    fn bind(id: &str, model: &FilterModel, expected: FieldType) -> Result<Self> {
        let actual = model.field_type(id)?;
        if actual != expected {
            return Err(FilterError::HandlerMismatch {
                id: id.to_string(),
                expected,
                actual,
            });
        }
        Ok(Self {
            id: id.to_string(),
            field_type: actual,
            model: model.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn model(&self) -> &FilterModel {
        &self.model
    }

    /// Identifier for the widget's form control, `"{type}-{id}"`
    pub fn form_id(&self) -> String {
        format!("{}-{}", self.field_type, self.id)
    }

    pub fn value(&self) -> Option<FieldValue> {
        self.model.field_value(&self.id).ok().flatten()
    }

    pub fn label(&self) -> String {
        self.model
            .field_label(&self.id)
            .unwrap_or_else(|_| self.id.clone())
    }

    pub fn operator(&self) -> Option<Operator> {
        self.model.field_operator(&self.id).ok().flatten()
    }

    /// Operators the widget should offer
    pub fn operators(&self) -> &'static [Operator] {
        self.field_type.operators()
    }

    /// Remove the field from the visible filter
    pub fn close(&self) {
        self.model.clean_field(&self.id);
    }

    /// Set the operator; `None` restores the declared one
    pub fn set_operator(&self, operator: Option<Operator>) {
        let operator = operator.or_else(|| self.model.base_operator(&self.id).ok().flatten());
        if let Some(operator) = operator {
            self.model.patch_field_operator(&self.id, operator);
        }
    }

    pub fn update_control(&self, value: Option<FieldValue>) {
        self.model.patch_field_value(&self.id, value);
    }

    fn seed_value(&self) -> Option<FieldValue> {
        self.model.base_value(&self.id).ok().flatten()
    }
}

macro_rules! typed_handler {
    ($(#[$doc:meta])* $name:ident, $field_type:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $name {
            base: FieldHandle,
        }

        impl $name {
            /// Bind to field `id`; fails if it is not of this handler's type
            pub fn new(id: &str, model: &FilterModel) -> Result<Self> {
                FieldHandle::bind(id, model, $field_type).map(|base| Self { base })
            }
        }

        impl Deref for $name {
            type Target = FieldHandle;

            fn deref(&self) -> &FieldHandle {
                &self.base
            }
        }
    };
}

typed_handler!(TextHandler, FieldType::Text);
typed_handler!(NumberHandler, FieldType::Number);
typed_handler!(BooleanHandler, FieldType::Boolean);
typed_handler!(DateHandler, FieldType::Date);
typed_handler!(
    /// Edits a stored date-time through a 12-hour clock
    TimeHandler,
    FieldType::Time
);
typed_handler!(SelectHandler, FieldType::Select);
typed_handler!(ComboboxHandler, FieldType::Combobox);
typed_handler!(AsyncComboboxHandler, FieldType::AsyncCombobox);
typed_handler!(RangeHandler, FieldType::Range);
typed_handler!(DateRangeHandler, FieldType::DateRange);

impl TextHandler {
    pub fn required(&self) -> bool {
        self.model.field_required(&self.id).unwrap_or(false)
    }

    pub fn placeholder(&self) -> Option<String> {
        self.model.field_placeholder(&self.id).ok().flatten()
    }

    /// Current text, empty when unset
    pub fn text(&self) -> String {
        self.value()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.update_control(Some(FieldValue::Text(text.into())));
    }
}

impl NumberHandler {
    pub fn min(&self) -> f64 {
        self.numeric().min.unwrap_or(-MAX_SAFE_INTEGER)
    }

    pub fn max(&self) -> f64 {
        self.numeric().max.unwrap_or(MAX_SAFE_INTEGER)
    }

    pub fn step(&self) -> f64 {
        self.numeric().step.unwrap_or(1.0)
    }

    pub fn number(&self) -> Option<f64> {
        self.value().and_then(|v| v.as_number())
    }

    pub fn set_number(&self, number: f64) {
        self.update_control(Some(FieldValue::Number(number)));
    }

    fn numeric(&self) -> crate::field::NumericOptions {
        self.model
            .field_numeric_options(&self.id)
            .unwrap_or_default()
    }
}

impl BooleanHandler {
    pub fn checked(&self) -> Option<bool> {
        self.value().and_then(|v| v.as_bool())
    }

    pub fn set_checked(&self, checked: bool) {
        self.update_control(Some(FieldValue::Boolean(checked)));
    }
}

/// Date-time bounds of date, time and date-range fields
fn date_bounds(handle: &FieldHandle) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    use crate::field::Bound;

    let as_date = |bound: Option<Bound>| match bound {
        Some(Bound::DateTime(d)) => Some(d),
        _ => None,
    };
    let bounds = handle.model.field_min_max(&handle.id).unwrap_or_default();
    (as_date(bounds.min), as_date(bounds.max))
}

impl DateHandler {
    pub fn min(&self) -> Option<NaiveDateTime> {
        date_bounds(self).0
    }

    pub fn max(&self) -> Option<NaiveDateTime> {
        date_bounds(self).1
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.value().and_then(|v| v.as_datetime())
    }

    pub fn set_date(&self, date: NaiveDateTime) {
        self.update_control(Some(FieldValue::Date(date)));
    }
}

impl TimeHandler {
    pub fn min(&self) -> Option<NaiveDateTime> {
        date_bounds(self).0
    }

    pub fn max(&self) -> Option<NaiveDateTime> {
        date_bounds(self).1
    }

    /// Stored time, or the declared one once the field was cleaned
    fn stored(&self) -> Option<NaiveDateTime> {
        self.value()
            .or_else(|| self.seed_value())
            .and_then(|v| v.as_datetime())
    }

    pub fn time_value(&self) -> Option<TimeValue> {
        self.stored().map(TimeValue::from_datetime)
    }

    /// Write a 12-hour clock value, keeping the stored date
    pub fn update_time(&self, time: TimeValue) -> Result<()> {
        let date = self
            .stored()
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        let updated = time.apply_to(date)?;
        self.update_control(Some(FieldValue::Time(updated)));
        Ok(())
    }
}

/// Option matching the stored choice
fn selected_option(handle: &FieldHandle) -> Option<SelectOption> {
    let value = handle.value()?;
    let chosen = value.as_str()?;
    handle
        .model
        .field_options(&handle.id)
        .ok()?
        .into_iter()
        .find(|option| option.matches(chosen))
}

impl SelectHandler {
    pub fn options(&self) -> Vec<SelectOption> {
        self.model.field_options(&self.id).unwrap_or_default()
    }

    pub fn selected(&self) -> Option<SelectOption> {
        selected_option(self)
    }

    pub fn select(&self, value: impl Into<String>) {
        self.update_control(Some(FieldValue::Choice(value.into())));
    }
}

impl ComboboxHandler {
    pub fn options(&self) -> Vec<SelectOption> {
        self.model.field_options(&self.id).unwrap_or_default()
    }

    pub fn placeholder(&self) -> Option<String> {
        self.model.field_placeholder(&self.id).ok().flatten()
    }

    pub fn selected(&self) -> Option<SelectOption> {
        selected_option(self)
    }

    pub fn select(&self, value: impl Into<String>) {
        self.update_control(Some(FieldValue::Choice(value.into())));
    }
}

impl AsyncComboboxHandler {
    pub fn placeholder(&self) -> Option<String> {
        self.model.field_placeholder(&self.id).ok().flatten()
    }

    /// Request template, with the query token still in place
    pub fn request(&self) -> Result<ResourceRequest> {
        self.model.field_resource_request(&self.id)
    }

    pub fn resource_options(&self) -> Option<ResourceOptions> {
        self.model.field_resource_options(&self.id).ok()
    }

    pub fn item_to_string(&self) -> ItemFormatter {
        self.model
            .field_item_to_string(&self.id)
            .unwrap_or_default()
    }

    /// Fresh search session over this field's request
    pub fn session(&self) -> Result<QuerySession> {
        self.request().map(QuerySession::new)
    }

    pub fn item(&self) -> Option<Value> {
        match self.value() {
            Some(FieldValue::Item(item)) => Some(item),
            _ => None,
        }
    }

    /// Label of the picked item
    pub fn item_label(&self) -> Option<String> {
        self.item().map(|item| self.item_to_string().format(&item))
    }

    pub fn select_item(&self, item: Value) {
        self.update_control(Some(FieldValue::Item(item)));
    }
}

impl RangeHandler {
    pub fn min(&self) -> Option<f64> {
        self.model
            .field_min_max(&self.id)
            .ok()
            .and_then(|b| b.min)
            .and_then(bound_number)
    }

    pub fn max(&self) -> Option<f64> {
        self.model
            .field_min_max(&self.id)
            .ok()
            .and_then(|b| b.max)
            .and_then(bound_number)
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.value().and_then(|v| v.as_range())
    }

    /// Store a new `(low, high)` pair; reversed ends are swapped
    pub fn update_bounds(&self, low: f64, high: f64) {
        let (min, max) = if low <= high { (low, high) } else { (high, low) };
        self.update_control(Some(FieldValue::Range { min, max }));
    }
}

fn bound_number(bound: crate::field::Bound) -> Option<f64> {
    match bound {
        crate::field::Bound::Number(n) => Some(n),
        crate::field::Bound::DateTime(_) => None,
    }
}

impl DateRangeHandler {
    pub fn min(&self) -> Option<NaiveDateTime> {
        date_bounds(self).0
    }

    pub fn max(&self) -> Option<NaiveDateTime> {
        date_bounds(self).1
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.value().and_then(|v| v.as_date_range()).map(|(s, _)| s)
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.value().and_then(|v| v.as_date_range()).map(|(_, e)| e)
    }

    /// Move the start; the end follows when it would fall before it
    pub fn update_start(&self, start: NaiveDateTime) {
        let end = self.end().map_or(start, |end| end.max(start));
        self.update_control(Some(FieldValue::DateRange { start, end }));
    }

    /// Move the end; the start follows when it would fall after it
    pub fn update_end(&self, end: NaiveDateTime) {
        let start = self.start().map_or(end, |start| start.min(end));
        self.update_control(Some(FieldValue::DateRange { start, end }));
    }
}

/// A handler of whichever type the field has
#[derive(Clone, Debug)]
pub enum FieldHandler {
    Text(TextHandler),
    Number(NumberHandler),
    Boolean(BooleanHandler),
    Date(DateHandler),
    Time(TimeHandler),
    Select(SelectHandler),
    Combobox(ComboboxHandler),
    AsyncCombobox(AsyncComboboxHandler),
    Range(RangeHandler),
    DateRange(DateRangeHandler),
}

impl FieldHandler {
    /// Pick the handler matching the stored type of field `id`
    pub fn for_field(id: &str, model: &FilterModel) -> Result<Self> {
        let handler = match model.field_type(id)? {
            FieldType::Text => FieldHandler::Text(TextHandler::new(id, model)?),
            FieldType::Number => FieldHandler::Number(NumberHandler::new(id, model)?),
            FieldType::Boolean => FieldHandler::Boolean(BooleanHandler::new(id, model)?),
            FieldType::Date => FieldHandler::Date(DateHandler::new(id, model)?),
            FieldType::Time => FieldHandler::Time(TimeHandler::new(id, model)?),
            FieldType::Select => FieldHandler::Select(SelectHandler::new(id, model)?),
            FieldType::Combobox => FieldHandler::Combobox(ComboboxHandler::new(id, model)?),
            FieldType::AsyncCombobox => {
                FieldHandler::AsyncCombobox(AsyncComboboxHandler::new(id, model)?)
            }
            FieldType::Range => FieldHandler::Range(RangeHandler::new(id, model)?),
            FieldType::DateRange => FieldHandler::DateRange(DateRangeHandler::new(id, model)?),
        };
        Ok(handler)
    }

    /// The shared surface
    pub fn base(&self) -> &FieldHandle {
        match self {
            FieldHandler::Text(h) => &h.base,
            FieldHandler::Number(h) => &h.base,
            FieldHandler::Boolean(h) => &h.base,
            FieldHandler::Date(h) => &h.base,
            FieldHandler::Time(h) => &h.base,
            FieldHandler::Select(h) => &h.base,
            FieldHandler::Combobox(h) => &h.base,
            FieldHandler::AsyncCombobox(h) => &h.base,
            FieldHandler::Range(h) => &h.base,
            FieldHandler::DateRange(h) => &h.base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{
        async_combobox, boolean, combobox, date, date_range, number, range, select, text, time,
    };
    use crate::time::Period;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    fn model() -> FilterModel {
        FilterModel::builder()
            .field(text("name", "Alice", Operator::Includes).required(true).visible(true))
            .field(number("age", 25.0, Operator::Equals))
            .field(boolean("active", None))
            .field(date("created", at(1, 0, 0), Operator::Before).max(at(30, 0, 0)))
            .field(time("opens", at(1, 15, 30), Operator::After))
            .field(
                select("role", Some("admin".into()), Operator::Is)
                    .option(SelectOption::new("admin", "Admin"))
                    .option(SelectOption::new("user", "User")),
            )
            .field(combobox("country", "", Operator::Is).placeholder("Pick one"))
            .field(
                async_combobox("user", None, Operator::Is)
                    .request(ResourceRequest::get("/users?q={query}")),
            )
            .field(range("price", Some((10.0, 100.0)), Operator::Between).min(0.0))
            .field(date_range("period", at(1, 0, 0), at(7, 0, 0), Operator::Between))
            .build()
            .unwrap()
    }

    #[test]
    fn test_base_surface() {
        let model = model();
        let name = TextHandler::new("name", &model).unwrap();

        assert_eq!(name.form_id(), "text-name");
        assert_eq!(name.label(), "name");
        assert_eq!(name.text(), "Alice");
        assert!(name.required());
        assert_eq!(name.operators(), FieldType::Text.operators());

        name.set_operator(Some(Operator::EndsWith));
        assert_eq!(name.operator(), Some(Operator::EndsWith));
        name.set_operator(None);
        assert_eq!(name.operator(), Some(Operator::Includes));

        name.close();
        assert_eq!(name.value(), None);
        assert!(model.fields_array().is_empty());
    }

    #[test]
    fn test_mismatched_handler_fails() {
        let model = model();
        assert_eq!(
            NumberHandler::new("name", &model).unwrap_err(),
            FilterError::HandlerMismatch {
                id: "name".into(),
                expected: FieldType::Number,
                actual: FieldType::Text,
            }
        );
        assert!(matches!(
            TextHandler::new("ghost", &model),
            Err(FilterError::UnknownField(_))
        ));
    }

    #[test]
    fn test_number_defaults() {
        let model = model();
        let age = NumberHandler::new("age", &model).unwrap();
        assert_eq!(age.min(), -9_007_199_254_740_991.0);
        assert_eq!(age.max(), 9_007_199_254_740_991.0);
        assert_eq!(age.step(), 1.0);
        assert_eq!(age.number(), Some(25.0));
    }

    #[test]
    fn test_boolean_and_date() {
        let model = model();
        let active = BooleanHandler::new("active", &model).unwrap();
        assert_eq!(active.checked(), None);
        active.set_checked(true);
        assert_eq!(active.checked(), Some(true));

        let created = DateHandler::new("created", &model).unwrap();
        assert_eq!(created.max(), Some(at(30, 0, 0)));
        assert_eq!(created.min(), None);
        created.set_date(at(2, 0, 0));
        assert_eq!(created.date(), Some(at(2, 0, 0)));
    }

    #[test]
    fn test_time_split_and_merge() {
        let model = model();
        let opens = TimeHandler::new("opens", &model).unwrap();
        assert_eq!(opens.time_value(), Some(TimeValue::new(3, 30, 0, Period::Pm)));

        opens.update_time(TimeValue::new(9, 5, 10, Period::Am)).unwrap();
        assert_eq!(
            model.field_value("opens").unwrap(),
            Some(FieldValue::Time(
                NaiveDate::from_ymd_opt(2024, 6, 1)
                    .and_then(|d| d.and_hms_opt(9, 5, 10))
                    .unwrap()
            ))
        );

        assert!(opens.update_time(TimeValue::new(13, 0, 0, Period::Pm)).is_err());
    }

    #[test]
    fn test_time_falls_back_to_declared_value() {
        let model = model();
        let opens = TimeHandler::new("opens", &model).unwrap();
        opens.close();
        assert_eq!(opens.value(), None);
        assert_eq!(opens.time_value(), Some(TimeValue::new(3, 30, 0, Period::Pm)));
    }

    #[test]
    fn test_select_and_combobox() {
        let model = model();
        let role = SelectHandler::new("role", &model).unwrap();
        assert_eq!(role.options().len(), 2);
        assert_eq!(role.selected().map(|o| o.label), Some("Admin".to_string()));
        role.select("user");
        assert_eq!(role.selected().map(|o| o.label), Some("User".to_string()));

        let country = ComboboxHandler::new("country", &model).unwrap();
        assert_eq!(country.placeholder().as_deref(), Some("Pick one"));
        assert!(country.options().is_empty());
        assert_eq!(country.selected(), None);
    }

    #[test]
    fn test_non_string_option_values_select() {
        let model = FilterModel::builder()
            .field(
                select("level", Some("2".into()), Operator::Is)
                    .option(SelectOption::new(1, "Low"))
                    .option(SelectOption::new(2, "High")),
            )
            .field(
                combobox("flag", "true", Operator::Is)
                    .option(SelectOption::new(false, "No"))
                    .option(SelectOption::new(true, "Yes")),
            )
            .build()
            .unwrap();

        let level = SelectHandler::new("level", &model).unwrap();
        assert_eq!(level.selected().map(|o| o.label), Some("High".to_string()));
        level.select("1");
        assert_eq!(level.selected().map(|o| o.label), Some("Low".to_string()));

        let flag = ComboboxHandler::new("flag", &model).unwrap();
        assert_eq!(flag.selected().map(|o| o.label), Some("Yes".to_string()));
    }

    #[test]
    fn test_async_combobox_passthrough() {
        let model = model();
        let user = AsyncComboboxHandler::new("user", &model).unwrap();
        assert_eq!(user.request().unwrap().resolve("ada").url, "/users?q=ada");
        assert_eq!(user.resource_options(), None);

        let mut session = user.session().unwrap();
        assert_eq!(session.search("bob").request.url, "/users?q=bob");

        user.select_item(json!("octocat"));
        assert_eq!(user.item_label().as_deref(), Some("octocat"));
    }

    #[test]
    fn test_ranges() {
        let model = model();
        let price = RangeHandler::new("price", &model).unwrap();
        assert_eq!(price.min(), Some(0.0));
        assert_eq!(price.max(), None);
        price.update_bounds(80.0, 20.0);
        assert_eq!(price.bounds(), Some((20.0, 80.0)));

        let period = DateRangeHandler::new("period", &model).unwrap();
        period.update_start(at(10, 0, 0));
        assert_eq!(period.start(), Some(at(10, 0, 0)));
        assert_eq!(period.end(), Some(at(10, 0, 0)));
        period.update_end(at(12, 0, 0));
        assert_eq!(period.end(), Some(at(12, 0, 0)));
        period.update_end(at(5, 0, 0));
        assert_eq!(period.start(), Some(at(5, 0, 0)));
    }

    #[test]
    fn test_for_field_covers_every_type() {
        let model = model();
        for id in model.base().ids() {
            let handler = FieldHandler::for_field(id, &model).unwrap();
            assert_eq!(handler.base().id(), id);
            assert_eq!(handler.base().field_type(), model.field_type(id).unwrap());
        }
    }

    #[test]
    fn test_handlers_share_state() {
        let model = model();
        let a = NumberHandler::new("age", &model).unwrap();
        let b = NumberHandler::new("age", &model).unwrap();
        a.set_number(60.0);
        assert_eq!(b.number(), Some(60.0));
    }
}
