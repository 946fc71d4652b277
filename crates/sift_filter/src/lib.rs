//! # Sift Rich Filter (sift_filter)
//!
//! A declarative, reactive filter engine. A filter is an ordered list of
//! typed fields; users show or hide fields, pick operators and enter
//! values, and the engine derives a compact payload from whatever is
//! currently active.
//!
//! - **Builders**: one constructor per field type ([`builders`])
//! - **Model**: the single owner of the live state ([`FilterModel`])
//! - **Handlers**: narrow per-field facades for widgets ([`handlers`])
//! - **Parser**: state to payload ([`parse_filter`])
//! - **Dispatch**: field type to widget ([`dispatch`])
//!
//! ## Example
//!
//! ```rust
//! use sift_filter::builders::{boolean, number, text};
//! use sift_filter::prelude::*;
//!
//! let filter = FilterModel::builder()
//!     .field(text("name", "Alice", Operator::Includes).visible(true))
//!     .field(number("count", 0.0, Operator::Equals).visible(true))
//!     .field(boolean("isActive", Some(true)))
//!     .build()
//!     .unwrap();
//!
//! let payload = filter.payload();
//! assert_eq!(payload.len(), 2);
//! assert_eq!(payload["count"].value, FieldValue::Number(0.0));
//! ```

pub mod builders;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod handlers;
pub mod model;
pub mod operator;
pub mod parser;
pub mod registry;
pub mod resource;
pub mod time;

pub use error::{FilterError, Result};
pub use field::{
    Bound, FieldDescriptor, FieldMeta, FieldType, FieldValue, MinMax, NumericOptions,
    SelectOption,
};
pub use model::{FilterModel, FilterModelBuilder, FilterModelRef, Subscription};
pub use operator::Operator;
pub use parser::{parse_filter, FilterPayload, PayloadEntry};
pub use registry::{FieldRegistry, FilterState};
pub use resource::{ItemFormatter, ResourceOptions, ResourceRequest, QUERY_TOKEN};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builders;
    pub use crate::dispatch::{render_field, render_filter, FieldRenderer};
    pub use crate::field::{FieldDescriptor, FieldType, FieldValue, SelectOption};
    pub use crate::handlers::FieldHandler;
    pub use crate::model::{FilterModel, FilterModelRef};
    pub use crate::operator::Operator;
    pub use crate::time::{Period, TimeValue};
}
