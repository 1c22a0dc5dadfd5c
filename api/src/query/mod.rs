mod coerce;
mod error;
mod features;
mod filter;
mod operator;
mod pagination;
mod projection;
mod raw;
mod sort;
mod sql;
mod types;

pub use error::QueryError;
pub use features::QueryFeatures;
pub use projection::{ID_FIELD, VERSION_FIELD};
pub use sql::{build_count, build_select, SqlValue};
pub use types::FilterExpression;
