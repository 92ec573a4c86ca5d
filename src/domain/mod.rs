// Domain layer - Data types and presentation arithmetic
pub mod aggregation;
pub mod consumption;
pub mod error;
pub mod note;
pub mod place;
pub mod query;
pub mod report;
pub mod status;
pub mod time_series;
