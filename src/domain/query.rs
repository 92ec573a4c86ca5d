// Analysis query parameters and their validation
use crate::domain::consumption::validate_window;
use crate::domain::error::ValidationError;
use serde::{Deserialize, Serialize};

const MAX_WEEK: u32 = 53;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisQuery {
    pub window_size: u32,
    pub start_week: u32,
    pub end_week: u32,
    pub year: i32,
    pub place_id: i64,
}

impl AnalysisQuery {
    /// Reject the query before it reaches the backend. `max_span` counts
    /// selected weeks inclusively.
    pub fn validate(&self, max_span: u32) -> Result<(), ValidationError> {
        if !(1..=MAX_WEEK).contains(&self.start_week) || !(1..=MAX_WEEK).contains(&self.end_week) {
            return Err(ValidationError::WeekOutOfRange);
        }
        if self.end_week < self.start_week {
            return Err(ValidationError::InvertedWeekRange);
        }
        if self.end_week - self.start_week + 1 > max_span {
            return Err(ValidationError::WeekSpanTooLong { max: max_span });
        }
        if !(2000..=2100).contains(&self.year) {
            return Err(ValidationError::InvalidYear(self.year));
        }
        validate_window(self.window_size)
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("window_size", self.window_size.to_string()),
            ("start_week", self.start_week.to_string()),
            ("end_week", self.end_week.to_string()),
            ("year", self.year.to_string()),
            ("place_id", self.place_id.to_string()),
        ]
    }
}
