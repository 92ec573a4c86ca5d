// Place domain model
use crate::domain::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Longest scrape range accepted, in days.
pub const MAX_SCRAPE_DAYS: i64 = 35;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub flow_reporter_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlace {
    pub name: String,
    pub flow_reporter_id: String,
}

impl NewPlace {
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        let flow_reporter_id = self.flow_reporter_id.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if flow_reporter_id.is_empty() {
            return Err(ValidationError::MissingField("flow_reporter_id"));
        }
        Ok(Self {
            name,
            flow_reporter_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub place_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ScrapeRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end_date < self.start_date {
            return Err(ValidationError::InvertedDateRange);
        }
        // both ends count
        if (self.end_date - self.start_date).num_days() + 1 > MAX_SCRAPE_DAYS {
            return Err(ValidationError::DateSpanTooLong {
                max_weeks: (MAX_SCRAPE_DAYS / 7) as u32,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_place_accepts_numeric_reporter_id() {
        let place: Place =
            serde_json::from_str(r#"{"id": 3, "name": "Planta Norte", "flow_reporter_id": 8812}"#)
                .unwrap();
        assert_eq!(place.flow_reporter_id, "8812");
    }

    #[test]
    fn test_new_place_requires_fields() {
        let place = NewPlace {
            name: "  Depósito Sur ".to_string(),
            flow_reporter_id: "FR-1".to_string(),
        };
        assert_eq!(place.validated().unwrap().name, "Depósito Sur");

        let missing = NewPlace {
            name: "X".to_string(),
            flow_reporter_id: " ".to_string(),
        };
        assert_eq!(
            missing.validated(),
            Err(ValidationError::MissingField("flow_reporter_id"))
        );
    }

    #[test]
    fn test_scrape_range_validation() {
        let ok = ScrapeRequest {
            place_id: 1,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 2, 4),
        };
        assert!(ok.validate().is_ok());

        let inverted = ScrapeRequest {
            end_date: date(2023, 12, 31),
            ..ok.clone()
        };
        assert_eq!(inverted.validate(), Err(ValidationError::InvertedDateRange));

        let too_long = ScrapeRequest {
            end_date: date(2024, 2, 5),
            ..ok
        };
        assert_eq!(
            too_long.validate(),
            Err(ValidationError::DateSpanTooLong { max_weeks: 5 })
        );
    }
}
