// Chart annotation model
use crate::domain::error::ValidationError;
use crate::domain::time_series::millis_string;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_NOTE_COLOR: &str = "#3b82f6";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    #[serde(with = "millis_string")]
    pub timestamp: i64,
    pub title: String,
    pub description: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// User input for creating or editing a note.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoteDraft {
    #[serde(with = "millis_string")]
    pub timestamp: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl Note {
    pub fn create(draft: NoteDraft) -> Result<Self, ValidationError> {
        let draft = draft.validated()?;
        Ok(Self {
            id: Uuid::new_v4(),
            timestamp: draft.timestamp,
            title: draft.title,
            description: draft.description,
            color: draft.color.unwrap_or_else(|| DEFAULT_NOTE_COLOR.to_string()),
            created_at: Utc::now(),
        })
    }

    /// Apply an edit; identity and creation time are kept.
    pub fn apply(&mut self, draft: NoteDraft) -> Result<(), ValidationError> {
        let draft = draft.validated()?;
        self.timestamp = draft.timestamp;
        self.title = draft.title;
        self.description = draft.description;
        if let Some(color) = draft.color {
            self.color = color;
        }
        Ok(())
    }
}

impl NoteDraft {
    fn validated(mut self) -> Result<Self, ValidationError> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        self.color = self.color.filter(|c| !c.trim().is_empty());
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> NoteDraft {
        NoteDraft {
            timestamp: 1_000,
            title: title.to_string(),
            description: "fuga en válvula".to_string(),
            color: None,
        }
    }

    #[test]
    fn test_create_defaults_color() {
        let note = Note::create(draft(" Revisión ")).unwrap();
        assert_eq!(note.title, "Revisión");
        assert_eq!(note.color, DEFAULT_NOTE_COLOR);
    }

    #[test]
    fn test_empty_title_rejected() {
        assert_eq!(
            Note::create(draft("   ")),
            Err(ValidationError::MissingField("title"))
        );
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut note = Note::create(draft("A")).unwrap();
        let id = note.id;
        let created_at = note.created_at;

        let mut edit = draft("B");
        edit.color = Some("#ef4444".to_string());
        note.apply(edit).unwrap();

        assert_eq!(note.id, id);
        assert_eq!(note.created_at, created_at);
        assert_eq!(note.title, "B");
        assert_eq!(note.color, "#ef4444");
    }
}
