// Note service - In-memory chart annotations
use crate::application::error::ServiceError;
use crate::domain::note::{Note, NoteDraft};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Notes live only as long as the process.
#[derive(Clone, Default)]
pub struct NoteService {
    notes: Arc<RwLock<HashMap<Uuid, Note>>>,
}

impl NoteService {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, Note>>, ServiceError> {
        self.notes
            .read()
            .map_err(|_| ServiceError::NoteStoreUnavailable)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, Note>>, ServiceError> {
        self.notes
            .write()
            .map_err(|_| ServiceError::NoteStoreUnavailable)
    }

    /// All notes ordered by the chart position they annotate.
    pub fn list(&self) -> Result<Vec<Note>, ServiceError> {
        let mut notes: Vec<Note> = self.read()?.values().cloned().collect();
        notes.sort_by_key(|n| (n.timestamp, n.created_at));
        Ok(notes)
    }

    pub fn create(&self, draft: NoteDraft) -> Result<Note, ServiceError> {
        let note = Note::create(draft)?;
        self.write()?.insert(note.id, note.clone());
        Ok(note)
    }

    pub fn update(&self, id: Uuid, draft: NoteDraft) -> Result<Note, ServiceError> {
        let mut notes = self.write()?;
        let note = notes.get_mut(&id).ok_or(ServiceError::NoteNotFound(id))?;
        note.apply(draft)?;
        Ok(note.clone())
    }

    pub fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut notes = self.write()?;
        notes
            .remove(&id)
            .map(|_| ())
            .ok_or(ServiceError::NoteNotFound(id))
    }
}
