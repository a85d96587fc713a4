//! Per-book scratchpad notes

use crate::traits::*;
use crate::types::*;

/// Note store: a free-form checklist per book, with no ledger invariants.
/// Notes are not a recycle-bin entity; deletion is final.
pub struct NoteStore<S: BookStorage> {
    storage: S,
}

impl<S: BookStorage> NoteStore<S> {
    /// Create a new note store over the given storage
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// List a book's notes, oldest first
    pub async fn list_notes(&self, book_id: &str) -> LedgerResult<Vec<Note>> {
        self.storage.list_notes(book_id).await
    }

    /// Create a note
    pub async fn create_note(&mut self, book_id: &str, text: &str) -> LedgerResult<Note> {
        if text.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Note text cannot be empty".to_string(),
            ));
        }
        let note = Note::new(book_id.to_string(), text.trim().to_string());
        self.storage.save_note(&note).await?;
        Ok(note)
    }

    /// Replace a note's text
    pub async fn update_note(
        &mut self,
        book_id: &str,
        note_id: &str,
        text: &str,
    ) -> LedgerResult<Note> {
        if text.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Note text cannot be empty".to_string(),
            ));
        }
        let mut note = self.get_note_required(book_id, note_id).await?;
        note.text = text.trim().to_string();
        self.storage.update_note(&note).await?;
        Ok(note)
    }

    /// Flip a note's completion state
    pub async fn toggle_note(&mut self, book_id: &str, note_id: &str) -> LedgerResult<Note> {
        let mut note = self.get_note_required(book_id, note_id).await?;
        note.is_completed = !note.is_completed;
        self.storage.update_note(&note).await?;
        Ok(note)
    }

    /// Delete a note permanently
    pub async fn delete_note(&mut self, book_id: &str, note_id: &str) -> LedgerResult<()> {
        self.get_note_required(book_id, note_id).await?;
        self.storage.delete_note(note_id).await
    }

    async fn get_note_required(&self, book_id: &str, note_id: &str) -> LedgerResult<Note> {
        match self.storage.get_note(note_id).await? {
            Some(note) if note.book_id == book_id => Ok(note),
            _ => Err(LedgerError::NotFound(format!(
                "note '{note_id}' in book '{book_id}'"
            ))),
        }
    }
}
