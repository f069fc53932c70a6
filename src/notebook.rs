//! In-memory note collection with the current selection and query.
use log::{debug, info, warn};

use crate::{all_tags, filter_notes, Note, NoteDraft, NotesError, Query, Result};

/// The authoritative list of notes shown by a front end.
///
/// Notes keep the order they were inserted in (new notes go first). Ids are
/// unique within a notebook.
#[derive(Debug, Clone, Default)]
pub struct NoteBook {
    notes: Vec<Note>,
    current: Option<String>,
    query: Query,
}

impl NoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a notebook from hydrated notes, dropping repeated ids.
    pub fn from_notes(notes: Vec<Note>) -> Self {
        let mut notebook = NoteBook::new();
        notebook.replace_all(notes);
        notebook
    }

    /// Replaces the whole collection, keeping the query and, if still present, the selection.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes.clear();
        for note in notes {
            if self.position(note.id()).is_some() {
                warn!("Skipping duplicate note id {}", note.id());
                continue;
            }
            self.notes.push(note);
        }

        if let Some(id) = &self.current {
            if self.position(id).is_none() {
                debug!("Selected note {} no longer present, clearing selection", id);
                self.current = None;
            }
        }
        info!("Notebook holds {} notes", self.notes.len());
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id() == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.notes.iter().position(|n| n.id() == id)
    }

    /// Creates a local note with a client-generated id, puts it first and selects it.
    pub fn create_note(&mut self, draft: NoteDraft) -> &Note {
        let mut note = Note::from_draft(draft);
        let base = note.id().to_string();
        let mut suffix = 1;
        while self.position(note.id()).is_some() {
            suffix += 1;
            note = rebuild_with_id(&note, format!("{}-{}", base, suffix));
        }

        debug!("Created local note {}", note.id());
        self.current = Some(note.id().to_string());
        self.notes.insert(0, note);
        &self.notes[0]
    }

    /// Adds a note at the front. Fails if the id is taken.
    pub fn insert(&mut self, note: Note) -> Result<()> {
        if self.position(note.id()).is_some() {
            return Err(NotesError::NoteAlreadyExists {
                id: note.id().to_string(),
            });
        }
        self.notes.insert(0, note);
        Ok(())
    }

    /// Replaces the note with the same id in place, or adds it at the front.
    pub fn upsert(&mut self, note: Note) {
        match self.position(note.id()) {
            Some(index) => self.notes[index] = note,
            None => self.notes.insert(0, note),
        }
    }

    /// Replaces the fields of a note and refreshes its `updated_at`.
    pub fn update_note(&mut self, id: &str, draft: NoteDraft) -> Result<&Note> {
        let index = self.position(id).ok_or_else(|| NotesError::NoteNotFound {
            id: id.to_string(),
        })?;
        self.notes[index].replace_fields(draft);
        Ok(&self.notes[index])
    }

    /// Removes a note; clears the selection if it pointed at it.
    pub fn remove(&mut self, id: &str) -> Result<Note> {
        let index = self.position(id).ok_or_else(|| NotesError::NoteNotFound {
            id: id.to_string(),
        })?;
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        Ok(self.notes.remove(index))
    }

    pub fn select(&mut self, id: &str) -> Result<&Note> {
        let index = self.position(id).ok_or_else(|| NotesError::NoteNotFound {
            id: id.to_string(),
        })?;
        self.current = Some(id.to_string());
        Ok(&self.notes[index])
    }

    pub fn deselect(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Note> {
        self.current.as_deref().and_then(|id| self.get(id))
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }

    pub fn set_query(&mut self, query: Query) {
        self.query = query;
    }

    /// Notes passing the current query, in notebook order.
    pub fn visible_notes(&self) -> Vec<Note> {
        filter_notes(&self.notes, &self.query)
    }

    /// Tag catalogue across every note, regardless of the query.
    pub fn all_tags(&self) -> Vec<String> {
        all_tags(&self.notes)
    }
}

fn rebuild_with_id(note: &Note, id: String) -> Note {
    let draft = note.to_draft();
    Note::with_id(id, draft.title, draft.content)
        .with_tags(draft.tags)
        .with_visibility(draft.visibility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Visibility, VisibilityFilter};

    fn notebook() -> NoteBook {
        NoteBook::from_notes(vec![
            Note::with_id("1", "Welcome", "hello").with_tags(["welcome"]),
            Note::with_id("2", "Ideas", "- [ ] app").with_tags(["projects"]),
        ])
    }

    #[test]
    fn duplicate_ids_are_dropped_on_hydration() {
        let book = NoteBook::from_notes(vec![
            Note::with_id("1", "a", ""),
            Note::with_id("1", "b", ""),
        ]);
        assert_eq!(book.len(), 1);
        assert_eq!(book.get("1").unwrap().title(), "a");
    }

    #[test]
    fn create_note_prepends_and_selects() {
        let mut book = notebook();
        let id = book.create_note(NoteDraft::default()).id().to_string();
        assert_eq!(book.notes()[0].id(), id);
        assert_eq!(book.current().unwrap().title(), "Untitled Note");
        assert_eq!(book.current().unwrap().content(), "# New Note\n\nStart writing...");

        // same title in the same millisecond still gets a fresh id
        let again = book.create_note(NoteDraft::default()).id().to_string();
        assert_ne!(again, id);
        assert_eq!(book.len(), 4);
    }

    #[test]
    fn insert_rejects_taken_id() {
        let mut book = notebook();
        let err = book.insert(Note::with_id("2", "dup", "")).unwrap_err();
        assert!(matches!(err, NotesError::NoteAlreadyExists { id } if id == "2"));
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut book = notebook();
        book.upsert(Note::with_id("2", "Ideas v2", ""));
        assert_eq!(book.notes()[1].title(), "Ideas v2");
        book.upsert(Note::with_id("3", "New", ""));
        assert_eq!(book.notes()[0].id(), "3");
    }

    #[test]
    fn update_bumps_timestamp() {
        let mut book = notebook();
        let draft = NoteDraft::new("Ideas", "- [x] app").with_visibility(Visibility::Public);
        let note = book.update_note("2", draft).unwrap();
        assert_eq!(note.visibility(), Visibility::Public);
        assert!(note.updated_at() >= note.created_at());
        assert!(book.update_note("missing", NoteDraft::default()).is_err());
    }

    #[test]
    fn removing_selected_note_clears_selection() {
        let mut book = notebook();
        book.select("1").unwrap();
        book.remove("2").unwrap();
        assert_eq!(book.current().map(|n| n.id()), Some("1"));
        book.remove("1").unwrap();
        assert!(book.current().is_none());
        assert!(book.remove("1").is_err());
    }

    #[test]
    fn replace_all_drops_stale_selection() {
        let mut book = notebook();
        book.select("2").unwrap();
        book.replace_all(vec![Note::with_id("1", "Welcome", "")]);
        assert!(book.current().is_none());
    }

    #[test]
    fn visible_notes_follow_query() {
        let mut book = notebook();
        book.query_mut().toggle_tag("projects");
        assert_eq!(book.visible_notes().len(), 1);
        book.query_mut().visibility = VisibilityFilter::Only(Visibility::Shared);
        assert!(book.visible_notes().is_empty());
        book.query_mut().clear();
        assert_eq!(book.visible_notes().len(), 2);
        assert_eq!(book.all_tags(), ["welcome", "projects"]);
    }
}
