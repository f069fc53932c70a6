//! Remote-backed note state.
//!
//! Wraps an [`ApiClient`] and a [`NoteBook`]; every call needs a signed-in
//! session and mirrors its outcome into the local notebook.
use log::{debug, error, info};

use crate::{ApiClient, Note, NoteBook, NoteDraft, NotesError, Result};

/// Keeps the local notebook in step with the notes API.
///
/// Every operation sends one request, waits for its single response and then
/// updates the notebook. A failure is kept as a display string in
/// `last_error` until the next operation starts.
pub struct NoteStorage {
    /// Client used for every remote call
    client: ApiClient,

    /// Local copy of the notes last seen from the server
    notebook: NoteBook,

    /// Set while a request is in flight
    loading: bool,

    /// Message of the most recent failure
    last_error: Option<String>,
}

impl NoteStorage {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            notebook: NoteBook::new(),
            loading: false,
            last_error: None,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn notebook(&self) -> &NoteBook {
        &self.notebook
    }

    pub fn notebook_mut(&mut self) -> &mut NoteBook {
        &mut self.notebook
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn begin(&mut self, operation: &str) {
        debug!("Starting {}", operation);
        self.loading = true;
        self.last_error = None;
    }

    fn finish<T>(&mut self, operation: &str, result: Result<T>) -> Result<T> {
        self.loading = false;
        if let Err(e) = &result {
            error!("{} failed: {}", operation, e);
            self.last_error = Some(e.to_string());
        }
        result
    }

    fn require_session(&self) -> Result<()> {
        if self.client.session().is_signed_in() {
            Ok(())
        } else {
            Err(NotesError::NotAuthenticated)
        }
    }

    /// Replaces the notebook with every note of the signed-in user.
    ///
    /// # Returns
    ///
    /// The number of notes now held locally
    pub async fn refresh(&mut self) -> Result<usize> {
        self.begin("refresh");
        let result: Result<Vec<Note>> = async {
            self.require_session()?;
            self.client.get_notes().await
        }
        .await;
        let notes = self.finish("refresh", result)?;

        self.notebook.replace_all(notes);
        info!("Loaded {} notes", self.notebook.len());
        Ok(self.notebook.len())
    }

    /// Fetches one note and stores it in the notebook, replacing any stale copy.
    pub async fn fetch_note(&mut self, id: &str) -> Result<Note> {
        self.begin("fetch note");
        let result: Result<Note> = async {
            self.require_session()?;
            self.client.get_note(id).await
        }
        .await;
        let note = self.finish("fetch note", result)?;

        self.notebook.upsert(note.clone());
        Ok(note)
    }

    /// Creates a note on the server and selects the stored copy.
    ///
    /// # Arguments
    ///
    /// * `draft` - Title, content, tags and visibility of the new note
    pub async fn create_note(&mut self, draft: &NoteDraft) -> Result<Note> {
        self.begin("create note");
        let result: Result<Note> = async {
            self.require_session()?;
            self.client.create_note(draft).await
        }
        .await;
        let note = self.finish("create note", result)?;

        self.notebook.upsert(note.clone());
        self.notebook.select(note.id())?;
        info!("Created note {}", note.id());
        Ok(note)
    }

    /// Replaces the fields of a note on the server. The server copy wins locally.
    pub async fn update_note(&mut self, id: &str, draft: &NoteDraft) -> Result<Note> {
        self.begin("update note");
        let result: Result<Note> = async {
            self.require_session()?;
            self.client.update_note(id, draft).await
        }
        .await;
        let note = self.finish("update note", result)?;

        self.notebook.upsert(note.clone());
        info!("Updated note {}", note.id());
        Ok(note)
    }

    /// Deletes a note remotely, then drops it from the notebook.
    pub async fn delete_note(&mut self, id: &str) -> Result<()> {
        self.begin("delete note");
        let result: Result<()> = async {
            self.require_session()?;
            self.client.delete_note(id).await
        }
        .await;
        self.finish("delete note", result)?;

        if self.notebook.remove(id).is_err() {
            debug!("Deleted note {} was not held locally", id);
        }
        info!("Deleted note {}", id);
        Ok(())
    }

    /// Runs a server-side search. The results replace the notebook contents.
    pub async fn search_remote(&mut self, query: &str) -> Result<Vec<Note>> {
        self.begin("search");
        let result: Result<Vec<Note>> = async {
            self.require_session()?;
            self.client.search_notes(query).await
        }
        .await;
        let notes = self.finish("search", result)?;

        info!("Search '{}' returned {} notes", query, notes.len());
        self.notebook.replace_all(notes.clone());
        Ok(notes)
    }

    /// Loads the notes carrying `tag` from the server into the notebook.
    pub async fn notes_by_tag_remote(&mut self, tag: &str) -> Result<Vec<Note>> {
        self.begin("tag lookup");
        let result: Result<Vec<Note>> = async {
            self.require_session()?;
            self.client.get_notes_by_tag(tag).await
        }
        .await;
        let notes = self.finish("tag lookup", result)?;

        info!("Found {} notes with tag: {}", notes.len(), tag);
        self.notebook.replace_all(notes.clone());
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_support::{respond_once, test_client, UNREACHABLE_BASE_URL},
        MemorySessionStore,
    };
    use std::sync::Arc;

    fn signed_in_storage(base_url: &str) -> NoteStorage {
        let session = Arc::new(MemorySessionStore::with_token("tok"));
        NoteStorage::new(test_client(base_url, session))
    }

    #[tokio::test]
    async fn refresh_replaces_notebook() {
        let (base, _server) = respond_once(
            "200 OK",
            r#"[{"id": 1, "title": "Welcome", "tags": ["welcome"]},
                {"id": 2, "title": "Ideas", "tags": ["projects"]}]"#,
        )
        .await;
        let mut storage = signed_in_storage(&base);
        storage.notebook_mut().create_note(NoteDraft::default());

        assert_eq!(storage.refresh().await.unwrap(), 2);
        assert_eq!(storage.notebook().notes()[0].title(), "Welcome");
        assert!(storage.notebook().current().is_none());
        assert!(!storage.is_loading());
        assert_eq!(storage.last_error(), None);
    }

    #[tokio::test]
    async fn refresh_without_session_fails_before_dispatch() {
        let session = Arc::new(MemorySessionStore::new());
        let mut storage = NoteStorage::new(test_client(UNREACHABLE_BASE_URL, session));

        let err = storage.refresh().await.unwrap_err();
        assert!(matches!(err, NotesError::NotAuthenticated));
        assert!(storage.last_error().is_some());
        assert!(!storage.is_loading());
    }

    #[tokio::test]
    async fn every_remote_call_needs_a_session() {
        let session = Arc::new(MemorySessionStore::new());
        let mut storage = NoteStorage::new(test_client(UNREACHABLE_BASE_URL, session));
        storage
            .notebook_mut()
            .insert(Note::with_id("9", "Local", ""))
            .unwrap();
        let draft = NoteDraft::new("Title", "");

        let errors = vec![
            storage.fetch_note("9").await.unwrap_err(),
            storage.create_note(&draft).await.unwrap_err(),
            storage.update_note("9", &draft).await.unwrap_err(),
            storage.delete_note("9").await.unwrap_err(),
            storage.search_remote("rust").await.unwrap_err(),
            storage.notes_by_tag_remote("work").await.unwrap_err(),
        ];

        for err in errors {
            assert!(matches!(err, NotesError::NotAuthenticated));
        }
        assert_eq!(
            storage.last_error(),
            Some(NotesError::NotAuthenticated.to_string().as_str())
        );
        assert!(!storage.is_loading());
        assert_eq!(storage.notebook().len(), 1);
        assert_eq!(storage.notebook().get("9").unwrap().title(), "Local");
    }

    #[tokio::test]
    async fn failure_is_recorded_and_notebook_untouched() {
        let (base, _server) = respond_once(
            "500 Internal Server Error",
            r#"{"message": "database unavailable"}"#,
        )
        .await;
        let mut storage = signed_in_storage(&base);
        storage
            .notebook_mut()
            .insert(Note::with_id("7", "Keep", "me"))
            .unwrap();

        let err = storage
            .update_note("7", &NoteDraft::new("Changed", ""))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(
            storage.last_error(),
            Some("database unavailable (HTTP 500)")
        );
        assert_eq!(storage.notebook().get("7").unwrap().title(), "Keep");
        assert!(!storage.is_loading());
    }

    #[tokio::test]
    async fn create_selects_server_copy() {
        let (base, server) = respond_once(
            "201 Created",
            r#"{"id": 42, "title": "Fresh", "content": "", "visibility": "PUBLIC"}"#,
        )
        .await;
        let mut storage = signed_in_storage(&base);

        let note = storage
            .create_note(&NoteDraft::new("Fresh", ""))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(note.id(), "42");
        assert_eq!(storage.notebook().current().map(Note::id), Some("42"));
    }

    #[tokio::test]
    async fn delete_removes_local_copy() {
        let (base, server) = respond_once("204 No Content", "").await;
        let mut storage = signed_in_storage(&base);
        storage
            .notebook_mut()
            .insert(Note::with_id("3", "Gone", ""))
            .unwrap();
        storage.notebook_mut().select("3").unwrap();

        storage.delete_note("3").await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("DELETE /api/notes/3 HTTP/1.1"));
        assert!(storage.notebook().is_empty());
        assert!(storage.notebook().current().is_none());
    }

    #[tokio::test]
    async fn search_results_replace_notebook() {
        let (base, server) = respond_once(
            "200 OK",
            r#"[{"id": 5, "title": "Rust notes", "content": "ownership"}]"#,
        )
        .await;
        let mut storage = signed_in_storage(&base);
        storage
            .notebook_mut()
            .insert(Note::with_id("1", "Other", ""))
            .unwrap();

        let found = storage.search_remote("rust").await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /api/notes/search?q=rust HTTP/1.1"));
        assert_eq!(found.len(), 1);
        assert_eq!(storage.notebook().len(), 1);
        assert_eq!(storage.notebook().notes()[0].id(), "5");
    }
}
