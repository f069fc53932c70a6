//! REST client for the notes service.
//!
//! One request, one awaited response. There is no retry, no request
//! deduplication and no version check on writes: the last write wins.
use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};
use reqwest::{
    multipart::{Form, Part},
    Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    normalize_base_url, Config, ExportFormat, HealthResponse, ImportSummary, LoginCredentials,
    LoginResponse, Note, NoteDraft, NoteShare, NotesError, PublicLink, RegisterRequest, Result,
    SessionStore, ShareRequest, VerifyTokenResponse,
};

/// Client for the notes API, constructed by the caller and passed to whoever needs it.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    /// Builds a client from the configured base URL and timeout.
    pub fn new(config: &Config, session: Arc<dyn SessionStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_http_client(http, &config.api_base_url, session))
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: &str,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = normalize_base_url(url);
        info!("API base URL set to {}", self.base_url);
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", method, url);
        let builder = self.http.request(method, url);
        match self.session.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = error_from_response(status.as_u16(), &body);
        warn!("Request failed: {}", error);
        Err(error)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        Ok(response.json::<T>().await?)
    }

    async fn fire(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).await?;
        Ok(())
    }

    // Authentication

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse> {
        self.fetch(self.request(Method::POST, "/auth/login").json(credentials))
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<LoginResponse> {
        self.fetch(self.request(Method::POST, "/auth/register").json(request))
            .await
    }

    pub async fn logout(&self) -> Result<()> {
        self.fire(self.request(Method::POST, "/auth/logout")).await
    }

    pub async fn verify_token(&self) -> Result<VerifyTokenResponse> {
        self.fetch(self.request(Method::GET, "/auth/verify")).await
    }

    // Notes

    pub async fn get_notes(&self) -> Result<Vec<Note>> {
        let notes: Vec<Note> = self.fetch(self.request(Method::GET, "/notes")).await?;
        debug!("Fetched {} notes", notes.len());
        Ok(notes)
    }

    pub async fn get_note(&self, id: &str) -> Result<Note> {
        let endpoint = format!("/notes/{}", urlencoding::encode(id));
        self.fetch(self.request(Method::GET, &endpoint)).await
    }

    pub async fn create_note(&self, draft: &NoteDraft) -> Result<Note> {
        self.fetch(self.request(Method::POST, "/notes").json(draft))
            .await
    }

    pub async fn update_note(&self, id: &str, draft: &NoteDraft) -> Result<Note> {
        let endpoint = format!("/notes/{}", urlencoding::encode(id));
        self.fetch(self.request(Method::PUT, &endpoint).json(draft))
            .await
    }

    pub async fn delete_note(&self, id: &str) -> Result<()> {
        let endpoint = format!("/notes/{}", urlencoding::encode(id));
        self.fire(self.request(Method::DELETE, &endpoint)).await
    }

    // Search

    pub async fn search_notes(&self, query: &str) -> Result<Vec<Note>> {
        let endpoint = format!("/notes/search?q={}", urlencoding::encode(query));
        self.fetch(self.request(Method::GET, &endpoint)).await
    }

    pub async fn get_notes_by_tag(&self, tag: &str) -> Result<Vec<Note>> {
        let endpoint = format!("/notes/tag/{}", urlencoding::encode(tag));
        self.fetch(self.request(Method::GET, &endpoint)).await
    }

    // Sharing

    pub async fn share_with_user(&self, id: &str, request: &ShareRequest) -> Result<NoteShare> {
        let endpoint = format!("/notes/{}/share/user", urlencoding::encode(id));
        self.fetch(self.request(Method::POST, &endpoint).json(request))
            .await
    }

    pub async fn create_public_link(&self, id: &str) -> Result<PublicLink> {
        let endpoint = format!("/notes/{}/share/public", urlencoding::encode(id));
        self.fetch(self.request(Method::POST, &endpoint)).await
    }

    pub async fn revoke_share(&self, share_id: &str) -> Result<()> {
        let endpoint = format!("/notes/shares/{}", urlencoding::encode(share_id));
        self.fire(self.request(Method::DELETE, &endpoint)).await
    }

    pub async fn revoke_public_link(&self, link_id: &str) -> Result<()> {
        let endpoint = format!("/notes/public-links/{}", urlencoding::encode(link_id));
        self.fire(self.request(Method::DELETE, &endpoint)).await
    }

    // Export / import

    /// Downloads every note of the signed-in user as one file.
    pub async fn export_notes(&self, format: ExportFormat) -> Result<Vec<u8>> {
        let endpoint = format!("/notes/export?format={}", format.as_str());
        let response = self.send(self.request(Method::GET, &endpoint)).await?;
        let bytes = response.bytes().await?;
        info!("Exported {} bytes as {}", bytes.len(), format);
        Ok(bytes.to_vec())
    }

    /// Uploads a file as the multipart field `file`.
    pub async fn import_notes(&self, file_name: &str, contents: Vec<u8>) -> Result<ImportSummary> {
        let part = Part::bytes(contents).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let summary: ImportSummary = self
            .fetch(self.request(Method::POST, "/notes/import").multipart(form))
            .await?;
        info!(
            "Imported {} notes ({} errors)",
            summary.imported,
            summary.errors.len()
        );
        Ok(summary)
    }

    pub async fn check_health(&self) -> Result<HealthResponse> {
        self.fetch(self.request(Method::GET, "/health")).await
    }
}

/// Maps a non-2xx response to [`NotesError::Api`], reading `message` and `code` from a JSON body when present.
pub fn error_from_response(status: u16, body: &str) -> NotesError {
    #[derive(Deserialize, Default)]
    struct ErrorBody {
        message: Option<String>,
        code: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    NotesError::Api {
        status,
        message: parsed
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP Error: {}", status)),
        code: parsed.code,
    }
}
