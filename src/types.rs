//! Shared types for the notesuite client.
//!
//! This module holds the request/response shapes exchanged with the notes
//! API and the command-line subcommands.
use std::{fmt, path::PathBuf, str::FromStr};

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};

use crate::{note::deserialize_id, note::deserialize_timestamp, NotesError};

/// A specialized Result type for notesuite operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Credentials sent to `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Result of `POST /notes/import`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Format accepted by `GET /notes/export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = NotesError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(NotesError::InvalidFormat {
                message: format!("Invalid export format: {}. Must be one of: json, markdown", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SharePermission {
    #[default]
    Read,
    Write,
}

impl FromStr for SharePermission {
    type Err = NotesError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "READ" => Ok(SharePermission::Read),
            "WRITE" => Ok(SharePermission::Write),
            other => Err(NotesError::InvalidFormat {
                message: format!("Invalid permission: {}. Must be one of: read, write", other),
            }),
        }
    }
}

/// Body of `POST /notes/{id}/share/user`.
#[derive(Debug, Clone, Serialize)]
pub struct ShareRequest {
    pub email: String,
    pub permission: SharePermission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteShare {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub permission: SharePermission,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicLink {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub url_token: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Options for the `list` command
#[derive(Args, Debug, Clone)]
pub struct ListNotesOptions {
    /// Only notes whose title or content contains this text (case-insensitive)
    #[clap(short, long)]
    pub search: Option<String>,

    /// Only notes carrying any of these tags (repeatable)
    #[clap(short, long = "tag")]
    pub tags: Vec<String>,

    /// Visibility filter: all, private, shared or public
    #[clap(short, long, default_value = "all")]
    pub visibility: String,

    /// Limit the number of notes returned (0 for no limit)
    #[clap(short = 'n', long, default_value_t = 0)]
    pub limit: usize,

    /// Format output as JSON
    #[clap(short, long)]
    pub json: bool,

    /// Only show note IDs and titles
    #[clap(short, long)]
    pub brief: bool,
}

/// Options for the `edit` command
#[derive(Args, Debug, Clone)]
pub struct EditNoteOptions {
    /// ID of the note to edit
    pub id: String,

    /// New title for the note
    #[clap(short = 'T', long)]
    pub title: Option<String>,

    /// New content for the note
    #[clap(short, long)]
    pub content: Option<String>,

    /// Path to a file containing the new note content
    #[clap(short, long)]
    pub file: Option<PathBuf>,

    /// Open the current content in an editor
    #[clap(short = 'e', long = "edit")]
    pub open_editor: bool,

    /// Tags to add (comma-separated)
    #[clap(short, long)]
    pub add_tags: Option<String>,

    /// Tags to remove (comma-separated)
    #[clap(short, long)]
    pub remove_tags: Option<String>,

    /// New visibility: private, shared or public
    #[clap(short, long)]
    pub visibility: Option<String>,
}

/// Available subcommands for the notesuite client
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session token
    Login {
        /// Username or email
        username: String,

        /// Password (prompted when omitted)
        #[clap(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        username: String,

        #[clap(short, long)]
        email: Option<String>,

        /// Password (prompted twice when omitted)
        #[clap(short, long)]
        password: Option<String>,
    },

    /// Sign out and forget the session token
    Logout,

    /// Show who the stored session belongs to
    Whoami,

    /// List notes with optional filtering
    List(ListNotesOptions),

    /// List every tag in use
    Tags,

    /// View a note by ID
    View {
        /// ID of the note to view
        id: String,

        /// Print the markdown source instead of the preview
        #[clap(short, long)]
        raw: bool,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Create a new note
    Create {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note, can be markdown formatted
        #[clap(short, long)]
        content: Option<String>,

        /// Open content in editor before saving
        #[clap(short, long)]
        edit: bool,

        /// Tags to associate with the note (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// Path to a file containing the note's content
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Visibility: private, shared or public
        #[clap(short, long, default_value = "private")]
        visibility: String,
    },

    /// Edit an existing note
    Edit(EditNoteOptions),

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Share a note with a user or through a public link
    Share {
        /// ID of the note to share
        id: String,

        /// Email of the user to share with
        #[clap(short, long, conflicts_with = "public")]
        email: Option<String>,

        /// Permission granted to the user: read or write
        #[clap(short = 'P', long, default_value = "read")]
        permission: String,

        /// Create a public link instead
        #[clap(short, long)]
        public: bool,
    },

    /// Export all notes to a file
    Export {
        /// Path where the export will be saved
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Format to export to
        #[clap(short, long, value_parser = ["json", "markdown"], default_value = "json")]
        format: String,
    },

    /// Import notes from a file
    Import {
        /// Path to the file to upload
        source: PathBuf,
    },

    /// Check that the notes service is reachable
    Health,

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_accepts_numeric_user_id() {
        let json = r#"{"token": "t", "user": {"id": 7, "username": "ada"}}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.user.id, "7");
        assert_eq!(response.user.email, None);
    }

    #[test]
    fn import_summary_defaults_errors() {
        let summary: ImportSummary = serde_json::from_str(r#"{"imported": 3}"#).unwrap();
        assert_eq!(summary.imported, 3);
        assert!(summary.errors.is_empty());
    }

    #[test]
    fn export_format_parsing() {
        assert_eq!("Markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!(ExportFormat::Markdown.extension(), "md");
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn public_link_shape() {
        let json = r#"{"id": 1, "urlToken": "abc123", "createdAt": "2024-01-01T00:00:00"}"#;
        let link: PublicLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.url_token, "abc123");
        assert!(link.active);
        assert!(link.expires_at.is_none());
    }
}
