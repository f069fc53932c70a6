//! Error types for the notesuite client.
//!
//! This module defines the error type shared by the note model, the API
//! client, the session store and the command-line front end.

use std::io;

use thiserror::Error;

/// The main error type for the notesuite client.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request never produced an HTTP response (connection refused, timeout, bad body).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Input rejected before any request was dispatched.
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// An operation needs a session token but none is stored.
    #[error("Not signed in. Run `notesuite login` first")]
    NotAuthenticated,

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Note with the same ID already exists.
    #[error("Note already exists: {id}")]
    NoteAlreadyExists { id: String },

    /// Invalid note format or content.
    #[error("Invalid note format: {message}")]
    InvalidFormat { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// for mutex lock acquisition issues
    #[error("{message}")]
    LockAcquisitionFailed { message: String },

    /// file not found
    #[error("File not found: {file_path}")]
    FileNotFound { file_path: String },

    #[error("{message}")]
    EditorError { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}

impl NotesError {
    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            NotesError::Api { status, .. } => Some(*status),
            NotesError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Machine-readable error code returned by the server, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            NotesError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        NotesError::Validation {
            message: message.into(),
        }
    }
}
