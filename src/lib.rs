//! Notes Suite client library
//!
//! This library provides the note model, client-side filtering, a
//! line-oriented markdown preview and summarizer, session handling and a
//! REST client for the notes service, plus the command-line front end.

mod auth;
mod cli;
mod client;
mod config;
mod errors;
mod filter;
mod helper;
mod markdown;
mod note;
mod notebook;
mod session;
mod storage;
mod types;

#[cfg(test)]
mod test_support;

// Re-export key components
pub use auth::*;
pub use cli::*;
pub use client::*;
pub use config::*;
pub use errors::*;
pub use filter::*;
pub use helper::*;
pub use markdown::*;
pub use note::*;
pub use notebook::*;
pub use session::*;
pub use storage::*;
pub use types::*;
