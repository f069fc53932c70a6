//! Client-side note filtering.
//!
//! A [`Query`] combines free text, a set of tags and a visibility selector.
//! Filtering is pure: it never touches the input and always returns the
//! matching notes in their original order.
use std::{fmt, str::FromStr};

use log::trace;

use crate::{Note, NotesError, Visibility};

/// Visibility selector of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityFilter {
    #[default]
    All,
    Only(Visibility),
}

impl VisibilityFilter {
    pub fn matches(&self, visibility: Visibility) -> bool {
        match self {
            VisibilityFilter::All => true,
            VisibilityFilter::Only(wanted) => *wanted == visibility,
        }
    }
}

impl fmt::Display for VisibilityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityFilter::All => f.write_str("all"),
            VisibilityFilter::Only(v) => write!(f, "{}", v.as_str().to_lowercase()),
        }
    }
}

impl FromStr for VisibilityFilter {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(VisibilityFilter::All);
        }
        s.parse::<Visibility>().map(VisibilityFilter::Only)
    }
}

/// Transient filter state held by whoever displays the note list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Free text, matched case-insensitively against title and content
    pub text: String,
    /// Required tags; a note needs any one of them
    pub tags: Vec<String>,
    pub visibility: VisibilityFilter,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    pub fn with_visibility(mut self, visibility: VisibilityFilter) -> Self {
        self.visibility = visibility;
        self
    }

    /// Adds the tag if absent, removes it if present.
    pub fn toggle_tag(&mut self, tag: &str) {
        self.tags = toggle_tag(&self.tags, tag);
    }

    /// Resets text, tags and visibility.
    pub fn clear(&mut self) {
        *self = Query::default();
    }

    /// True when at least one filter would exclude something.
    pub fn is_active(&self) -> bool {
        !self.text.is_empty() || !self.tags.is_empty() || self.visibility != VisibilityFilter::All
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.matches_text(note) && self.matches_tags(note) && self.visibility.matches(note.visibility())
    }

    fn matches_text(&self, note: &Note) -> bool {
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        note.title().to_lowercase().contains(&needle)
            || note.content().to_lowercase().contains(&needle)
    }

    fn matches_tags(&self, note: &Note) -> bool {
        self.tags.is_empty() || self.tags.iter().any(|tag| note.has_tag(tag))
    }
}

/// Returns the notes matching `query`, keeping their relative order.
pub fn filter_notes(notes: &[Note], query: &Query) -> Vec<Note> {
    let matching: Vec<Note> = notes
        .iter()
        .filter(|note| query.matches(note))
        .cloned()
        .collect();

    trace!(
        "Filter kept {} of {} notes (text={:?}, tags={:?}, visibility={})",
        matching.len(),
        notes.len(),
        query.text,
        query.tags,
        query.visibility
    );
    matching
}

/// Adds `tag` to the selection if absent, removes it if present.
pub fn toggle_tag(selected: &[String], tag: &str) -> Vec<String> {
    if selected.iter().any(|t| t == tag) {
        selected.iter().filter(|t| *t != tag).cloned().collect()
    } else {
        let mut next = selected.to_vec();
        next.push(tag.to_string());
        next
    }
}

/// Every tag used in `notes`, once, in order of first appearance.
pub fn all_tags(notes: &[Note]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in notes.iter().flat_map(|note| note.tags()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}
