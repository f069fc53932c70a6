//! Core data structures for notes.
//!
//! Fields are private. A note changes only through [`Note::replace_fields`]
//! or the tag helpers, and each of them refreshes `updated_at`.
use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::NotesError;

pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";
pub const DEFAULT_NOTE_CONTENT: &str = "# New Note\n\nStart writing...";

/// Sharing scope of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Private,
    Shared,
    Public,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Visibility::Private, Visibility::Shared, Visibility::Public];

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "PRIVATE",
            Visibility::Shared => "SHARED",
            Visibility::Public => "PUBLIC",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Visibility::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| NotesError::InvalidFormat {
                message: format!(
                    "Unknown visibility '{}'. Must be one of: private, shared, public",
                    s
                ),
            })
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// The replaceable field set of a note.
///
/// Serves as the JSON body for `POST /notes` and `PUT /notes/{id}` and as the
/// argument of [`Note::replace_fields`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            visibility: Visibility::default(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = dedup_tags(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

impl Default for NoteDraft {
    fn default() -> Self {
        NoteDraft::new(DEFAULT_NOTE_TITLE, DEFAULT_NOTE_CONTENT)
    }
}

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    title: String,
    #[serde(default, alias = "contentMd", deserialize_with = "deserialize_nullable_string")]
    content: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_visibility")]
    visibility: Visibility,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    updated_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Creates a new local note; the id is derived from the creation time and title.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let title = title.into();
        let now = Utc::now();
        let id = format!(
            "{}-{}",
            now.timestamp_millis(),
            title.trim().to_lowercase().replace(' ', "-")
        );
        Self::with_id(id, title, content)
    }

    /// Creates a note with a caller-chosen id, timestamped now.
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Note {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            visibility: Visibility::default(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Creates a local note from a draft.
    pub fn from_draft(draft: NoteDraft) -> Self {
        let mut note = Note::new(draft.title, draft.content);
        note.tags = dedup_tags(draft.tags);
        note.visibility = draft.visibility;
        note
    }

    // Builders below only apply at creation and do not count as mutations.

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = dedup_tags(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns the current field set, ready to be edited and passed back.
    pub fn to_draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            visibility: self.visibility,
        }
    }

    /// Replaces title, content, tags and visibility together and bumps `updated_at`.
    pub fn replace_fields(&mut self, draft: NoteDraft) {
        self.title = draft.title;
        self.content = draft.content;
        self.tags = dedup_tags(draft.tags);
        self.visibility = draft.visibility;
        self.touch();
    }

    /// Adds a tag. Returns false (and leaves the note untouched) if it was already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        self.touch();
        true
    }

    /// Removes a tag. Returns false if the note did not carry it.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        if self.tags.len() == before {
            return false;
        }
        self.touch();
        true
    }

    fn touch(&mut self) {
        let now = Utc::now();
        // updated_at never goes behind created_at, even with a skewed server clock
        self.updated_at = Some(match self.created_at {
            Some(created) if created > now => created,
            _ => now,
        });
    }
}

/// Removes blank and repeated tags, keeping first-seen order.
pub fn dedup_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut unique: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !unique.iter().any(|t| t == tag) {
            unique.push(tag.to_string());
        }
    }
    unique
}

/// Parses an RFC 3339 timestamp, or a zone-less ISO date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()))
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(id) if id.is_empty() => Err(de::Error::custom("note id is empty")),
        RawId::Text(id) => Ok(id),
        RawId::Number(id) => Ok(id.to_string()),
    }
}

/// `null` reads as an empty string.
fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}

fn deserialize_visibility<'de, D>(deserializer: D) -> Result<Visibility, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Visibility> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(dedup_tags(raw.unwrap_or_default()))
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s).map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_note_defaults_to_private_with_equal_timestamps() {
        let note = Note::new("Project Ideas", "# Project Ideas");
        assert!(note.id().ends_with("-project-ideas"));
        assert_eq!(note.visibility(), Visibility::Private);
        assert!(note.tags().is_empty());
        assert_eq!(note.created_at(), note.updated_at());
    }

    #[test]
    fn replace_fields_bumps_updated_at_and_keeps_created_at() {
        let mut note = Note::with_id("1", "Welcome", "hello");
        let created = note.created_at();
        note.created_at = created.map(|c| c - Duration::hours(1));
        note.updated_at = note.created_at;

        let draft = note
            .to_draft()
            .with_tags(["a", "b", "a"])
            .with_visibility(Visibility::Shared);
        note.replace_fields(draft);

        assert_eq!(note.tags(), ["a", "b"]);
        assert_eq!(note.visibility(), Visibility::Shared);
        assert!(note.updated_at() > note.created_at());
    }

    #[test]
    fn updated_at_never_precedes_created_at() {
        let mut note = Note::with_id("1", "t", "c");
        let future = Utc::now() + Duration::days(1);
        note.created_at = Some(future);
        note.replace_fields(NoteDraft::new("t2", "c2"));
        assert_eq!(note.updated_at(), Some(future));
    }

    #[test]
    fn adding_present_tag_is_a_noop() {
        let mut note = Note::with_id("1", "t", "c").with_tags(["work"]);
        let stamp = note.updated_at();
        assert!(!note.add_tag("work"));
        assert_eq!(note.tags(), ["work"]);
        assert_eq!(note.updated_at(), stamp);
        assert!(note.add_tag("Work"));
        assert_eq!(note.tags(), ["work", "Work"]);
        assert!(note.remove_tag("work"));
        assert!(!note.remove_tag("work"));
    }

    #[test]
    fn visibility_parses_case_insensitively() {
        assert_eq!("shared".parse::<Visibility>().unwrap(), Visibility::Shared);
        assert_eq!("PUBLIC".parse::<Visibility>().unwrap(), Visibility::Public);
        assert!("team".parse::<Visibility>().is_err());
    }

    #[test]
    fn deserializes_backend_shape_with_numeric_id() {
        let json = r#"{
            "id": 42,
            "title": "Backend note",
            "contentMd": "body",
            "tags": ["x", "x", "y"],
            "visibility": "PUBLIC",
            "createdAt": "2024-03-01T10:15:30",
            "updatedAt": "2024-03-02T08:00:00.123"
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.id(), "42");
        assert_eq!(note.content(), "body");
        assert_eq!(note.tags(), ["x", "y"]);
        assert_eq!(note.visibility(), Visibility::Public);
        assert_eq!(
            note.created_at().unwrap().to_rfc3339(),
            "2024-03-01T10:15:30+00:00"
        );
    }

    #[test]
    fn missing_optional_fields_are_empty_not_errors() {
        let json = r#"{"id": "abc", "title": "t", "content": "c", "tags": null}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert!(note.tags().is_empty());
        assert_eq!(note.visibility(), Visibility::Private);
        assert_eq!(note.created_at(), None);
        assert_eq!(note.updated_at(), None);
    }

    #[test]
    fn null_fields_fall_back_to_defaults() {
        let json = r#"{"id": 1, "title": null, "content": "c", "visibility": null}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.title(), "");
        assert_eq!(note.content(), "c");
        assert_eq!(note.visibility(), Visibility::Private);

        let json = r#"{"id": 2, "contentMd": null}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.content(), "");
    }

    #[test]
    fn visibility_field_accepts_any_case_and_rejects_unknown() {
        let note: Note = serde_json::from_str(r#"{"id": 1, "visibility": "pUbLiC"}"#).unwrap();
        assert_eq!(note.visibility(), Visibility::Public);

        let err = serde_json::from_str::<Note>(r#"{"id": 1, "visibility": "team"}"#).unwrap_err();
        assert!(err.to_string().contains("Unknown visibility 'team'"));
    }

    #[test]
    fn serializes_camel_case_and_skips_unset_timestamps() {
        let json = r#"{"id": "abc", "title": "t", "content": "c"}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["visibility"], "PRIVATE");
        assert!(value.get("createdAt").is_none());

        let draft = NoteDraft::new("t", "c").with_tags(["a"]);
        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(body, serde_json::json!({"title": "t", "content": "c", "tags": ["a"], "visibility": "PRIVATE"}));
    }
}
