use std::{fs, path::Path};

use log::{debug, trace};

use crate::{NotesError, Result};

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Reads note content from a local file
pub fn read_content_from_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(NotesError::FileNotFound {
            file_path: path.display().to_string(),
        });
    }

    if !path.is_file() {
        return Err(NotesError::ApplicationError {
            message: format!("Not a file: {}", path.display()),
        });
    }

    debug!("Reading note content from {}", path.display());
    Ok(fs::read_to_string(path)?)
}

/// Drops the `<!-- ... -->` instruction lines written into editor templates
pub fn strip_editor_comments(content: &str) -> String {
    let kept: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim_start().starts_with("<!--") && !line.trim_end().ends_with("-->"))
        .collect();
    trace!(
        "Kept {} of {} editor lines",
        kept.len(),
        content.lines().count()
    );
    kept.join("\n").trim().to_string()
}

/// Uses a leading `# Heading` as the title, returning it with the remaining body
pub fn split_title(content: &str) -> (Option<String>, String) {
    let mut lines = content.lines();
    match lines.next() {
        Some(first) if first.starts_with("# ") => {
            let title = first[2..].trim().to_string();
            let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
            ((!title.is_empty()).then_some(title), body)
        }
        _ => (None, content.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn tags_are_split_and_trimmed() {
        assert_eq!(
            parse_tags(Some(" rust, notes ,,cli ".to_string())),
            vec!["rust", "notes", "cli"]
        );
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let err = read_content_from_file(&dir.path().join("nope.md")).unwrap_err();
        assert!(matches!(err, NotesError::FileNotFound { .. }));
        assert!(read_content_from_file(dir.path()).is_err());
    }

    #[test]
    fn file_content_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "# Hello\nbody").unwrap();
        assert_eq!(read_content_from_file(&path).unwrap(), "# Hello\nbody");
    }

    #[test]
    fn editor_comments_are_removed() {
        let raw = "# Title\n\n<!-- \nWrite below.\n-->\n\nReal text\n";
        assert_eq!(strip_editor_comments(raw), "# Title\n\nWrite below.\n\nReal text");
    }

    #[test]
    fn heading_becomes_title() {
        let (title, body) = split_title("# Groceries\n\n- [ ] milk");
        assert_eq!(title.as_deref(), Some("Groceries"));
        assert_eq!(body, "- [ ] milk");

        let (title, body) = split_title("no heading");
        assert!(title.is_none());
        assert_eq!(body, "no heading");
    }
}
