//! Extraction of video identifiers from a results file.
//!
//! A results file is plain text. Lines that start with `Url:` name a video; all other lines are
//! ignored. The video identifier is the part of a `Url:` line that follows the delimiter:
//!
//! ```text
//! Title: Some Song
//! Url:https://www.youtube.com/watch?dQw4w9WgXcQ
//! Note: lines without the prefix are skipped
//! ```

use eyre::Context;
use std::path::Path;

/// Default name of the results file, relative to the working directory.
pub const SOURCE_FILE: &str = "results.txt";

/// How video lines in a results file are recognized and split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFormat {
    /// Literal text a line must start with to name a video.
    pub prefix: String,
    /// Separator in front of the video identifier.
    pub delimiter: char,
}

impl Default for SourceFormat {
    fn default() -> Self {
        Self {
            prefix: "Url:".to_string(),
            delimiter: '?',
        }
    }
}

impl SourceFormat {
    /// Same prefix as the default, but with a different delimiter.
    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }
}

/// A line that carries the prefix but no identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number.
    pub line_number: usize,
    pub line: String,
}

/// Result of reading a results file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSource {
    /// Video identifiers in file order, duplicates included.
    pub videos: Vec<String>,
    /// Prefixed lines that were skipped because no identifier could be extracted.
    pub malformed: Vec<MalformedLine>,
}

/// Reads and parses the results file at `path`.
pub async fn read_source_file(path: &Path, format: &SourceFormat) -> eyre::Result<ParsedSource> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read video list {}", path.display()))?;
    Ok(parse_source(&contents, format))
}

/// Extracts the video identifiers from the contents of a results file.
///
/// The identifier is the text between the first and the second occurrence of the delimiter, or
/// up to the end of the line if it occurs only once. A prefixed line without a delimiter, or with
/// nothing after it, is reported and skipped.
pub fn parse_source(contents: &str, format: &SourceFormat) -> ParsedSource {
    let mut parsed = ParsedSource::default();
    for (i, line) in contents.lines().enumerate() {
        if !line.starts_with(&format.prefix) {
            continue;
        }
        match line.split(format.delimiter).nth(1) {
            Some(video_id) if !video_id.is_empty() => {
                tracing::trace!(line = i + 1, video_id, "found video");
                parsed.videos.push(video_id.to_string());
            }
            _ => {
                tracing::warn!(
                    line = i + 1,
                    delimiter = %format.delimiter,
                    "skipping malformed video line: {}",
                    line
                );
                parsed.malformed.push(MalformedLine {
                    line_number: i + 1,
                    line: line.to_string(),
                });
            }
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_in_file_order() {
        let parsed = parse_source(
            "Url:abc?VIDEO1\nNote: skip\nUrl:abc?VIDEO2\n",
            &SourceFormat::default(),
        );
        assert_eq!(parsed.videos, vec!["VIDEO1", "VIDEO2"]);
        assert!(parsed.malformed.is_empty());
    }

    #[test]
    fn equals_delimiter() {
        let parsed = parse_source(
            "Url:https://www.youtube.com/watch?v=VIDEO1\r\nUrl:https://www.youtube.com/watch?v=VIDEO2\r\n",
            &SourceFormat::with_delimiter('='),
        );
        assert_eq!(parsed.videos, vec!["VIDEO1", "VIDEO2"]);
    }

    #[test]
    fn identifier_stops_at_next_delimiter() {
        let parsed = parse_source("Url:a?VIDEO1?t=30\n", &SourceFormat::default());
        assert_eq!(parsed.videos, vec!["VIDEO1"]);
    }

    #[test]
    fn prefix_must_start_the_line() {
        let parsed = parse_source(
            " Url:abc?VIDEO1\nurl:abc?VIDEO2\nTitle Url:abc?VIDEO3\n",
            &SourceFormat::default(),
        );
        assert!(parsed.videos.is_empty());
        assert!(parsed.malformed.is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let parsed = parse_source("Url:x?A\nUrl:x?B\nUrl:x?A\n", &SourceFormat::default());
        assert_eq!(parsed.videos, vec!["A", "B", "A"]);
    }

    #[test]
    fn malformed_lines_are_skipped_and_reported() {
        let parsed = parse_source(
            "Url:abc?VIDEO1\nUrl:no-delimiter\nUrl:trailing?\nUrl:abc?VIDEO2\n",
            &SourceFormat::default(),
        );
        assert_eq!(parsed.videos, vec!["VIDEO1", "VIDEO2"]);
        assert_eq!(
            parsed.malformed,
            vec![
                MalformedLine {
                    line_number: 2,
                    line: "Url:no-delimiter".into(),
                },
                MalformedLine {
                    line_number: 3,
                    line: "Url:trailing?".into(),
                },
            ]
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            parse_source("", &SourceFormat::default()),
            ParsedSource::default()
        );
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SOURCE_FILE);
        let err = read_source_file(&path, &SourceFormat::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains(SOURCE_FILE), "{err:#}");
    }
}
