//! Output naming helpers

use std::path::{Path, PathBuf};

/// Characters that are rejected in file names on at least one major platform
const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maps user-supplied segment labels to file-system-safe stems
pub struct NameSanitizer;

impl NameSanitizer {
    /// Trim surrounding whitespace and replace every invalid character with `_`
    pub fn sanitize(name: &str) -> String {
        name.trim()
            .chars()
            .map(|ch| if INVALID_CHARS.contains(&ch) { '_' } else { ch })
            .collect()
    }

    /// `output_dir/<sanitized name>.<extension>`
    pub fn output_path(output_dir: &Path, name: &str, extension: &str) -> PathBuf {
        output_dir.join(format!(
            "{}.{}",
            Self::sanitize(name),
            extension.trim_start_matches('.')
        ))
    }

    /// Split free text into segment names, one per line.
    /// Lines are trimmed and blank lines are dropped.
    pub fn parse_names(text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Split a comma separated list into names, trimming each entry
    pub fn parse_name_list(text: &str) -> Vec<String> {
        text.split(',').map(|name| name.trim().to_string()).collect()
    }
}
