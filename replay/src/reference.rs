//! Replay identifiers

use std::fmt;

/// A normalized external replay id, e.g. `gen9vgc2024regg-2187654321`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplayRef(String);

impl ReplayRef {
    /// Normalize a user-supplied reference.
    ///
    /// Accepts a bare id or a replay URL (with or without scheme, query,
    /// fragment or a `.json`/`.log` suffix). Returns None when nothing
    /// usable is left.
    pub fn parse(input: &str) -> Option<Self> {
        let mut s = input.trim();

        // Drop scheme and host; a URL with no path has no id
        if let Some((_, rest)) = s.split_once("://") {
            s = rest.split_once('/').map(|(_, path)| path)?;
        }
        s = s.split(['?', '#']).next().unwrap_or("");
        s = s.trim_end_matches('/');

        // Keep the last path segment; a bare id has none
        if let Some((_, last)) = s.rsplit_once('/') {
            s = last;
        }

        for suffix in [".json", ".log"] {
            if let Some(stripped) = s.strip_suffix(suffix) {
                s = stripped;
            }
        }

        let id = s.trim().to_ascii_lowercase();
        if id.is_empty() || id.contains(char::is_whitespace) {
            return None;
        }

        Some(ReplayRef(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
