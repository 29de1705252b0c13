//! Line tokenizer

/// Field delimiter used by every protocol line
pub const DELIMITER: char = '|';

/// Split one log line into its fields.
///
/// Protocol lines start with a `|`, which would otherwise produce an empty
/// first field; that field is dropped. Lines without the leading delimiter
/// are split as-is. Trailing empty fields are kept since positions matter
/// (`|rated|` has an empty message field).
pub fn tokenize(line: &str) -> Vec<&str> {
    if line.is_empty() {
        return Vec::new();
    }

    let body = line.strip_prefix(DELIMITER).unwrap_or(line);
    body.split(DELIMITER).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_delimiter_dropped() {
        assert_eq!(tokenize("|type|a|b|c"), vec!["type", "a", "b", "c"]);
    }

    #[test]
    fn test_no_leading_delimiter() {
        assert_eq!(tokenize("type|a"), vec!["type", "a"]);
    }

    #[test]
    fn test_empty_line() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_spacer_line() {
        assert_eq!(tokenize("|"), vec![""]);
    }

    #[test]
    fn test_trailing_empty_field_kept() {
        assert_eq!(tokenize("|rated|"), vec!["rated", ""]);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokenize("just some chat"), vec!["just some chat"]);
    }
}
