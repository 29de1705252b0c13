//! Name and species normalization shared by every comparison in the workspace

/// Normalize a player display name for identity comparison.
///
/// Leading decorative symbols (`☆`, `+`, `%`, ...) are dropped, then every
/// remaining non-alphanumeric character, and the result is lowercased.
/// `"☆Ash Ketchum"` and `"ashketchum"` normalize to the same value.
pub fn normalize_name(name: &str) -> String {
    name.trim_start_matches(|c: char| !c.is_alphanumeric())
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Exact equality of two normalized player names. Empty names never match.
pub fn names_match(a: &str, b: &str) -> bool {
    let a = normalize_name(a);
    !a.is_empty() && a == normalize_name(b)
}

/// Normalize a species name for set comparisons: trimmed and case-folded.
pub fn normalize_species(species: &str) -> String {
    species.trim().to_lowercase()
}
