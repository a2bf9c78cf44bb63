//! Text canonicalization shared by every comparison in the engine.
//!
//! Two forms exist and must not be mixed:
//! - display form: trimmed, single-spaced, case preserved. Used as fuzzy input.
//! - key form: lowercase, no whitespace, no separators. Used for equality and
//!   substring tests only.

/// Characters dropped from keys so `AB-123`, `ab_123` and `ab.123` compare equal.
pub const KEY_SEPARATORS: [char; 5] = ['-', '_', '.', '/', '\\'];

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_display(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase, strip all whitespace and [`KEY_SEPARATORS`].
pub fn normalize_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !KEY_SEPARATORS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}
