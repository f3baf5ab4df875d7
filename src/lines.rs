//! Subway line codes and their canonical display names.
//!
//! The lookup is the single source of truth for both the recoder and the
//! per-line aggregations.

/// Raw line code → canonical line name.
pub static LINE_CODES: &[(&str, &str)] = &[
    ("BD", "Line 02 Green"),
    ("SHP", "Line 04 Sheppard"),
    ("SRT", "Line 03 Scarborough"),
    ("YU", "Line 01 Yellow"),
];

/// Canonical line names in line-number order.
pub static CANONICAL_LINES: [&str; 4] = [
    "Line 01 Yellow",
    "Line 02 Green",
    "Line 03 Scarborough",
    "Line 04 Sheppard",
];

/// Returns the canonical name for a raw line code, if the code is known.
pub fn canonical_name(code: &str) -> Option<&'static str> {
    LINE_CODES
        .iter()
        .find(|(raw, _)| *raw == code)
        .map(|(_, name)| *name)
}

/// Returns `true` if `line` is one of the four canonical line names.
pub fn is_canonical(line: &str) -> bool {
    CANONICAL_LINES.contains(&line)
}
