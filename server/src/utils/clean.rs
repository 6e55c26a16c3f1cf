//! Text cleanup applied before chunking/contact extraction (spec §4.4).
//!
//! Grounded on `worker-node/ragger/utils.go`'s `cleanText`: strips zero-width
//! characters, collapses `\n`/`\"`/`\\` escape sequences left over from JSON
//! round-tripping, and trims a trailing partial escape. `\t`/`\r` are left
//! untouched, matching the original.

/// Strip zero-width characters and collapse literal `\n`/`\"`/`\\`
/// backslash-escape sequences left over from JSON round-tripping.
pub fn clean(input: &str) -> String {
    let without_zero_width: String = input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}'))
        .collect();

    let collapsed = without_zero_width
        .replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\");

    collapsed.strip_suffix('\\').unwrap_or(&collapsed).to_string()
}
