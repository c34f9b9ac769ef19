//! Minimal key lookup in a JSON document.
//!
//! Grammar, applied to the first occurrence of `"<key>":`:
//! - spaces and tabs after the colon are skipped;
//! - a quoted value is returned verbatim up to the next quote not preceded by a
//!   backslash. Escapes are NOT decoded, so `"a\"b"` yields `a\"b`;
//! - any other value is returned verbatim up to the next `,`, `}` or `]` (or the
//!   end of input).
//!
//! Nesting is not tracked: a matching key inside a nested object wins if it
//! comes first.

/// Extract the raw value of `key` from `json`.
///
/// Returns `None` if the key is missing, nothing follows it, or a quoted value
/// is unterminated.
pub fn extract_value<'a>(json: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("\"{}\":", key);
    let start = json.find(&needle)? + needle.len();
    let rest = json[start..].trim_start_matches([' ', '\t']);

    if rest.is_empty() {
        return None;
    }

    if let Some(quoted) = rest.strip_prefix('"') {
        let mut escaped = false;
        for (i, c) in quoted.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => return Some(&quoted[..i]),
                _ => {}
            }
        }
        return None;
    }

    let end = rest.find([',', '}', ']']).unwrap_or(rest.len());
    Some(&rest[..end])
}
