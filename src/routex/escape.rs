//! Literal escaping shared by the printer and the parser.
//!
//! # Responsibilities
//! - Escape special characters when printing string and regex literals
//! - Unescape them when lexing, as the exact inverse
//!
//! # Design Decisions
//! - Backslash is escaped first so the special-character pass never
//!   double-escapes backslashes it just inserted
//! - Unescape reverses the two phases in the opposite order
//! - Double-quoted strings escape `"`; slash-delimited regexps escape `/`

/// Escape `special` characters in `value` with a backslash prefix.
///
/// A literal backslash becomes a double backslash before any special
/// character is processed; the order is load-bearing for round-tripping.
pub fn escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Inverse of [`escape`]: resolves backslash-prefixed `special` characters
/// and collapses double backslashes, in one left-to-right pass.
///
/// Other backslash pairs (e.g. `\d` inside a regexp) pass through untouched,
/// so regex escape sequences survive the literal syntax.
/// `unescape(escape(s, chars), chars) == s` holds for every `s`.
pub fn unescape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if next == '\\' || special.contains(&next) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
