//! Filesystem-safe names from arbitrary text
//!
//! [`sanitize`] turns page titles and URL path segments into names that are
//! legal on Windows, macOS and Linux alike. It never fails: every input maps
//! to a non-empty name, and running the output through it again returns the
//! output unchanged.

use crate::paths::platform::PlatformPolicy;
use unicode_normalization::UnicodeNormalization;

/// Returned whenever nothing usable survives sanitization
pub const FALLBACK_NAME: &str = "unnamed";

/// Smallest accepted length bound; anything shorter could not hold the
/// fallback name or a prefixed reserved name
pub const MIN_NAME_LENGTH: usize = FALLBACK_NAME.len();

/// Characters replaced with `_`
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '\\', '/', '\r', '\n', '\t'];

/// Upper bound on entity decoding passes for nested escapes like `&amp;amp;`
const MAX_DECODE_PASSES: usize = 16;

/// Sanitizes `text` into a name of at most `max_length` characters using the
/// reserved-name set of the current platform
///
/// # Arguments
///
/// * `text` - Arbitrary input (page title, URL segment, ...)
/// * `max_length` - Length bound in characters, raised to [`MIN_NAME_LENGTH`]
///   when smaller
///
/// # Example
///
/// ```
/// use doc_mirror::sanitize;
///
/// assert_eq!(sanitize("Getting Started", 50), "Getting_Started");
/// assert_eq!(sanitize("CON", 50), "_CON");
/// assert_eq!(sanitize("   ", 50), "unnamed");
/// ```
pub fn sanitize(text: &str, max_length: usize) -> String {
    sanitize_with(text, max_length, &PlatformPolicy::current())
}

/// Sanitizes `text` against the reserved names of `policy`
///
/// Steps, in order:
///
/// 1. Blank input yields [`FALLBACK_NAME`]
/// 2. HTML entities are decoded and the text is normalized to NFKD
/// 3. `< > : " | ? * \ /` and CR, LF, TAB become `_`
/// 4. Remaining control characters are dropped
/// 5. Runs of whitespace and underscores collapse to one `_`
/// 6. Leading and trailing `.`, `_` and whitespace are stripped
/// 7. Reserved device names get a `_` prefix
/// 8. The result is cut to `max_length` characters and any exposed trailing
///    `.` or `_` is stripped (the reserved check runs again). A bound below
///    [`MIN_NAME_LENGTH`] is raised to it, so the result may be longer than
///    a tiny `max_length`
/// 9. An empty result yields [`FALLBACK_NAME`]
pub fn sanitize_with(text: &str, max_length: usize, policy: &PlatformPolicy) -> String {
    if text.trim().is_empty() {
        return FALLBACK_NAME.to_string();
    }
    let max_length = max_length.max(MIN_NAME_LENGTH);

    let normalized = normalize_text(text);

    let replaced: String = normalized
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .filter(|c| (*c as u32) >= 32)
        .collect();

    let collapsed = collapse_separators(&replaced);
    let mut name = guard_reserved(trim_separators(&collapsed).to_string(), policy);

    if name.chars().count() > max_length {
        let truncated: String = name.chars().take(max_length).collect();
        name = guard_reserved(trim_trailing(&truncated).to_string(), policy);
    }

    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

/// Decodes entities and applies NFKD until the text stops changing
///
/// Both steps can expose new work for the other (a fullwidth `＆` becomes
/// `&` under NFKD), so a single pass would not be idempotent.
fn normalize_text(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_DECODE_PASSES {
        let next: String = decode_entities(&current)
            .nfkd()
            .filter(|c| !is_dropped_control(*c))
            .collect();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Control characters removed outright; CR, LF and TAB are replaced instead
fn is_dropped_control(c: char) -> bool {
    (c as u32) < 32 && !matches!(c, '\r' | '\n' | '\t')
}

fn collapse_separators(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c == '_' || c.is_whitespace() {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c == '.' || c == '_' || c.is_whitespace())
}

fn trim_trailing(text: &str) -> &str {
    text.trim_end_matches(|c: char| c == '.' || c == '_' || c.is_whitespace())
}

fn guard_reserved(name: String, policy: &PlatformPolicy) -> String {
    if policy.is_reserved(&name) {
        format!("_{}", name)
    } else {
        name
    }
}

/// Decodes named (`&amp;`, `&nbsp;`, ...) and numeric (`&#39;`, `&#x27;`)
/// character references; unknown references are left untouched
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match decode_reference(tail) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decodes the reference at the start of `tail` (which begins with `&`),
/// returning the character and the number of bytes consumed
fn decode_reference(tail: &str) -> Option<(char, usize)> {
    let semicolon = tail[1..].find(';')? + 1;
    // "&#x10FFFF;" is the longest reference we accept
    if semicolon > 9 {
        return None;
    }
    let name = &tail[1..semicolon];

    let decoded = match name.strip_prefix('#') {
        Some(number) => {
            let (digits, radix) = match number.strip_prefix(['x', 'X']) {
                Some(hex) => (hex, 16),
                None => (number, 10),
            };
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            char::from_u32(u32::from_str_radix(digits, radix).ok()?)?
        }
        None => named_entity(name)?,
    };

    Some((decoded, semicolon + 1))
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "copy" => '\u{00a9}',
        "reg" => '\u{00ae}',
        "trade" => '\u{2122}',
        _ => return None,
    };
    Some(c)
}
