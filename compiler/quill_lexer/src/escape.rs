//! Escape sequence processing for string literals.

/// Resolve a single escape character (the one after `\`).
#[inline]
fn resolve_escape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '0' => Some('\0'),
        _ => None,
    }
}

/// Process the escapes of a string literal body (without quotes).
///
/// On an unknown escape returns the byte offset of its backslash within
/// `body`.
pub(crate) fn unescape_string(body: &str) -> Result<String, usize> {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.char_indices();

    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            match chars.next().and_then(|(_, esc)| resolve_escape(esc)) {
                Some(resolved) => result.push(resolved),
                None => return Err(idx),
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}
