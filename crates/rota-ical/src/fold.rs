//! Content line folding and text escaping.

/// Maximum line length in octets (not characters), excluding the CRLF.
const MAX_LINE_OCTETS: usize = 75;

/// Folds a content line so no physical line exceeds 75 octets.
///
/// Continuation lines start with a single space, which counts toward their
/// length. Breaks only fall on UTF-8 character boundaries.
#[must_use]
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_owned();
    }

    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if current + width > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            current = 1;
        }
        folded.push(c);
        current += width;
    }
    folded
}

/// Escapes a TEXT value: backslash, comma, semicolon and newlines.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ',' => escaped.push_str("\\,"),
            ';' => escaped.push_str("\\;"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}
