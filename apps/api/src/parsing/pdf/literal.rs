//! Byte-level helpers for PDF string literals and operator tokens.
//!
//! Nothing here understands objects or xref tables; it only recognises the
//! lexical shapes that carry text: `(literal)` strings, `[ ... ]` arrays and
//! bare operator keywords.

/// A `(` that does not close within this many bytes is not treated as a literal.
const MAX_LITERAL_BYTES: usize = 4096;

/// A `[` that does not close within this many bytes is not treated as an array.
const MAX_ARRAY_BYTES: usize = 64 * 1024;

/// Kerning adjustments at or below this value (thousandths of an em) read as a word gap.
const WORD_GAP_ADJUSTMENT: f32 = -200.0;

/// Maps each byte to the char with the same code point (Latin-1).
/// Never fails and keeps byte offsets aligned with char offsets.
pub fn lenient_decode(data: &[u8]) -> String {
    data.iter().map(|&b| char::from(b)).collect()
}

pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'\0')
}

fn is_delimiter(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// True when `token` starts at `at` and is bounded by delimiters on both sides.
pub fn is_token_at(data: &[u8], at: usize, token: &[u8]) -> bool {
    if !data[at..].starts_with(token) {
        return false;
    }
    let before_ok = at == 0 || is_delimiter(data[at - 1]);
    let end = at + token.len();
    let after_ok = end == data.len() || is_delimiter(data[end]);
    before_ok && after_ok
}

/// Scans the literal opening at `start` (which must be `(`), honouring nested
/// parentheses and backslash escapes.
///
/// Returns the raw bytes between the outer parentheses and the index just past
/// the closing one. On failure returns the index scanning stopped at; callers
/// resume from there so an unterminated run is only walked once.
pub fn scan_literal(data: &[u8], start: usize) -> Result<(&[u8], usize), usize> {
    if data.get(start) != Some(&b'(') {
        return Err(start + 1);
    }
    let limit = data.len().min(start + MAX_LITERAL_BYTES);
    let mut depth = 0usize;
    let mut i = start;
    while i < limit {
        match data[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&data[start + 1..i], i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(i.min(data.len()))
}

/// Scans a `TJ` operand array opening at `start` (which must be `[`).
///
/// String pieces are concatenated directly; a large negative kerning number
/// between pieces becomes a single space. Hex strings are skipped. Failure
/// reports the stop index the same way [`scan_literal`] does.
pub fn scan_array(data: &[u8], start: usize) -> Result<(String, usize), usize> {
    if data.get(start) != Some(&b'[') {
        return Err(start + 1);
    }
    let limit = data.len().min(start + MAX_ARRAY_BYTES);
    let mut text = String::new();
    let mut i = start + 1;
    while i < limit {
        match data[i] {
            b']' => return Ok((text, i + 1)),
            b'(' => {
                let (raw, next) = scan_literal(data, i)?;
                text.push_str(&decode_literal(raw));
                i = next;
            }
            b'<' => {
                let close = data[i..limit]
                    .iter()
                    .position(|&b| b == b'>')
                    .ok_or(limit)?;
                i += close + 1;
            }
            b'-' | b'+' | b'.' | b'0'..=b'9' => {
                let len = data[i..limit]
                    .iter()
                    .take_while(|&&b| matches!(b, b'-' | b'+' | b'.' | b'0'..=b'9'))
                    .count();
                let number = std::str::from_utf8(&data[i..i + len])
                    .ok()
                    .and_then(|s| s.parse::<f32>().ok());
                if let Some(adjustment) = number {
                    if adjustment <= WORD_GAP_ADJUSTMENT && !text.is_empty() && !text.ends_with(' ')
                    {
                        text.push(' ');
                    }
                }
                i += len;
            }
            _ => i += 1,
        }
    }
    Err(limit)
}

/// Decodes the escape sequences of a literal's raw content.
///
/// `\n \r \t \b \f` become control characters, `\( \) \\` the literal
/// character, `\ddd` (up to three octal digits) the byte value, and a
/// backslash before an end-of-line is a line continuation.
pub fn decode_literal(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b != b'\\' {
            out.push(char::from(b));
            i += 1;
            continue;
        }

        i += 1;
        let Some(&next) = raw.get(i) else {
            break;
        };
        match next {
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'b' => out.push('\u{8}'),
            b'f' => out.push('\u{c}'),
            b'(' | b')' | b'\\' => out.push(char::from(next)),
            b'0'..=b'7' => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 3 {
                    match raw.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            i += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                out.push(char::from((value & 0xff) as u8));
                continue;
            }
            b'\r' => {
                if raw.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => {}
            other => out.push(char::from(other)),
        }
        i += 1;
    }
    out
}
