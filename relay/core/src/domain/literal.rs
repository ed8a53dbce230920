// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Literal-structure normalisation.
//!
//! Some publishers emit message bodies as literal dictionaries rather than
//! JSON: single-quoted strings and `True`/`False`/`None` keywords. This module
//! rewrites such text into JSON so that it goes through the same schema
//! validation as a JSON body. Tuples, sets and other non-JSON shapes are left
//! for the JSON parser to reject.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("Unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("Unexpected token '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    #[error("Invalid escape sequence at offset {0}")]
    InvalidEscape(usize),
}

/// Rewrite a literal structure as JSON text.
pub fn to_json(input: &str) -> Result<String, LiteralError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            '\'' | '"' => {
                i = read_string(&chars, i, c, &mut out)?;
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                while i < chars.len() {
                    let (_, n) = chars[i];
                    if n.is_ascii_alphanumeric() || matches!(n, '.' | '+' | '-') {
                        out.push(n);
                        i += 1;
                    } else {
                        break;
                    }
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                    i += 1;
                }
                let token: String = chars[start..i].iter().map(|(_, ch)| ch).collect();
                match token.as_str() {
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    "None" => out.push_str("null"),
                    _ => return Err(LiteralError::UnexpectedToken { token, offset }),
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Consume one quoted string starting at `start`, appending its JSON form.
/// Returns the index just past the closing quote.
fn read_string(
    chars: &[(usize, char)],
    start: usize,
    quote: char,
    out: &mut String,
) -> Result<usize, LiteralError> {
    let start_offset = chars[start].0;
    out.push('"');
    let mut i = start + 1;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            c if c == quote => {
                out.push('"');
                return Ok(i + 1);
            }
            '\\' => {
                let (_, next) = *chars
                    .get(i + 1)
                    .ok_or(LiteralError::UnterminatedString(start_offset))?;
                match next {
                    '\'' => out.push('\''),
                    '"' => out.push_str("\\\""),
                    '\\' | 'n' | 'r' | 't' | 'b' | 'f' | '/' | 'u' => {
                        out.push('\\');
                        out.push(next);
                    }
                    'x' => {
                        let hex: String = chars
                            .get(i + 2..i + 4)
                            .ok_or(LiteralError::InvalidEscape(offset))?
                            .iter()
                            .map(|(_, h)| *h)
                            .collect();
                        if !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                            return Err(LiteralError::InvalidEscape(offset));
                        }
                        out.push_str("\\u00");
                        out.push_str(&hex);
                        i += 2;
                    }
                    // Unknown escapes are kept as a literal backslash.
                    other => {
                        out.push_str("\\\\");
                        out.push(other);
                    }
                }
                i += 2;
            }
            '"' => {
                out.push_str("\\\"");
                i += 1;
            }
            '\n' => {
                out.push_str("\\n");
                i += 1;
            }
            '\r' => {
                out.push_str("\\r");
                i += 1;
            }
            '\t' => {
                out.push_str("\\t");
                i += 1;
            }
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Err(LiteralError::UnterminatedString(start_offset))
}
