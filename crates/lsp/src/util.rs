use std::path::PathBuf;
use tower_lsp::lsp_types::{Position, Url};

pub fn uri_to_path(uri: &Url) -> Option<PathBuf> {
    uri.to_file_path().ok()
}

/// Lightweight container for open-buffer state
pub struct Document {
    pub content: String,
}

impl Document {
    pub fn new(content: String) -> Self {
        Self { content }
    }
}

/// Byte offset of an LSP position (UTF-16 columns) in `text`.
pub fn offset_at(text: &str, position: Position) -> usize {
    let mut line = 0;
    let mut offset = 0;
    let mut chars = text.chars().peekable();

    while line < position.line as usize {
        match chars.next() {
            Some(c) => {
                offset += c.len_utf8();
                if c == '\n' {
                    line += 1;
                } else if c == '\r' {
                    if let Some(&'\n') = chars.peek() {
                        chars.next();
                        offset += 1;
                    }
                    line += 1;
                }
            }
            None => return offset,
        }
    }

    let mut utf16_count = 0;
    while utf16_count < position.character as usize {
        match chars.next() {
            Some(c) if c != '\n' && c != '\r' => {
                utf16_count += c.len_utf16();
                offset += c.len_utf8();
            }
            _ => break,
        }
    }
    offset
}

pub fn utf16_col_to_byte_col(content: &str, line: usize, utf16_col: usize) -> usize {
    let line_content = content.lines().nth(line).unwrap_or("");
    let mut curr_utf16 = 0;
    let mut curr_byte = 0;

    for c in line_content.chars() {
        if curr_utf16 >= utf16_col {
            break;
        }
        curr_utf16 += c.len_utf16();
        curr_byte += c.len_utf8();
    }
    curr_byte
}

/// Identifier around byte column `col` of zero-based `line`.
pub fn get_word_from_content(content: &str, line: usize, col: usize) -> Option<String> {
    let line_content = content.lines().nth(line)?;
    let col = col.min(line_content.len());
    if !line_content.is_char_boundary(col) {
        return None;
    }

    let is_ident = |c: char| c.is_alphanumeric() || c == '_';

    let start = line_content[..col]
        .rfind(|c| !is_ident(c))
        .map(|i| i + line_content[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);

    let end = line_content[col..]
        .find(|c| !is_ident(c))
        .map(|i| i + col)
        .unwrap_or(line_content.len());

    if start < end {
        Some(line_content[start..end].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_under_cursor() {
        let src = "def foo_bar(x):\n    return helper(x)\n";
        assert_eq!(get_word_from_content(src, 0, 5).as_deref(), Some("foo_bar"));
        assert_eq!(get_word_from_content(src, 0, 4).as_deref(), Some("foo_bar"));
        assert_eq!(get_word_from_content(src, 1, 13).as_deref(), Some("helper"));
        assert_eq!(get_word_from_content(src, 0, 3).as_deref(), Some("def"));
        assert_eq!(get_word_from_content(src, 1, 2), None);
        assert_eq!(get_word_from_content(src, 9, 0), None);
    }

    #[test]
    fn word_after_multibyte_prefix() {
        let src = "# é\ndef ünïcode():";
        let col = utf16_col_to_byte_col(src, 1, 5);
        assert_eq!(get_word_from_content(src, 1, col).as_deref(), Some("ünïcode"));
    }

    #[test]
    fn cursor_past_line_end_is_clamped() {
        assert_eq!(get_word_from_content("foo", 0, 40).as_deref(), Some("foo"));
    }

    #[test]
    fn offsets_handle_crlf_and_utf16() {
        let text = "ab\r\ncd\né😀x";
        assert_eq!(offset_at(text, Position::new(1, 1)), 5);
        assert_eq!(offset_at(text, Position::new(2, 0)), 7);
        // é is 1 UTF-16 unit, 😀 is 2.
        assert_eq!(offset_at(text, Position::new(2, 3)), 7 + 2 + 4);
        assert_eq!(offset_at(text, Position::new(9, 0)), text.len());
    }
}
