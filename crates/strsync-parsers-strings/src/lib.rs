//! Flat string-table (`.strings`) support: tokenizer, decoder and loader.

use std::path::Path;

use strsync_core::{KeyMap, StringsError};

pub mod cleanup;

pub use cleanup::{strip_fallback_lines, strip_fallbacks, FALLBACK_MARKER};

/// Syntax problem inside a string table, before any path is attached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Read `path` and parse it as a string table.
pub fn load_strings(path: &Path) -> Result<KeyMap, StringsError> {
    let text = read_text(path)?;
    parse_strings(&text).map_err(|e| StringsError::Parse {
        path: path.to_path_buf(),
        line: e.line,
        message: e.message,
    })
}

/// Read a text file, accepting UTF-8 (with or without BOM) and BOM-marked UTF-16.
pub fn read_text(path: &Path) -> Result<String, StringsError> {
    let bytes = std::fs::read(path).map_err(|e| StringsError::io(path, e))?;
    decode_text(&bytes).ok_or_else(|| StringsError::Encoding {
        path: path.to_path_buf(),
    })
}

pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return std::str::from_utf8(rest).ok().map(str::to_owned);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// Parse string-table text into an ordered map.
///
/// Accepts `"key" = "value";`, bare tokens on either side, the `"key";`
/// shorthand (value equals key), and C-style comments. A repeated key keeps
/// its first position and takes the last value.
pub fn parse_strings(text: &str) -> Result<KeyMap, SyntaxError> {
    let mut lexer = Lexer::new(text);
    let mut map = KeyMap::new();

    loop {
        lexer.skip_trivia()?;
        if lexer.at_end() {
            break;
        }
        let key = lexer.read_token()?;
        lexer.skip_trivia()?;
        let value = match lexer.peek() {
            Some('=') => {
                lexer.bump();
                lexer.skip_trivia()?;
                let value = lexer.read_token()?;
                lexer.skip_trivia()?;
                lexer.expect(';')?;
                value
            }
            Some(';') => {
                lexer.bump();
                key.clone()
            }
            Some(c) => {
                return Err(lexer.error(format!("expected '=' or ';' after key, found '{c}'")))
            }
            None => return Err(lexer.error("unexpected end of file after key")),
        };
        if map.insert(key.clone(), value).is_some() {
            tracing::debug!(event = "strings_duplicate_key", key = %key);
        }
    }

    Ok(map)
}

fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '+' | '/' | ':' | '.' | '-')
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.line, message)
    }

    fn expect(&mut self, want: char) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{want}', found '{c}'"))),
            None => Err(self.error(format!("expected '{want}', found end of file"))),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            let rest = self.rest();
            if rest.starts_with("/*") {
                let Some(end) = rest[2..].find("*/") else {
                    return Err(self.error("unterminated comment"));
                };
                let len = end + 4;
                self.line += rest[..len].matches('\n').count();
                self.pos += len;
            } else if rest.starts_with("//") {
                match rest.find('\n') {
                    Some(end) => self.pos += end,
                    None => self.pos = self.src.len(),
                }
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    fn read_token(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some('"') => self.read_quoted(),
            Some(c) if is_bare_char(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_bare_char) {
                    self.bump();
                }
                Ok(self.src[start..self.pos].to_string())
            }
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn read_quoted(&mut self) -> Result<String, SyntaxError> {
        let start_line = self.line;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::new(start_line, "unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => self.read_escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn read_escape(&mut self, out: &mut String) -> Result<(), SyntaxError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape sequence"));
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'U' | 'u' => {
                let unit = self.read_hex4()?;
                if (0xD800..0xDC00).contains(&unit) && self.rest().starts_with('\\') {
                    let follows_low = self
                        .rest()
                        .get(1..2)
                        .is_some_and(|s| s == "U" || s == "u");
                    if follows_low {
                        self.bump();
                        self.bump();
                        let low = self.read_hex4()?;
                        let joined = char::decode_utf16([unit as u16, low as u16])
                            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER));
                        out.extend(joined);
                        return Ok(());
                    }
                }
                out.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn read_hex4(&mut self) -> Result<u32, SyntaxError> {
        let mut value = 0u32;
        let mut digits = 0;
        while digits < 4 {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    value = value * 16 + d;
                    self.bump();
                    digits += 1;
                }
                None => break,
            }
        }
        if digits == 0 {
            return Err(self.error("expected hex digits after \\U"));
        }
        Ok(value)
    }
}
