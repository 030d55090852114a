//! Word tokenizer for map files

/// A token and the byte offset it starts at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub offset: usize,
}

/// Splits text on whitespace. `[`, `,` and `]` are always tokens on their
/// own, so `[hp,3]` and `[ hp , 3 ]` read the same.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    cursor: usize,
}

const fn is_punct(b: u8) -> bool {
    matches!(b, b'[' | b',' | b']')
}

impl<'a> Lexer<'a> {
    pub const fn new(source: &'a str, cursor: usize) -> Self {
        Self { source, cursor }
    }

    /// Byte offset of the next unread character
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn next_token(&mut self) -> Option<Token<'a>> {
        let bytes = self.source.as_bytes();
        while self.cursor < bytes.len() && bytes[self.cursor].is_ascii_whitespace() {
            self.cursor += 1;
        }
        if self.cursor >= bytes.len() {
            return None;
        }

        let start = self.cursor;
        if is_punct(bytes[start]) {
            self.cursor += 1;
        } else {
            while self.cursor < bytes.len()
                && !bytes[self.cursor].is_ascii_whitespace()
                && !is_punct(bytes[self.cursor])
            {
                self.cursor += 1;
            }
        }
        Some(Token {
            text: &self.source[start..self.cursor],
            offset: start,
        })
    }

    pub fn peek(&self) -> Option<Token<'a>> {
        self.clone().next_token()
    }
}
