//! Map file parser
//!
//! Reads the whitespace separated record format used for tilemaps and
//! object placement, one record per call:
//!
//! ```text
//! type wall 0
//! area spawn 16 32 8 8
//! obj door 40 8 8 16 [target , level2] [locked , 1]
//! attr [music , cave]
//! anim 4 100 5
//! map 2 2
//!  0 1
//!  0 0
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut parser = Parser::new(text);
//! while let Some(kind) = parser.parse_next()? {
//!     if kind == RecordKind::Area {
//!         let (x, y) = parser.position()?;
//!     }
//! }
//! ```

mod lexer;
mod record;

use std::path::Path;

use smallvec::SmallVec;

pub use record::{Properties, Record, RecordKind};

use crate::core::error::{GfmError, GfmResult};
use lexer::{Lexer, Token};

/// Pull parser over a map file
#[derive(Debug, Clone)]
pub struct Parser {
    source: String,
    cursor: usize,
    current: Option<Record>,
}

impl Parser {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            cursor: 0,
            current: None,
        }
    }

    /// Read a whole map file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file can't be read
    pub fn open(path: impl AsRef<Path>) -> GfmResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| GfmError::Io(format!("{}: {e}", path.display())))?;
        log::debug!("Parsing {} ({} bytes)", path.display(), source.len());
        Ok(Self::new(source))
    }

    /// Rewind to the start of the file
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.current = None;
    }

    /// Byte offset of the next unread character
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Parse the next record. `Ok(None)` once the input is exhausted.
    ///
    /// On failure the parser stays where it was and keeps the previous
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `ParserBadToken` for an unknown keyword or a malformed field
    pub fn parse_next(&mut self) -> GfmResult<Option<RecordKind>> {
        let mut lexer = Lexer::new(&self.source, self.cursor);
        let Some(keyword) = lexer.next_token() else {
            return Ok(None);
        };

        let record = match keyword.text {
            "type" => Record::Type {
                name: word(&mut lexer)?,
                tile: int(&mut lexer)?,
            },
            "area" => {
                let name = word(&mut lexer)?;
                let [x, y, width, height] = ints(&mut lexer)?;
                Record::Area {
                    name,
                    x,
                    y,
                    width,
                    height,
                }
            }
            "obj" => {
                let name = word(&mut lexer)?;
                let [x, y, width, height] = ints(&mut lexer)?;
                Record::Object {
                    name,
                    x,
                    y,
                    width,
                    height,
                    properties: properties(&mut lexer)?,
                }
            }
            "attr" => {
                let properties = properties(&mut lexer)?;
                if properties.is_empty() {
                    return Err(bad_token(lexer.peek(), "attr needs a property"));
                }
                Record::Attr { properties }
            }
            "anim" => {
                let [tile, delay, next] = ints(&mut lexer)?;
                Record::Anim { tile, delay, next }
            }
            "map" => {
                let [columns, rows] = ints(&mut lexer)?;
                if columns <= 0 || rows <= 0 {
                    return Err(GfmError::ParserBadToken(format!(
                        "map {columns}x{rows} is empty"
                    )));
                }
                let count = columns
                    .checked_mul(rows)
                    .ok_or_else(|| {
                        GfmError::ParserBadToken(format!("map {columns}x{rows} is too large"))
                    })? as usize;
                // Every tile takes a digit and a separator
                let remaining = self.source.len() - lexer.cursor();
                if count > remaining / 2 + 1 {
                    return Err(GfmError::ParserBadToken(format!(
                        "map {columns}x{rows} is larger than the file"
                    )));
                }
                let mut tiles = Vec::with_capacity(count);
                for _ in 0..count {
                    tiles.push(int(&mut lexer)?);
                }
                Record::Map {
                    columns,
                    rows,
                    tiles,
                }
            }
            other => return Err(GfmError::ParserBadToken(other.to_string())),
        };

        self.cursor = lexer.cursor();
        let kind = record.kind();
        self.current = Some(record);
        Ok(Some(kind))
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The record returned by the last successful call
    ///
    /// # Errors
    ///
    /// Returns `ParserNoObject` before the first record
    pub fn record(&self) -> GfmResult<&Record> {
        self.current.as_ref().ok_or(GfmError::ParserNoObject)
    }

    /// Take ownership of the last record
    ///
    /// # Errors
    ///
    /// Returns `ParserNoObject` before the first record
    pub fn take_record(&mut self) -> GfmResult<Record> {
        self.current.take().ok_or(GfmError::ParserNoObject)
    }

    /// # Errors
    ///
    /// Returns `ParserNoObject` before the first record
    pub fn kind(&self) -> GfmResult<RecordKind> {
        Ok(self.record()?.kind())
    }

    /// Name of a `type`, `area` or `obj` record
    ///
    /// # Errors
    ///
    /// Returns `ParserInvalidObject` for other records
    pub fn name(&self) -> GfmResult<&str> {
        match self.record()? {
            Record::Type { name, .. } | Record::Area { name, .. } | Record::Object { name, .. } => {
                Ok(name)
            }
            _ => Err(GfmError::ParserInvalidObject),
        }
    }

    /// Tile of a `type` or `anim` record
    ///
    /// # Errors
    ///
    /// Returns `ParserInvalidObject` for other records
    pub fn tile(&self) -> GfmResult<i32> {
        match self.record()? {
            Record::Type { tile, .. } | Record::Anim { tile, .. } => Ok(*tile),
            _ => Err(GfmError::ParserInvalidObject),
        }
    }

    /// Top-left corner of an `area` or `obj` record
    ///
    /// # Errors
    ///
    /// Returns `ParserInvalidObject` for other records
    pub fn position(&self) -> GfmResult<(i32, i32)> {
        match self.record()? {
            Record::Area { x, y, .. } | Record::Object { x, y, .. } => Ok((*x, *y)),
            _ => Err(GfmError::ParserInvalidObject),
        }
    }

    /// # Errors
    ///
    /// Returns `ParserInvalidObject` unless on an `area` or `obj` record
    pub fn dimensions(&self) -> GfmResult<(i32, i32)> {
        match self.record()? {
            Record::Area { width, height, .. } | Record::Object { width, height, .. } => {
                Ok((*width, *height))
            }
            _ => Err(GfmError::ParserInvalidObject),
        }
    }

    fn properties(&self) -> GfmResult<&Properties> {
        match self.record()? {
            Record::Object { properties, .. } | Record::Attr { properties } => Ok(properties),
            _ => Err(GfmError::ParserInvalidObject),
        }
    }

    /// # Errors
    ///
    /// Returns `ParserInvalidObject` unless on an `obj` or `attr` record
    pub fn num_properties(&self) -> GfmResult<usize> {
        Ok(self.properties()?.len())
    }

    /// Key and value of property `index`
    ///
    /// # Errors
    ///
    /// Returns `ParserInvalidObject` unless on an `obj` or `attr` record,
    /// or `InvalidIndex`
    pub fn property(&self, index: usize) -> GfmResult<(&str, &str)> {
        let properties = self.properties()?;
        properties
            .get(index)
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .ok_or(GfmError::InvalidIndex {
                index,
                len: properties.len(),
            })
    }

    /// `(delay_ms, next_tile)` of an `anim` record
    ///
    /// # Errors
    ///
    /// Returns `ParserInvalidObject` for other records
    pub fn animation(&self) -> GfmResult<(i32, i32)> {
        match self.record()? {
            Record::Anim { delay, next, .. } => Ok((*delay, *next)),
            _ => Err(GfmError::ParserInvalidObject),
        }
    }

    /// `(columns, rows)` of a `map` record
    ///
    /// # Errors
    ///
    /// Returns `ParserInvalidObject` for other records
    pub fn map_dimensions(&self) -> GfmResult<(i32, i32)> {
        match self.record()? {
            Record::Map { columns, rows, .. } => Ok((*columns, *rows)),
            _ => Err(GfmError::ParserInvalidObject),
        }
    }

    /// Tiles of a `map` record, row by row
    ///
    /// # Errors
    ///
    /// Returns `ParserInvalidObject` for other records
    pub fn tiles(&self) -> GfmResult<&[i32]> {
        match self.record()? {
            Record::Map { tiles, .. } => Ok(tiles),
            _ => Err(GfmError::ParserInvalidObject),
        }
    }
}

// ============================================================================
// Field readers
// ============================================================================

fn bad_token(token: Option<Token<'_>>, expected: &str) -> GfmError {
    match token {
        Some(t) => GfmError::ParserBadToken(format!("{expected}, found `{}` at byte {}", t.text, t.offset)),
        None => GfmError::ParserBadToken(format!("{expected}, found end of file")),
    }
}

fn word(lexer: &mut Lexer<'_>) -> GfmResult<String> {
    match lexer.next_token() {
        Some(t) if !matches!(t.text, "[" | "," | "]") => Ok(t.text.to_string()),
        other => Err(bad_token(other, "expected a name")),
    }
}

fn int(lexer: &mut Lexer<'_>) -> GfmResult<i32> {
    let token = lexer.next_token();
    token
        .and_then(|t| t.text.parse().ok())
        .ok_or_else(|| bad_token(token, "expected an integer"))
}

fn ints<const N: usize>(lexer: &mut Lexer<'_>) -> GfmResult<[i32; N]> {
    let mut out = [0; N];
    for slot in &mut out {
        *slot = int(lexer)?;
    }
    Ok(out)
}

fn expect(lexer: &mut Lexer<'_>, punct: &str) -> GfmResult<()> {
    match lexer.next_token() {
        Some(t) if t.text == punct => Ok(()),
        other => Err(bad_token(other, &format!("expected `{punct}`"))),
    }
}

fn properties(lexer: &mut Lexer<'_>) -> GfmResult<Properties> {
    let mut out = SmallVec::new();
    while lexer.peek().is_some_and(|t| t.text == "[") {
        expect(lexer, "[")?;
        let key = word(lexer)?;
        expect(lexer, ",")?;
        let value = word(lexer)?;
        expect(lexer, "]")?;
        out.push((key, value));
    }
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_stream() {
        let mut parser = Parser::new("type wall 0\narea wall 16 32 8 8\nmap 2 2\n 0 1\n 0 0");

        assert_eq!(parser.parse_next().unwrap(), Some(RecordKind::Type));
        assert_eq!(parser.name().unwrap(), "wall");
        assert_eq!(parser.tile().unwrap(), 0);

        assert_eq!(parser.parse_next().unwrap(), Some(RecordKind::Area));
        assert_eq!(parser.name().unwrap(), "wall");
        assert_eq!(parser.position().unwrap(), (16, 32));
        assert_eq!(parser.dimensions().unwrap(), (8, 8));

        assert_eq!(parser.parse_next().unwrap(), Some(RecordKind::Map));
        assert_eq!(parser.map_dimensions().unwrap(), (2, 2));
        assert_eq!(parser.tiles().unwrap(), &[0, 1, 0, 0]);

        assert_eq!(parser.parse_next().unwrap(), None);
        assert_eq!(parser.parse_next().unwrap(), None);
    }

    #[test]
    fn test_object_properties() {
        let mut parser = Parser::new("obj door 40 8 8 16 [target , level2] [locked,1]\nattr [music , cave]");
        assert_eq!(parser.parse_next().unwrap(), Some(RecordKind::Object));
        assert_eq!(parser.num_properties().unwrap(), 2);
        assert_eq!(parser.property(0).unwrap(), ("target", "level2"));
        assert_eq!(parser.property(1).unwrap(), ("locked", "1"));
        assert!(parser.property(2).is_err());

        assert_eq!(parser.parse_next().unwrap(), Some(RecordKind::Attr));
        assert_eq!(parser.property(0).unwrap(), ("music", "cave"));
        assert_eq!(parser.name(), Err(GfmError::ParserInvalidObject));
    }

    #[test]
    fn test_anim_record() {
        let mut parser = Parser::new("anim 4 100 5");
        assert_eq!(parser.parse_next().unwrap(), Some(RecordKind::Anim));
        assert_eq!(parser.tile().unwrap(), 4);
        assert_eq!(parser.animation().unwrap(), (100, 5));
    }

    #[test]
    fn test_accessors_before_first_record() {
        let parser = Parser::new("type wall 0");
        assert_eq!(parser.name(), Err(GfmError::ParserNoObject));
        assert_eq!(parser.kind(), Err(GfmError::ParserNoObject));
    }

    #[test]
    fn test_wrong_record_type() {
        let mut parser = Parser::new("type wall 0");
        parser.parse_next().unwrap();
        assert_eq!(parser.position(), Err(GfmError::ParserInvalidObject));
        assert_eq!(parser.tiles(), Err(GfmError::ParserInvalidObject));
    }

    #[test]
    fn test_unknown_keyword_is_fatal() {
        let mut parser = Parser::new("sprite hero 0");
        assert_eq!(
            parser.parse_next(),
            Err(GfmError::ParserBadToken("sprite".to_string()))
        );
    }

    #[test]
    fn test_failure_restores_position() {
        let mut parser = Parser::new("type wall 0\narea wall 16 x 8 8\n");
        parser.parse_next().unwrap();
        let cursor = parser.cursor();

        assert!(matches!(parser.parse_next(), Err(GfmError::ParserBadToken(_))));
        assert_eq!(parser.cursor(), cursor);
        assert_eq!(parser.kind().unwrap(), RecordKind::Type);
    }

    #[test]
    fn test_truncated_map() {
        let mut parser = Parser::new("map 3 2\n0 0 0\n0 0");
        assert!(parser.parse_next().is_err());
    }

    #[test]
    fn test_oversized_map_is_rejected() {
        let mut parser = Parser::new("map 65536 65536\n0\n");
        assert!(matches!(parser.parse_next(), Err(GfmError::ParserBadToken(_))));
        assert_eq!(parser.cursor(), 0);

        let mut parser = Parser::new("map 1000 1000\n0 1 2\n");
        assert!(matches!(parser.parse_next(), Err(GfmError::ParserBadToken(_))));
    }

    #[test]
    fn test_malformed_property() {
        let mut parser = Parser::new("attr [music cave]");
        assert!(parser.parse_next().is_err());
        let mut parser = Parser::new("attr");
        assert!(parser.parse_next().is_err());
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.gfm");
        std::fs::write(&path, "type wall 0\n").unwrap();

        let mut parser = Parser::open(&path).unwrap();
        assert_eq!(parser.parse_next().unwrap(), Some(RecordKind::Type));
        assert!(Parser::open(dir.path().join("missing")).is_err());
    }
}
