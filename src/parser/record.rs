//! Records produced by the map parser

use smallvec::SmallVec;

/// `[key , value]` pairs attached to `obj` and `attr` records
pub type Properties = SmallVec<[(String, String); 4]>;

/// Kind of the record last returned by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Type,
    Area,
    Object,
    Attr,
    Anim,
    Map,
}

/// One parsed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// `type <name> <tile>`: tile index belongs to a named type
    Type { name: String, tile: i32 },
    /// `area <name> x y w h`
    Area {
        name: String,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    /// `obj <name> x y w h [k , v]*`
    Object {
        name: String,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        properties: Properties,
    },
    /// `attr [k , v]+`
    Attr { properties: Properties },
    /// `anim <tile> <delay-ms> <next-tile>`
    Anim { tile: i32, delay: i32, next: i32 },
    /// `map <cols> <rows>` followed by `cols * rows` tiles, row by row
    Map {
        columns: i32,
        rows: i32,
        tiles: Vec<i32>,
    },
}

impl Record {
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Type { .. } => RecordKind::Type,
            Self::Area { .. } => RecordKind::Area,
            Self::Object { .. } => RecordKind::Object,
            Self::Attr { .. } => RecordKind::Attr,
            Self::Anim { .. } => RecordKind::Anim,
            Self::Map { .. } => RecordKind::Map,
        }
    }
}
