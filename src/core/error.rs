//! Framework-wide error kinds
//!
//! Every fallible operation in the crate returns [`GfmResult`]. The quadtree's
//! resumable states and the parser's end-of-file are not errors and live in
//! their own types ([`crate::physics::QuadtreeStep`] and `Ok(None)`).

use std::fmt;

/// Shorthand for results carrying a [`GfmError`].
pub type GfmResult<T> = Result<T, GfmError>;

/// Errors that can occur inside the framework core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GfmError {
    /// A caller-supplied argument was out of range
    InvalidArgument(String),
    /// A pool or buffer couldn't grow
    AllocFailed,
    /// Subsystem used before being initialized
    NotInitialized(&'static str),
    /// Subsystem initialized twice
    AlreadyInitialized(&'static str),
    /// Error reported by the video or event backend
    Backend(String),
    /// Index past the end of a collection
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Length of the collection
        len: usize,
    },
    /// Unexpected token in a map file
    ParserBadToken(String),
    /// Field accessed before any record was parsed
    ParserNoObject,
    /// Field accessed on a record of the wrong type
    ParserInvalidObject,
    /// Traversal stack exceeded `max_depth * 4`
    QuadtreeStackOverflow,
    /// Quadtree continued with no pending operation
    QuadtreeNotActive,
    /// Frame used more than 256 colors
    GifTooManyColors,
    /// An export is still running in the background
    GifThreadRunning,
    /// Export requested before an output path was set
    GifPathNotSet,
    /// Frame width or height doesn't fit in 16 bits
    GifImageTooLarge,
    /// A code wider than 12 bits was written
    GifCodeOverflow,
    /// Requested rate can't be honored by the timer source
    FpsTooHigh(u32),
    /// Both objects passed to a separation are fixed
    ObjectsCantCollide,
    /// Separation requested without a prior contact
    CollisionNotTriggered,
    /// Group reached its maximum number of sprites
    GroupMaxSprites(usize),
    /// Sprite has no animation playing
    NoAnimationPlaying,
    /// Animation was already finished
    AnimationAlreadyFinished,
    /// File-system error
    Io(String),
    /// Configuration (de)serialization error
    Config(String),
}

impl fmt::Display for GfmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
            Self::AllocFailed => write!(f, "Allocation failed"),
            Self::NotInitialized(what) => write!(f, "{what} not initialized"),
            Self::AlreadyInitialized(what) => write!(f, "{what} already initialized"),
            Self::Backend(e) => write!(f, "Backend error: {e}"),
            Self::InvalidIndex { index, len } => {
                write!(f, "Invalid index {index} (length {len})")
            }
            Self::ParserBadToken(tok) => write!(f, "Unexpected token '{tok}'"),
            Self::ParserNoObject => write!(f, "No record parsed yet"),
            Self::ParserInvalidObject => write!(f, "Field not available on this record"),
            Self::QuadtreeStackOverflow => write!(f, "Quadtree traversal stack overflow"),
            Self::QuadtreeNotActive => write!(f, "No quadtree operation in progress"),
            Self::GifTooManyColors => write!(f, "GIF frame has more than 256 colors"),
            Self::GifThreadRunning => write!(f, "GIF export already running"),
            Self::GifPathNotSet => write!(f, "GIF output path not set"),
            Self::GifImageTooLarge => write!(f, "GIF dimensions exceed 65535"),
            Self::GifCodeOverflow => write!(f, "LZW code wider than 12 bits"),
            Self::FpsTooHigh(fps) => write!(f, "Requested rate of {fps} Hz is too high"),
            Self::ObjectsCantCollide => write!(f, "Two fixed objects can't be separated"),
            Self::CollisionNotTriggered => write!(f, "Objects aren't in contact"),
            Self::GroupMaxSprites(max) => write!(f, "Group already holds {max} sprites"),
            Self::NoAnimationPlaying => write!(f, "No animation playing"),
            Self::AnimationAlreadyFinished => write!(f, "Animation already finished"),
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for GfmError {}

impl From<std::io::Error> for GfmError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
