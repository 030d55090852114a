//! GIF recording
//!
//! Captured backbuffers are palettized per frame, LZW-compressed through a
//! byte trie and written as an animated GIF89a by a background thread.

mod bitwriter;
mod encoder;
mod exporter;
mod lzw;
mod palette;

pub use bitwriter::{BitWriter, MAX_CODE_BITS};
pub use encoder::{GifEncoder, frame_delay};
pub use exporter::{FRAME_PREFIX, GifInfo, GifRecorder};
pub use lzw::LzwEncoder;
pub use palette::Palette;
