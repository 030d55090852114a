//! Variable-width code packing into GIF data sub-blocks

use crate::core::error::{GfmError, GfmResult};

/// Widest code a GIF stream may carry
pub const MAX_CODE_BITS: u8 = 12;

/// Largest payload of one data sub-block
const SUB_BLOCK_LEN: usize = 255;

/// Packs codes LSB-first and splits the result into sub-blocks of at most
/// 255 bytes, each preceded by its length.
#[derive(Debug, Default)]
pub struct BitWriter {
    out: Vec<u8>,
    chunk: Vec<u8>,
    acc: u32,
    bits: u8,
}

impl BitWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            chunk: Vec::with_capacity(SUB_BLOCK_LEN),
            acc: 0,
            bits: 0,
        }
    }

    /// Append `code` using exactly `nbits` bits
    pub fn write(&mut self, code: u16, nbits: u8) -> GfmResult<()> {
        if nbits == 0 || nbits > MAX_CODE_BITS || u32::from(code) >= 1 << nbits {
            return Err(GfmError::GifCodeOverflow);
        }
        self.acc |= u32::from(code) << self.bits;
        self.bits += nbits;
        while self.bits >= 8 {
            self.push_byte((self.acc & 0xff) as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
        Ok(())
    }

    fn push_byte(&mut self, byte: u8) {
        self.chunk.push(byte);
        if self.chunk.len() == SUB_BLOCK_LEN {
            self.flush_chunk();
        }
    }

    fn flush_chunk(&mut self) {
        if self.chunk.is_empty() {
            return;
        }
        self.out.push(self.chunk.len() as u8);
        self.out.extend_from_slice(&self.chunk);
        self.chunk.clear();
    }

    /// Pad the last byte with zeros and close the open sub-block
    pub fn flush(&mut self) {
        if self.bits > 0 {
            self.push_byte((self.acc & 0xff) as u8);
            self.acc = 0;
            self.bits = 0;
        }
        self.flush_chunk();
    }

    /// Flush and return the sub-blocks, without the block terminator
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.flush();
        self.out
    }

    /// Flush, then move the sub-blocks into `dst`, leaving the writer empty
    pub fn drain_into(&mut self, dst: &mut Vec<u8>) {
        self.flush();
        dst.append(&mut self.out);
    }
}
