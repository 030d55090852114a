//! Per-frame palette extraction

use rustc_hash::FxHashMap;

use crate::core::error::{GfmError, GfmResult};

/// Colors of one frame, in first-seen order, as `0x00RRGGBB`
#[derive(Debug, Default)]
pub struct Palette {
    colors: Vec<u32>,
    lookup: FxHashMap<u32, u8>,
}

impl Palette {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the palette with the colors of `rgb` (packed RGB24) and
    /// write each pixel's index into `indices`
    pub fn index_frame(&mut self, rgb: &[u8], indices: &mut Vec<u8>) -> GfmResult<()> {
        if rgb.len() % 3 != 0 {
            return Err(GfmError::InvalidArgument(format!(
                "RGB buffer of {} bytes",
                rgb.len()
            )));
        }
        self.colors.clear();
        self.lookup.clear();
        indices.clear();
        indices.reserve(rgb.len() / 3);

        for px in rgb.chunks_exact(3) {
            let color = (u32::from(px[0]) << 16) | (u32::from(px[1]) << 8) | u32::from(px[2]);
            let index = match self.lookup.get(&color) {
                Some(&index) => index,
                None => {
                    if self.colors.len() == 256 {
                        return Err(GfmError::GifTooManyColors);
                    }
                    let index = self.colors.len() as u8;
                    self.colors.push(color);
                    self.lookup.insert(color, index);
                    index
                }
            };
            indices.push(index);
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Bits needed to index every color, at least 1
    #[must_use]
    pub fn color_bits(&self) -> u8 {
        let mut bits = 1;
        while (1usize << bits) < self.colors.len() {
            bits += 1;
        }
        bits
    }

    /// Bits of the color table written to the file: GIF's LZW needs at
    /// least two, so the table grows to match
    #[must_use]
    pub fn table_bits(&self) -> u8 {
        self.color_bits().max(2)
    }

    /// Color table padded with black up to `1 << table_bits()` entries
    #[must_use]
    pub fn table_bytes(&self) -> Vec<u8> {
        let entries = 1usize << self.table_bits();
        let mut table = Vec::with_capacity(entries * 3);
        for &color in &self.colors {
            table.extend_from_slice(&[(color >> 16) as u8, (color >> 8) as u8, color as u8]);
        }
        table.resize(entries * 3, 0);
        table
    }
}
