//! GIF89a stream writer
//!
//! Every frame carries its own local color table; the logical screen
//! never has a global one.

use std::io::Write;

use crate::core::error::{GfmError, GfmResult};
use crate::gif::bitwriter::BitWriter;
use crate::gif::lzw::LzwEncoder;
use crate::gif::palette::Palette;

const EXTENSION: u8 = 0x21;
const GRAPHIC_CONTROL: u8 = 0xf9;
const COMMENT: u8 = 0xfe;
const APPLICATION: u8 = 0xff;
const IMAGE_SEPARATOR: u8 = 0x2c;
const TRAILER: u8 = 0x3b;

/// GIF delay (hundredths of a second) for a given draw rate
#[must_use]
pub fn frame_delay(draws_per_second: f64) -> u16 {
    if draws_per_second <= 0.0 {
        return 0;
    }
    (100.0 / draws_per_second).round().clamp(0.0, f64::from(u16::MAX)) as u16
}

/// Writes a GIF stream frame by frame into any [`Write`]
#[derive(Debug)]
pub struct GifEncoder<W: Write> {
    out: W,
    width: u16,
    height: u16,
    palette: Palette,
    indices: Vec<u8>,
    lzw: LzwEncoder,
    frames: usize,
}

impl<W: Write> GifEncoder<W> {
    /// # Errors
    ///
    /// `GifImageTooLarge` when a dimension doesn't fit in 16 bits
    pub fn new(out: W, width: u32, height: u32) -> GfmResult<Self> {
        if width == 0 || height == 0 {
            return Err(GfmError::InvalidArgument(format!(
                "GIF of {width}x{height}"
            )));
        }
        let (Ok(width), Ok(height)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(GfmError::GifImageTooLarge);
        };
        Ok(Self {
            out,
            width,
            height,
            palette: Palette::new(),
            indices: Vec::new(),
            lzw: LzwEncoder::new(),
            frames: 0,
        })
    }

    /// Header, logical screen, optional looping block and the comment
    pub fn begin(&mut self, looped: bool, comment: &[&str]) -> GfmResult<()> {
        self.out.write_all(b"GIF89a")?;

        let mut screen = [0u8; 7];
        screen[0..2].copy_from_slice(&self.width.to_le_bytes());
        screen[2..4].copy_from_slice(&self.height.to_le_bytes());
        // No global table, 8 bits of color resolution
        screen[4] = 0x70;
        self.out.write_all(&screen)?;

        if looped {
            self.out.write_all(&[EXTENSION, APPLICATION, 11])?;
            self.out.write_all(b"NETSCAPE2.0")?;
            // Loop count 0: forever
            self.out.write_all(&[3, 1, 0, 0, 0])?;
        }

        if !comment.is_empty() {
            self.out.write_all(&[EXTENSION, COMMENT])?;
            for text in comment {
                self.write_sub_blocks(text.as_bytes())?;
            }
            self.out.write_all(&[0])?;
        }
        Ok(())
    }

    /// Append one RGB24 frame shown for `delay_cs` hundredths of a second
    pub fn write_frame(&mut self, rgb: &[u8], delay_cs: u16) -> GfmResult<()> {
        let expected = usize::from(self.width) * usize::from(self.height) * 3;
        if rgb.len() != expected {
            return Err(GfmError::InvalidArgument(format!(
                "frame of {} bytes, expected {expected}",
                rgb.len()
            )));
        }
        self.palette.index_frame(rgb, &mut self.indices)?;
        let table_bits = self.palette.table_bits();

        let [delay_lo, delay_hi] = delay_cs.to_le_bytes();
        // Disposal 1: leave the frame in place
        self.out.write_all(&[
            EXTENSION,
            GRAPHIC_CONTROL,
            4,
            0x04,
            delay_lo,
            delay_hi,
            0,
            0,
        ])?;

        let mut descriptor = [0u8; 10];
        descriptor[0] = IMAGE_SEPARATOR;
        descriptor[5..7].copy_from_slice(&self.width.to_le_bytes());
        descriptor[7..9].copy_from_slice(&self.height.to_le_bytes());
        descriptor[9] = 0x80 | (table_bits - 1);
        self.out.write_all(&descriptor)?;
        self.out.write_all(&self.palette.table_bytes())?;

        let mut bits = BitWriter::new();
        self.lzw.encode(&self.indices, table_bits, &mut bits)?;
        self.out.write_all(&[table_bits])?;
        self.out.write_all(&bits.finish())?;
        self.out.write_all(&[0])?;

        self.frames += 1;
        Ok(())
    }

    fn write_sub_blocks(&mut self, data: &[u8]) -> GfmResult<()> {
        for chunk in data.chunks(255) {
            self.out.write_all(&[chunk.len() as u8])?;
            self.out.write_all(chunk)?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Write the trailer and hand back the writer
    pub fn finish(mut self) -> GfmResult<W> {
        self.out.write_all(&[TRAILER])?;
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gif::lzw::decode;

    const BLACK: [u8; 3] = [0, 0, 0];
    const MAGENTA: [u8; 3] = [255, 0, 255];

    fn checker() -> (Vec<u8>, Vec<u8>) {
        let mut rgb = Vec::new();
        let mut expected = Vec::new();
        for i in 0..16 {
            let magenta = (i + i / 4) % 2 == 1;
            rgb.extend_from_slice(if magenta { &MAGENTA } else { &BLACK });
            expected.push(u8::from(magenta));
        }
        (rgb, expected)
    }

    #[test]
    fn test_single_frame_layout() {
        let (rgb, expected) = checker();
        let mut encoder = GifEncoder::new(Vec::new(), 4, 4).unwrap();
        encoder.begin(false, &[]).unwrap();
        encoder.write_frame(&rgb, 2).unwrap();
        let out = encoder.finish().unwrap();

        assert_eq!(&out[0..6], &[0x47, 0x49, 0x46, 0x38, 0x39, 0x61]);
        assert_eq!(&out[6..13], &[4, 0, 4, 0, 0x70, 0, 0]);

        // Graphic control extension
        assert_eq!(&out[13..21], &[0x21, 0xf9, 4, 0x04, 2, 0, 0, 0]);

        // Image descriptor with a 4 entry local table
        assert_eq!(out[21], 0x2c);
        assert_eq!(out[30], 0x81);
        assert_eq!(&out[31..43], &[0, 0, 0, 255, 0, 255, 0, 0, 0, 0, 0, 0]);

        // LZW minimum code size, then data up to the terminator
        assert_eq!(out[43], 2);
        let data = &out[44..out.len() - 2];
        assert_eq!(decode(data, 2), expected);
        assert_eq!(&out[out.len() - 2..], &[0, 0x3b]);
    }

    #[test]
    fn test_animation_blocks() {
        let (rgb, _) = checker();
        let mut encoder = GifEncoder::new(Vec::new(), 4, 4).unwrap();
        encoder.begin(true, &["GIF made with GFraMe\n", "Title"]).unwrap();
        encoder.write_frame(&rgb, 3).unwrap();
        encoder.write_frame(&rgb, 3).unwrap();
        assert_eq!(encoder.frames(), 2);
        let out = encoder.finish().unwrap();

        assert_eq!(&out[13..16], &[0x21, 0xff, 11]);
        assert_eq!(&out[16..27], b"NETSCAPE2.0");
        assert_eq!(&out[27..32], &[3, 1, 0, 0, 0]);

        assert_eq!(&out[32..34], &[0x21, 0xfe]);
        assert_eq!(out[34], 21);
        assert_eq!(&out[35..56], b"GIF made with GFraMe\n");
        assert_eq!(out[56], 5);
        assert_eq!(&out[57..62], b"Title");
        assert_eq!(out[62], 0);
    }

    /// 128x128 frame of pseudo-random colors from a fixed palette of `colors`
    fn noise(seed: u32, colors: u32) -> Vec<u8> {
        let mut state = seed;
        let mut rgb = Vec::with_capacity(128 * 128 * 3);
        for _ in 0..128 * 128 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let c = (state >> 16) % colors;
            rgb.extend_from_slice(&[(c * 7) as u8, (c * 13) as u8, (255 - c) as u8]);
        }
        rgb
    }

    #[test]
    fn test_decodes_with_independent_decoder() {
        // Enough distinct codes to fill the dictionary several times
        let frames = [noise(1, 200), noise(2, 3)];
        let mut encoder = GifEncoder::new(Vec::new(), 128, 128).unwrap();
        encoder.begin(true, &["GIF made with GFraMe\n"]).unwrap();
        for rgb in &frames {
            encoder.write_frame(rgb, 2).unwrap();
        }
        let out = encoder.finish().unwrap();

        let mut options = ::gif::DecodeOptions::new();
        options.set_color_output(::gif::ColorOutput::RGBA);
        let mut decoder = options
            .read_info(std::io::Cursor::new(out))
            .unwrap();
        assert_eq!((decoder.width(), decoder.height()), (128, 128));

        let mut decoded = 0;
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            assert_eq!(frame.delay, 2);
            let expected = &frames[decoded];
            assert_eq!(frame.buffer.len(), 128 * 128 * 4);
            for (rgba, rgb) in frame.buffer.chunks_exact(4).zip(expected.chunks_exact(3)) {
                assert_eq!(&rgba[..3], rgb);
                assert_eq!(rgba[3], 255);
            }
            decoded += 1;
        }
        assert_eq!(decoded, 2);
    }

    #[test]
    fn test_dimension_checks() {
        assert_eq!(
            GifEncoder::new(Vec::new(), 70_000, 4).unwrap_err(),
            GfmError::GifImageTooLarge
        );
        assert!(GifEncoder::new(Vec::new(), 0, 4).is_err());

        let mut encoder = GifEncoder::new(Vec::new(), 2, 2).unwrap();
        assert!(encoder.write_frame(&[0; 9], 1).is_err());
    }

    #[test]
    fn test_frame_delay_rounds() {
        assert_eq!(frame_delay(60.0), 2);
        assert_eq!(frame_delay(30.0), 3);
        assert_eq!(frame_delay(25.0), 4);
        assert_eq!(frame_delay(0.0), 0);
    }
}
