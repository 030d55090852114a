//! Video backend seam
//!
//! The framework never talks to a window or GPU directly. Everything it
//! draws goes through [`VideoBackend`], which renders into a fixed-size
//! backbuffer. [`SoftwareBackend`] is an in-memory implementation used by
//! headless runs, GIF capture and tests.

use std::path::Path;

use super::spriteset::{Spriteset, TextureId};
use crate::core::error::{GfmError, GfmResult};

/// Operations the core needs from a video backend.
///
/// Colors are `0xAARRGGBB`. Coordinates are backbuffer pixels.
pub trait VideoBackend {
    /// Backbuffer dimensions in pixels
    fn backbuffer_size(&self) -> (u32, u32);

    /// Fill the whole backbuffer
    fn clear(&mut self, color: u32);

    /// Blit one tile of a spriteset, mirrored horizontally if `flipped`
    fn draw_tile(
        &mut self,
        spriteset: &Spriteset,
        x: i32,
        y: i32,
        tile: usize,
        flipped: bool,
    ) -> GfmResult<()>;

    /// Outline a rectangle
    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: u32) -> GfmResult<()>;

    /// Fill a rectangle
    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: u32) -> GfmResult<()>;

    /// Copy the backbuffer as tightly packed 24-bit RGB
    fn read_backbuffer(&self, out: &mut Vec<u8>) -> GfmResult<()>;

    /// Register a texture from `0xAARRGGBB` pixels
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `pixels` doesn't match the dimensions
    fn add_texture(&mut self, width: u32, height: u32, pixels: Vec<u32>) -> GfmResult<TextureId>;

    /// Dimensions of a registered texture
    fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)>;

    /// Load a texture from an image file.
    ///
    /// Pixels matching `key_color` (`0xRRGGBB`) become transparent.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the image can't be opened or decoded
    fn load_texture(&mut self, path: &Path, key_color: Option<u32>) -> GfmResult<TextureId> {
        let img = image::open(path)
            .map_err(|e| GfmError::Io(format!("{}: {e}", path.display())))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                let rgb = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
                if key_color == Some(rgb) { 0 } else { (u32::from(a) << 24) | rgb }
            })
            .collect();
        log::info!("Loaded texture {} ({width}x{height})", path.display());
        self.add_texture(width, height, pixels)
    }

    /// Show the finished frame
    fn present(&mut self) -> GfmResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

/// Backbuffer kept in memory
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    textures: Vec<Texture>,
    frames_presented: u64,
}

impl SoftwareBackend {
    /// Create a backbuffer of `width` by `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty backbuffer
    pub fn new(width: u32, height: u32) -> GfmResult<Self> {
        if width == 0 || height == 0 {
            return Err(GfmError::InvalidArgument(format!(
                "backbuffer {width}x{height} is empty"
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0xff00_0000; width as usize * height as usize],
            textures: Vec::new(),
            frames_presented: 0,
        })
    }

    /// Color of a backbuffer pixel
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[(y * self.width + x) as usize])
    }

    #[must_use]
    pub const fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn put(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        // Fully transparent pixels are skipped, anything else is opaque
        if color >> 24 == 0 {
            return;
        }
        self.pixels[y as usize * self.width as usize + x as usize] = color | 0xff00_0000;
    }
}

impl VideoBackend for SoftwareBackend {
    fn backbuffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: u32) {
        self.pixels.fill(color | 0xff00_0000);
    }

    fn draw_tile(
        &mut self,
        spriteset: &Spriteset,
        x: i32,
        y: i32,
        tile: usize,
        flipped: bool,
    ) -> GfmResult<()> {
        let src = spriteset.tile_rect(tile)?;
        let texture_index = spriteset.texture().0;
        let Some(texture) = self.textures.get(texture_index) else {
            return Err(GfmError::InvalidIndex {
                index: texture_index,
                len: self.textures.len(),
            });
        };
        // Clone the row data we need to release the borrow on `self.textures`
        let texture_width = texture.width as usize;
        let rows: Vec<u32> = (0..src.height)
            .flat_map(|row| {
                let start = (src.y + row) as usize * texture_width + src.x as usize;
                texture.pixels[start..start + src.width as usize].iter().copied()
            })
            .collect();

        for row in 0..src.height {
            for col in 0..src.width {
                let src_col = if flipped { src.width - 1 - col } else { col };
                let color = rows[(row * src.width + src_col) as usize];
                self.put(x + col, y + row, color);
            }
        }
        Ok(())
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: u32) -> GfmResult<()> {
        if width <= 0 || height <= 0 {
            return Ok(());
        }
        for col in x..x + width {
            self.put(col, y, color);
            self.put(col, y + height - 1, color);
        }
        for row in y..y + height {
            self.put(x, row, color);
            self.put(x + width - 1, row, color);
        }
        Ok(())
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: u32) -> GfmResult<()> {
        for row in y..y + height.max(0) {
            for col in x..x + width.max(0) {
                self.put(col, row, color);
            }
        }
        Ok(())
    }

    fn read_backbuffer(&self, out: &mut Vec<u8>) -> GfmResult<()> {
        out.clear();
        out.reserve(self.pixels.len() * 3);
        for &pixel in &self.pixels {
            out.extend_from_slice(&[(pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8]);
        }
        Ok(())
    }

    fn present(&mut self) -> GfmResult<()> {
        self.frames_presented += 1;
        Ok(())
    }

    fn add_texture(&mut self, width: u32, height: u32, pixels: Vec<u32>) -> GfmResult<TextureId> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return Err(GfmError::InvalidArgument(format!(
                "texture data doesn't match {width}x{height}"
            )));
        }
        self.textures.push(Texture {
            width,
            height,
            pixels,
        });
        Ok(TextureId(self.textures.len() - 1))
    }

    fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures.get(texture.0).map(|t| (t.width, t.height))
    }
}
