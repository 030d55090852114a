//! Fixed-size tile slicing of a texture

use crate::core::error::{GfmError, GfmResult};
use crate::physics::Aabb;

/// Handle to a texture owned by a video backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub usize);

/// A texture cut into equally sized tiles, numbered row by row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spriteset {
    texture: TextureId,
    texture_width: i32,
    texture_height: i32,
    tile_width: i32,
    tile_height: i32,
    columns: i32,
    rows: i32,
}

impl Spriteset {
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a tile is empty or larger than the texture
    pub fn new(
        texture: TextureId,
        texture_width: i32,
        texture_height: i32,
        tile_width: i32,
        tile_height: i32,
    ) -> GfmResult<Self> {
        if tile_width <= 0
            || tile_height <= 0
            || tile_width > texture_width
            || tile_height > texture_height
        {
            return Err(GfmError::InvalidArgument(format!(
                "tile {tile_width}x{tile_height} doesn't fit texture {texture_width}x{texture_height}"
            )));
        }
        Ok(Self {
            texture,
            texture_width,
            texture_height,
            tile_width,
            tile_height,
            columns: texture_width / tile_width,
            rows: texture_height / tile_height,
        })
    }

    #[inline]
    #[must_use]
    pub const fn texture(&self) -> TextureId {
        self.texture
    }

    #[inline]
    #[must_use]
    pub const fn texture_size(&self) -> (i32, i32) {
        (self.texture_width, self.texture_height)
    }

    #[inline]
    #[must_use]
    pub const fn tile_width(&self) -> i32 {
        self.tile_width
    }

    #[inline]
    #[must_use]
    pub const fn tile_height(&self) -> i32 {
        self.tile_height
    }

    /// Number of whole tiles in the texture
    #[must_use]
    pub const fn tile_count(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    /// Source rectangle of `tile` within the texture
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` if the tile is past the end of the texture
    pub fn tile_rect(&self, tile: usize) -> GfmResult<Aabb> {
        if tile >= self.tile_count() {
            return Err(GfmError::InvalidIndex {
                index: tile,
                len: self.tile_count(),
            });
        }
        let tile = tile as i32;
        Ok(Aabb::new(
            (tile % self.columns) * self.tile_width,
            (tile / self.columns) * self.tile_height,
            self.tile_width,
            self.tile_height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_rect() {
        let set = Spriteset::new(TextureId(0), 64, 32, 8, 8).unwrap();
        assert_eq!(set.tile_count(), 32);
        assert_eq!(set.tile_rect(0).unwrap(), Aabb::new(0, 0, 8, 8));
        assert_eq!(set.tile_rect(9).unwrap(), Aabb::new(8, 8, 8, 8));
        assert!(set.tile_rect(32).is_err());
    }

    #[test]
    fn test_partial_tiles_are_ignored() {
        let set = Spriteset::new(TextureId(0), 20, 10, 8, 8).unwrap();
        assert_eq!(set.tile_count(), 2);
    }

    #[test]
    fn test_invalid_tile_size() {
        assert!(Spriteset::new(TextureId(0), 16, 16, 0, 8).is_err());
        assert!(Spriteset::new(TextureId(0), 16, 16, 32, 8).is_err());
    }
}
