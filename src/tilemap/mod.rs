//! Tilemaps
//!
//! A tilemap is a grid of tile indices drawn from a spriteset. On top of
//! the grid it keeps:
//!
//! - a tile type dictionary mapping tile indices to collision types,
//! - collision areas, synthesized from typed tiles or added by hand,
//! - tile animations advanced by [`Tilemap::update`].
//!
//! Negative tiles are empty cells and are never drawn.

mod animation;
mod areas;

use rustc_hash::FxHashMap;

pub use animation::TileAnimation;

use crate::core::error::{GfmError, GfmResult};
use crate::core::types::{self, TypeCode};
use crate::parser::{Parser, Record};
use crate::physics::{Aabb, Hitbox};
use crate::renderer::{Camera, Spriteset, VideoBackend};
use animation::TileAnimator;
use areas::Grid;

/// Grid of tiles with collision areas and animated tiles
#[derive(Debug, Clone)]
pub struct Tilemap {
    spriteset: Spriteset,
    columns: usize,
    rows: usize,
    tiles: Vec<i32>,
    tile_types: FxHashMap<i32, TypeCode>,
    areas: Vec<Hitbox>,
    animator: TileAnimator,
}

/// A tilemap loaded from a map file, with the records it doesn't consume
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub tilemap: Tilemap,
    /// `obj` and `attr` records, in file order
    pub records: Vec<Record>,
}

impl Tilemap {
    /// Create a map filled with `fill`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty map
    pub fn new(spriteset: Spriteset, columns: usize, rows: usize, fill: i32) -> GfmResult<Self> {
        Self::with_tiles(spriteset, columns, rows, vec![fill; columns * rows])
    }

    /// Create a map from row-major tile data
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty map or if `tiles` doesn't hold
    /// exactly `columns * rows` entries
    pub fn with_tiles(spriteset: Spriteset, columns: usize, rows: usize, tiles: Vec<i32>) -> GfmResult<Self> {
        if columns == 0 || rows == 0 || tiles.len() != columns * rows {
            return Err(GfmError::InvalidArgument(format!(
                "{} tiles don't fill a {columns}x{rows} map",
                tiles.len()
            )));
        }
        Ok(Self {
            spriteset,
            columns,
            rows,
            tiles,
            tile_types: FxHashMap::default(),
            areas: Vec::new(),
            animator: TileAnimator::default(),
        })
    }

    /// Build a tilemap from a map file.
    ///
    /// `type` and `area` records name their type; `type_names` maps those
    /// names to type codes. Areas are synthesized with
    /// [`Tilemap::recalculate_sided_areas`] when the file types any tile,
    /// then the file's own `area` records are appended.
    ///
    /// # Errors
    ///
    /// Returns parser errors, `InvalidArgument` for an unknown type name,
    /// and `ParserNoObject` when the file has no `map` record
    pub fn load(
        parser: &mut Parser,
        spriteset: Spriteset,
        type_names: &[(&str, TypeCode)],
    ) -> GfmResult<LoadedMap> {
        let lookup = |name: &str| {
            type_names
                .iter()
                .find(|(n, _)| *n == name)
                .map(|&(_, t)| t)
                .ok_or_else(|| GfmError::InvalidArgument(format!("unknown type `{name}`")))
        };

        let mut tile_types = Vec::new();
        let mut manual_areas = Vec::new();
        let mut animations = Vec::new();
        let mut grid = None;
        let mut records = Vec::new();

        while parser.parse_next()?.is_some() {
            match parser.take_record()? {
                Record::Type { name, tile } => tile_types.push((tile, lookup(&name)?)),
                Record::Area {
                    name,
                    x,
                    y,
                    width,
                    height,
                } => manual_areas.push(Hitbox::new(x, y, width, height, lookup(&name)?)),
                Record::Anim { tile, delay, next } => animations.push((tile, delay, next)),
                Record::Map {
                    columns,
                    rows,
                    tiles,
                } => grid = Some((columns as usize, rows as usize, tiles)),
                other => records.push(other),
            }
        }

        let (columns, rows, tiles) = grid.ok_or(GfmError::ParserNoObject)?;
        let mut tilemap = Self::with_tiles(spriteset, columns, rows, tiles)?;
        for (tile, type_code) in tile_types {
            tilemap.add_tile_type(tile, type_code)?;
        }
        for (tile, delay, next) in animations {
            let delay = u32::try_from(delay)
                .map_err(|_| GfmError::InvalidArgument(format!("negative delay {delay}")))?;
            tilemap.add_animation(tile, delay, next)?;
        }
        if !tilemap.tile_types.is_empty() {
            tilemap.recalculate_sided_areas()?;
        }
        for area in manual_areas {
            tilemap.add_hitbox(area)?;
        }
        tilemap.recache_animations();

        log::info!(
            "Loaded {columns}x{rows} tilemap with {} areas and {} extra records",
            tilemap.areas.len(),
            records.len()
        );
        Ok(LoadedMap { tilemap, records })
    }

    // ------------------------------------------------------------------------
    // Grid
    // ------------------------------------------------------------------------

    #[must_use]
    pub const fn spriteset(&self) -> &Spriteset {
        &self.spriteset
    }

    /// `(columns, rows)`
    #[must_use]
    pub const fn dimensions_in_tiles(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Map size in pixels
    #[must_use]
    pub const fn dimensions(&self) -> (i32, i32) {
        (
            self.columns as i32 * self.spriteset.tile_width(),
            self.rows as i32 * self.spriteset.tile_height(),
        )
    }

    #[must_use]
    pub fn tiles(&self) -> &[i32] {
        &self.tiles
    }

    fn cell(&self, column: usize, row: usize) -> GfmResult<usize> {
        if column >= self.columns || row >= self.rows {
            return Err(GfmError::InvalidIndex {
                index: row * self.columns + column,
                len: self.tiles.len(),
            });
        }
        Ok(row * self.columns + column)
    }

    /// # Errors
    ///
    /// Returns `InvalidIndex` outside the map
    pub fn tile(&self, column: usize, row: usize) -> GfmResult<i32> {
        Ok(self.tiles[self.cell(column, row)?])
    }

    /// Replace a tile. Areas and animations aren't recalculated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` outside the map
    pub fn set_tile(&mut self, column: usize, row: usize, tile: i32) -> GfmResult<()> {
        let cell = self.cell(column, row)?;
        self.tiles[cell] = tile;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tile types
    // ------------------------------------------------------------------------

    /// Give `tile` a collision type. Types below the reserved range belong
    /// to the framework and are rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a negative tile, a reserved type or a
    /// tile that already has a type
    pub fn add_tile_type(&mut self, tile: i32, type_code: TypeCode) -> GfmResult<()> {
        if tile < 0 || !types::is_user_type(type_code) {
            return Err(GfmError::InvalidArgument(format!(
                "can't give tile {tile} type {type_code}"
            )));
        }
        if self.tile_types.contains_key(&tile) {
            return Err(GfmError::InvalidArgument(format!("tile {tile} already has a type")));
        }
        self.tile_types.insert(tile, type_code);
        Ok(())
    }

    /// Add `(tile, type)` pairs from a flat slice
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an odd-length slice or a rejected pair
    pub fn add_tile_types(&mut self, pairs: &[i32]) -> GfmResult<()> {
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(GfmError::InvalidArgument(
                "tile types come in (tile, type) pairs".into(),
            ));
        }
        for pair in pairs.chunks_exact(2) {
            self.add_tile_type(pair[0], pair[1])?;
        }
        Ok(())
    }

    #[must_use]
    pub fn tile_type(&self, tile: i32) -> Option<TypeCode> {
        self.tile_types.get(&tile).copied()
    }

    // ------------------------------------------------------------------------
    // Areas
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn areas(&self) -> &[Hitbox] {
        &self.areas
    }

    /// Add a solid area reacting on every side
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty rectangle
    pub fn add_area(&mut self, x: i32, y: i32, width: i32, height: i32, type_code: TypeCode) -> GfmResult<()> {
        self.add_hitbox(Hitbox::new(x, y, width, height, type_code))
    }

    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty rectangle
    pub fn add_hitbox(&mut self, hitbox: Hitbox) -> GfmResult<()> {
        if hitbox.bounds.width <= 0 || hitbox.bounds.height <= 0 {
            return Err(GfmError::InvalidArgument(format!(
                "area {:?} is empty",
                hitbox.bounds
            )));
        }
        self.areas.push(hitbox);
        Ok(())
    }

    pub fn clear_areas(&mut self) {
        self.areas.clear();
    }

    /// Whether any area holds the center of the cell at `index`
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` outside the map
    pub fn is_tile_in_any_area(&self, index: usize) -> GfmResult<bool> {
        if index >= self.tiles.len() {
            return Err(GfmError::InvalidIndex {
                index,
                len: self.tiles.len(),
            });
        }
        let (tw, th) = (self.spriteset.tile_width(), self.spriteset.tile_height());
        let cx = (index % self.columns) as i32 * tw + tw / 2;
        let cy = (index / self.columns) as i32 * th + th / 2;
        Ok(self.areas.iter().any(|a| a.contains_point(cx, cy)))
    }

    /// Largest same-type rectangle starting at the cell at `index`, growing
    /// right first and then down, in pixels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` outside the map, or `InvalidArgument` for an
    /// untyped tile
    pub fn area_bounds(&self, index: usize) -> GfmResult<Aabb> {
        if index >= self.tiles.len() {
            return Err(GfmError::InvalidIndex {
                index,
                len: self.tiles.len(),
            });
        }
        let (column, row) = (index % self.columns, index / self.columns);
        let taken = vec![false; self.tiles.len()];
        let (width, height, _) = areas::greedy_rect(&self.grid(), column, row, &taken).ok_or_else(|| {
            GfmError::InvalidArgument(format!("tile {} has no type", self.tiles[index]))
        })?;
        let (tw, th) = (self.spriteset.tile_width(), self.spriteset.tile_height());
        Ok(Aabb::new(
            column as i32 * tw,
            row as i32 * th,
            width as i32 * tw,
            height as i32 * th,
        ))
    }

    fn grid(&self) -> Grid<'_> {
        Grid {
            tiles: &self.tiles,
            columns: self.columns,
            rows: self.rows,
            types: &self.tile_types,
            tile_width: self.spriteset.tile_width(),
            tile_height: self.spriteset.tile_height(),
        }
    }

    fn check_types(&self) -> GfmResult<()> {
        if self.tile_types.is_empty() {
            return Err(GfmError::NotInitialized("tile types"));
        }
        Ok(())
    }

    /// Replace every area with solid rectangles covering the typed tiles
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` when no tile has a type
    pub fn recalculate_areas(&mut self) -> GfmResult<()> {
        self.check_types()?;
        self.areas = areas::greedy_areas(&self.grid());
        log::debug!("Tilemap has {} solid areas", self.areas.len());
        Ok(())
    }

    /// Replace every area with one-sided edge rectangles
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` when no tile has a type
    pub fn recalculate_sided_areas(&mut self) -> GfmResult<()> {
        self.check_types()?;
        self.areas = areas::sided_areas(&self.grid());
        log::debug!("Tilemap has {} sided areas", self.areas.len());
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Animation
    // ------------------------------------------------------------------------

    /// Make `tile` turn into `next` after `delay_ms`. Call
    /// [`Tilemap::recache_animations`] once every animation is added.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for negative tiles or a zero delay
    pub fn add_animation(&mut self, tile: i32, delay_ms: u32, next: i32) -> GfmResult<()> {
        self.animator.add(tile, delay_ms, next)
    }

    /// Add `(tile, delay_ms, next)` triples from a flat slice
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed slice or entry
    pub fn add_animations(&mut self, triples: &[i32]) -> GfmResult<()> {
        if triples.is_empty() || triples.len() % 3 != 0 {
            return Err(GfmError::InvalidArgument(
                "tile animations come in (tile, delay, next) triples".into(),
            ));
        }
        for t in triples.chunks_exact(3) {
            let delay = u32::try_from(t[1])
                .map_err(|_| GfmError::InvalidArgument(format!("negative delay {}", t[1])))?;
            self.add_animation(t[0], delay, t[2])?;
        }
        Ok(())
    }

    #[must_use]
    pub fn animation(&self, tile: i32) -> Option<TileAnimation> {
        self.animator.get(tile)
    }

    /// Restart the timers of every animated cell
    pub fn recache_animations(&mut self) {
        self.animator.recache(&self.tiles);
    }

    /// Advance animated tiles; returns how many cells changed tile
    pub fn update(&mut self, elapsed_ms: u32) -> usize {
        self.animator.update(&mut self.tiles, elapsed_ms)
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    /// Draw the tiles under the camera
    ///
    /// # Errors
    ///
    /// Propagates backend failures
    pub fn draw(&self, video: &mut dyn VideoBackend, camera: &Camera) -> GfmResult<()> {
        let (tw, th) = (self.spriteset.tile_width(), self.spriteset.tile_height());
        let (cam_x, cam_y) = camera.position();
        let (view_w, view_h) = camera.view_size();

        let first_col = cam_x.div_euclid(tw).max(0);
        let first_row = cam_y.div_euclid(th).max(0);
        let last_col = (cam_x + view_w - 1).div_euclid(tw).min(self.columns as i32 - 1);
        let last_row = (cam_y + view_h - 1).div_euclid(th).min(self.rows as i32 - 1);

        for row in first_row..=last_row {
            for col in first_col..=last_col {
                let tile = self.tiles[row as usize * self.columns + col as usize];
                if let Ok(tile) = usize::try_from(tile) {
                    video.draw_tile(&self.spriteset, col * tw - cam_x, row * th - cam_y, tile, false)?;
                }
            }
        }
        Ok(())
    }

    /// Outline every area in its type's debug color
    ///
    /// # Errors
    ///
    /// Propagates backend failures
    pub fn draw_areas(&self, video: &mut dyn VideoBackend, camera: &Camera) -> GfmResult<()> {
        let (cam_x, cam_y) = camera.position();
        for area in self.areas.iter().filter(|a| camera.is_inside(&a.bounds)) {
            let b = area.bounds;
            video.draw_rect(b.x - cam_x, b.y - cam_y, b.width, b.height, types::debug_color(area.type_code))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Collision;
    use crate::renderer::{SoftwareBackend, TextureId};

    const SOLID: TypeCode = types::RESERVED_2;

    fn spriteset() -> Spriteset {
        Spriteset::new(TextureId(0), 16, 16, 8, 8).unwrap()
    }

    #[test]
    fn test_tile_types() {
        let mut map = Tilemap::new(spriteset(), 4, 3, 0).unwrap();
        map.add_tile_types(&[1, SOLID, 2, SOLID + 1]).unwrap();
        assert_eq!(map.tile_type(1), Some(SOLID));
        assert_eq!(map.tile_type(3), None);

        assert!(map.add_tile_type(1, SOLID).is_err(), "Duplicate tile");
        assert!(map.add_tile_type(5, types::SPRITE).is_err(), "Reserved type");
        assert!(map.add_tile_types(&[7]).is_err());
    }

    #[test]
    fn test_sided_areas_from_grid() {
        #[rustfmt::skip]
        let tiles = vec![
            0, 1, 1, 0,
            0, 1, 1, 0,
            0, 0, 0, 0,
        ];
        let mut map = Tilemap::with_tiles(spriteset(), 4, 3, tiles).unwrap();
        assert_eq!(map.recalculate_sided_areas(), Err(GfmError::NotInitialized("tile types")));

        map.add_tile_type(1, SOLID).unwrap();
        map.recalculate_sided_areas().unwrap();
        assert_eq!(map.areas().len(), 4);
        assert!(map.areas().contains(&Hitbox::new(8, 0, 16, 8, SOLID).with_hit_flags(Collision::UP)));
        assert!(map.is_tile_in_any_area(1).unwrap());
        assert!(!map.is_tile_in_any_area(0).unwrap());
    }

    #[test]
    fn test_legacy_areas_and_bounds() {
        let tiles = vec![1, 1, 0, 1, 1, 0];
        let mut map = Tilemap::with_tiles(spriteset(), 3, 2, tiles).unwrap();
        map.add_tile_type(1, SOLID).unwrap();

        assert_eq!(map.area_bounds(0).unwrap(), Aabb::new(0, 0, 16, 16));
        assert_eq!(map.area_bounds(1).unwrap(), Aabb::new(8, 0, 8, 16));
        assert!(map.area_bounds(2).is_err());

        map.recalculate_areas().unwrap();
        assert_eq!(map.areas(), &[Hitbox::new(0, 0, 16, 16, SOLID)]);
    }

    #[test]
    fn test_manual_areas() {
        let mut map = Tilemap::new(spriteset(), 2, 2, -1).unwrap();
        map.add_area(0, 0, 8, 8, SOLID).unwrap();
        assert!(map.add_area(0, 0, 0, 8, SOLID).is_err());
        assert_eq!(map.areas().len(), 1);
        map.clear_areas();
        assert!(map.areas().is_empty());
    }

    #[test]
    fn test_tile_animation() {
        let mut map = Tilemap::with_tiles(spriteset(), 2, 1, vec![0, 1]).unwrap();
        map.add_animations(&[1, 100, 2, 2, 100, 1]).unwrap();
        map.recache_animations();

        assert_eq!(map.update(99), 0);
        assert_eq!(map.update(1), 1);
        assert_eq!(map.tile(1, 0).unwrap(), 2);
        assert_eq!(map.update(100), 1);
        assert_eq!(map.tile(1, 0).unwrap(), 1);
    }

    #[test]
    fn test_load_from_parser() {
        let text = "\
type wall 1
area spike 0 16 16 8
anim 3 50 1
obj player 4 4 8 8 [hp , 3]
attr [music , cave]
map 3 3
 1 1 3
 0 0 0
 0 0 0
";
        let mut parser = Parser::new(text);
        let names = [("wall", SOLID), ("spike", SOLID + 1)];
        let loaded = Tilemap::load(&mut parser, spriteset(), &names).unwrap();

        let map = &loaded.tilemap;
        assert_eq!(map.dimensions_in_tiles(), (3, 3));
        assert_eq!(map.dimensions(), (24, 24));
        assert_eq!(map.tile_type(1), Some(SOLID));
        assert!(map.areas().contains(&Hitbox::new(0, 16, 16, 8, SOLID + 1)));
        assert_eq!(map.animation(3), Some(TileAnimation { delay_ms: 50, next: 1 }));
        assert_eq!(loaded.records.len(), 2);

        let mut map = loaded.tilemap;
        assert_eq!(map.update(50), 1);
        assert_eq!(map.tile(2, 0).unwrap(), 1);
    }

    #[test]
    fn test_load_rejects_unknown_names() {
        let mut parser = Parser::new("type lava 1\nmap 1 1\n1");
        assert!(Tilemap::load(&mut parser, spriteset(), &[]).is_err());

        let mut parser = Parser::new("type wall 1");
        assert_eq!(
            Tilemap::load(&mut parser, spriteset(), &[("wall", SOLID)]).unwrap_err(),
            GfmError::ParserNoObject
        );
    }

    #[test]
    fn test_draw_visible_tiles() {
        let mut video = SoftwareBackend::new(16, 16).unwrap();
        let mut texture = vec![0xffff_0000; 16 * 16];
        // Tile 1 (top right of the texture) is green
        for row in 0..8 {
            for col in 8..16 {
                texture[row * 16 + col] = 0xff00_ff00;
            }
        }
        let texture = video.add_texture(16, 16, texture).unwrap();
        let set = Spriteset::new(texture, 16, 16, 8, 8).unwrap();
        let map = Tilemap::with_tiles(set, 3, 2, vec![0, 1, -1, 1, 0, 1]).unwrap();

        let mut camera = Camera::new(16, 16).unwrap();
        camera.set_world_dimensions(24, 16).unwrap();
        camera.center_at_point(24, 0);
        assert_eq!(camera.position(), (8, 0));

        map.draw(&mut video, &camera).unwrap();
        assert_eq!(video.pixel(0, 0), Some(0xff00_ff00));
        assert_eq!(video.pixel(8, 0), Some(0xff00_0000), "Empty cell isn't drawn");
        assert_eq!(video.pixel(0, 8), Some(0xffff_0000));
        assert_eq!(video.pixel(8, 8), Some(0xff00_ff00));
    }
}
