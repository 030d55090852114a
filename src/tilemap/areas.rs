//! Collision area synthesis
//!
//! Two generators turn a typed tile grid into hitboxes:
//!
//! - [`sided_areas`] emits one rectangle per exposed edge run, each one
//!   reacting only on the side it faces. A platform made of tiles becomes a
//!   top strip that fires on landing, a bottom strip that fires on head
//!   bumps, and side columns for walls.
//! - [`greedy_areas`] covers same-type tiles with solid rectangles, growing
//!   each one right first and then down.

use rustc_hash::FxHashMap;

use crate::core::types::TypeCode;
use crate::physics::{Aabb, Collision, Hitbox};

/// Read-only view of a typed tile grid
#[derive(Debug, Clone, Copy)]
pub(crate) struct Grid<'a> {
    pub tiles: &'a [i32],
    pub columns: usize,
    pub rows: usize,
    pub types: &'a FxHashMap<i32, TypeCode>,
    pub tile_width: i32,
    pub tile_height: i32,
}

impl Grid<'_> {
    fn type_at(&self, column: usize, row: usize) -> Option<TypeCode> {
        self.types.get(&self.tiles[row * self.columns + column]).copied()
    }

    /// Same-type neighbour check; cells off the grid never match
    fn matches(&self, column: Option<usize>, row: Option<usize>, type_code: TypeCode) -> bool {
        match (column, row) {
            (Some(c), Some(r)) if c < self.columns && r < self.rows => {
                self.type_at(c, r) == Some(type_code)
            }
            _ => false,
        }
    }

    fn rect(&self, column: usize, row: usize, columns: usize, rows: usize) -> Aabb {
        Aabb::new(
            column as i32 * self.tile_width,
            row as i32 * self.tile_height,
            columns as i32 * self.tile_width,
            rows as i32 * self.tile_height,
        )
    }
}

/// An edge run still being extended
#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    type_code: TypeCode,
}

/// Collects rectangles, folding the flags of identical rectangles together
#[derive(Debug, Default)]
struct Emitter {
    areas: Vec<Hitbox>,
    index: FxHashMap<(Aabb, TypeCode), usize>,
}

impl Emitter {
    fn emit(&mut self, bounds: Aabb, type_code: TypeCode, flags: Collision) {
        if let Some(&i) = self.index.get(&(bounds, type_code)) {
            self.areas[i].hit_flags |= flags;
            return;
        }
        self.index.insert((bounds, type_code), self.areas.len());
        self.areas.push(Hitbox {
            bounds,
            type_code,
            hit_flags: flags,
        });
    }
}

/// Extend `run` with the cell at `pos`, or close it and start over.
///
/// Returns the run that was closed, if any.
fn step_run(run: &mut Option<Run>, pos: usize, cell: Option<TypeCode>) -> Option<Run> {
    match (*run, cell) {
        (Some(open), Some(t)) if open.type_code == t => None,
        (open, Some(t)) => {
            *run = Some(Run { start: pos, type_code: t });
            open
        }
        (open, None) => {
            *run = None;
            open
        }
    }
}

/// Synthesize one-sided edge rectangles in a single row-major pass.
///
/// Horizontal runs of tiles with an exposed top (or bottom) edge become
/// `UP` (or `DOWN`) strips one tile tall. Vertical runs with an exposed
/// left (or right) edge become `LEFT` (or `RIGHT`) strips one tile wide.
/// Tiles with no exposed edge are covered by flagless filler strips so
/// every typed tile lies inside some rectangle. Rectangles with identical
/// bounds and type are merged, so an isolated tile yields a single box
/// reacting on all four sides.
pub(crate) fn sided_areas(grid: &Grid<'_>) -> Vec<Hitbox> {
    let mut out = Emitter::default();
    let mut left: Vec<Option<Run>> = vec![None; grid.columns];
    let mut right: Vec<Option<Run>> = vec![None; grid.columns];

    for row in 0..grid.rows {
        let mut up: Option<Run> = None;
        let mut down: Option<Run> = None;
        let mut fill: Option<Run> = None;

        for column in 0..grid.columns {
            let cell = grid.type_at(column, row);
            let exposed = |dc: isize, dr: isize| {
                cell.is_some_and(|t| {
                    !grid.matches(column.checked_add_signed(dc), row.checked_add_signed(dr), t)
                })
            };
            let (e_up, e_down, e_left, e_right) =
                (exposed(0, -1), exposed(0, 1), exposed(-1, 0), exposed(1, 0));
            let interior = cell.is_some() && !(e_up || e_down || e_left || e_right);

            let horizontal = [
                (&mut up, e_up, Collision::UP),
                (&mut down, e_down, Collision::DOWN),
                (&mut fill, interior, Collision::NONE),
            ];
            for (run, active, flag) in horizontal {
                if let Some(done) = step_run(run, column, cell.filter(|_| active)) {
                    let bounds = grid.rect(done.start, row, column - done.start, 1);
                    out.emit(bounds, done.type_code, flag);
                }
            }

            let vertical = [
                (&mut left[column], e_left, Collision::LEFT),
                (&mut right[column], e_right, Collision::RIGHT),
            ];
            for (run, active, flag) in vertical {
                if let Some(done) = step_run(run, row, cell.filter(|_| active)) {
                    let bounds = grid.rect(column, done.start, 1, row - done.start);
                    out.emit(bounds, done.type_code, flag);
                }
            }
        }

        for (run, flag) in [(up, Collision::UP), (down, Collision::DOWN), (fill, Collision::NONE)] {
            if let Some(done) = run {
                let bounds = grid.rect(done.start, row, grid.columns - done.start, 1);
                out.emit(bounds, done.type_code, flag);
            }
        }
    }

    for column in 0..grid.columns {
        for (run, flag) in [(left[column], Collision::LEFT), (right[column], Collision::RIGHT)] {
            if let Some(done) = run {
                let bounds = grid.rect(column, done.start, 1, grid.rows - done.start);
                out.emit(bounds, done.type_code, flag);
            }
        }
    }

    out.areas
}

/// Widest-then-tallest rectangle of same-type tiles starting at a cell,
/// in tiles. `taken` cells stop the growth.
pub(crate) fn greedy_rect(
    grid: &Grid<'_>,
    column: usize,
    row: usize,
    taken: &[bool],
) -> Option<(usize, usize, TypeCode)> {
    let type_code = grid.type_at(column, row)?;
    let free = |c: usize, r: usize| {
        !taken[r * grid.columns + c] && grid.type_at(c, r) == Some(type_code)
    };
    if !free(column, row) {
        return None;
    }

    let width = (column..grid.columns).take_while(|&c| free(c, row)).count();
    let height = (row..grid.rows)
        .take_while(|&r| (column..column + width).all(|c| free(c, r)))
        .count();
    Some((width, height, type_code))
}

/// Cover every typed tile with solid rectangles that never overlap
pub(crate) fn greedy_areas(grid: &Grid<'_>) -> Vec<Hitbox> {
    let mut taken = vec![false; grid.tiles.len()];
    let mut out = Vec::new();

    for row in 0..grid.rows {
        for column in 0..grid.columns {
            let Some((width, height, type_code)) = greedy_rect(grid, column, row, &taken) else {
                continue;
            };
            for r in row..row + height {
                taken[r * grid.columns + column..r * grid.columns + column + width].fill(true);
            }
            let b = grid.rect(column, row, width, height);
            out.push(Hitbox::new(b.x, b.y, b.width, b.height, type_code));
        }
    }
    out
}
