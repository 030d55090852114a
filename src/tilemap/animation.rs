//! Animated tiles
//!
//! A tile animates by naming the tile that replaces it and how long it
//! stays before that. Chains like `4 -> 5 -> 6 -> 4` loop forever; a chain
//! ending on a tile without an entry stops there.

use rustc_hash::FxHashMap;

use crate::core::error::{GfmError, GfmResult};

/// How long a tile is shown and what comes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAnimation {
    pub delay_ms: u32,
    pub next: i32,
}

#[derive(Debug, Clone, Copy)]
struct Running {
    cell: usize,
    remaining: i64,
}

/// Animation table plus the cells currently animating
#[derive(Debug, Clone, Default)]
pub(crate) struct TileAnimator {
    table: FxHashMap<i32, TileAnimation>,
    running: Vec<Running>,
}

impl TileAnimator {
    pub fn add(&mut self, tile: i32, delay_ms: u32, next: i32) -> GfmResult<()> {
        if tile < 0 || next < 0 || delay_ms == 0 {
            return Err(GfmError::InvalidArgument(format!(
                "bad tile animation {tile} -> {next} after {delay_ms}ms"
            )));
        }
        self.table.insert(tile, TileAnimation { delay_ms, next });
        Ok(())
    }

    pub fn get(&self, tile: i32) -> Option<TileAnimation> {
        self.table.get(&tile).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn running(&self) -> usize {
        self.running.len()
    }

    /// Restart timers for every cell showing an animated tile
    pub fn recache(&mut self, tiles: &[i32]) {
        self.running.clear();
        for (cell, tile) in tiles.iter().enumerate() {
            if let Some(anim) = self.table.get(tile) {
                self.running.push(Running {
                    cell,
                    remaining: i64::from(anim.delay_ms),
                });
            }
        }
    }

    /// Advance every running cell; returns how many tile swaps happened
    pub fn update(&mut self, tiles: &mut [i32], ms: u32) -> usize {
        let mut swaps = 0;
        let table = &self.table;
        self.running.retain_mut(|run| {
            run.remaining -= i64::from(ms);
            while run.remaining <= 0 {
                let Some(anim) = table.get(&tiles[run.cell]) else {
                    return false;
                };
                tiles[run.cell] = anim.next;
                swaps += 1;
                match table.get(&anim.next) {
                    Some(next) => run.remaining += i64::from(next.delay_ms),
                    None => return false,
                }
            }
            true
        });
        swaps
    }
}
