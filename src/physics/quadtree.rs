//! Subdividing spatial index with a resumable insert-and-collide walk
//!
//! The tree never calls back into game code. Inserting an object starts a
//! depth-first walk that stops at every overlap and hands the pair to the
//! caller; [`Quadtree::resume`] picks the walk up where it stopped.
//!
//! ```ignore
//! let mut step = tree.collide_object(Collider::Object(0), &player)?;
//! while let QuadtreeStep::Overlap { object, other } = step {
//!     handle(object, other);
//!     step = tree.resume()?;
//! }
//! ```
//!
//! Residents are stored in every leaf their bounds touch (edges included),
//! so a walk may meet the same resident in several leaves. Each resident is
//! reported at most once per inserted object.

use std::hash::Hash;

use rustc_hash::FxHashSet;

use super::collider::Collider;
use super::object::{Aabb, Object};
use crate::core::error::{GfmError, GfmResult};
use crate::core::types::{self, TypeCode};
use crate::renderer::{Camera, Group, VideoBackend};
use crate::tilemap::Tilemap;
use crate::util::{Pool, PoolIndex};

/// Result of pumping the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadtreeStep<K> {
    /// The object being inserted overlaps `other`; call `resume` afterwards
    Overlap { object: K, other: K },
    /// Nothing else to report
    Done,
}

/// Counters reported by [`Quadtree::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadtreeStats {
    /// Nodes in use, internal ones included
    pub nodes: usize,
    /// Nodes without children
    pub leaves: usize,
    /// Resident links in use
    pub links: usize,
}

#[derive(Debug, Clone, Copy)]
struct Entry<K> {
    key: K,
    bounds: Aabb,
    type_code: TypeCode,
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Aabb,
    depth: u32,
    children: Option<[PoolIndex; 4]>,
    residents: Option<PoolIndex>,
    count: usize,
}

impl Node {
    fn leaf(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            residents: None,
            count: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Link<K> {
    entry: Entry<K>,
    next: Option<PoolIndex>,
}

/// Quadtree keyed by `K`, typically a [`Collider`]
#[derive(Debug)]
pub struct Quadtree<K> {
    bounds: Aabb,
    max_depth: u32,
    max_nodes: usize,
    nodes: Pool<Node>,
    links: Pool<Link<K>>,
    free_links: Option<PoolIndex>,
    root: Option<PoolIndex>,
    stack: Vec<PoolIndex>,
    /// Object currently being inserted
    object: Option<Entry<K>>,
    /// Residents of the leaf being walked
    other_cursor: Option<PoolIndex>,
    /// Objects queued behind the current one
    pending: Vec<Entry<K>>,
    pending_next: usize,
    reported: FxHashSet<K>,
    last_overlap: Option<(K, K)>,
    static_mode: bool,
}

impl<K: Copy + Eq + Hash> Quadtree<K> {
    /// Create a tree covering `(x, y, width, height)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for empty bounds, a zero `max_depth` or a
    /// zero `max_nodes`
    pub fn new(
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        max_depth: u32,
        max_nodes: usize,
    ) -> GfmResult<Self> {
        let mut tree = Self {
            bounds: Aabb::default(),
            max_depth: 1,
            max_nodes: 1,
            nodes: Pool::new(),
            links: Pool::new(),
            free_links: None,
            root: None,
            stack: Vec::new(),
            object: None,
            other_cursor: None,
            pending: Vec::new(),
            pending_next: 0,
            reported: FxHashSet::default(),
            last_overlap: None,
            static_mode: false,
        };
        tree.init(x, y, width, height, max_depth, max_nodes)?;
        Ok(tree)
    }

    /// Re-create the tree over new bounds, keeping allocated memory.
    ///
    /// # Errors
    ///
    /// Same as [`Quadtree::new`]
    pub fn init(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        max_depth: u32,
        max_nodes: usize,
    ) -> GfmResult<()> {
        if width <= 0 || height <= 0 {
            return Err(GfmError::InvalidArgument(format!(
                "quadtree bounds {width}x{height} are empty"
            )));
        }
        if max_depth == 0 || max_nodes == 0 {
            return Err(GfmError::InvalidArgument(
                "quadtree needs a positive max depth and max nodes".into(),
            ));
        }

        self.bounds = Aabb::new(x, y, width, height);
        self.max_depth = max_depth;
        self.max_nodes = max_nodes;
        let capacity = max_depth as usize * 4;
        if self.stack.capacity() < capacity {
            self.stack.reserve_exact(capacity - self.stack.len());
        }
        self.reset();
        Ok(())
    }

    /// Empty the tree, rewinding every pool.
    pub fn reset(&mut self) {
        self.nodes.reset();
        self.links.reset();
        self.free_links = None;
        self.stack.clear();
        self.object = None;
        self.other_cursor = None;
        self.pending.clear();
        self.pending_next = 0;
        self.reported.clear();
        self.last_overlap = None;
        let bounds = self.bounds;
        self.root = Some(self.nodes.push(Node::leaf(bounds, 0)));
    }

    /// In static mode, collide calls report overlaps without inserting
    pub fn set_static(&mut self, static_mode: bool) {
        self.static_mode = static_mode;
    }

    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Whether a walk is waiting for `resume`
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.object.is_some()
    }

    /// Pair reported by the latest `Overlap` step
    #[must_use]
    pub const fn overlapping(&self) -> Option<(K, K)> {
        self.last_overlap
    }

    #[must_use]
    pub fn stats(&self) -> QuadtreeStats {
        let leaves = self.nodes.iter().filter(|n| n.children.is_none()).count();
        QuadtreeStats {
            nodes: self.nodes.used(),
            leaves,
            links: self.links.used(),
        }
    }

    // ------------------------------------------------------------------------
    // Public protocol
    // ------------------------------------------------------------------------

    /// Insert static geometry without reporting overlaps.
    ///
    /// # Errors
    ///
    /// Returns `QuadtreeStackOverflow` if the walk outgrows its stack
    pub fn populate_bounds(&mut self, key: K, bounds: Aabb, type_code: TypeCode) -> GfmResult<()> {
        self.check_idle()?;
        let entry = Entry {
            key,
            bounds,
            type_code,
        };
        if !self.begin(entry) {
            return Ok(());
        }
        let result = self.walk(false);
        self.object = None;
        result.map(|_| ())
    }

    /// Insert an object without reporting overlaps.
    ///
    /// # Errors
    ///
    /// See [`Quadtree::populate_bounds`]
    pub fn populate_object(&mut self, key: K, object: &Object) -> GfmResult<()> {
        self.populate_bounds(key, object.aabb(), object.type_code())
    }

    /// Insert `bounds` and report the first resident it overlaps.
    ///
    /// # Errors
    ///
    /// Returns `QuadtreeStackOverflow` if the walk outgrows its stack
    pub fn collide_bounds(
        &mut self,
        key: K,
        bounds: Aabb,
        type_code: TypeCode,
    ) -> GfmResult<QuadtreeStep<K>> {
        self.check_idle()?;
        self.collide_batch(std::iter::once((key, bounds, type_code)))
    }

    /// Insert an object and report the first resident it overlaps.
    ///
    /// # Errors
    ///
    /// See [`Quadtree::collide_bounds`]
    pub fn collide_object(&mut self, key: K, object: &Object) -> GfmResult<QuadtreeStep<K>> {
        self.collide_bounds(key, object.aabb(), object.type_code())
    }

    /// Insert several objects one after the other, resuming through all of
    /// them. `Done` is only returned once every object was inserted.
    ///
    /// # Errors
    ///
    /// Returns `GfmError::InvalidArgument` if a walk is still in progress
    pub fn collide_batch(
        &mut self,
        items: impl IntoIterator<Item = (K, Aabb, TypeCode)>,
    ) -> GfmResult<QuadtreeStep<K>> {
        self.check_idle()?;
        self.pending.clear();
        self.pending_next = 0;
        self.pending.extend(items.into_iter().map(|(key, bounds, type_code)| Entry {
            key,
            bounds,
            type_code,
        }));
        self.resume_pending()
    }

    /// Continue the current walk.
    ///
    /// # Errors
    ///
    /// Returns `QuadtreeNotActive` if there is no walk to continue and
    /// `QuadtreeStackOverflow` if the walk outgrows its stack
    pub fn resume(&mut self) -> GfmResult<QuadtreeStep<K>> {
        if self.object.is_none() {
            return Err(GfmError::QuadtreeNotActive);
        }
        match self.walk_or_abort()? {
            QuadtreeStep::Done => self.resume_pending(),
            overlap => Ok(overlap),
        }
    }

    /// Walk with reporting; a failed walk leaves the tree idle
    fn walk_or_abort(&mut self) -> GfmResult<QuadtreeStep<K>> {
        self.walk(true).inspect_err(|_| {
            self.object = None;
            self.other_cursor = None;
            self.pending.clear();
            self.pending_next = 0;
        })
    }

    fn check_idle(&self) -> GfmResult<()> {
        if self.object.is_some() {
            return Err(GfmError::InvalidArgument(
                "quadtree walk still in progress".into(),
            ));
        }
        Ok(())
    }

    /// Start walks for queued objects until one reports an overlap
    fn resume_pending(&mut self) -> GfmResult<QuadtreeStep<K>> {
        while self.pending_next < self.pending.len() {
            let entry = self.pending[self.pending_next];
            self.pending_next += 1;
            if !self.begin(entry) {
                continue;
            }
            match self.walk_or_abort()? {
                QuadtreeStep::Done => {}
                overlap => return Ok(overlap),
            }
        }
        self.pending.clear();
        self.pending_next = 0;
        Ok(QuadtreeStep::Done)
    }

    fn begin(&mut self, entry: Entry<K>) -> bool {
        if !self.bounds.touches(&entry.bounds) {
            return false;
        }
        let Some(root) = self.root else {
            return false;
        };
        self.object = Some(entry);
        self.other_cursor = None;
        self.reported.clear();
        self.stack.clear();
        self.stack.push(root);
        true
    }

    // ------------------------------------------------------------------------
    // Walk
    // ------------------------------------------------------------------------

    fn push(&mut self, node: PoolIndex) -> GfmResult<()> {
        if self.stack.len() >= self.max_depth as usize * 4 {
            return Err(GfmError::QuadtreeStackOverflow);
        }
        self.stack.push(node);
        Ok(())
    }

    fn walk(&mut self, report: bool) -> GfmResult<QuadtreeStep<K>> {
        let Some(object) = self.object else {
            return Ok(QuadtreeStep::Done);
        };
        // Populating always inserts, even in static mode
        let inserting = !report || !self.static_mode;

        loop {
            if let Some(link) = self.other_cursor {
                let other = self.links[link].entry;
                self.other_cursor = self.links[link].next;
                if report
                    && object.bounds.overlaps(&other.bounds)
                    && self.reported.insert(other.key)
                {
                    self.last_overlap = Some((object.key, other.key));
                    return Ok(QuadtreeStep::Overlap {
                        object: object.key,
                        other: other.key,
                    });
                }
                continue;
            }

            let Some(node) = self.stack.pop() else {
                self.object = None;
                return Ok(QuadtreeStep::Done);
            };

            if let Some(children) = self.nodes[node].children {
                // Reversed so that pops visit NW, NE, SW, SE
                for &child in children.iter().rev() {
                    if self.nodes[child].bounds.touches(&object.bounds) {
                        self.push(child)?;
                    }
                }
                continue;
            }

            let (count, depth) = (self.nodes[node].count, self.nodes[node].depth);
            if inserting && count + 1 > self.max_nodes && depth + 1 < self.max_depth {
                self.subdivide(node);
                self.push(node)?;
                continue;
            }

            if report {
                self.other_cursor = self.nodes[node].residents;
            }
            if inserting {
                self.insert_link(node, object);
            }
        }
    }

    fn alloc_link(&mut self, entry: Entry<K>, next: Option<PoolIndex>) -> PoolIndex {
        match self.free_links {
            Some(index) => {
                self.free_links = self.links[index].next;
                self.links[index] = Link { entry, next };
                index
            }
            None => self.links.push(Link { entry, next }),
        }
    }

    fn insert_link(&mut self, node: PoolIndex, entry: Entry<K>) {
        let head = self.nodes[node].residents;
        let link = self.alloc_link(entry, head);
        let node = &mut self.nodes[node];
        node.residents = Some(link);
        node.count += 1;
    }

    fn subdivide(&mut self, node: PoolIndex) {
        let Node { bounds, depth, .. } = self.nodes[node];
        let left_w = bounds.width / 2;
        let top_h = bounds.height / 2;
        let right_w = bounds.width - left_w;
        let bottom_h = bounds.height - top_h;

        let quadrants = [
            Aabb::new(bounds.x, bounds.y, left_w, top_h),
            Aabb::new(bounds.x + left_w, bounds.y, right_w, top_h),
            Aabb::new(bounds.x, bounds.y + top_h, left_w, bottom_h),
            Aabb::new(bounds.x + left_w, bounds.y + top_h, right_w, bottom_h),
        ];
        let children = quadrants.map(|quadrant| self.nodes.push(Node::leaf(quadrant, depth + 1)));

        // Move every resident into each child it touches
        let mut cursor = self.nodes[node].residents.take();
        self.nodes[node].count = 0;
        self.nodes[node].children = Some(children);
        while let Some(link) = cursor {
            let entry = self.links[link].entry;
            cursor = self.links[link].next;

            self.links[link].next = self.free_links;
            self.free_links = Some(link);

            for &child in &children {
                if self.nodes[child].bounds.touches(&entry.bounds) {
                    self.insert_link(child, entry);
                }
            }
        }

        log::trace!(
            "Quadtree node at ({}, {}) split at depth {}",
            bounds.x,
            bounds.y,
            depth
        );
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Visit every leaf with its bounds and resident keys (in list order)
    pub fn for_each_leaf(&self, mut visit: impl FnMut(Aabb, &[(K, Aabb)])) {
        let mut residents = Vec::new();
        for node in self.nodes.iter().filter(|n| n.children.is_none()) {
            residents.clear();
            let mut cursor = node.residents;
            while let Some(link) = cursor {
                let Link { entry, next } = &self.links[link];
                residents.push((entry.key, entry.bounds));
                cursor = *next;
            }
            visit(node.bounds, &residents);
        }
    }

    /// Draw every node's bounds and every resident, colored by type
    ///
    /// # Errors
    ///
    /// Forwards errors from the video backend
    pub fn draw_bounds(&self, video: &mut dyn VideoBackend, camera: &Camera) -> GfmResult<()> {
        let (cam_x, cam_y) = camera.position();
        for node in self.nodes.iter() {
            let b = node.bounds;
            video.draw_rect(b.x - cam_x, b.y - cam_y, b.width, b.height, types::debug_color(types::NONE))?;

            let mut cursor = node.residents;
            while let Some(link) = cursor {
                let Link { entry, next } = &self.links[link];
                let r = entry.bounds;
                if camera.is_inside(&r) {
                    video.draw_rect(
                        r.x - cam_x,
                        r.y - cam_y,
                        r.width,
                        r.height,
                        types::debug_color(entry.type_code),
                    )?;
                }
                cursor = *next;
            }
        }
        Ok(())
    }
}

impl Quadtree<Collider> {
    /// Insert every area of a tilemap as static geometry.
    ///
    /// # Errors
    ///
    /// See [`Quadtree::populate_bounds`]
    pub fn populate_tilemap(&mut self, tilemap: &Tilemap) -> GfmResult<()> {
        for (index, area) in tilemap.areas().iter().enumerate() {
            self.populate_bounds(Collider::Area(index), area.aabb(), area.type_code)?;
        }
        Ok(())
    }

    /// Insert every collideable sprite of a group without reporting overlaps.
    ///
    /// # Errors
    ///
    /// See [`Quadtree::populate_bounds`]
    pub fn populate_group(&mut self, group: &Group) -> GfmResult<()> {
        for sprite in group.collideables() {
            let obj = sprite.object();
            self.populate_bounds(obj.child(), obj.aabb(), obj.type_code())?;
        }
        Ok(())
    }

    /// Collide every collideable sprite of a group, in collideable order.
    ///
    /// # Errors
    ///
    /// See [`Quadtree::collide_batch`]
    pub fn collide_group(&mut self, group: &Group) -> GfmResult<QuadtreeStep<Collider>> {
        let items: Vec<_> = group
            .collideables()
            .map(|sprite| {
                let obj = sprite.object();
                (obj.child(), obj.aabb(), obj.type_code())
            })
            .collect();
        self.collide_batch(items)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: i32, y: i32, size: i32) -> Aabb {
        Aabb::new(x, y, size, size)
    }

    fn drain(tree: &mut Quadtree<u32>, mut step: QuadtreeStep<u32>) -> Vec<(u32, u32)> {
        let mut pairs = Vec::new();
        while let QuadtreeStep::Overlap { object, other } = step {
            pairs.push((object, other));
            step = tree.resume().unwrap();
        }
        pairs
    }

    fn scenario_tree() -> Quadtree<u32> {
        let mut tree = Quadtree::new(0, 0, 320, 240, 4, 2).unwrap();
        tree.populate_bounds(1, boxed(0, 0, 16), types::OBJECT).unwrap();
        tree.populate_bounds(2, boxed(20, 20, 16), types::OBJECT).unwrap();
        tree.populate_bounds(3, boxed(40, 40, 16), types::OBJECT).unwrap();
        tree
    }

    #[test]
    fn test_query_reports_each_resident_once() {
        let mut tree = scenario_tree();

        let mut step = tree.collide_bounds(99, boxed(0, 0, 100), types::OBJECT).unwrap();
        let mut overlaps = Vec::new();
        while let QuadtreeStep::Overlap { object, other } = step {
            assert_eq!(object, 99);
            assert_eq!(tree.overlapping(), Some((99, other)));
            overlaps.push(other);
            step = tree.resume().unwrap();
        }

        assert_eq!(step, QuadtreeStep::Done);
        overlaps.sort_unstable();
        assert_eq!(overlaps, vec![1, 2, 3]);
        assert!(!tree.is_active());
    }

    #[test]
    fn test_resume_without_walk_fails() {
        let mut tree: Quadtree<u32> = Quadtree::new(0, 0, 64, 64, 2, 2).unwrap();
        assert_eq!(tree.resume(), Err(GfmError::QuadtreeNotActive));
    }

    #[test]
    fn test_residents_only_in_touching_leaves() {
        let mut tree = scenario_tree();
        tree.populate_bounds(4, boxed(300, 10, 8), types::OBJECT).unwrap();
        tree.populate_bounds(5, boxed(150, 100, 30), types::OBJECT).unwrap();

        let mut leaves_with_residents = 0;
        tree.for_each_leaf(|leaf, residents| {
            for (_, bounds) in residents {
                assert!(leaf.touches(bounds));
            }
            if !residents.is_empty() {
                leaves_with_residents += 1;
            }
        });
        assert!(leaves_with_residents >= 4);

        let stats = tree.stats();
        assert!(stats.nodes > stats.leaves);
        assert_eq!((stats.nodes - 1) % 4, 0, "Nodes come in groups of four");
    }

    #[test]
    fn test_subdivision_respects_max_depth() {
        let mut tree: Quadtree<u32> = Quadtree::new(0, 0, 64, 64, 1, 1).unwrap();
        for i in 0..5 {
            tree.populate_bounds(i, boxed(0, 0, 4), types::OBJECT).unwrap();
        }
        assert_eq!(tree.stats().nodes, 1);
        assert_eq!(tree.stats().links, 5);
    }

    #[test]
    fn test_object_outside_root_is_done() {
        let mut tree = scenario_tree();
        let step = tree.collide_bounds(7, boxed(500, 500, 8), types::OBJECT).unwrap();
        assert_eq!(step, QuadtreeStep::Done);
        assert!(!tree.is_active());
    }

    #[test]
    fn test_touching_objects_do_not_overlap() {
        let mut tree: Quadtree<u32> = Quadtree::new(0, 0, 64, 64, 3, 4).unwrap();
        tree.populate_bounds(1, boxed(0, 0, 8), types::OBJECT).unwrap();

        let step = tree.collide_bounds(2, boxed(8, 0, 8), types::OBJECT).unwrap();
        assert_eq!(step, QuadtreeStep::Done);
    }

    #[test]
    fn test_inserted_objects_collide_with_later_ones() {
        let mut tree: Quadtree<u32> = Quadtree::new(0, 0, 128, 128, 3, 2).unwrap();

        let first = tree.collide_bounds(1, boxed(10, 10, 8), types::OBJECT).unwrap();
        assert_eq!(first, QuadtreeStep::Done);

        let second = tree.collide_bounds(2, boxed(14, 14, 8), types::OBJECT).unwrap();
        assert_eq!(drain(&mut tree, second), vec![(2, 1)]);
    }

    #[test]
    fn test_static_mode_does_not_insert() {
        let mut tree: Quadtree<u32> = Quadtree::new(0, 0, 128, 128, 3, 2).unwrap();
        tree.populate_bounds(1, boxed(10, 10, 8), types::OBJECT).unwrap();
        tree.set_static(true);

        let step = tree.collide_bounds(2, boxed(12, 12, 8), types::OBJECT).unwrap();
        assert_eq!(drain(&mut tree, step), vec![(2, 1)]);

        let step = tree.collide_bounds(3, boxed(12, 12, 8), types::OBJECT).unwrap();
        assert_eq!(drain(&mut tree, step), vec![(3, 1)], "Query 2 wasn't inserted");
        assert_eq!(tree.stats().links, 1);
    }

    #[test]
    fn test_batch_reports_across_objects() {
        let mut tree: Quadtree<u32> = Quadtree::new(0, 0, 128, 128, 3, 4).unwrap();
        tree.populate_bounds(1, boxed(0, 0, 16), types::OBJECT).unwrap();

        let items = vec![
            (10, boxed(4, 4, 4), types::OBJECT),
            (11, boxed(90, 90, 4), types::OBJECT),
            (12, boxed(6, 6, 4), types::OBJECT),
        ];
        let step = tree.collide_batch(items).unwrap();
        let pairs = drain(&mut tree, step);
        assert_eq!(pairs, vec![(10, 1), (12, 10), (12, 1)]);
    }

    #[test]
    fn test_reset_rewinds_pools() {
        let mut tree = scenario_tree();
        let peak = tree.stats();
        tree.reset();

        assert_eq!(tree.stats(), QuadtreeStats { nodes: 1, leaves: 1, links: 0 });
        let tree_again = scenario_tree();
        assert_eq!(tree_again.stats(), peak);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Quadtree::<u32>::new(0, 0, 0, 10, 2, 2).is_err());
        assert!(Quadtree::<u32>::new(0, 0, 10, 10, 0, 2).is_err());
    }
}
