//! Per-frame scratch state.
//!
//! Everything here is rebuilt from scratch by [`FrameContext::reset`] at
//! the top of every frame; nothing carries over, and linked lists are
//! arena indices rather than pointers.

use std::ops::Index;

use crate::{
    engine::config::RenderConfig,
    renderer::Opacity,
    world::{ColorizeId, ObjectId, SectorId, SegmentId, SubSectorId, TextureId},
};

/// End-of-list marker for arena links.
pub const NIL: u32 = u32::MAX;

/// Append-only pool with a hard capacity; cleared by truncation.
#[derive(Debug)]
pub struct Arena<T> {
    items: Vec<T>,
    limit: usize,
    dropped: usize,
}

impl<T> Arena<T> {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit,
            dropped: 0,
        }
    }

    /// Index of the new entry, or `None` (and a dropped count) when full.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<u32> {
        if self.items.len() >= self.limit {
            self.dropped += 1;
            return None;
        }
        self.items.push(item);
        Some((self.items.len() - 1) as u32)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.dropped = 0;
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.items.get(index as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.items.get_mut(index as usize)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Follow `next` links from `head`.
    pub fn iter_list<'a>(
        &'a self,
        head: u32,
        next: fn(&T) -> u32,
    ) -> impl Iterator<Item = (u32, &'a T)> + 'a {
        let mut cur = head;
        std::iter::from_fn(move || {
            let item = self.get(cur)?;
            let at = cur;
            cur = next(item);
            Some((at, item))
        })
    }
}

impl<T> Index<u32> for Arena<T> {
    type Output = T;
    #[inline]
    fn index(&self, index: u32) -> &T {
        &self.items[index as usize]
    }
}

/*--------------------------- frame records ----------------------------*/

/// One queued (transparent or translucent) wall strip.
#[derive(Clone, Debug)]
pub struct WallSlice {
    /// Screen rows `[top, bottom)`.
    pub top: i32,
    pub bottom: i32,
    pub depth: i64,
    pub texture: TextureId,
    pub column: usize,
    /// 16.16 texel row at `top` and per-row step.
    pub v_offset: i64,
    pub v_step: i64,
    pub shade: u8,
    pub opacity: Opacity,
    pub next: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Plane {
    Floor,
    Ceiling,
}

/// A vertical band of visible floor or ceiling in one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloorRun {
    pub top: i32,
    pub bottom: i32,
    pub sector: SectorId,
    pub plane: Plane,
    pub next: u32,
}

/// Horizontal run produced from the per-column bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloorSpan {
    pub y: i32,
    /// Columns `[x_start, x_end)`.
    pub x_start: i32,
    pub x_end: i32,
    pub sector: SectorId,
    pub plane: Plane,
}

/// A projected object: screen box plus texture mapping.
#[derive(Clone, Debug)]
pub struct ObjectRun {
    pub object: ObjectId,
    pub type_id: u16,
    /// Sort key: view depth adjusted for chain ordering.
    pub depth: i64,
    /// Unadjusted view depth.
    pub view_depth: i64,
    /// Columns `[x_start, x_end)`, rows `[top, bottom)`.
    pub x_start: i32,
    pub x_end: i32,
    pub top: i32,
    pub bottom: i32,
    pub picture: TextureId,
    pub colorize: Option<ColorizeId>,
    /// 16.16 texel column at `x_start` and per-column step.
    pub u_start: i64,
    pub u_step: i64,
    /// 16.16 texel row at `top` and per-row step.
    pub v_start: i64,
    pub v_step: i64,
    pub shade: u8,
    pub opacity: Opacity,
}

/// Object column not yet placed between walls.
#[derive(Clone, Copy, Debug)]
pub struct PendingObject {
    pub run: u32,
    pub next: u32,
}

/// Object column clipped to the band open when it was placed.
#[derive(Clone, Copy, Debug)]
pub struct ObjectSlice {
    pub run: u32,
    pub top: i32,
    pub bottom: i32,
    pub next: u32,
}

/// What one frame did; returned by `Engine::render_frame`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub subsectors_visited: usize,
    pub segments_projected: usize,
    pub wall_slices: usize,
    pub floor_spans: usize,
    pub objects_visible: usize,
    pub dropped_wall_slices: usize,
    pub dropped_floor_runs: usize,
    pub dropped_objects: usize,
    pub dropped_object_slices: usize,
    /// Camera was outside the map; the viewport holds the fallback colour.
    pub fallback: bool,
}

impl FrameStats {
    pub fn overflowed(&self) -> bool {
        self.dropped_wall_slices
            + self.dropped_floor_runs
            + self.dropped_objects
            + self.dropped_object_slices
            > 0
    }
}

/*--------------------------- frame context ----------------------------*/

pub struct FrameContext {
    width: usize,
    height: usize,

    /// Columns nothing more may be drawn into.
    pub occluded: Vec<bool>,
    pub occluded_count: usize,
    /// Open band `[min_y, max_y)` per column.
    pub min_y: Vec<i32>,
    pub max_y: Vec<i32>,

    pub wall_slices: Arena<WallSlice>,
    /// Far-first queued wall slices per column.
    pub wall_heads: Vec<u32>,

    pub floor_runs: Arena<FloorRun>,
    /// Top-to-bottom sorted bands per column.
    pub floor_heads: Vec<u32>,
    pub spans: Vec<FloorSpan>,
    pub(crate) span_starts: Vec<i32>,

    /// Sorted near-first once projection finishes.
    pub objects: Arena<ObjectRun>,
    pub pending: Arena<PendingObject>,
    /// Near-first not-yet-placed objects per column.
    pub pending_heads: Vec<u32>,
    pub object_slices: Arena<ObjectSlice>,
    /// Far-first placed object columns per column.
    pub object_heads: Vec<u32>,

    /// BSP visit order of this frame.
    pub visited: Vec<SubSectorId>,
    /// Segments handed to wall projection, in order.
    pub projected: Vec<SegmentId>,

    pub stats: FrameStats,
}

impl FrameContext {
    pub fn new(config: &RenderConfig) -> Self {
        let limits = config.limits;
        let mut frame = Self {
            width: 0,
            height: 0,
            occluded: Vec::new(),
            occluded_count: 0,
            min_y: Vec::new(),
            max_y: Vec::new(),
            wall_slices: Arena::with_limit(limits.wall_slices),
            wall_heads: Vec::new(),
            floor_runs: Arena::with_limit(limits.floor_runs),
            floor_heads: Vec::new(),
            spans: Vec::new(),
            span_starts: Vec::new(),
            objects: Arena::with_limit(limits.objects),
            pending: Arena::with_limit(limits.object_slices),
            pending_heads: Vec::new(),
            object_slices: Arena::with_limit(limits.object_slices),
            object_heads: Vec::new(),
            visited: Vec::new(),
            projected: Vec::new(),
            stats: FrameStats::default(),
        };
        frame.reset(config);
        frame
    }

    /// Zero every table for a new frame. Columns outside the view bounds
    /// start occluded.
    pub fn reset(&mut self, config: &RenderConfig) {
        let (w, h) = (config.width, config.height);
        self.width = w;
        self.height = h;

        self.occluded.clear();
        self.occluded
            .extend((0..w).map(|x| x < config.clip_left || x >= config.clip_right));
        self.occluded_count = self.occluded.iter().filter(|&&o| o).count();
        reset_column(&mut self.min_y, w, 0);
        reset_column(&mut self.max_y, w, h as i32);

        let limits = config.limits;
        self.wall_slices.clear();
        self.wall_slices.set_limit(limits.wall_slices);
        self.floor_runs.clear();
        self.floor_runs.set_limit(limits.floor_runs);
        self.objects.clear();
        self.objects.set_limit(limits.objects);
        self.pending.clear();
        self.pending.set_limit(limits.object_slices);
        self.object_slices.clear();
        self.object_slices.set_limit(limits.object_slices);

        reset_column(&mut self.wall_heads, w, NIL);
        reset_column(&mut self.floor_heads, w, NIL);
        reset_column(&mut self.pending_heads, w, NIL);
        reset_column(&mut self.object_heads, w, NIL);
        reset_column(&mut self.span_starts, h, 0);
        self.spans.clear();

        self.visited.clear();
        self.projected.clear();
        self.stats = FrameStats::default();
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Every column is occluded; nothing further can be drawn.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.occluded_count >= self.width
    }

    pub fn occlude(&mut self, x: usize) {
        if !self.occluded[x] {
            self.occluded[x] = true;
            self.occluded_count += 1;
        }
    }

    /// Any column in `[x_start, x_end)` still open.
    pub fn any_open(&self, x_start: i32, x_end: i32) -> bool {
        let (a, b) = (x_start.max(0) as usize, (x_end.max(0) as usize).min(self.width));
        a < b && self.occluded[a..b].iter().any(|&o| !o)
    }

    /// Shrink the open band of column `x` to `[top, bottom)`; a band that
    /// closes occludes the column.
    pub fn narrow(&mut self, x: usize, top: i32, bottom: i32) {
        let min = self.min_y[x].max(top);
        let max = self.max_y[x].min(bottom).max(min);
        self.min_y[x] = min;
        self.max_y[x] = max;
        debug_assert!(min <= max && max <= self.height as i32);
        if min >= max {
            self.occlude(x);
        }
    }

    /// Queue a wall slice at the head of column `x` (walls arrive
    /// near-to-far, so the head is the farthest).
    pub fn queue_wall_slice(&mut self, x: usize, mut slice: WallSlice) {
        slice.next = self.wall_heads[x];
        if let Some(i) = self.wall_slices.push(slice) {
            self.wall_heads[x] = i;
            self.stats.wall_slices += 1;
        }
    }

    /// Insert a floor/ceiling band into column `x`, keeping the list
    /// sorted by `top`. Empty bands are skipped.
    pub fn record_floor_run(
        &mut self,
        x: usize,
        top: i32,
        bottom: i32,
        sector: SectorId,
        plane: Plane,
    ) {
        if top >= bottom {
            return;
        }
        let mut prev = NIL;
        let mut cur = self.floor_heads[x];
        while let Some(run) = self.floor_runs.get(cur) {
            if run.top > top {
                break;
            }
            prev = cur;
            cur = run.next;
        }
        let run = FloorRun {
            top,
            bottom,
            sector,
            plane,
            next: cur,
        };
        let Some(i) = self.floor_runs.push(run) else {
            return;
        };
        match self.floor_runs.get_mut(prev) {
            Some(p) => p.next = i,
            None => self.floor_heads[x] = i,
        }
    }

    /// Move pending objects of column `x` nearer than `depth` (all of them
    /// for `None`) into the placed list, clipped to the current band.
    pub fn splice_objects(&mut self, x: usize, depth: Option<i64>) {
        loop {
            let head = self.pending_heads[x];
            let Some(&pending) = self.pending.get(head) else {
                break;
            };
            let run = &self.objects[pending.run];
            if depth.is_some_and(|d| run.depth >= d) {
                break;
            }
            self.pending_heads[x] = pending.next;

            let top = run.top.max(self.min_y[x]);
            let bottom = run.bottom.min(self.max_y[x]);
            if top >= bottom {
                continue;
            }
            let slice = ObjectSlice {
                run: pending.run,
                top,
                bottom,
                next: self.object_heads[x],
            };
            if let Some(i) = self.object_slices.push(slice) {
                self.object_heads[x] = i;
            }
        }
    }

    /// Copy arena overflow counts into the stats.
    pub(crate) fn collect_drops(&mut self) {
        self.stats.dropped_wall_slices = self.wall_slices.dropped();
        self.stats.dropped_floor_runs = self.floor_runs.dropped();
        self.stats.dropped_objects = self.objects.dropped();
        self.stats.dropped_object_slices = self.object_slices.dropped() + self.pending.dropped();
    }
}

fn reset_column<T: Copy>(v: &mut Vec<T>, len: usize, value: T) {
    v.clear();
    v.resize(len, value);
}
