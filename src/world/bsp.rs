use std::ops::ControlFlow;

use glam::IVec2;

use crate::{
    math::Fixed,
    world::geometry::{Aabb, Level, Node, SectorId, Segment, SubSectorId},
};

pub const CHILD_MASK: u16 = 0x7FFF;

pub const LEAF_BIT: u16 = 0x8000;

/// Callbacks for [`Level::walk_bsp`].
///
/// Traversal is pure: it never touches frame state itself, so collectors
/// and the renderer share the same ordering.
pub trait BspVisitor {
    /// Return `false` to skip the far child whose bounding box is `bbox`.
    fn visible(&mut self, _bbox: &Aabb) -> bool {
        true
    }

    /// Called near-to-far for every reached subsector.
    fn visit(&mut self, subsector: SubSectorId) -> ControlFlow<()>;
}

// ──────────────────────────────────────────────────────────────────────────
//                       Half-plane tests
// ──────────────────────────────────────────────────────────────────────────

/// `(x1-x2)*(py-y2) - (y1-y2)*(px-x2)` with the line in map units and the
/// point in 16.16. Positive is right of `from → to`.
#[inline]
pub fn side_value(from: IVec2, to: IVec2, x: Fixed, y: Fixed) -> i64 {
    let dx = (from.x - to.x) as i64;
    let dy = (from.y - to.y) as i64;
    let px = x as i64 - ((to.x as i64) << 16);
    let py = y as i64 - ((to.y as i64) << 16);
    dx * py - dy * px
}

/// A point exactly on the line counts as right.
#[inline]
pub fn point_on_right(from: IVec2, to: IVec2, x: Fixed, y: Fixed) -> bool {
    side_value(from, to, x, y) >= 0
}

impl Node {
    #[inline]
    pub fn point_on_right(&self, x: Fixed, y: Fixed) -> bool {
        point_on_right(self.pos, self.pos + self.delta, x, y)
    }

    /// `0` for the right child, `1` for the left.
    #[inline]
    pub fn near_side(&self, x: Fixed, y: Fixed) -> usize {
        if self.point_on_right(x, y) { 0 } else { 1 }
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Level – public helpers
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    /// Root child reference: the last node, or subsector 0 for a nodeless map.
    #[inline(always)]
    pub fn bsp_root(&self) -> u16 {
        if self.nodes.is_empty() {
            LEAF_BIT
        } else {
            (self.nodes.len() - 1) as u16
        }
    }

    /// Walk the BSP and return the subsector containing `(x, y)`.
    pub fn locate_subsector(&self, x: Fixed, y: Fixed) -> Option<SubSectorId> {
        let mut child = self.bsp_root();
        // Children always precede their parent, so the walk terminates.
        loop {
            if child & LEAF_BIT != 0 {
                let ss = child & CHILD_MASK;
                return ((ss as usize) < self.subsectors.len()).then_some(ss);
            }
            let node = self.nodes.get(child as usize)?;
            let next = node.children[node.near_side(x, y)];
            if next & LEAF_BIT == 0 && next >= child {
                return None;
            }
            child = next;
        }
    }

    pub fn sector_at(&self, x: Fixed, y: Fixed) -> Option<SectorId> {
        self.locate_subsector(x, y)
            .map(|ss| self.subsectors[ss as usize].sector)
    }

    /// Strictly-positive side test: the camera sees the segment's face.
    #[inline]
    pub fn seg_faces(&self, seg: &Segment, x: Fixed, y: Fixed) -> bool {
        side_value(self.vertex(seg.from), self.vertex(seg.to), x, y) > 0
    }

    /// Near-to-far traversal from `(x, y)`.
    pub fn walk_bsp<V: BspVisitor>(&self, x: Fixed, y: Fixed, visitor: &mut V) {
        let _ = self.walk_child(self.bsp_root(), x, y, visitor);
    }

    fn walk_child<V: BspVisitor>(
        &self,
        child: u16,
        x: Fixed,
        y: Fixed,
        visitor: &mut V,
    ) -> ControlFlow<()> {
        if child & LEAF_BIT != 0 {
            let ss = child & CHILD_MASK;
            if (ss as usize) < self.subsectors.len() {
                return visitor.visit(ss);
            }
            return ControlFlow::Continue(());
        }

        // Internal node ──────
        let Some(node) = self.nodes.get(child as usize) else {
            return ControlFlow::Continue(());
        };
        let near = node.near_side(x, y);

        // Near side first …
        self.walk_child(node.children[near], x, y, visitor)?;

        // … far side only if its bounding box might be visible.
        if visitor.visible(&node.bbox[near ^ 1]) {
            self.walk_child(node.children[near ^ 1], x, y, visitor)?;
        }
        ControlFlow::Continue(())
    }

    /// Every subsector in near-to-far order, without culling.
    pub fn fill_visible_subsectors(&self, x: Fixed, y: Fixed, out: &mut Vec<SubSectorId>) {
        struct Collect<'a>(&'a mut Vec<SubSectorId>);
        impl BspVisitor for Collect<'_> {
            fn visit(&mut self, subsector: SubSectorId) -> ControlFlow<()> {
                self.0.push(subsector);
                ControlFlow::Continue(())
            }
        }

        out.clear();
        self.walk_bsp(x, y, &mut Collect(out));
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
