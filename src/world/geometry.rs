use bitflags::bitflags;
use glam::IVec2;

use crate::{
    math::{Angle, Fixed},
    world::{
        lights::LightAnimation,
        reject::RejectTable,
        texture::{NO_TEXTURE, TextureId},
    },
};

pub type VertexId = u16;
pub type LineId = u16;
pub type SideId = u16;
pub type SectorId = u16;
pub type SegmentId = u16;
pub type SubSectorId = u16;
pub type NodeId = u16;

/// Runtime snapshot of one map.
///
/// Geometry and the BSP are immutable after load; only `Sector::light`
/// changes between frames (see `Level::animate_lights`).
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub lines: Vec<Line>,
    pub sides: Vec<Side>,
    pub sectors: Vec<Sector>,
    pub segs: Vec<Segment>,
    pub subsectors: Vec<SubSector>,
    pub nodes: Vec<Node>,
    pub reject: RejectTable,
}

/*----------------------- simple primitives --------------------------*/

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vertex {
    pub pos: IVec2, // map units
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aabb {
    pub min: IVec2,
    pub max: IVec2,
}

impl Aabb {
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    /// Smallest box holding every point of `points`.
    pub fn around(points: impl IntoIterator<Item = IVec2>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        Some(it.fold(Self::new(first, first), |b, p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    /// Inclusive test against a 16.16 point.
    pub fn contains(&self, x: Fixed, y: Fixed) -> bool {
        let (x, y) = (x >> 16, y >> 16);
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }

    /// Corners in counter-clockwise order starting at `min`.
    pub fn corners(&self) -> [IVec2; 4] {
        [
            self.min,
            IVec2::new(self.max.x, self.min.y),
            self.max,
            IVec2::new(self.min.x, self.max.y),
        ]
    }
}

/*----------------------------- lines --------------------------------*/

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LineFlags: u16 {
        const IMPASSABLE      = 0x0001;
        const BLOCK_MONSTERS  = 0x0002;
        const TWO_SIDED       = 0x0004;
        const UPPER_UNPEGGED  = 0x0008;
        const LOWER_UNPEGGED  = 0x0010;
        const TRANSLUCENT     = 0x0020;
    }
}

#[derive(Clone, Debug)]
pub struct Line {
    pub from: VertexId,
    pub to: VertexId,
    pub flags: LineFlags,
    /// `[front, back]`; the front side lies on the right of `from → to`.
    pub sides: [Option<SideId>; 2],
}

impl Line {
    #[inline]
    pub fn is_two_sided(&self) -> bool {
        self.flags.contains(LineFlags::TWO_SIDED) && self.sides[1].is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Side {
    pub x_offset: Fixed,
    pub y_offset: Fixed,
    pub upper: TextureId,
    pub lower: TextureId,
    pub main: TextureId,
    pub sector: SectorId,
}

impl Side {
    pub fn new(sector: SectorId, main: TextureId) -> Self {
        Self {
            x_offset: 0,
            y_offset: 0,
            upper: NO_TEXTURE,
            lower: NO_TEXTURE,
            main,
            sector,
        }
    }
}

/*---------------------------- sectors -------------------------------*/

bitflags! {
    /// Markers consumed by game logic; the renderer only carries them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SectorTriggers: u16 {
        const ON_ENTER     = 0x0001;
        const ON_LEAVE     = 0x0002;
        const TRANSPARENT  = 0x0004;
    }
}

#[derive(Clone, Debug)]
pub struct Sector {
    pub floor: Fixed,
    pub ceiling: Fixed,
    pub floor_tex: TextureId,
    pub ceiling_tex: TextureId,
    /// 0..=255; shade tables use `light >> 2`.
    pub light: u8,
    pub light_anim: LightAnimation,
    /// Texture scroll applied to the floor plane, map units.
    pub floor_offset: IVec2,
    pub triggers: SectorTriggers,
}

/*------------------------------ BSP ---------------------------------*/

/// A piece of a line bounding one subsector.
#[derive(Clone, Debug)]
pub struct Segment {
    pub from: VertexId,
    pub to: VertexId,
    pub line: LineId,
    /// 0 = front side of the line, 1 = back side.
    pub side: u8,
    pub angle: Angle,
    /// Distance from the line's start to `from`, 16.16.
    pub offset: Fixed,
    pub length: Fixed,
}

#[derive(Clone, Debug)]
pub struct SubSector {
    pub first_seg: SegmentId,
    pub seg_count: u16,
    pub sector: SectorId,
}

impl SubSector {
    pub fn segs(&self) -> std::ops::Range<usize> {
        let first = self.first_seg as usize;
        first..first + self.seg_count as usize
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    /// Partition line start, map units.
    pub pos: IVec2,
    pub delta: IVec2,
    /// `[right, left]` bounding boxes.
    pub bbox: [Aabb; 2],
    /// `[right, left]`; bit 15 marks a subsector.
    pub children: [u16; 2],
}

/*----------------------------- errors -------------------------------*/

/// Structural problems found by [`Level::validate`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level has no subsectors")]
    Empty,

    #[error("line {line} references missing vertex {vertex}")]
    BadVertex { line: LineId, vertex: VertexId },

    #[error("line {line} has no front side")]
    MissingFront { line: LineId },

    #[error("line {line} references missing side {side}")]
    BadSide { line: LineId, side: SideId },

    #[error("side {side} references missing sector {sector}")]
    BadSector { side: SideId, sector: SectorId },

    #[error("segment {seg} references missing vertex {vertex}")]
    BadSegVertex { seg: SegmentId, vertex: VertexId },

    #[error("segment {seg} references missing line {line}")]
    BadLine { seg: SegmentId, line: LineId },

    #[error("segment {seg} uses side {side} which line {line} does not have")]
    BadSegSide { seg: SegmentId, line: LineId, side: u8 },

    #[error("subsector {subsector} segment range is out of bounds")]
    BadSegRange { subsector: SubSectorId },

    #[error("subsector {subsector} references missing sector {sector}")]
    BadSubSectorSector { subsector: SubSectorId, sector: SectorId },

    #[error("node {node} references missing child {child:#06x}")]
    BadChild { node: NodeId, child: u16 },

    #[error("node {node} child {child} does not precede it; BSP must be acyclic")]
    NotAcyclic { node: NodeId, child: u16 },

    #[error("reject table covers {actual} sectors, level has {expected}")]
    RejectSize { expected: usize, actual: usize },
}

impl Level {
    /// Check every cross-reference the renderer indexes without bounds checks.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.subsectors.is_empty() {
            return Err(LevelError::Empty);
        }

        for (i, line) in self.lines.iter().enumerate() {
            let line_id = i as LineId;
            for v in [line.from, line.to] {
                if v as usize >= self.vertices.len() {
                    return Err(LevelError::BadVertex {
                        line: line_id,
                        vertex: v,
                    });
                }
            }
            if line.sides[0].is_none() {
                return Err(LevelError::MissingFront { line: line_id });
            }
            for side in line.sides.iter().flatten() {
                if *side as usize >= self.sides.len() {
                    return Err(LevelError::BadSide {
                        line: line_id,
                        side: *side,
                    });
                }
            }
        }

        for (i, side) in self.sides.iter().enumerate() {
            if side.sector as usize >= self.sectors.len() {
                return Err(LevelError::BadSector {
                    side: i as SideId,
                    sector: side.sector,
                });
            }
        }

        for (i, seg) in self.segs.iter().enumerate() {
            let seg_id = i as SegmentId;
            for v in [seg.from, seg.to] {
                if v as usize >= self.vertices.len() {
                    return Err(LevelError::BadSegVertex {
                        seg: seg_id,
                        vertex: v,
                    });
                }
            }
            let Some(line) = self.lines.get(seg.line as usize) else {
                return Err(LevelError::BadLine {
                    seg: seg_id,
                    line: seg.line,
                });
            };
            if seg.side > 1 || line.sides[seg.side as usize].is_none() {
                return Err(LevelError::BadSegSide {
                    seg: seg_id,
                    line: seg.line,
                    side: seg.side,
                });
            }
        }

        for (i, ss) in self.subsectors.iter().enumerate() {
            let id = i as SubSectorId;
            if ss.seg_count == 0 || ss.segs().end > self.segs.len() {
                return Err(LevelError::BadSegRange { subsector: id });
            }
            if ss.sector as usize >= self.sectors.len() {
                return Err(LevelError::BadSubSectorSector {
                    subsector: id,
                    sector: ss.sector,
                });
            }
        }

        for (i, node) in self.nodes.iter().enumerate() {
            let node_id = i as NodeId;
            for &child in &node.children {
                let index = (child & crate::world::bsp::CHILD_MASK) as usize;
                if child & crate::world::bsp::LEAF_BIT != 0 {
                    if index >= self.subsectors.len() {
                        return Err(LevelError::BadChild {
                            node: node_id,
                            child,
                        });
                    }
                } else if index >= self.nodes.len() {
                    return Err(LevelError::BadChild {
                        node: node_id,
                        child,
                    });
                } else if index >= i {
                    return Err(LevelError::NotAcyclic {
                        node: node_id,
                        child,
                    });
                }
            }
        }

        if self.reject.sector_count() != self.sectors.len() {
            return Err(LevelError::RejectSize {
                expected: self.sectors.len(),
                actual: self.reject.sector_count(),
            });
        }

        Ok(())
    }

    /// Sector on the side of the line this segment bounds.
    #[inline]
    pub fn seg_sector(&self, seg: &Segment) -> SectorId {
        self.seg_side(seg).sector
    }

    #[inline]
    pub fn seg_side(&self, seg: &Segment) -> &Side {
        let line = &self.lines[seg.line as usize];
        let side = line.sides[seg.side as usize].unwrap_or_default();
        &self.sides[side as usize]
    }

    /// Sector across the segment, if the line is two-sided.
    pub fn seg_back_sector(&self, seg: &Segment) -> Option<SectorId> {
        let line = &self.lines[seg.line as usize];
        if !line.is_two_sided() {
            return None;
        }
        line.sides[(seg.side ^ 1) as usize].map(|s| self.sides[s as usize].sector)
    }

    #[inline]
    pub fn vertex(&self, id: VertexId) -> IVec2 {
        self.vertices[id as usize].pos
    }
}
