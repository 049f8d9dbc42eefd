//! In-memory map assembly for tools, demos and tests.
//!
//! Map loading proper is external; this is the minimal surface needed to
//! produce a valid [`Level`] by hand.

use glam::IVec2;

use crate::{
    math::{point_to_angle, quick_square_root, to_fixed},
    world::{
        bsp::{CHILD_MASK, LEAF_BIT},
        geometry::{
            Aabb, Level, LevelError, Line, LineFlags, LineId, Node, Sector, SectorId,
            SectorTriggers, Segment, Side, SideId, SubSector, SubSectorId, Vertex, VertexId,
        },
        lights::LightAnimation,
        reject::RejectTable,
        texture::{NO_TEXTURE, TextureId},
    },
};

pub struct LevelBuilder {
    level: Level,
    reject: Option<RejectTable>,
}

impl LevelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            level: Level {
                name: name.into(),
                vertices: Vec::new(),
                lines: Vec::new(),
                sides: Vec::new(),
                sectors: Vec::new(),
                segs: Vec::new(),
                subsectors: Vec::new(),
                nodes: Vec::new(),
                reject: RejectTable::all_visible(0),
            },
            reject: None,
        }
    }

    pub fn vertex(&mut self, x: i32, y: i32) -> VertexId {
        self.level.vertices.push(Vertex {
            pos: IVec2::new(x, y),
        });
        (self.level.vertices.len() - 1) as VertexId
    }

    /// Heights in whole map units.
    pub fn sector(&mut self, floor: i32, ceiling: i32, light: u8) -> SectorId {
        self.level.sectors.push(Sector {
            floor: to_fixed(floor),
            ceiling: to_fixed(ceiling),
            floor_tex: NO_TEXTURE,
            ceiling_tex: NO_TEXTURE,
            light,
            light_anim: LightAnimation::default(),
            floor_offset: IVec2::ZERO,
            triggers: SectorTriggers::empty(),
        });
        (self.level.sectors.len() - 1) as SectorId
    }

    pub fn sector_mut(&mut self, id: SectorId) -> &mut Sector {
        &mut self.level.sectors[id as usize]
    }

    pub fn side(&mut self, sector: SectorId, main: TextureId) -> SideId {
        self.level.sides.push(Side::new(sector, main));
        (self.level.sides.len() - 1) as SideId
    }

    pub fn side_mut(&mut self, id: SideId) -> &mut Side {
        &mut self.level.sides[id as usize]
    }

    /// A `back` side makes the line two-sided.
    pub fn line(
        &mut self,
        from: VertexId,
        to: VertexId,
        front: SideId,
        back: Option<SideId>,
    ) -> LineId {
        let flags = if back.is_some() {
            LineFlags::TWO_SIDED
        } else {
            LineFlags::IMPASSABLE
        };
        self.level.lines.push(Line {
            from,
            to,
            flags,
            sides: [Some(front), back],
        });
        (self.level.lines.len() - 1) as LineId
    }

    pub fn line_mut(&mut self, id: LineId) -> &mut Line {
        &mut self.level.lines[id as usize]
    }

    /// Full-length segments for each `(line, side)`, grouped into one
    /// subsector owned by the first segment's sector.
    pub fn subsector(&mut self, segs: &[(LineId, u8)]) -> SubSectorId {
        let first_seg = self.level.segs.len() as u16;
        for &(line_id, side) in segs {
            let line = &self.level.lines[line_id as usize];
            let (from, to) = if side == 0 {
                (line.from, line.to)
            } else {
                (line.to, line.from)
            };
            let d = self.level.vertices[to as usize].pos - self.level.vertices[from as usize].pos;
            let len_sq = (d.x as i64 * d.x as i64 + d.y as i64 * d.y as i64).min(u32::MAX as i64);
            self.level.segs.push(Segment {
                from,
                to,
                line: line_id,
                side,
                angle: point_to_angle(to_fixed(d.x), to_fixed(d.y)),
                offset: 0,
                length: to_fixed(quick_square_root(len_sq as u32) as i32),
            });
        }

        let sector = segs
            .first()
            .and_then(|&(line, side)| self.level.lines[line as usize].sides[side as usize])
            .map(|s| self.level.sides[s as usize].sector)
            .unwrap_or_default();
        self.level.subsectors.push(SubSector {
            first_seg,
            seg_count: segs.len() as u16,
            sector,
        });
        (self.level.subsectors.len() - 1) as SubSectorId
    }

    /// Partition `from → to`; `right`/`left` are child references
    /// (`LEAF_BIT | subsector` or a node id). Returns the new node's id.
    pub fn node(&mut self, from: IVec2, to: IVec2, right: u16, left: u16) -> u16 {
        let bbox = [self.child_bbox(right), self.child_bbox(left)];
        self.level.nodes.push(Node {
            pos: from,
            delta: to - from,
            bbox,
            children: [right, left],
        });
        (self.level.nodes.len() - 1) as u16
    }

    pub fn reject(&mut self, table: RejectTable) {
        self.reject = Some(table);
    }

    /// Assemble and validate.
    pub fn build(self) -> Result<Level, LevelError> {
        let level = self.finish();
        level.validate()?;
        Ok(level)
    }

    /// Assemble without validation; for fixtures that are correct by construction.
    pub fn finish(mut self) -> Level {
        let sectors = self.level.sectors.len();
        self.level.reject = self
            .reject
            .take()
            .unwrap_or_else(|| RejectTable::all_visible(sectors));
        self.level
    }

    fn child_bbox(&self, child: u16) -> Aabb {
        let empty = Aabb::new(IVec2::ZERO, IVec2::ZERO);
        if child & LEAF_BIT != 0 {
            let Some(ss) = self.level.subsectors.get((child & CHILD_MASK) as usize) else {
                return empty;
            };
            let points = self.level.segs[ss.segs()].iter().flat_map(|seg| {
                [
                    self.level.vertices[seg.from as usize].pos,
                    self.level.vertices[seg.to as usize].pos,
                ]
            });
            Aabb::around(points).unwrap_or(empty)
        } else {
            self.level
                .nodes
                .get(child as usize)
                .and_then(|n| Aabb::around(n.bbox.iter().flat_map(|b| [b.min, b.max])))
                .unwrap_or(empty)
        }
    }
}

/*====================================================================*/
/*                              Fixtures                              */
/*====================================================================*/

/// One rectangular sector `[0, width] × [0, depth]`, all walls textured `wall`.
pub fn rectangle_room(
    width: i32,
    depth: i32,
    floor: i32,
    ceiling: i32,
    light: u8,
    wall: TextureId,
) -> Level {
    let mut b = LevelBuilder::new("ROOM");
    let sector = b.sector(floor, ceiling, light);

    // Clockwise, so the interior is on the right of every line.
    let corners = [
        b.vertex(0, 0),
        b.vertex(0, depth),
        b.vertex(width, depth),
        b.vertex(width, 0),
    ];
    let mut segs = Vec::new();
    for i in 0..4 {
        let side = b.side(sector, wall);
        let line = b.line(corners[i], corners[(i + 1) % 4], side, None);
        segs.push((line, 0));
    }
    b.subsector(&segs);
    b.finish()
}

/// Room A `[0,256]²` (floor 0, ceiling 128) and room B `[256,512]×[0,256]`
/// with the given heights, joined by a portal at `x = 256`.
///
/// Subsector 0 is A, subsector 1 is B, and a single node splits them.
pub fn two_rooms(b_floor: i32, b_ceiling: i32, wall: TextureId) -> Level {
    let mut b = LevelBuilder::new("TWO_ROOMS");
    let room_a = b.sector(0, 128, 160);
    let room_b = b.sector(b_floor, b_ceiling, 160);

    let a0 = b.vertex(0, 0);
    let a1 = b.vertex(0, 256);
    let p_top = b.vertex(256, 256);
    let p_bottom = b.vertex(256, 0);
    let b0 = b.vertex(512, 256);
    let b1 = b.vertex(512, 0);

    let solid = |b: &mut LevelBuilder, from: VertexId, to: VertexId, sector: SectorId| {
        let side = b.side(sector, wall);
        b.line(from, to, side, None)
    };
    let a_west = solid(&mut b, a0, a1, room_a);
    let a_north = solid(&mut b, a1, p_top, room_a);
    let a_south = solid(&mut b, p_bottom, a0, room_a);
    let b_north = solid(&mut b, p_top, b0, room_b);
    let b_east = solid(&mut b, b0, b1, room_b);
    let b_south = solid(&mut b, b1, p_bottom, room_b);

    let front = b.side(room_a, NO_TEXTURE);
    let back = b.side(room_b, NO_TEXTURE);
    for side in [front, back] {
        let s = b.side_mut(side);
        s.upper = wall;
        s.lower = wall;
    }
    // Front (room A) is on the right of top → bottom.
    let portal = b.line(p_top, p_bottom, front, Some(back));

    let ss_a = b.subsector(&[(a_west, 0), (a_north, 0), (portal, 0), (a_south, 0)]);
    let ss_b = b.subsector(&[(b_north, 0), (b_east, 0), (b_south, 0), (portal, 1)]);
    b.node(
        IVec2::new(256, 256),
        IVec2::new(256, 0),
        LEAF_BIT | ss_a,
        LEAF_BIT | ss_b,
    );
    b.finish()
}
