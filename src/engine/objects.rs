//! Object (sprite) projection and ordering.
//!
//! Every visible object becomes one [`ObjectRun`]. Runs are sorted
//! near-first and spread into per-column pending lists; the wall walk then
//! places each one into the column band that was open just before the
//! first wall behind it was drawn.

use log::debug;

use crate::{
    engine::{
        engine::FramePass,
        frame::{NIL, ObjectRun, PendingObject},
        shade::{MAX_SHADE, determine_shade},
        view::View,
    },
    math::{ANGLE_45, ANGLE_180, HALF_UNIT, ceil_row, point_to_angle},
    renderer::Opacity,
    world::{BodyPiece, ObjectAttributes, ObjectId, SceneObject},
};

/// Objects closer than this are not drawn, 16.16.
pub const MIN_OBJECT_DEPTH: i64 = 4 << 16;

/// Depth spacing between ranks of a piecewise body.
pub const PIECE_BIAS: i64 = 1 << 10;

/// How much nearer than its parent a plain chained object sorts.
pub const CHAIN_BIAS: i64 = 1 << 8;

/// Longest chain followed from one root.
pub const MAX_CHAIN_DEPTH: usize = 8;

/// Draw rank of each [`BodyPiece`] per view quadrant; higher ranks sort
/// nearer. Quadrants: 0 front, 1 right side visible, 2 back, 3 left side
/// visible.
pub const PIECE_ORDER: [[u8; BodyPiece::COUNT]; 4] = [
    // Legs Chest Head LArm RArm Weapon Shield
    [1, 2, 3, 4, 4, 5, 5],
    [1, 2, 3, 0, 4, 5, 0],
    [2, 3, 4, 1, 1, 0, 0],
    [1, 2, 3, 4, 0, 0, 5],
];

/// Which side of `obj` the camera sees, as a [`PIECE_ORDER`] row.
pub fn view_quadrant(view: &View, obj: &SceneObject) -> usize {
    let to_object = point_to_angle(obj.x.wrapping_sub(view.x), obj.y.wrapping_sub(view.y));
    let towards_camera = to_object.wrapping_add(ANGLE_180);
    (obj.angle.wrapping_sub(towards_camera).wrapping_add(ANGLE_45) >> 14) as usize
}

/// Sort-depth shared by a chain as it is followed.
#[derive(Clone, Copy)]
struct ChainKey {
    root_depth: i64,
    quadrant: Option<usize>,
}

impl ChainKey {
    fn depth(&self, parent_depth: i64, piece: Option<BodyPiece>) -> i64 {
        match (self.quadrant, piece) {
            (Some(q), Some(p)) => self.root_depth - PIECE_ORDER[q][p.index()] as i64 * PIECE_BIAS,
            _ => parent_depth - CHAIN_BIAS,
        }
    }
}

impl FramePass<'_> {
    /// Project, order and spread every visible object.
    pub fn collect_objects(&mut self) {
        let objects = self.objects;
        for (id, obj) in objects.iter() {
            if obj
                .attributes
                .intersects(ObjectAttributes::INVISIBLE | ObjectAttributes::BODY_PART)
            {
                continue;
            }
            if !self.potentially_visible(obj) {
                continue;
            }
            let Some(mut run) = self.project_object(id, obj) else {
                continue;
            };
            let key = ChainKey {
                root_depth: run.view_depth,
                quadrant: obj
                    .attributes
                    .contains(ObjectAttributes::PIECEWISE)
                    .then(|| view_quadrant(self.view, obj)),
            };
            if key.quadrant.is_some() {
                run.depth = key.depth(run.view_depth, obj.piece);
            }
            let depth = run.depth;
            self.frame.objects.push(run);
            self.pull_chain(obj.chained, depth, key, 1);
        }

        self.frame
            .objects
            .as_mut_slice()
            .sort_by(|a, b| a.depth.cmp(&b.depth).then(a.type_id.cmp(&b.type_id)));
        self.frame.stats.objects_visible = self.frame.objects.len();

        // Farthest first, pushing to the front, leaves lists near-first.
        for index in (0..self.frame.objects.len() as u32).rev() {
            let (x_start, x_end) = {
                let run = &self.frame.objects[index];
                (run.x_start, run.x_end)
            };
            for x in x_start..x_end {
                let col = x as usize;
                let pending = PendingObject {
                    run: index,
                    next: self.frame.pending_heads[col],
                };
                if let Some(i) = self.frame.pending.push(pending) {
                    self.frame.pending_heads[col] = i;
                }
            }
        }
    }

    /// Chained objects follow their parent regardless of their own flags,
    /// except `INVISIBLE`.
    fn pull_chain(
        &mut self,
        next: Option<ObjectId>,
        parent_depth: i64,
        key: ChainKey,
        hops: usize,
    ) {
        let Some(id) = next else {
            return;
        };
        if hops > MAX_CHAIN_DEPTH {
            debug!("object chain through {id} longer than {MAX_CHAIN_DEPTH}; cut");
            return;
        }
        let objects = self.objects;
        let Some(obj) = objects.get(id) else {
            return;
        };
        let depth = key.depth(parent_depth, obj.piece);
        if !obj.attributes.contains(ObjectAttributes::INVISIBLE) {
            if let Some(mut run) = self.project_object(id, obj) {
                run.depth = depth;
                self.frame.objects.push(run);
            }
        }
        self.pull_chain(obj.chained, depth, key, hops + 1);
    }

    /// Can any sector the object touches be seen from the camera's?
    fn potentially_visible(&self, obj: &SceneObject) -> bool {
        let level = self.level;
        let Some(from) = self.view.sector else {
            return true;
        };
        if obj.sectors.is_empty() {
            return level
                .sector_at(obj.x, obj.y)
                .is_none_or(|to| !level.reject.is_rejected(from, to));
        }
        obj.sectors
            .iter()
            .any(|&to| !level.reject.is_rejected(from, to))
    }

    /// Screen box and texture mapping of one object.
    pub fn project_object(&self, id: ObjectId, obj: &SceneObject) -> Option<ObjectRun> {
        let view = self.view;
        let (depth, lateral) = view.to_view(obj.x, obj.y);
        if depth < MIN_OBJECT_DEPTH {
            return None;
        }
        let pic = self.bank.texture(obj.picture).ok()?;
        if pic.is_sky() {
            return None;
        }

        let half_width = (pic.width as i64) << 15;
        let sx1 = view.screen_x(depth, lateral + half_width);
        let sx2 = view.screen_x(depth, lateral - half_width);
        let x_start = ceil_row(sx1).max(view.clip_left);
        let x_end = ceil_row(sx2).min(view.clip_right);
        if x_start >= x_end {
            return None;
        }

        let home = obj
            .sectors
            .first()
            .copied()
            .or_else(|| self.level.sector_at(obj.x, obj.y))
            .and_then(|s| self.level.sectors.get(s as usize));

        let scale = view.scale(depth);
        let y_top = view.screen_y(obj.z + ((pic.height as i32) << 16), scale);
        let y_base = view.screen_y(obj.z, scale);
        // Sunk into the floor: the floor line hides the rest.
        let y_bottom = match home {
            Some(sector) if obj.z < sector.floor => view.screen_y(sector.floor, scale),
            _ => y_base,
        };
        let top = ceil_row(y_top).max(0);
        let bottom = ceil_row(y_bottom).min(view.height as i32);
        if top >= bottom {
            return None;
        }

        let u_step = view.pixel_step(depth);
        let u_start = ((((x_start as i64) << 16) + HALF_UNIT as i64 - sx1) * u_step) >> 16;
        let v_step = ((pic.height as i64) << 32) / (y_base - y_top).max(1);
        let v_start = ((((top as i64) << 16) + HALF_UNIT as i64 - y_top) * v_step) >> 16;

        let shade = if obj.attributes.contains(ObjectAttributes::NO_SHADING) {
            MAX_SHADE
        } else {
            let light = home.map_or(255, |s| s.light);
            determine_shade((depth >> 16) as i32, light, &self.shade)
        };
        let opacity = if obj.attributes.contains(ObjectAttributes::TRANSLUCENT) {
            Opacity::Translucent
        } else {
            Opacity::Transparent
        };

        Some(ObjectRun {
            object: id,
            type_id: obj.type_id,
            depth,
            view_depth: depth,
            x_start,
            x_end,
            top,
            bottom,
            picture: obj.picture,
            colorize: obj.colorize,
            u_start,
            u_step,
            v_start,
            v_step,
            shade,
            opacity,
        })
    }

    /// Columns never reached by a wall get their remaining objects with
    /// the final open band.
    pub fn place_remaining_objects(&mut self) {
        for x in 0..self.frame.width() {
            if self.frame.occluded[x] || self.frame.pending_heads[x] == NIL {
                continue;
            }
            self.frame.splice_objects(x, None);
        }
    }
}
