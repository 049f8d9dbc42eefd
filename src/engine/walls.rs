//! Wall projection and per-column decomposition.
//!
//! A camera-facing segment is clipped against the near plane, projected
//! to a screen column range and walked column by column. Each column
//! yields ceiling/floor bands, opaque wall strips drawn on the spot, and
//! queued transparent strips for the merge pass.

use crate::{
    engine::{
        engine::FramePass,
        frame::{FrameContext, NIL, Plane, WallSlice},
        shade::determine_shade,
        view::View,
    },
    math::{Fixed, HALF_UNIT, ceil_row},
    renderer::{
        Blend, Opacity,
        software::columns::{ColumnSource, draw_column},
    },
    world::{Level, LineFlags, NO_TEXTURE, Segment, Texture, TextureBank, TextureId},
};

/// Depth of the near clipping plane, 16.16.
pub const NEAR_CLIP: i64 = 1 << 16;

/// Fixed `1.0` for the reciprocal-depth interpolation.
const INV_ONE: i64 = 1 << 40;

/// Perspective-correct stepping across a wall: `1/depth` and `u/depth`
/// are linear in screen x.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallMatrix {
    pub inv_z: i64,
    pub inv_z_step: i64,
    pub u_over_z: i64,
    pub u_over_z_step: i64,
}

impl WallMatrix {
    /// `(depth, u)` at the `i`-th column from the first, both 16.16.
    #[inline]
    pub fn column(&self, i: i32) -> (i64, i64) {
        let inv_z = (self.inv_z + self.inv_z_step * i as i64).max(1);
        let u_over_z = self.u_over_z + self.u_over_z_step * i as i64;
        (INV_ONE / inv_z, u_over_z / inv_z)
    }
}

/// A projected segment.
#[derive(Clone, Copy, Debug)]
pub struct WallProjection {
    /// Columns `[x_start, x_end)`, inside the view bounds.
    pub x_start: i32,
    pub x_end: i32,
    /// Unclipped 16.16 screen x of both (near-clipped) endpoints.
    pub sx1: i64,
    pub sx2: i64,
    pub matrix: WallMatrix,
}

/// Start value at `offset` into a run `span` long and the step per
/// whole pixel, for a quantity going from `a` to `b`.
fn interpolate(a: i64, b: i64, offset: i64, span: i64) -> (i64, i64) {
    let diff = (b - a) as i128;
    let span = span.max(1) as i128;
    let clamp = |v: i128| v.clamp(i64::MIN as i128 >> 1, i64::MAX as i128 >> 1) as i64;
    (
        clamp(a as i128 + diff * offset as i128 / span),
        clamp(diff * (1 << 16) / span),
    )
}

/// Clip `seg` to the near plane and project it; `None` when nothing of it
/// can reach an open column.
pub fn project_segment(
    view: &View,
    level: &Level,
    seg: &Segment,
    frame: &FrameContext,
) -> Option<WallProjection> {
    let (mut d1, mut l1) = view.vertex_to_view(level.vertex(seg.from));
    let (mut d2, mut l2) = view.vertex_to_view(level.vertex(seg.to));
    let side = level.seg_side(seg);
    let mut u1 = seg.offset as i64 + side.x_offset as i64;
    let mut u2 = u1 + seg.length as i64;

    if d1 < NEAR_CLIP && d2 < NEAR_CLIP {
        return None;
    }
    if (l1 > d1 && l2 > d2) || (-l1 > d1 && -l2 > d2) {
        return None;
    }

    let cut = |d_near: i64, d_far: i64, near: i64, far: i64| {
        let t_num = (NEAR_CLIP - d_near) as i128;
        let t_den = (d_far - d_near) as i128;
        near + ((far - near) as i128 * t_num / t_den) as i64
    };
    if d1 < NEAR_CLIP {
        l1 = cut(d1, d2, l1, l2);
        u1 = cut(d1, d2, u1, u2);
        d1 = NEAR_CLIP;
    } else if d2 < NEAR_CLIP {
        l2 = cut(d2, d1, l2, l1);
        u2 = cut(d2, d1, u2, u1);
        d2 = NEAR_CLIP;
    }

    let sx1 = view.screen_x(d1, l1);
    let sx2 = view.screen_x(d2, l2);
    if sx2 <= sx1 {
        return None;
    }
    let x_start = ceil_row(sx1).max(view.clip_left);
    let x_end = ceil_row(sx2).min(view.clip_right);
    if x_start >= x_end || !frame.any_open(x_start, x_end) {
        return None;
    }

    let (inv1, inv2) = (INV_ONE / d1, INV_ONE / d2);
    let span = sx2 - sx1;
    let offset = ((x_start as i64) << 16) + HALF_UNIT as i64 - sx1;
    let (inv_z, inv_z_step) = interpolate(inv1, inv2, offset, span);
    let (u_over_z, u_over_z_step) = interpolate(u1 * inv1, u2 * inv2, offset, span);

    Some(WallProjection {
        x_start,
        x_end,
        sx1,
        sx2,
        matrix: WallMatrix {
            inv_z,
            inv_z_step,
            u_over_z,
            u_over_z_step,
        },
    })
}

/// One textured section of a wall: its texture and the world height its
/// first texel row is pinned to.
struct Section<'a> {
    id: TextureId,
    tex: &'a Texture,
    anchor: Fixed,
}

impl<'a> Section<'a> {
    fn new(bank: &'a TextureBank, id: TextureId, anchor: impl FnOnce(&Texture) -> Fixed) -> Self {
        let tex = bank.texture_or_missing(id);
        Self {
            id,
            tex,
            anchor: anchor(tex),
        }
    }
}

impl FramePass<'_> {
    /// Walk the columns of a projected segment.
    pub fn render_segment(&mut self, seg: &Segment, proj: &WallProjection) {
        let level = self.level;
        let view = self.view;
        let bank = self.bank;
        let line = &level.lines[seg.line as usize];
        let side = level.seg_side(seg);
        let front_id = side.sector;
        let front = &level.sectors[front_id as usize];
        let back = level
            .seg_back_sector(seg)
            .map(|id| &level.sectors[id as usize]);

        let is_sky = |id: TextureId| id != NO_TEXTURE && bank.texture_or_missing(id).is_sky();
        let both_sky = back.is_some_and(|b| is_sky(front.ceiling_tex) && is_sky(b.ceiling_tex));
        let front_ceiling = match back {
            Some(b) if both_sky => b.ceiling,
            _ => front.ceiling,
        };
        let height = |tex: &Texture| (tex.height as Fixed) << 16;
        let lower_unpegged = line.flags.contains(LineFlags::LOWER_UNPEGGED);

        let main = match back {
            None => Some(Section::new(bank, side.main, |t| {
                if lower_unpegged {
                    front.floor + height(t)
                } else {
                    front.ceiling
                }
            })),
            Some(b) => (side.main != NO_TEXTURE).then(|| {
                Section::new(bank, side.main, |t| {
                    if lower_unpegged {
                        front.floor.max(b.floor) + height(t)
                    } else {
                        front.ceiling.min(b.ceiling)
                    }
                })
            }),
        };
        let upper = back.filter(|_| side.upper != NO_TEXTURE).map(|b| {
            Section::new(bank, side.upper, |t| {
                if line.flags.contains(LineFlags::UPPER_UNPEGGED) {
                    front.ceiling
                } else {
                    b.ceiling + height(t)
                }
            })
        });
        let lower = back.filter(|_| side.lower != NO_TEXTURE).map(|b| {
            Section::new(bank, side.lower, |_| {
                if lower_unpegged { front.ceiling } else { b.floor }
            })
        });
        let see_through = if line.flags.contains(LineFlags::TRANSLUCENT) {
            Opacity::Translucent
        } else {
            Opacity::Transparent
        };

        for x in proj.x_start..proj.x_end {
            let col = x as usize;
            if self.frame.occluded[col] {
                continue;
            }
            let (depth, u) = proj.matrix.column(x - proj.x_start);
            self.frame.splice_objects(col, Some(depth));

            let scale = view.scale(depth);
            let step = view.pixel_step(depth);
            let shade = determine_shade((depth >> 16) as i32, front.light, &self.shade);
            let (min_y, max_y) = (self.frame.min_y[col], self.frame.max_y[col]);
            let row_of = |z: Fixed| ceil_row(view.screen_y(z, scale));
            let ct = row_of(front_ceiling).clamp(min_y, max_y);
            let fb = row_of(front.floor).clamp(ct, max_y);
            let u_col = (u >> 16) as usize;

            if front_ceiling > view.eye_z {
                self.frame
                    .record_floor_run(col, min_y, ct, front_id, Plane::Ceiling);
            }
            if front.floor < view.eye_z {
                self.frame
                    .record_floor_run(col, fb, max_y, front_id, Plane::Floor);
            }

            let Some(back) = back else {
                if let Some(main) = &main {
                    self.draw_wall(col, ct..fb, main, side.y_offset, u_col, step, shade);
                }
                self.frame.occlude(col);
                continue;
            };

            let mut top = ct;
            if !both_sky && back.ceiling < front.ceiling {
                let bt = row_of(back.ceiling).clamp(ct, fb);
                if let Some(upper) = &upper {
                    self.draw_wall(col, ct..bt, upper, side.y_offset, u_col, step, shade);
                    top = bt;
                }
            }
            let mut bottom = fb;
            if back.floor > front.floor {
                let bb = row_of(back.floor).clamp(top, fb);
                if let Some(lower) = &lower {
                    self.draw_wall(col, bb..fb, lower, side.y_offset, u_col, step, shade);
                    bottom = bb;
                }
            }
            self.frame.narrow(col, top, bottom);

            if let Some(main) = &main {
                let world_top = front_ceiling.min(back.ceiling);
                let world_bottom = front.floor.max(back.floor);
                let mt = row_of(world_top).clamp(ct, fb);
                let mb = row_of(world_bottom).clamp(mt, fb);
                if mt < mb {
                    let slice = WallSlice {
                        top: mt,
                        bottom: mb,
                        depth,
                        texture: main.id,
                        column: u_col,
                        v_offset: v_offset(view, main.anchor + side.y_offset, mt, step),
                        v_step: step,
                        shade,
                        opacity: see_through,
                        next: NIL,
                    };
                    self.frame.queue_wall_slice(col, slice);
                }
            }
        }
    }

    /// Opaque strip, drawn immediately.
    #[allow(clippy::too_many_arguments)]
    fn draw_wall(
        &mut self,
        x: usize,
        rows: std::ops::Range<i32>,
        section: &Section,
        y_offset: Fixed,
        u: usize,
        step: i64,
        shade: u8,
    ) {
        if rows.is_empty() {
            return;
        }
        let src = ColumnSource {
            texels: section.tex.column(u),
            mask: section.tex.height_mask(),
            offset: v_offset(self.view, section.anchor + y_offset, rows.start, step),
            step,
        };
        draw_column(
            self.surface,
            x,
            rows,
            &src,
            self.bank.shade_row(shade),
            None,
            Blend::Overwrite,
        );
    }
}

/// 16.16 texel row at the centre of screen row `row`, counting down from
/// the world height `anchor`.
#[inline]
pub fn v_offset(view: &View, anchor: Fixed, row: i32, step: i64) -> i64 {
    let from_eye = anchor as i64 - view.eye_z as i64;
    from_eye + (((2 * row as i64 + 1 - 2 * view.half_h as i64) * step) >> 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::config::RenderConfig,
        math::{FRACUNIT, to_fixed},
        world::{Camera, builder::rectangle_room},
    };

    fn setup(x: i32, y: i32, angle: u16) -> (Level, View, FrameContext) {
        let level = rectangle_room(512, 256, 0, 128, 160, 0);
        let cfg = RenderConfig::new(320, 200);
        let cam = Camera::new(to_fixed(x), to_fixed(y), to_fixed(41), angle);
        let view = View::new(&cam, &level, &cfg);
        (level, view, FrameContext::new(&cfg))
    }

    #[test]
    fn facing_wall_is_symmetric() {
        let (level, view, frame) = setup(128, 128, 0);
        let p = project_segment(&view, &level, &level.segs[2], &frame).unwrap();
        assert_eq!((p.x_start, p.x_end), (107, 213));

        // Texture u runs 0..256 across the wall; the centre column sits
        // near the middle.
        let (depth, u) = p.matrix.column(160 - p.x_start);
        assert!((depth - to_fixed(384) as i64).abs() < FRACUNIT as i64);
        assert!(((u >> 16) - 128).abs() <= 2);
    }

    #[test]
    fn wall_behind_camera_is_rejected() {
        let (level, view, frame) = setup(128, 128, 0);
        // The west wall lies behind a camera looking east.
        assert!(project_segment(&view, &level, &level.segs[0], &frame).is_none());
    }

    #[test]
    fn near_clipped_ranges_stay_on_screen() {
        for step in 0..64u16 {
            let angle = step.wrapping_mul(1024);
            let (level, view, frame) = setup(64, 40, angle);
            for seg in &level.segs {
                if !level.seg_faces(seg, view.x, view.y) {
                    continue;
                }
                if let Some(p) = project_segment(&view, &level, seg, &frame) {
                    assert!(p.sx1 < p.sx2);
                    assert!(0 <= p.x_start && p.x_start < p.x_end && p.x_end <= 320);
                    for i in 0..p.x_end - p.x_start {
                        let (depth, _) = p.matrix.column(i);
                        assert!(depth >= NEAR_CLIP - 2, "angle {angle:#x} depth {depth}");
                    }
                }
            }
        }
    }

    #[test]
    fn depth_grows_monotonically_along_an_oblique_wall() {
        let (level, view, frame) = setup(100, 128, 0x1000);
        // North wall, seen at an angle: farther towards the east.
        let p = project_segment(&view, &level, &level.segs[1], &frame).unwrap();
        let depths: Vec<i64> = (0..p.x_end - p.x_start)
            .map(|i| p.matrix.column(i).0)
            .collect();
        assert!(depths.windows(2).all(|w| w[0] <= w[1] + 2));
    }

    #[test]
    fn texture_rows_anchor_at_the_ceiling() {
        let (_, view, _) = setup(128, 128, 0);
        // Eye at 41; the row whose centre is exactly the anchor maps to 0.
        let step = FRACUNIT as i64;
        let anchor = view.eye_z + to_fixed(10);
        // Row centre at half_h - 10 + 0.5 → texel 0.5.
        let v = v_offset(&view, anchor, view.half_h - 10, step);
        assert_eq!(v, (HALF_UNIT) as i64);
    }
}
