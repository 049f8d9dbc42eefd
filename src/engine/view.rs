use glam::IVec2;

use crate::{
    engine::config::RenderConfig,
    math::{Angle, Fixed, cosine, sine},
    world::{Camera, Level, SectorId, SubSectorId, bsp::side_value},
};

/// Per-frame camera state in the units the projection works in.
///
/// View space: `depth` runs along the view direction, `lateral` is
/// positive to the **left**; both 16.16. The horizontal field of view is
/// 90°, so the focal length equals half the viewport width.
#[derive(Clone, Debug)]
pub struct View {
    pub x: Fixed,
    pub y: Fixed,
    pub eye_z: Fixed,
    pub angle: Angle,
    pub cos: Fixed,
    pub sin: Fixed,
    pub width: usize,
    pub height: usize,
    pub half_w: i32,
    pub half_h: i32,
    pub focal: i32,
    pub clip_left: i32,
    pub clip_right: i32,
    pub subsector: Option<SubSectorId>,
    pub sector: Option<SectorId>,
}

impl View {
    pub fn new(camera: &Camera, level: &Level, config: &RenderConfig) -> Self {
        let subsector = level.locate_subsector(camera.x, camera.y);
        let sector = subsector.map(|ss| level.subsectors[ss as usize].sector);
        let floor = sector.map_or(0, |s| level.sectors[s as usize].floor);
        let half_w = (config.width / 2) as i32;

        Self {
            x: camera.x,
            y: camera.y,
            eye_z: floor + camera.height,
            angle: camera.angle,
            cos: cosine(camera.angle),
            sin: sine(camera.angle),
            width: config.width,
            height: config.height,
            half_w,
            half_h: (config.height / 2) as i32,
            focal: half_w.max(1),
            clip_left: config.clip_left as i32,
            clip_right: config.clip_right as i32,
            subsector,
            sector,
        }
    }

    /// `(depth, lateral)` of a 16.16 world point.
    #[inline]
    pub fn to_view(&self, x: Fixed, y: Fixed) -> (i64, i64) {
        let dx = x as i64 - self.x as i64;
        let dy = y as i64 - self.y as i64;
        let (c, s) = (self.cos as i64, self.sin as i64);
        ((dx * c + dy * s) >> 16, (dy * c - dx * s) >> 16)
    }

    #[inline]
    pub fn vertex_to_view(&self, p: IVec2) -> (i64, i64) {
        self.to_view(p.x << 16, p.y << 16)
    }

    /// 16.16 screen column of a view-space point; `depth` must be positive.
    #[inline]
    pub fn screen_x(&self, depth: i64, lateral: i64) -> i64 {
        ((self.half_w as i64) << 16) - ((lateral * self.focal as i64) << 16) / depth.max(1)
    }

    /// Pixels per world unit at `depth`, 16.16.
    #[inline]
    pub fn scale(&self, depth: i64) -> i64 {
        ((self.focal as i64) << 32) / depth.max(1)
    }

    /// 16.16 screen row of world height `z` for a given [`Self::scale`].
    #[inline]
    pub fn screen_y(&self, z: Fixed, scale: i64) -> i64 {
        ((self.half_h as i64) << 16) - (((z as i64 - self.eye_z as i64) * scale) >> 16)
    }

    /// World units (16.16) covered by one pixel at `depth`.
    #[inline]
    pub fn pixel_step(&self, depth: i64) -> i64 {
        depth / self.focal as i64
    }

    /// True when the camera did not resolve to a subsector, or lies strictly
    /// behind one of its bounding segments.
    pub fn is_outside(&self, level: &Level) -> bool {
        let Some(ss) = self.subsector else {
            return true;
        };
        level.segs[level.subsectors[ss as usize].segs()]
            .iter()
            .any(|seg| side_value(level.vertex(seg.from), level.vertex(seg.to), self.x, self.y) < 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math::{ANGLE_90, FRACUNIT, to_fixed},
        world::builder::{rectangle_room, two_rooms},
    };

    fn view_at(x: i32, y: i32, angle: Angle) -> View {
        let level = two_rooms(16, 96, 1);
        let cam = Camera::new(to_fixed(x), to_fixed(y), to_fixed(41), angle);
        View::new(&cam, &level, &RenderConfig::new(320, 200))
    }

    #[test]
    fn eye_height_follows_sector_floor() {
        assert_eq!(view_at(100, 100, 0).eye_z, to_fixed(41));
        assert_eq!(view_at(400, 100, 0).eye_z, to_fixed(57));
        assert_eq!(view_at(400, 100, 0).sector, Some(1));
    }

    #[test]
    fn view_axes() {
        let v = view_at(100, 100, ANGLE_90);
        // Facing +Y: a point ahead has positive depth, one to the west is left.
        let (d, l) = v.to_view(to_fixed(100), to_fixed(150));
        assert!((d - to_fixed(50) as i64).abs() <= 2);
        assert!(l.abs() <= 2);
        let (d, l) = v.to_view(to_fixed(60), to_fixed(100));
        assert!(d.abs() <= 2);
        assert!((l - to_fixed(40) as i64).abs() <= 2);
    }

    #[test]
    fn projection_centre_and_edges() {
        let v = view_at(100, 100, 0);
        let depth = to_fixed(64) as i64;
        assert_eq!(v.screen_x(depth, 0), 160 << 16);
        // 45° left lands on column 0, 45° right on the far edge.
        assert_eq!(v.screen_x(depth, depth), 0);
        assert_eq!(v.screen_x(depth, -depth), 320 << 16);

        let scale = v.scale(depth);
        assert_eq!(v.screen_y(v.eye_z, scale), 100 << 16);
        assert_eq!(v.screen_y(v.eye_z + to_fixed(64), scale), (100 - 160) << 16);
        assert_eq!(v.pixel_step(depth), (64 * FRACUNIT / 160) as i64);
    }

    #[test]
    fn outside_detection() {
        let level = rectangle_room(128, 128, 0, 128, 160, 1);
        let cfg = RenderConfig::new(64, 64);
        let inside = Camera::new(to_fixed(64), to_fixed(64), to_fixed(41), 0);
        let outside = Camera::new(to_fixed(200), to_fixed(64), to_fixed(41), 0);
        assert!(!View::new(&inside, &level, &cfg).is_outside(&level));
        assert!(View::new(&outside, &level, &cfg).is_outside(&level));
    }
}
