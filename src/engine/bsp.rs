//! ----------------------------------------------------------------------------
//! **BSP near-to-far traversal**
//!
//! Responsible for
//! * culling far-side subtrees whose bounding box is outside the view cone or
//!   behind fully occluded columns
//! * reject-culling segments whose sector cannot be seen from the camera's
//!   sector
//! * handing every camera-facing segment to `engine::walls`
//!
//! The walk stops as soon as every column is occluded.
//! ----------------------------------------------------------------------------

use std::ops::ControlFlow;

use crate::{
    engine::{engine::FramePass, walls::NEAR_CLIP, walls::project_segment},
    math::ceil_row,
    world::{Aabb, BspVisitor, SegmentId, SubSectorId},
};

impl BspVisitor for FramePass<'_> {
    fn visible(&mut self, bbox: &Aabb) -> bool {
        self.bbox_visible(bbox)
    }

    fn visit(&mut self, subsector: SubSectorId) -> ControlFlow<()> {
        self.draw_subsector(subsector);
        if self.frame.is_full() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

impl FramePass<'_> {
    /// Could anything inside `bbox` reach an open column?
    pub fn bbox_visible(&self, bbox: &Aabb) -> bool {
        let view = self.view;
        if bbox.contains(view.x, view.y) {
            return true;
        }
        let corners = bbox.corners().map(|c| view.vertex_to_view(c));

        if corners.iter().all(|&(d, _)| d < NEAR_CLIP) {
            return false;
        }
        // Entirely beyond the left or the right cone edge.
        if corners.iter().all(|&(d, l)| l > d) || corners.iter().all(|&(d, l)| -l > d) {
            return false;
        }

        if corners.iter().all(|&(d, _)| d >= NEAR_CLIP) {
            let (mut lo, mut hi) = (i32::MAX, i32::MIN);
            for &(d, l) in &corners {
                let x = ceil_row(view.screen_x(d, l));
                lo = lo.min(x);
                hi = hi.max(x);
            }
            return self
                .frame
                .any_open(lo.max(view.clip_left), hi.min(view.clip_right));
        }
        self.frame.any_open(view.clip_left, view.clip_right)
    }

    pub fn draw_subsector(&mut self, subsector: SubSectorId) {
        let level = self.level;
        let view = self.view;
        self.frame.visited.push(subsector);
        self.frame.stats.subsectors_visited += 1;

        let Some(ss) = level.subsectors.get(subsector as usize) else {
            return;
        };
        for index in ss.segs() {
            let seg = &level.segs[index];
            let sector = level.seg_sector(seg);
            if view
                .sector
                .is_some_and(|from| level.reject.is_rejected(from, sector))
            {
                continue;
            }
            if !level.seg_faces(seg, view.x, view.y) {
                continue;
            }

            self.frame.projected.push(index as SegmentId);
            self.frame.stats.segments_projected += 1;
            if let Some(proj) = project_segment(view, level, seg, self.frame) {
                self.render_segment(seg, &proj);
            }
            if self.frame.is_full() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        engine::{
            config::RenderConfig,
            engine::FramePass,
            frame::FrameContext,
            shade::ShadeParams,
            view::View,
        },
        math::{ANGLE_180, to_fixed},
        renderer::Surface,
        world::{Aabb, Camera, ObjectList, TextureBank, builder::rectangle_room},
    };
    use glam::IVec2;

    fn with_pass(angle: u16, f: impl FnOnce(&mut FramePass)) {
        let level = rectangle_room(1024, 1024, 0, 128, 160, 0);
        let objects = ObjectList::new();
        let bank = TextureBank::default_with_checker();
        let cfg = RenderConfig::new(320, 200);
        let cam = Camera::new(to_fixed(512), to_fixed(512), to_fixed(41), angle);
        let view = View::new(&cam, &level, &cfg);
        let mut frame = FrameContext::new(&cfg);
        let mut surface = Surface::new(320, 200);
        let mut pass = FramePass {
            level: &level,
            objects: &objects,
            bank: &bank,
            view: &view,
            shade: ShadeParams::default(),
            frame: &mut frame,
            surface: &mut surface,
        };
        f(&mut pass);
    }

    fn boxed(x0: i32, y0: i32, x1: i32, y1: i32) -> Aabb {
        Aabb::new(IVec2::new(x0, y0), IVec2::new(x1, y1))
    }

    #[test]
    fn box_culling() {
        with_pass(0, |pass| {
            // Camera at (512, 512) looking east.
            assert!(pass.bbox_visible(&boxed(600, 480, 700, 540)));
            assert!(pass.bbox_visible(&boxed(500, 500, 520, 520)));
            assert!(!pass.bbox_visible(&boxed(100, 400, 300, 600)));
            // North of the cone: lateral greater than depth everywhere.
            assert!(!pass.bbox_visible(&boxed(560, 800, 600, 900)));
            assert!(!pass.bbox_visible(&boxed(560, 100, 600, 200)));
            // Straddling the camera plane with a corner inside the cone.
            assert!(pass.bbox_visible(&boxed(400, 300, 900, 350)));
            assert!(pass.bbox_visible(&boxed(400, 530, 900, 560)));
        });
    }

    #[test]
    fn occluded_columns_cull_boxes() {
        with_pass(ANGLE_180, |pass| {
            let bbox = boxed(300, 480, 400, 540);
            assert!(pass.bbox_visible(&bbox));
            for x in 0..320 {
                pass.frame.occlude(x);
            }
            assert!(!pass.bbox_visible(&bbox));
        });
    }
}
