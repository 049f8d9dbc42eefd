use log::{debug, info, trace, warn};

use crate::{
    engine::{
        config::{ConfigError, FrameLimits, RenderConfig},
        frame::{FrameContext, FrameStats},
        shade::ShadeParams,
        view::View,
    },
    renderer::{Surface, software::merge},
    world::{Camera, Level, ObjectList, TextureBank},
};

/// Everything one frame reads; owned by the caller.
pub struct Scene<'a> {
    pub level: &'a Level,
    pub objects: &'a ObjectList,
    pub bank: &'a TextureBank,
    pub camera: Camera,
}

/// Software renderer: configuration, per-frame scratch and the output surface.
pub struct Engine {
    config: RenderConfig,
    frame: FrameContext,
    surface: Surface,
}

/// Borrowed state threaded through one frame's stages.
pub(crate) struct FramePass<'a> {
    pub level: &'a Level,
    pub objects: &'a ObjectList,
    pub bank: &'a TextureBank,
    pub view: &'a View,
    pub shade: ShadeParams,
    pub frame: &'a mut FrameContext,
    pub surface: &'a mut Surface,
}

impl Engine {
    pub fn new(config: RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "software renderer {}x{} (columns {}..{})",
            config.width, config.height, config.clip_left, config.clip_right
        );
        Ok(Self {
            frame: FrameContext::new(&config),
            surface: Surface::new(config.width, config.height),
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Scratch state of the last rendered frame.
    pub fn frame(&self) -> &FrameContext {
        &self.frame
    }

    /// Resize the viewport; view bounds reset to the full width.
    pub fn set_viewport(&mut self, width: usize, height: usize) -> Result<(), ConfigError> {
        let mut config = self.config.clone();
        config.width = width;
        config.height = height;
        config.clip_left = 0;
        config.clip_right = width;
        self.apply(config)?;
        self.surface.resize(width, height);
        Ok(())
    }

    /// Letterbox: only columns `[left, right)` are drawn.
    pub fn set_view_bounds(&mut self, left: usize, right: usize) -> Result<(), ConfigError> {
        let mut config = self.config.clone();
        config.clip_left = left;
        config.clip_right = right;
        self.apply(config)
    }

    pub fn set_darkness(&mut self, darkness: i32) -> Result<(), ConfigError> {
        let mut config = self.config.clone();
        config.darkness = darkness;
        self.apply(config)
    }

    pub fn set_limits(&mut self, limits: FrameLimits) {
        self.config.limits = limits;
    }

    fn apply(&mut self, config: RenderConfig) -> Result<(), ConfigError> {
        config.validate()?;
        debug!(
            "config: {}x{}, columns {}..{}, darkness {}",
            config.width, config.height, config.clip_left, config.clip_right, config.darkness
        );
        self.config = config;
        Ok(())
    }

    /// Render one frame and loan the finished surface to `submit` exactly once.
    ///
    /// RESET → FIND_SECTOR → (objects) → TRAVERSE → CONVERT_FLOORS →
    /// MERGE_AND_DRAW → PRESENT.
    pub fn render_frame<F>(&mut self, scene: &Scene, submit: F) -> FrameStats
    where
        F: FnOnce(&Surface),
    {
        self.frame.reset(&self.config);
        self.surface.fill(0);

        let view = View::new(&scene.camera, scene.level, &self.config);
        if view.is_outside(scene.level) {
            self.surface.fill_columns(
                self.config.clip_left,
                self.config.clip_right,
                self.config.fallback_color,
            );
            self.frame.stats.fallback = true;
            debug!(
                "camera at ({}, {}) is outside the map; fallback frame",
                scene.camera.x >> 16,
                scene.camera.y >> 16
            );
            submit(&self.surface);
            return self.frame.stats;
        }

        let mut pass = FramePass {
            level: scene.level,
            objects: scene.objects,
            bank: scene.bank,
            view: &view,
            shade: ShadeParams {
                darkness: self.config.darkness,
                near_light: self.config.near_light,
            },
            frame: &mut self.frame,
            surface: &mut self.surface,
        };

        pass.collect_objects();
        scene.level.walk_bsp(view.x, view.y, &mut pass);
        pass.place_remaining_objects();
        pass.frame.convert_floor_runs();
        pass.draw_floor_spans();
        merge::draw_merged(pass.surface, pass.frame, scene.bank);

        self.frame.collect_drops();
        let stats = self.frame.stats;
        if stats.overflowed() {
            warn!(
                "frame capacity exceeded: dropped {} wall slices, {} floor runs, {} objects, {} object slices",
                stats.dropped_wall_slices,
                stats.dropped_floor_runs,
                stats.dropped_objects,
                stats.dropped_object_slices
            );
        }
        trace!("{stats:?}");

        submit(&self.surface);
        stats
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::walls::project_segment,
        math::{ANGLE_90, ANGLE_180, FRACUNIT, to_fixed},
        renderer::Opacity,
        world::{
            LineFlags, NO_TEXTURE, ObjectAttributes, RejectTable, SceneObject, ShadeTables,
            Texture, TextureId,
            builder::{rectangle_room, two_rooms},
        },
    };

    const W: usize = 320;
    const H: usize = 200;
    const WALL_INDEX: u8 = 200;

    fn bank() -> (TextureBank, TextureId) {
        let mut bank = TextureBank::default_with_checker();
        let wall = bank
            .insert("WALL", Texture::solid("WALL", 64, 64, WALL_INDEX))
            .unwrap();
        (bank, wall)
    }

    fn engine() -> Engine {
        Engine::new(RenderConfig::new(W, H)).unwrap()
    }

    fn camera(x: i32, y: i32, angle: u16) -> Camera {
        Camera::new(to_fixed(x), to_fixed(y), to_fixed(41), angle)
    }

    #[test]
    fn submit_runs_exactly_once() {
        let (bank, wall) = bank();
        let level = rectangle_room(256, 256, 0, 128, 160, wall);
        let objects = ObjectList::new();
        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera: camera(128, 128, 0),
        };
        let mut calls = 0;
        engine().render_frame(&scene, |s| {
            calls += 1;
            assert_eq!((s.width(), s.height()), (W, H));
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn room_wall_is_centred_opaque_and_lit_by_sector() {
        let (mut bank, wall) = bank();
        bank.set_shades(ShadeTables::from_fn(|row, _| row as u8));
        let level = rectangle_room(512, 256, 0, 128, 32, wall);
        let objects = ObjectList::new();
        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera: camera(256, 128, 0),
        };
        let mut engine = engine();
        let stats = engine.render_frame(&scene, |_| {});

        // Room centre facing east: the east wall is 256 units ahead, 256 wide.
        let view = View::new(&scene.camera, &level, engine.config());
        let open = FrameContext::new(engine.config());
        let proj = project_segment(&view, &level, &level.segs[2], &open).unwrap();
        let half = (W / 2) as i32;
        assert!(((half - proj.x_start) - (proj.x_end - half)).abs() <= 1);
        assert!((proj.sx1 + proj.sx2 - ((W as i64) << 16)).abs() <= 2 * FRACUNIT as i64);

        // Horizon row of the centre column is that wall at 32 >> 2.
        assert_eq!(engine.surface().pixel(W / 2, H / 2), 32 >> 2);
        assert_eq!(stats.wall_slices, 0);
        assert!(!stats.fallback);
        assert!(engine.frame().occluded.iter().all(|&o| o));
    }

    #[test]
    fn repeated_frames_are_identical() {
        let (bank, wall) = bank();
        let level = two_rooms(16, 96, wall);
        let objects = ObjectList::new();
        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera: camera(100, 90, 0x0C00),
        };
        let mut engine = engine();
        engine.render_frame(&scene, |_| {});
        let visited = engine.frame().visited.clone();
        let pixels = engine.surface().pixels().to_vec();

        engine.render_frame(&scene, |_| {});
        assert_eq!(engine.frame().visited, visited);
        assert_eq!(engine.surface().pixels(), pixels.as_slice());
        assert_eq!(visited, vec![0, 1]);
    }

    #[test]
    fn full_occlusion_stops_traversal() {
        let (bank, wall) = bank();
        let level = two_rooms(0, 128, wall);
        let objects = ObjectList::new();
        // Facing the west wall of room A, which fills the view.
        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera: camera(128, 128, ANGLE_180),
        };
        let mut engine = engine();
        let stats = engine.render_frame(&scene, |_| {});
        assert!(engine.frame().is_full());
        assert_eq!(engine.frame().visited, vec![0]);
        assert!(engine.frame().projected.iter().all(|&s| s < 4));
        assert_eq!(stats.wall_slices, 0);
    }

    #[test]
    fn letterboxed_columns_are_never_written() {
        let (bank, wall) = bank();
        let level = two_rooms(24, 100, wall);
        let objects = ObjectList::new();
        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera: camera(64, 128, 0),
        };
        let mut engine = engine();
        engine.set_view_bounds(40, 280).unwrap();
        engine.render_frame(&scene, |_| {});
        let s = engine.surface();
        for y in 0..H {
            for x in (0..40).chain(280..W) {
                assert_eq!(s.pixel(x, y), 0, "column {x} row {y} was written");
            }
            assert_ne!(s.pixel(160, y), 0);
        }
    }

    #[test]
    fn portal_column_splits_into_upper_lower_and_queued_main() {
        const FAR_INDEX: u8 = 90;
        let (mut bank, wall) = bank();
        let grate = bank
            .insert("GRATE", Texture::solid("GRATE", 16, 64, 120))
            .unwrap();
        let far = bank
            .insert("FAR", Texture::solid("FAR", 64, 64, FAR_INDEX))
            .unwrap();

        for (flags, opacity) in [
            (LineFlags::TRANSLUCENT, Opacity::Translucent),
            (LineFlags::empty(), Opacity::Transparent),
        ] {
            let mut level = two_rooms(16, 96, wall);
            let portal = level.segs[2].line as usize;
            level.lines[portal].flags |= flags;
            let front = level.lines[portal].sides[0].unwrap();
            level.sides[front as usize].main = grate;
            for side in level.sides.iter_mut().filter(|s| s.sector == 1) {
                if side.main != NO_TEXTURE {
                    side.main = far;
                }
            }
            let objects = ObjectList::new();
            let scene = Scene {
                level: &level,
                objects: &objects,
                bank: &bank,
                camera: camera(128, 128, 0),
            };
            let mut engine = engine();
            engine.render_frame(&scene, |_| {});
            let frame = engine.frame();

            // Portal 128 ahead, eye at 41: back ceiling 96 lands on row 31,
            // back floor 16 on row 131, front floor 0 on row 151.
            let slices: Vec<(i32, i32, Opacity)> = frame
                .wall_slices
                .iter_list(frame.wall_heads[160], |s| s.next)
                .map(|(_, s)| (s.top, s.bottom, s.opacity))
                .collect();
            assert_eq!(slices, vec![(31, 131, opacity)]);
            assert_eq!((frame.min_y[160], frame.max_y[160]), (31, 131));

            // Upper and lower walls stay on screen; the far room never
            // reaches rows its column had already closed.
            let s = engine.surface();
            for y in (0..31).chain(131..151) {
                assert_eq!(s.pixel(160, y), WALL_INDEX, "row {y}");
            }
            for y in (0..31).chain(131..H) {
                assert_ne!(s.pixel(160, y), FAR_INDEX, "row {y}");
            }
        }
    }

    #[test]
    fn rejected_sector_is_never_projected() {
        let (bank, wall) = bank();
        let mut level = two_rooms(0, 128, wall);
        let objects = ObjectList::new();
        let scene_at = |level: &Level| {
            let mut engine = engine();
            let scene = Scene {
                level,
                objects: &objects,
                bank: &bank,
                camera: camera(128, 128, 0),
            };
            engine.render_frame(&scene, |_| {});
            engine.frame().projected.clone()
        };

        // Room B's segments are 4..8; its east wall faces the camera.
        let open = scene_at(&level);
        assert!(open.iter().any(|&s| s >= 4));

        let mut reject = RejectTable::all_visible(2);
        reject.set(0, 1, true);
        level.reject = reject;
        let culled = scene_at(&level);
        assert!(!culled.is_empty());
        assert!(culled.iter().all(|&s| s < 4));
    }

    #[test]
    fn outside_camera_gets_fallback_fill() {
        let (bank, wall) = bank();
        let level = rectangle_room(128, 128, 0, 128, 160, wall);
        let objects = ObjectList::new();
        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera: camera(300, 64, 0),
        };
        let mut cfg = RenderConfig::new(W, H);
        cfg.fallback_color = 77;
        let mut engine = Engine::new(cfg).unwrap();
        let stats = engine.render_frame(&scene, |_| {});
        assert!(stats.fallback);
        assert!(engine.surface().pixels().iter().all(|&p| p == 77));
    }

    #[test]
    fn nearer_sprite_wins_shared_columns() {
        let (mut bank, wall) = bank();
        let near_pic = bank
            .insert_picture("NEAR", Texture::solid("NEAR", 16, 64, 50))
            .unwrap();
        let far_pic = bank
            .insert_picture("FAR", Texture::solid("FAR", 16, 64, 60))
            .unwrap();
        let level = rectangle_room(512, 256, 0, 128, 160, wall);
        let mut objects = ObjectList::new();
        // Far one first so insertion order does not decide the outcome.
        objects.push(SceneObject::new(2, to_fixed(264), to_fixed(128), 0, far_pic));
        objects.push(SceneObject::new(1, to_fixed(164), to_fixed(128), 0, near_pic));
        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera: camera(64, 128, 0),
        };
        let mut engine = engine();
        let stats = engine.render_frame(&scene, |_| {});
        assert_eq!(stats.objects_visible, 2);

        let runs = engine.frame().objects.as_slice();
        assert_eq!(runs[0].view_depth >> 16, 100);
        assert_eq!(runs[1].view_depth >> 16, 200);
        assert_eq!(runs[0].type_id, 1);

        // Column list is far-first: the 200 run is drawn before the 100 run.
        let frame = engine.frame();
        let order: Vec<u32> = frame
            .object_slices
            .iter_list(frame.object_heads[W / 2], |s| s.next)
            .map(|(_, s)| s.run)
            .collect();
        assert_eq!(order, vec![1, 0]);
        assert_eq!(engine.surface().pixel(W / 2, H / 2), 50);
    }

    #[test]
    fn invisible_objects_are_skipped() {
        let (mut bank, wall) = bank();
        let pic = bank
            .insert_picture("PIC", Texture::solid("PIC", 16, 64, 50))
            .unwrap();
        let level = rectangle_room(512, 256, 0, 128, 160, wall);
        let mut objects = ObjectList::new();
        let mut ghost = SceneObject::new(1, to_fixed(164), to_fixed(128), 0, pic);
        ghost.attributes = ObjectAttributes::INVISIBLE;
        objects.push(ghost);
        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera: camera(64, 128, 0),
        };
        let stats = engine().render_frame(&scene, |_| {});
        assert_eq!(stats.objects_visible, 0);
    }

    #[test]
    fn setters_validate() {
        let mut engine = engine();
        assert!(engine.set_view_bounds(10, 5).is_err());
        assert!(engine.set_darkness(99).is_err());
        engine.set_darkness(-10).unwrap();
        assert_eq!(engine.config().darkness, -10);

        engine.set_view_bounds(10, 300).unwrap();
        engine.set_viewport(640, 400).unwrap();
        assert_eq!(engine.config().clip_right, 640);
        assert_eq!(engine.surface().width(), 640);
        assert!(engine.set_viewport(0, 10).is_err());
    }

    #[test]
    fn darkness_shifts_every_shade_row() {
        let (mut bank, wall) = bank();
        bank.set_shades(ShadeTables::from_fn(|row, _| row as u8));
        let level = rectangle_room(512, 256, 0, 128, 160, wall);
        let objects = ObjectList::new();
        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera: camera(128, 128, 0),
        };
        let mut engine = engine();
        engine.render_frame(&scene, |_| {});
        assert_eq!(engine.surface().pixel(W / 2, H / 2), 40);

        engine.set_darkness(-30).unwrap();
        engine.render_frame(&scene, |_| {});
        assert_eq!(engine.surface().pixel(W / 2, H / 2), 10);
    }

    #[test]
    fn turning_keeps_frames_stable() {
        let (bank, wall) = bank();
        let level = two_rooms(16, 96, wall);
        let objects = ObjectList::new();
        let mut engine = engine();
        for step in 0..16u16 {
            let scene = Scene {
                level: &level,
                objects: &objects,
                bank: &bank,
                camera: camera(200, 100, step.wrapping_mul(ANGLE_90 / 4)),
            };
            let stats = engine.render_frame(&scene, |_| {});
            assert!(!stats.fallback);
            assert!(!stats.overflowed());
            assert!(engine.frame().is_full() || stats.subsectors_visited == 2);
        }
    }
}
