//! Interactive viewer for the software renderer.
//!
//! ```bash
//! cargo run --release -- --width 640 --height 400
//! cargo run --release -- --headless 35 --dump frame.ppm
//! ```
//!
//! Arrows/WASD move, Alt+←/→ strafes, Esc quits.

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::Parser;
use glam::IVec2;
use log::{LevelFilter, info};
use minifb::{Key, Window, WindowOptions};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use view3d::{
    engine::{Engine, RenderConfig, Scene},
    math::{ANGLE_90, ANGLE_180, to_fixed},
    renderer::Surface,
    world::{
        BlendTable, BodyPiece, Camera, Level, LightAnimation, LightKind, LineFlags,
        ObjectAttributes, ObjectList, SceneObject, ShadeTables, Texture, TextureBank,
        builder::two_rooms,
    },
};

const EYE_HEIGHT: i32 = 41;
const MOVE_STEP: i32 = 8;
const TURN_STEP: i32 = 0x300;

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    #[arg(long, default_value_t = 640)]
    width: usize,

    #[arg(long, default_value_t = 400)]
    height: usize,

    /// Columns left blank on each side of the view
    #[arg(long, default_value_t = 0)]
    letterbox: usize,

    /// Global darkness, -63..=63
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    darkness: i32,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Render this many frames without a window, then exit
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u32>,

    /// Write the last rendered frame as a binary PPM
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let level_filter = match opts.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level_filter,
        ConfigBuilder::default()
            .set_time_level(LevelFilter::Trace)
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let mut config = RenderConfig::new(opts.width, opts.height);
    config.darkness = opts.darkness;
    config.clip_left = opts.letterbox;
    config.clip_right = opts.width.saturating_sub(opts.letterbox);
    let mut engine = Engine::new(config).context("invalid render settings")?;

    let (mut level, objects, bank) = demo_scene()?;
    info!(
        "level {}: {} sectors, {} segments, {} objects",
        level.name,
        level.sectors.len(),
        level.segs.len(),
        objects.len()
    );

    let mut camera = Camera::new(to_fixed(64), to_fixed(128), to_fixed(EYE_HEIGHT), 0);

    if let Some(frames) = opts.headless {
        for tick in 0..frames {
            level.animate_lights(tick);
            camera.turn(TURN_STEP / 4);
            let scene = Scene {
                level: &level,
                objects: &objects,
                bank: &bank,
                camera,
            };
            let stats = engine.render_frame(&scene, |_| {});
            info!("frame {tick}: {stats:?}");
        }
        if let Some(path) = &opts.dump {
            dump(engine.surface(), &bank, path)?;
        }
        return Ok(());
    }

    let (w, h) = (opts.width, opts.height);
    let mut win = Window::new("view3d software renderer", w, h, WindowOptions::default())?;
    win.set_target_fps(35);

    let mut rgb = Vec::with_capacity(w * h);
    let mut ticks = 0u32;
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now();

        let step = to_fixed(MOVE_STEP);
        let alt = win.is_key_down(Key::LeftAlt) || win.is_key_down(Key::RightAlt);
        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            camera.step(step, 0);
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            camera.step(-step, 0);
        }
        if win.is_key_down(Key::A) || (alt && win.is_key_down(Key::Left)) {
            camera.step(0, -step);
        }
        if win.is_key_down(Key::D) || (alt && win.is_key_down(Key::Right)) {
            camera.step(0, step);
        }
        if !alt && win.is_key_down(Key::Left) {
            camera.turn(TURN_STEP);
        }
        if !alt && win.is_key_down(Key::Right) {
            camera.turn(-TURN_STEP);
        }

        ticks = ticks.wrapping_add(1);
        level.animate_lights(ticks);

        let scene = Scene {
            level: &level,
            objects: &objects,
            bank: &bank,
            camera,
        };
        engine.render_frame(&scene, |surface| surface.to_rgb(bank.palette(), &mut rgb));
        acc_time += t0.elapsed();
        acc_frames += 1;
        win.update_with_buffer(&rgb, w, h)?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            info!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }

    if let Some(path) = &opts.dump {
        dump(engine.surface(), &bank, path)?;
    }
    Ok(())
}

fn dump(surface: &Surface, bank: &TextureBank, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    surface.write_ppm(bank.palette(), BufWriter::new(file))?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Two joined rooms: a lit stone hall and a raised, sky-roofed court with
/// a flickering light, a grate in the doorway and a few objects.
fn demo_scene() -> anyhow::Result<(Level, ObjectList, TextureBank)> {
    let mut bank = TextureBank::default_with_checker();
    bank.set_shades(ShadeTables::grayscale());
    bank.set_blend(BlendTable::average());

    let brick = bank.insert(
        "BRICK",
        Texture::from_fn("BRICK", 64, 64, |u, v| {
            let row = v / 16;
            let shift = if row % 2 == 0 { 0 } else { 16 };
            if v % 16 == 0 || (u + shift) % 32 == 0 {
                90
            } else {
                170 + ((u * 7 + v * 3) % 24) as u8
            }
        }),
    )?;
    let grate = bank.insert(
        "GRATE",
        Texture::from_fn("GRATE", 16, 64, |u, v| if u % 8 < 2 || v % 16 < 2 { 120 } else { 0 }),
    )?;
    let flagstone = bank.insert(
        "FLAGS",
        Texture::from_fn("FLAGS", 64, 64, |u, v| {
            if u % 32 == 0 || v % 32 == 0 { 60 } else { 110 + ((u ^ v) % 16) as u8 }
        }),
    )?;
    let plaster = bank.insert("PLASTER", Texture::solid("PLASTER", 8, 8, 200))?;
    let sky = bank.insert("SKY", Texture::sky("SKY"))?;
    bank.set_backdrop(Texture::from_fn("BACKDROP", 256, 128, |u, v| {
        (230 - v as i32 + ((u as i32 * 5) % 9)) as u8
    }))?;

    let pillar = bank.insert_picture(
        "PILLAR",
        Texture::from_fn("PILLAR", 16, 72, |u, _| {
            if (2..14).contains(&u) { 150 + u as u8 } else { 0 }
        }),
    )?;
    let legs = bank.insert_picture("LEGS", Texture::solid("LEGS", 12, 24, 80))?;
    let chest = bank.insert_picture("CHEST", Texture::solid("CHEST", 16, 20, 140))?;
    let shield = bank.insert_picture("SHIELD", Texture::solid("SHIELD", 10, 14, 220))?;
    let red = bank.add_colorize(std::array::from_fn(|i| (i as u8).saturating_sub(40)));

    let mut level = two_rooms(24, 112, brick);
    level.name = "DEMO".into();
    {
        let hall = &mut level.sectors[0];
        hall.floor_tex = flagstone;
        hall.ceiling_tex = plaster;
    }
    {
        let court = &mut level.sectors[1];
        court.floor_tex = flagstone;
        court.floor_offset = IVec2::new(16, 16);
        court.ceiling_tex = sky;
        court.light_anim = LightAnimation {
            kind: LightKind::Oscillate,
            rate: 0x0400,
            center: 176,
            radius: 48,
        };
    }
    // The doorway: a translucent grate between the rooms.
    let portal = level.segs[2].line as usize;
    level.lines[portal].flags |= LineFlags::TRANSLUCENT;
    for side in level.lines[portal].sides.into_iter().flatten() {
        level.sides[side as usize].main = grate;
    }
    level.validate()?;

    let mut objects = ObjectList::new();
    for (x, y) in [(200, 40), (200, 216), (420, 128)] {
        objects.push(SceneObject::new(10, to_fixed(x), to_fixed(y), 0, pillar));
    }

    let court_floor = to_fixed(24);
    let shield_id = {
        let z = court_floor + to_fixed(10);
        let mut obj = SceneObject::new(21, to_fixed(380), to_fixed(96), z, shield);
        obj.attributes = ObjectAttributes::BODY_PART;
        obj.piece = Some(BodyPiece::Shield);
        objects.push(obj)
    };
    let chest_id = {
        let z = court_floor + to_fixed(24);
        let mut obj = SceneObject::new(21, to_fixed(380), to_fixed(96), z, chest);
        obj.attributes = ObjectAttributes::BODY_PART;
        obj.piece = Some(BodyPiece::Chest);
        obj.colorize = Some(red);
        obj.chained = Some(shield_id);
        objects.push(obj)
    };
    let mut figure = SceneObject::new(20, to_fixed(380), to_fixed(96), court_floor, legs);
    figure.attributes = ObjectAttributes::PIECEWISE;
    figure.piece = Some(BodyPiece::Legs);
    figure.angle = ANGLE_180 + ANGLE_90 / 2;
    figure.chained = Some(chest_id);
    objects.push(figure);

    let mut ghost = SceneObject::new(30, to_fixed(140), to_fixed(60), 0, pillar);
    ghost.attributes = ObjectAttributes::TRANSLUCENT | ObjectAttributes::NO_SHADING;
    objects.push(ghost);

    objects.link_sectors(&level);
    Ok((level, objects, bank))
}
