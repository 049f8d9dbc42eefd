//! Final pass: queued see-through walls and placed objects, interleaved
//! per column so that farther strips are drawn first.

use crate::{
    engine::frame::{FrameContext, ObjectSlice, WallSlice},
    renderer::{
        Surface,
        software::columns::{ColumnSource, draw_column},
    },
    world::TextureBank,
};

/// Walk both far-first lists of every column and draw whichever head is
/// farther; on equal depth the wall goes first.
pub fn draw_merged(surface: &mut Surface, frame: &FrameContext, bank: &TextureBank) {
    for x in 0..frame.width() {
        let mut wall = frame.wall_heads[x];
        let mut object = frame.object_heads[x];
        loop {
            let (w, o) = (frame.wall_slices.get(wall), frame.object_slices.get(object));
            let wall_first = match (w, o) {
                (None, None) => break,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some(w), Some(o)) => w.depth >= frame.objects[o.run].depth,
            };
            if wall_first {
                if let Some(slice) = w {
                    draw_wall_slice(surface, x, slice, bank);
                    wall = slice.next;
                }
            } else if let Some(slice) = o {
                draw_object_slice(surface, x, slice, frame, bank);
                object = slice.next;
            }
        }
    }
}

fn draw_wall_slice(surface: &mut Surface, x: usize, slice: &WallSlice, bank: &TextureBank) {
    let Some(blend) = slice.opacity.blend(bank.blend()) else {
        return;
    };
    let tex = bank.texture_or_missing(slice.texture);
    let src = ColumnSource {
        texels: tex.column(slice.column),
        mask: tex.height_mask(),
        offset: slice.v_offset,
        step: slice.v_step,
    };
    draw_column(
        surface,
        x,
        slice.top..slice.bottom,
        &src,
        bank.shade_row(slice.shade),
        None,
        blend,
    );
}

fn draw_object_slice(
    surface: &mut Surface,
    x: usize,
    slice: &ObjectSlice,
    frame: &FrameContext,
    bank: &TextureBank,
) {
    let run = &frame.objects[slice.run];
    let Some(blend) = run.opacity.blend(bank.blend()) else {
        return;
    };
    let Ok(pic) = bank.texture(run.picture) else {
        return;
    };
    let u = run.u_start + (x as i64 - run.x_start as i64) * run.u_step;
    let column = ((u >> 16).max(0) as usize).min(pic.width.saturating_sub(1));
    let src = ColumnSource {
        texels: pic.column(column),
        mask: usize::MAX,
        offset: run.v_start + (slice.top - run.top) as i64 * run.v_step,
        step: run.v_step,
    };
    draw_column(
        surface,
        x,
        slice.top..slice.bottom,
        &src,
        bank.shade_row(run.shade),
        run.colorize.and_then(|c| bank.colorize(c)),
        blend,
    );
}
