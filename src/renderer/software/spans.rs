use std::ops::Range;

use crate::{math::Angle, renderer::Surface, world::Texture};

/// World-space texture position at the first pixel of a span and its
/// per-pixel step, all 16.16.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpanCursor {
    pub u: i64,
    pub v: i64,
    pub du: i64,
    pub dv: i64,
}

/// Textured horizontal run of row `y`, wrapping in both directions.
pub fn draw_span(
    surface: &mut Surface,
    y: usize,
    xs: Range<usize>,
    tex: &Texture,
    cursor: SpanCursor,
    shade: &[u8; 256],
) {
    if tex.is_sky() || y >= surface.height() {
        return;
    }
    let (wmask, hmask) = (tex.width_mask(), tex.height_mask());
    let SpanCursor {
        mut u,
        mut v,
        du,
        dv,
    } = cursor;

    for x in xs.start..xs.end.min(surface.width()) {
        let tu = (u >> 16) as usize & wmask;
        let tv = (v >> 16) as usize & hmask;
        *surface.pixel_mut(x, y) = shade[tex.pixels[tu * tex.height + tv] as usize];
        u += du;
        v += dv;
    }
}

/// Unshaded copy from the backdrop, scrolled by the view angle.
pub fn draw_sky_span(
    surface: &mut Surface,
    y: usize,
    xs: Range<usize>,
    backdrop: &Texture,
    angle: Angle,
) {
    if backdrop.is_sky() || y >= surface.height() {
        return;
    }
    let (bw, bh) = (backdrop.width, backdrop.height);
    let scroll = (angle.wrapping_neg() as usize * bw) >> 16;
    let row = y.min(bh - 1);

    for x in xs.start..xs.end.min(surface.width()) {
        let col = (scroll + x) % bw;
        *surface.pixel_mut(x, y) = backdrop.pixels[col * bh + row];
    }
}
