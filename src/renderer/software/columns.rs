use std::ops::Range;

use crate::{
    renderer::{Blend, Surface},
    world::TRANSPARENT_INDEX,
};

/// Where a vertical strip reads its texels from.
#[derive(Clone, Copy)]
pub struct ColumnSource<'a> {
    pub texels: &'a [u8],
    /// `height - 1` for wrapping power-of-two textures, `usize::MAX` for
    /// pictures that clamp at their last texel.
    pub mask: usize,
    /// 16.16 texel position at the first row.
    pub offset: i64,
    /// 16.16 texels per screen row.
    pub step: i64,
}

/// Draw `rows` of column `x`.
///
/// One routine for every texture size and opacity: the wrap mask is a
/// runtime value and the write is picked by `blend`.
pub fn draw_column(
    surface: &mut Surface,
    x: usize,
    rows: Range<i32>,
    src: &ColumnSource,
    shade: &[u8; 256],
    colorize: Option<&[u8; 256]>,
    blend: Blend,
) {
    if src.texels.is_empty() || x >= surface.width() {
        return;
    }
    let top = rows.start.max(0);
    let bottom = rows.end.min(surface.height() as i32);
    if top >= bottom {
        return;
    }

    let last = src.texels.len() - 1;
    let mut offset = src.offset + src.step * (top - rows.start) as i64;

    for y in top..bottom {
        let texel = src.texels[((offset >> 16) as usize & src.mask).min(last)];
        offset += src.step;

        if texel == TRANSPARENT_INDEX && !matches!(blend, Blend::Overwrite) {
            continue;
        }
        let shaded = shade[colorize.map_or(texel, |c| c[texel as usize]) as usize];
        let pixel = surface.pixel_mut(x, y as usize);
        *pixel = match blend {
            Blend::Overwrite | Blend::SkipZero => shaded,
            Blend::Table(table) => table.blend(shaded, *pixel),
        };
    }
}
