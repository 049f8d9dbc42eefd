//! Output surface and the blend strategies shared by all rasterizers.
//!
//! *The engine never presents pixels itself.* It fills a [`Surface`] of
//! palette indices and loans it to a caller-supplied `submit` closure once
//! per frame; the caller converts through a [`Palette`] for its window or
//! file.

use std::io::{self, Write};

use crate::world::{BlendTable, Palette};

/// Pixel format handed to windowing back-ends (0x00RRGGBB).
pub type Rgb = u32;

/// Indexed-colour frame buffer, row-major with `stride` bytes per row.
#[derive(Clone, Debug)]
pub struct Surface {
    width: usize,
    height: usize,
    stride: usize,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            stride: width,
            pixels: vec![0; width * height],
        }
    }

    /// (Re)allocate for a new resolution; contents are cleared.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.stride = width;
        self.pixels.clear();
        self.pixels.resize(width * height, 0);
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.stride + x]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut u8 {
        &mut self.pixels[y * self.stride + x]
    }

    pub fn fill(&mut self, index: u8) {
        self.pixels.fill(index);
    }

    /// Fill columns `[left, right)` of every row.
    pub fn fill_columns(&mut self, left: usize, right: usize, index: u8) {
        let right = right.min(self.width);
        for row in self.pixels.chunks_exact_mut(self.stride) {
            if left < right {
                row[left..right].fill(index);
            }
        }
    }

    /// Expand through `palette` into a 0x00RRGGBB buffer.
    pub fn to_rgb(&self, palette: &Palette, out: &mut Vec<Rgb>) {
        out.clear();
        out.extend(self.pixels.iter().map(|&i| palette[i as usize]));
    }

    /// Binary PPM (P6) dump.
    pub fn write_ppm(&self, palette: &Palette, mut w: impl Write) -> io::Result<()> {
        write!(w, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut row = Vec::with_capacity(self.width * 3);
        for y in 0..self.height {
            row.clear();
            for x in 0..self.width {
                let rgb = palette[self.pixel(x, y) as usize];
                row.extend_from_slice(&[(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8]);
            }
            w.write_all(&row)?;
        }
        Ok(())
    }
}

/// How a column or span combines with what is already on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opacity {
    Invisible,
    Opaque,
    /// Texel index 0 is a hole.
    Transparent,
    /// Holes as `Transparent`; other texels mix through the blend table.
    Translucent,
}

/// Write strategy selected from an [`Opacity`].
#[derive(Clone, Copy)]
pub enum Blend<'a> {
    Overwrite,
    SkipZero,
    Table(&'a BlendTable),
}

impl Opacity {
    /// `None` for `Invisible`: nothing to draw.
    pub fn blend(self, table: &BlendTable) -> Option<Blend<'_>> {
        match self {
            Opacity::Invisible => None,
            Opacity::Opaque => Some(Blend::Overwrite),
            Opacity::Transparent => Some(Blend::SkipZero),
            Opacity::Translucent => Some(Blend::Table(table)),
        }
    }
}

pub mod software;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_columns_respects_bounds() {
        let mut s = Surface::new(6, 2);
        s.fill_columns(2, 4, 9);
        assert_eq!(s.pixels(), &[0, 0, 9, 9, 0, 0, 0, 0, 9, 9, 0, 0]);
        s.fill_columns(5, 99, 1);
        assert_eq!(s.pixel(5, 1), 1);
    }

    #[test]
    fn ppm_header_and_payload() {
        let mut s = Surface::new(2, 1);
        *s.pixel_mut(1, 0) = 255;
        let mut out = Vec::new();
        s.write_ppm(&Palette::grayscale(), &mut out).unwrap();
        assert!(out.starts_with(b"P6\n2 1\n255\n"));
        assert_eq!(&out[out.len() - 6..], &[0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn opacity_selects_blend() {
        let table = BlendTable::default();
        assert!(Opacity::Invisible.blend(&table).is_none());
        assert!(matches!(Opacity::Opaque.blend(&table), Some(Blend::Overwrite)));
        assert!(matches!(Opacity::Transparent.blend(&table), Some(Blend::SkipZero)));
        assert!(matches!(Opacity::Translucent.blend(&table), Some(Blend::Table(_))));
    }
}
