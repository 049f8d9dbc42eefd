//! Floor and ceiling drawing.
//!
//! Walls leave behind vertical bands per column ([`FloorRun`]s). Adjacent
//! columns sharing a sector and plane on the same row are joined into
//! horizontal [`FloorSpan`]s, which are then texture-mapped row by row
//! with a constant depth per row.

use smallvec::SmallVec;

use crate::{
    engine::{
        engine::FramePass,
        frame::{FloorRun, FloorSpan, FrameContext, Plane},
        shade::determine_shade,
    },
    math::inverse_distance,
    renderer::software::spans::{SpanCursor, draw_span, draw_sky_span},
    world::SectorId,
};

/// `(top, bottom, sector, plane)` of one band.
type Band = (i32, i32, SectorId, Plane);

/// Bands of one column, top to bottom.
type ColumnBands = SmallVec<[Band; 8]>;

#[inline]
fn same_surface(a: &Band, b: &Band) -> bool {
    a.2 == b.2 && a.3 == b.3
}

/// Band of `bands` covering row `y`, if any. `cursor` only moves forward,
/// so rows must be asked for in increasing order.
#[inline]
fn band_at<'b>(bands: &'b [Band], cursor: &mut usize, y: i32) -> Option<&'b Band> {
    while bands.get(*cursor).is_some_and(|b| b.1 <= y) {
        *cursor += 1;
    }
    bands.get(*cursor).filter(|b| b.0 <= y)
}

impl FrameContext {
    fn column_bands(&self, x: usize) -> ColumnBands {
        self.floor_runs
            .iter_list(self.floor_heads[x], |r: &FloorRun| r.next)
            .map(|(_, r)| (r.top, r.bottom, r.sector, r.plane))
            .collect()
    }

    /// Join per-column bands into horizontal spans.
    ///
    /// Each column is compared with the previous one: a row whose surface
    /// ends emits a span from where it started, a row whose surface begins
    /// records its start column. A virtual empty column past the right
    /// edge closes everything still open.
    pub fn convert_floor_runs(&mut self) {
        self.spans.clear();
        let width = self.width();
        let mut prev = ColumnBands::new();

        for x in 0..=width {
            let cur = if x < width {
                self.column_bands(x)
            } else {
                ColumnBands::new()
            };

            let mut j = 0;
            for p in &prev {
                for y in p.0..p.1 {
                    let continued = band_at(&cur, &mut j, y).is_some_and(|c| same_surface(c, p));
                    if !continued {
                        self.spans.push(FloorSpan {
                            y,
                            x_start: self.span_starts[y as usize],
                            x_end: x as i32,
                            sector: p.2,
                            plane: p.3,
                        });
                    }
                }
            }

            let mut i = 0;
            for c in &cur {
                for y in c.0..c.1 {
                    let continued = band_at(&prev, &mut i, y).is_some_and(|p| same_surface(p, c));
                    if !continued {
                        self.span_starts[y as usize] = x as i32;
                    }
                }
            }
            prev = cur;
        }
        self.stats.floor_spans = self.spans.len();
    }
}

impl FramePass<'_> {
    /// Texture-map every converted span.
    pub fn draw_floor_spans(&mut self) {
        let spans = std::mem::take(&mut self.frame.spans);
        for span in &spans {
            self.draw_floor_span(span);
        }
        self.frame.spans = spans;
    }

    fn draw_floor_span(&mut self, span: &FloorSpan) {
        let view = self.view;
        let bank = self.bank;
        let sector = &self.level.sectors[span.sector as usize];
        let (plane_z, tex_id) = match span.plane {
            Plane::Floor => (sector.floor, sector.floor_tex),
            Plane::Ceiling => (sector.ceiling, sector.ceiling_tex),
        };
        let xs = span.x_start as usize..span.x_end as usize;
        let tex = bank.texture_or_missing(tex_id);
        if tex.is_sky() {
            draw_sky_span(self.surface, span.y as usize, xs, bank.backdrop(), view.angle);
            return;
        }

        // Row distance from the horizon in half pixels.
        let from_horizon = (2 * span.y + 1 - 2 * view.half_h).abs();
        let height = (plane_z as i64 - view.eye_z as i64).abs();
        let depth = (height * view.focal as i64 * 2 * inverse_distance(from_horizon) as i64) >> 16;
        let step = view.pixel_step(depth);
        let (cos, sin) = (view.cos as i64, view.sin as i64);

        // Lateral offset of the first column's centre, positive left.
        let lateral = ((2 * (view.half_w - span.x_start) as i64 - 1) * step) >> 1;
        let mut u = view.x as i64 + ((depth * cos - lateral * sin) >> 16);
        let mut v = view.y as i64 + ((depth * sin + lateral * cos) >> 16);
        if span.plane == Plane::Floor {
            u += (sector.floor_offset.x as i64) << 16;
            v += (sector.floor_offset.y as i64) << 16;
        }
        let cursor = SpanCursor {
            u,
            v,
            du: (step * sin) >> 16,
            dv: -((step * cos) >> 16),
        };

        let shade = determine_shade((depth >> 16) as i32, sector.light, &self.shade);
        draw_span(
            self.surface,
            span.y as usize,
            xs,
            tex,
            cursor,
            bank.shade_row(shade),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::RenderConfig;

    fn frame(width: usize, height: usize) -> FrameContext {
        FrameContext::new(&RenderConfig::new(width, height))
    }

    fn sorted(mut spans: Vec<FloorSpan>) -> Vec<(i32, i32, i32, SectorId)> {
        spans.sort_by_key(|s| (s.y, s.x_start));
        spans
            .iter()
            .map(|s| (s.y, s.x_start, s.x_end, s.sector))
            .collect()
    }

    #[test]
    fn uniform_columns_make_full_rows() {
        let mut f = frame(4, 6);
        for x in 0..4 {
            f.record_floor_run(x, 4, 6, 0, Plane::Floor);
        }
        f.convert_floor_runs();
        assert_eq!(sorted(f.spans.clone()), vec![(4, 0, 4, 0), (5, 0, 4, 0)]);
        assert_eq!(f.stats.floor_spans, 2);
    }

    #[test]
    fn surface_change_splits_rows() {
        let mut f = frame(4, 4);
        // Columns 0..2 see sector 0 on rows 2..4, columns 2..4 sector 1 on rows 3..4.
        for x in 0..2 {
            f.record_floor_run(x, 2, 4, 0, Plane::Floor);
        }
        for x in 2..4 {
            f.record_floor_run(x, 3, 4, 1, Plane::Floor);
        }
        f.convert_floor_runs();
        assert_eq!(
            sorted(f.spans.clone()),
            vec![(2, 0, 2, 0), (3, 0, 2, 0), (3, 2, 4, 1)]
        );
    }

    #[test]
    fn floor_and_ceiling_of_one_sector_stay_apart() {
        let mut f = frame(3, 4);
        f.record_floor_run(0, 0, 2, 0, Plane::Ceiling);
        f.record_floor_run(1, 0, 2, 0, Plane::Floor);
        f.record_floor_run(2, 0, 2, 0, Plane::Floor);
        f.convert_floor_runs();
        assert_eq!(
            sorted(f.spans.clone()),
            vec![(0, 0, 1, 0), (0, 1, 3, 0), (1, 0, 1, 0), (1, 1, 3, 0)]
        );
    }

    #[test]
    fn gaps_restart_spans() {
        let mut f = frame(5, 2);
        for x in [0, 1, 3, 4] {
            f.record_floor_run(x, 1, 2, 7, Plane::Floor);
        }
        f.convert_floor_runs();
        assert_eq!(sorted(f.spans.clone()), vec![(1, 0, 2, 7), (1, 3, 5, 7)]);
    }

    #[test]
    fn every_band_pixel_is_covered_once() {
        let mut f = frame(16, 16);
        for x in 0..16usize {
            let cut = (x as i32 * 7) % 11 + 2;
            f.record_floor_run(x, 0, cut.min(8), (x % 3) as SectorId, Plane::Ceiling);
            f.record_floor_run(x, cut + 3, 16, (x % 2) as SectorId, Plane::Floor);
        }
        let mut expected = 0;
        for x in 0..16 {
            expected += f.column_bands(x).iter().map(|b| b.1 - b.0).sum::<i32>();
        }
        f.convert_floor_runs();
        let covered: i32 = f.spans.iter().map(|s| s.x_end - s.x_start).sum();
        assert_eq!(covered, expected);
    }
}
