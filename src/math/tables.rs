//! Lookup tables for sine, cosine, tangent, arctangent and inverse distance.

use std::f64::consts::TAU;

use once_cell::sync::Lazy;

use super::fixed::{FRACUNIT, Fixed};

/// Binary angle: `0..=65535` covers one full turn, counter-clockwise from +X.
pub type Angle = u16;

pub const ANGLE_45: Angle = 0x2000;
pub const ANGLE_90: Angle = 0x4000;
pub const ANGLE_180: Angle = 0x8000;
pub const ANGLE_270: Angle = 0xC000;

/// Entries in the sine table (one full turn).
pub const FINE_ANGLES: usize = 8192;
const FINE_SHIFT: u32 = 3; // 65536 / 8192

/// Largest distance the inverse-distance table covers.
pub const MAX_DISTANCE: i32 = 9999;

/// Tangent values are clamped to ±2048.0.
pub const MAX_TANGENT: Fixed = 2048 << 16;

const SLOPE_BITS: u32 = 11;
const SLOPE_RANGE: usize = 1 << SLOPE_BITS;

static SINE: Lazy<Vec<Fixed>> = Lazy::new(|| {
    (0..FINE_ANGLES)
        .map(|i| {
            let a = i as f64 * TAU / FINE_ANGLES as f64;
            (a.sin() * FRACUNIT as f64).round() as Fixed
        })
        .collect()
});

// Half a turn; tangent repeats every 180°.
static TANGENT: Lazy<Vec<Fixed>> = Lazy::new(|| {
    (0..FINE_ANGLES / 2)
        .map(|i| {
            let a = i as f64 * TAU / FINE_ANGLES as f64;
            let t = (a.tan() * FRACUNIT as f64).round();
            t.clamp(-(MAX_TANGENT as f64), MAX_TANGENT as f64) as Fixed
        })
        .collect()
});

// atan(i / 2048) for i in 0..=2048, as an angle in 0..=ANGLE_45.
static SLOPE_TO_ANGLE: Lazy<Vec<Angle>> = Lazy::new(|| {
    (0..=SLOPE_RANGE)
        .map(|i| {
            let a = (i as f64 / SLOPE_RANGE as f64).atan();
            (a * 65536.0 / TAU).round() as Angle
        })
        .collect()
});

static INVERSE_DISTANCE: Lazy<Vec<i32>> = Lazy::new(|| {
    (0..=MAX_DISTANCE)
        .map(|d| FRACUNIT / d.max(1))
        .collect()
});

/// `sin(angle)` in 16.16.
#[inline]
pub fn sine(angle: Angle) -> Fixed {
    SINE[(angle >> FINE_SHIFT) as usize]
}

/// `cos(angle)` in 16.16.
#[inline]
pub fn cosine(angle: Angle) -> Fixed {
    sine(angle.wrapping_add(ANGLE_90))
}

/// `tan(angle)` in 16.16, clamped to [`MAX_TANGENT`] near ±90°.
#[inline]
pub fn tangent(angle: Angle) -> Fixed {
    TANGENT[(angle >> FINE_SHIFT) as usize & (FINE_ANGLES / 2 - 1)]
}

/// `65536 / distance`, for whole-unit distances clamped into `0..=MAX_DISTANCE`.
/// A distance of 0 reads as 1.
#[inline]
pub fn inverse_distance(distance: i32) -> i32 {
    INVERSE_DISTANCE[distance.clamp(0, MAX_DISTANCE) as usize]
}

/// Angle of the vector `(dx, dy)`; `(0, 0)` yields 0.
pub fn point_to_angle(dx: Fixed, dy: Fixed) -> Angle {
    if dx == 0 && dy == 0 {
        return 0;
    }
    let ax = dx.unsigned_abs();
    let ay = dy.unsigned_abs();

    // Angle inside the first quadrant, 0..=ANGLE_90.
    let a = if ax >= ay {
        slope_angle(ay, ax)
    } else {
        ANGLE_90 - slope_angle(ax, ay)
    };

    match (dx >= 0, dy >= 0) {
        (true, true) => a,
        (false, true) => ANGLE_180 - a,
        (false, false) => ANGLE_180.wrapping_add(a),
        (true, false) => a.wrapping_neg(),
    }
}

#[inline]
fn slope_angle(num: u32, den: u32) -> Angle {
    let slope = ((num as u64) << SLOPE_BITS) / den.max(1) as u64;
    SLOPE_TO_ANGLE[(slope as usize).min(SLOPE_RANGE)]
}
