use crate::engine::config::MAX_DARKNESS;

/// Brightest shade row.
pub const MAX_SHADE: u8 = 63;

/// Whole map units beyond which only sector light matters.
pub const SHADE_FALLOFF_DISTANCE: i32 = 171;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadeParams {
    pub darkness: i32,
    pub near_light: i32,
}

/// Shade row for a surface `distance` units away in a sector lit `light`.
///
/// Always within `0..=63`, whatever the inputs.
pub fn determine_shade(distance: i32, light: u8, params: &ShadeParams) -> u8 {
    let darkness = params.darkness.clamp(-MAX_DARKNESS, MAX_DARKNESS);
    let base = ((light >> 2) as i32 + darkness).clamp(0, MAX_SHADE as i32);

    let distance = distance.max(0);
    if distance >= SHADE_FALLOFF_DISTANCE {
        return base as u8;
    }
    let near = params.near_light.clamp(0, MAX_SHADE as i32);
    let boost = near * (SHADE_FALLOFF_DISTANCE - distance) / SHADE_FALLOFF_DISTANCE;
    let row = (base + boost).clamp(0, MAX_SHADE as i32) as u8;
    debug_assert!(row <= MAX_SHADE);
    row
}
