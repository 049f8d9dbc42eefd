//! Per-tick sector light animation.
//!
//! Runs once per frame *before* rendering; the renderer only reads
//! `Sector::light`.

use crate::{
    math::sine,
    world::geometry::{Level, SectorId},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LightKind {
    #[default]
    None,
    /// `center + radius * sin(ticks * rate)`.
    Oscillate,
    /// Ramp from `center - radius` to `center + radius`, then jump back.
    Sawtooth,
    /// A fresh pseudo-random level once per cycle.
    Random,
    /// Copy another sector's animated level.
    Mimic(SectorId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LightAnimation {
    pub kind: LightKind,
    /// Phase advance per tick; a full cycle takes `65536 / rate` ticks.
    pub rate: u16,
    pub center: u8,
    pub radius: u8,
}

impl LightAnimation {
    /// Level at `ticks`, or `None` when the sector keeps its light.
    pub fn level_at(&self, ticks: u32, sector: SectorId) -> Option<u8> {
        let phase = ticks.wrapping_mul(self.rate as u32);
        let center = self.center as i32;
        let radius = self.radius as i32;
        let value = match self.kind {
            LightKind::None | LightKind::Mimic(_) => return None,
            LightKind::Oscillate => center + ((radius * sine(phase as u16)) >> 16),
            LightKind::Sawtooth => {
                let ramp = (phase & 0xFFFF) as i32;
                center - radius + ((2 * radius * ramp) >> 16)
            }
            LightKind::Random => {
                let cycle = phase >> 16;
                let span = 2 * radius as u32 + 1;
                center - radius + (scramble(cycle, sector) % span) as i32
            }
        };
        Some(value.clamp(0, 255) as u8)
    }
}

// xorshift-multiply hash; stable across runs.
fn scramble(cycle: u32, sector: SectorId) -> u32 {
    let mut h = cycle.wrapping_mul(0x9E37_79B9) ^ (sector as u32).wrapping_mul(0x85EB_CA6B);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h
}

impl Level {
    /// Advance every animated sector to `ticks`.
    pub fn animate_lights(&mut self, ticks: u32) {
        for (i, sector) in self.sectors.iter_mut().enumerate() {
            if let Some(level) = sector.light_anim.level_at(ticks, i as SectorId) {
                sector.light = level;
            }
        }

        // Mimics read the freshly animated values.
        for i in 0..self.sectors.len() {
            if let LightKind::Mimic(source) = self.sectors[i].light_anim.kind {
                if let Some(light) = self.sectors.get(source as usize).map(|s| s.light) {
                    self.sectors[i].light = light;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::builder::two_rooms;

    fn anim(kind: LightKind, rate: u16) -> LightAnimation {
        LightAnimation {
            kind,
            rate,
            center: 128,
            radius: 64,
        }
    }

    #[test]
    fn oscillate_peaks_at_quarter_cycle() {
        let a = anim(LightKind::Oscillate, 256);
        assert_eq!(a.level_at(0, 0), Some(128));
        assert_eq!(a.level_at(64, 0), Some(192)); // 64 * 256 = 90°
        assert_eq!(a.level_at(192, 0), Some(64));
    }

    #[test]
    fn sawtooth_ramps_and_wraps() {
        let a = anim(LightKind::Sawtooth, 1024);
        assert_eq!(a.level_at(0, 0), Some(64));
        assert_eq!(a.level_at(32, 0), Some(128));
        assert_eq!(a.level_at(64, 0), Some(64));
    }

    #[test]
    fn random_is_stable_within_a_cycle() {
        let a = anim(LightKind::Random, 4096);
        let first = a.level_at(0, 3).unwrap();
        assert_eq!(a.level_at(15, 3), Some(first));
        for t in (0..2000).step_by(16) {
            let l = a.level_at(t, 3).unwrap();
            assert!((64..=192).contains(&l));
        }
    }

    #[test]
    fn values_are_clamped() {
        let a = LightAnimation {
            kind: LightKind::Oscillate,
            rate: 256,
            center: 250,
            radius: 200,
        };
        assert_eq!(a.level_at(64, 0), Some(255));
        assert_eq!(a.level_at(192, 0), Some(50));
    }

    #[test]
    fn mimic_follows_animated_source() {
        let mut level = two_rooms(0, 128, 1);
        level.sectors[0].light_anim = anim(LightKind::Sawtooth, 1024);
        level.sectors[1].light_anim.kind = LightKind::Mimic(0);
        level.sectors[1].light = 7;

        level.animate_lights(32);
        assert_eq!(level.sectors[0].light, 128);
        assert_eq!(level.sectors[1].light, 128);

        // None keeps whatever was there.
        level.sectors[1].light_anim.kind = LightKind::None;
        level.animate_lights(0);
        assert_eq!(level.sectors[1].light, 128);
    }
}
