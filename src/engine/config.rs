/// Largest supported viewport side, in pixels.
pub const MAX_VIEWPORT: usize = 4096;

/// Global darkness adjustment range (added to every sector's shade row).
pub const MAX_DARKNESS: i32 = 63;

/// Per-frame arena capacities. Entries past a limit are dropped and
/// counted in `FrameStats`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLimits {
    pub wall_slices: usize,
    pub floor_runs: usize,
    pub objects: usize,
    pub object_slices: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            wall_slices: 16 * 1024,
            floor_runs: 32 * 1024,
            objects: 512,
            object_slices: 32 * 1024,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Drawable columns `[clip_left, clip_right)`; narrower than `width`
    /// for a letterboxed view.
    pub clip_left: usize,
    pub clip_right: usize,
    /// −63..=63, added to every sector's base shade row.
    pub darkness: i32,
    /// Extra shade rows at distance zero, fading out by the falloff distance.
    pub near_light: i32,
    /// Palette index shown when the camera is outside the map.
    pub fallback_color: u8,
    pub limits: FrameLimits,
}

impl RenderConfig {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            clip_left: 0,
            clip_right: width,
            darkness: 0,
            near_light: 8,
            fallback_color: 0,
            limits: FrameLimits::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroViewport {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_VIEWPORT || self.height > MAX_VIEWPORT {
            return Err(ConfigError::ViewportTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        if self.clip_left >= self.clip_right {
            return Err(ConfigError::EmptyViewBounds {
                left: self.clip_left,
                right: self.clip_right,
            });
        }
        if self.clip_right > self.width {
            return Err(ConfigError::ViewBoundsOutOfRange {
                left: self.clip_left,
                right: self.clip_right,
                width: self.width,
            });
        }
        if !(-MAX_DARKNESS..=MAX_DARKNESS).contains(&self.darkness) {
            return Err(ConfigError::DarknessOutOfRange(self.darkness));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("viewport {width}x{height} has no pixels")]
    ZeroViewport { width: usize, height: usize },

    #[error("viewport {width}x{height} exceeds {MAX_VIEWPORT} pixels per side")]
    ViewportTooLarge { width: usize, height: usize },

    #[error("view bounds [{left}, {right}) are empty")]
    EmptyViewBounds { left: usize, right: usize },

    #[error("view bounds [{left}, {right}) exceed viewport width {width}")]
    ViewBoundsOutOfRange {
        left: usize,
        right: usize,
        width: usize,
    },

    #[error("darkness {0} outside -63..=63")]
    DarknessOutOfRange(i32),
}
