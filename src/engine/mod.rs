mod bsp;
pub mod config;
#[allow(clippy::module_inception)]
pub mod engine;
mod floors;
pub mod frame;
mod objects;
pub mod shade;
pub mod view;
pub mod walls;

pub use config::{ConfigError, FrameLimits, MAX_DARKNESS, MAX_VIEWPORT, RenderConfig};
pub use engine::{Engine, Scene};
pub use frame::{FloorSpan, FrameContext, FrameStats, Plane};
pub use objects::{PIECE_ORDER, view_quadrant};
pub use shade::{MAX_SHADE, ShadeParams, determine_shade};
pub use view::View;
