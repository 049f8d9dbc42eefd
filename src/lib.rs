//! Fixed-point BSP software renderer for a 2.5D first-person view.
//!
//! * [`world`]: level geometry, reject table, textures and scene objects.
//! * [`engine`]: per-frame traversal, wall projection, floors and sprites.
//! * [`renderer`]: the indexed-colour surface and the column/span rasterizers.

pub mod engine;
pub mod math;
pub mod renderer;
pub mod world;
