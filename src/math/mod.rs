//! Fixed-point arithmetic shared by every stage of the renderer.
//!
//! * 16.16 signed values ([`Fixed`]) for world coordinates, heights and
//!   texture coordinates.
//! * 16-bit binary angles ([`Angle`]) with table-driven trigonometry.
//!
//! Nothing in the per-frame pipeline touches floating point; the float maths
//! in [`tables`] only runs once, when a table is first used.

mod fixed;
mod tables;

pub use fixed::{
    FRACBITS, FRACUNIT, Fixed, HALF_UNIT, ceil_row, fixed_div, fixed_to_int, mult_and_shift16,
    mult_and_shift22, mult_and_shift32, quick_square_root, to_fixed,
};
pub use tables::{
    ANGLE_45, ANGLE_90, ANGLE_180, ANGLE_270, Angle, FINE_ANGLES, MAX_DISTANCE, MAX_TANGENT,
    cosine, inverse_distance, point_to_angle, sine, tangent,
};
