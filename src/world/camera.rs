use crate::math::{Angle, Fixed, cosine, mult_and_shift16, sine};

/// Player view-point in world space.
///
/// * Only **yaw** is simulated; the view never tilts up/down.
/// * `height` is the eye height above the floor of the occupied sector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Camera {
    pub x: Fixed,
    pub y: Fixed,
    pub height: Fixed,
    pub angle: Angle, // 0 = east, counter-clockwise
}

impl Camera {
    pub fn new(x: Fixed, y: Fixed, height: Fixed, angle: Angle) -> Self {
        Self {
            x,
            y,
            height,
            angle,
        }
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector (16.16) pointing where the camera looks.
    #[inline(always)]
    pub fn forward(&self) -> (Fixed, Fixed) {
        (cosine(self.angle), sine(self.angle))
    }

    /// Unit vector (16.16) pointing to the camera's right.
    #[inline(always)]
    pub fn right(&self) -> (Fixed, Fixed) {
        let (c, s) = self.forward();
        (s, -c)
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Move by `forward` and `side` (strafe right) 16.16 units.
    pub fn step(&mut self, forward: Fixed, side: Fixed) {
        let (fx, fy) = self.forward();
        let (rx, ry) = self.right();
        self.x += mult_and_shift16(fx, forward) + mult_and_shift16(rx, side);
        self.y += mult_and_shift16(fy, forward) + mult_and_shift16(ry, side);
    }

    /// Rotate around Z (positive = turn left).
    pub fn turn(&mut self, delta: i32) {
        self.angle = self.angle.wrapping_add(delta as u16);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
