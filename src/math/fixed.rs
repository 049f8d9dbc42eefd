/// Signed 16.16 fixed-point value.
pub type Fixed = i32;

pub const FRACBITS: u32 = 16;
pub const FRACUNIT: Fixed = 1 << FRACBITS;
pub const HALF_UNIT: Fixed = FRACUNIT >> 1;

/// Whole map units → [`Fixed`].
#[inline(always)]
pub const fn to_fixed(units: i32) -> Fixed {
    units << FRACBITS
}

/// [`Fixed`] → whole map units, rounding towards −∞.
#[inline(always)]
pub const fn fixed_to_int(value: Fixed) -> i32 {
    value >> FRACBITS
}

/// `(a * b) >> 16` with a 64-bit intermediate.
#[inline(always)]
pub const fn mult_and_shift16(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64) >> 16) as i32
}

/// `(a * b) >> 22` with a 64-bit intermediate.
#[inline(always)]
pub const fn mult_and_shift22(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64) >> 22) as i32
}

/// `(a * b) >> 32`, i.e. the high word of the product.
#[inline(always)]
pub const fn mult_and_shift32(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64) >> 32) as i32
}

/// `a / b` in 16.16, saturating instead of overflowing.
pub fn fixed_div(a: Fixed, b: Fixed) -> Fixed {
    if b == 0 || (a.unsigned_abs() >> 14) >= b.unsigned_abs() {
        return if (a ^ b) < 0 { i32::MIN } else { i32::MAX };
    }
    (((a as i64) << FRACBITS) / b as i64) as Fixed
}

/// Index of the first pixel row/column whose centre lies at or after the
/// 16.16 screen coordinate `pos`.
#[inline(always)]
pub fn ceil_row(pos: i64) -> i32 {
    let row = (pos - HALF_UNIT as i64 + FRACUNIT as i64 - 1) >> FRACBITS;
    row.clamp(i32::MIN as i64 >> 1, i32::MAX as i64 >> 1) as i32
}

/// Integer square root (floor) by binary digit-by-digit approximation.
pub const fn quick_square_root(value: u32) -> u32 {
    let mut op = value;
    let mut res = 0u32;
    let mut one = 1u32 << 30;

    while one > op {
        one >>= 2;
    }
    while one != 0 {
        if op >= res + one {
            op -= res + one;
            res = (res >> 1) + one;
        } else {
            res >>= 1;
        }
        one >>= 2;
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [i32; 12] = [
        0,
        1,
        -1,
        FRACUNIT,
        -FRACUNIT,
        12_345_678,
        -98_765_432,
        i32::MAX,
        i32::MIN,
        0x0001_8000,
        -0x7FFF_0000,
        47,
    ];

    #[test]
    fn mult_and_shift_matches_wide_reference() {
        for &a in &SAMPLES {
            for &b in &SAMPLES {
                let wide = a as i64 * b as i64;
                assert_eq!(mult_and_shift16(a, b), (wide >> 16) as i32, "{a} * {b} >> 16");
                assert_eq!(mult_and_shift22(a, b), (wide >> 22) as i32, "{a} * {b} >> 22");
                assert_eq!(mult_and_shift32(a, b), (wide >> 32) as i32, "{a} * {b} >> 32");
            }
        }
    }

    #[test]
    fn mult_and_shift16_is_fixed_multiply() {
        assert_eq!(mult_and_shift16(to_fixed(3), to_fixed(4)), to_fixed(12));
        assert_eq!(mult_and_shift16(to_fixed(-3), HALF_UNIT), -to_fixed(3) / 2);
    }

    #[test]
    fn fixed_div_saturates() {
        assert_eq!(fixed_div(to_fixed(10), to_fixed(4)), to_fixed(5) / 2);
        assert_eq!(fixed_div(to_fixed(1), 0), i32::MAX);
        assert_eq!(fixed_div(to_fixed(-30_000), 1), i32::MIN);
    }

    #[test]
    fn square_root_is_floor() {
        for v in [0u32, 1, 2, 3, 4, 15, 16, 17, 99, 100, 65_535, 1 << 20, u32::MAX] {
            let r = quick_square_root(v) as u64;
            assert!(r * r <= v as u64, "sqrt({v}) = {r} too large");
            assert!((r + 1) * (r + 1) > v as u64, "sqrt({v}) = {r} too small");
        }
        assert_eq!(quick_square_root(u32::MAX), 65_535);
    }

    #[test]
    fn ceil_row_picks_first_covered_centre() {
        // Centres sit at n + 0.5.
        assert_eq!(ceil_row(to_fixed(10) as i64), 10);
        assert_eq!(ceil_row((to_fixed(10) + HALF_UNIT) as i64), 10);
        assert_eq!(ceil_row((to_fixed(10) + HALF_UNIT + 1) as i64), 11);
        assert_eq!(ceil_row(0), 0);
        assert_eq!(ceil_row(-(HALF_UNIT as i64)), -1);
    }
}
