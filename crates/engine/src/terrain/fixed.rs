//! Signed 64.61 fixed-point numbers.
//!
//! The generator runs entirely on integers so that every platform produces
//! bit-identical terrain. Values are `i128` with 61 fractional bits; all
//! rounding is toward negative infinity.

use std::ops::{Add, Mul, Neg, Sub};

/// A 64.61 fixed-point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(pub i128);

impl Fixed {
    pub const FRAC_BITS: u32 = 61;
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(1 << Self::FRAC_BITS);

    pub const fn from_int(n: i64) -> Self {
        Fixed((n as i128) << Self::FRAC_BITS)
    }

    /// `num / den` as a fixed-point value. `den` must be non-zero.
    pub const fn ratio(num: i64, den: i64) -> Self {
        Fixed(((num as i128) << Self::FRAC_BITS).div_euclid(den as i128))
    }

    /// Largest integer not above this value, saturating at the `i64` bounds.
    pub const fn floor(self) -> i64 {
        let n = self.0 >> Self::FRAC_BITS;
        if n > i64::MAX as i128 {
            i64::MAX
        } else if n < i64::MIN as i128 {
            i64::MIN
        } else {
            n as i64
        }
    }

    /// Fractional part, always in `[0, 1)`.
    pub const fn fract(self) -> Self {
        Fixed(self.0 & (Self::ONE.0 - 1))
    }

    pub const fn abs(self) -> Self {
        Fixed(self.0.abs())
    }

    /// Fixed-point product, rounded down.
    ///
    /// The wider operand is split into integer and fractional parts so the
    /// intermediate products stay inside `i128`, even for coordinates far
    /// from the origin.
    pub const fn mul(self, rhs: Fixed) -> Fixed {
        let (big, small) = if self.0.unsigned_abs() >= rhs.0.unsigned_abs() {
            (self.0, rhs.0)
        } else {
            (rhs.0, self.0)
        };
        let whole = big >> Self::FRAC_BITS;
        let frac = big & (Self::ONE.0 - 1);
        Fixed(whole * small + ((frac * small) >> Self::FRAC_BITS))
    }

    /// Multiply by a plain integer.
    pub const fn scale(self, n: i64) -> Fixed {
        Fixed(self.0 * n as i128)
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed::mul(self, rhs)
    }
}
