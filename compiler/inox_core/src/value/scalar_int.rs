//! Integer newtype that prevents unchecked arithmetic.
//!
//! `ScalarInt` wraps `i64` and intentionally does not implement `Add`, `Sub`,
//! `Mul`, `Div` or `Neg`: every operation goes through a checked method so
//! overflow (including `-i64::MIN`) always surfaces as an error.

use std::fmt;

/// A 64-bit signed integer without unchecked arithmetic.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct ScalarInt(i64);

impl ScalarInt {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);
    pub const MIN: Self = Self(i64::MIN);
    pub const MAX: Self = Self(i64::MAX);

    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_mul(self, rhs: Self) -> Option<Self> {
        match self.0.checked_mul(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// `None` on division by zero and on `i64::MIN / -1`.
    #[inline]
    pub const fn checked_div(self, rhs: Self) -> Option<Self> {
        match self.0.checked_div(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// `None` for `i64::MIN`.
    #[inline]
    pub const fn checked_neg(self) -> Option<Self> {
        match self.0.checked_neg() {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Debug for ScalarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ScalarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ScalarInt {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn negating_min_overflows() {
        assert_eq!(ScalarInt::MIN.checked_neg(), None);
        assert_eq!(ScalarInt::new(5).checked_neg(), Some(ScalarInt::new(-5)));
    }

    #[test]
    fn min_divided_by_minus_one_overflows() {
        assert_eq!(ScalarInt::MIN.checked_div(ScalarInt::new(-1)), None);
        assert_eq!(ScalarInt::ONE.checked_div(ScalarInt::ZERO), None);
    }

    proptest! {
        #[test]
        fn checked_add_matches_wide_arithmetic(a in any::<i64>(), b in any::<i64>()) {
            let wide = i128::from(a) + i128::from(b);
            let fits = i64::try_from(wide).is_ok();
            prop_assert_eq!(ScalarInt::new(a).checked_add(ScalarInt::new(b)).is_some(), fits);
        }

        #[test]
        fn checked_mul_matches_wide_arithmetic(a in any::<i64>(), b in any::<i64>()) {
            let wide = i128::from(a) * i128::from(b);
            let result = ScalarInt::new(a).checked_mul(ScalarInt::new(b));
            match i64::try_from(wide) {
                Ok(v) => prop_assert_eq!(result, Some(ScalarInt::new(v))),
                Err(_) => prop_assert_eq!(result, None),
            }
        }
    }
}
