use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use num_traits::{One, Zero};

/// An ordered field the engine can pivot over.
///
/// The solver never touches a concrete numeric type: every comparison and
/// every arithmetic step goes through these bounds, so the same engine runs
/// on `f64` (fast, rounding) or on `num_rational::Ratio` (slow, exact).
/// Division by zero is ruled out by the pivot precondition and never invoked.
pub trait Scalar:
    Clone
    + Debug
    + Display
    + FromStr
    + PartialOrd
    + Zero
    + One
    + Neg<Output = Self>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
}

impl<T> Scalar for T where
    T: Clone
        + Debug
        + Display
        + FromStr
        + PartialOrd
        + Zero
        + One
        + Neg<Output = T>
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Div<Output = T>
{
}

pub(crate) fn is_positive<T: Scalar>(value: &T) -> bool {
    *value > T::zero()
}

pub(crate) fn is_negative<T: Scalar>(value: &T) -> bool {
    *value < T::zero()
}
