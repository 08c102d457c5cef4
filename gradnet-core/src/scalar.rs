use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};
use std::iter::Sum;
use std::ops::{AddAssign, MulAssign, SubAssign};

/// All scalar types the tape can differentiate (`f32`, `f64`).
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.
pub trait Real:
    Float + FromPrimitive + AddAssign + SubAssign + MulAssign + Sum + Display + Debug + 'static
{
}

impl<T> Real for T where
    T: Float + FromPrimitive + AddAssign + SubAssign + MulAssign + Sum + Display + Debug + 'static
{
}
