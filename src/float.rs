use std::iter::Sum;
use std::ops::AddAssign;

use ndarray::NdFloat;
use num_traits::{FromPrimitive, NumCast};
use rand::distributions::uniform::SampleUniform;

/// Element type of the coordinate matrices the mixture and k-means models work on.
///
/// Implemented for `f32` and `f64`. On top of [`NdFloat`], the models average over rows
/// (`FromPrimitive`, `Sum`) and draw k-means++ seeds from a weighted distribution
/// (`SampleUniform`, `Default`, `AddAssign<&Self>`).
pub trait Float:
    NdFloat + FromPrimitive + Default + Sum + SampleUniform + for<'a> AddAssign<&'a Self>
{
    /// Convert a count or a constant. A value out of range reads as NaN.
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap_or_else(Self::nan)
    }
}

impl Float for f32 {}

impl Float for f64 {}
