use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Trait bound for numeric types usable in tensors.
/// Supports `f32` and `f64`.
pub trait Float:
    Copy
    + Clone
    + Default
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + Serialize
    + for<'de> Deserialize<'de>
    + 'static
{
    const ZERO: Self;

    fn from_f64(v: f64) -> Self;
}

impl Float for f32 {
    const ZERO: Self = 0.0;

    #[inline] fn from_f64(v: f64) -> Self { v as f32 }
}

impl Float for f64 {
    const ZERO: Self = 0.0;

    #[inline] fn from_f64(v: f64) -> Self { v }
}
