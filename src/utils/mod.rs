// src/utils/mod.rs
pub mod cast;
pub mod nan;

pub use cast::{to_int16, NODATA_INT16};
pub use nan::{all_nan, gradient, nan_max, nan_median, nan_min};
