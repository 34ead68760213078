//! Gap handling for daily series.
//!
//! Calendar resampling followed by bounded-length linear interpolation.

mod interpolation;

pub use interpolation::GapFillingResampler;
