//! Geometry utilities: SE3 poses and AR world-frame conventions.

pub mod frames;
pub mod se3;

pub use frames::{DisplayGeometry, Ray};
pub use se3::SE3;
