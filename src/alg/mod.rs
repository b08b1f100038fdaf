//! Georeferencing algorithms built on ground control points.

pub mod homography;
pub mod transform;
