//! Georeferencing and curve fitting algorithms from [GDAL](http://gdal.org/), in Rust.
//!
//! The crate provides:
//!
//!  * a dense column-major [`Matrix`] and a [linear system solver](linalg::linear_system_solve),
//!  * affine ([`GeoTransform`]) and projective ([`Homography`]) transforms fitted to
//!    ground control points, and a thread-shareable [`HomographyTransformer`],
//!  * NURBS evaluation and spline interpolation of DXF leader paths
//!    ([`vector::dxf`]).
//!
//! ## Use
//!
//! ```
//! # fn main() -> gdal_georef::errors::Result<()> {
//! use gdal_georef::{Gcp, HomographyTransformer, TransformDirection};
//!
//! let gcps = vec![
//!     Gcp::new(0.0, 0.0, 10.0, 20.0),
//!     Gcp::new(100.0, 0.0, 110.0, 20.0),
//!     Gcp::new(100.0, 100.0, 110.0, 120.0),
//!     Gcp::new(0.0, 100.0, 10.0, 120.0),
//! ];
//! let transformer = HomographyTransformer::from_gcps(&gcps)?;
//! let (x, y) = transformer
//!     .transform_point(TransformDirection::Forward, 50.0, 50.0)
//!     .unwrap();
//! assert!((x - 60.0).abs() < 1e-9 && (y - 70.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! Failures are returned as [`errors::GdalError`]. Some of them are also
//! reported through the CPL error channel, see [`config::set_error_handler`].
//!
//! ## Cargo features
//!
//!  * `array`: conversions between [`Matrix`] and `ndarray::Array2<f64>`.
//!  * `nalgebra`: solve linear systems with `nalgebra` instead of the builtin
//!    elimination, unless `GDAL_USE_BUILTIN_LINEAR_SOLVER` is set.

#![crate_name = "gdal_georef"]
#![crate_type = "lib"]

pub mod alg;
pub mod config;
pub mod cpl;
pub mod errors;
mod gcp;
mod geo_transform;
pub mod linalg;
mod test_utils;
mod utils;
pub mod vector;

pub use alg::homography::{
    gcps_to_homography, geo_transform_to_homography, Homography, HomographyEx,
};
pub use alg::transform::{HomographyTransformer, TransformDirection};
pub use gcp::Gcp;
pub use geo_transform::{gcps_to_geo_transform, GeoTransform, GeoTransformEx};
pub use linalg::{linear_system_solve, Matrix};
