use std::sync::Arc;

use geo_types::Coord;

use crate::alg::homography::{gcps_to_homography, Homography, HomographyEx};
use crate::errors::{GdalError, Result};
use crate::gcp::Gcp;
use crate::utils::{_format_g17, _parse_f64_list};

/// Direction of a [`HomographyTransformer`] mapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransformDirection {
    /// Pixel/line to georeferenced coordinates.
    Forward,
    /// Georeferenced to pixel/line coordinates.
    Reverse,
}

/// Transformer used to map between pixel/line and georeferenced coordinates
/// with a homography.
///
/// Both directions are computed up front and never change afterwards, so a
/// transformer can be shared across threads with [`into_shared`](Self::into_shared).
#[derive(Debug, Clone, PartialEq)]
pub struct HomographyTransformer {
    forward: Homography,
    reverse: Homography,
}

impl HomographyTransformer {
    /// Constructs a `HomographyTransformer` from forward coefficients.
    ///
    /// Fails if `forward` can't be inverted.
    pub fn new(forward: Homography) -> Result<Self> {
        let reverse = forward.invert()?;
        Ok(HomographyTransformer { forward, reverse })
    }

    /// Constructs a GCP based `HomographyTransformer`.
    ///
    /// # Arguments
    ///
    /// * `gcps` - Ground Control Points to fit the homography to. Fewer than
    ///   four points give an affine model.
    pub fn from_gcps(gcps: &[Gcp]) -> Result<Self> {
        Self::new(gcps_to_homography(gcps)?)
    }

    pub fn forward(&self) -> &Homography {
        &self.forward
    }

    pub fn reverse(&self) -> &Homography {
        &self.reverse
    }

    fn coefficients(&self, direction: TransformDirection) -> &Homography {
        match direction {
            TransformDirection::Forward => &self.forward,
            TransformDirection::Reverse => &self.reverse,
        }
    }

    /// Transform points in place.
    ///
    /// Returns one success flag per point. Points that fail to transform keep
    /// their input value, `z` is never modified.
    ///
    /// # Panic
    /// Will panic if `x`, `y` and `z` don't have the same length.
    pub fn transform(
        &self,
        direction: TransformDirection,
        x: &mut [f64],
        y: &mut [f64],
        z: &mut [f64],
    ) -> Vec<bool> {
        assert_eq!(x.len(), y.len(), "x and y must have the same length");
        assert_eq!(x.len(), z.len(), "x and z must have the same length");

        let h = self.coefficients(direction);
        x.iter_mut()
            .zip(y.iter_mut())
            .map(|(x, y)| match h.apply(*x, *y) {
                Ok((tx, ty)) => {
                    *x = tx;
                    *y = ty;
                    true
                }
                Err(_) => false,
            })
            .collect()
    }

    /// Transform a single 2D point, `None` if it maps to infinity.
    pub fn transform_point(
        &self,
        direction: TransformDirection,
        x: f64,
        y: f64,
    ) -> Option<(f64, f64)> {
        self.coefficients(direction).apply(x, y).ok()
    }

    /// Transform a [`Coord`].
    pub fn transform_coord(
        &self,
        direction: TransformDirection,
        coord: Coord<f64>,
    ) -> Result<Coord<f64>> {
        let (x, y) = self.coefficients(direction).apply(coord.x, coord.y)?;
        Ok(Coord { x, y })
    }

    /// Move `self` behind an atomically reference counted pointer, for read
    /// only use from several threads.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The forward coefficients as nine comma separated numbers that
    /// round-trip exactly.
    pub fn to_coefficient_string(&self) -> String {
        self.forward
            .iter()
            .map(|v| _format_g17(*v))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Rebuild a transformer from the output of
    /// [`to_coefficient_string`](Self::to_coefficient_string).
    pub fn from_coefficient_string(s: &str) -> Result<Self> {
        let forward: Homography = _parse_f64_list::<9>(s).map_err(|err| match err {
            GdalError::ParseFloat(err) => {
                GdalError::BadArgument(format!("Invalid homography coefficient: {err}"))
            }
            err => err,
        })?;
        Self::new(forward)
    }
}
