//! Projective transforms between pixel/line and georeferenced space.

use crate::errors::{GdalError, Result};
use crate::gcp::{Gcp, GcpExtent};
use crate::geo_transform::{gcps_to_geo_transform, GeoTransform};
use crate::linalg::{linear_system_solve, Matrix};

/// A projective transform.
///
/// A nine-element array storing the coefficients of a [homography] mapping
/// pixel/line `(P, L)` (raster) space to `(Xp, Yp)` (georeferenced) space:
///
/// ```text
/// Xp = (H[0] + P * H[1] + L * H[2]) / (H[6] + P * H[7] + L * H[8])
/// Yp = (H[3] + P * H[4] + L * H[5]) / (H[6] + P * H[7] + L * H[8])
/// ```
///
/// The first six coefficients follow the [`GeoTransform`] layout, so an affine
/// transform `gt` is the homography `[gt[0], .., gt[5], 1.0, 0.0, 0.0]`.
///
/// # Example
///
/// ```rust
/// # fn main() -> gdal_georef::errors::Result<()> {
/// use gdal_georef::{Homography, HomographyEx};
/// let h: Homography = [10.0, 1.0, 0.0, 20.0, 0.0, 1.0, 1.0, 0.0, 0.0];
/// assert_eq!(h.apply(5.0, 5.0)?, (15.0, 25.0));
/// assert_eq!(h.invert()?.apply(15.0, 25.0)?, (5.0, 5.0));
/// # Ok(())
/// # }
/// ```
///
/// [homography]: https://en.wikipedia.org/wiki/Homography_(computer_vision)
pub type Homography = [f64; 9];

/// Homogeneous denominators below this magnitude map to infinity.
const INFINITY_EPSILON: f64 = 1e-15;

/// Extension methods on [`Homography`]
pub trait HomographyEx {
    /// Apply the homography to a pixel/line coordinate.
    ///
    /// Fails with [`GdalError::PointAtInfinity`] when the point lies on the
    /// line sent to infinity.
    fn apply(&self, pixel: f64, line: f64) -> Result<(f64, f64)>;

    /// Invert a [`Homography`].
    ///
    /// Fails when the determinant is negligible relative to the magnitude of
    /// the linear coefficients.
    fn invert(&self) -> Result<Homography>;

    /// The homography equivalent to applying `self` and then `other`.
    fn compose(&self, other: &Homography) -> Homography;
}

impl HomographyEx for Homography {
    fn apply(&self, pixel: f64, line: f64) -> Result<(f64, f64)> {
        let h = self;
        let w = h[6] + pixel * h[7] + line * h[8];
        if w.abs() < INFINITY_EPSILON {
            return Err(GdalError::PointAtInfinity { x: pixel, y: line });
        }
        Ok((
            (h[0] + pixel * h[1] + line * h[2]) / w,
            (h[3] + pixel * h[4] + line * h[5]) / w,
        ))
    }

    fn invert(&self) -> Result<Homography> {
        let h = self;

        // scale and offset only
        if h[2] == 0.0
            && h[4] == 0.0
            && h[7] == 0.0
            && h[8] == 0.0
            && h[1] != 0.0
            && h[5] != 0.0
            && h[6] != 0.0
        {
            return Ok([
                -h[0] / h[1],
                h[6] / h[1],
                0.0,
                -h[3] / h[5],
                0.0,
                h[6] / h[5],
                1.0,
                0.0,
                0.0,
            ]);
        }

        let det = h[1] * h[5] * h[6] - h[2] * h[4] * h[6] + h[2] * h[3] * h[7]
            - h[0] * h[5] * h[7]
            + h[0] * h[4] * h[8]
            - h[1] * h[3] * h[8];
        let magnitude = h[1]
            .abs()
            .max(h[2].abs())
            .max(h[4].abs().max(h[5].abs()));
        if det.abs() <= 1e-10 * magnitude * magnitude {
            return Err(GdalError::NotInvertible(
                "Homography is uninvertible".to_string(),
            ));
        }

        let inv_det = 1.0 / det;
        // Adjugate of the 3x3 form
        //
        //  | h[6]  h[7]  h[8] |
        //  | h[0]  h[1]  h[2] |
        //  | h[3]  h[4]  h[5] |
        //
        // written back in the flat layout.
        Ok([
            (h[2] * h[3] - h[0] * h[5]) * inv_det,
            (h[6] * h[5] - h[8] * h[3]) * inv_det,
            (h[8] * h[0] - h[6] * h[2]) * inv_det,
            (h[0] * h[4] - h[1] * h[3]) * inv_det,
            (h[7] * h[3] - h[6] * h[4]) * inv_det,
            (h[6] * h[1] - h[7] * h[0]) * inv_det,
            (h[1] * h[5] - h[2] * h[4]) * inv_det,
            (h[8] * h[4] - h[7] * h[5]) * inv_det,
            (h[7] * h[2] - h[8] * h[1]) * inv_det,
        ])
    }

    fn compose(&self, other: &Homography) -> Homography {
        let (h1, h2) = (self, other);
        [
            h2[0] * h1[6] + h2[1] * h1[0] + h2[2] * h1[3],
            h2[0] * h1[7] + h2[1] * h1[1] + h2[2] * h1[4],
            h2[0] * h1[8] + h2[1] * h1[2] + h2[2] * h1[5],
            h2[3] * h1[6] + h2[4] * h1[0] + h2[5] * h1[3],
            h2[3] * h1[7] + h2[4] * h1[1] + h2[5] * h1[4],
            h2[3] * h1[8] + h2[4] * h1[2] + h2[5] * h1[5],
            h2[6] * h1[6] + h2[7] * h1[0] + h2[8] * h1[3],
            h2[6] * h1[7] + h2[7] * h1[1] + h2[8] * h1[4],
            h2[6] * h1[8] + h2[7] * h1[2] + h2[8] * h1[5],
        ]
    }
}

/// The homography performing the same mapping as `gt`.
pub fn geo_transform_to_homography(gt: &GeoTransform) -> Homography {
    [gt[0], gt[1], gt[2], gt[3], gt[4], gt[5], 1.0, 0.0, 0.0]
}

/// Homography mapping `[min_x, max_x] x [min_y, max_y]` onto the unit square.
fn normalization(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Homography {
    [
        -min_x / (max_x - min_x),
        1.0 / (max_x - min_x),
        0.0,
        -min_y / (max_y - min_y),
        0.0,
        1.0 / (max_y - min_y),
        1.0,
        0.0,
        0.0,
    ]
}

fn degenerate(msg: &str) -> GdalError {
    GdalError::DegenerateGeometry {
        method_name: "gcps_to_homography",
        msg: msg.to_string(),
    }
}

/// Fit a homography to a set of GCPs.
///
/// With fewer than four GCPs the affine fit of [`gcps_to_geo_transform`] is
/// used instead, accepting approximate fits. Otherwise both coordinate spaces
/// are normalized to the unit square and the least squares solution is found
/// through the normal equations, with the gauge fixed by `H[6] = 1`.
///
/// The fit is rejected when the unit square of normalized pixel space does
/// not map to a convex quadrilateral.
pub fn gcps_to_homography(gcps: &[Gcp]) -> Result<Homography> {
    if gcps.len() < 4 {
        let gt = gcps_to_geo_transform(gcps, true)?;
        return Ok(geo_transform_to_homography(&gt));
    }

    let extent = GcpExtent::of(gcps).ok_or_else(|| degenerate("no GCPs"))?;
    if extent.is_degenerate() {
        return Err(degenerate("GCPs are degenerate in at least one dimension"));
    }

    let pl_normalize = normalization(
        extent.min_pixel,
        extent.max_pixel,
        extent.min_line,
        extent.max_line,
    );
    let geo_normalize = normalization(extent.min_x, extent.max_x, extent.min_y, extent.max_y);
    let inv_geo_normalize = geo_normalize.invert()?;

    let mut ata = Matrix::new(9, 9);
    let mut rhs = Matrix::new(9, 1);
    // the homogeneous system is rank 8: add h[6] = 1
    ata[(6, 6)] = 1.0;
    rhs[(6, 0)] = 1.0;

    for gcp in gcps {
        let (pixel, line) = pl_normalize.apply(gcp.pixel, gcp.line)?;
        let (geo_x, geo_y) = geo_normalize.apply(gcp.x, gcp.y)?;

        let ax = [
            1.0,
            pixel,
            line,
            0.0,
            0.0,
            0.0,
            -geo_x,
            -geo_x * pixel,
            -geo_x * line,
        ];
        let ay = [
            0.0,
            0.0,
            0.0,
            1.0,
            pixel,
            line,
            -geo_y,
            -geo_y * pixel,
            -geo_y * line,
        ];

        for j in 0..9 {
            for k in j..9 {
                ata[(j, k)] += ax[j] * ax[k] + ay[j] * ay[k];
            }
        }
    }
    for j in 0..9 {
        for k in 0..j {
            ata[(j, k)] = ata[(k, j)];
        }
    }

    let solution = linear_system_solve(&ata, &rhs)?;
    let mut h_normalized: Homography = [0.0; 9];
    h_normalized.copy_from_slice(solution.column(0));
    if h_normalized[6].abs() < INFINITY_EPSILON {
        log::debug!("gcps_to_homography: h[6] = {}", h_normalized[6]);
        return Err(degenerate("solution has a vanishing homogeneous term"));
    }

    if !maps_unit_square_to_convex(&h_normalized)? {
        log::debug!("gcps_to_homography: fitted homography is not convex");
        return Err(degenerate("fitted homography is not convex"));
    }

    Ok(pl_normalize
        .compose(&h_normalized)
        .compose(&inv_geo_normalize))
}

/// Whether the image of the unit square under `h` is a convex quadrilateral.
fn maps_unit_square_to_convex(h: &Homography) -> Result<bool> {
    let (x0, y0) = h.apply(0.0, 0.0)?;
    let (x1, y1) = h.apply(1.0, 0.0)?;
    let (x2, y2) = h.apply(1.0, 1.0)?;
    let (x3, y3) = h.apply(0.0, 1.0)?;

    let (v1x, v1y) = (x1 - x0, y1 - y0);
    let (v2x, v2y) = (x2 - x0, y2 - y0);
    let (v3x, v3y) = (x3 - x0, y3 - y0);

    let cross12 = v1x * v2y - v1y * v2x;
    let cross23 = v2x * v3y - v2y * v3x;
    Ok(cross12 * cross23 > 0.0)
}
