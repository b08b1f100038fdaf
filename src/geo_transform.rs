use crate::config;
use crate::errors::{GdalError, Result};
use crate::gcp::{Gcp, GcpExtent};

/// An affine transform.
///
/// A six-element array storing the coefficients of an [affine transform]
/// used in mapping coordinates between pixel/line `(P, L)` (raster) space,
/// and `(Xp,Yp)` (georeferenced) space.
///
/// # Interpretation
///
/// A `GeoTransform`'s components have the following meanings:
///
///   * `GeoTransform[0]`: x-coordinate of the upper-left corner of the upper-left pixel.
///   * `GeoTransform[1]`: W-E pixel resolution (pixel width).
///   * `GeoTransform[2]`: row rotation (typically zero).
///   * `GeoTransform[3]`: y-coordinate of the upper-left corner of the upper-left pixel.
///   * `GeoTransform[4]`: column rotation (typically zero).
///   * `GeoTransform[5]`: N-S pixel resolution (pixel height), negative value for a North-up image.
///
/// ## Note
///
/// Care with coefficient ordering is required when constructing an [affine transform matrix] from
/// a `GeoTransform`. If a 3x3 transform matrix is defined as:
///
/// ```text
/// | a b c |
/// | d e f |
/// | 0 0 1 |
/// ```
///
/// The corresponding `GeoTransform` ordering is:
///
/// ```text
/// [c, a, b, f, d, e]
/// ```
///
/// # Usage
///  *  [`apply`](GeoTransformEx::apply): perform a `(P,L) -> (Xp,Yp)` transformation
///  *  [`invert`](GeoTransformEx::invert):  construct the inverse transformation coefficients
///     for computing `(Xp,Yp) -> (P,L)` transformations
///  *  [`compose`](GeoTransformEx::compose): chain two transformations
///
/// # Example
///
/// ```rust
/// # fn main() -> gdal_georef::errors::Result<()> {
/// use gdal_georef::{GeoTransform, GeoTransformEx};
/// let transform: GeoTransform = [768269.0, 1.0, 0.0, 4057292.0, 0.0, -1.0];
/// let (x, y) = transform.apply(0.0, 0.0);
/// assert_eq!((x, y), (768269.0, 4057292.0));
/// let inverse = transform.invert()?;
/// let (p, l) = inverse.apply(x, y);
/// assert_eq!((p, l), (0.0, 0.0));
/// # Ok(())
/// # }
/// ```
///
/// [affine transform]: https://en.wikipedia.org/wiki/Affine_transformation
/// [affine transform matrix]: https://en.wikipedia.org/wiki/Transformation_matrix#Affine_transformations
pub type GeoTransform = [f64; 6];

/// Extension methods on [`GeoTransform`]
pub trait GeoTransformEx {
    /// Apply GeoTransform to x/y coordinate.
    fn apply(&self, pixel: f64, line: f64) -> (f64, f64);

    /// Invert a [`GeoTransform`].
    ///
    /// Fails when the determinant is negligible relative to the magnitude of
    /// the linear coefficients.
    fn invert(&self) -> Result<GeoTransform>;

    /// The transform equivalent to applying `self` and then `other`.
    fn compose(&self, other: &GeoTransform) -> GeoTransform;
}

impl GeoTransformEx for GeoTransform {
    fn apply(&self, pixel: f64, line: f64) -> (f64, f64) {
        (
            self[0] + pixel * self[1] + line * self[2],
            self[3] + pixel * self[4] + line * self[5],
        )
    }

    fn invert(&self) -> Result<GeoTransform> {
        let gt = self;

        // no rotation: skip the determinant and its rounding
        if gt[2] == 0.0 && gt[4] == 0.0 && gt[1] != 0.0 && gt[5] != 0.0 {
            return Ok([
                -gt[0] / gt[1],
                1.0 / gt[1],
                0.0,
                -gt[3] / gt[5],
                0.0,
                1.0 / gt[5],
            ]);
        }

        let det = gt[1] * gt[5] - gt[2] * gt[4];
        let magnitude = gt[1]
            .abs()
            .max(gt[2].abs())
            .max(gt[4].abs().max(gt[5].abs()));
        if det.abs() <= 1e-10 * magnitude * magnitude {
            return Err(GdalError::NotInvertible(
                "Geo transform is uninvertible".to_string(),
            ));
        }

        let inv_det = 1.0 / det;
        Ok([
            (gt[2] * gt[3] - gt[0] * gt[5]) * inv_det,
            gt[5] * inv_det,
            -gt[2] * inv_det,
            (-gt[1] * gt[3] + gt[0] * gt[4]) * inv_det,
            -gt[4] * inv_det,
            gt[1] * inv_det,
        ])
    }

    fn compose(&self, other: &GeoTransform) -> GeoTransform {
        let (gt1, gt2) = (self, other);
        // Written out from the 3x3 form
        //
        //  | gt[1]   gt[2]   gt[0] |
        //  | gt[4]   gt[5]   gt[3] |
        //  |  0.0     0.0     1.0  |
        [
            gt2[1] * gt1[0] + gt2[2] * gt1[3] + gt2[0],
            gt2[1] * gt1[1] + gt2[2] * gt1[4],
            gt2[1] * gt1[2] + gt2[2] * gt1[5],
            gt2[4] * gt1[0] + gt2[5] * gt1[3] + gt2[3],
            gt2[4] * gt1[1] + gt2[5] * gt1[4],
            gt2[4] * gt1[2] + gt2[5] * gt1[5],
        ]
    }
}

/// Affine transform mapping `[min_x, max_x] x [min_y, max_y]` onto the unit square.
fn normalization(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> GeoTransform {
    [
        -min_x / (max_x - min_x),
        1.0 / (max_x - min_x),
        0.0,
        -min_y / (max_y - min_y),
        0.0,
        1.0 / (max_y - min_y),
    ]
}

fn degenerate(msg: &str) -> GdalError {
    GdalError::DegenerateGeometry {
        method_name: "gcps_to_geo_transform",
        msg: msg.to_string(),
    }
}

/// Fit a first order (affine) transform to a set of GCPs.
///
/// Two GCPs give a non-rotated scale and offset, four GCPs lying on the
/// corners of a non-rotated image in top-left, top-right, bottom-right,
/// bottom-left order are solved exactly, and any other set is fitted by least
/// squares on normalized coordinates.
///
/// Unless `approx_ok` is set (or the `GDAL_GCPS_TO_GEOTRANSFORM_APPROX_OK`
/// configuration option is), the fit is rejected if any GCP lies further than
/// `GDAL_GCPS_TO_GEOTRANSFORM_APPROX_THRESHOLD` pixels (default 0.25) from it.
pub fn gcps_to_geo_transform(gcps: &[Gcp], approx_ok: bool) -> Result<GeoTransform> {
    let mut approx_ok = approx_ok;
    let mut pixel_threshold = 0.25;
    if !approx_ok {
        approx_ok = config::get_config_bool("GDAL_GCPS_TO_GEOTRANSFORM_APPROX_OK", false)?;
        if !approx_ok {
            pixel_threshold = config::get_config_option(
                "GDAL_GCPS_TO_GEOTRANSFORM_APPROX_THRESHOLD",
                "0.25",
            )?
            .trim()
            .parse()?;
        }
    }

    if gcps.len() < 2 {
        return Err(degenerate("at least two GCPs are required"));
    }

    if gcps.len() == 2 {
        let (a, b) = (&gcps[0], &gcps[1]);
        if b.pixel == a.pixel || b.line == a.line {
            return Err(degenerate("GCPs share a pixel or line coordinate"));
        }
        let x_scale = (b.x - a.x) / (b.pixel - a.pixel);
        let y_scale = (b.y - a.y) / (b.line - a.line);
        return Ok([
            a.x - a.pixel * x_scale,
            x_scale,
            0.0,
            a.y - a.line * y_scale,
            0.0,
            y_scale,
        ]);
    }

    if let Some(gt) = corner_geo_transform(gcps) {
        return Ok(gt);
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

    // Least squares on Sum[(A + B*x + C*y - X)^2] and its Y counterpart
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    let mut sum_lon = 0.0;
    let mut sum_lonx = 0.0;
    let mut sum_lony = 0.0;
    let mut sum_lat = 0.0;
    let mut sum_latx = 0.0;
    let mut sum_laty = 0.0;

    for gcp in gcps {
        let (pixel, line) = pl_normalize.apply(gcp.pixel, gcp.line);
        let (geo_x, geo_y) = geo_normalize.apply(gcp.x, gcp.y);

        sum_x += pixel;
        sum_y += line;
        sum_xy += pixel * line;
        sum_xx += pixel * pixel;
        sum_yy += line * line;
        sum_lon += geo_x;
        sum_lonx += geo_x * pixel;
        sum_lony += geo_x * line;
        sum_lat += geo_y;
        sum_latx += geo_y * pixel;
        sum_laty += geo_y * line;
    }

    let n = gcps.len() as f64;
    let divisor = n * (sum_xx * sum_yy - sum_xy * sum_xy) + 2.0 * sum_x * sum_y * sum_xy
        - sum_y * sum_y * sum_xx
        - sum_x * sum_x * sum_yy;
    if divisor == 0.0 {
        return Err(degenerate("GCPs are colinear"));
    }

    let gt_normalized: GeoTransform = [
        (sum_lon * (sum_xx * sum_yy - sum_xy * sum_xy)
            + sum_lonx * (sum_y * sum_xy - sum_x * sum_yy)
            + sum_lony * (sum_x * sum_xy - sum_y * sum_xx))
            / divisor,
        (sum_lon * (sum_y * sum_xy - sum_x * sum_yy)
            + sum_lonx * (n * sum_yy - sum_y * sum_y)
            + sum_lony * (sum_x * sum_y - sum_xy * n))
            / divisor,
        (sum_lon * (sum_x * sum_xy - sum_y * sum_xx)
            + sum_lonx * (sum_x * sum_y - n * sum_xy)
            + sum_lony * (n * sum_xx - sum_x * sum_x))
            / divisor,
        (sum_lat * (sum_xx * sum_yy - sum_xy * sum_xy)
            + sum_latx * (sum_y * sum_xy - sum_x * sum_yy)
            + sum_laty * (sum_x * sum_xy - sum_y * sum_xx))
            / divisor,
        (sum_lat * (sum_y * sum_xy - sum_x * sum_yy)
            + sum_latx * (n * sum_yy - sum_y * sum_y)
            + sum_laty * (sum_x * sum_y - sum_xy * n))
            / divisor,
        (sum_lat * (sum_x * sum_xy - sum_y * sum_xx)
            + sum_latx * (sum_x * sum_y - n * sum_xy)
            + sum_laty * (n * sum_xx - sum_x * sum_x))
            / divisor,
    ];

    let inv_geo_normalize = geo_normalize.invert()?;
    let gt = pl_normalize
        .compose(&gt_normalized)
        .compose(&inv_geo_normalize);

    if !approx_ok {
        let pixel_size = 0.5 * (gt[1].abs() + gt[2].abs() + gt[4].abs() + gt[5].abs());
        if pixel_size == 0.0 {
            log::debug!("gcps_to_geo_transform: pixel size = 0");
            return Err(degenerate("zero pixel size"));
        }
        for gcp in gcps {
            let (x, y) = gt.apply(gcp.pixel, gcp.line);
            let (error_x, error_y) = ((x - gcp.x).abs(), (y - gcp.y).abs());
            if error_x > pixel_threshold * pixel_size || error_y > pixel_threshold * pixel_size {
                log::debug!(
                    "gcps_to_geo_transform: error_x/pixel_size = {:.2}, error_y/pixel_size = {:.2}",
                    error_x / pixel_size,
                    error_y / pixel_size
                );
                return Err(degenerate("GCPs do not fit an affine transform"));
            }
        }
    }

    Ok(gt)
}

/// Exact transform for the four corners of a non-rotated image given in
/// TL-TR-BR-BL order, which avoids the imprecision of the general fit.
fn corner_geo_transform(gcps: &[Gcp]) -> Option<GeoTransform> {
    let [tl, tr, br, bl] = gcps else {
        return None;
    };
    let is_corner_set = tl.line == tr.line
        && br.line == bl.line
        && tl.pixel == bl.pixel
        && tr.pixel == br.pixel
        && tl.line != br.line
        && tl.pixel != tr.pixel
        && tl.y == tr.y
        && br.y == bl.y
        && tl.x == bl.x
        && tr.x == br.x
        && tl.y != br.y
        && tl.x != tr.x;
    if !is_corner_set {
        return None;
    }

    let x_scale = (tr.x - tl.x) / (tr.pixel - tl.pixel);
    let y_scale = (br.y - tr.y) / (br.line - tr.line);
    Some([
        tl.x - tl.pixel * x_scale,
        x_scale,
        0.0,
        tl.y - tl.line * y_scale,
        0.0,
        y_scale,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_near;

    #[test]
    fn test_apply_and_invert() {
        let gt: GeoTransform = [100.0, 2.0, 0.5, 50.0, -0.25, -3.0];
        let inv = gt.invert().unwrap();
        let (x, y) = gt.apply(12.0, 7.0);
        let (p, l) = inv.apply(x, y);
        assert_near!(p, 12.0, epsilon = 1e-9);
        assert_near!(l, 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invert_no_rotation() {
        let gt: GeoTransform = [10.0, 2.0, 0.0, 20.0, 0.0, -4.0];
        assert_eq!(gt.invert().unwrap(), [-5.0, 0.5, 0.0, 5.0, 0.0, -0.25]);
    }

    #[test]
    fn test_invert_singular() {
        let gt: GeoTransform = [0.0, 1.0, 2.0, 0.0, 2.0, 4.0];
        assert!(matches!(gt.invert(), Err(GdalError::NotInvertible(_))));
    }

    #[test]
    fn test_compose() {
        let scale: GeoTransform = [0.0, 2.0, 0.0, 0.0, 0.0, 3.0];
        let shift: GeoTransform = [10.0, 1.0, 0.0, 20.0, 0.0, 1.0];
        // scale first, then shift
        let gt = scale.compose(&shift);
        assert_eq!(gt.apply(1.0, 1.0), (12.0, 23.0));
        assert_eq!(gt, [10.0, 2.0, 0.0, 20.0, 0.0, 3.0]);
        let back = gt.compose(&gt.invert().unwrap());
        for (value, expected) in back.iter().zip([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]) {
            assert_near!(*value, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_two_gcps() {
        let gcps = vec![
            Gcp::new(0.0, 0.0, 100.0, 200.0),
            Gcp::new(10.0, 20.0, 120.0, 160.0),
        ];
        let gt = gcps_to_geo_transform(&gcps, false).unwrap();
        assert_eq!(gt, [100.0, 2.0, 0.0, 200.0, 0.0, -2.0]);
    }

    #[test]
    fn test_corner_gcps() {
        let gcps = vec![
            Gcp::new(0.0, 0.0, 440720.0, 3751320.0),
            Gcp::new(20.0, 0.0, 441920.0, 3751320.0),
            Gcp::new(20.0, 20.0, 441920.0, 3750120.0),
            Gcp::new(0.0, 20.0, 440720.0, 3750120.0),
        ];
        let gt = gcps_to_geo_transform(&gcps, false).unwrap();
        assert_eq!(gt, [440720.0, 60.0, 0.0, 3751320.0, 0.0, -60.0]);
    }

    #[test]
    fn test_least_squares_rotated() {
        let expected: GeoTransform = [1000.0, 0.8, -0.6, 2000.0, 0.6, 0.8];
        let gcps: Vec<Gcp> = [(0.0, 0.0), (50.0, 3.0), (12.0, 40.0), (70.0, 90.0), (5.0, 77.0)]
            .into_iter()
            .map(|(p, l)| {
                let (x, y) = expected.apply(p, l);
                Gcp::new(p, l, x, y)
            })
            .collect();
        let gt = gcps_to_geo_transform(&gcps, false).unwrap();
        for (value, expected) in gt.iter().zip(expected) {
            assert_near!(*value, expected, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_poor_fit_rejected() {
        let gcps = vec![
            Gcp::new(0.0, 0.0, 0.0, 0.0),
            Gcp::new(10.0, 0.0, 10.0, 0.0),
            Gcp::new(10.0, 10.0, 15.0, 14.0),
            Gcp::new(0.0, 10.0, 0.0, 10.0),
        ];
        assert!(gcps_to_geo_transform(&gcps, false).is_err());
        assert!(gcps_to_geo_transform(&gcps, true).is_ok());
    }

    #[test]
    fn test_too_few_or_degenerate() {
        assert!(gcps_to_geo_transform(&[Gcp::new(0.0, 0.0, 1.0, 1.0)], true).is_err());
        let colinear = vec![
            Gcp::new(0.0, 0.0, 0.0, 0.0),
            Gcp::new(0.0, 5.0, 1.0, 1.0),
            Gcp::new(0.0, 9.0, 2.0, 3.0),
        ];
        assert!(matches!(
            gcps_to_geo_transform(&colinear, true),
            Err(GdalError::DegenerateGeometry { .. })
        ));
    }
}
