use geo_types::LineString;

use crate::config;
use crate::cpl;
use crate::errors::{CplErrType, GdalError, Result, CPLE_ILLEGAL_ARG, CPLE_NOT_SUPPORTED};
use crate::linalg::{linear_system_solve, Matrix};
use crate::vector::dxf::nurbs::{rational_basis, rbspline};
use crate::vector::dxf::DxfTriple;

/// Default value of the `DXF_MAX_BSPLINE_CONTROL_POINTS` configuration option.
pub const DEFAULT_MAX_CONTROL_POINTS: usize = 2000;

const SPLINE_DEGREE: usize = 3;

/// Curve points computed per control point.
const POINTS_PER_CONTROL_POINT: usize = 8;

/// Control points of the clamped B-spline of `degree` interpolating
/// `data_points` at `parameters`, with the given end tangents.
///
/// At least two data points are required. `knots` is the clamped knot vector
/// of the result, `data_points.len() + degree + 3` values. The result has two
/// more points than `data_points`.
///
/// Fails with [`GdalError::TooManyControlPoints`] when there are more data
/// points than the `DXF_MAX_BSPLINE_CONTROL_POINTS` configuration option
/// allows (default [`DEFAULT_MAX_CONTROL_POINTS`]), since the linear system
/// grows quadratically with them.
pub fn get_control_points(
    data_points: &[DxfTriple],
    parameters: &[f64],
    knots: &[f64],
    degree: usize,
    start_tangent: DxfTriple,
    end_tangent: DxfTriple,
) -> Result<Vec<DxfTriple>> {
    let n_points = data_points.len();
    if n_points < 2 || parameters.len() != n_points {
        return Err(GdalError::BadArgument(format!(
            "get_control_points: {} data points for {} parameters",
            n_points,
            parameters.len()
        )));
    }
    if degree == 0 || knots.len() != n_points + degree + 3 {
        return Err(GdalError::BadArgument(format!(
            "get_control_points: expected {} knots, got {}",
            n_points + degree + 3,
            knots.len()
        )));
    }

    let max = config::get_config_option(
        "DXF_MAX_BSPLINE_CONTROL_POINTS",
        &DEFAULT_MAX_CONTROL_POINTS.to_string(),
    )?;
    let max: usize = max.trim().parse().map_err(|_| {
        cpl::failure(
            CPLE_ILLEGAL_ARG,
            format!("Invalid DXF_MAX_BSPLINE_CONTROL_POINTS value '{max}'"),
        )
    })?;
    if n_points > max {
        cpl::report_error(
            CplErrType::Failure,
            CPLE_NOT_SUPPORTED,
            &format!(
                "Too many control points ({n_points}) for spline leader. \
                 Set DXF_MAX_BSPLINE_CONTROL_POINTS configuration option \
                 to a higher value to remove this limitation \
                 (at the cost of significant RAM consumption)"
            ),
        );
        return Err(GdalError::TooManyControlPoints {
            count: n_points,
            max,
        });
    }

    let n_unknowns = n_points + 2;
    let last = n_unknowns - 1;
    let weights = vec![1.0; n_unknowns];

    let mut a = Matrix::new(n_unknowns, n_unknowns);
    // end points, then end tangents
    a[(0, 0)] = 1.0;
    a[(last, last)] = 1.0;
    a[(1, 0)] = -1.0;
    a[(1, 1)] = 1.0;
    a[(last - 1, last - 1)] = -1.0;
    a[(last - 1, last)] = 1.0;
    for (i, parameter) in parameters.iter().enumerate().take(n_points - 1).skip(1) {
        let basis = rational_basis(degree + 1, *parameter, knots, &weights);
        for (col, value) in basis.iter().enumerate() {
            a[(i + 1, col)] = *value;
        }
    }

    let start_multiplier = knots[degree + 1] / degree as f64;
    let end_multiplier = (1.0 - knots[knots.len() - degree - 2]) / degree as f64;

    let mut rows = Vec::with_capacity(n_unknowns);
    rows.push(data_points[0]);
    rows.push(start_tangent * start_multiplier);
    rows.extend_from_slice(&data_points[1..n_points - 1]);
    rows.push(end_tangent * end_multiplier);
    rows.push(data_points[n_points - 1]);

    let mut b = Matrix::new(n_unknowns, 3);
    for (row, point) in rows.iter().enumerate() {
        b[(row, 0)] = point.x;
        b[(row, 1)] = point.y;
        b[(row, 2)] = point.z;
    }

    let x = linear_system_solve(&a, &b)?;
    Ok((0..n_unknowns)
        .map(|row| DxfTriple::new(x[(row, 0)], x[(row, 1)], x[(row, 2)]))
        .collect())
}

/// The vertices of a LEADER entity path.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderLine {
    points: Vec<DxfTriple>,
    is_3d: bool,
}

impl LeaderLine {
    /// Create a leader path. When `is_3d` is false the `z` values are
    /// ignored.
    pub fn new(points: Vec<DxfTriple>, is_3d: bool) -> Self {
        let mut line = LeaderLine { points, is_3d };
        if !is_3d {
            line.flatten_to_2d();
        }
        line
    }

    pub fn points(&self) -> &[DxfTriple] {
        &self.points
    }

    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    fn flatten_to_2d(&mut self) {
        for point in &mut self.points {
            point.z = 0.0;
        }
    }

    /// Replace the vertices with a clamped cubic spline passing through them.
    ///
    /// The spline leaves the first vertex along the first segment and
    /// reaches the last vertex along `end_tangent_direction`, or along the
    /// last segment when that is zero.
    ///
    /// Returns `Ok(false)` and leaves the line untouched when the vertices
    /// can't define a spline: fewer than two distinct vertices, or segment
    /// lengths too disparate to be told apart. Errors also leave the line
    /// untouched.
    pub fn interpolate_spline(&mut self, end_tangent_direction: DxfTriple) -> Result<bool> {
        let mut data_points: Vec<DxfTriple> = Vec::with_capacity(self.points.len());
        for point in &self.points {
            if data_points.last() != Some(point) {
                data_points.push(*point);
            }
        }
        let n_points = data_points.len();
        if n_points < 2 {
            return Ok(false);
        }

        // chord length parameterization
        let mut parameters = Vec::with_capacity(n_points);
        parameters.push(0.0);
        for (i, pair) in data_points.windows(2).enumerate() {
            let parameter = parameters[i] + (pair[1] - pair[0]).length();
            if parameter == parameters[i] {
                log::debug!("interpolate_spline: segment {i} vanishes next to the others");
                return Ok(false);
            }
            parameters.push(parameter);
        }
        let total_length = parameters[n_points - 1];
        for parameter in parameters.iter_mut() {
            *parameter /= total_length;
        }
        parameters[n_points - 1] = 1.0;

        let mut knots = vec![0.0; SPLINE_DEGREE + 1];
        knots.extend_from_slice(&parameters[1..n_points - 1]);
        knots.extend(std::iter::repeat(1.0).take(SPLINE_DEGREE + 1));

        let mut start_tangent = data_points[1] - data_points[0];
        start_tangent.normalize();
        start_tangent *= total_length;

        let mut end_tangent = if end_tangent_direction.is_zero() {
            data_points[n_points - 1] - data_points[n_points - 2]
        } else {
            end_tangent_direction
        };
        end_tangent.normalize();
        end_tangent *= total_length;

        let control_points = get_control_points(
            &data_points,
            &parameters,
            &knots,
            SPLINE_DEGREE,
            start_tangent,
            end_tangent,
        )?;

        let weights = vec![1.0; control_points.len()];
        self.points = rbspline(
            &control_points,
            &weights,
            SPLINE_DEGREE + 1,
            Some(&knots),
            control_points.len() * POINTS_PER_CONTROL_POINT,
        )?;
        if !self.is_3d {
            self.flatten_to_2d();
        }
        Ok(true)
    }

    /// The path as a 2D line string.
    pub fn to_line_string(&self) -> LineString<f64> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }
}

impl From<&LeaderLine> for LineString<f64> {
    fn from(line: &LeaderLine) -> Self {
        line.to_line_string()
    }
}

impl From<LineString<f64>> for LeaderLine {
    fn from(line: LineString<f64>) -> Self {
        LeaderLine::new(line.0.into_iter().map(DxfTriple::from).collect(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_near;
    use crate::cpl::QuietErrorScope;
    use crate::test_utils::ThreadLocalConfigOption;

    fn line_2d(points: &[(f64, f64)]) -> LeaderLine {
        LeaderLine::new(
            points
                .iter()
                .map(|&(x, y)| DxfTriple::new(x, y, 0.0))
                .collect(),
            false,
        )
    }

    fn assert_triple_near(actual: DxfTriple, expected: DxfTriple) {
        assert_near!(actual.x, expected.x, epsilon = 1e-9);
        assert_near!(actual.y, expected.y, epsilon = 1e-9);
        assert_near!(actual.z, expected.z, epsilon = 1e-9);
    }

    #[test]
    fn test_endpoints_interpolated() {
        let mut line = line_2d(&[(0.0, 0.0), (10.0, 5.0), (20.0, -3.0), (35.0, 2.0)]);
        assert!(line.interpolate_spline(DxfTriple::default()).unwrap());
        // 4 data points, 6 control points
        assert_eq!(line.points().len(), 48);
        assert_triple_near(line.points()[0], DxfTriple::new(0.0, 0.0, 0.0));
        assert_triple_near(line.points()[47], DxfTriple::new(35.0, 2.0, 0.0));
    }

    #[test]
    fn test_duplicate_vertices_ignored() {
        let mut line = line_2d(&[(0.0, 0.0), (10.0, 5.0), (20.0, -3.0), (35.0, 2.0)]);
        let mut with_duplicate = line_2d(&[
            (0.0, 0.0),
            (10.0, 5.0),
            (10.0, 5.0),
            (20.0, -3.0),
            (35.0, 2.0),
        ]);
        line.interpolate_spline(DxfTriple::default()).unwrap();
        with_duplicate
            .interpolate_spline(DxfTriple::default())
            .unwrap();
        assert_eq!(line, with_duplicate);
    }

    #[test]
    fn test_control_points_interpolate_data() {
        let data_points = [
            DxfTriple::new(0.0, 0.0, 0.0),
            DxfTriple::new(10.0, 5.0, 0.0),
            DxfTriple::new(20.0, -3.0, 0.0),
            DxfTriple::new(35.0, 2.0, 0.0),
        ];
        let total: f64 = data_points.windows(2).map(|p| (p[1] - p[0]).length()).sum();
        let parameters = [
            0.0,
            (data_points[1] - data_points[0]).length() / total,
            ((data_points[1] - data_points[0]).length()
                + (data_points[2] - data_points[1]).length())
                / total,
            1.0,
        ];
        let knots = [
            0.0,
            0.0,
            0.0,
            0.0,
            parameters[1],
            parameters[2],
            1.0,
            1.0,
            1.0,
            1.0,
        ];
        let mut start_tangent = data_points[1] - data_points[0];
        start_tangent.normalize();
        let mut end_tangent = data_points[3] - data_points[2];
        end_tangent.normalize();

        let control_points = get_control_points(
            &data_points,
            &parameters,
            &knots,
            3,
            start_tangent * total,
            end_tangent * total,
        )
        .unwrap();
        assert_eq!(control_points.len(), 6);

        for (data_point, parameter) in data_points.iter().zip(parameters) {
            let basis = rational_basis(4, parameter, &knots, &[1.0; 6]);
            let on_curve = basis
                .iter()
                .zip(&control_points)
                .fold(DxfTriple::default(), |acc, (b, p)| acc + *p * *b);
            assert_triple_near(on_curve, *data_point);
        }
    }

    #[test]
    fn test_single_segment_is_bezier() {
        let data_points = [DxfTriple::new(0.0, 0.0, 0.0), DxfTriple::new(3.0, 4.0, 0.0)];
        let tangent = data_points[1] - data_points[0];
        let knots = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let control_points =
            get_control_points(&data_points, &[0.0, 1.0], &knots, 3, tangent, tangent).unwrap();
        let expected = [
            DxfTriple::new(0.0, 0.0, 0.0),
            DxfTriple::new(1.0, 4.0 / 3.0, 0.0),
            DxfTriple::new(2.0, 8.0 / 3.0, 0.0),
            DxfTriple::new(3.0, 4.0, 0.0),
        ];
        for (actual, expected) in control_points.iter().zip(expected) {
            assert_triple_near(*actual, expected);
        }
    }

    #[test]
    fn test_control_points_bad_arguments() {
        let point = DxfTriple::new(1.0, 2.0, 0.0);
        let knots = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        assert!(matches!(
            get_control_points(&[point], &[0.0], &knots, 3, point, point),
            Err(GdalError::BadArgument(_))
        ));
        let knots = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        assert!(matches!(
            get_control_points(&[point, point * 2.0], &[0.0, 1.0], &knots, 3, point, point),
            Err(GdalError::BadArgument(_))
        ));
    }

    #[test]
    fn test_straight_line_stays_straight() {
        let mut line = line_2d(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        assert!(line.interpolate_spline(DxfTriple::default()).unwrap());
        let points = line.points();
        assert!(points.iter().all(|p| p.y == 0.0));
        assert!(points.windows(2).all(|p| p[1].x >= p[0].x));
        assert_triple_near(points[points.len() - 1], DxfTriple::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_3d_preserved() {
        let mut line = LeaderLine::new(
            vec![
                DxfTriple::new(0.0, 0.0, 1.0),
                DxfTriple::new(5.0, 0.0, 2.0),
                DxfTriple::new(5.0, 5.0, 3.0),
            ],
            true,
        );
        assert!(line.interpolate_spline(DxfTriple::new(0.0, 1.0, 0.0)).unwrap());
        assert!(line.is_3d());
        assert_eq!(line.points().len(), 40);
        assert_triple_near(line.points()[0], DxfTriple::new(0.0, 0.0, 1.0));
        assert_triple_near(line.points()[39], DxfTriple::new(5.0, 5.0, 3.0));
    }

    #[test]
    fn test_2d_is_flattened() {
        let mut line = LeaderLine::new(
            vec![
                DxfTriple::new(0.0, 0.0, 1.0),
                DxfTriple::new(5.0, 0.0, 2.0),
                DxfTriple::new(5.0, 5.0, 3.0),
            ],
            false,
        );
        assert!(line.points().iter().all(|p| p.z == 0.0));
        line.interpolate_spline(DxfTriple::default()).unwrap();
        assert!(line.points().iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn test_degenerate_lines_untouched() {
        let mut single = line_2d(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]);
        let before = single.clone();
        assert!(!single.interpolate_spline(DxfTriple::default()).unwrap());
        assert_eq!(single, before);

        let mut disparate = line_2d(&[(0.0, 0.0), (1e17, 0.0), (1e17, 1.0)]);
        let before = disparate.clone();
        assert!(!disparate.interpolate_spline(DxfTriple::default()).unwrap());
        assert_eq!(disparate, before);
    }

    #[test]
    fn test_too_many_control_points() {
        let _quiet = QuietErrorScope::new();
        let _max = ThreadLocalConfigOption::set("DXF_MAX_BSPLINE_CONTROL_POINTS", "3");
        let mut line = line_2d(&[(0.0, 0.0), (10.0, 5.0), (20.0, -3.0), (35.0, 2.0)]);
        let before = line.clone();
        assert!(matches!(
            line.interpolate_spline(DxfTriple::default()),
            Err(GdalError::TooManyControlPoints { count: 4, max: 3 })
        ));
        assert_eq!(line, before);

        // limit is inclusive
        let _max = ThreadLocalConfigOption::set("DXF_MAX_BSPLINE_CONTROL_POINTS", "4");
        assert!(line.interpolate_spline(DxfTriple::default()).unwrap());
    }

    #[test]
    fn test_invalid_control_point_limit() {
        let _quiet = QuietErrorScope::new();
        let _max = ThreadLocalConfigOption::set("DXF_MAX_BSPLINE_CONTROL_POINTS", "many");
        let mut line = line_2d(&[(0.0, 0.0), (10.0, 5.0)]);
        assert!(matches!(
            line.interpolate_spline(DxfTriple::default()),
            Err(GdalError::CplError {
                number: CPLE_ILLEGAL_ARG,
                ..
            })
        ));
    }

    #[test]
    fn test_line_string_conversion() {
        let line: LeaderLine = LineString::from(vec![(0.0, 0.0), (2.0, 1.0)]).into();
        assert!(!line.is_3d());
        assert_eq!(line.points()[1], DxfTriple::new(2.0, 1.0, 0.0));
        let back: LineString<f64> = (&line).into();
        assert_eq!(back, LineString::from(vec![(0.0, 0.0), (2.0, 1.0)]));
    }
}
