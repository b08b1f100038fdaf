//! Rational B-spline (NURBS) evaluation.
//!
//! `order` is the spline degree plus one throughout.

use crate::errors::{GdalError, Result};
use crate::vector::dxf::DxfTriple;

/// Parameters closer than this to the last knot evaluate at the last knot.
const END_PARAMETER_EPSILON: f64 = 5e-6;

/// Open uniform knot vector for `npts` control points.
///
/// The first and last knots are repeated `order` times so that the curve
/// starts and ends on its first and last control points, interior knots are
/// consecutive integers.
pub fn uniform_knots(npts: usize, order: usize) -> Vec<f64> {
    let mut knots = vec![0.0; npts + order];
    for i in 1..knots.len() {
        knots[i] = knots[i - 1];
        if i >= order && i <= npts {
            knots[i] += 1.0;
        }
    }
    knots
}

/// Rational basis functions at parameter `t`, one per weight.
///
/// Uses the Cox-de Boor recursion. At `t` equal to the last knot the basis
/// selects the last control point.
///
/// # Panic
/// Will panic if `knots` holds fewer than `weights.len() + order` values.
pub fn rational_basis(order: usize, t: f64, knots: &[f64], weights: &[f64]) -> Vec<f64> {
    let npts = weights.len();
    let nplusc = npts + order;
    let knots = &knots[..nplusc];

    // first order
    let mut temp: Vec<f64> = knots
        .windows(2)
        .map(|span| if t >= span[0] && t < span[1] { 1.0 } else { 0.0 })
        .collect();

    for k in 2..=order {
        for i in 0..nplusc - k {
            let d = if temp[i] != 0.0 {
                ((t - knots[i]) * temp[i]) / (knots[i + k - 1] - knots[i])
            } else {
                0.0
            };
            let e = if temp[i + 1] != 0.0 {
                ((knots[i + k] - t) * temp[i + 1]) / (knots[i + k] - knots[i + 1])
            } else {
                0.0
            };
            temp[i] = d + e;
        }
    }

    if npts > 0 && t == knots[nplusc - 1] {
        temp[npts - 1] = 1.0;
    }

    let sum: f64 = temp.iter().zip(weights).map(|(n, h)| n * h).sum();
    temp.iter()
        .zip(weights)
        .map(|(n, h)| if sum != 0.0 { n * h / sum } else { 0.0 })
        .collect()
}

/// Evaluate a rational B-spline at `output_count` parameters evenly spaced
/// between the first and last knot.
///
/// # Arguments
///
/// * `control_points` - At least `order` control points.
/// * `weights` - One weight per control point.
/// * `order` - Spline degree plus one, at least 2.
/// * `knots` - `control_points.len() + order` knots, or `None` for
///   [`uniform_knots`].
/// * `output_count` - Number of points to compute, at least 2.
pub fn rbspline(
    control_points: &[DxfTriple],
    weights: &[f64],
    order: usize,
    knots: Option<&[f64]>,
    output_count: usize,
) -> Result<Vec<DxfTriple>> {
    let npts = control_points.len();
    if order < 2 || npts < order {
        return Err(GdalError::BadArgument(format!(
            "rbspline: {npts} control points can't define a spline of order {order}"
        )));
    }
    if weights.len() != npts {
        return Err(GdalError::BadArgument(format!(
            "rbspline: expected {npts} weights, got {}",
            weights.len()
        )));
    }
    if output_count < 2 {
        return Err(GdalError::BadArgument(format!(
            "rbspline: at least 2 output points required, got {output_count}"
        )));
    }

    let computed;
    let knots = match knots {
        Some(knots) => knots,
        None => {
            computed = uniform_knots(npts, order);
            &computed
        }
    };
    if knots.len() != npts + order {
        return Err(GdalError::BadArgument(format!(
            "rbspline: expected {} knots, got {}",
            npts + order,
            knots.len()
        )));
    }

    let first = knots[0];
    let last = knots[knots.len() - 1];
    let step = (last - first) / (output_count - 1) as f64;

    let mut points = Vec::with_capacity(output_count);
    let mut t = first;
    for _ in 0..output_count {
        if last - t < END_PARAMETER_EPSILON {
            t = last;
        }
        let basis = rational_basis(order, t, knots, weights);
        let point = basis
            .iter()
            .zip(control_points)
            .fold(DxfTriple::default(), |acc, (b, p)| acc + *p * *b);
        points.push(point);
        t += step;
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_near;

    #[test]
    fn test_uniform_knots() {
        assert_eq!(uniform_knots(4, 3), vec![0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0]);
        assert_eq!(
            uniform_knots(4, 4),
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_rational_basis() {
        let knots = uniform_knots(4, 3);
        let basis = rational_basis(3, 1.5, &knots, &[1.0; 4]);
        let expected = [0.0, 0.125, 0.625, 0.25];
        for (b, e) in basis.iter().zip(expected) {
            assert_near!(*b, e, epsilon = 1e-15);
        }
        assert_eq!(rational_basis(3, 0.0, &knots, &[1.0; 4]), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(rational_basis(3, 2.0, &knots, &[1.0; 4]), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_linear_spline() {
        let control_points = [
            DxfTriple::new(0.0, 0.0, 0.0),
            DxfTriple::new(1.0, 1.0, 0.0),
            DxfTriple::new(2.0, 0.0, 0.0),
        ];
        let points = rbspline(&control_points, &[1.0; 3], 2, None, 5).unwrap();
        let expected = [
            (0.0, 0.0),
            (0.5, 0.5),
            (1.0, 1.0),
            (1.5, 0.5),
            (2.0, 0.0),
        ];
        assert_eq!(points.len(), expected.len());
        for (point, (x, y)) in points.iter().zip(expected) {
            assert_near!(point.x, x, epsilon = 1e-12);
            assert_near!(point.y, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rational_quarter_circle() {
        let control_points = [
            DxfTriple::new(1.0, 0.0, 0.0),
            DxfTriple::new(1.0, 1.0, 0.0),
            DxfTriple::new(0.0, 1.0, 0.0),
        ];
        let weights = [1.0, std::f64::consts::FRAC_1_SQRT_2, 1.0];
        let knots = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let points = rbspline(&control_points, &weights, 3, Some(&knots), 9).unwrap();
        for point in &points {
            assert_near!(point.length(), 1.0, epsilon = 1e-12);
        }
        assert_eq!(points[0], control_points[0]);
        assert_eq!(points[8], control_points[2]);
    }

    #[test]
    fn test_invalid_input() {
        let control_points = [DxfTriple::default(); 3];
        assert!(rbspline(&control_points, &[1.0; 3], 4, None, 10).is_err());
        assert!(rbspline(&control_points, &[1.0; 2], 3, None, 10).is_err());
        assert!(rbspline(&control_points, &[1.0; 3], 3, Some(&[0.0; 5]), 10).is_err());
        assert!(rbspline(&control_points, &[1.0; 3], 3, None, 1).is_err());
        assert!(rbspline(&control_points, &[1.0; 3], 1, None, 10).is_err());
    }
}
