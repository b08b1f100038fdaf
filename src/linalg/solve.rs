//! Dense linear system solving.
//!
//! [`linear_system_solve`] solves `A * X = RHS` for a square `A` and any number
//! of right-hand side columns. The builtin path is an LU decomposition with
//! partial pivoting; with the `nalgebra` feature enabled the system is instead
//! equilibrated and handed to [`nalgebra::linalg::LU`], unless the
//! `GDAL_USE_BUILTIN_LINEAR_SOLVER` configuration option is set or the caller
//! asks for a pivot threshold or progress notifications, which only the
//! builtin path honors.
//!
//! Non-finite inputs are not screened: a NaN pivot compares false against the
//! threshold, so such systems may either be reported singular or produce a
//! NaN solution.

use crate::config;
use crate::cpl;
use crate::errors::{CplErrType, GdalError, Result, CPLE_APP_DEFINED};
use crate::linalg::Matrix;

/// Default size above which systems emit progress notifications during
/// elimination.
pub const PROGRESS_DIMENSION_THRESHOLD: usize = 10_000;

/// Number of elimination steps between two progress notifications.
const PROGRESS_STEP_INTERVAL: usize = 100;

/// Which implementation ends up solving the system.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolverBackend {
    /// Gaussian elimination with partial pivoting.
    Builtin,
    /// Equilibrated LU decomposition from `nalgebra`.
    #[cfg(feature = "nalgebra")]
    Nalgebra,
}

/// Options for [`linear_system_solve_ex`].
pub struct SolveOptions<'a> {
    /// Pivots whose absolute value is at or below this threshold make the
    /// solver fail. The default of `0.0` only rejects exact zeros, any other
    /// value selects the builtin solver.
    pub pivot_epsilon: f64,
    /// Skip the delegated solver even when it is available.
    pub force_builtin: bool,
    /// Called with `(step, total_steps)` every hundred elimination steps on
    /// systems larger than `progress_dimension_threshold`. Setting it selects
    /// the builtin solver.
    pub progress: Option<&'a mut dyn FnMut(usize, usize)>,
    /// Defaults to [`PROGRESS_DIMENSION_THRESHOLD`].
    pub progress_dimension_threshold: usize,
}

impl Default for SolveOptions<'_> {
    fn default() -> Self {
        SolveOptions {
            pivot_epsilon: 0.0,
            force_builtin: false,
            progress: None,
            progress_dimension_threshold: PROGRESS_DIMENSION_THRESHOLD,
        }
    }
}

/// Solve `a * x = rhs` for `x`.
///
/// `a` must be square and `rhs` must have as many rows as `a`. Neither input is
/// modified.
///
/// # Example
///
/// ```rust
/// # fn main() -> gdal_georef::errors::Result<()> {
/// use gdal_georef::linalg::{linear_system_solve, Matrix};
///
/// let a = Matrix::from_rows(&[[2.0, 0.0], [0.0, 4.0]]);
/// let b = Matrix::from_rows(&[[4.0], [8.0]]);
/// let x = linear_system_solve(&a, &b)?;
/// assert_eq!(x, Matrix::from_rows(&[[2.0], [2.0]]));
/// # Ok(())
/// # }
/// ```
pub fn linear_system_solve(a: &Matrix, rhs: &Matrix) -> Result<Matrix> {
    linear_system_solve_ex(a, rhs, SolveOptions::default())
}

/// Solve `a * x = rhs` with extended options: [`SolveOptions`].
pub fn linear_system_solve_ex(a: &Matrix, rhs: &Matrix, options: SolveOptions) -> Result<Matrix> {
    check_dimensions(a, rhs)?;

    let force_builtin =
        options.force_builtin || options.pivot_epsilon != 0.0 || options.progress.is_some();
    match select_backend(force_builtin)? {
        SolverBackend::Builtin => solve_builtin(a.clone(), rhs, options),
        #[cfg(feature = "nalgebra")]
        SolverBackend::Nalgebra => solve_nalgebra(a, rhs),
    }
}

/// The backend [`linear_system_solve_ex`] would use.
pub fn select_backend(force_builtin: bool) -> Result<SolverBackend> {
    if force_builtin || config::get_config_bool("GDAL_USE_BUILTIN_LINEAR_SOLVER", false)? {
        return Ok(SolverBackend::Builtin);
    }
    #[cfg(feature = "nalgebra")]
    {
        Ok(SolverBackend::Nalgebra)
    }
    #[cfg(not(feature = "nalgebra"))]
    {
        Ok(SolverBackend::Builtin)
    }
}

fn check_dimensions(a: &Matrix, rhs: &Matrix) -> Result<()> {
    if !a.is_square() {
        return Err(GdalError::BadArgument(format!(
            "linear_system_solve: coefficient matrix must be square, got {}x{}",
            a.rows(),
            a.cols()
        )));
    }
    if rhs.rows() != a.rows() {
        return Err(GdalError::BadArgument(format!(
            "linear_system_solve: right-hand side has {} rows, expected {}",
            rhs.rows(),
            a.rows()
        )));
    }
    Ok(())
}

fn not_invertible(step: usize) -> GdalError {
    cpl::report_error(
        CplErrType::Failure,
        CPLE_APP_DEFINED,
        "linear_system_solve: matrix not invertible",
    );
    GdalError::SingularMatrix {
        method_name: "linear_system_solve",
        step,
    }
}

/// Gaussian elimination with partial pivoting, consuming `a`.
///
/// Rows of `a` are physically swapped while the permutation is only recorded
/// for `rhs`, and applied when substituting. `options.force_builtin` is
/// ignored.
pub fn solve_builtin(mut a: Matrix, rhs: &Matrix, options: SolveOptions) -> Result<Matrix> {
    check_dimensions(&a, rhs)?;
    let SolveOptions {
        pivot_epsilon,
        mut progress,
        progress_dimension_threshold,
        ..
    } = options;
    if pivot_epsilon < 0.0 {
        return Err(GdalError::BadArgument(format!(
            "linear_system_solve: negative pivot epsilon {pivot_epsilon}"
        )));
    }

    let m = a.rows();
    let n = rhs.cols();
    let mut perm: Vec<usize> = (0..m).collect();

    let report_progress = m > progress_dimension_threshold;
    if report_progress {
        log::debug!("linear_system_solve: eliminating {m}x{m} system");
    }

    for step in 0..m {
        if report_progress && step % PROGRESS_STEP_INTERVAL == 0 {
            if let Some(progress) = progress.as_mut() {
                progress(step, m - 1);
            }
        }

        let mut i_max = step;
        let mut d_max = a[(step, step)].abs();
        for i in step + 1..m {
            if a[(i, step)].abs() > d_max {
                i_max = i;
                d_max = a[(i, step)].abs();
            }
        }
        if d_max <= pivot_epsilon {
            return Err(not_invertible(step));
        }

        if i_max != step {
            perm.swap(i_max, step);
            a.swap_rows(i_max, step);
        }

        let pivot = a[(step, step)];
        for row in step + 1..m {
            a[(row, step)] /= pivot;
        }
        for col in step + 1..m {
            let factor = a[(step, col)];
            if factor == 0.0 {
                continue;
            }
            for row in step + 1..m {
                a[(row, col)] -= a[(row, step)] * factor;
            }
        }
    }

    let mut x = Matrix::new(m, n);
    for col in 0..n {
        // forward substitution with the unit lower triangle
        for row in 0..m {
            let mut value = rhs[(perm[row], col)];
            for k in 0..row {
                value -= a[(row, k)] * x[(k, col)];
            }
            x[(row, col)] = value;
        }
        // back substitution with the upper triangle
        for row in (0..m).rev() {
            let mut value = x[(row, col)];
            for k in row + 1..m {
                value -= a[(row, k)] * x[(k, col)];
            }
            x[(row, col)] = value / a[(row, row)];
        }
    }

    Ok(x)
}

/// Row then column scaling factors bringing the largest magnitude of every
/// row and column of `a` to one.
#[cfg(feature = "nalgebra")]
fn equilibrate(a: &Matrix) -> Option<(Vec<f64>, Vec<f64>)> {
    let m = a.rows();
    let mut row_scale = vec![0.0; m];
    for (row, scale) in row_scale.iter_mut().enumerate() {
        let max = (0..m).fold(0.0_f64, |acc, col| acc.max(a[(row, col)].abs()));
        if max == 0.0 || !max.is_finite() {
            return None;
        }
        *scale = 1.0 / max;
    }
    let mut col_scale = vec![0.0; m];
    for (col, scale) in col_scale.iter_mut().enumerate() {
        let max = (0..m).fold(0.0_f64, |acc, row| {
            acc.max((row_scale[row] * a[(row, col)]).abs())
        });
        if max == 0.0 {
            return None;
        }
        *scale = 1.0 / max;
    }
    Some((row_scale, col_scale))
}

#[cfg(feature = "nalgebra")]
fn solve_nalgebra(a: &Matrix, rhs: &Matrix) -> Result<Matrix> {
    use nalgebra::DMatrix;

    let m = a.rows();
    let n = rhs.cols();

    let delegated_failure = |msg: &str| {
        cpl::report_error(
            CplErrType::Failure,
            CPLE_APP_DEFINED,
            &format!("linear_system_solve: {msg}"),
        );
        GdalError::DelegatedSolver(msg.to_string())
    };

    let (row_scale, col_scale) =
        equilibrate(a).ok_or_else(|| delegated_failure("matrix is singular"))?;

    let scaled = DMatrix::from_fn(m, m, |i, j| row_scale[i] * a[(i, j)] * col_scale[j]);
    let scaled_rhs = DMatrix::from_fn(m, n, |i, j| row_scale[i] * rhs[(i, j)]);

    let y = scaled
        .lu()
        .solve(&scaled_rhs)
        .ok_or_else(|| delegated_failure("matrix is singular"))?;
    if y.iter().any(|v| !v.is_finite()) {
        return Err(delegated_failure("solution is not finite"));
    }

    let mut x = Matrix::new(m, n);
    for col in 0..n {
        for row in 0..m {
            x[(row, col)] = col_scale[row] * y[(row, col)];
        }
    }
    Ok(x)
}
