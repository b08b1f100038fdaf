//! Dense matrices and linear system solving.

mod matrix;
mod solve;

pub use matrix::Matrix;
pub use solve::{
    linear_system_solve, linear_system_solve_ex, select_backend, solve_builtin, SolveOptions,
    SolverBackend, PROGRESS_DIMENSION_THRESHOLD,
};
