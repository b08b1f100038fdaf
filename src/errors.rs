use thiserror::Error;

/// CPL error number for application defined errors.
pub const CPLE_APP_DEFINED: CplErrorNum = 1;
/// CPL error number for illegal arguments.
pub const CPLE_ILLEGAL_ARG: CplErrorNum = 5;
/// CPL error number for unsupported operations.
pub const CPLE_NOT_SUPPORTED: CplErrorNum = 6;

pub type CplErrorNum = i32;

pub type Result<T> = std::result::Result<T, GdalError>;

#[derive(Clone, Debug, Error)]
pub enum GdalError {
    #[error("CPL error class: '{class:?}', error number: '{number}', error msg: '{msg}'")]
    CplError {
        class: CplErrType,
        number: CplErrorNum,
        msg: String,
    },
    #[error("Bad argument: {0}")]
    BadArgument(String),
    #[error("{method_name}: matrix not invertible (elimination step {step})")]
    SingularMatrix {
        method_name: &'static str,
        step: usize,
    },
    #[error("{method_name}: degenerate geometry: {msg}")]
    DegenerateGeometry {
        method_name: &'static str,
        msg: String,
    },
    #[error("Point ({x}, {y}) maps to infinity")]
    PointAtInfinity { x: f64, y: f64 },
    #[error("Transform is not invertible: {0}")]
    NotInvertible(String),
    #[error("Too many control points ({count}) for spline leader, maximum is {max}")]
    TooManyControlPoints { count: usize, max: usize },
    #[error("Delegated linear solver failed: {0}")]
    DelegatedSolver(String),
    #[error(transparent)]
    ParseFloat(#[from] std::num::ParseFloatError),
    #[cfg(feature = "ndarray")]
    #[error(transparent)]
    ShapeError(#[from] ndarray::ShapeError),
}

/// Error severity, following the CPL error classes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CplErrType {
    None,
    Debug,
    Warning,
    Failure,
    Fatal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GdalError::SingularMatrix {
            method_name: "linear_system_solve",
            step: 3,
        };
        assert_eq!(
            err.to_string(),
            "linear_system_solve: matrix not invertible (elimination step 3)"
        );
    }
}
