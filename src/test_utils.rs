#[cfg(test)]
use crate::gcp::Gcp;

/// GCPs of a 100 x 100 image shifted by `(10, 20)` in georeferenced space.
#[cfg(test)]
pub(crate) fn translated_square_gcps() -> Vec<Gcp> {
    vec![
        Gcp::new(0.0, 0.0, 10.0, 20.0).with_id("top-left"),
        Gcp::new(100.0, 0.0, 110.0, 20.0).with_id("top-right"),
        Gcp::new(100.0, 100.0, 110.0, 120.0).with_id("bottom-right"),
        Gcp::new(0.0, 100.0, 10.0, 120.0).with_id("bottom-left"),
    ]
}

/// Scoped value for temporarily setting a thread-local configuration option.
#[cfg(test)]
pub(crate) struct ThreadLocalConfigOption {
    key: &'static str,
}

#[cfg(test)]
impl ThreadLocalConfigOption {
    pub fn set(key: &'static str, value: &str) -> Self {
        crate::config::set_thread_local_config_option(key, value)
            .expect("setting thread-local config option");
        ThreadLocalConfigOption { key }
    }
}

#[cfg(test)]
impl Drop for ThreadLocalConfigOption {
    fn drop(&mut self) {
        let _ = crate::config::clear_thread_local_config_option(self.key);
    }
}

/// Assert that two floating point values are within `epsilon` of each other.
///
/// # Examples
///
/// ```rust
/// use gdal_georef::assert_near;
/// use std::f64::consts::{PI, E};
/// assert_near!(PI / E, 1.1557273497909217);
/// // with specified epsilon
/// assert_near!(PI / E, 1.15572734, epsilon = 1e-8);
/// ```
#[macro_export]
macro_rules! assert_near {
    ($left:expr, $right:expr) => {
        $crate::assert_near!($left, $right, epsilon = f64::EPSILON)
    };
    ($left:expr, $right:expr, epsilon = $ep:expr) => {
        assert!(
            ($left - $right).abs() < $ep,
            "|{} - {}| = {} is greater than epsilon {:.4e}",
            $left,
            $right,
            ($left - $right).abs(),
            $ep
        )
    };
    ($left:expr, $right:expr, epsilon = $ep:expr, field = $field:expr) => {
        assert!(
            ($left - $right).abs() < $ep,
            "field {}: |{} - {}| = {} is greater than epsilon {:.4e}",
            $field,
            $left,
            $right,
            ($left - $right).abs(),
            $ep
        )
    };
    // Pseudo-specialization
    (Coord, $left:expr, $right:expr, epsilon = $ep:expr) => {
        $crate::assert_near!($left.x, $right.x, epsilon = $ep, field = "x");
        $crate::assert_near!($left.y, $right.y, epsilon = $ep, field = "y");
    };
}
