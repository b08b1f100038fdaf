//! Configuration Functions
//!
//! The library can be configured at runtime using environment variables or
//! by using functions in this module. Options set by calling functions in this
//! module override options set in environment variables.
//!
//! ```
//! use gdal_georef::config::*;
//!
//! // Allow larger spline leaders
//! set_config_option("DXF_MAX_BSPLINE_CONTROL_POINTS", "5000").unwrap();
//!
//! assert_eq!(
//!     get_config_option("DXF_MAX_BSPLINE_CONTROL_POINTS", "").unwrap(),
//!     "5000"
//! );
//!
//! // Set the limit back to default
//! clear_config_option("DXF_MAX_BSPLINE_CONTROL_POINTS").unwrap();
//!
//! // Check the option has been cleared
//! assert_eq!(
//!     get_config_option("DXF_MAX_BSPLINE_CONTROL_POINTS", "XXX").unwrap(),
//!     "XXX"
//! );
//! ```
//!
//! Options read by this crate:
//!
//! * `GDAL_USE_BUILTIN_LINEAR_SOLVER`: force the builtin Gaussian elimination
//!   even when the `nalgebra` feature is enabled.
//! * `DXF_MAX_BSPLINE_CONTROL_POINTS`: maximum number of data points accepted
//!   by the leader spline fit (default 2000).
//! * `GDAL_GCPS_TO_GEOTRANSFORM_APPROX_OK` and
//!   `GDAL_GCPS_TO_GEOTRANSFORM_APPROX_THRESHOLD`: tolerance of the affine GCP fit.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::errors::{CplErrType, GdalError, Result};

static GLOBAL_OPTIONS: Lazy<Mutex<HashMap<String, String>>> = Lazy::new(Default::default);

thread_local! {
    static THREAD_LOCAL_OPTIONS: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains(|c| c == '=' || c == '\0') {
        return Err(GdalError::BadArgument(format!(
            "Invalid configuration option name: '{}'",
            key.escape_default()
        )));
    }
    Ok(())
}

fn check_value(value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(GdalError::BadArgument(format!(
            "Invalid configuration option value: '{}'",
            value.escape_default()
        )));
    }
    Ok(())
}

fn global_options() -> std::sync::MutexGuard<'static, HashMap<String, String>> {
    match GLOBAL_OPTIONS.lock() {
        Ok(guard) => guard,
        // a panicking writer cannot leave the map half-updated
        Err(poison_error) => poison_error.into_inner(),
    }
}

/// Set a library configuration option
///
pub fn set_config_option(key: &str, value: &str) -> Result<()> {
    check_key(key)?;
    check_value(value)?;
    global_options().insert(key.to_string(), value.to_string());
    Ok(())
}

/// Get the value of a library configuration option
///
/// Thread-local options take precedence over global ones, which take
/// precedence over environment variables. If the config option specified by
/// `key` is not found, the value passed in the `default` parameter is returned.
pub fn get_config_option(key: &str, default: &str) -> Result<String> {
    check_key(key)?;
    if let Some(value) = THREAD_LOCAL_OPTIONS.with(|options| options.borrow().get(key).cloned()) {
        return Ok(value);
    }
    if let Some(value) = global_options().get(key).cloned() {
        return Ok(value);
    }
    Ok(std::env::var(key).unwrap_or_else(|_| default.to_string()))
}

/// Clear the value of a library configuration option
pub fn clear_config_option(key: &str) -> Result<()> {
    check_key(key)?;
    global_options().remove(key);
    Ok(())
}

/// Set a library configuration option
/// with **thread local** scope
///
pub fn set_thread_local_config_option(key: &str, value: &str) -> Result<()> {
    check_key(key)?;
    check_value(value)?;
    THREAD_LOCAL_OPTIONS.with(|options| {
        options
            .borrow_mut()
            .insert(key.to_string(), value.to_string())
    });
    Ok(())
}

/// Get the value of a library configuration option
/// with **thread local** scope
///
/// If the config option specified by `key` is not found, the value passed in the `default` parameter is returned.
pub fn get_thread_local_config_option(key: &str, default: &str) -> Result<String> {
    check_key(key)?;
    Ok(THREAD_LOCAL_OPTIONS
        .with(|options| options.borrow().get(key).cloned())
        .unwrap_or_else(|| default.to_string()))
}

/// Clear the value of a library configuration option
/// with **thread local** scope
pub fn clear_thread_local_config_option(key: &str) -> Result<()> {
    check_key(key)?;
    THREAD_LOCAL_OPTIONS.with(|options| options.borrow_mut().remove(key));
    Ok(())
}

/// Interpret a configuration value as a boolean.
///
/// `NO`, `FALSE`, `OFF` and `0` (case insensitive) are false, anything else is true.
pub fn test_bool(value: &str) -> bool {
    !(value.eq_ignore_ascii_case("NO")
        || value.eq_ignore_ascii_case("FALSE")
        || value.eq_ignore_ascii_case("OFF")
        || value == "0")
}

/// Read a boolean configuration option, falling back to `default` when unset.
pub fn get_config_bool(key: &str, default: bool) -> Result<bool> {
    let value = get_config_option(key, "")?;
    if value.is_empty() {
        return Ok(default);
    }
    Ok(test_bool(&value))
}

type ErrorCallbackType = dyn FnMut(CplErrType, i32, &str) + 'static + Send;
type SharedErrorCallback = Arc<Mutex<Box<ErrorCallbackType>>>;

/// Static variable that holds the current error callback function
///
/// The slot lock is only held to swap or clone the callback, never while it runs.
static ERROR_CALLBACK: Lazy<Mutex<Option<SharedErrorCallback>>> = Lazy::new(Default::default);

thread_local! {
    static IN_ERROR_HANDLER: Cell<bool> = const { Cell::new(false) };
}

/// Set a custom error handler.
///
/// Errors reported through [`crate::cpl::report_error`] are delivered to the
/// handler instead of the `log` facade. The handler may itself install or
/// remove handlers. Errors it reports while running go to the `log` facade.
///
/// The function must be `Send` and `Sync` since it is potentially called from multiple threads.
///
pub fn set_error_handler<F>(callback: F)
where
    F: FnMut(CplErrType, i32, &str) + 'static + Send + Sync,
{
    let callback: Box<ErrorCallbackType> = Box::new(callback);
    let mut callback_lock = match ERROR_CALLBACK.lock() {
        Ok(guard) => guard,
        // poisoning could only occur on a panic while swapping, the slot itself is still valid
        Err(poison_error) => poison_error.into_inner(),
    };
    callback_lock.replace(Arc::new(Mutex::new(callback)));
}

/// Remove a custom error handler.
///
/// A handler already running on another thread finishes its current call.
pub fn remove_error_handler() {
    let mut callback_lock = match ERROR_CALLBACK.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    };

    // drop callback
    callback_lock.take();
}

/// Resets the re-entrancy flag even if the handler panics.
struct HandlerRunning;

impl HandlerRunning {
    fn enter() -> Self {
        IN_ERROR_HANDLER.with(|running| running.set(true));
        HandlerRunning
    }
}

impl Drop for HandlerRunning {
    fn drop(&mut self) {
        IN_ERROR_HANDLER.with(|running| running.set(false));
    }
}

/// Hand a message to the installed error handler.
///
/// Returns `false` if no handler is installed, or if the current thread is
/// already running the handler.
pub(crate) fn dispatch_to_error_handler(class: CplErrType, number: i32, msg: &str) -> bool {
    if IN_ERROR_HANDLER.with(Cell::get) {
        return false;
    }

    let callback = {
        let callback_lock = match ERROR_CALLBACK.lock() {
            Ok(guard) => guard,
            Err(poison_error) => poison_error.into_inner(),
        };
        match callback_lock.as_ref() {
            Some(callback) => Arc::clone(callback),
            None => return false,
        }
    };

    let mut callback = match callback.lock() {
        Ok(guard) => guard,
        // a previous call panicked, the closure itself is still callable
        Err(poison_error) => poison_error.into_inner(),
    };
    let _running = HandlerRunning::enter();
    callback(class, number, msg);
    true
}
