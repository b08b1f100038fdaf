//! Common Portability Library error reporting
//!
//! Failures detected inside the solver and the spline fitter are reported
//! here before being returned as [`GdalError`] values, so that applications
//! can observe them through [`crate::config::set_error_handler`] or the `log`
//! facade.

use std::cell::Cell;
use std::marker::PhantomData;

use crate::config::dispatch_to_error_handler;
use crate::errors::{CplErrType, CplErrorNum, GdalError};

thread_local! {
    static QUIET_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Report an error through the error channel.
///
/// The message goes to the installed error handler if any, to the `log`
/// facade otherwise. Nothing is emitted while a [`QuietErrorScope`] is alive
/// on the current thread.
pub fn report_error(class: CplErrType, number: CplErrorNum, msg: &str) {
    if QUIET_DEPTH.with(|depth| depth.get()) > 0 {
        return;
    }
    if dispatch_to_error_handler(class, number, msg) {
        return;
    }
    match class {
        CplErrType::Failure | CplErrType::Fatal => log::error!("ERROR {number}: {msg}"),
        CplErrType::Warning => log::warn!("Warning {number}: {msg}"),
        CplErrType::Debug => log::debug!("{msg}"),
        CplErrType::None => {}
    }
}

/// Report `msg` as a failure and return the matching [`GdalError::CplError`].
pub fn failure(number: CplErrorNum, msg: impl Into<String>) -> GdalError {
    let msg = msg.into();
    report_error(CplErrType::Failure, number, &msg);
    GdalError::CplError {
        class: CplErrType::Failure,
        number,
        msg,
    }
}

/// Scoped value for temporarily suppressing thread-local error messages.
///
/// Useful for callers that expect failures and want to keep the output log
/// clean of distracting yet expected error messages.
pub struct QuietErrorScope {
    // Make !Sync and !Send, and force use of `new`.
    _private: PhantomData<*mut ()>,
}

impl QuietErrorScope {
    pub fn new() -> Self {
        QUIET_DEPTH.with(|depth| depth.set(depth.get() + 1));
        QuietErrorScope {
            _private: PhantomData,
        }
    }
}

impl Default for QuietErrorScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for QuietErrorScope {
    fn drop(&mut self) {
        QUIET_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
