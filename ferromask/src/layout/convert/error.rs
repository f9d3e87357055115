//! Conversion error types.

use crate::deps::arcstr::ArcStr;

/// A helper trait for conversion tree-walkers.
///
/// Each implementer will generally have some internal state to report upon failure,
/// which it can inject in the implementation-required `err` method.
/// The `fail` method, provided by default, simply returns the `err` value.
pub trait ErrorHelper {
    type Error;

    /// Creates and returns a [Self::Error] value.
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Returns the given failure message.
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Unwraps the [`Option`] `opt` if it is [`Some`] and returns an error if not.
    fn unwrap<T>(&self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match opt {
            Some(val) => Ok(val),
            None => self.fail(msg),
        }
    }
    /// Asserts boolean condition `b`. Returns through `self.fail` if not.
    fn assert(&self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
}

/// A conversion context.
///
/// This enumeration is generally used for error reporting.
#[derive(Debug, Clone)]
pub enum ErrorContext {
    Library,
    Cell(ArcStr),
    Instance(ArcStr),
    Units,
    Geometry,
    Annotations,
}
