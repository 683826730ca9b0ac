//! # Primitive Validators
//!
//! Pure predicates over externally supplied primitives (numbers read from
//! configuration, host names, queue and stream names).
//!
//! Most constructor parameters have a safe default, so a failed check means
//! "substitute the default" rather than "abort". That substitution goes
//! through [`or_default`], which logs it so a misconfiguration is visible
//! instead of silently changing behaviour.

pub mod numbers;
pub mod strings;

pub use numbers::{
    IntegerRange, NON_NEGATIVE_DOUBLE_WORD, NON_NEGATIVE_INTEGER, POSITIVE_DOUBLE_WORD,
    POSITIVE_INTEGER, POSITIVE_WORD,
};
pub use strings::{
    is_hostname, is_not_blank, is_not_empty, PatternValidator, BEANSTALK_TUBE, KINESIS_STREAM,
};

use std::fmt::Debug;
use tracing::warn;

/// Parse-with-default: keep `value` when present and valid, otherwise use
/// `default`.
///
/// An omitted value (`None`) falls back quietly. A supplied value that fails
/// `is_valid` falls back with a warning naming the parameter.
pub fn or_default<T: Debug>(
    parameter: &str,
    value: Option<T>,
    is_valid: impl FnOnce(&T) -> bool,
    default: T,
) -> T {
    match value {
        None => default,
        Some(value) if is_valid(&value) => value,
        Some(value) => {
            warn!(
                parameter,
                rejected = ?value,
                fallback = ?default,
                "Invalid value, falling back to default"
            );
            default
        }
    }
}
