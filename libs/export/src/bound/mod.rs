//! # Configuration-Bound Factories
//!
//! ## Purpose
//!
//! The plain registries build instances from explicit options only. The bound
//! factories wrap them for one use case and fill every option left as `None`
//! from a [`ConfigSource`] before building, then create nested entities
//! (record encoder, tuple serializer, use case tuple/record/stream) through
//! nested bound factories named by configuration.
//!
//! ## Resolution Order
//!
//! Options are resolved in declaration order. An explicit option always wins
//! over configuration, and configuration wins over the format default:
//!
//! ```text
//! explicit option ─→ ConfigSource::lookup(context, format, argument) ─→ format default
//! ```
//!
//! Formats added by hooks are built with the options as given.
//!
//! ## Bootstrap
//!
//! [`BoundUseCaseFactory::bootstrap`] walks every registered use case, skips
//! the ones not flagged `enabled` and registers the rest with a
//! [`Dispatcher`](crate::use_case::Dispatcher).

pub mod codecs;
pub mod pipeline;
pub mod source;
pub mod use_case;

pub use codecs::{BoundEncoderFactory, BoundSerializerFactory};
pub use pipeline::{BoundRecordFactory, BoundStreamFactory, BoundTupleFactory};
pub use source::{ConfigKey, ConfigSource, MapSource};
pub use use_case::BoundUseCaseFactory;

use crate::error::{ExportError, ExportResult};

/// Set `slot` from `lookup` unless it already holds a value
fn fill<T>(slot: &mut Option<T>, lookup: impl FnOnce() -> Option<T>) {
    if slot.is_none() {
        *slot = lookup();
    }
}

fn require_name(what: &str, value: &str) -> ExportResult<String> {
    if value.trim().is_empty() {
        return Err(ExportError::invalid_configuration(format!(
            "{} must not be blank",
            what
        )));
    }
    Ok(value.to_string())
}

/// Argument name of a nested entity parameter, e.g. `ser_csv.separator`
fn nested(format: &str, parameter: &str) -> String {
    format!("{}.{}", format, parameter)
}
