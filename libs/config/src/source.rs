//! [`ConfigSource`] view of a loaded [`StreamerConfig`]
//!
//! | Key | Table |
//! |-----|-------|
//! | `(None, None, arg)` | top level (`helpdesk_code`, `stream`) |
//! | `(None, Some(format), arg)` | `[streams.<format>]` |
//! | `(Some(use_case), None, arg)` | `[use_cases.<use_case>]` |
//! | `(Some(use_case), Some(format), arg)` | `[use_cases.<use_case>.formats.<format>]` |
//!
//! Dotted arguments such as `ser_csv.separator` descend into nested tables.

use crate::service_config::{Parameters, StreamerConfig};
use export::bound::{ConfigKey, ConfigSource};
use serde_json::Value;

impl ConfigSource for StreamerConfig {
    fn lookup(&self, key: &ConfigKey<'_>) -> Option<Value> {
        match (key.context, key.format) {
            (None, None) => match key.argument {
                "helpdesk_code" => self.helpdesk_code.clone().map(Value::from),
                "stream" => self.stream.clone().map(Value::from),
                _ => None,
            },
            (None, Some(format)) => parameter(self.streams.get(format)?, key.argument),
            (Some(context), None) => {
                let use_case = self.use_cases.get(context)?;
                match key.argument {
                    "enabled" => Some(Value::Bool(use_case.enabled)),
                    "tuple" => use_case.tuple.clone().map(Value::from),
                    "record" => use_case.record.clone().map(Value::from),
                    _ => None,
                }
            }
            (Some(context), Some(format)) => {
                let use_case = self.use_cases.get(context)?;
                parameter(use_case.formats.get(format)?, key.argument)
            }
        }
    }
}

fn parameter(parameters: &Parameters, argument: &str) -> Option<Value> {
    if let Some(value) = parameters.get(argument) {
        return Some(value.clone());
    }

    let mut path = argument.split('.');
    let mut value = parameters.get(path.next()?)?;
    for segment in path {
        value = value.as_object()?.get(segment)?;
    }
    Some(value.clone())
}
