//! Configuration lookup used by the bound factories

use codec::serializer::JsonFlags;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::warn;

/// Address of one configuration value.
///
/// | context | format | argument | Meaning |
/// |---------|--------|----------|---------|
/// | `None` | `None` | `helpdesk_code` | global setting |
/// | `None` | `stm_beanstalk` | `port` | stream parameter |
/// | `tickets_creation` | `None` | `enabled` | use case setting |
/// | `tickets_creation` | `rec_kinesis` | `stream` | entity parameter |
/// | `tickets_creation` | `tpl_sequence` | `ser_csv.separator` | nested entity parameter |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigKey<'a> {
    pub context: Option<&'a str>,
    pub format: Option<&'a str>,
    pub argument: &'a str,
}

impl<'a> ConfigKey<'a> {
    pub fn new(context: Option<&'a str>, format: Option<&'a str>, argument: &'a str) -> Self {
        Self {
            context,
            format,
            argument,
        }
    }

    pub fn global(argument: &'a str) -> Self {
        Self::new(None, None, argument)
    }
}

/// Read-only view of the host configuration
pub trait ConfigSource: Send + Sync + Debug {
    /// Raw value stored at `key`, if any
    fn lookup(&self, key: &ConfigKey<'_>) -> Option<Value>;

    /// String value; numbers and booleans are rendered as text
    fn lookup_str(&self, key: &ConfigKey<'_>) -> Option<String> {
        match self.lookup(key)? {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    /// Integer value; numeric strings are accepted
    fn lookup_i64(&self, key: &ConfigKey<'_>) -> Option<i64> {
        match self.lookup(key)? {
            Value::Number(number) => number.as_i64().or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean value; `1`/`0`, `true`/`false`, `yes`/`no` and `on`/`off`
    /// are accepted
    fn lookup_bool(&self, key: &ConfigKey<'_>) -> Option<bool> {
        match self.lookup(key)? {
            Value::Bool(flag) => Some(flag),
            Value::Number(number) => number.as_i64().map(|n| n != 0),
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// JSON flag mask given as an integer or a list of flag names
    fn lookup_flags(&self, key: &ConfigKey<'_>) -> Option<i64> {
        match self.lookup(key)? {
            Value::Array(items) => {
                let names: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                match JsonFlags::from_names(names.iter().copied()) {
                    Some(flags) if names.len() == items.len() => Some(i64::from(flags.bits())),
                    _ => {
                        warn!(argument = key.argument, "Ignoring unknown JSON flag names");
                        None
                    }
                }
            }
            _ => self.lookup_i64(key),
        }
    }
}

/// In-memory [`ConfigSource`]
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<(Option<String>, Option<String>, String), Value>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        context: Option<&str>,
        format: Option<&str>,
        argument: &str,
        value: impl Into<Value>,
    ) {
        self.values.insert(
            (
                context.map(str::to_string),
                format.map(str::to_string),
                argument.to_string(),
            ),
            value.into(),
        );
    }

    /// Builder form of [`MapSource::insert`]
    pub fn with(
        mut self,
        context: Option<&str>,
        format: Option<&str>,
        argument: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.insert(context, format, argument, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigSource for MapSource {
    fn lookup(&self, key: &ConfigKey<'_>) -> Option<Value> {
        self.values
            .get(&(
                key.context.map(str::to_string),
                key.format.map(str::to_string),
                key.argument.to_string(),
            ))
            .cloned()
    }
}
