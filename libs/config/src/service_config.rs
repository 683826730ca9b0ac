//! Streamer Configuration Module
//!
//! Loads the streamer configuration from a TOML file with an optional
//! environment overlay and `STREAMER__*` environment variable overrides.

use anyhow::{bail, Context, Result};
use codec::encoder::EncoderFormat;
use codec::serializer::SerializerFormat;
use config_crate::{Config, Environment, File};
use export::record::RecordFormat;
use export::stream::StreamFormat;
use export::tuple::TupleFormat;
use export::use_case::UseCaseFormat;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration file used when none is given
pub const DEFAULT_CONFIG_PATH: &str = "config/streamer.toml";

/// Prefix of environment variable overrides, e.g.
/// `STREAMER__USE_CASES__TICKETS_CREATION__ENABLED=false`
pub const ENV_PREFIX: &str = "STREAMER";

/// Separator between nesting levels in environment variable names
pub const ENV_SEPARATOR: &str = "__";

/// Free-form parameters of one format
pub type Parameters = Map<String, Value>;

/// Main streamer configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StreamerConfig {
    /// Code identifying this helpdesk in exported rows
    pub helpdesk_code: Option<String>,

    /// Stream format every use case appends to
    pub stream: Option<String>,

    pub logging: LoggingConfig,

    /// Stream parameters keyed by stream format
    pub streams: IndexMap<String, Parameters>,

    /// Use case settings keyed by use case name
    pub use_cases: IndexMap<String, UseCaseConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings of one use case
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UseCaseConfig {
    pub enabled: bool,
    /// Tuple format
    pub tuple: Option<String>,
    /// Record format
    pub record: Option<String>,
    /// Entity parameters keyed by entity format; nested entities are tables
    /// named after their own format
    pub formats: IndexMap<String, Parameters>,
}

impl StreamerConfig {
    /// Load configuration from `base_path` (default [`DEFAULT_CONFIG_PATH`]).
    ///
    /// With `environment`, `environments/<environment>.toml` next to the base
    /// file is layered on top when it exists. `STREAMER__*` variables are
    /// applied last and `${VAR}` references in string values are expanded.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = environment_path(base, env);

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config = builder
            .build()
            .with_context(|| format!("Failed to build configuration from {:?}", base))?;

        let mut config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.expand_env_vars()?;

        debug!(
            use_cases = config.use_cases.len(),
            streams = config.streams.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse a TOML document without file or environment layering
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text).context("Failed to parse configuration")?;
        config.expand_env_vars()?;
        Ok(config)
    }

    /// Settings of use case `name`
    pub fn use_case(&self, name: &str) -> Option<&UseCaseConfig> {
        self.use_cases.get(name)
    }

    /// Names of the use cases flagged `enabled`
    pub fn enabled_use_cases(&self) -> Vec<&str> {
        self.use_cases
            .iter()
            .filter(|(_, use_case)| use_case.enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Expand `${VAR}` references in every string value
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(code) = &self.helpdesk_code {
            self.helpdesk_code = Some(expand(code).context("Failed to expand helpdesk code")?);
        }

        if let Some(stream) = &self.stream {
            self.stream = Some(expand(stream).context("Failed to expand stream format")?);
        }

        for (name, parameters) in &mut self.streams {
            expand_parameters(parameters)
                .with_context(|| format!("Failed to expand parameters of stream {}", name))?;
        }

        for (name, use_case) in &mut self.use_cases {
            for (format, parameters) in &mut use_case.formats {
                expand_parameters(parameters).with_context(|| {
                    format!("Failed to expand parameters of {}.{}", name, format)
                })?;
            }
        }

        Ok(())
    }

    /// Check every format name against the built-in registries.
    ///
    /// All problems are reported in a single error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if let Some(stream) = &self.stream {
            if StreamFormat::from_name(stream).is_none() {
                problems.push(format!("unknown stream format {:?}", stream));
            }
        }

        for name in self.streams.keys() {
            if StreamFormat::from_name(name).is_none() {
                problems.push(format!("unknown stream format {:?} in [streams]", name));
            }
        }

        for (name, use_case) in &self.use_cases {
            if UseCaseFormat::from_name(name).is_none() {
                problems.push(format!("unknown use case {:?}", name));
            }
            if let Some(tuple) = &use_case.tuple {
                if TupleFormat::from_name(tuple).is_none() {
                    problems.push(format!("{}: unknown tuple format {:?}", name, tuple));
                }
            }
            if let Some(record) = &use_case.record {
                if RecordFormat::from_name(record).is_none() {
                    problems.push(format!("{}: unknown record format {:?}", name, record));
                }
            }

            for (format, parameters) in &use_case.formats {
                validate_entity(name, format, parameters, &mut problems);
            }
        }

        if problems.is_empty() {
            return Ok(());
        }
        bail!("Invalid configuration:\n  - {}", problems.join("\n  - "))
    }
}

fn environment_path(base: &Path, environment: &str) -> PathBuf {
    base.parent()
        .unwrap_or(Path::new("."))
        .join("environments")
        .join(format!("{}.toml", environment))
}

fn expand(text: &str) -> Result<String> {
    Ok(shellexpand::env(text)?.into_owned())
}

fn expand_parameters(parameters: &mut Parameters) -> Result<()> {
    for value in parameters.values_mut() {
        expand_value(value)?;
    }
    Ok(())
}

fn expand_value(value: &mut Value) -> Result<()> {
    match value {
        Value::String(text) => *text = expand(text)?,
        Value::Array(items) => {
            for item in items {
                expand_value(item)?;
            }
        }
        Value::Object(table) => expand_parameters(table)?,
        _ => {}
    }
    Ok(())
}

fn validate_entity(use_case: &str, format: &str, parameters: &Parameters, problems: &mut Vec<String>) {
    let nested_serializer = |key: &str, problems: &mut Vec<String>| {
        if let Some(name) = parameters.get(key).and_then(Value::as_str) {
            if SerializerFormat::from_name(name).is_none() {
                problems.push(format!(
                    "{}.{}: unknown serializer format {:?}",
                    use_case, format, name
                ));
            }
        }
    };

    if TupleFormat::from_name(format).is_some() {
        nested_serializer("serializer", problems);
    } else if RecordFormat::from_name(format).is_some() {
        nested_serializer("serializer", problems);
        if let Some(name) = parameters.get("encoder").and_then(Value::as_str) {
            if EncoderFormat::from_name(name).is_none() {
                problems.push(format!(
                    "{}.{}: unknown encoder format {:?}",
                    use_case, format, name
                ));
            }
        }
    } else if StreamFormat::from_name(format).is_none() {
        problems.push(format!("{}: unknown entity format {:?}", use_case, format));
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(environment: Option<&str>) -> Result<StreamerConfig> {
    StreamerConfig::load(None, environment)
}
