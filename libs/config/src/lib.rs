//! # Ticket Streamer Configuration
//!
//! Loads the streamer configuration and exposes it to the export pipeline
//! through [`export::bound::ConfigSource`].
//!
//! ## Features
//!
//! - **Layered loading**: base TOML file, optional environment overlay,
//!   `STREAMER__*` environment variables
//! - **Expansion**: `${VAR}` references in string values
//! - **Validation**: format names checked against the built-in registries
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use export::{BoundUseCaseFactory, Extensions};
//! use streamer_config::StreamerConfig;
//!
//! let config = StreamerConfig::load(None, Some("production"))?;
//! config.validate()?;
//!
//! let factory = BoundUseCaseFactory::new(Arc::new(config), &Extensions::default());
//! let dispatcher = factory.bootstrap();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod service_config;
pub mod source;

// Re-export commonly used types
pub use service_config::{
    load_config, LogFormat, LoggingConfig, Parameters, StreamerConfig, UseCaseConfig,
    DEFAULT_CONFIG_PATH, ENV_PREFIX,
};
