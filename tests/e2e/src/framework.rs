//! Core E2E testing framework

use anyhow::{Context, Result};
use export::extensions::Extensions;
use export::test_utils::{FakeBeanstalkd, Job};
use export::use_case::Dispatcher;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use streamer_config::StreamerConfig;
use tempfile::TempDir;
use tracing::debug;

/// A fake beanstalkd plus a configuration directory pointing at it
pub struct TestPipeline {
    server: FakeBeanstalkd,
    dir: TempDir,
    config_path: PathBuf,
}

impl TestPipeline {
    /// Start the server and write the configuration produced by `config`
    /// for its port
    pub async fn start(config: impl FnOnce(u16) -> String) -> Result<Self> {
        let server = FakeBeanstalkd::start()
            .await
            .context("Failed to start fake beanstalkd")?;
        let dir = tempfile::tempdir().context("Failed to create config directory")?;
        let config_path = dir.path().join("streamer.toml");
        fs::write(&config_path, config(server.port())).context("Failed to write config")?;

        debug!(port = server.port(), config = ?config_path, "Test pipeline started");
        Ok(Self {
            server,
            dir,
            config_path,
        })
    }

    pub fn server(&self) -> &FakeBeanstalkd {
        &self.server
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Write `environments/<name>.toml` next to the configuration
    pub fn write_environment(&self, name: &str, contents: &str) -> Result<()> {
        let dir = self.dir.path().join("environments");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{}.toml", name)), contents)?;
        Ok(())
    }

    pub fn load(&self, environment: Option<&str>) -> Result<StreamerConfig> {
        let config = StreamerConfig::load(Some(&self.config_path), environment)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration and bootstrap every enabled use case
    pub fn dispatcher(&self, environment: Option<&str>, extensions: &Extensions) -> Result<Dispatcher> {
        let config = self.load(environment)?;
        Ok(ticket_streamer::bootstrap(Arc::new(config), extensions))
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.server.jobs()
    }

    /// Every received job body parsed as a JSON envelope
    pub fn envelopes(&self) -> Result<Vec<Value>> {
        self.server
            .jobs()
            .iter()
            .map(|job| serde_json::from_slice(&job.body).context("Job body is not JSON"))
            .collect()
    }
}
