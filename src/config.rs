use crate::capture::RegistryConfig;
use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// Directory uploaded frames are written to
    pub storage_path: String,
    pub idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load `path` (any format the config crate understands), then apply
    /// `CAPTURE__<SECTION>__<KEY>` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CAPTURE").separator("__"))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.registry_config()?;

        Ok(cfg)
    }

    /// Registry settings from the `[capture]` section
    ///
    /// A zero idle TTL would expire every session on its next access, so it is
    /// rejected. A zero sweep interval is raised to one second.
    pub fn registry_config(&self) -> Result<RegistryConfig> {
        if self.capture.idle_ttl_secs == 0 {
            bail!("capture.idle_ttl_secs must be at least 1");
        }

        Ok(RegistryConfig {
            idle_ttl: Duration::from_secs(self.capture.idle_ttl_secs),
            sweep_interval: Duration::from_secs(self.capture.sweep_interval_secs.max(1)),
        })
    }
}
