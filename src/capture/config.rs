use std::time::Duration;

/// Configuration for the session registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a session may go without create/append activity before it expires
    /// Default: 1800 seconds (30 minutes)
    pub idle_ttl: Duration,

    /// How often the background sweeper removes expired sessions
    /// Default: 60 seconds
    pub sweep_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
