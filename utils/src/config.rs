use std::time::Duration;

use clap::Parser;

/// CLI flags for the broker server. Constructed once in `main` and passed
/// by value to whatever needs it — there is no ambient global config.
#[derive(Debug, Clone, Parser)]
#[command(name = "broker-server", about = "Single-node delivery broker")]
pub struct ServerConfig {
    /// Address to bind the TCP listener to.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the TCP listener to.
    #[arg(long, default_value_t = 9000)]
    pub port: u16,

    /// Lease reaper sweep interval, in seconds.
    #[arg(long = "reaper-interval", default_value_t = 30.0)]
    pub reaper_interval: f64,

    /// Log level passed to the tracing subscriber (trace/debug/info/warn/error).
    #[arg(long = "log-level", default_value = "INFO")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs_f64(self.reaper_interval.max(0.0))
    }
}
