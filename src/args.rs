use clap::Parser;

/// Oxidized exporter for Prometheus
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct Args {
    /// Path to expose metrics on [default: /metrics]
    #[arg(long, env = "OXIDIZED_EXPORTER_PATH")]
    pub path: Option<String>,

    /// Port to listen on [default: 8080]
    #[arg(long, env = "OXIDIZED_EXPORTER_PORT")]
    pub port: Option<u16>,

    /// URL of the Oxidized API [default: http://localhost:8888]
    #[arg(short = 'U', long, env = "OXIDIZED_EXPORTER_URL")]
    pub url: Option<String>,

    /// Username for the Oxidized API
    #[arg(short, long, env = "OXIDIZED_EXPORTER_USER")]
    pub user: Option<String>,

    /// Password for the Oxidized API
    #[arg(short, long, env = "OXIDIZED_EXPORTER_PASS", hide_env_values = true)]
    pub pass: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "OXIDIZED_EXPORTER_DEBUG")]
    pub debug: bool,

    /// Enable verbose logging
    #[arg(short, long, env = "OXIDIZED_EXPORTER_VERBOSE")]
    pub verbose: bool,

    /// Log level used without --debug or --verbose [default: warn]
    #[arg(long, env = "OXIDIZED_EXPORTER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Optional configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "OXIDIZED_EXPORTER_CONFIG")]
    pub config: Option<String>,
}

impl Args {
    pub fn effective_log_level(&self) -> Option<String> {
        if self.debug {
            Some("debug".to_string())
        } else if self.verbose {
            Some("info".to_string())
        } else {
            self.log_level.clone()
        }
    }
}
