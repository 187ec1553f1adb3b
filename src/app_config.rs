use crate::args::Args;
use config::{Config, ConfigError};
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use tracing::Level;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    oxidized: Oxidized,
    server: Server,
    log: Log,
}

impl AppConfig {
    /// Built-in defaults, then the optional config file, then flags and environment variables.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("oxidized.url", "http://localhost:8888")?
            .set_default("oxidized.username", "")?
            .set_default("oxidized.password", "")?
            .set_default("server.port", 8080_i64)?
            .set_default("server.path", "/metrics")?
            .set_default("log.level", "warn")?;

        if let Some(path) = &args.config {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder
            .set_override_option("oxidized.url", args.url.clone())?
            .set_override_option("oxidized.username", args.user.clone())?
            .set_override_option("oxidized.password", args.pass.clone())?
            .set_override_option("server.port", args.port.map(i64::from))?
            .set_override_option("server.path", args.path.clone())?
            .set_override_option("log.level", args.effective_log_level())?
            .build()?
            .try_deserialize()
    }

    pub fn oxidized(&self) -> &Oxidized {
        &self.oxidized
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn log(&self) -> &Log {
        &self.log
    }
}

#[derive(Debug, Deserialize)]
pub struct Oxidized {
    url: String,
    username: String,
    password: String,
}

impl Oxidized {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    port: u16,
    path: String,
}

impl Server {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Deserialize)]
pub struct Log {
    #[serde(deserialize_with = "deserialize_level")]
    level: Level,
}

impl Log {
    pub fn level(&self) -> Level {
        self.level
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    value
        .parse::<Level>()
        .map_err(|_| Error::custom(format!("invalid log level '{}', must be one of trace, debug, info, warn or error", value)))
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                oxidized: Oxidized {
                    url: "http://localhost:8888".to_string(),
                    username: "".to_string(),
                    password: "".to_string(),
                },
                server: Server {
                    port: 8080,
                    path: "/metrics".to_string(),
                },
                log: Log { level: Level::WARN },
            },
        }
    }

    pub fn oxidized_url(mut self, url: String) -> Self {
        self.config.oxidized.url = url;
        self
    }

    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.config.oxidized.username = username.to_string();
        self.config.oxidized.password = password.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
