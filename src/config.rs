use std::net::IpAddr;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Runtime settings for the aggregation server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Address the listening socket binds to.
    pub host: IpAddr,
    pub port: u16,
    /// Accept backlog handed to the listening socket.
    pub backlog: u32,
    /// Number of agencies expected to submit bets this round.
    pub agencies: usize,
    /// File every accepted bet is appended to.
    pub store_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 12345,
            backlog: 5,
            agencies: 5,
            store_path: PathBuf::from("bets.csv"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Extract(#[from] figment::Error),
}

/// Loads settings from an optional TOML file with `LOTTERY_`-prefixed
/// environment overrides.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("LOTTERY_"))
        .extract()?;

    Ok(config)
}
