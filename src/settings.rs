use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::line_format::LineFormat;

pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub timeout: Duration,
    pub format: LineFormat,
}

/// Settings as they come from the command line or a config file, every
/// field optional
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialSettings {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub timeout_secs: Option<f64>,
    pub format: Option<LineFormat>,
}

impl PartialSettings {
    /// Fields set on `self` win over `fallback`
    pub fn or(self, fallback: PartialSettings) -> PartialSettings {
        PartialSettings {
            port: self.port.or(fallback.port),
            baud_rate: self.baud_rate.or(fallback.baud_rate),
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
            format: self.format.or(fallback.format),
        }
    }

    pub fn resolve(self) -> Result<SerialSettings> {
        let timeout = match self.timeout_secs {
            Some(secs) => parse_timeout(secs)?,
            None => DEFAULT_TIMEOUT,
        };
        let baud_rate = self.baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
        if baud_rate == 0 {
            return Err(anyhow!("Baud rate must be greater than zero"));
        }

        Ok(SerialSettings {
            port: self.port.unwrap_or_else(|| DEFAULT_PORT.to_string()),
            baud_rate,
            timeout,
            format: self.format.unwrap_or_default(),
        })
    }
}

pub fn parse_timeout(secs: f64) -> Result<Duration> {
    let timeout = Duration::try_from_secs_f64(secs)
        .map_err(|_| anyhow!("Invalid timeout: {} seconds", secs))?;
    if timeout.is_zero() {
        return Err(anyhow!("Timeout must be greater than zero"));
    }
    Ok(timeout)
}

pub fn read_settings_file<P: AsRef<Path>>(path: P) -> Result<PartialSettings> {
    let path = path.as_ref();
    let config = read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: PartialSettings = serde_json::from_str(&config)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "anchor-terminal")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// An explicit config path has to exist, the default one is optional
pub fn load_config(explicit: Option<&Path>) -> Result<PartialSettings> {
    if let Some(path) = explicit {
        return read_settings_file(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            debug!("Using config file {}", path.display());
            read_settings_file(path)
        }
        _ => Ok(PartialSettings::default()),
    }
}
