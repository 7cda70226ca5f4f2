//! TOML-based configuration.
//!
//! Example configuration:
//! ```toml
//! [dataset]
//! path = "LondonAirBnBSep2021.csv"
//!
//! [map]
//! center = [51.509865, -0.118092]
//! zoom = 11
//! output = "london_map.geojson"
//!
//! [histogram]
//! max_price = 800.0
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::geo::Coordinate;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "listings.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LISTINGS_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub dataset: DatasetSettings,
    pub map: MapSettings,
    pub histogram: HistogramSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetSettings {
    /// Listings file (.csv or .parquet).
    pub path: PathBuf,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("LondonAirBnBSep2021.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MapSettings {
    /// Initial viewport centre as [latitude, longitude].
    pub center: [f64; 2],
    pub zoom: u8,
    /// Where `--map` writes when no path is given.
    pub output: PathBuf,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: [51.509865, -0.118092],
            zoom: 11,
            output: PathBuf::from("london_map.geojson"),
        }
    }
}

impl MapSettings {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.center[0], self.center[1])
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistogramSettings {
    /// Upper end of the plotted price range; dearer listings are left out.
    pub max_price: f64,
}

impl Default for HistogramSettings {
    fn default() -> Self {
        Self { max_price: 800.0 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve settings for a run.
    ///
    /// An explicit path (argument, then `LISTINGS_CONFIG`) must exist.
    /// Otherwise `./listings.toml` is used when present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }

        Ok(Settings::default())
    }
}
