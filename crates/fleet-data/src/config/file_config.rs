//! File configuration for the dashboard

use std::fs;
use std::path::{Path, PathBuf};

use fleet_core::Geolocation;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::DataError;

/// Dashboard configuration, stored as JSON.
///
/// Keys missing from the file take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Path to the SQLite database
    pub database_path: PathBuf,

    /// Maximum number of boats returned by a proximity search
    pub nearby_limit: usize,

    /// Position reported by the fixed position provider
    pub home_position: Geolocation,

    /// Boat type selected when the dashboard starts
    pub initial_boat_type_id: String,

    /// Maximum tracing level (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,

    /// Whether to create and fill the sample database when it is missing
    pub seed_sample_data: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/fleet.db"),
            nearby_limit: 10,
            home_position: Geolocation::new(37.7749, -122.4194),
            initial_boat_type_id: String::new(),
            log_level: "info".to_string(),
            seed_sample_data: true,
        }
    }
}

impl DashboardConfig {
    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config: DashboardConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        info!("Loaded dashboard configuration from {:?}", path);
        Ok(config)
    }

    /// Load a configuration file if it exists, otherwise use defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!("No configuration at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DataError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.nearby_limit == 0 {
            return Err(DataError::Config("nearby_limit must be at least 1".to_string()));
        }
        let Geolocation { latitude, longitude } = self.home_position;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(DataError::Config(format!(
                "home_position ({latitude}, {longitude}) is not a valid coordinate"
            )));
        }
        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            other => Err(DataError::Config(format!("unknown log level '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.json");
        fs::write(&path, r#"{ "nearby_limit": 5, "log_level": "debug" }"#).unwrap();

        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.nearby_limit, 5);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.database_path, PathBuf::from("data/fleet.db"));
        assert!(config.seed_sample_data);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fleet.json");
        let config = DashboardConfig {
            initial_boat_type_id: "T2".to_string(),
            ..Default::default()
        };

        config.save(&path).unwrap();
        assert_eq!(DashboardConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let zero_limit = DashboardConfig {
            nearby_limit: 0,
            ..Default::default()
        };
        assert!(matches!(zero_limit.validate(), Err(DataError::Config(_))));

        let off_globe = DashboardConfig {
            home_position: Geolocation::new(123.0, 0.0),
            ..Default::default()
        };
        assert!(off_globe.validate().is_err());

        let bad_level = DashboardConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(bad_level.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }
}
