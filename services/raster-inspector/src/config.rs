//! Inspector configuration.

use anyhow::{Context, Result};
use raster_processor::ResampleConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Top-level inspector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Root holding raster blobs and region GeoJSON files
    pub data_dir: PathBuf,

    /// Memory budget for the raster cache, in megabytes
    pub cache_size_mb: usize,

    /// Resampler settings
    pub resample: ResampleConfig,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            cache_size_mb: 256,
            resample: ResampleConfig::default(),
        }
    }
}

impl InspectorConfig {
    /// Load configuration from a YAML file; missing keys take their defaults.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Invalid inspector config")?;
        config
            .resample
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid resample config: {}", e))?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self {
            resample: ResampleConfig::from_env(),
            ..Self::default()
        };

        if let Ok(dir) = env::var("INSPECTOR_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(mb) = env::var("INSPECTOR_CACHE_MB")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.cache_size_mb = mb;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_partial_overrides() {
        let config = InspectorConfig::from_yaml_str(
            "data_dir: /srv/rasters\nresample:\n  target_resolution: 0.1\n",
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/rasters"));
        assert_eq!(config.cache_size_mb, 256);
        assert_eq!(config.resample.target_resolution, 0.1);
        assert!(config.resample.require_date);
    }

    #[test]
    fn test_yaml_rejects_bad_resolution() {
        assert!(InspectorConfig::from_yaml_str("resample:\n  target_resolution: -1.0\n").is_err());
    }

    #[test]
    fn test_yaml_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InspectorConfig::from_yaml(dir.path().join("nope.yaml")).is_err());
    }
}
