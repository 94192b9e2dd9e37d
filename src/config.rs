//! Map Configuration
//! Data locations, join keys, projection and frame sizes, loadable from JSON.

use crate::charts::ProjectionConfig;
use crate::data::Attribute;
use crate::stats::ClassRule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Locations of the three static inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataPaths {
    pub csv: PathBuf,
    pub background: PathBuf,
    pub counties: PathBuf,
    /// TopoJSON object names; the first object is used when unset.
    pub background_object: Option<String>,
    pub counties_object: Option<String>,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("data/new_mexico_education.csv"),
            background: PathBuf::from("data/us_states_limited.topojson"),
            counties: PathBuf::from("data/new_mexico_limited.topojson"),
            background_object: Some("us_states_limited".to_string()),
            counties_object: Some("new_mexico_limited".to_string()),
        }
    }
}

/// Column and property names used to match rows to regions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JoinKeys {
    pub csv_key: String,
    pub csv_name: Option<String>,
    pub region_key: String,
    pub region_name: Option<String>,
}

impl Default for JoinKeys {
    fn default() -> Self {
        Self {
            csv_key: "CountyFP".to_string(),
            csv_name: Some("County".to_string()),
            region_key: "COUNTYFP".to_string(),
            region_name: Some("NAME".to_string()),
        }
    }
}

/// Full application configuration. Every field has a default, so a config
/// file only needs the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub data: DataPaths,
    pub keys: JoinKeys,
    pub projection: ProjectionConfig,
    pub map_size: [u32; 2],
    pub chart_size: [u32; 2],
    pub class_rule: ClassRule,
    pub initial_attribute: Attribute,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            data: DataPaths::default(),
            keys: JoinKeys::default(),
            projection: ProjectionConfig::default(),
            map_size: [700, 460],
            chart_size: [600, 473],
            class_rule: ClassRule::default(),
            initial_attribute: Attribute::default(),
        }
    }
}

impl MapConfig {
    /// Load from a JSON file, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_path_gives_defaults() {
        let config = MapConfig::load(None).unwrap();
        assert_eq!(config, MapConfig::default());
        assert_eq!(config.keys.csv_key, "CountyFP");
        assert_eq!(config.map_size, [700, 460]);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "data": {{ "csv": "other.csv" }},
                "class_rule": "quantile",
                "initial_attribute": "Graduate Degree Rate"
            }}"#
        )
        .unwrap();

        let config = MapConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.data.csv, PathBuf::from("other.csv"));
        assert_eq!(
            config.data.counties,
            PathBuf::from("data/new_mexico_limited.topojson")
        );
        assert_eq!(config.class_rule, ClassRule::Quantile);
        assert_eq!(config.initial_attribute, Attribute::GraduateDegreeRate);
        assert_eq!(config.projection, ProjectionConfig::default());
    }

    #[test]
    fn unreadable_and_invalid_files_are_errors() {
        assert!(matches!(
            MapConfig::load(Some(Path::new("/nonexistent/map.json"))),
            Err(ConfigError::Io { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            MapConfig::load(Some(file.path())),
            Err(ConfigError::Parse(_))
        ));
    }
}
