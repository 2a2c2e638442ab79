use crate::{error::ConfigError, geometry::Geometry};
use log::info;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

/// A monitored waterbody as listed in the catalogue file.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct WaterbodyConfig {
    #[serde(rename = "waterbody_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WaterbodyConfig {
    pub fn new(id: &str, name: &str, geometry: Geometry) -> Self {
        WaterbodyConfig {
            id: id.to_string(),
            name: name.to_string(),
            geometry,
            region: None,
            country: None,
            description: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::InvalidGeometry {
                id: self.name.clone(),
                reason: "waterbody id is empty".to_string(),
            });
        }
        self.geometry
            .validate()
            .map_err(|reason| ConfigError::InvalidGeometry {
                id: self.id.clone(),
                reason,
            })
    }

    /// Parses a JSON array of waterbodies and validates the whole catalogue.
    pub fn parse_config_json(json: &str) -> Result<Vec<WaterbodyConfig>, ConfigError> {
        let configs: Vec<WaterbodyConfig> = serde_json::from_str(json)?;
        if configs.is_empty() {
            return Err(ConfigError::Empty);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for config in &configs {
            config.validate()?;
            if !seen.insert(config.id.as_str()) {
                return Err(ConfigError::DuplicateId(config.id.clone()));
            }
        }
        Ok(configs)
    }

    pub fn load_config_file(path: &Path) -> Result<Vec<WaterbodyConfig>, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let configs = Self::parse_config_json(&json)?;
        info!(
            "Loaded {} waterbodies from {}",
            configs.len(),
            path.display()
        );
        Ok(configs)
    }

    /// Keeps the catalogue entries named in `ids`, in catalogue order.
    /// An empty filter keeps everything.
    pub fn select(
        configs: Vec<WaterbodyConfig>,
        ids: &[String],
    ) -> Result<Vec<WaterbodyConfig>, ConfigError> {
        if ids.is_empty() {
            return Ok(configs);
        }
        if let Some(unknown) = ids.iter().find(|id| !configs.iter().any(|c| &c.id == *id)) {
            return Err(ConfigError::UnknownWaterbody(unknown.clone()));
        }
        Ok(configs
            .into_iter()
            .filter(|c| ids.contains(&c.id))
            .collect())
    }
}
