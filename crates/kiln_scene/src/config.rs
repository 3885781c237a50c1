//! Scene Configuration
//!
//! Deserialized from JSON. Every field has a default so partial documents
//! load cleanly.

use kiln_core::Result;
use serde::{Deserialize, Serialize};

/// Scene-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub name: String,
    pub description: String,
    /// Draw the ground grid when a grid shape is supplied.
    pub debug_grid: bool,
    /// Ascending distance thresholds for terrain chunk LOD bands.
    pub terrain_lod_distances: Vec<f32>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "scene".to_owned(),
            description: String::new(),
            debug_grid: true,
            terrain_lod_distances: vec![50.0, 120.0, 250.0],
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config
            .terrain_lod_distances
            .sort_by(f32::total_cmp);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = SceneConfig::from_json_str(r#"{ "name": "courtyard" }"#).unwrap();
        assert_eq!(config.name, "courtyard");
        assert!(config.debug_grid);
        assert_eq!(config.terrain_lod_distances, vec![50.0, 120.0, 250.0]);
    }

    #[test]
    fn lod_distances_are_sorted() {
        let config =
            SceneConfig::from_json_str(r#"{ "terrain_lod_distances": [300.0, 20.0, 90.0] }"#)
                .unwrap();
        assert_eq!(config.terrain_lod_distances, vec![20.0, 90.0, 300.0]);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            SceneConfig::from_json_str("{ name"),
            Err(kiln_core::KilnError::Config(_))
        ));
    }
}
