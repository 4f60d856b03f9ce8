// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MapviewError, Result};

/// Environment variable naming a JSON file that overrides the defaults.
pub const CONFIG_ENV_VAR: &str = "MAPVIEW_BRIDGE_CONFIG";

/// Settings read once when the bridge library is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Fully qualified (slash separated) names of the managed classes.
    pub classes: ClassNames,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Logcat tag for bridge output.
    pub log_tag: String,
}

/// Managed class names the bridge binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    /// Wrapper class that declares the `native*` methods and callbacks.
    pub map_view: String,
    pub lon_lat: String,
    pub lon_lat_zoom: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            map_view: "com/mapbox/mapboxgl/lib/NativeMapView".into(),
            lon_lat: "com/mapbox/mapboxgl/lib/LonLat".into(),
            lon_lat_zoom: "com/mapbox/mapboxgl/lib/LonLatZoom".into(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            classes: ClassNames::default(),
            log_filter: "mapview=debug".into(),
            log_tag: "mbgl".into(),
        }
    }
}

impl BridgeConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], or the defaults when
    /// the variable is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let names = [
            ("map_view", &self.classes.map_view),
            ("lon_lat", &self.classes.lon_lat),
            ("lon_lat_zoom", &self.classes.lon_lat_zoom),
        ];
        for (key, name) in names {
            if name.is_empty() || name.contains('.') || name.contains(';') {
                return Err(MapviewError::Config(format!(
                    "classes.{key} must be a slash separated class name, got {name:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json(r#"{ "log_tag": "maps" }"#).unwrap();
        assert_eq!(config.log_tag, "maps");
        assert_eq!(config.classes, ClassNames::default());
        assert_eq!(config.log_filter, "mapview=debug");
    }

    #[test]
    fn dotted_class_name_is_rejected() {
        let err = BridgeConfig::from_json(
            r#"{ "classes": { "lon_lat": "com.example.LonLat" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, MapviewError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{ "classes": {{ "map_view": "org/example/MapView" }} }}"#
        )
        .unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.classes.map_view, "org/example/MapView");
        assert_eq!(config.classes.lon_lat, "com/mapbox/mapboxgl/lib/LonLat");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, MapviewError::Io(_)));
    }
}
