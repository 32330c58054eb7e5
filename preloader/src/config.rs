/*
 * preloader: loading screen orchestration for librePvZ.
 * Copyright (c) 2022  Ruifeng Xie
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Preloader configuration. Durations are stored as milliseconds in configuration files.
//!
//! ```
//! use std::time::Duration;
//! use preloader::config::PreloadConfig;
//! let config: PreloadConfig = serde_json::from_str(r#"{
//!     "minimum_dwell": 1200,
//!     "high_density": true
//! }"#).unwrap();
//! assert_eq!(config.minimum_dwell, Duration::from_millis(1200));
//! assert_eq!(config.dwell_floor, Duration::from_millis(100));
//! assert_eq!(config.density_marker, "@2x");
//! ```

use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::dwell::{DEFAULT_DWELL_FLOOR, DEFAULT_MINIMUM_DWELL};
use crate::path::DEFAULT_DENSITY_MARKER;

/// Configuration for load sessions.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreloadConfig {
    /// Minimum time the loading indicator stays on screen, loading time included.
    #[serde(with = "millis")]
    pub minimum_dwell: Duration,
    /// Lower bound of the wait after everything is loaded.
    #[serde(with = "millis")]
    pub dwell_floor: Duration,
    /// Load high-density variants of visual assets (retina or hi-res displays).
    pub high_density: bool,
    /// Marker inserted before the file extension for high-density variants.
    pub density_marker: String,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        PreloadConfig {
            minimum_dwell: DEFAULT_MINIMUM_DWELL,
            dwell_floor: DEFAULT_DWELL_FLOOR,
            high_density: false,
            density_marker: DEFAULT_DENSITY_MARKER.to_string(),
        }
    }
}

impl PreloadConfig {
    /// Physical path for a logical asset path under this configuration.
    pub fn resolve(&self, path: &str) -> String {
        crate::path::resolve_with(path, self.high_density, &self.density_marker)
    }
}

/// (De)serialise [`Duration`] as an integer number of milliseconds.
pub mod millis {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialise as milliseconds, saturating at [`u64::MAX`].
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    /// Deserialise from milliseconds.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_loader_constants() {
        let config = PreloadConfig::default();
        assert_eq!(config.minimum_dwell, Duration::from_millis(500));
        assert_eq!(config.dwell_floor, Duration::from_millis(100));
        assert!(!config.high_density);
        assert_eq!(config.resolve("a.png"), "a.png");
    }

    #[test]
    fn json_round_trip_in_millis() {
        let config = PreloadConfig {
            minimum_dwell: Duration::from_millis(750),
            high_density: true,
            ..PreloadConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["minimum_dwell"], 750);
        assert_eq!(serde_json::from_value::<PreloadConfig>(json).unwrap(), config);
        assert_eq!(config.resolve("a.png"), "a@2x.png");
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(serde_json::from_str::<PreloadConfig>(r#"{"timeout": 5}"#).is_err());
    }
}
