/*
 * preload-sim: headless runner for preloader sessions.
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

//! Session manifests: what a simulated session loads, and how each item behaves.
//!
//! ```yaml
//! scene: lawn
//! config:
//!   minimum_dwell: 500
//!   high_density: true
//! cached: [ui/cursor.png]
//! resources:
//!   - path: bg/day.jpg
//!     latency: 120
//!   - path: levels/1-1.json
//!     payload: { rows: 5 }
//! sounds:
//!   - name: grasswalk
//!     latency: 300
//! ```

use std::path::Path;
use std::time::Duration;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use preloader::config::{millis, PreloadConfig};

/// A simulated load session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Preloader configuration.
    pub config: PreloadConfig,
    /// Name of the target scene.
    pub scene: String,
    /// Whether some scene is already running when loading starts.
    pub active_scene: bool,
    /// Visual assets used by the target scene.
    pub resources: Vec<Item>,
    /// Sounds queued in the audio subsystem.
    pub sounds: Vec<Item>,
    /// Logical paths already present in the visual cache.
    pub cached: Vec<String>,
}

/// One simulated asset or sound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Item {
    /// Logical path (for visual assets) or name (for sounds).
    #[serde(alias = "name")]
    pub path: String,
    /// Time it takes to load this item, in milliseconds.
    #[serde(with = "millis")]
    pub latency: Duration,
    /// If present, loading fails with this message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,
    /// Decoded JSON content delivered with this item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Manifest {
    /// Read a manifest, in YAML (`.yaml`, `.yml`) or JSON (`.json`).
    pub fn load(path: &Path) -> Result<Manifest> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {path:?}"))?;
        let context = || format!("malformed manifest {path:?}");
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&text).with_context(context),
            Some("json") => serde_json::from_str(&text).with_context(context),
            _ => bail!("cannot infer manifest format from {path:?}, expecting .yaml or .json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_manifest() {
        let manifest: Manifest = serde_yaml::from_str(r#"
            scene: lawn
            config:
              minimum_dwell: 800
            cached: [ui/cursor.png]
            resources:
              - path: bg/day.jpg
                latency: 120
              - path: levels/1-1.json
                payload: { rows: 5 }
            sounds:
              - name: grasswalk
                fail: unsupported codec
        "#).unwrap();
        assert_eq!(manifest.scene, "lawn");
        assert_eq!(manifest.config.minimum_dwell, Duration::from_millis(800));
        assert!(!manifest.config.high_density);
        assert_eq!(manifest.resources[0].latency, Duration::from_millis(120));
        assert_eq!(manifest.resources[1].payload.as_ref().unwrap()["rows"], 5);
        assert_eq!(manifest.sounds[0].path, "grasswalk");
        assert_eq!(manifest.sounds[0].fail.as_deref(), Some("unsupported codec"));
    }

    #[test]
    fn unknown_fields_rejected() {
        let result = serde_json::from_str::<Manifest>(r#"{ "scene": "lawn", "timeout": 500 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn format_from_extension() {
        let err = Manifest::load(Path::new("session.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
        let dir = std::env::temp_dir().join(format!("preload-sim-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("session.txt");
        std::fs::write(&file, "scene: lawn").unwrap();
        let err = Manifest::load(&file).unwrap_err();
        assert!(err.to_string().contains("cannot infer manifest format"));
        let file = dir.join("session.yml");
        std::fs::write(&file, "scene: lawn").unwrap();
        assert_eq!(Manifest::load(&file).unwrap().scene, "lawn");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
