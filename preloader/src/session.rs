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

//! Load sessions: what to load, how far we are, and where to go afterwards.

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use derivative::Derivative;
use serde_json::Value;
use crate::collab::VisualCache;
use crate::config::PreloadConfig;
use crate::dwell::DwellTimer;
use crate::progress::ProgressTracker;

/// One visual asset to load.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct AssetRequest {
    logical_path: String,
    physical_path: String,
}

impl AssetRequest {
    /// Request for a logical path, resolved according to the configuration.
    pub fn new(logical_path: impl Into<String>, config: &PreloadConfig) -> Self {
        let logical_path = logical_path.into();
        let physical_path = config.resolve(&logical_path);
        AssetRequest { logical_path, physical_path }
    }

    /// Path as used by the game, also the key into the visual cache.
    pub fn logical_path(&self) -> &str { &self.logical_path }
    /// Path actually fetched by the transport.
    pub fn physical_path(&self) -> &str { &self.physical_path }
}

/// One sound to load.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SoundRequest {
    name: String,
}

impl SoundRequest {
    /// Request for a named sound.
    pub fn new(name: impl Into<String>) -> Self { SoundRequest { name: name.into() } }
    /// Name of this sound in the audio subsystem.
    pub fn name(&self) -> &str { &self.name }
}

/// Everything pending when the loading screen is entered.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SessionInputs {
    /// Logical paths of visual assets used by the target scene.
    pub pending_resources: Vec<String>,
    /// Names in the audio subsystem's loading queue.
    pub pending_sounds: Vec<String>,
}

/// States of a load session.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LoadState {
    /// Constructed, not started.
    Init,
    /// Waiting for visual assets.
    LoadingVisual,
    /// Waiting for sounds.
    LoadingAudio,
    /// Everything loaded.
    AllLoaded,
    /// Everything loaded, keeping the indicator on screen for a while.
    Dwelling,
    /// About to hand off to the target scene.
    Ready,
    /// Target scene activated.
    HandedOff,
    /// Some fatal error occurred.
    Failed,
    /// The owner gave up on this session.
    Cancelled,
}

impl LoadState {
    /// No more state changes from here on.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadState::HandedOff | LoadState::Failed | LoadState::Cancelled)
    }
}

impl Display for LoadState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LoadState::Init => "init",
            LoadState::LoadingVisual => "loading visual assets",
            LoadState::LoadingAudio => "loading audio",
            LoadState::AllLoaded => "all loaded",
            LoadState::Dwelling => "dwelling",
            LoadState::Ready => "ready",
            LoadState::HandedOff => "handed off",
            LoadState::Failed => "failed",
            LoadState::Cancelled => "cancelled",
        })
    }
}

/// Data of one load session.
#[derive(Derivative)]
#[derivative(Debug(bound = "S: std::fmt::Debug"))]
pub struct LoadSession<S> {
    pub(crate) requests: Vec<AssetRequest>,
    pub(crate) sounds: Vec<SoundRequest>,
    pub(crate) tracker: ProgressTracker,
    pub(crate) timer: DwellTimer,
    pub(crate) state: LoadState,
    pub(crate) target_scene: Option<S>,
    #[derivative(Debug = "ignore")]
    pub(crate) json: HashMap<String, Value>,
}

impl<S> LoadSession<S> {
    /// New session. Resources already in the `cache` are skipped, and duplicated sound names are
    /// loaded only once.
    pub fn new(inputs: SessionInputs, cache: &dyn VisualCache,
               target_scene: S, config: &PreloadConfig) -> Self {
        let requests: Vec<_> = inputs.pending_resources.into_iter()
            .filter(|path| !cache.contains(path))
            .map(|path| AssetRequest::new(path, config))
            .collect();
        let mut seen = HashSet::new();
        let sounds: Vec<_> = inputs.pending_sounds.into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(SoundRequest::new)
            .collect();
        let tracker = ProgressTracker::new(requests.len(), sounds.len());
        log::debug!("new load session: {} visual assets, {} sounds", requests.len(), sounds.len());
        LoadSession {
            requests,
            sounds,
            tracker,
            timer: DwellTimer::new(config.dwell_floor),
            state: LoadState::Init,
            target_scene: Some(target_scene),
            json: HashMap::new(),
        }
    }

    /// Visual assets to load (empty after handoff).
    pub fn requests(&self) -> &[AssetRequest] { &self.requests }
    /// Sounds to load (empty after handoff).
    pub fn sounds(&self) -> &[SoundRequest] { &self.sounds }
    /// Progress so far.
    pub fn tracker(&self) -> &ProgressTracker { &self.tracker }
    /// The dwell timer.
    pub fn timer(&self) -> &DwellTimer { &self.timer }
    /// Current state.
    pub fn state(&self) -> LoadState { self.state }
    /// Current percentage.
    pub fn percent(&self) -> u8 { self.tracker.percent() }
    /// Plain JSON files loaded so far.
    pub fn json(&self) -> &HashMap<String, Value> { &self.json }

    /// Keep a JSON payload, unless it describes a sprite sheet (`frames`) or a skeleton (`bones`),
    /// which belong to the transport's own caches.
    pub(crate) fn keep_json(&mut self, path: &str, payload: Value) {
        let is_metadata = payload.get("frames").is_some() || payload.get("bones").is_some();
        if is_metadata {
            log::trace!("'{path}': sprite sheet or skeleton data, not kept");
        } else {
            self.json.insert(path.to_string(), payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    fn config(high_density: bool) -> PreloadConfig {
        PreloadConfig { high_density, ..PreloadConfig::default() }
    }

    #[test]
    fn cached_resources_are_skipped() {
        let cache = HashSet::from(["bg.jpg".to_string()]);
        let inputs = SessionInputs {
            pending_resources: vec!["bg.jpg".into(), "hero.png".into(), "level.json".into()],
            pending_sounds: vec!["music".into(), "click".into(), "music".into()],
        };
        let session = LoadSession::new(inputs, &cache, (), &config(true));
        let paths: Vec<_> = session.requests().iter().map(AssetRequest::physical_path).collect();
        assert_eq!(paths, ["hero@2x.png", "level@2x.json"]);
        assert_eq!(session.requests()[0].logical_path(), "hero.png");
        let names: Vec<_> = session.sounds().iter().map(SoundRequest::name).collect();
        assert_eq!(names, ["music", "click"]);
        assert_eq!(session.tracker().total(), 4);
        assert_eq!(session.state(), LoadState::Init);
    }

    #[test]
    fn nothing_to_load() {
        let session = LoadSession::new(SessionInputs::default(), &HashSet::<String>::new(), (), &config(false));
        assert_eq!(session.percent(), 100);
        assert!(session.tracker().is_complete());
    }

    #[test]
    fn json_metadata_filtered() {
        let mut session = LoadSession::new(SessionInputs::default(), &HashSet::<String>::new(), (), &config(false));
        session.keep_json("atlas.json", json!({ "frames": {} }));
        session.keep_json("spine.json", json!({ "bones": [] }));
        session.keep_json("level.json", json!({ "rows": 5 }));
        assert_eq!(session.json().len(), 1);
        assert_eq!(session.json()["level.json"]["rows"], 5);
    }

    #[test]
    fn terminal_states() {
        assert!(LoadState::HandedOff.is_terminal());
        assert!(LoadState::Failed.is_terminal());
        assert!(LoadState::Cancelled.is_terminal());
        assert!(!LoadState::Dwelling.is_terminal());
        assert_eq!(LoadState::LoadingAudio.to_string(), "loading audio");
    }
}
