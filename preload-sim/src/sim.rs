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

//! Simulated collaborators: every item loads on its own thread, after its configured latency.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use preloader::prelude::*;
use crate::manifest::{Item, Manifest};

/// Outcome of a successful simulated session.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Every percentage reported, starting from the initial one.
    pub percents: Vec<u8>,
    /// Final state of the session.
    pub state: LoadState,
    /// Wall time from start to handoff.
    pub elapsed: Duration,
    /// Scene activated, with the JSON files handed to it.
    pub handoff: Option<Handoff<String>>,
    /// Keys in the visual cache after the session.
    pub cache: Vec<String>,
}

fn items(list: &[Item]) -> HashMap<String, Item> {
    list.iter().map(|item| (item.path.clone(), item.clone())).collect()
}

/// Items missing from the manifest load instantly.
fn load_item(item: Option<Item>) -> std::result::Result<Option<Value>, String> {
    let item = item.unwrap_or_default();
    std::thread::sleep(item.latency);
    match item.fail {
        Some(message) => Err(message),
        None => Ok(item.payload),
    }
}

struct SimTransport {
    resources: HashMap<String, Item>,
    cache: Arc<RwLock<HashSet<String>>>,
}

impl AssetTransport for SimTransport {
    fn load(&mut self, requests: &[AssetRequest], events: EventSender) {
        let workers: Vec<JoinHandle<bool>> = requests.iter().map(|request| {
            let item = self.resources.get(request.logical_path()).cloned();
            let path = request.physical_path().to_string();
            let cache = self.cache.clone();
            let events = events.clone();
            std::thread::spawn(move || match load_item(item) {
                Ok(payload) => {
                    log::trace!("fetched '{path}'");
                    cache.write().insert(path.clone());
                    events.asset_loaded(path, payload)
                }
                Err(message) => {
                    events.asset_failed(path, message);
                    false
                }
            })
        }).collect();
        std::thread::spawn(move || {
            let all_loaded = workers.into_iter()
                .fold(true, |ok, worker| worker.join().unwrap_or(false) && ok);
            if all_loaded { events.assets_complete(); }
        });
    }
}

struct SimAudio {
    sounds: HashMap<String, Item>,
}

impl AudioSubsystem for SimAudio {
    fn load(&mut self, sound: &SoundRequest, events: EventSender) {
        let item = self.sounds.get(sound.name()).cloned();
        let name = sound.name().to_string();
        std::thread::spawn(move || match load_item(item) {
            Ok(_) => events.sound_loaded(name),
            Err(message) => events.sound_failed(name, message),
        });
    }

    fn stop_all(&mut self) { log::debug!("audio stopped") }
}

struct SimScenes {
    active: bool,
    activated: Arc<Mutex<Option<Handoff<String>>>>,
}

impl SceneSystem<String> for SimScenes {
    fn has_active_scene(&self) -> bool { self.active }
    fn activate(&mut self, handoff: Handoff<String>) {
        log::info!("scene '{}' activated with {} data files", handoff.scene, handoff.json.len());
        *self.activated.lock() = Some(handoff);
    }
}

/// Run the session described by the `manifest` to completion, ticking every `tick`.
pub fn simulate(manifest: Manifest, tick: Duration) -> Result<Report> {
    let cache = Arc::new(RwLock::new(manifest.cached.iter().cloned().collect::<HashSet<_>>()));
    let activated = Arc::new(Mutex::new(None));
    let collab: Collaborators<String> = Collaborators {
        transport: Box::new(SimTransport { resources: items(&manifest.resources), cache: cache.clone() }),
        audio: Box::new(SimAudio { sounds: items(&manifest.sounds) }),
        scenes: Box::new(SimScenes { active: manifest.active_scene, activated: activated.clone() }),
        clock: Box::new(MonotonicClock::default()),
        cache: Box::new(cache.clone()),
    };
    let inputs = SessionInputs {
        pending_resources: manifest.resources.iter().map(|item| item.path.clone()).collect(),
        pending_sounds: manifest.sounds.iter().map(|item| item.path.clone()).collect(),
    };
    let mut orchestrator = LoadOrchestrator::new(inputs, manifest.scene, manifest.config, collab);

    let percents = Arc::new(Mutex::new(vec![orchestrator.percent()]));
    let sink = percents.clone();
    orchestrator.on_percent_change(Box::new(move |percent| {
        log::info!("{percent}%");
        sink.lock().push(percent);
        Ok(())
    }));

    let began = Instant::now();
    let mode = orchestrator.start()?;
    log::info!("loading started, {mode:?}");
    let state = orchestrator.run(tick)?;
    let elapsed = began.elapsed();

    let percents = percents.lock().clone();
    let handoff = activated.lock().take();
    let mut cache: Vec<_> = cache.read().iter().cloned().collect();
    cache.sort();
    Ok(Report { percents, state, elapsed, handoff, cache })
}
