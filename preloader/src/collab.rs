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

//! Boundaries to the collaborators of a load session: the asset transport, the audio subsystem,
//! the scene system, the clock, and the visual asset cache.
//!
//! Collaborators never call back into the session. Instead, they report through an
//! [`EventSender`], and the session drains the reports on its own ticks. Reports may be sent from
//! any thread.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use crate::session::{AssetRequest, SoundRequest};

/// Reports from the transport and the audio subsystem.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// One visual asset finished loading, optionally with some decoded JSON.
    AssetLoaded {
        /// Physical path of the asset.
        path: String,
        /// JSON content, for data files.
        payload: Option<Value>,
    },
    /// All visual assets requested from the transport finished loading.
    AssetsComplete,
    /// One visual asset failed to load.
    AssetFailed {
        /// Physical path of the asset.
        path: String,
        /// Error message from the transport.
        message: String,
    },
    /// One sound finished loading.
    SoundLoaded {
        /// Name of the sound.
        name: String,
    },
    /// One sound failed to load.
    SoundFailed {
        /// Name of the sound.
        name: String,
        /// Error message from the audio subsystem.
        message: String,
    },
}

/// Sending end for [`LoadEvent`]s, handed to collaborators when loading is requested.
#[derive(Debug, Clone)]
pub struct EventSender(pub(crate) Sender<LoadEvent>);

impl EventSender {
    /// Send a raw event. Returns `false` once the session has finished (handed off, failed, or
    /// cancelled) or has been dropped, in which case further reports are pointless.
    pub fn send(&self, event: LoadEvent) -> bool {
        let sent = self.0.send(event).is_ok();
        if !sent { log::trace!("load session finished, event discarded"); }
        sent
    }

    /// Report a loaded visual asset.
    pub fn asset_loaded(&self, path: impl Into<String>, payload: Option<Value>) -> bool {
        self.send(LoadEvent::AssetLoaded { path: path.into(), payload })
    }
    /// Report that all visual assets are loaded.
    pub fn assets_complete(&self) -> bool { self.send(LoadEvent::AssetsComplete) }
    /// Report a failed visual asset.
    pub fn asset_failed(&self, path: impl Into<String>, message: impl Into<String>) -> bool {
        self.send(LoadEvent::AssetFailed { path: path.into(), message: message.into() })
    }
    /// Report a loaded sound.
    pub fn sound_loaded(&self, name: impl Into<String>) -> bool {
        self.send(LoadEvent::SoundLoaded { name: name.into() })
    }
    /// Report a failed sound.
    pub fn sound_failed(&self, name: impl Into<String>, message: impl Into<String>) -> bool {
        self.send(LoadEvent::SoundFailed { name: name.into(), message: message.into() })
    }
}

/// Fetches visual assets.
pub trait AssetTransport: Send + Sync {
    /// Start loading all the requests. Called once per session. Every request should be reported
    /// with either [`AssetLoaded`](LoadEvent::AssetLoaded) or [`AssetFailed`](LoadEvent::AssetFailed),
    /// followed by one [`AssetsComplete`](LoadEvent::AssetsComplete) if all of them succeed.
    fn load(&mut self, requests: &[AssetRequest], events: EventSender);
}

/// Loads sounds.
pub trait AudioSubsystem: Send + Sync {
    /// Start loading one sound, reporting with [`SoundLoaded`](LoadEvent::SoundLoaded) or
    /// [`SoundFailed`](LoadEvent::SoundFailed). All sounds of a session are requested at once.
    fn load(&mut self, sound: &SoundRequest, events: EventSender);
    /// Stop everything currently playing. Called when the loading screen shows up.
    fn stop_all(&mut self) {}
}

/// What the target scene receives at handoff.
#[derive(Debug, Clone, PartialEq)]
pub struct Handoff<S> {
    /// The scene to activate.
    pub scene: S,
    /// Plain JSON data files loaded during the session, keyed by physical path.
    pub json: HashMap<String, Value>,
}

/// Scene management.
pub trait SceneSystem<S>: Send + Sync {
    /// Is some scene currently running (and driving the frame loop)?
    fn has_active_scene(&self) -> bool;
    /// Activate the target scene. Called exactly once per successful session.
    fn activate(&mut self, handoff: Handoff<S>);
}

/// Monotonic time source, as a duration since an arbitrary origin.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Copy, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self { MonotonicClock { origin: Instant::now() } }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration { self.origin.elapsed() }
}

/// Clock advanced explicitly, by a frame driver or by tests. Clones share the same time.
///
/// ```
/// # use std::time::Duration;
/// use preloader::collab::{Clock, ManualClock};
/// let clock = ManualClock::default();
/// let driver = clock.clone();
/// driver.advance(Duration::from_millis(16));
/// assert_eq!(clock.now(), Duration::from_millis(16));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<Mutex<Duration>>);

impl ManualClock {
    /// Move the time forward.
    pub fn advance(&self, delta: Duration) { *self.0.lock() += delta }
    /// Jump to some time. Going backwards breaks monotonicity; callers should not.
    pub fn set(&self, now: Duration) { *self.0.lock() = now }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration { *self.0.lock() }
}

/// Cache of already loaded visual assets.
pub trait VisualCache: Send + Sync {
    /// Is the asset (by logical path) already loaded?
    fn contains(&self, path: &str) -> bool;
    /// Re-key every entry carrying the density `marker` without it, replacing existing entries.
    /// Returns the number of entries re-keyed.
    fn normalize_density(&mut self, marker: &str) -> usize;
}

fn marked_keys<'a>(keys: impl Iterator<Item=&'a String>, marker: &str) -> Vec<(String, String)> {
    keys.filter_map(|key| Some((key.clone(), crate::path::strip_marker(key, marker)?)))
        .collect()
}

impl<T: Send + Sync> VisualCache for HashMap<String, T> {
    fn contains(&self, path: &str) -> bool { self.contains_key(path) }
    fn normalize_density(&mut self, marker: &str) -> usize {
        let renames = marked_keys(self.keys(), marker);
        for (from, to) in renames.iter() {
            if let Some(entry) = self.remove(from) {
                self.insert(to.clone(), entry);
            }
        }
        renames.len()
    }
}

impl VisualCache for HashSet<String> {
    fn contains(&self, path: &str) -> bool { HashSet::contains(self, path) }
    fn normalize_density(&mut self, marker: &str) -> usize {
        let renames = marked_keys(self.iter(), marker);
        for (from, to) in renames.iter() {
            self.remove(from);
            self.insert(to.clone());
        }
        renames.len()
    }
}

impl<C: VisualCache> VisualCache for Arc<RwLock<C>> {
    fn contains(&self, path: &str) -> bool { self.read().contains(path) }
    fn normalize_density(&mut self, marker: &str) -> usize { self.write().normalize_density(marker) }
}
