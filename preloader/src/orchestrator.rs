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

//! The load orchestration state machine.
//!
//! A session goes through the states `Init → LoadingVisual → LoadingAudio → AllLoaded → Dwelling →
//! Ready → HandedOff`, unless some fatal error sends it to `Failed`, or the owner cancels it.
//! All transitions happen inside [`start`](LoadOrchestrator::start) and
//! [`tick`](LoadOrchestrator::tick), on the thread driving the frame loop.

use std::time::Duration;
use crossbeam_channel::{Receiver, Sender};
use derivative::Derivative;
use crate::collab::*;
use crate::config::PreloadConfig;
use crate::error::{BoxError, PreloadError, Result};
use crate::progress::{PercentObserver, Pool};
use crate::session::{LoadSession, LoadState, SessionInputs};

/// Callback notified with every new state.
pub type StateObserver = Box<dyn FnMut(LoadState) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Who drives the frame loop during loading.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopMode {
    /// Some scene is running, and its loop now ticks the preloader instead.
    HostLoop,
    /// No scene is running. The owner of the preloader should drive it, e.g., with
    /// [`run`](LoadOrchestrator::run).
    OwnLoop,
}

/// Collaborators of a load session.
#[allow(missing_debug_implementations)]
pub struct Collaborators<S> {
    /// Fetches visual assets.
    pub transport: Box<dyn AssetTransport>,
    /// Loads sounds.
    pub audio: Box<dyn AudioSubsystem>,
    /// Activates the target scene.
    pub scenes: Box<dyn SceneSystem<S>>,
    /// Time source for the dwell timer.
    pub clock: Box<dyn Clock>,
    /// Already loaded visual assets.
    pub cache: Box<dyn VisualCache>,
}

/// Load orchestrator, owning one [`LoadSession`].
#[derive(Derivative)]
#[derivative(Debug(bound = "S: std::fmt::Debug"))]
pub struct LoadOrchestrator<S> {
    session: LoadSession<S>,
    config: PreloadConfig,
    deadline: Option<Duration>,
    #[derivative(Debug = "ignore")]
    collab: Collaborators<S>,
    #[derivative(Debug = "ignore")]
    events: (Sender<LoadEvent>, Receiver<LoadEvent>),
    #[derivative(Debug = "ignore")]
    state_observers: Vec<StateObserver>,
}

impl<S> LoadOrchestrator<S> {
    /// Prepare a session for the pending inputs. Nothing is loaded until [`start`](Self::start).
    pub fn new(inputs: SessionInputs, target_scene: S,
               config: PreloadConfig, collab: Collaborators<S>) -> Self {
        let session = LoadSession::new(inputs, &*collab.cache, target_scene, &config);
        LoadOrchestrator {
            session,
            config,
            deadline: None,
            collab,
            events: crossbeam_channel::unbounded(),
            state_observers: Vec::new(),
        }
    }

    /// The session data.
    pub fn session(&self) -> &LoadSession<S> { &self.session }
    /// Configuration for this session.
    pub fn config(&self) -> &PreloadConfig { &self.config }
    /// Current state.
    pub fn state(&self) -> LoadState { self.session.state }
    /// Current percentage.
    pub fn percent(&self) -> u8 { self.session.percent() }

    /// Observe percent changes, e.g., to scale the progress bar.
    pub fn on_percent_change(&mut self, observer: PercentObserver) {
        self.session.tracker.add_observer(observer)
    }

    /// Observe state changes.
    pub fn on_state_change(&mut self, observer: StateObserver) {
        self.state_observers.push(observer)
    }

    /// The loading indicator is now visible: start the dwell timer, and start loading.
    ///
    /// Visual assets are requested from the transport first. Sounds are requested only after all
    /// visual assets are reported loaded.
    pub fn start(&mut self) -> Result<LoopMode> {
        if self.session.state != LoadState::Init {
            return Err(PreloadError::AlreadyStarted);
        }
        let mode = if self.collab.scenes.has_active_scene() {
            LoopMode::HostLoop
        } else {
            LoopMode::OwnLoop
        };
        log::debug!("starting load session ({mode:?})");
        self.collab.audio.stop_all();
        let now = self.collab.clock.now();
        self.guard(|this| {
            this.session.timer.start(now)?;
            this.begin_visual()?;
            this.drain_events()
        })?;
        Ok(mode)
    }

    /// Process pending reports, and advance the state machine. Called once per frame.
    ///
    /// Returns the state after this tick. A fatal error is returned exactly once: the session is
    /// left in [`LoadState::Failed`], and later ticks do nothing.
    pub fn tick(&mut self) -> Result<LoadState> {
        match self.session.state {
            LoadState::Init => Err(PreloadError::NotStarted),
            state if state.is_terminal() => Ok(state),
            _ => {
                self.guard(Self::advance)?;
                Ok(self.session.state)
            }
        }
    }

    /// Give up on this session. No handoff happens afterwards, and pending reports are dropped.
    /// Returns `false` if the session is already finished.
    pub fn cancel(&mut self) -> bool {
        if self.session.state.is_terminal() { return false; }
        self.finish(LoadState::Cancelled);
        true
    }

    /// Drive the session from the current thread until it finishes, ticking every
    /// `tick_interval`. Starts the session if not yet started.
    pub fn run(&mut self, tick_interval: Duration) -> Result<LoadState> {
        if self.session.state == LoadState::Init {
            self.start()?;
        }
        loop {
            let state = self.tick()?;
            if state.is_terminal() { return Ok(state); }
            std::thread::sleep(tick_interval);
        }
    }

    fn guard(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        f(self).map_err(|err| {
            log::warn!("load session failed: {err}");
            self.finish(LoadState::Failed);
            err
        })
    }

    fn advance(&mut self) -> Result<()> {
        self.drain_events()?;
        let now = self.collab.clock.now();
        if self.session.state == LoadState::LoadingAudio && self.session.tracker.is_complete() {
            self.set_state(LoadState::AllLoaded)?;
            let wait = self.session.timer.remaining(now, self.config.minimum_dwell);
            log::debug!("everything loaded after {:?}, waiting {wait:?}", self.session.timer.elapsed(now));
            self.deadline = Some(now + wait);
            self.set_state(LoadState::Dwelling)?;
        } else if self.session.state == LoadState::Dwelling
            && self.deadline.map_or(true, |deadline| now >= deadline) {
            self.set_state(LoadState::Ready)?;
            self.hand_off();
            // the scene is running now: nothing may fail this session any more
            self.finish(LoadState::HandedOff);
        }
        Ok(())
    }

    fn begin_visual(&mut self) -> Result<()> {
        self.set_state(LoadState::LoadingVisual)?;
        if self.session.requests.is_empty() { return self.begin_audio(); }
        let sender = EventSender(self.events.0.clone());
        self.collab.transport.load(&self.session.requests, sender);
        Ok(())
    }

    fn begin_audio(&mut self) -> Result<()> {
        self.set_state(LoadState::LoadingAudio)?;
        for sound in self.session.sounds.iter() {
            self.collab.audio.load(sound, EventSender(self.events.0.clone()));
        }
        Ok(())
    }

    fn drain_events(&mut self) -> Result<()> {
        while let Ok(event) = self.events.1.try_recv() {
            self.handle_event(event)?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: LoadEvent) -> Result<()> {
        match event {
            LoadEvent::AssetLoaded { path, payload } => {
                self.session.tracker.record_completion(Pool::Visual)?;
                if let Some(payload) = payload {
                    self.session.keep_json(&path, payload);
                }
                if self.session.state == LoadState::LoadingVisual
                    && self.session.tracker.is_pool_complete(Pool::Visual) {
                    self.begin_audio()?;
                }
            }
            LoadEvent::AssetsComplete => {
                let tracker = &self.session.tracker;
                if tracker.is_pool_complete(Pool::Visual) {
                    log::trace!("transport finished");
                } else {
                    log::warn!("transport finished with only {}/{} assets reported, still waiting",
                               tracker.completed_in(Pool::Visual), tracker.total_in(Pool::Visual));
                }
            }
            LoadEvent::SoundLoaded { name } => {
                log::trace!("sound '{name}' loaded");
                self.session.tracker.record_completion(Pool::Audio)?;
            }
            LoadEvent::AssetFailed { path: item, message }
            | LoadEvent::SoundFailed { name: item, message } => {
                return Err(PreloadError::Transport { item, message });
            }
        }
        Ok(())
    }

    fn hand_off(&mut self) {
        if self.config.high_density {
            let n = self.collab.cache.normalize_density(&self.config.density_marker);
            log::debug!("{n} high-density cache entries re-keyed");
        }
        self.session.requests = Vec::new();
        self.session.sounds = Vec::new();
        if let Some(scene) = self.session.target_scene.take() {
            let json = std::mem::take(&mut self.session.json);
            self.collab.scenes.activate(Handoff { scene, json });
        }
    }

    fn set_state(&mut self, state: LoadState) -> Result<()> {
        log::debug!("load session: {} → {}", self.session.state, state);
        self.session.state = state;
        for observer in self.state_observers.iter_mut() {
            observer(state).map_err(PreloadError::Observer)?;
        }
        Ok(())
    }

    /// Enter a terminal state. Every [`EventSender`] handed out so far is disconnected, and
    /// reports still queued are dropped. Observer errors are only logged.
    fn finish(&mut self, state: LoadState) {
        log::debug!("load session: {} → {}", self.session.state, state);
        self.session.state = state;
        self.events = crossbeam_channel::bounded(0);
        for observer in self.state_observers.iter_mut() {
            if let Err(err) = observer(state) {
                log::warn!("state observer failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use parking_lot::Mutex;
    use super::*;
    use crate::session::{AssetRequest, SoundRequest};

    /// Transport and audio completing everything synchronously, recording the calls.
    #[derive(Clone, Default)]
    struct Immediate(Arc<Mutex<Vec<String>>>);

    impl AssetTransport for Immediate {
        fn load(&mut self, requests: &[AssetRequest], events: EventSender) {
            for request in requests {
                self.0.lock().push(format!("asset {}", request.physical_path()));
                events.asset_loaded(request.physical_path(), None);
            }
            events.assets_complete();
        }
    }

    impl AudioSubsystem for Immediate {
        fn load(&mut self, sound: &SoundRequest, events: EventSender) {
            self.0.lock().push(format!("sound {}", sound.name()));
            events.sound_loaded(sound.name());
        }
        fn stop_all(&mut self) { self.0.lock().push("stop".to_string()) }
    }

    impl SceneSystem<&'static str> for Immediate {
        fn has_active_scene(&self) -> bool { false }
        fn activate(&mut self, handoff: Handoff<&'static str>) {
            self.0.lock().push(format!("activate {}", handoff.scene));
        }
    }

    fn orchestrator(visual: &[&str], audio: &[&str]) -> (LoadOrchestrator<&'static str>, Immediate, ManualClock) {
        let log = Immediate::default();
        let clock = ManualClock::default();
        let inputs = SessionInputs {
            pending_resources: visual.iter().map(|s| s.to_string()).collect(),
            pending_sounds: audio.iter().map(|s| s.to_string()).collect(),
        };
        let collab: Collaborators<&'static str> = Collaborators {
            transport: Box::new(log.clone()),
            audio: Box::new(log.clone()),
            scenes: Box::new(log.clone()),
            clock: Box::new(clock.clone()),
            cache: Box::new(HashSet::<String>::new()),
        };
        (LoadOrchestrator::new(inputs, "lawn", PreloadConfig::default(), collab), log, clock)
    }

    #[test]
    fn synchronous_collaborators() {
        let (mut orchestrator, log, clock) = orchestrator(&["a.png", "b.png"], &["music"]);
        assert_eq!(orchestrator.start().unwrap(), LoopMode::OwnLoop);
        assert_eq!(orchestrator.state(), LoadState::LoadingAudio);
        assert_eq!(orchestrator.percent(), 100);
        assert_eq!(orchestrator.tick().unwrap(), LoadState::Dwelling);
        clock.advance(Duration::from_millis(499));
        assert_eq!(orchestrator.tick().unwrap(), LoadState::Dwelling);
        clock.advance(Duration::from_millis(1));
        assert_eq!(orchestrator.tick().unwrap(), LoadState::HandedOff);
        assert_eq!(*log.0.lock(), ["stop", "asset a.png", "asset b.png", "sound music", "activate lawn"]);
        assert!(orchestrator.session().requests().is_empty());
    }

    #[test]
    fn start_twice() {
        let (mut orchestrator, _, _) = orchestrator(&[], &[]);
        orchestrator.start().unwrap();
        assert!(matches!(orchestrator.start(), Err(PreloadError::AlreadyStarted)));
        assert_eq!(orchestrator.state(), LoadState::LoadingAudio);
    }

    #[test]
    fn tick_before_start() {
        let (mut orchestrator, _, _) = orchestrator(&["a.png"], &[]);
        assert!(matches!(orchestrator.tick(), Err(PreloadError::NotStarted)));
        assert_eq!(orchestrator.state(), LoadState::Init);
    }

    #[test]
    fn cancel_stops_everything() {
        let (mut orchestrator, log, clock) = orchestrator(&["a.png"], &[]);
        orchestrator.start().unwrap();
        assert!(orchestrator.cancel());
        assert!(!orchestrator.cancel());
        clock.advance(Duration::from_secs(10));
        assert_eq!(orchestrator.tick().unwrap(), LoadState::Cancelled);
        assert!(!log.0.lock().iter().any(|entry| entry.starts_with("activate")));
    }

    #[test]
    fn state_observer_failure_is_fatal() {
        let (mut orchestrator, log, _) = orchestrator(&["a.png"], &[]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        orchestrator.on_state_change(Box::new(move |state| {
            sink.lock().push(state);
            if state == LoadState::Dwelling { Err("overlay crashed".into()) } else { Ok(()) }
        }));
        orchestrator.start().unwrap();
        assert!(matches!(orchestrator.tick(), Err(PreloadError::Observer(_))));
        assert_eq!(orchestrator.state(), LoadState::Failed);
        assert_eq!(orchestrator.tick().unwrap(), LoadState::Failed);
        assert_eq!(*seen.lock(), [
            LoadState::LoadingVisual, LoadState::LoadingAudio, LoadState::AllLoaded,
            LoadState::Dwelling, LoadState::Failed,
        ]);
        assert!(!log.0.lock().iter().any(|entry| entry.starts_with("activate")));
    }
}
