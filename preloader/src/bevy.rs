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

//! Integration with [`bevy`]: tick a preloader once per frame in the [`Update`] schedule.

use std::marker::PhantomData;
use bevy::prelude::*;
use derivative::Derivative;
use crate::collab::ManualClock;
use crate::orchestrator::LoadOrchestrator;
use crate::session::LoadState;

/// Preloading states.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Hash, States)]
pub enum PreloadState {
    /// The preloader is running.
    #[default]
    Loading,
    /// The target scene has been activated.
    Ready,
    /// Loading failed, or was cancelled.
    Failure,
}

/// Preloader resource. The `clock` should be the one given to the orchestrator's collaborators:
/// it is advanced by the frame time before each tick.
#[derive(Resource, Debug)]
pub struct Preloader<S: Send + Sync + 'static> {
    /// The load orchestrator, started on the first frame.
    pub orchestrator: LoadOrchestrator<S>,
    /// Clock for the orchestrator.
    pub clock: ManualClock,
}

impl<S: Send + Sync + 'static> Preloader<S> {
    /// Wrap an orchestrator with its clock.
    pub fn new(orchestrator: LoadOrchestrator<S>, clock: ManualClock) -> Self {
        Preloader { orchestrator, clock }
    }
}

/// Plugin ticking the [`Preloader<S>`] resource (if there is one) while in
/// [`PreloadState::Loading`]. Requires bevy's `StatesPlugin`.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""), Copy(bound = ""), Clone(bound = ""))]
pub struct PreloadPlugin<S>(PhantomData<fn() -> S>);

impl<S: Send + Sync + 'static> Plugin for PreloadPlugin<S> {
    fn build(&self, app: &mut App) {
        app.init_state::<PreloadState>()
            .add_systems(Update, tick_preloader_system::<S>
                .run_if(in_state(PreloadState::Loading))
                .run_if(resource_exists::<Preloader<S>>));
    }
}

fn tick_preloader_system<S: Send + Sync + 'static>(
    time: Res<Time>,
    mut preloader: ResMut<Preloader<S>>,
    mut next_state: ResMut<NextState<PreloadState>>,
) {
    let preloader = &mut *preloader;
    preloader.clock.advance(time.delta());
    let orchestrator = &mut preloader.orchestrator;
    let result = match orchestrator.state() {
        LoadState::Init => orchestrator.start().and_then(|_| orchestrator.tick()),
        _ => orchestrator.tick(),
    };
    match result {
        Ok(LoadState::HandedOff) => next_state.set(PreloadState::Ready),
        Ok(LoadState::Failed | LoadState::Cancelled) => next_state.set(PreloadState::Failure),
        Ok(_) => {}
        Err(err) => {
            log::error!("preloading failed: {err}");
            next_state.set(PreloadState::Failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;
    use bevy::state::app::StatesPlugin;
    use crate::prelude::*;
    use super::*;

    struct Nothing;

    impl AssetTransport for Nothing {
        fn load(&mut self, _: &[AssetRequest], events: EventSender) { events.assets_complete(); }
    }

    impl AudioSubsystem for Nothing {
        fn load(&mut self, sound: &SoundRequest, events: EventSender) { events.sound_loaded(sound.name()); }
    }

    impl SceneSystem<&'static str> for Nothing {
        fn has_active_scene(&self) -> bool { true }
        fn activate(&mut self, _: Handoff<&'static str>) {}
    }

    struct Broken;

    impl AudioSubsystem for Broken {
        fn load(&mut self, sound: &SoundRequest, events: EventSender) {
            events.sound_failed(sound.name(), "unsupported codec");
        }
    }

    fn app_with(audio: Box<dyn AudioSubsystem>) -> (App, ManualClock) {
        let clock = ManualClock::default();
        let collab: Collaborators<&'static str> = Collaborators {
            transport: Box::new(Nothing),
            audio,
            scenes: Box::new(Nothing),
            clock: Box::new(clock.clone()),
            cache: Box::new(HashSet::<String>::new()),
        };
        let inputs = SessionInputs { pending_resources: vec![], pending_sounds: vec!["click".into()] };
        let orchestrator = LoadOrchestrator::new(inputs, "almanac", PreloadConfig::default(), collab);

        let mut app = App::new();
        app.add_plugins((StatesPlugin, PreloadPlugin::<&'static str>::default()))
            .init_resource::<Time>()
            .insert_resource(Preloader::new(orchestrator, clock.clone()));
        (app, clock)
    }

    fn orchestrator_state(app: &App) -> LoadState {
        app.world().resource::<Preloader<&'static str>>().orchestrator.state()
    }

    fn preload_state(app: &App) -> PreloadState {
        *app.world().resource::<State<PreloadState>>().get()
    }

    #[test]
    fn plugin_reaches_ready() {
        let (mut app, clock) = app_with(Box::new(Nothing));
        // time never advances on its own: `Time` is not updated without `TimePlugin`
        for _ in 0..3 { app.update(); }
        assert_eq!(orchestrator_state(&app), LoadState::Dwelling);
        clock.advance(Duration::from_millis(500));
        for _ in 0..3 { app.update(); }
        assert_eq!(preload_state(&app), PreloadState::Ready);
    }

    #[test]
    fn failed_sound_means_failure() {
        let (mut app, clock) = app_with(Box::new(Broken));
        for _ in 0..3 { app.update(); }
        assert_eq!(orchestrator_state(&app), LoadState::Failed);
        assert_eq!(preload_state(&app), PreloadState::Failure);
        clock.advance(Duration::from_secs(1));
        for _ in 0..3 { app.update(); }
        assert_eq!(preload_state(&app), PreloadState::Failure);
    }
}
