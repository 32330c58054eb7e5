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

//! preloader: loading screen orchestration for librePvZ.
#![doc = include_str!("../README.md")]

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

// building blocks
pub mod error;
pub mod config;
pub mod path;
pub mod progress;
pub mod dwell;

// sessions
pub mod collab;
pub mod session;
pub mod orchestrator;

#[cfg(feature = "bevy")]
pub mod bevy;

/// Commonly used items.
pub mod prelude {
    pub use crate::collab::{
        AssetTransport, AudioSubsystem, Clock, EventSender, Handoff, LoadEvent,
        ManualClock, MonotonicClock, SceneSystem, VisualCache,
    };
    pub use crate::config::PreloadConfig;
    pub use crate::error::{PreloadError, Result};
    pub use crate::orchestrator::{Collaborators, LoadOrchestrator, LoopMode};
    pub use crate::session::{AssetRequest, LoadState, SessionInputs, SoundRequest};
}
