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

//! Minimum display time for the loading indicator.

use std::time::Duration;
use crate::error::{PreloadError, Result};

/// Default minimum time the loading indicator stays on screen.
pub const DEFAULT_MINIMUM_DWELL: Duration = Duration::from_millis(500);
/// Default lower bound of the remaining wait, so that handoff never happens on the same frame.
pub const DEFAULT_DWELL_FLOOR: Duration = Duration::from_millis(100);

/// Dwell timer, counting from the moment the indicator becomes visible.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DwellTimer {
    started_at: Option<Duration>,
    floor: Duration,
}

impl Default for DwellTimer {
    fn default() -> Self { DwellTimer::new(DEFAULT_DWELL_FLOOR) }
}

impl DwellTimer {
    /// A timer not yet started, never reporting less than `floor` remaining. A zero floor is
    /// raised to one millisecond.
    pub fn new(floor: Duration) -> Self {
        DwellTimer { started_at: None, floor: floor.max(Duration::from_millis(1)) }
    }

    /// Start the timer. Fails if already started.
    pub fn start(&mut self, now: Duration) -> Result<()> {
        if self.started_at.is_some() { return Err(PreloadError::AlreadyStarted); }
        self.started_at = Some(now);
        Ok(())
    }

    /// Start time, if started.
    pub fn started_at(&self) -> Option<Duration> { self.started_at }
    /// Lower bound for [`remaining`](DwellTimer::remaining).
    pub fn floor(&self) -> Duration { self.floor }

    /// Time elapsed since start (zero if not started).
    pub fn elapsed(&self, now: Duration) -> Duration {
        self.started_at.map_or(Duration::ZERO, |start| now.saturating_sub(start))
    }

    /// How long the indicator should still stay, but never less than the floor.
    ///
    /// ```
    /// # use std::time::Duration;
    /// use preloader::dwell::DwellTimer;
    /// let ms = Duration::from_millis;
    /// let mut timer = DwellTimer::new(ms(100));
    /// timer.start(ms(1000)).unwrap();
    /// assert_eq!(timer.remaining(ms(1050), ms(500)), ms(450));
    /// assert_eq!(timer.remaining(ms(1450), ms(500)), ms(100));
    /// assert_eq!(timer.remaining(ms(9000), ms(500)), ms(100));
    /// ```
    pub fn remaining(&self, now: Duration, minimum: Duration) -> Duration {
        minimum.saturating_sub(self.elapsed(now)).max(self.floor)
    }
}
