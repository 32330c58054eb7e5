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

//! Aggregated loading progress over visual assets and sounds.

use std::fmt::{Display, Formatter};
use derivative::Derivative;
use crate::error::{BoxError, PreloadError, Result};

/// The two kinds of items a session loads.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Pool {
    /// Images, textures, atlases, and other data fetched by the asset transport.
    Visual,
    /// Sounds loaded by the audio subsystem.
    Audio,
}

impl Display for Pool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Pool::Visual => "visual asset",
            Pool::Audio => "audio",
        })
    }
}

/// Callback notified with the new percent value after every completion.
pub type PercentObserver = Box<dyn FnMut(u8) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Percentage of `completed` over `total`, rounded half up. Zero total counts as finished.
///
/// ```
/// use preloader::progress::percent;
/// let seq: Vec<u8> = (0..=6).map(|k| percent(k, 6)).collect();
/// assert_eq!(seq, [0, 17, 33, 50, 67, 83, 100]);
/// assert_eq!(percent(0, 0), 100);
/// ```
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 { return 100; }
    let completed = completed.min(total) as u128;
    let total = total as u128;
    ((completed * 200 + total) / (total * 2)) as u8
}

/// Progress tracker for one load session.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ProgressTracker {
    visual_total: usize,
    audio_total: usize,
    visual_completed: usize,
    audio_completed: usize,
    percent: u8,
    #[derivative(Debug = "ignore")]
    observers: Vec<PercentObserver>,
}

impl ProgressTracker {
    /// Tracker for the given item counts. Starts at 100% if there is nothing to load.
    pub fn new(visual_total: usize, audio_total: usize) -> Self {
        ProgressTracker {
            visual_total,
            audio_total,
            visual_completed: 0,
            audio_completed: 0,
            percent: percent(0, visual_total + audio_total),
            observers: Vec::new(),
        }
    }

    /// Tracker from signed counts, e.g., as read from a manifest.
    ///
    /// ```
    /// use preloader::progress::ProgressTracker;
    /// use preloader::error::PreloadError;
    /// assert_eq!(ProgressTracker::initialize(0, 0).unwrap().percent(), 100);
    /// assert!(matches!(ProgressTracker::initialize(3, -1),
    ///                  Err(PreloadError::InvalidConfiguration { count: -1, .. })));
    /// ```
    pub fn initialize(visual_total: i64, audio_total: i64) -> Result<Self> {
        let count = |pool, count: i64| usize::try_from(count)
            .map_err(|_| PreloadError::InvalidConfiguration { pool, count });
        Ok(ProgressTracker::new(count(Pool::Visual, visual_total)?, count(Pool::Audio, audio_total)?))
    }

    /// Register an observer for percent changes.
    pub fn add_observer(&mut self, observer: PercentObserver) { self.observers.push(observer) }

    /// Record one finished item of the given pool, and notify the observers.
    ///
    /// An observer error is returned as is, after the completion itself has been recorded.
    /// Observers registered after the failing one are not notified.
    pub fn record_completion(&mut self, pool: Pool) -> Result<u8> {
        let expected = self.total_in(pool);
        let completed = match pool {
            Pool::Visual => &mut self.visual_completed,
            Pool::Audio => &mut self.audio_completed,
        };
        if *completed >= expected {
            return Err(PreloadError::Overflow { pool, expected });
        }
        *completed += 1;
        self.percent = percent(self.completed(), self.total());
        log::trace!("{pool} completed ({}/{}), {}%", self.completed(), self.total(), self.percent);
        for observer in self.observers.iter_mut() {
            observer(self.percent).map_err(PreloadError::Observer)?;
        }
        Ok(self.percent)
    }

    /// Current percentage, within `0..=100`.
    pub fn percent(&self) -> u8 { self.percent }
    /// Number of finished items over both pools.
    pub fn completed(&self) -> usize { self.visual_completed + self.audio_completed }
    /// Number of items over both pools.
    pub fn total(&self) -> usize { self.visual_total + self.audio_total }

    /// Number of finished items in one pool.
    pub fn completed_in(&self, pool: Pool) -> usize {
        match pool {
            Pool::Visual => self.visual_completed,
            Pool::Audio => self.audio_completed,
        }
    }

    /// Number of items in one pool.
    pub fn total_in(&self, pool: Pool) -> usize {
        match pool {
            Pool::Visual => self.visual_total,
            Pool::Audio => self.audio_total,
        }
    }

    /// Have all items in this pool finished?
    pub fn is_pool_complete(&self, pool: Pool) -> bool { self.completed_in(pool) == self.total_in(pool) }
    /// Have all items finished?
    pub fn is_complete(&self) -> bool { self.completed() == self.total() }
}
