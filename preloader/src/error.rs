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

//! Errors for load sessions. Every one of them is fatal to the session that raised it.

use thiserror::Error;
use crate::progress::Pool;

/// Boxed error returned by fallible observers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Load session errors.
#[derive(Debug, Error)]
pub enum PreloadError {
    /// Negative item count for some pool.
    #[error("invalid configuration: {pool} count is negative ({count})")]
    InvalidConfiguration {
        /// The offending pool.
        pool: Pool,
        /// The count as given.
        count: i64,
    },
    /// More completions reported than there are items, i.e. some collaborator fired twice.
    #[error("overflow: more than {expected} completions reported for {pool}")]
    Overflow {
        /// The pool which overflowed.
        pool: Pool,
        /// Number of items expected in that pool.
        expected: usize,
    },
    /// Some asset or sound failed to load.
    #[error("failed to load '{item}': {message}")]
    Transport {
        /// Physical path of the asset, or name of the sound.
        item: String,
        /// Message from the transport or the audio subsystem.
        message: String,
    },
    /// The dwell timer (or the whole session) was started twice.
    #[error("loading already started")]
    AlreadyStarted,
    /// The session was ticked before being started.
    #[error("loading not started yet")]
    NotStarted,
    /// A percent or state observer failed.
    #[error("observer failed: {0}")]
    Observer(#[source] BoxError),
}

/// [Result](std::result::Result) type specialised for [`PreloadError`].
pub type Result<T> = std::result::Result<T, PreloadError>;
