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

//! Physical paths for high-density (retina) displays. For example, "`sprites/hero.png`" is loaded
//! from "`sprites/hero@2x.png`" when the display requires a high-density variant.

/// Marker used unless configured otherwise.
pub const DEFAULT_DENSITY_MARKER: &str = "@2x";

/// Resolve a logical path with the [default marker](DEFAULT_DENSITY_MARKER).
///
/// ```
/// use preloader::path::resolve;
/// assert_eq!(resolve("sprites/hero.png", true), "sprites/hero@2x.png");
/// assert_eq!(resolve("sprites/hero.png", false), "sprites/hero.png");
/// assert_eq!(resolve("data/level1", true), "data/level1@2x");
/// ```
pub fn resolve(path: &str, high_density: bool) -> String {
    resolve_with(path, high_density, DEFAULT_DENSITY_MARKER)
}

/// Resolve a logical path: insert `marker` right before the last `.` of the path, or append it if
/// there is no `.` at all. Paths are returned unchanged if `high_density` is `false`.
pub fn resolve_with(path: &str, high_density: bool, marker: &str) -> String {
    if !high_density { return path.to_string(); }
    let split = path.rfind('.').unwrap_or(path.len());
    let (stem, ext) = path.split_at(split);
    let mut resolved = String::with_capacity(path.len() + marker.len());
    resolved.push_str(stem);
    resolved.push_str(marker);
    resolved.push_str(ext);
    resolved
}

/// Remove the first occurrence of `marker`, if any.
///
/// ```
/// use preloader::path::strip_marker;
/// assert_eq!(strip_marker("sprites/hero@2x.png", "@2x").as_deref(), Some("sprites/hero.png"));
/// assert_eq!(strip_marker("sprites/hero.png", "@2x"), None);
/// ```
pub fn strip_marker(key: &str, marker: &str) -> Option<String> {
    if marker.is_empty() || !key.contains(marker) { return None; }
    Some(key.replacen(marker, "", 1))
}
