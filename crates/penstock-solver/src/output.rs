// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! JSON persistence of the run artifacts: the incumbent schedule
//! (`solution.json`) and the merged per-depth statistics (`stats.json`).
//! A write failure does not block run completion; the caller logs it and
//! maps it to a non-zero exit.

use penstock_bnb::stats::SearchStatistics;
use penstock_model::schedule::Schedule;
use std::io;
use std::path::Path;

/// Writes the incumbent schedule as pretty-printed JSON
/// (`best_cost` / `best_x` / `best_y`).
pub fn write_solution(schedule: &Schedule, path: &Path) -> io::Result<()> {
    tracing::info!(path = %path.display(), "writing best solution");
    let json = serde_json::to_string_pretty(schedule)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    std::fs::write(path, json)
}

/// Reads a schedule previously written by [`write_solution`].
pub fn read_solution(path: &Path) -> io::Result<Schedule> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
}

/// Writes the merged statistics as pretty-printed JSON: one array of
/// length `horizon + 1` per prune-reason label, the `SIM_ERROR` lane, and
/// the duration in seconds.
pub fn write_stats(statistics: &SearchStatistics, path: &Path) -> io::Result<()> {
    tracing::info!(path = %path.display(), "writing statistics");
    let json = serde_json::to_string_pretty(statistics)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    std::fs::write(path, json)
}
