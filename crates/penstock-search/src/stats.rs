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

/// Run-level statistics of one complete solve.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunStatistics {
    pub schedules_found: u64,
    pub used_workers: usize,
    pub solve_duration: std::time::Duration,
}

/// Builder for [`RunStatistics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatisticsBuilder {
    schedules_found: u64,
    used_workers: usize,
    solve_duration: std::time::Duration,
}

impl Default for RunStatisticsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStatisticsBuilder {
    pub fn new() -> Self {
        Self {
            schedules_found: 0,
            used_workers: 1,
            solve_duration: std::time::Duration::ZERO,
        }
    }

    pub fn schedules_found(mut self, schedules_found: u64) -> Self {
        self.schedules_found = schedules_found;
        self
    }

    pub fn used_workers(mut self, used_workers: usize) -> Self {
        self.used_workers = used_workers;
        self
    }

    pub fn solve_duration(mut self, solve_duration: std::time::Duration) -> Self {
        self.solve_duration = solve_duration;
        self
    }

    pub fn build(self) -> RunStatistics {
        RunStatistics {
            schedules_found: self.schedules_found,
            used_workers: self.used_workers,
            solve_duration: self.solve_duration,
        }
    }
}

impl std::fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Run Statistics:")?;
        writeln!(f, "  Schedules found: {}", self.schedules_found)?;
        writeln!(f, "  Workers used:    {}", self.used_workers)?;
        writeln!(f, "  Solve duration:  {:.2?}", self.solve_duration)?;
        Ok(())
    }
}
