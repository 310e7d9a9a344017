// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Device/host clock correlation
//!
//! Device timestamps are counted in cycles of a free-running trace clock. The
//! device periodically emits clock training packets carrying both a device
//! timestamp and the host time at which it was sampled. The [`Correlator`]
//! fits a line through each consecutive pair of such samples and uses it to
//! map device cycles to host time. Each training pair refits the line, which
//! progressively corrects drift between the two clocks.

use crate::device::Family;

#[cfg(test)]
mod tests;

/// Linear mapping from device cycles to host nanoseconds
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Line {
    /// Host nanoseconds per device cycle
    pub slope: f64,
    /// Host nanoseconds at device cycle zero
    pub offset: f64,
}

impl Line {
    /// Create the line assumed in the absence of training data
    ///
    /// The line assumes no drift and no offset between the two clocks.
    pub fn untrained(trace_clock_mhz: f64) -> Self {
        Self {
            slope: 1000.0 / trace_clock_mhz,
            offset: 0.0,
        }
    }

    /// Fit a line through two points
    ///
    /// Returns [`None`] if both points share the same device timestamp.
    pub fn through(first: (f64, f64), second: (f64, f64)) -> Option<Self> {
        let (x1, y1) = first;
        let (x2, y2) = second;
        if x2 == x1 {
            return None;
        }
        let slope = (y2 - y1) / (x2 - x1);
        Some(Self {
            slope,
            offset: y2 - slope * x2,
        })
    }

    /// Map a device timestamp to host milliseconds
    pub fn to_host_ms(&self, device_timestamp: u64) -> f64 {
        (self.slope * device_timestamp as f64 + self.offset) / 1e6
    }
}

/// Device/host clock correlator
///
/// The correlator keeps one [`Line`] per monitor [`Family`].
#[derive(Clone, Debug)]
pub struct Correlator {
    untrained: Line,
    lines: [Line; 3],
    pending: [Option<(f64, f64)>; 3],
}

impl Correlator {
    /// Create a correlator for the given trace clock frequency
    pub fn new(trace_clock_mhz: f64) -> Self {
        let untrained = Line::untrained(trace_clock_mhz);
        Self {
            untrained,
            lines: [untrained; 3],
            pending: Default::default(),
        }
    }

    /// Feed a clock training sample
    ///
    /// Samples are consumed in pairs. The first sample of a pair is only
    /// recorded, the second one refits the [`Family`]'s line. A pair of samples
    /// sharing the same device timestamp is dropped and the previous line is
    /// kept.
    pub fn train(&mut self, family: Family, device_timestamp: u64, host_timestamp_ns: u64) {
        let point = (device_timestamp as f64, host_timestamp_ns as f64);
        let idx = family.index();
        match self.pending[idx].take() {
            None => self.pending[idx] = Some(point),
            Some(first) => match Line::through(first, point) {
                Some(line) => self.lines[idx] = line,
                None => log::debug!(
                    "Dropping clock training pair with identical device timestamp {device_timestamp}"
                ),
            },
        }
    }

    /// Map a device timestamp of the given [`Family`] to host milliseconds
    pub fn convert(&self, family: Family, device_timestamp: u64) -> f64 {
        self.lines[family.index()].to_host_ms(device_timestamp)
    }

    /// Retrieve the current [`Line`] of a [`Family`]
    pub fn line(&self, family: Family) -> Line {
        self.lines[family.index()]
    }

    /// Forget all training data
    pub fn reset(&mut self) {
        self.lines = [self.untrained; 3];
        self.pending = Default::default();
    }
}
