// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Configuration and utilities

use crate::device::{ClockInfo, Family};
use crate::error::Error;

#[cfg(test)]
mod tests;

/// Parser parameters
///
/// Parameters describe the clocks of the traced device as well as the layout
/// of the trace ID space shared by all monitors. They are usually supplied by
/// the surrounding runtime, but may also be loaded from a file if the `serde`
/// feature is enabled.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Parameters {
    /// Frequency of the clock driving the trace timestamps in MHz
    pub trace_clock_mhz: f64,
    /// Frequency of the compute unit clock in MHz
    pub device_clock_mhz: f64,
    /// Data width of the global memory interface in bits
    pub memory_bit_width: u32,
    pub trace_ids: TraceIds,
}

/// See [PARAMETERS] for default values of individual fields
impl Default for Parameters {
    fn default() -> Self {
        PARAMETERS
    }
}

impl ClockInfo for Parameters {
    fn trace_clock_mhz(&self) -> f64 {
        self.trace_clock_mhz
    }

    fn device_clock_mhz(&self) -> f64 {
        self.device_clock_mhz
    }

    fn memory_bit_width(&self) -> u32 {
        self.memory_bit_width
    }
}

/// Default [Parameters]
pub const PARAMETERS: Parameters = Parameters {
    trace_clock_mhz: 300.0,
    device_clock_mhz: 300.0,
    memory_bit_width: 512,
    trace_ids: TRACE_IDS,
};

/// Layout of the trace ID space
///
/// Each monitor [`Family`] owns a contiguous range of trace IDs. The ranges of
/// the memory-mapped and accelerator monitors are inclusive, the range of the
/// stream monitors excludes `max_asm`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TraceIds {
    pub min_aim: u16,
    pub max_aim: u16,
    pub min_am: u16,
    pub max_am: u16,
    pub min_asm: u16,
    pub max_asm: u16,
}

impl TraceIds {
    /// Check whether the given ID belongs to a memory-mapped monitor
    pub fn is_memory(&self, id: u16) -> bool {
        (self.min_aim..=self.max_aim).contains(&id)
    }

    /// Check whether the given ID belongs to an accelerator monitor
    pub fn is_accel(&self, id: u16) -> bool {
        (self.min_am..=self.max_am).contains(&id)
    }

    /// Check whether the given ID belongs to a stream monitor
    pub fn is_stream(&self, id: u16) -> bool {
        (self.min_asm..self.max_asm).contains(&id)
    }

    /// Check the layout for empty or overlapping ranges
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_asm <= self.min_asm {
            return Err(Error::InvalidTraceIds(Family::Stream));
        }
        let ranges = [
            (Family::Memory, self.min_aim, self.max_aim),
            (Family::Accel, self.min_am, self.max_am),
            (Family::Stream, self.min_asm, self.max_asm - 1),
        ];
        if let Some((family, _, _)) = ranges.iter().find(|(_, min, max)| max < min) {
            return Err(Error::InvalidTraceIds(*family));
        }
        for (i, (a, min_a, max_a)) in ranges.iter().enumerate() {
            for (b, min_b, max_b) in &ranges[i + 1..] {
                if min_a <= max_b && min_b <= max_a {
                    return Err(Error::OverlappingTraceIds(*a, *b));
                }
            }
        }
        Ok(())
    }
}

/// See [TRACE_IDS] for default values of individual fields
impl Default for TraceIds {
    fn default() -> Self {
        TRACE_IDS
    }
}

/// Default [TraceIds] layout
pub const TRACE_IDS: TraceIds = TraceIds {
    min_aim: 0,
    max_aim: 61,
    min_am: 64,
    max_am: 544,
    min_asm: 576,
    max_asm: 607,
};
