// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Raw trace packets and their classification
//!
//! Trace packets are produced by the device offload, which reads them from the
//! trace FIFO and splits them into their logical fields. This crate is not
//! concerned with the binary layout of the FIFO contents.
//!
//! Every packet carries a trace ID identifying the monitor slot that emitted
//! it. The [`Monitor`] classification maps a trace ID to the monitor
//! [`Family`][crate::device::Family], slot and, for accelerator monitors, the
//! set of signals that changed.

use crate::config::TraceIds;

#[cfg(test)]
mod tests;

/// Event flags of accelerator monitor packets
///
/// The same masks select the changed signals from the low nibble of the trace
/// ID.
pub mod accel {
    /// Compute unit execution
    pub const CU: u8 = 0x1;
    /// Intra-kernel dataflow stall
    pub const STALL_INT: u8 = 0x2;
    /// Inter-kernel pipe stall
    pub const STALL_STR: u8 = 0x4;
    /// External memory stall
    pub const STALL_EXT: u8 = 0x8;

    /// Number of trace IDs assigned to a single accelerator monitor
    pub const IDS_PER_SLOT: u16 = 16;
}

/// Event flags of stream monitor packets
pub mod stream {
    /// Transfer
    pub const TX: u8 = 0x1;
    /// Stall
    pub const STALL: u8 = 0x2;
    /// Starve
    pub const STARVE: u8 = 0x4;
    /// The packet opens an event
    pub const START: u8 = 0x8;
    /// The packet describes a complete, single-cycle event
    pub const SINGLE: u8 = 0x10;
}

/// Raw trace packet
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawPacket {
    /// Device timestamp in trace clock cycles
    ///
    /// Under emulation, this is the delta to the previous packet's timestamp.
    pub timestamp: u64,
    /// Host timestamp in nanoseconds
    ///
    /// This is only meaningful for clock training packets and under
    /// emulation.
    pub host_timestamp: u64,
    pub trace_id: u16,
    /// Start/end indication for memory-mapped transactions
    pub event_type: EventType,
    pub event_flags: u8,
    /// For memory-mapped transactions, a value of `1` marks an end without
    /// matching start
    pub reserved: u8,
    /// The packet is a clock training sample
    pub clock_train: bool,
}

impl RawPacket {
    /// Create a start packet for the given trace ID
    pub fn start(trace_id: u16, timestamp: u64) -> Self {
        Self {
            timestamp,
            trace_id,
            event_type: EventType::Start,
            ..Default::default()
        }
    }

    /// Create an end packet for the given trace ID
    pub fn end(trace_id: u16, timestamp: u64) -> Self {
        Self {
            timestamp,
            trace_id,
            event_type: EventType::End,
            ..Default::default()
        }
    }

    /// Create a clock training packet
    pub fn training(timestamp: u64, host_timestamp: u64) -> Self {
        Self {
            timestamp,
            host_timestamp,
            clock_train: true,
            ..Default::default()
        }
    }

    /// Set the event flags
    pub fn with_flags(self, event_flags: u8) -> Self {
        Self {
            event_flags,
            ..self
        }
    }

    /// Set the host timestamp
    pub fn with_host_timestamp(self, host_timestamp: u64) -> Self {
        Self {
            host_timestamp,
            ..self
        }
    }

    /// Mark the packet as an end without matching start
    pub fn with_reserved(self) -> Self {
        Self {
            reserved: 1,
            ..self
        }
    }

    /// Classify the packet according to the given trace ID layout
    ///
    /// Returns [`None`] for clock training packets and for trace IDs outside
    /// all known ranges.
    pub fn monitor(&self, ids: &TraceIds) -> Option<Monitor> {
        if self.clock_train {
            None
        } else {
            Monitor::classify(self.trace_id, ids)
        }
    }
}

/// Start/end indication of a packet
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventType {
    #[default]
    Start,
    End,
}

/// Source of a packet, derived from its trace ID
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Monitor {
    /// AXI interface monitor lane
    Memory { slot: u32, read: bool },
    /// Accelerator monitor with the set of changed signals
    ///
    /// The signals are a combination of the masks defined in [`accel`].
    Accel { slot: u32, signals: u8 },
    /// AXI stream monitor
    Stream { slot: u32 },
}

impl Monitor {
    /// Classify a trace ID
    ///
    /// Odd memory-mapped monitor IDs denote the read lane, even ones the write
    /// lane.
    pub fn classify(trace_id: u16, ids: &TraceIds) -> Option<Self> {
        if ids.is_accel(trace_id) {
            let offset = trace_id - ids.min_am;
            Some(Self::Accel {
                slot: (offset / accel::IDS_PER_SLOT).into(),
                signals: (offset & 0xf) as u8,
            })
        } else if ids.is_memory(trace_id) {
            Some(Self::Memory {
                slot: (trace_id / 2).into(),
                read: trace_id & 1 != 0,
            })
        } else if ids.is_stream(trace_id) {
            Some(Self::Stream {
                slot: (trace_id - ids.min_asm).into(),
            })
        } else {
            None
        }
    }

    /// Retrieve the monitor's slot within its family
    pub fn slot(&self) -> u32 {
        match self {
            Self::Memory { slot, .. } | Self::Accel { slot, .. } | Self::Stream { slot } => *slot,
        }
    }
}
