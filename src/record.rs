// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Decoded device trace records

use core::fmt;

use crate::device::Family;

/// Decoded device trace interval
///
/// A record describes a single matched interval observed by one monitor slot,
/// both in device clock cycles and in host milliseconds. Records are emitted
/// by the parsers and never touched by them again.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    slot: u32,
    kind: Kind,
    start_cycle: u64,
    end_cycle: u64,
    start_ms: f64,
    end_ms: f64,
    bytes: u64,
}

impl Record {
    /// Create a new record
    pub fn new(slot: u32, kind: Kind, cycles: (u64, u64), host_ms: (f64, f64), bytes: u64) -> Self {
        Self {
            slot,
            kind,
            start_cycle: cycles.0,
            end_cycle: cycles.1,
            start_ms: host_ms.0,
            end_ms: host_ms.1,
            bytes,
        }
    }

    /// Retrieve the monitor slot within the [`Kind`]'s [`Family`]
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Retrieve the record's [`Kind`]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Device cycle of the interval's start
    pub fn start_cycle(&self) -> u64 {
        self.start_cycle
    }

    /// Device cycle of the interval's end
    pub fn end_cycle(&self) -> u64 {
        self.end_cycle
    }

    /// Host time of the interval's start in milliseconds
    pub fn start_ms(&self) -> f64 {
        self.start_ms
    }

    /// Host time of the interval's end in milliseconds
    pub fn end_ms(&self) -> f64 {
        self.end_ms
    }

    /// Number of device cycles covered by the interval, including both ends
    ///
    /// An end preceding its start yields a burst length of `1`.
    pub fn burst_length(&self) -> u64 {
        self.end_cycle
            .saturating_sub(self.start_cycle)
            .saturating_add(1)
    }

    /// Number of bytes transferred
    ///
    /// This is only known for memory-mapped transactions and zero otherwise.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Kind of a [`Record`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// Compute unit execution
    Kernel,
    /// Intra-kernel dataflow stall
    StallIntra,
    /// Inter-kernel pipe stall
    StallInter,
    /// External memory stall
    StallExternal,
    /// Memory-mapped read transaction
    Read,
    /// Memory-mapped write transaction
    Write,
    /// Stream transfer observed on the read side
    StreamRead,
    /// Stream transfer observed on the write side
    StreamWrite,
    /// Stream stalled by the consumer
    StreamStall,
    /// Stream starved by the producer
    StreamStarve,
}

impl Kind {
    /// Retrieve the monitor [`Family`] producing records of this kind
    pub fn family(self) -> Family {
        match self {
            Self::Kernel | Self::StallIntra | Self::StallInter | Self::StallExternal => {
                Family::Accel
            }
            Self::Read | Self::Write => Family::Memory,
            Self::StreamRead | Self::StreamWrite | Self::StreamStall | Self::StreamStarve => {
                Family::Stream
            }
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Kernel => "Kernel",
            Self::StallIntra => "Intra-Kernel Dataflow Stall",
            Self::StallInter => "Inter-Kernel Pipe Stall",
            Self::StallExternal => "External Memory Stall",
            Self::Read => "Read",
            Self::Write => "Write",
            Self::StreamRead => "Stream Read",
            Self::StreamWrite => "Stream Write",
            Self::StreamStall => "Stream Stall",
            Self::StreamStarve => "Stream Starve",
        };
        f.write_str(name)
    }
}
