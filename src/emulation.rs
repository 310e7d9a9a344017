// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Emulation trace parser
//!
//! Under hardware emulation, the simulator emits trace packets in a slightly
//! different encoding than real monitors:
//!
//! * device timestamps are deltas to the previous packet's timestamp,
//! * every packet carries its own host timestamp, so no clock training is
//!   required, and
//! * the simulator occasionally repeats a packet with a delta of `1` and the
//!   host timestamp of its predecessor. Those packets are dropped.
//!
//! Intervals starting and ending in the same device cycle would be reported
//! with zero duration. The [`EmuParser`] instead extends them by the host time
//! of a single device cycle. That duration is estimated from the first kernel
//! execution spanning more than one cycle, which is only an approximation for
//! designs whose clocks vary between xclbins.

#[cfg(test)]
mod tests;

use alloc::vec::Vec;

use crate::device::{NoSlots, SlotProperties};
use crate::dispatch::{Context, Dispatcher, Timebase};
use crate::packet::RawPacket;
use crate::record::{Kind, Record};

/// Emulation trace parser
///
/// The emulation counterpart of the [`TraceParser`][crate::parser::TraceParser].
/// It is built via [`Builder::build_emulation`][crate::parser::Builder::build_emulation].
///
/// Host times are reported relative to the earliest host timestamp of the
/// first batch of a session and never decrease from one packet to the next.
#[derive(Clone, Debug)]
pub struct EmuParser<P = NoSlots> {
    dispatcher: Dispatcher<Stamp>,
    clock: CycleClock,
    slots: P,
    previous_cycle: u64,
    previous_host: Option<u64>,
    origin_ns: Option<u64>,
    last_host_ms: f64,
    warned: bool,
}

impl<P> EmuParser<P> {
    pub(crate) fn new(dispatcher: Dispatcher<Stamp>, slots: P, default_cycle_ms: f64) -> Self {
        Self {
            dispatcher,
            clock: CycleClock::new(default_cycle_ms),
            slots,
            previous_cycle: 0,
            previous_host: None,
            origin_ns: None,
            last_host_ms: 0.0,
            warned: false,
        }
    }
}

impl<P: SlotProperties> EmuParser<P> {
    /// Decode a batch of packets
    ///
    /// Clock training packets are ignored. Apart from that, this fn behaves
    /// like [`TraceParser::decode`][crate::parser::TraceParser::decode].
    pub fn decode(&mut self, device: &str, packets: &[RawPacket]) -> Vec<Record> {
        self.dispatcher.reserve(&self.slots, device);

        let packets = packets.iter().filter(|p| !p.clock_train);
        if self.origin_ns.is_none() {
            self.origin_ns = packets.clone().map(|p| p.host_timestamp).min();
        }
        let origin = self.origin_ns.unwrap_or_default();

        let mut records = Vec::new();
        let mut ctx = Context {
            timebase: &mut self.clock,
            slots: &self.slots,
            device,
            records: &mut records,
        };
        for packet in packets {
            if self.previous_host == Some(packet.host_timestamp) && packet.timestamp == 1 {
                log::debug!("Skipping repeated packet at {}ns", packet.host_timestamp);
                continue;
            }
            self.previous_host = Some(packet.host_timestamp);

            let cycle = self.previous_cycle.saturating_add(packet.timestamp);
            self.previous_cycle = cycle;

            let host_ms = packet.host_timestamp.saturating_sub(origin) as f64 / 1e6;
            let host_ms = host_ms.max(self.last_host_ms);
            self.last_host_ms = host_ms;

            self.dispatcher
                .dispatch(packet, Stamp { cycle, host_ms }, &mut ctx);
        }
        records
    }

    /// Close open compute unit executions and reset the parser
    ///
    /// See [`TraceParser::flush`][crate::parser::TraceParser::flush].
    pub fn flush(&mut self, device: &str) -> Vec<Record> {
        let mut records = Vec::new();
        let mut ctx = Context {
            timebase: &mut self.clock,
            slots: &self.slots,
            device,
            records: &mut records,
        };
        self.dispatcher.flush(&mut ctx);

        if !records.is_empty() && !self.warned {
            self.warned = true;
            log::warn!(
                "Incomplete CU profile trace detected on device {device}. \
                Timeline trace will have approximate CU End"
            );
        }
        self.reset_state();
        records
    }

    /// Reset all state for a new trace session
    pub fn reset_state(&mut self) {
        self.dispatcher.reset();
        self.clock.reset();
        self.previous_cycle = 0;
        self.previous_host = None;
        self.origin_ns = None;
        self.last_host_ms = 0.0;
    }

    /// Host time of a single device cycle in milliseconds
    ///
    /// This is the duration assigned to intervals starting and ending in the
    /// same cycle.
    pub fn cycle_ms(&self) -> f64 {
        self.clock.cycle_ms
    }

    /// Number of pending events for the given slot and [`Kind`]
    ///
    /// See [`TraceParser::pending`][crate::parser::TraceParser::pending].
    pub fn pending(&self, slot: u32, kind: Kind) -> usize {
        self.dispatcher.pending(slot, kind)
    }

    /// Retrieve the [`SlotProperties`] of this parser
    pub fn slots(&self) -> &P {
        &self.slots
    }
}

/// Device cycle and host time of an emulation packet
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Stamp {
    cycle: u64,
    host_ms: f64,
}

/// [`Timebase`] using per-packet host times
#[derive(Clone, Debug)]
struct CycleClock {
    default_ms: f64,
    cycle_ms: f64,
    calibrated: bool,
}

impl CycleClock {
    fn new(cycle_ms: f64) -> Self {
        Self {
            default_ms: cycle_ms,
            cycle_ms,
            calibrated: false,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.default_ms);
    }
}

impl Timebase for CycleClock {
    type Stamp = Stamp;

    fn cycle(stamp: &Stamp) -> u64 {
        stamp.cycle
    }

    fn host_ms(&mut self, kind: Kind, start: Stamp, end: Stamp) -> (f64, f64) {
        if !self.calibrated && kind == Kind::Kernel && end.cycle > start.cycle {
            let ratio = (end.host_ms - start.host_ms) / (end.cycle - start.cycle) as f64;
            if ratio > 0.0 {
                self.cycle_ms = ratio;
                self.calibrated = true;
            }
        }

        if start.cycle == end.cycle {
            (start.host_ms, start.host_ms + self.cycle_ms)
        } else {
            (start.host_ms, end.host_ms)
        }
    }
}
