// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Hardware trace parser
//!
//! This module provides the [`TraceParser`], which decodes batches of
//! [`RawPacket`]s read from a device's trace FIFO into [`Record`]s, and the
//! [`Builder`] used to construct it as well as the emulation parser.


use alloc::vec::Vec;

use crate::clock::Correlator;
use crate::config::{self, TraceIds};
use crate::device::{ClockInfo, Family, NoSlots, SlotProperties};
use crate::dispatch::{Context, Dispatcher, Timebase};
use crate::emulation::EmuParser;
use crate::error::Error;
use crate::packet::RawPacket;
use crate::record::{Kind, Record};

/// Hardware trace parser
///
/// A parser decodes the trace of a single device. Packets are fed in batches
/// via [`decode`][Self::decode], which returns the [`Record`]s completed by
/// that batch. Intervals may span batches. Once the trace has ended,
/// [`flush`][Self::flush] closes compute unit executions left open and resets
/// the parser for the next session.
///
/// Clock training packets are consumed by the parser's [`Correlator`] and
/// refit the mapping of device cycles to host time for the parser's clock
/// domain. Host times of a record are computed with the mapping current at
/// the time the record is emitted.
///
/// # Example
///
/// ```
/// use xdp_trace::packet::RawPacket;
/// use xdp_trace::parser;
/// use xdp_trace::record::Kind;
///
/// let mut parser = parser::builder().build().unwrap();
/// let records = parser.decode(
///     "xilinx_u250_0",
///     &[RawPacket::start(4, 100), RawPacket::end(4, 150)],
/// );
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].kind(), Kind::Write);
/// assert_eq!(records[0].slot(), 2);
/// assert_eq!(records[0].burst_length(), 51);
/// ```
#[derive(Clone, Debug)]
pub struct TraceParser<P = NoSlots> {
    dispatcher: Dispatcher<u64>,
    correlator: Correlator,
    slots: P,
    domain: Family,
    warned: bool,
}

impl<P: SlotProperties> TraceParser<P> {
    /// Decode a batch of packets
    ///
    /// Packets are processed in order. The returned [`Record`]s are in
    /// emission order, except for [`Kind::Kernel`] records, which are placed
    /// in front of all records emitted before them.
    pub fn decode(&mut self, device: &str, packets: &[RawPacket]) -> Vec<Record> {
        self.dispatcher.reserve(&self.slots, device);

        let mut records = Vec::new();
        for packet in packets {
            if packet.clock_train {
                self.correlator
                    .train(self.domain, packet.timestamp, packet.host_timestamp);
                continue;
            }
            let mut clock = HostClock {
                correlator: &self.correlator,
                domain: self.domain,
            };
            let mut ctx = Context {
                timebase: &mut clock,
                slots: &self.slots,
                device,
                records: &mut records,
            };
            self.dispatcher.dispatch(packet, packet.timestamp, &mut ctx);
        }
        records
    }

    /// Close open compute unit executions and reset the parser
    ///
    /// This fn is meant to be called once after the last batch of a trace. It
    /// emits one approximate [`Kind::Kernel`] record for every accelerator
    /// monitor with an open execution for which a later transaction was
    /// observed. Afterwards, the parser is in the same state as after
    /// [`reset_state`][Self::reset_state].
    pub fn flush(&mut self, device: &str) -> Vec<Record> {
        let mut records = Vec::new();
        let mut clock = HostClock {
            correlator: &self.correlator,
            domain: self.domain,
        };
        let mut ctx = Context {
            timebase: &mut clock,
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
    ///
    /// This drops all pending events and all clock training data.
    pub fn reset_state(&mut self) {
        self.dispatcher.reset();
        self.correlator.reset();
    }

    /// Feed a clock training sample for the given clock domain
    pub fn train(&mut self, domain: Family, device_timestamp: u64, host_timestamp_ns: u64) {
        self.correlator
            .train(domain, device_timestamp, host_timestamp_ns);
    }

    /// Map a device timestamp of the given clock domain to host milliseconds
    pub fn convert(&self, domain: Family, device_timestamp: u64) -> f64 {
        self.correlator.convert(domain, device_timestamp)
    }

    /// Retrieve the parser's [`Correlator`]
    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    /// Number of pending events for the given slot and [`Kind`]
    ///
    /// The slot is interpreted relative to the [`Kind`]'s [`Family`]. For
    /// stalls, the result is `1` while the stall is ongoing.
    pub fn pending(&self, slot: u32, kind: Kind) -> usize {
        self.dispatcher.pending(slot, kind)
    }

    /// Bitmask of the signals currently active on an accelerator monitor
    ///
    /// See [`packet::accel`][crate::packet::accel] for the individual masks.
    pub fn started(&self, slot: u32) -> u8 {
        self.dispatcher.started(slot)
    }

    /// Retrieve the [`SlotProperties`] of this parser
    pub fn slots(&self) -> &P {
        &self.slots
    }
}

/// [`Timebase`] mapping device cycles through a [`Correlator`]
struct HostClock<'a> {
    correlator: &'a Correlator,
    domain: Family,
}

impl Timebase for HostClock<'_> {
    type Stamp = u64;

    fn cycle(stamp: &u64) -> u64 {
        *stamp
    }

    fn host_ms(&mut self, _: Kind, start: u64, end: u64) -> (f64, f64) {
        (
            self.correlator.convert(self.domain, start),
            self.correlator.convert(self.domain, end),
        )
    }
}

/// Create a new [`Builder`] for parsers
pub fn builder() -> Builder<NoSlots> {
    Default::default()
}

/// Builder for [`TraceParser`]s and [`EmuParser`]s
///
/// A builder will build a parser for a single device. If multiple devices are
/// traced, multiple parsers need to be built. For this purpose, [`Builder`]
/// implements [`Copy`] and [`Clone`] as long as the [`SlotProperties`] do.
#[derive(Copy, Clone, Debug)]
pub struct Builder<P = NoSlots> {
    slots: P,
    trace_clock_mhz: f64,
    device_clock_mhz: f64,
    memory_bit_width: u32,
    trace_ids: TraceIds,
    domain: Family,
}

impl Builder<NoSlots> {
    /// Create a new builder
    pub fn new() -> Self {
        Default::default()
    }
}

impl<P> Builder<P> {
    /// Build the parser for the given [`config::Parameters`]
    ///
    /// New builders assume [`Default`] parameters.
    pub fn with_params(self, params: &config::Parameters) -> Self {
        Self {
            trace_ids: params.trace_ids,
            ..self.with_clock_info(params)
        }
    }

    /// Build the parser for the clocks described by the given [`ClockInfo`]
    pub fn with_clock_info(self, info: &impl ClockInfo) -> Self {
        Self {
            trace_clock_mhz: info.trace_clock_mhz(),
            device_clock_mhz: info.device_clock_mhz(),
            memory_bit_width: info.memory_bit_width(),
            ..self
        }
    }

    /// Build the parser for the given trace ID layout
    pub fn with_trace_ids(self, trace_ids: TraceIds) -> Self {
        Self { trace_ids, ..self }
    }

    /// Build the parser with the given [`SlotProperties`]
    ///
    /// New builders carry [`NoSlots`].
    pub fn with_slots<Q>(self, slots: Q) -> Builder<Q> {
        Builder {
            slots,
            trace_clock_mhz: self.trace_clock_mhz,
            device_clock_mhz: self.device_clock_mhz,
            memory_bit_width: self.memory_bit_width,
            trace_ids: self.trace_ids,
            domain: self.domain,
        }
    }

    /// Build a [`TraceParser`] training and converting in the given domain
    ///
    /// New builders use the [`Family::Memory`] domain, in which trace FIFO
    /// contents are reported.
    pub fn with_domain(self, domain: Family) -> Self {
        Self { domain, ..self }
    }

    /// Build the [`TraceParser`]
    pub fn build(self) -> Result<TraceParser<P>, Error> {
        self.validate()?;
        Ok(TraceParser {
            dispatcher: Dispatcher::new(self.trace_ids, self.memory_bit_width),
            correlator: Correlator::new(self.trace_clock_mhz),
            slots: self.slots,
            domain: self.domain,
            warned: false,
        })
    }

    /// Build an [`EmuParser`] for traces produced under emulation
    pub fn build_emulation(self) -> Result<EmuParser<P>, Error> {
        self.validate()?;
        Ok(EmuParser::new(
            Dispatcher::new(self.trace_ids, self.memory_bit_width),
            self.slots,
            1e-3 / self.device_clock_mhz,
        ))
    }

    fn validate(&self) -> Result<(), Error> {
        let clocks = [
            ("trace", self.trace_clock_mhz),
            ("device", self.device_clock_mhz),
        ];
        if let Some((name, rate)) = clocks
            .into_iter()
            .find(|(_, r)| !r.is_finite() || *r <= 0.0)
        {
            return Err(Error::InvalidClockRate(name, rate));
        }
        if self.memory_bit_width < 8 {
            return Err(Error::InvalidMemoryWidth);
        }
        self.trace_ids.validate()
    }
}

impl<P: Default> Default for Builder<P> {
    fn default() -> Self {
        Self {
            slots: Default::default(),
            trace_clock_mhz: Default::default(),
            device_clock_mhz: Default::default(),
            memory_bit_width: Default::default(),
            trace_ids: Default::default(),
            domain: Family::Memory,
        }
        .with_params(&Default::default())
    }
}
