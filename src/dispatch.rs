// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Packet dispatching and per-slot state
//!
//! The [`Dispatcher`] pairs start and end packets of all monitor families and
//! emits [`Record`]s for completed intervals. It is shared between the hardware
//! and the emulation parser, which differ only in how they derive timestamps.
//! That difference is captured by the [`Timebase`].

use alloc::vec::Vec;

use crate::config::TraceIds;
use crate::device::{self, Family, SlotProperties};
use crate::packet::{EventType, Monitor, RawPacket, accel, stream};
use crate::queue::PendingQueue;
use crate::record::{Kind, Record};


/// Accelerator monitor stall signals and the kinds of records they produce
const STALLS: [(u8, Kind); 3] = [
    (accel::STALL_INT, Kind::StallIntra),
    (accel::STALL_STR, Kind::StallInter),
    (accel::STALL_EXT, Kind::StallExternal),
];

/// Source of timestamps for a parser
pub(crate) trait Timebase {
    /// Timestamp attached to every pending event
    type Stamp: Copy + core::fmt::Debug;

    /// Retrieve the device cycle of a stamp
    fn cycle(stamp: &Self::Stamp) -> u64;

    /// Compute host start and end times in milliseconds for an interval
    fn host_ms(&mut self, kind: Kind, start: Self::Stamp, end: Self::Stamp) -> (f64, f64);
}

/// Everything needed to emit records for a single packet
pub(crate) struct Context<'a, T, P> {
    pub timebase: &'a mut T,
    pub slots: &'a P,
    pub device: &'a str,
    pub records: &'a mut Vec<Record>,
}

impl<T: Timebase, P: SlotProperties> Context<'_, T, P> {
    fn record(
        &mut self,
        slot: u32,
        kind: Kind,
        start: T::Stamp,
        end: T::Stamp,
        bytes_per_cycle: u64,
    ) -> Record {
        let cycles = (T::cycle(&start), T::cycle(&end));
        let host_ms = self.timebase.host_ms(kind, start, end);
        let burst_length = cycles.1.saturating_sub(cycles.0).saturating_add(1);
        let bytes = burst_length.saturating_mul(bytes_per_cycle);
        let record = Record::new(slot, kind, cycles, host_ms, bytes);
        log::trace!("Emitting {record:?}");
        record
    }

    fn append(
        &mut self,
        slot: u32,
        kind: Kind,
        start: T::Stamp,
        end: T::Stamp,
        bytes_per_cycle: u64,
    ) {
        let record = self.record(slot, kind, start, end, bytes_per_cycle);
        self.records.push(record);
    }
}

/// Packet dispatcher
///
/// The dispatcher holds all per-slot state. Slot storage grows on demand, so
/// a slot count reported by the [`SlotProperties`] is only a hint.
#[derive(Clone, Debug)]
pub(crate) struct Dispatcher<S> {
    ids: TraceIds,
    bytes_per_beat: u64,
    memory: Vec<MemorySlot<S>>,
    accel: Vec<AccelSlot<S>>,
    stream: Vec<StreamSlot<S>>,
}

impl<S: Copy + core::fmt::Debug> Dispatcher<S> {
    pub fn new(ids: TraceIds, memory_bit_width: u32) -> Self {
        Self {
            ids,
            bytes_per_beat: (memory_bit_width / 8).into(),
            memory: Vec::new(),
            accel: Vec::new(),
            stream: Vec::new(),
        }
    }

    /// Make room for all slots the device reports
    pub fn reserve(&mut self, slots: &impl SlotProperties, device: &str) {
        grow(&mut self.memory, slots.number_of_slots(Family::Memory, device));
        grow(&mut self.accel, slots.number_of_slots(Family::Accel, device));
        grow(&mut self.stream, slots.number_of_slots(Family::Stream, device));
    }

    /// Process a single data packet
    ///
    /// Packets with unknown trace IDs are ignored.
    pub fn dispatch<T, P>(&mut self, packet: &RawPacket, stamp: S, ctx: &mut Context<'_, T, P>)
    where
        T: Timebase<Stamp = S>,
        P: SlotProperties,
    {
        match packet.monitor(&self.ids) {
            Some(Monitor::Accel { slot, signals }) => {
                self.accel_event(slot, signals, packet.event_flags, stamp, ctx)
            }
            Some(Monitor::Memory { slot, read }) => {
                self.memory_event(slot, read, packet, stamp, ctx)
            }
            Some(Monitor::Stream { slot }) => {
                self.stream_event(slot, packet.event_flags, stamp, ctx)
            }
            None => log::debug!("Skipping packet with trace ID {}", packet.trace_id),
        }
    }

    fn accel_event<T, P>(
        &mut self,
        slot: u32,
        signals: u8,
        flags: u8,
        stamp: S,
        ctx: &mut Context<'_, T, P>,
    )
    where
        T: Timebase<Stamp = S>,
        P: SlotProperties,
    {
        let state = slot_mut(&mut self.accel, slot);
        state.last = Some(stamp);

        for ((mask, kind), pending) in STALLS.iter().zip(state.stalls.iter_mut()) {
            if signals & mask == 0 {
                continue;
            }
            match pending.take() {
                Some(start) => ctx.append(slot, *kind, start, stamp, 0),
                None => *pending = Some(stamp),
            }
        }

        if signals & accel::CU != 0 {
            if flags & accel::CU != 0 {
                state.kernels.push(stamp);
            } else {
                let start = state.kernels.pop_front_or(stamp);
                // Kernels enclose the stalls reported before them
                let record = ctx.record(slot, Kind::Kernel, start, stamp, 0);
                ctx.records.insert(0, record);
            }
        }
    }

    fn memory_event<T, P>(
        &mut self,
        slot: u32,
        read: bool,
        packet: &RawPacket,
        stamp: S,
        ctx: &mut Context<'_, T, P>,
    )
    where
        T: Timebase<Stamp = S>,
        P: SlotProperties,
    {
        let bytes_per_beat = self.bytes_per_beat;
        let state = slot_mut(&mut self.memory, slot);
        state.last = Some(stamp);

        let (queue, kind) = if read {
            (&mut state.reads, Kind::Read)
        } else {
            (&mut state.writes, Kind::Write)
        };
        match packet.event_type {
            EventType::Start => queue.push(stamp),
            EventType::End => {
                let start = if packet.reserved == 1 {
                    stamp
                } else {
                    queue.pop_front_or(stamp)
                };
                ctx.append(slot, kind, start, stamp, bytes_per_beat);
            }
        }
    }

    fn stream_event<T, P>(&mut self, slot: u32, flags: u8, stamp: S, ctx: &mut Context<'_, T, P>)
    where
        T: Timebase<Stamp = S>,
        P: SlotProperties,
    {
        let state = slot_mut(&mut self.stream, slot);
        state.last = Some(stamp);

        let (queue, kind) = if flags & stream::TX != 0 {
            let properties = ctx
                .slots
                .slot_properties(Family::Stream, ctx.device, slot as usize);
            let kind = if properties & device::STREAM_READ != 0 {
                Kind::StreamRead
            } else {
                Kind::StreamWrite
            };
            (&mut state.tx, kind)
        } else if flags & stream::STALL != 0 {
            (&mut state.stall, Kind::StreamStall)
        } else if flags & stream::STARVE != 0 {
            (&mut state.starve, Kind::StreamStarve)
        } else {
            log::debug!("Skipping stream packet without event on slot {slot}");
            return;
        };

        if flags & stream::SINGLE != 0 {
            ctx.append(slot, kind, stamp, stamp, 0);
        } else if flags & stream::START != 0 {
            queue.push(stamp);
        } else {
            let start = queue.pop_front_or(stamp);
            ctx.append(slot, kind, start, stamp, 0);
        }
    }

    /// Close compute units left running at the end of the trace
    ///
    /// For every accelerator monitor with an open compute unit execution, the
    /// latest transaction observed by the monitor itself or by any memory or
    /// stream monitor attached to the same compute unit is taken as its
    /// approximate end. Monitors are considered attached if their name
    /// contains the compute unit's name. No record is emitted if no such
    /// transaction happened after the oldest open start.
    ///
    /// All state is reset afterwards.
    pub fn flush<T, P>(&mut self, ctx: &mut Context<'_, T, P>)
    where
        T: Timebase<Stamp = S>,
        P: SlotProperties,
    {
        let slots = ctx.slots;
        let device = ctx.device;
        for (idx, state) in self.accel.iter().enumerate() {
            let Some(start) = state.kernels.front().copied() else {
                continue;
            };

            let cu_name = slots
                .slot_name(Family::Accel, device, idx)
                .filter(|n| !n.is_empty());
            let attached = |family: Family, slot: usize| {
                cu_name.is_some_and(|cu| {
                    slots
                        .slot_name(family, device, slot)
                        .is_some_and(|n| n.contains(cu))
                })
            };
            let memory = self
                .memory
                .iter()
                .enumerate()
                .filter(|(i, _)| attached(Family::Memory, *i))
                .filter_map(|(_, m)| m.last);
            let stream = self
                .stream
                .iter()
                .enumerate()
                .filter(|(i, _)| attached(Family::Stream, *i))
                .filter_map(|(_, s)| s.last);
            let end = state
                .last
                .into_iter()
                .chain(memory)
                .chain(stream)
                .max_by_key(T::cycle)
                .filter(|end| T::cycle(end) > T::cycle(&start));

            if let Some(end) = end {
                ctx.append(idx as u32, Kind::Kernel, start, end, 0);
            }
        }

        self.reset();
    }

    /// Number of pending events for the given slot and kind
    ///
    /// For stalls, this is `1` while the stall is ongoing.
    pub fn pending(&self, slot: u32, kind: Kind) -> usize {
        let idx = slot as usize;
        match kind.family() {
            Family::Accel => self.accel.get(idx).map_or(0, |s| match kind {
                Kind::Kernel => s.kernels.depth(),
                _ => STALLS
                    .iter()
                    .zip(s.stalls.iter())
                    .filter(|((_, k), p)| *k == kind && p.is_some())
                    .count(),
            }),
            Family::Memory => self.memory.get(idx).map_or(0, |s| match kind {
                Kind::Read => s.reads.depth(),
                _ => s.writes.depth(),
            }),
            Family::Stream => self.stream.get(idx).map_or(0, |s| match kind {
                Kind::StreamStall => s.stall.depth(),
                Kind::StreamStarve => s.starve.depth(),
                _ => s.tx.depth(),
            }),
        }
    }

    /// Bitmask of the accelerator monitor signals currently active on a slot
    ///
    /// The mask is a combination of the masks defined in [`accel`].
    pub fn started(&self, slot: u32) -> u8 {
        self.accel.get(slot as usize).map_or(0, |s| {
            let cu = if s.kernels.is_empty() { 0 } else { accel::CU };
            STALLS
                .iter()
                .zip(s.stalls.iter())
                .filter(|(_, p)| p.is_some())
                .fold(cu, |mask, ((m, _), _)| mask | m)
        })
    }

    /// Drop all per-slot state
    pub fn reset(&mut self) {
        self.memory.clear();
        self.accel.clear();
        self.stream.clear();
    }
}

/// State of a single AXI interface monitor
#[derive(Clone, Debug)]
struct MemorySlot<S> {
    reads: PendingQueue<S>,
    writes: PendingQueue<S>,
    last: Option<S>,
}

impl<S: Copy> Default for MemorySlot<S> {
    fn default() -> Self {
        Self {
            reads: Default::default(),
            writes: Default::default(),
            last: None,
        }
    }
}

/// State of a single accelerator monitor
#[derive(Clone, Debug)]
struct AccelSlot<S> {
    kernels: PendingQueue<S>,
    /// Starts of ongoing stalls, in the order of [`STALLS`]
    stalls: [Option<S>; 3],
    last: Option<S>,
}

impl<S: Copy> Default for AccelSlot<S> {
    fn default() -> Self {
        Self {
            kernels: Default::default(),
            stalls: [None; 3],
            last: None,
        }
    }
}

/// State of a single AXI stream monitor
#[derive(Clone, Debug)]
struct StreamSlot<S> {
    tx: PendingQueue<S>,
    stall: PendingQueue<S>,
    starve: PendingQueue<S>,
    last: Option<S>,
}

impl<S: Copy> Default for StreamSlot<S> {
    fn default() -> Self {
        Self {
            tx: Default::default(),
            stall: Default::default(),
            starve: Default::default(),
            last: None,
        }
    }
}

fn grow<T: Default>(slots: &mut Vec<T>, len: usize) {
    if slots.len() < len {
        slots.resize_with(len, Default::default);
    }
}

fn slot_mut<T: Default>(slots: &mut Vec<T>, slot: u32) -> &mut T {
    let idx = slot as usize;
    grow(slots, idx + 1);
    &mut slots[idx]
}
