// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Device metadata consumed by the parsers
//!
//! Decoding trace packets requires some knowledge about the device that
//! produced them: which monitors exist, what they are attached to and how fast
//! the clocks driving them are. This module defines the [`SlotProperties`] and
//! [`ClockInfo`] traits through which the parsers obtain that knowledge, as
//! well as a number of simple types implementing them.
//!
//! The runtime usually implements [`SlotProperties`] on top of the debug IP
//! layout of the loaded xclbin. For tests and offline decoding, a
//! [`SlotTable`] may be filled by hand.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Property bit marking a stream monitor as observing the read side
pub const STREAM_READ: u64 = 0x2;

/// Monitor family
///
/// Every monitor on a device belongs to exactly one family. The family also
/// selects the clock domain used for device/host time correlation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Family {
    /// AXI interface monitors observing memory-mapped transactions
    Memory,
    /// Accelerator monitors observing compute unit execution and stalls
    Accel,
    /// AXI stream monitors observing streaming transfers
    Stream,
}

impl Family {
    /// All families
    pub const ALL: [Self; 3] = [Self::Memory, Self::Accel, Self::Stream];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Memory => 0,
            Self::Accel => 1,
            Self::Stream => 2,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "AXI interface monitor"),
            Self::Accel => write!(f, "accelerator monitor"),
            Self::Stream => write!(f, "AXI stream monitor"),
        }
    }
}

/// Provider of per-slot monitor metadata
///
/// A slot is the index of a monitor within its [`Family`] on a given device.
pub trait SlotProperties {
    /// Retrieve the number of monitors of the given family
    fn number_of_slots(&self, family: Family, device: &str) -> usize;

    /// Retrieve the name of the monitor in the given slot
    ///
    /// Memory and stream monitor names usually contain the name of the compute
    /// unit they are attached to.
    fn slot_name(&self, family: Family, device: &str, slot: usize) -> Option<&str>;

    /// Retrieve the property bits of the monitor in the given slot
    ///
    /// See [`STREAM_READ`] for the only bit currently interpreted.
    fn slot_properties(&self, family: Family, device: &str, slot: usize) -> u64;
}

/// Provider of clock information
pub trait ClockInfo {
    /// Frequency of the clock driving trace timestamps in MHz
    fn trace_clock_mhz(&self) -> f64;

    /// Frequency of the compute unit clock in MHz
    fn device_clock_mhz(&self) -> f64;

    /// Data width of the global memory interface in bits
    fn memory_bit_width(&self) -> u32;
}

impl<P: SlotProperties + ?Sized> SlotProperties for &P {
    fn number_of_slots(&self, family: Family, device: &str) -> usize {
        P::number_of_slots(self, family, device)
    }

    fn slot_name(&self, family: Family, device: &str, slot: usize) -> Option<&str> {
        P::slot_name(self, family, device, slot)
    }

    fn slot_properties(&self, family: Family, device: &str, slot: usize) -> u64 {
        P::slot_properties(self, family, device, slot)
    }
}

/// An absent provider knows no slots
impl<P: SlotProperties> SlotProperties for Option<P> {
    fn number_of_slots(&self, family: Family, device: &str) -> usize {
        self.as_ref()
            .map(|p| p.number_of_slots(family, device))
            .unwrap_or(0)
    }

    fn slot_name(&self, family: Family, device: &str, slot: usize) -> Option<&str> {
        self.as_ref()?.slot_name(family, device, slot)
    }

    fn slot_properties(&self, family: Family, device: &str, slot: usize) -> u64 {
        self.as_ref()
            .map(|p| p.slot_properties(family, device, slot))
            .unwrap_or(0)
    }
}

#[cfg(feature = "either")]
impl<L: SlotProperties, R: SlotProperties> SlotProperties for either::Either<L, R> {
    fn number_of_slots(&self, family: Family, device: &str) -> usize {
        either::for_both!(self, p => p.number_of_slots(family, device))
    }

    fn slot_name(&self, family: Family, device: &str, slot: usize) -> Option<&str> {
        either::for_both!(self, p => p.slot_name(family, device, slot))
    }

    fn slot_properties(&self, family: Family, device: &str, slot: usize) -> u64 {
        either::for_both!(self, p => p.slot_properties(family, device, slot))
    }
}

/// [`SlotProperties`] without any slots
///
/// Parsers built with this provider still decode every packet. However, stream
/// transfers are always reported as writes and the end-of-log flush can only
/// consider an accelerator monitor's own transactions.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoSlots;

impl SlotProperties for NoSlots {
    fn number_of_slots(&self, _: Family, _: &str) -> usize {
        0
    }

    fn slot_name(&self, _: Family, _: &str, _: usize) -> Option<&str> {
        None
    }

    fn slot_properties(&self, _: Family, _: &str, _: usize) -> u64 {
        0
    }
}

/// [`SlotProperties`] backed by explicit per-family tables
///
/// The table describes a single device and ignores the device name passed in
/// lookups.
///
/// # Example
///
/// ```
/// use xdp_trace::device::{Family, SlotProperties, SlotTable, STREAM_READ};
///
/// let slots = SlotTable::new()
///     .with_slot(Family::Accel, "vadd_1", 0)
///     .with_slot(Family::Memory, "vadd_1/m_axi_gmem", 0)
///     .with_slot(Family::Stream, "vadd_1/in", STREAM_READ);
/// assert_eq!(slots.number_of_slots(Family::Memory, "dev"), 1);
/// assert_eq!(slots.slot_name(Family::Accel, "dev", 0), Some("vadd_1"));
/// ```
#[derive(Clone, Default, Debug)]
pub struct SlotTable {
    families: [Vec<Slot>; 3],
}

impl SlotTable {
    /// Create an empty table
    pub fn new() -> Self {
        Default::default()
    }

    /// Append a slot to the given family
    ///
    /// Slots are numbered in the order in which they are added.
    pub fn with_slot(mut self, family: Family, name: impl Into<String>, properties: u64) -> Self {
        self.push(family, name, properties);
        self
    }

    /// Append a slot to the given family, returning its index
    pub fn push(&mut self, family: Family, name: impl Into<String>, properties: u64) -> usize {
        let slots = &mut self.families[family.index()];
        slots.push(Slot {
            name: name.into(),
            properties,
        });
        slots.len() - 1
    }

    fn get(&self, family: Family, slot: usize) -> Option<&Slot> {
        self.families[family.index()].get(slot)
    }
}

impl SlotProperties for SlotTable {
    fn number_of_slots(&self, family: Family, _: &str) -> usize {
        self.families[family.index()].len()
    }

    fn slot_name(&self, family: Family, _: &str, slot: usize) -> Option<&str> {
        self.get(family, slot).map(|s| s.name.as_str())
    }

    fn slot_properties(&self, family: Family, _: &str, slot: usize) -> u64 {
        self.get(family, slot).map(|s| s.properties).unwrap_or(0)
    }
}

#[derive(Clone, Debug)]
struct Slot {
    name: String,
    properties: u64,
}
