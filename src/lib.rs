// Copyright (C) 2024, 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

//! # Decoder for FPGA device trace packets
//!
//! This crate decodes the hardware trace produced by the profiling monitors of
//! FPGA accelerator cards and correlates the device clock with host time.
//! Three families of monitors feed a shared trace FIFO:
//!
//! - AXI interface monitors report memory-mapped read and write transactions,
//! - accelerator monitors report compute unit executions and stalls and
//! - AXI stream monitors report streaming transfers, stalls and starvation.
//!
//! Each monitor reports the start and the end of an event as separate packets,
//! interleaved with the packets of all other monitors. The parsers pair them up
//! and emit one [`Record`] per completed interval. Clock training packets
//! periodically sample the device and host clocks, allowing the parser to map
//! device cycles to host time.
//!
//! This crate is not concerned with how packets are read from the device or
//! how their binary encoding is laid out. It consumes [`RawPacket`]s.
//!
//! See [parser] for the hardware [`TraceParser`] and [emulation] for its
//! counterpart used under hardware emulation.
//!
//! # Incomplete traces
//!
//! Traces may end while compute units are still running, e.g. after an
//! overflow of the trace buffer. [`TraceParser::flush`] closes such executions
//! with an approximate end derived from the latest related transaction.
//! Unmatched end packets are reported as intervals of zero duration.
//!
//! # Timestamps
//!
//! Device timestamps are expected to be free of overflows. Extending the
//! hardware's timestamp counters is the responsibility of the trace offload.
//!
//! # no_std
//!
//! This crate only depends on the Core Library and `alloc`. Diagnostics are
//! reported through the [`log`] facade.
//!
//! # Example
//!
//! ```
//! use xdp_trace::device::{Family, SlotTable};
//! use xdp_trace::packet::{RawPacket, accel};
//! use xdp_trace::parser;
//! use xdp_trace::record::Kind;
//!
//! let slots = SlotTable::new()
//!     .with_slot(Family::Accel, "vadd_1", 0)
//!     .with_slot(Family::Memory, "vadd_1/m_axi_gmem", 0);
//! let mut parser = parser::builder()
//!     .with_slots(slots)
//!     .build()
//!     .unwrap();
//!
//! let cu = 64 | u16::from(accel::CU);
//! let batch = [
//!     RawPacket::training(0, 1_000_000),
//!     RawPacket::start(cu, 10).with_flags(accel::CU),
//!     RawPacket::start(1, 12),
//!     RawPacket::end(1, 20),
//!     RawPacket::end(cu, 40),
//!     RawPacket::training(3_000, 11_000_000),
//! ];
//! for record in parser.decode("xilinx_u250_0", &batch) {
//!     println!("{}: {}..{}ms", record.kind(), record.start_ms(), record.end_ms());
//! }
//! assert!(parser.flush("xilinx_u250_0").is_empty());
//! ```
#![no_std]

extern crate alloc;

pub mod clock;
pub mod config;
pub mod device;
mod dispatch;
pub mod emulation;
pub mod error;
pub mod packet;
pub mod parser;
pub mod queue;
pub mod record;

#[cfg(test)]
mod tests;

pub use emulation::EmuParser;
pub use packet::RawPacket;
pub use parser::TraceParser;
pub use record::Record;
