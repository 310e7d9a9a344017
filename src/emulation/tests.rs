// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
use super::*;

use crate::config::TRACE_IDS;
use crate::device::{Family, STREAM_READ, SlotTable};
use crate::packet::{accel, stream};
use crate::parser;

const DEVICE: &str = "xilinx_u250_gen3x16_xdma_shell_0";
const CU: u16 = TRACE_IDS.min_am + accel::CU as u16;

fn parser() -> EmuParser {
    parser::builder()
        .build_emulation()
        .expect("Could not build parser")
}

fn packet(packet: RawPacket, host_ns: u64) -> RawPacket {
    packet.with_host_timestamp(host_ns)
}

#[test]
fn delta_timestamps() {
    let mut parser = parser();
    let records = parser.decode(
        DEVICE,
        &[
            packet(RawPacket::start(4, 100), 1_000_000),
            packet(RawPacket::end(4, 50), 1_500_000),
        ],
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind(), Kind::Write);
    assert_eq!(records[0].start_cycle(), 100);
    assert_eq!(records[0].end_cycle(), 150);
    assert_eq!(records[0].start_ms(), 0.0);
    assert_eq!(records[0].end_ms(), 0.5);
}

#[test]
fn repeated_packets_are_skipped() {
    let mut parser = parser();
    let records = parser.decode(
        DEVICE,
        &[
            packet(RawPacket::start(4, 10), 1_000),
            packet(RawPacket::end(4, 1), 1_000),
            packet(RawPacket::end(4, 5), 2_000),
        ],
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].start_cycle(), 10);
    assert_eq!(records[0].end_cycle(), 15);
}

#[test]
fn unit_delta_with_new_host_time() {
    let mut parser = parser();
    let records = parser.decode(
        DEVICE,
        &[
            packet(RawPacket::start(4, 10), 1_000),
            packet(RawPacket::end(4, 1), 1_500),
        ],
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].end_cycle(), 11);
}

#[test]
fn single_cycle_default_duration() {
    let mut parser = parser();
    let records = parser.decode(DEVICE, &[packet(RawPacket::end(5, 7), 2_000_000)]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].start_cycle(), records[0].end_cycle());
    assert_eq!(records[0].start_ms(), 0.0);
    assert_eq!(records[0].end_ms(), 1e-3 / 300.0);
    assert_eq!(parser.cycle_ms(), 1e-3 / 300.0);
}

#[test]
fn cycle_duration_from_first_kernel() {
    let mut parser = parser();
    let records = parser.decode(
        DEVICE,
        &[
            packet(RawPacket::start(CU, 100).with_flags(accel::CU), 0),
            packet(RawPacket::end(CU, 1000), 2_000_000),
            packet(RawPacket::end(4, 10), 3_000_000),
        ],
    );
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind(), Kind::Kernel);
    assert_eq!(records[0].start_ms(), 0.0);
    assert_eq!(records[0].end_ms(), 2.0);

    let cycle_ms = parser.cycle_ms();
    assert!((cycle_ms - 0.002).abs() < 1e-15);
    assert_eq!(records[1].start_ms(), 3.0);
    assert_eq!(records[1].end_ms(), 3.0 + cycle_ms);

    // Later kernels do not refine the estimate
    parser.decode(
        DEVICE,
        &[
            packet(RawPacket::start(CU, 10).with_flags(accel::CU), 4_000_000),
            packet(RawPacket::end(CU, 10), 9_000_000),
        ],
    );
    assert_eq!(parser.cycle_ms(), cycle_ms);
}

#[test]
fn host_time_never_decreases() {
    let mut parser = parser();
    let records = parser.decode(
        DEVICE,
        &[
            packet(RawPacket::start(4, 10), 5_000_000),
            packet(RawPacket::end(4, 10), 1_000_000),
        ],
    );
    assert_eq!(records[0].start_ms(), 4.0);
    assert_eq!(records[0].end_ms(), 4.0);
}

#[test]
fn origin_spans_batches() {
    let mut parser = parser();
    parser.decode(DEVICE, &[packet(RawPacket::start(4, 10), 1_000_000)]);
    let records = parser.decode(DEVICE, &[packet(RawPacket::end(4, 10), 3_000_000)]);
    assert_eq!(records[0].start_ms(), 0.0);
    assert_eq!(records[0].end_ms(), 2.0);
    assert_eq!(records[0].end_cycle(), 20);
}

#[test]
fn training_packets_are_ignored() {
    let mut parser = parser();
    let records = parser.decode(
        DEVICE,
        &[
            RawPacket::training(500, 0),
            packet(RawPacket::start(4, 10), 1_000_000),
            packet(RawPacket::end(4, 10), 2_000_000),
        ],
    );
    assert_eq!(records[0].start_cycle(), 10);
    assert_eq!(records[0].start_ms(), 0.0);
    assert_eq!(records[0].end_ms(), 1.0);
}

#[test]
fn flush_and_reset() {
    let mut parser = parser();
    parser.decode(
        DEVICE,
        &[
            packet(RawPacket::start(CU, 10).with_flags(accel::CU), 1_000_000),
            packet(RawPacket::start(TRACE_IDS.min_am + accel::STALL_INT as u16, 30), 2_000_000),
        ],
    );
    let records = parser.flush(DEVICE);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind(), Kind::Kernel);
    assert_eq!(records[0].start_cycle(), 10);
    assert_eq!(records[0].end_cycle(), 40);
    assert_eq!(records[0].end_ms(), 1.0);
    assert_eq!(parser.pending(0, Kind::Kernel), 0);

    let batch = [
        packet(RawPacket::start(4, 10), 7_000_000),
        packet(RawPacket::end(4, 10), 8_000_000),
    ];
    let mut fresh = self::parser();
    assert_eq!(parser.decode(DEVICE, &batch), fresh.decode(DEVICE, &batch));
}

#[test]
fn stream_direction_from_slots() {
    let slots = SlotTable::new().with_slot(Family::Stream, "vadd_1/in", STREAM_READ);
    let mut parser = parser::builder()
        .with_slots(slots)
        .build_emulation()
        .expect("Could not build parser");
    let link = TRACE_IDS.min_asm;
    let records = parser.decode(
        DEVICE,
        &[
            packet(RawPacket::start(link, 10).with_flags(stream::TX | stream::START), 1_000_000),
            packet(RawPacket::end(link, 5).with_flags(stream::TX), 2_000_000),
        ],
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind(), Kind::StreamRead);
    assert_eq!(records[0].start_cycle(), 10);
    assert_eq!(records[0].end_cycle(), 15);
    assert_eq!(parser.slots().number_of_slots(Family::Stream, DEVICE), 1);
}
