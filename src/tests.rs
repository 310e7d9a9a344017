// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Session-level tests spanning multiple batches and monitor families

use alloc::vec::Vec;

use crate::device::{Family, STREAM_READ, SlotTable};
use crate::packet::{RawPacket, accel, stream};
use crate::record::Kind;

const DEVICE: &str = "xilinx_u280_xdma_201920_3_0";

fn slots() -> SlotTable {
    SlotTable::new()
        .with_slot(Family::Accel, "krnl_vadd_1", 0)
        .with_slot(Family::Accel, "krnl_vmul_1", 0)
        .with_slot(Family::Memory, "krnl_vadd_1/m_axi_gmem0-DDR[0]", 0)
        .with_slot(Family::Memory, "krnl_vadd_1/m_axi_gmem1-DDR[1]", 0)
        .with_slot(Family::Memory, "krnl_vmul_1/m_axi_gmem-DDR[2]", 0)
        .with_slot(Family::Stream, "krnl_vadd_1/out-krnl_vmul_1/in", STREAM_READ)
}

#[test]
fn dataflow_session() {
    let mut parser = crate::parser::builder()
        .with_slots(slots())
        .build()
        .expect("Could not build parser");

    let vadd = 64 + u16::from(accel::CU);
    let vmul = 80 + u16::from(accel::CU);
    let vmul_ext = 80 + u16::from(accel::STALL_EXT);
    let link = 576;

    let first = [
        RawPacket::training(0, 1_000_000),
        RawPacket::start(vadd, 100).with_flags(accel::CU),
        RawPacket::start(1, 110),
        RawPacket::start(3, 112),
        RawPacket::end(1, 140),
        RawPacket::start(vmul, 150).with_flags(accel::CU),
        RawPacket::start(link, 160).with_flags(stream::TX | stream::START),
        RawPacket::training(3_000, 11_000_000),
    ];
    let second = [
        RawPacket::end(3, 170),
        RawPacket::end(link, 180).with_flags(stream::TX),
        RawPacket::start(vmul_ext, 185),
        RawPacket::end(vadd, 190),
        RawPacket::end(vmul_ext, 195),
        RawPacket::start(4, 200),
        RawPacket::end(4, 230),
    ];

    let records: Vec<_> = parser
        .decode(DEVICE, &first)
        .into_iter()
        .map(|r| (r.kind(), r.slot(), r.start_cycle(), r.end_cycle()))
        .collect();
    assert_eq!(records, [(Kind::Read, 0, 110, 140)]);

    let records = parser.decode(DEVICE, &second);
    let summary: Vec<_> = records
        .iter()
        .map(|r| (r.kind(), r.slot(), r.start_cycle(), r.end_cycle()))
        .collect();
    assert_eq!(
        summary,
        [
            (Kind::Kernel, 0, 100, 190),
            (Kind::Read, 1, 112, 170),
            (Kind::StreamRead, 0, 160, 180),
            (Kind::StallExternal, 1, 185, 195),
            (Kind::Write, 2, 200, 230),
        ]
    );

    // Trained with 10ms per 3000 cycles, starting at 1ms
    let kernel = records[0];
    let slope = 10_000_000.0 / 3_000.0;
    assert!((kernel.start_ms() - (1.0 + slope * 100.0 / 1e6)).abs() < 1e-9);
    assert!((kernel.end_ms() - (1.0 + slope * 190.0 / 1e6)).abs() < 1e-9);

    // The vmul compute unit never finished
    let records = parser.flush(DEVICE);
    let summary: Vec<_> = records
        .iter()
        .map(|r| (r.kind(), r.slot(), r.start_cycle(), r.end_cycle()))
        .collect();
    assert_eq!(summary, [(Kind::Kernel, 1, 150, 230)]);
    assert!(parser.flush(DEVICE).is_empty());
}
