// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
use super::*;

use crate::config::TRACE_IDS;

macro_rules! classify_test {
    ($n:ident, $id:literal, $m:expr) => {
        #[test]
        fn $n() {
            assert_eq!(Monitor::classify($id, &TRACE_IDS), $m);
        }
    };
}

classify_test!(memory_write, 4, Some(Monitor::Memory { slot: 2, read: false }));
classify_test!(memory_read, 5, Some(Monitor::Memory { slot: 2, read: true }));
classify_test!(memory_last, 61, Some(Monitor::Memory { slot: 30, read: true }));
classify_test!(gap_after_memory, 62, None);
classify_test!(accel_first_cu, 65, Some(Monitor::Accel { slot: 0, signals: accel::CU }));
classify_test!(
    accel_stalls,
    0x5e,
    Some(Monitor::Accel {
        slot: 1,
        signals: accel::STALL_INT | accel::STALL_STR | accel::STALL_EXT
    })
);
classify_test!(accel_last, 544, Some(Monitor::Accel { slot: 30, signals: 0 }));
classify_test!(gap_after_accel, 545, None);
classify_test!(stream_first, 576, Some(Monitor::Stream { slot: 0 }));
classify_test!(stream_last, 606, Some(Monitor::Stream { slot: 30 }));
classify_test!(stream_exclusive_max, 607, None);

#[test]
fn training_is_not_classified() {
    let packet = RawPacket {
        trace_id: 4,
        ..RawPacket::training(100, 2000)
    };
    assert_eq!(packet.monitor(&TRACE_IDS), None);
}

#[test]
fn builders() {
    let packet = RawPacket::end(5, 150).with_reserved().with_flags(0x3);
    assert_eq!(
        packet,
        RawPacket {
            timestamp: 150,
            host_timestamp: 0,
            trace_id: 5,
            event_type: EventType::End,
            event_flags: 0x3,
            reserved: 1,
            clock_train: false,
        }
    );
}

#[test]
fn accel_signals_relative_to_range() {
    let ids = TraceIds {
        min_am: 70,
        max_am: 550,
        ..TRACE_IDS
    };
    assert_eq!(
        Monitor::classify(71, &ids),
        Some(Monitor::Accel { slot: 0, signals: accel::CU })
    );
    assert_eq!(
        Monitor::classify(70 + 16 + 8, &ids),
        Some(Monitor::Accel { slot: 1, signals: accel::STALL_EXT })
    );
}
