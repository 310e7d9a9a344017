// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
use super::*;

#[cfg(feature = "serde")]
#[test]
fn parse_partial() {
    let params: Parameters = toml::from_str(
        r#"
        trace_clock_mhz = 250.0
        memory_bit_width = 256

        [trace_ids]
        max_am = 320
        "#,
    )
    .expect("Could not parse parameters");
    assert_eq!(
        params,
        Parameters {
            trace_clock_mhz: 250.0,
            memory_bit_width: 256,
            trace_ids: TraceIds {
                max_am: 320,
                ..Default::default()
            },
            ..Default::default()
        }
    );
}

#[cfg(feature = "serde")]
#[test]
fn parse_empty() {
    let params: Parameters = toml::from_str("").expect("Could not parse parameters");
    assert_eq!(params, PARAMETERS);
}

#[test]
fn default_layout_is_valid() {
    assert_eq!(TRACE_IDS.validate(), Ok(()));
}

#[test]
fn overlapping_layout() {
    let ids = TraceIds {
        max_aim: 64,
        ..Default::default()
    };
    assert_eq!(
        ids.validate(),
        Err(Error::OverlappingTraceIds(Family::Memory, Family::Accel))
    );
}

#[test]
fn empty_stream_range() {
    let ids = TraceIds {
        max_asm: 576,
        ..Default::default()
    };
    assert_eq!(ids.validate(), Err(Error::InvalidTraceIds(Family::Stream)));
}
