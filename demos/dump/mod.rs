// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Textual packet dump utilities

use std::io::BufRead;

use xdp_trace::packet::{EventType, RawPacket};

/// Textual packet dump
///
/// This [`Iterator`] yields [`RawPacket`]s from a textual dump with one packet
/// per line. Empty lines and lines starting with `#` are ignored. Clock
/// training samples are written as
///
///     train <device-timestamp> <host-timestamp-ns>
///
/// and all other packets as
///
///     <trace-id> start|end <timestamp> [flags=<n>] [reserved] [host=<ns>]
///
/// Numbers may be given in decimal or, prefixed with `0x`, hexadecimal.
pub struct Dump<R: BufRead> {
    lines: std::iter::Enumerate<std::io::Lines<R>>,
}

impl<R: BufRead> Dump<R> {
    /// Create a new dump from the data provided by the given `reader`
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines().enumerate(),
        }
    }
}

impl<R: BufRead> Iterator for Dump<R> {
    type Item = RawPacket;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (num, line) = self.lines.next()?;
            let line = line.expect("Could not read packet dump");
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Some(
                parse_line(line)
                    .unwrap_or_else(|e| panic!("Malformed packet in line {}: {e}", num + 1)),
            );
        }
    }
}

fn parse_line(line: &str) -> Result<RawPacket, String> {
    let mut fields = line.split_whitespace();
    let first = fields.next().ok_or("empty line")?;
    if first == "train" {
        let device = parse_num(fields.next().ok_or("missing device timestamp")?)?;
        let host = parse_num(fields.next().ok_or("missing host timestamp")?)?;
        return Ok(RawPacket::training(device, host));
    }

    let trace_id = u16::try_from(parse_num(first)?)
        .map_err(|_| format!("trace ID {first} out of range"))?;
    let event_type = match fields.next() {
        Some("start") => EventType::Start,
        Some("end") => EventType::End,
        other => return Err(format!("unexpected event type {other:?}")),
    };
    let timestamp = parse_num(fields.next().ok_or("missing timestamp")?)?;

    let mut packet = RawPacket {
        timestamp,
        trace_id,
        event_type,
        ..Default::default()
    };
    for field in fields {
        if field == "reserved" {
            packet.reserved = 1;
        } else if let Some(flags) = field.strip_prefix("flags=") {
            packet.event_flags = u8::try_from(parse_num(flags)?)
                .map_err(|_| format!("flags {flags} out of range"))?;
        } else if let Some(host) = field.strip_prefix("host=") {
            packet.host_timestamp = parse_num(host)?;
        } else {
            return Err(format!("unknown field {field}"));
        }
    }
    Ok(packet)
}

fn parse_num(s: &str) -> Result<u64, String> {
    let res = match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    res.map_err(|e| format!("invalid number {s}: {e}"))
}
