// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Packet dump decoder
//!
//! This program decodes a textual dump of device trace packets (see the `dump`
//! module for the format, and `session.txt` in this directory for an example)
//! and prints one line per decoded record. Optionally, parameters may be
//! supplied in the form of a TOML file (such as `params.toml` in this
//! directory). Monitor slots may be described via repeated `--slot` options of
//! the form `<family>:<name>[:<properties>]`, where `<family>` is one of
//! `memory`, `accel` or `stream`. They are numbered in the order given.
//!
//! If run with `--emulation`, the dump is decoded as an emulation trace.
//!
//! Warnings of the parser are printed to stderr. With `--debug`, its debug
//! and trace diagnostics are printed as well.

mod dump;

use std::path::PathBuf;

use xdp_trace::Record;
use xdp_trace::config::Parameters;
use xdp_trace::device::{Family, SlotTable};
use xdp_trace::parser;

fn main() {
    let matches = clap::Command::new("Packet dump decoder")
        .arg(
            clap::arg!(<input> "Path to the packet dump")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::arg!(-p --params <FILE> "Parser parameters")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(clap::arg!(--device <NAME> "Device name").default_value("device_0"))
        .arg(
            clap::arg!(-s --slot <SLOT> "Monitor slot description")
                .action(clap::ArgAction::Append),
        )
        .arg(
            clap::arg!(-e --emulation "Decode an emulation trace")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::arg!(-d --debug "Enable additional debug output")
                .env("DEBUG")
                .action(clap::ArgAction::SetTrue)
                .value_parser(clap::builder::FalseyValueParser::new()),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    let level = if debug {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Warn
    };
    log::set_logger(&STDERR_LOGGER).expect("Could not install logger");
    log::set_max_level(level);
    let device = matches
        .get_one::<String>("device")
        .expect("No device name specified");

    let params: Parameters = matches
        .get_one::<PathBuf>("params")
        .map(|p| {
            let params = std::fs::read_to_string(p).expect("Could not load parameters");
            toml::from_str(params.as_ref()).expect("Could not parse parameters")
        })
        .unwrap_or_default();
    if debug {
        eprintln!("Parameters: {params:?}");
    }

    let slots = matches
        .get_many::<String>("slot")
        .into_iter()
        .flatten()
        .fold(SlotTable::new(), |table, desc| {
            let mut parts = desc.splitn(3, ':');
            let family = match parts.next() {
                Some("memory") => Family::Memory,
                Some("accel") => Family::Accel,
                Some("stream") => Family::Stream,
                other => panic!("Unknown monitor family {other:?}"),
            };
            let name = parts.next().expect("No slot name specified");
            let properties = parts
                .next()
                .map(|p| p.parse().expect("Could not parse slot properties"))
                .unwrap_or(0);
            table.with_slot(family, name, properties)
        });

    let input = matches
        .get_one::<PathBuf>("input")
        .expect("No input file specified");
    let input = std::fs::File::open(input).expect("Could not open packet dump");
    let packets: Vec<_> = dump::Dump::new(std::io::BufReader::new(input)).collect();
    if debug {
        packets
            .iter()
            .for_each(|p| eprintln!("Read packet: {p:?}"));
    }

    let builder = parser::builder().with_params(&params).with_slots(slots);
    let (records, residual) = if matches.get_flag("emulation") {
        let mut parser = builder
            .build_emulation()
            .expect("Could not set up parser");
        (parser.decode(device, &packets), parser.flush(device))
    } else {
        let mut parser = builder.build().expect("Could not set up parser");
        (parser.decode(device, &packets), parser.flush(device))
    };

    records.iter().for_each(print_record);
    if !residual.is_empty() {
        println!("# approximated from incomplete trace");
        residual.iter().for_each(print_record);
    }
}

fn print_record(record: &Record) {
    println!(
        "{}[{}]: {}..{} ({:.6}ms..{:.6}ms), {} cycles, {} bytes",
        record.kind(),
        record.slot(),
        record.start_cycle(),
        record.end_cycle(),
        record.start_ms(),
        record.end_ms(),
        record.burst_length(),
        record.bytes(),
    );
}

/// Logger printing all enabled records to stderr
struct StderrLogger;

static STDERR_LOGGER: StderrLogger = StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}
