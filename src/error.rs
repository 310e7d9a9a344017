// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Construction errors

use core::fmt;

use crate::device::Family;

/// Errors detected while building a parser
///
/// Decoding itself never fails. Any inconsistency in the parser's
/// configuration is reported here, before the first packet is seen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Error {
    /// A clock rate is zero, negative or not finite
    InvalidClockRate(&'static str, f64),
    /// The global memory bit width is narrower than a byte
    InvalidMemoryWidth,
    /// The trace ID range of a monitor family is empty
    InvalidTraceIds(Family),
    /// The trace ID ranges of two monitor families overlap
    OverlappingTraceIds(Family, Family),
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidClockRate(name, rate) => write!(f, "Invalid {name} clock rate {rate} MHz"),
            Self::InvalidMemoryWidth => write!(f, "Global memory bit width must be at least 8"),
            Self::InvalidTraceIds(family) => write!(f, "Empty trace ID range for {family}"),
            Self::OverlappingTraceIds(a, b) => {
                write!(f, "Trace ID ranges of {a} and {b} overlap")
            }
        }
    }
}
