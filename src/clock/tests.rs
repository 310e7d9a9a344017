// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
use super::*;

#[test]
fn untrained_slope() {
    let correlator = Correlator::new(250.0);
    assert_eq!(
        correlator.line(Family::Memory),
        Line {
            slope: 4.0,
            offset: 0.0
        }
    );
    assert_eq!(correlator.convert(Family::Memory, 1_000_000), 4.0);
}

#[test]
fn fit_through_pair() {
    let mut correlator = Correlator::new(300.0);
    correlator.train(Family::Memory, 1000, 5000);
    // A single sample does not change the line
    assert_eq!(correlator.line(Family::Memory), Line::untrained(300.0));
    correlator.train(Family::Memory, 3000, 10000);

    assert_eq!(correlator.convert(Family::Memory, 1000), 5000.0 / 1e6);
    assert_eq!(correlator.convert(Family::Memory, 3000), 10000.0 / 1e6);
    let mid = correlator.convert(Family::Memory, 2000);
    assert!((mid - 7500.0 / 1e6).abs() < 1e-12);
}

#[test]
fn families_are_independent() {
    let mut correlator = Correlator::new(300.0);
    correlator.train(Family::Memory, 1000, 5000);
    correlator.train(Family::Accel, 2000, 8000);
    correlator.train(Family::Memory, 3000, 10000);

    assert_eq!(correlator.line(Family::Accel), Line::untrained(300.0));
    assert_eq!(
        correlator.line(Family::Memory),
        Line {
            slope: 2.5,
            offset: 2500.0
        }
    );
}

#[test]
fn later_pairs_refit() {
    let mut correlator = Correlator::new(300.0);
    correlator.train(Family::Stream, 0, 0);
    correlator.train(Family::Stream, 100, 200);
    assert_eq!(correlator.line(Family::Stream).slope, 2.0);

    correlator.train(Family::Stream, 200, 1000);
    correlator.train(Family::Stream, 300, 1300);
    assert_eq!(
        correlator.line(Family::Stream),
        Line {
            slope: 3.0,
            offset: 400.0
        }
    );
}

#[test]
fn degenerate_pair() {
    let mut correlator = Correlator::new(300.0);
    correlator.train(Family::Memory, 0, 0);
    correlator.train(Family::Memory, 100, 200);
    correlator.train(Family::Memory, 500, 900);
    correlator.train(Family::Memory, 500, 1000);
    assert_eq!(correlator.line(Family::Memory).slope, 2.0);

    // The degenerate pair was consumed entirely
    correlator.train(Family::Memory, 600, 1600);
    assert_eq!(correlator.line(Family::Memory).slope, 2.0);
    correlator.train(Family::Memory, 700, 2000);
    assert_eq!(correlator.line(Family::Memory).slope, 4.0);
}

#[test]
fn reset() {
    let mut correlator = Correlator::new(300.0);
    correlator.train(Family::Memory, 0, 0);
    correlator.train(Family::Memory, 100, 200);
    correlator.train(Family::Memory, 300, 700);
    correlator.reset();
    assert_eq!(correlator.line(Family::Memory), Line::untrained(300.0));

    // A pending first sample is forgotten as well
    correlator.train(Family::Memory, 1000, 5000);
    assert_eq!(correlator.line(Family::Memory), Line::untrained(300.0));
}
