// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `rpn_tape`.
//!
//! The library only carries program generators shared by the `vm` bench; run with
//! `cargo bench -p rpn_tape_wind_tunnel`.

use std::fmt::Write as _;

/// `Y = (...((X * 1.5 + X) * 1.5 + X)...)`, `terms` times.
#[must_use]
pub fn horner_source(terms: usize) -> String {
    let mut src = String::from("READ X\n");
    for _ in 0..terms {
        src.push_str("CONST float64 1.5\nMUL\nREAD X\nADD\n");
    }
    src.push_str("WRITE Y\n");
    src
}

/// `vars` independent `READ In{i} / CONST int32 {i} / ADD / WRITE Out{i}` blocks.
#[must_use]
pub fn wide_source(vars: usize) -> String {
    let mut src = String::new();
    for i in 0..vars {
        let _ = write!(src, "READ In{i}\nCONST int32 {i}\nADD\nWRITE Out{i}\n");
    }
    src
}
