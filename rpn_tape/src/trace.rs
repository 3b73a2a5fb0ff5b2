// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug-mode tracing hooks.
//!
//! A [`TraceSink`] receives the rendered debug listing one line at a time and, if its
//! [`TraceMask`] asks for it, a structured event around every executed instruction.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::BitOr;

use crate::registry::{FunctionRecord, PCode};
use crate::status::Status;

/// Event classes a sink wants to receive.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TraceMask(u8);

impl TraceMask {
    /// Nothing.
    pub const NONE: Self = Self(0);
    /// Rendered listing lines ([`TraceSink::line`]).
    pub const LINES: Self = Self(1 << 0);
    /// Per-instruction enter/exit events.
    pub const INSTR: Self = Self(1 << 1);

    /// Returns `true` if every bit in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TraceMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One executed instruction as seen by a sink.
#[derive(Copy, Clone, Debug)]
pub struct TraceStep<'a> {
    /// 1-based instruction counter.
    pub counter: usize,
    /// Stack depth in slots before the instruction.
    pub stack_offset: usize,
    /// Code offset of the opcode word.
    pub code_offset: usize,
    /// Opcode.
    pub pcode: PCode,
    /// Record being executed.
    pub record: &'a FunctionRecord,
}

/// Receiver of debug-mode output.
pub trait TraceSink {
    /// Event classes this sink wants.
    fn mask(&self) -> TraceMask {
        TraceMask::LINES
    }

    /// One line of the debug listing, without terminator.
    fn line(&mut self, text: &str);

    /// Called before the instruction runs.
    fn instr_enter(&mut self, step: &TraceStep<'_>) {
        let _ = step;
    }

    /// Called after the instruction ran, with the accumulated status.
    fn instr_exit(&mut self, step: &TraceStep<'_>, status: Status) {
        let _ = (step, status);
    }
}

impl TraceSink for String {
    fn line(&mut self, text: &str) {
        self.push_str(text);
        self.push('\n');
    }
}

impl TraceSink for Vec<String> {
    fn line(&mut self, text: &str) {
        self.push(text.into());
    }
}
