// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::resolver::{DefaultLabelResolver, LabelResolver, default_instr_label};
use rpn_tape::Status;
use rpn_tape::trace::{TraceMask, TraceSink, TraceStep};
use std::string::String;

type BackendGuard = tracy_client::Span;

struct ZoneEntry {
    code_offset: usize,
    // Keep the label alive for backends that may borrow it.
    label: String,
    guard: Option<BackendGuard>,
}

/// A `TraceSink` that emits one Tracy zone per executed instruction via `tracy-client`.
pub struct ProfilingTraceSink<R = DefaultLabelResolver> {
    resolver: R,
    active: Option<ZoneEntry>,
    failures: usize,
}

impl ProfilingTraceSink<DefaultLabelResolver> {
    /// Create a new sink with mnemonic labels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: LabelResolver> ProfilingTraceSink<R> {
    /// Create a new sink with a custom label resolver.
    #[must_use]
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            active: None,
            failures: 0,
        }
    }

    /// Number of instructions that finished with a non-ok status.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures
    }

    fn start_zone(&self, label: &str, code_offset: usize) -> Option<BackendGuard> {
        let client = tracy_client::Client::running()?;
        let line = u32::try_from(code_offset).unwrap_or(u32::MAX);
        Some(client.span_alloc(Some(label), "rpn_tape.instr", "rpn_tape", line, 0))
    }

    fn close_zone(&mut self) {
        if let Some(entry) = self.active.take() {
            let ZoneEntry {
                label: _label,
                guard: _guard,
                ..
            } = entry;
        }
    }
}

impl<R: LabelResolver> TraceSink for ProfilingTraceSink<R> {
    fn mask(&self) -> TraceMask {
        TraceMask::INSTR
    }

    fn line(&mut self, _text: &str) {}

    fn instr_enter(&mut self, step: &TraceStep<'_>) {
        // A zone still open here means the previous exit was never seen.
        self.close_zone();
        let label = self
            .resolver
            .instr_label(step)
            .unwrap_or_else(|| default_instr_label(step));
        let guard = self.start_zone(&label, step.code_offset);
        self.active = Some(ZoneEntry {
            code_offset: step.code_offset,
            label,
            guard,
        });
    }

    fn instr_exit(&mut self, step: &TraceStep<'_>, status: Status) {
        if !status.is_ok() {
            self.failures += 1;
        }
        if self
            .active
            .as_ref()
            .is_some_and(|entry| entry.code_offset == step.code_offset)
        {
            self.close_zone();
        } else {
            self.active = None;
        }
    }
}

impl<R> Default for ProfilingTraceSink<R>
where
    R: LabelResolver + Default,
{
    fn default() -> Self {
        Self::with_resolver(R::default())
    }
}

impl<R> std::fmt::Debug for ProfilingTraceSink<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilingTraceSink")
            .field("zone_open", &self.active.is_some())
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::ProfilingTraceSink;
    use rpn_tape::{Evaluator, ExecutionMode, FunctionRegistry, TypeDescriptor};

    #[test]
    fn start_zone_without_tracy_client_does_not_panic() {
        let sink = ProfilingTraceSink::new();
        let _guard = sink.start_zone("test", 0);
    }

    #[test]
    fn debug_run_opens_and_closes_zones() {
        let registry = FunctionRegistry::standard().unwrap();
        let mut eval = Evaluator::new(&registry, "READ A\nCONST int32 0\nDIV\nWRITE B\n");
        eval.extract_variables().unwrap();
        eval.set_input_type("A", TypeDescriptor::Int32).unwrap();
        eval.compile().unwrap();
        let mut sink = ProfilingTraceSink::new();
        let trap = eval
            .execute(ExecutionMode::Debug, Some(&mut sink))
            .unwrap_err();
        assert!(trap.status.contains(rpn_tape::Status::OVERFLOW), "division by zero");
        assert_eq!(sink.failures(), 1);
        assert!(sink.active.is_none(), "zone left open");
    }
}
