// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The interpreter loop.
//!
//! Three modes share one dispatch: fetch an opcode, look up its record, call the native function.
//!
//! - [`ExecutionMode::Fast`] runs straight through and only inspects the status at the end.
//! - [`ExecutionMode::Safe`] checks the status and the stack bounds after every instruction and
//!   stops at the first failure.
//! - [`ExecutionMode::Debug`] does the same checks and reports every step to a [`TraceSink`].
//!
//! Whenever the code runs to completion the stack must be empty again.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::context::{Context, DataAddress};
use crate::decompile::Listing;
use crate::registry::FunctionRecord;
use crate::status::Status;
use crate::trace::{TraceMask, TraceSink, TraceStep};
use crate::value::Value;

/// How to run a compiled program.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// No per-instruction checks.
    #[default]
    Fast,
    /// Stop at the first error or stack fault.
    Safe,
    /// Like `Safe`, reporting each step to a trace sink.
    Debug,
}

/// Why a run failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrapKind {
    /// There is no successfully compiled program.
    NotCompiled,
    /// Debug mode was requested without a sink.
    MissingSink,
    /// An operator raised a status flag.
    Operator,
    /// An instruction read or wrote outside the stack or data arena.
    StackFault,
    /// The program ran to completion but left values on the stack.
    StackImbalance {
        /// Leftover slots.
        residual_slots: usize,
    },
}

impl fmt::Display for TrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCompiled => write!(f, "program not compiled"),
            Self::MissingSink => write!(f, "debug execution needs a trace sink"),
            Self::Operator => write!(f, "operator error"),
            Self::StackFault => write!(f, "stack or data access out of range"),
            Self::StackImbalance { residual_slots } => {
                write!(f, "stack not empty after execution: {residual_slots} slot(s) left")
            }
        }
    }
}

/// The instruction a run stopped at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrLocation {
    /// 0-based instruction index.
    pub index: usize,
    /// Code offset of the opcode word.
    pub code_offset: usize,
    /// Record mnemonic.
    pub mnemonic: &'static str,
}

/// A failed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrapInfo {
    /// Accumulated status, including the flag that describes `kind`.
    pub status: Status,
    /// Failure class.
    pub kind: TrapKind,
    /// Failing instruction, when known.
    pub at: Option<InstrLocation>,
}

impl TrapInfo {
    pub(crate) fn new(status: Status, kind: TrapKind) -> Self {
        Self {
            status,
            kind,
            at: None,
        }
    }
}

impl fmt::Display for TrapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.at {
            Some(at) => write!(
                f,
                "{} at instruction {} ({}, offset {}): {}",
                self.kind, at.index, at.mnemonic, at.code_offset, self.status
            ),
            None => write!(f, "{}: {}", self.kind, self.status),
        }
    }
}

impl core::error::Error for TrapInfo {}

/// Stack-only bundle of the sink and its mask.
struct TraceCtx<'a> {
    mask: TraceMask,
    sink: &'a mut dyn TraceSink,
}

impl TraceCtx<'_> {
    #[inline]
    fn enabled(&self, mask: TraceMask) -> bool {
        self.mask.contains(mask)
    }

    fn line(&mut self, text: &str) {
        if self.enabled(TraceMask::LINES) {
            self.sink.line(text);
        }
    }
}

/// Run the program loaded in `ctx` from the start.
pub(crate) fn execute(
    ctx: &mut Context,
    listing: &Listing<'_>,
    mode: ExecutionMode,
    sink: Option<&mut dyn TraceSink>,
) -> Result<(), TrapInfo> {
    ctx.rewind();
    match mode {
        ExecutionMode::Fast => run_fast(ctx, listing),
        ExecutionMode::Safe => run_checked(ctx, listing, None)?,
        ExecutionMode::Debug => {
            let Some(sink) = sink else {
                return Err(TrapInfo::new(
                    Status::PARAMETERS_ERROR,
                    TrapKind::MissingSink,
                ));
            };
            let mask = sink.mask();
            run_checked(ctx, listing, Some(TraceCtx { mask, sink }))?;
        }
    }
    finish(ctx)
}

fn run_fast(ctx: &mut Context, listing: &Listing<'_>) {
    let records = listing.registry.records();
    while ctx.pc < ctx.code.len() {
        let pcode = ctx.fetch();
        match records.get(usize::from(pcode)) {
            Some(record) => (record.func())(ctx),
            None => ctx.fault = true,
        }
    }
}

/// Completion checks shared by every mode.
fn finish(ctx: &mut Context) -> Result<(), TrapInfo> {
    if ctx.fault {
        ctx.raise(Status::OUT_OF_RANGE);
        return Err(TrapInfo::new(ctx.status, TrapKind::StackFault));
    }
    if ctx.sp != 0 {
        ctx.raise(Status::INTERNAL_SETUP_ERROR);
        return Err(TrapInfo::new(
            ctx.status,
            TrapKind::StackImbalance {
                residual_slots: ctx.sp,
            },
        ));
    }
    if ctx.status.is_ok() {
        Ok(())
    } else {
        Err(TrapInfo::new(ctx.status, TrapKind::Operator))
    }
}

fn operand_of(ctx: &Context, record: &FunctionRecord) -> Option<DataAddress> {
    if record.has_operand() {
        ctx.code.get(ctx.pc + 1).copied()
    } else {
        None
    }
}

fn input_values(ctx: &Context, record: &FunctionRecord) -> Vec<Option<Value>> {
    let mut depth = 0;
    record
        .inputs()
        .iter()
        .map(|&td| {
            let v = ctx.peek_value(td, depth);
            depth += td.slots();
            v
        })
        .collect()
}

fn output_values(ctx: &Context, record: &FunctionRecord) -> Vec<Option<Value>> {
    let mut depth = 0;
    let mut values: Vec<_> = record
        .outputs()
        .iter()
        .rev()
        .map(|&td| {
            let v = ctx.peek_value(td, depth);
            depth += td.slots();
            v
        })
        .collect();
    values.reverse();
    values
}

fn run_checked(
    ctx: &mut Context,
    listing: &Listing<'_>,
    mut trace: Option<TraceCtx<'_>>,
) -> Result<(), TrapInfo> {
    let records = listing.registry.records();
    let capacity = ctx.stack_capacity();
    let lines = trace.as_ref().is_some_and(|t| t.enabled(TraceMask::LINES));
    let instr = trace.as_ref().is_some_and(|t| t.enabled(TraceMask::INSTR));
    if let Some(t) = trace.as_mut() {
        t.line("[line]-[stackPtr]-[codePtr]::[CODE] stack-in => stack-out");
    }

    let mut index = 0;
    while ctx.pc < ctx.code.len() {
        let code_offset = ctx.pc;
        let stack_offset = ctx.sp;
        let pcode = ctx.code[code_offset];
        let Some(record) = records.get(usize::from(pcode)) else {
            ctx.raise(Status::ILLEGAL_OPERATION | Status::NOT_COMPLETED);
            return Err(TrapInfo {
                status: ctx.status,
                kind: TrapKind::Operator,
                at: Some(InstrLocation {
                    index,
                    code_offset,
                    mnemonic: "?",
                }),
            });
        };
        let step = TraceStep {
            counter: index + 1,
            stack_offset,
            code_offset,
            pcode,
            record,
        };

        let mut text = String::new();
        let operand = operand_of(ctx, record);
        let inputs = if lines {
            text = format!(
                "{} - {stack_offset} - {code_offset} :: {}",
                step.counter,
                record.name()
            );
            input_values(ctx, record)
        } else {
            Vec::new()
        };
        if instr && let Some(t) = trace.as_mut() {
            t.sink.instr_enter(&step);
        }

        ctx.fetch();
        (record.func())(ctx);

        let fault = ctx.fault || ctx.sp > capacity;
        if fault {
            ctx.raise(Status::OUT_OF_RANGE);
        }
        let failed = fault || !ctx.status.is_ok();

        if instr && let Some(t) = trace.as_mut() {
            t.sink.instr_exit(&step, ctx.status);
        }
        if lines && let Some(t) = trace.as_mut() {
            let outputs = output_values(ctx, record);
            let mut body = String::new();
            listing.body(
                &mut body,
                record,
                operand,
                &ctx.data,
                true,
                Some(&inputs),
                Some(&outputs),
            );
            // Operands bring their own separator.
            if !body.starts_with(' ') {
                text.push(' ');
            }
            text.push_str(&body);
            if failed {
                text.push_str(" <ERROR> ");
            }
            t.line(&text);
        }
        if trace.is_some() {
            tracing::trace!(
                index,
                code_offset,
                mnemonic = record.name(),
                stack_slots = ctx.sp,
                "instruction executed"
            );
        }

        if failed {
            if ctx.pc < ctx.code.len() {
                ctx.raise(Status::NOT_COMPLETED);
            }
            if trace.is_some() {
                tracing::debug!(
                    index,
                    mnemonic = record.name(),
                    status = %ctx.status,
                    "execution stopped"
                );
            }
            return Err(TrapInfo {
                status: ctx.status,
                kind: if fault {
                    TrapKind::StackFault
                } else {
                    TrapKind::Operator
                },
                at: Some(InstrLocation {
                    index,
                    code_offset,
                    mnemonic: record.name(),
                }),
            });
        }
        index += 1;
    }

    if let Some(t) = trace.as_mut() {
        t.line(&format!("{} - {} :: END", ctx.sp, ctx.pc));
    }
    Ok(())
}
