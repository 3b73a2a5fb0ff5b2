// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug-mode listings.

use rpn_tape::{
    ExecutionMode, Status, TraceMask, TraceSink, TraceStep, TrapKind, TypeDescriptor as T,
};
use rpn_tape_conformance::{compile_typed, registry, trace_bodies};

#[test]
fn listing_shows_values_flowing_through_the_stack() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "READ A\nREAD B\nSUB\nWRITE C\n",
        &[("A", T::Float32), ("B", T::Float32)],
        &[],
    )
    .expect("compile");
    eval.set_input("A", 2.0_f32).expect("set");
    eval.set_input("B", 1.0_f32).expect("set");

    let mut lines: Vec<String> = Vec::new();
    eval.execute(ExecutionMode::Debug, Some(&mut lines))
        .expect("run");
    assert_eq!(
        lines,
        [
            "[line]-[stackPtr]-[codePtr]::[CODE] stack-in => stack-out",
            "1 - 0 - 0 :: READ A => ((float32)2.0)",
            "2 - 1 - 2 :: READ B => ((float32)1.0)",
            "3 - 2 - 4 :: SUB ((float32)1.0,(float32)2.0) => ((float32)1.0)",
            "4 - 1 - 5 :: WRITE C((float32)1.0)",
            "0 - 7 :: END",
        ]
    );
    assert_eq!(eval.output_as::<f32>("C"), Some(1.0));
}

#[test]
fn constants_render_with_their_type() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "CONST float64 2.5\nNEG\nWRITE R\n",
        &[],
        &[("R", T::Float64)],
    )
    .expect("compile");
    let mut lines: Vec<String> = Vec::new();
    eval.execute(ExecutionMode::Debug, Some(&mut lines))
        .expect("run");
    assert_eq!(
        trace_bodies(&lines),
        [
            "READ float64 2.5 => ((float64)2.5)",
            "NEG ((float64)2.5) => ((float64)-2.5)",
            "WRITE R((float64)-2.5)",
        ]
    );
}

#[test]
fn failing_instruction_is_marked_and_ends_the_listing() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "READ N\nREAD D\nDIV\nWRITE Q\n",
        &[("N", T::Int32), ("D", T::Int32)],
        &[],
    )
    .expect("compile");
    eval.set_input("N", 7_i32).expect("set");
    eval.set_input("D", 0_i32).expect("set");

    let mut lines: Vec<String> = Vec::new();
    let trap = eval
        .execute(ExecutionMode::Debug, Some(&mut lines))
        .expect_err("division by zero");
    assert_eq!(trap.kind, TrapKind::Operator);
    assert_eq!(trap.status, Status::OVERFLOW | Status::NOT_COMPLETED);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("3 - 2 - 4 :: DIV ((int32)0,(int32)7) => ((int32)0) <ERROR> ")
    );
    assert!(
        !lines.iter().any(|l| l.ends_with(":: END")),
        "no END after a failure"
    );
}

#[test]
fn a_string_sink_collects_newline_terminated_lines() {
    let reg = registry();
    let mut eval =
        compile_typed(&reg, "READ A\nWRITE B\n", &[("A", T::UInt8)], &[]).expect("compile");
    eval.set_input("A", 9_u8).expect("set");
    let mut text = String::new();
    eval.execute(ExecutionMode::Debug, Some(&mut text))
        .expect("run");
    assert!(text.ends_with("0 - 4 :: END\n"), "{text}");
    assert_eq!(text.lines().count(), 4);
}

#[derive(Default)]
struct Counting {
    entered: Vec<&'static str>,
    failed: usize,
    lines: usize,
}

impl TraceSink for Counting {
    fn mask(&self) -> TraceMask {
        TraceMask::INSTR
    }

    fn line(&mut self, _text: &str) {
        self.lines += 1;
    }

    fn instr_enter(&mut self, step: &TraceStep<'_>) {
        self.entered.push(step.record.name());
    }

    fn instr_exit(&mut self, _step: &TraceStep<'_>, status: Status) {
        if !status.is_ok() {
            self.failed += 1;
        }
    }
}

#[test]
fn instruction_hooks_follow_the_mask() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "READ A\nDUP\nADD\nWRITE B\n",
        &[("A", T::Int64)],
        &[],
    )
    .expect("compile");
    eval.set_input("A", i64::MAX).expect("set");
    let mut sink = Counting::default();
    let trap = eval
        .execute(ExecutionMode::Debug, Some(&mut sink))
        .expect_err("overflow");
    assert_eq!(sink.entered, ["READ", "DUP", "ADD"]);
    assert_eq!(sink.failed, 1);
    assert_eq!(sink.lines, 0, "line output is masked off");
    assert!(trap.status.contains(Status::OVERFLOW), "{}", trap.status);
}
