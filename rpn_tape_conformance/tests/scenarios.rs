// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios: compile, run and inspect outputs.

use rpn_tape::{
    CompileErrorKind, Evaluator, ExecutionMode, ExternalCell, FunctionRecord, FunctionRegistry,
    RegistryError, Status, TrapKind, TypeDescriptor as T, Value, VariableError,
};
use rpn_tape_conformance::{SetupError, compile_typed, registry};

#[test]
fn copy_float64_through() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "READ IN1\nWRITE RES1\n",
        &[("IN1", T::Float64)],
        &[("RES1", T::Float64)],
    )
    .expect("compile");
    eval.set_input("IN1", -152.3_f64).expect("set");
    eval.execute(ExecutionMode::Safe, None).expect("run");
    assert_eq!(eval.output_as::<f64>("RES1"), Some(-152.3));
}

#[test]
fn mixed_add_underflow_wraps_and_flags() {
    let reg = registry();
    let src = "CONST int8 -1\nCONST int32 -2147483648\nADD\nWRITE RES1\n";
    let mut eval = compile_typed(&reg, src, &[], &[("RES1", T::Int32)]).expect("compile");

    let trap = eval
        .execute(ExecutionMode::Fast, None)
        .expect_err("underflow reported");
    assert_eq!(trap.kind, TrapKind::Operator);
    assert_eq!(trap.status, Status::UNDERFLOW);
    assert_eq!(eval.output_as::<i32>("RES1"), Some(i32::MAX));

    // Safe mode stops at the flagged instruction before the WRITE.
    let trap = eval
        .execute(ExecutionMode::Safe, None)
        .expect_err("underflow reported");
    let at = trap.at.expect("location");
    assert_eq!((at.index, at.mnemonic), (2, "ADD"));
    assert!(
        trap.status.contains(Status::UNDERFLOW | Status::NOT_COMPLETED),
        "{}",
        trap.status
    );
}

#[test]
fn cast_truncates_without_error() {
    let reg = registry();
    let src = "CONST float64 1.57079\nCAST uint8\nWRITE RES1\n";
    let mut eval = compile_typed(&reg, src, &[], &[("RES1", T::UInt8)]).expect("compile");
    eval.execute(ExecutionMode::Safe, None).expect("run");
    assert_eq!(eval.output_as::<u8>("RES1"), Some(1));
    assert_eq!(eval.status(), Status::NO_ERROR);
}

#[test]
fn float_equality() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "READ IN1\nREAD IN2\nEQ\nWRITE RES1\n",
        &[("IN1", T::Float64), ("IN2", T::Float64)],
        &[("RES1", T::UInt8)],
    )
    .expect("compile");
    eval.set_input("IN1", 15.3_f64).expect("set");
    eval.set_input("IN2", 15.3_f64).expect("set");
    eval.execute(ExecutionMode::Fast, None).expect("run");
    assert_eq!(eval.output_as::<u8>("RES1"), Some(1));

    eval.set_input("IN1", 15.4_f64).expect("set");
    eval.execute(ExecutionMode::Fast, None).expect("run");
    assert_eq!(eval.output_as::<u8>("RES1"), Some(0));
}

#[test]
fn trailing_read_is_incomplete() {
    let reg = registry();
    let Err(SetupError::Compile(err)) = compile_typed(
        &reg,
        "READ A\nWRITE B\nREAD A\n",
        &[("A", T::Int16)],
        &[],
    ) else {
        panic!("compile should fail");
    };
    assert_eq!(err.kind, CompileErrorKind::Incomplete { left: 1 });
    assert!(
        err.to_string().contains("operation sequence is incomplete"),
        "{err}"
    );
}

#[test]
fn registry_capacity_is_enforced() {
    fn nop(_: &mut rpn_tape::Context) {}
    let mut reg = FunctionRegistry::new(2);
    reg.register(FunctionRecord::new("A", &[], &[], nop))
        .expect("first");
    reg.register(FunctionRecord::new("B", &[], &[], nop))
        .expect("second");
    assert_eq!(
        reg.register(FunctionRecord::new("C", &[], &[], nop)),
        Err(RegistryError::CapacityExceeded {
            capacity: 2,
            name: "C"
        })
    );
    assert_eq!(reg.len(), 2);
}

#[test]
fn a_record_that_leaks_stack_slots_is_reported() {
    // Declared `[uint8] -> [uint8]` but leaves an extra slot behind.
    fn leaky(ctx: &mut rpn_tape::Context) {
        let x = ctx.pop::<u8>();
        ctx.push(x);
        ctx.push(x);
    }
    let mut reg = registry();
    reg.register(FunctionRecord::new("LEAK", &[T::UInt8], &[T::UInt8], leaky))
        .expect("room for one more record");
    let mut eval = compile_typed(
        &reg,
        "READ A\nREAD A\nAND\nLEAK\nWRITE B\n",
        &[("A", T::UInt8)],
        &[],
    )
    .expect("compile");
    eval.set_input("A", 1_u8).expect("set");

    for mode in [ExecutionMode::Fast, ExecutionMode::Safe] {
        let trap = eval.execute(mode, None).expect_err("residual stack");
        assert_eq!(
            trap.kind,
            TrapKind::StackImbalance { residual_slots: 1 },
            "{mode:?}"
        );
        assert!(
            trap.status.contains(Status::INTERNAL_SETUP_ERROR),
            "{mode:?}: {}",
            trap.status
        );
        // Every instruction ran, so the output was still written.
        assert_eq!(eval.output_as::<u8>("B"), Some(1), "{mode:?}");
    }
}

#[test]
fn constants_reject_dynamic_stores() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "READ A\nCONST int32 1\nADD\nWRITE B\n",
        &[("A", T::Int32)],
        &[],
    )
    .expect("compile");
    let names: Vec<&str> = eval.inputs().iter().map(|v| v.name()).collect();
    assert_eq!(names, ["A", "Constant@0"]);

    let err = eval
        .set_input_value_at(1, Value::I32(5))
        .expect_err("constant");
    assert!(matches!(err, VariableError::Constant { .. }), "{err}");
    assert_eq!(
        eval.set_input_value_at(0, Value::I8(4)),
        Ok(Status::NO_ERROR)
    );
    eval.execute(ExecutionMode::Safe, None).expect("run");
    assert_eq!(eval.output_as::<i32>("B"), Some(5));
}

#[test]
fn read_after_write_sees_the_written_value() {
    let reg = registry();
    // X is both an input and an output; the second READ X must see the sum.
    let src = "READ X\nREAD X\nADD\nWRITE X\nREAD X\nCONST int32 1\nADD\nWRITE Y\n";
    let mut eval = compile_typed(&reg, src, &[("X", T::Int32)], &[]).expect("compile");
    eval.set_input("X", 20_i32).expect("set");
    eval.execute(ExecutionMode::Safe, None).expect("run");
    assert_eq!(eval.output_as::<i32>("X"), Some(40));
    assert_eq!(eval.output_as::<i32>("Y"), Some(41));
    assert_eq!(eval.input_value("X"), Some(Value::I32(20)));
}

#[test]
fn external_cells_are_read_and_written_in_place() {
    let reg = registry();
    let mut eval = Evaluator::new(&reg, "READ A\nCONST float32 0.5\nMUL\nWRITE B\n");
    eval.extract_variables().expect("extract");
    eval.set_input_type("A", T::Float32).expect("type");
    eval.set_output_type("B", T::Float32).expect("type");
    let a = ExternalCell::with(3.0_f32);
    let b = ExternalCell::new();
    eval.bind_input_external("A", a.clone()).expect("bind");
    eval.bind_output_external("B", b.clone()).expect("bind");
    eval.compile().expect("compile");

    eval.execute(ExecutionMode::Safe, None).expect("run");
    assert_eq!(b.get::<f32>(), 1.5);

    a.set(-4.0_f32);
    eval.execute(ExecutionMode::Fast, None).expect("run");
    assert_eq!(b.get::<f32>(), -2.0);
    assert_eq!(eval.output_as::<f32>("B"), Some(-2.0));
    assert!(eval.output_memory("B").is_none(), "bound outputs have no arena bytes");
}

#[test]
fn converting_write_saturates() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "READ A\nWRITE B\n",
        &[("A", T::Int64)],
        &[("B", T::UInt8)],
    )
    .expect("compile");
    eval.set_input("A", 1000_i64).expect("set");
    let trap = eval.execute(ExecutionMode::Safe, None).expect_err("saturated");
    assert_eq!(trap.status, Status::OUT_OF_RANGE);
    assert_eq!(eval.output_as::<u8>("B"), Some(255));

    eval.set_input("A", 7_i64).expect("set");
    eval.execute(ExecutionMode::Safe, None).expect("run");
    assert_eq!(eval.output_as::<u8>("B"), Some(7));
}

#[test]
fn unmatched_overload_names_the_stack() {
    let reg = registry();
    let Err(SetupError::Compile(err)) = compile_typed(
        &reg,
        "READ A\nREAD B\nADD\nWRITE C\n",
        &[("A", T::Float32), ("B", T::Float64)],
        &[],
    ) else {
        panic!("no float32/float64 ADD");
    };
    assert_eq!(err.line, 3);
    assert_eq!(err.status(), Status::UNSUPPORTED_FEATURE);
    assert_eq!(
        err.kind,
        CompileErrorKind::NotFound {
            command: "ADD".into(),
            signature: "[float64|float32]".into(),
        }
    );
}

#[test]
fn cast_resolves_on_the_target_type() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "READ A\nCAST int8\nWRITE B\n",
        &[("A", T::Float32)],
        &[],
    )
    .expect("compile");
    assert_eq!(eval.output(0).map(|v| v.type_descriptor()), Some(T::Int8));
    eval.set_input("A", -300.7_f32).expect("set");
    let trap = eval.execute(ExecutionMode::Safe, None).expect_err("saturated");
    assert!(trap.status.contains(Status::OUT_OF_RANGE), "{}", trap.status);
}

#[test]
fn execution_requires_compilation_and_a_debug_sink() {
    let reg = registry();
    let mut eval = Evaluator::new(&reg, "READ A\nWRITE B\n");
    let trap = eval.execute(ExecutionMode::Fast, None).expect_err("not compiled");
    assert_eq!(
        (trap.kind, trap.status),
        (TrapKind::NotCompiled, Status::NOT_COMPLETED)
    );

    eval.extract_variables().expect("extract");
    eval.set_input_type("A", T::UInt16).expect("type");
    eval.compile().expect("compile");
    let trap = eval.execute(ExecutionMode::Debug, None).expect_err("no sink");
    assert_eq!(
        (trap.kind, trap.status),
        (TrapKind::MissingSink, Status::PARAMETERS_ERROR)
    );

    // Retyping invalidates the compiled program.
    eval.set_input_type("A", T::UInt32).expect("type");
    assert!(!eval.is_compiled(), "needs recompiling");
    let trap = eval.execute(ExecutionMode::Fast, None).expect_err("stale");
    assert_eq!(trap.kind, TrapKind::NotCompiled);
}

#[test]
fn input_memory_is_little_endian_bytes() {
    let reg = registry();
    let mut eval = compile_typed(
        &reg,
        "READ A\nDUP\nMUL\nWRITE B\n",
        &[("A", T::Int16)],
        &[],
    )
    .expect("compile");
    eval.input_memory_mut("A")
        .expect("bytes")
        .copy_from_slice(&(-12_i16).to_le_bytes());
    eval.execute(ExecutionMode::Safe, None).expect("run");
    // int16 * int16 has no in-place overload; DUP keeps int16, so MUL picks int16 -> int32.
    assert_eq!(eval.output(0).map(|v| v.type_descriptor()), Some(T::Int32));
    assert_eq!(eval.output_memory("B"), Some(&144_i32.to_le_bytes()[..]));
    assert!(eval.input_memory_mut("Constant@0").is_none(), "no such constant");
}
