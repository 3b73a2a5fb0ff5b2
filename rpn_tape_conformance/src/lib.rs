// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared helpers for the `rpn_tape` conformance suite in `tests/`.

use rpn_tape::{CompileError, Evaluator, FunctionRegistry, TypeDescriptor, VariableError};

/// Why [`compile_typed`] failed.
#[derive(Debug)]
pub enum SetupError {
    /// Pass one or pass two failed.
    Compile(CompileError),
    /// A declared variable does not exist in the program.
    Variable(VariableError),
}

impl From<CompileError> for SetupError {
    fn from(e: CompileError) -> Self {
        Self::Compile(e)
    }
}

impl From<VariableError> for SetupError {
    fn from(e: VariableError) -> Self {
        Self::Variable(e)
    }
}

/// The standard registry.
///
/// # Panics
/// If the built-in catalogue does not fit the default capacity.
#[must_use]
pub fn registry() -> FunctionRegistry {
    FunctionRegistry::standard().expect("built-in catalogue fits the default capacity")
}

/// Extract, declare the given input and output types, and compile.
pub fn compile_typed<'r>(
    registry: &'r FunctionRegistry,
    source: &str,
    inputs: &[(&str, TypeDescriptor)],
    outputs: &[(&str, TypeDescriptor)],
) -> Result<Evaluator<'r>, SetupError> {
    let mut eval = Evaluator::new(registry, source);
    eval.extract_variables()?;
    for &(name, td) in inputs {
        eval.set_input_type(name, td)?;
    }
    for &(name, td) in outputs {
        eval.set_output_type(name, td)?;
    }
    eval.compile()?;
    Ok(eval)
}

/// Strip the per-instruction counters and offsets from a debug listing, keeping
/// `MNEMONIC stack-in => stack-out`.
#[must_use]
pub fn trace_bodies(listing: &[String]) -> Vec<String> {
    listing
        .iter()
        .filter_map(|line| line.split_once(" :: ").map(|(_, body)| body.to_owned()))
        .collect()
}
