// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-pass compiler from RPN source to code words.
//!
//! Pass one ([`extract_variables`]) collects the input and output names and reserves constant
//! slots. Between the passes the embedder may set variable types or bind external storage.
//! Pass two ([`compile`]) lays out the data arena, resolves every line against the
//! [`FunctionRegistry`] with a [`TypeStack`] and emits the code.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::arena::SlotArena;
use crate::context::{CodeWord, DataAddress};
use crate::external::ExternalCell;
use crate::ops::{CAST, CONST, READ, RREAD, RWRITE, WRITE};
use crate::program::Program;
use crate::registry::{FunctionRegistry, ResolveError, TypeStack};
use crate::source::{SourceLine, lines};
use crate::status::Status;
use crate::types::TypeDescriptor;
use crate::value::Value;
use crate::variables::{VariableDirectory, VariableInformation};

/// Slots reserved for an output whose type is inferred at its `WRITE`.
const UNTYPED_OUTPUT_SLOTS: usize = 2;

/// What went wrong while compiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// A command got the wrong number of parameters.
    ParameterCount {
        /// Mnemonic.
        command: Box<str>,
        /// Required count.
        expected: usize,
        /// Count found on the line.
        found: usize,
    },
    /// `WRITE` names an output that is already written elsewhere.
    OutputRedeclared {
        /// Variable name.
        name: Box<str>,
    },
    /// A type name that is not a numeric type.
    UnsupportedType {
        /// Offending type name.
        name: Box<str>,
    },
    /// A variable without a usable numeric type.
    UntypedVariable {
        /// Variable name.
        name: Box<str>,
    },
    /// A name that is neither an input nor an output.
    UnknownVariable {
        /// Variable name.
        name: Box<str>,
    },
    /// `READ` of an output that has no earlier `WRITE`.
    OutputReadBeforeWrite {
        /// Variable name.
        name: Box<str>,
    },
    /// A `CONST` literal that does not parse or does not fit its type.
    ///
    /// Reported as `FATAL_ERROR` when the text is not a number and `OUT_OF_RANGE` otherwise;
    /// `status` keeps the raw conversion flags.
    BadLiteral {
        /// Declared type.
        ty: TypeDescriptor,
        /// Literal text.
        literal: Box<str>,
        /// Conversion flags.
        status: Status,
    },
    /// A `WRITE` into an untyped output with nothing on the stack.
    MissingSourceType {
        /// Variable name.
        name: Box<str>,
    },
    /// No overload of `command` matches the type stack.
    NotFound {
        /// Mnemonic.
        command: Box<str>,
        /// Rendered top of the type stack.
        signature: String,
    },
    /// The type stack is full.
    TypeStackFull,
    /// The data arena or the code does not fit the 16-bit address space.
    AddressSpaceExhausted,
    /// Values are left on the stack at the end of the program.
    Incomplete {
        /// Number of leftover entries.
        left: usize,
    },
}

impl CompileErrorKind {
    /// The status flag this failure maps to.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::ParameterCount { .. } | Self::OutputRedeclared { .. } => {
                Status::ILLEGAL_OPERATION
            }
            Self::UnsupportedType { .. }
            | Self::UntypedVariable { .. }
            | Self::UnknownVariable { .. }
            | Self::NotFound { .. } => Status::UNSUPPORTED_FEATURE,
            Self::OutputReadBeforeWrite { .. } => Status::NOT_COMPLETED,
            // Text that is not a number cannot be loaded at all; a number that does not fit
            // its declared type is out of range whichever way it overflowed.
            Self::BadLiteral { status, .. } if status.contains(Status::ILLEGAL_OPERATION) => {
                Status::FATAL_ERROR
            }
            Self::BadLiteral { .. } => Status::OUT_OF_RANGE,
            Self::MissingSourceType { .. }
            | Self::TypeStackFull
            | Self::AddressSpaceExhausted => Status::FATAL_ERROR,
            Self::Incomplete { .. } => Status::INTERNAL_SETUP_ERROR,
        }
    }
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterCount {
                command,
                expected,
                found,
            } => write!(f, "{command} expects {expected} parameter(s), found {found}"),
            Self::OutputRedeclared { name } => write!(f, "output variable {name} written twice"),
            Self::UnsupportedType { name } => write!(f, "unsupported type: {name}"),
            Self::UntypedVariable { name } => write!(f, "variable {name} has no numeric type"),
            Self::UnknownVariable { name } => write!(f, "unknown variable: {name}"),
            Self::OutputReadBeforeWrite { name } => {
                write!(f, "output variable {name} read before being written")
            }
            Self::BadLiteral {
                ty,
                literal,
                status,
            } => write!(f, "cannot convert {literal} to {ty}: {status}"),
            Self::MissingSourceType { name } => {
                write!(f, "no value on the stack to write into {name}")
            }
            Self::NotFound { command, signature } => {
                write!(f, "command {command}({signature}) not found")
            }
            Self::TypeStackFull => write!(f, "type stack full"),
            Self::AddressSpaceExhausted => write!(f, "data arena exceeds the address space"),
            Self::Incomplete { left } => {
                write!(f, "operation sequence is incomplete: {left} data left in stack")
            }
        }
    }
}

/// A compile failure with the offending source line.
///
/// `line` is 0 and `text` empty for failures of the variable layout, which is not tied to a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    /// 1-based line number.
    pub line: u32,
    /// Source text of the line.
    pub text: Box<str>,
    /// Failure.
    pub kind: CompileErrorKind,
}

impl CompileError {
    fn at(line: &SourceLine<'_>, kind: CompileErrorKind) -> Self {
        Self {
            line: line.number,
            text: line.text.into(),
            kind,
        }
    }

    fn layout(kind: CompileErrorKind) -> Self {
        Self {
            line: 0,
            text: "".into(),
            kind,
        }
    }

    /// The status flag this failure maps to.
    #[must_use]
    pub fn status(&self) -> Status {
        self.kind.status()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "line {} `{}`: {}", self.line, self.text, self.kind)
        }
    }
}

impl core::error::Error for CompileError {}

fn params<'a, const N: usize>(line: &SourceLine<'a>) -> Result<[&'a str; N], CompileError> {
    let mut out = [""; N];
    if line.param_count() != N {
        return Err(CompileError::at(
            line,
            CompileErrorKind::ParameterCount {
                command: line.command.into(),
                expected: N,
                found: line.param_count(),
            },
        ));
    }
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = line.param(i).unwrap_or_default();
    }
    Ok(out)
}

fn numeric_type(line: &SourceLine<'_>, name: &str) -> Result<TypeDescriptor, CompileError> {
    let td = TypeDescriptor::from_name(name);
    if td.is_numeric() {
        Ok(td)
    } else {
        Err(CompileError::at(
            line,
            CompileErrorKind::UnsupportedType { name: name.into() },
        ))
    }
}

fn address(slot: usize) -> Option<DataAddress> {
    DataAddress::try_from(slot).ok()
}

/// Pass one: rebuild `vars` from `source`, returning the slot where variables begin.
///
/// `READ` of a name not yet written adds (or reuses) an input, `WRITE` adds an output and
/// `CONST` adds a typed constant at the next constant slot.
pub fn extract_variables(
    source: &str,
    vars: &mut VariableDirectory,
) -> Result<usize, CompileError> {
    vars.clear();
    let mut next_constant = 0_usize;
    for line in lines(source) {
        match line.command {
            READ => {
                let [name] = params::<1>(&line)?;
                if vars.outputs.find(name).is_some() {
                    continue;
                }
                if vars.inputs.find(name).is_some() {
                    tracing::info!(variable = name, line = line.number, "input variable reused");
                } else {
                    vars.inputs.push(VariableInformation::new(name));
                }
            }
            WRITE => {
                let [name] = params::<1>(&line)?;
                if vars.outputs.find(name).is_some() {
                    return Err(CompileError::at(
                        &line,
                        CompileErrorKind::OutputRedeclared { name: name.into() },
                    ));
                }
                vars.outputs.push(VariableInformation::new(name));
            }
            CONST => {
                let [ty, _literal] = params::<2>(&line)?;
                let td = numeric_type(&line, ty)?;
                let addr = address(next_constant).ok_or_else(|| {
                    CompileError::at(&line, CompileErrorKind::AddressSpaceExhausted)
                })?;
                vars.inputs.push(VariableInformation::constant(
                    format!("Constant@{addr}").into(),
                    td,
                    addr,
                ));
                next_constant += td.slots();
            }
            _ => {}
        }
    }
    tracing::debug!(
        inputs = vars.inputs.len(),
        outputs = vars.outputs.len(),
        constant_slots = next_constant,
        "variables extracted"
    );
    Ok(next_constant)
}

/// Assigns data slots to the variables and records external cells.
struct Layout {
    data: SlotArena,
    externals: Vec<ExternalCell>,
}

fn place(
    var: &mut VariableInformation,
    next: &mut usize,
    externals: &mut Vec<ExternalCell>,
    cells: &mut Vec<(DataAddress, u32)>,
) -> Result<(), CompileError> {
    let addr =
        address(*next).ok_or_else(|| CompileError::layout(CompileErrorKind::AddressSpaceExhausted))?;
    var.location = Some(addr);
    if let Some(cell) = &var.external {
        let index = u32::try_from(externals.len())
            .map_err(|_| CompileError::layout(CompileErrorKind::AddressSpaceExhausted))?;
        cells.push((addr, index));
        externals.push(cell.clone());
        *next += 1;
    } else if var.ty.is_numeric() {
        *next += var.ty.slots();
    } else {
        *next += UNTYPED_OUTPUT_SLOTS;
    }
    Ok(())
}

fn layout(vars: &mut VariableDirectory, start_of_variables: usize) -> Result<Layout, CompileError> {
    let mut next = start_of_variables;
    let mut externals = Vec::new();
    let mut cells = Vec::new();

    for var in vars.inputs.iter_mut() {
        if var.constant {
            continue;
        }
        if !var.ty.is_numeric() {
            return Err(CompileError::layout(CompileErrorKind::UntypedVariable {
                name: var.name.clone(),
            }));
        }
        place(var, &mut next, &mut externals, &mut cells)?;
    }
    for var in vars.outputs.iter_mut() {
        var.used = false;
        if var.inferred {
            var.ty = TypeDescriptor::Invalid;
            var.inferred = false;
        }
        if var.external.is_some() && !var.ty.is_numeric() {
            return Err(CompileError::layout(CompileErrorKind::UntypedVariable {
                name: var.name.clone(),
            }));
        }
        place(var, &mut next, &mut externals, &mut cells)?;
    }
    if next > usize::from(DataAddress::MAX) + 1 {
        return Err(CompileError::layout(CompileErrorKind::AddressSpaceExhausted));
    }

    let mut data = SlotArena::default();
    data.reset(next);
    for (addr, index) in cells {
        data.set(usize::from(addr), index);
    }
    Ok(Layout { data, externals })
}

/// Pass two: lay out the data arena and emit code for `source`.
///
/// `vars` must come from [`extract_variables`] on the same source; `start_of_variables` is the
/// value it returned.
pub fn compile(
    registry: &FunctionRegistry,
    source: &str,
    vars: &mut VariableDirectory,
    start_of_variables: usize,
) -> Result<Program, CompileError> {
    let Layout {
        mut data,
        externals,
    } = layout(vars, start_of_variables)?;

    let mut types = TypeStack::new();
    let mut code: Vec<CodeWord> = Vec::new();
    let mut stack_slots = 0_usize;
    let mut max_stack_slots = 0_usize;
    let mut next_constant = 0_usize;
    let mut last_line = None;

    for line in lines(source) {
        let mut command = line.command;
        let mut match_output = false;
        let mut operand: Option<DataAddress> = None;
        let push = |types: &mut TypeStack, td: TypeDescriptor| {
            types
                .push(td)
                .map_err(|_| CompileError::at(&line, CompileErrorKind::TypeStackFull))
        };

        match command {
            CAST => {
                let [ty] = params::<1>(&line)?;
                push(&mut types, numeric_type(&line, ty)?)?;
                match_output = true;
            }
            WRITE => {
                let [name] = params::<1>(&line)?;
                let var = vars.outputs.by_name_mut(name).ok_or_else(|| {
                    CompileError::at(&line, CompileErrorKind::UnknownVariable { name: name.into() })
                })?;
                if !var.ty.is_numeric() {
                    let top = types.peek(0).ok_or_else(|| {
                        CompileError::at(
                            &line,
                            CompileErrorKind::MissingSourceType { name: name.into() },
                        )
                    })?;
                    var.ty = top;
                    var.inferred = true;
                }
                var.used = true;
                operand = var.location;
                if var.external.is_some() {
                    command = RWRITE;
                }
                let td = var.ty;
                push(&mut types, td)?;
                match_output = true;
            }
            READ => {
                let [name] = params::<1>(&line)?;
                let written = vars
                    .outputs
                    .find(name)
                    .and_then(|i| vars.outputs.get(i))
                    .filter(|v| v.used);
                let input = || vars.inputs.find(name).and_then(|i| vars.inputs.get(i));
                let var = match written.or_else(input) {
                    Some(v) => v,
                    None if vars.outputs.find(name).is_some() => {
                        return Err(CompileError::at(
                            &line,
                            CompileErrorKind::OutputReadBeforeWrite { name: name.into() },
                        ));
                    }
                    None => {
                        return Err(CompileError::at(
                            &line,
                            CompileErrorKind::UnknownVariable { name: name.into() },
                        ));
                    }
                };
                operand = var.location;
                if var.external.is_some() {
                    command = RREAD;
                }
                let td = var.ty;
                push(&mut types, td)?;
                match_output = true;
            }
            CONST => {
                let [ty, literal] = params::<2>(&line)?;
                let td = numeric_type(&line, ty)?;
                let value = Value::parse(td, literal).map_err(|status| {
                    CompileError::at(
                        &line,
                        CompileErrorKind::BadLiteral {
                            ty: td,
                            literal: literal.into(),
                            status,
                        },
                    )
                })?;
                if let Some(out) = data.bytes_mut(next_constant, td.byte_size()) {
                    value.write_bytes(out);
                }
                operand = address(next_constant);
                next_constant += td.slots();
                push(&mut types, td)?;
                match_output = true;
                command = READ;
            }
            _ => {}
        }

        let pcode = registry
            .resolve(command, &mut types, match_output, &mut stack_slots)
            .map_err(|e| {
                let kind = match e {
                    ResolveError::NotFound => CompileErrorKind::NotFound {
                        command: line.command.into(),
                        signature: types.render_top(2 + usize::from(match_output)),
                    },
                    ResolveError::TypeStackFull => CompileErrorKind::TypeStackFull,
                };
                CompileError::at(&line, kind)
            })?;
        max_stack_slots = max_stack_slots.max(stack_slots);
        code.push(pcode);
        if let Some(word) = operand {
            code.push(word);
        }
        tracing::trace!(line = line.number, command, pcode, stack_slots, "line compiled");
        last_line = Some((line.number, line.text));
    }

    if code.len() > usize::from(CodeWord::MAX) + 1 {
        let (line, text) = last_line.unwrap_or((0, ""));
        return Err(CompileError {
            line,
            text: text.into(),
            kind: CompileErrorKind::AddressSpaceExhausted,
        });
    }
    if !types.is_empty() {
        let (line, text) = last_line.unwrap_or((0, ""));
        return Err(CompileError {
            line,
            text: text.into(),
            kind: CompileErrorKind::Incomplete { left: types.len() },
        });
    }

    tracing::debug!(
        code_words = code.len(),
        data_slots = data.slots(),
        stack_slots = max_stack_slots,
        externals = externals.len(),
        "program compiled"
    );
    Ok(Program {
        code,
        data,
        externals,
        stack_slots: max_stack_slots,
        start_of_variables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use crate::types::TypeDescriptor as T;

    fn registry() -> FunctionRegistry {
        FunctionRegistry::standard().unwrap()
    }

    fn set_type(vars: &mut VariableDirectory, name: &str, td: T) {
        if let Some(v) = vars.inputs.by_name_mut(name) {
            v.ty = td;
        }
    }

    #[test]
    fn extract_collects_inputs_outputs_and_constants() {
        let src = "READ A\nCONST float64 2.5\nREAD A\nMUL\nCONST int8 1\nCAST float64\nADD\nWRITE B\nREAD B\nWRITE C\n";
        let mut vars = VariableDirectory::default();
        let start = extract_variables(src, &mut vars).unwrap();
        assert_eq!(start, 3);
        let names: Vec<_> = vars.inputs().as_slice().iter().map(|v| v.name()).collect();
        assert_eq!(names, ["A", "Constant@0", "Constant@2"]);
        let outs: Vec<_> = vars.outputs().as_slice().iter().map(|v| v.name()).collect();
        assert_eq!(outs, ["B", "C"]);
        assert_eq!(vars.inputs().get(2).map(|v| v.type_descriptor()), Some(T::Int8));
    }

    #[test]
    fn extract_rejects_bad_lines() {
        let mut vars = VariableDirectory::default();
        let err = extract_variables("READ\n", &mut vars).unwrap_err();
        assert_eq!(err.status(), Status::ILLEGAL_OPERATION);
        assert_eq!(err.line, 1);

        let err = extract_variables("READ A\nWRITE B\nREAD A\nWRITE B\n", &mut vars).unwrap_err();
        assert_eq!(err.line, 4);
        assert!(matches!(err.kind, CompileErrorKind::OutputRedeclared { .. }));

        let err = extract_variables("CONST text 1\n", &mut vars).unwrap_err();
        assert_eq!(err.status(), Status::UNSUPPORTED_FEATURE);
    }

    #[test]
    fn compile_requires_typed_inputs() {
        let reg = registry();
        let mut vars = VariableDirectory::default();
        let start = extract_variables("READ A\nWRITE B\n", &mut vars).unwrap();
        let err = compile(&reg, "READ A\nWRITE B\n", &mut vars, start).unwrap_err();
        assert_eq!(err.status(), Status::UNSUPPORTED_FEATURE);
        assert_eq!(err.line, 0);
    }

    #[test]
    fn untyped_output_adopts_stack_type() {
        let reg = registry();
        let src = "READ A\nREAD A\nADD\nWRITE B\n";
        let mut vars = VariableDirectory::default();
        let start = extract_variables(src, &mut vars).unwrap();
        set_type(&mut vars, "A", T::Int16);
        let program = compile(&reg, src, &mut vars, start).unwrap();
        let b = vars.outputs().get(0).unwrap();
        // int16 + int16 widens to int32.
        assert_eq!(b.type_descriptor(), T::Int32);
        assert_eq!(b.location(), Some(1));
        assert_eq!(program.data_slots(), 3);
        assert_eq!(program.stack_slots(), 2);
        // READ A, READ A, ADD, WRITE B.
        assert_eq!(program.code().len(), 6);
    }

    #[test]
    fn unknown_overload_reports_stack_signature() {
        let reg = registry();
        let src = "READ A\nREAD B\nAND\nWRITE C\n";
        let mut vars = VariableDirectory::default();
        let start = extract_variables(src, &mut vars).unwrap();
        set_type(&mut vars, "A", T::Float32);
        set_type(&mut vars, "B", T::Int32);
        let err = compile(&reg, src, &mut vars, start).unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(
            err.kind,
            CompileErrorKind::NotFound {
                command: "AND".into(),
                signature: "[int32|float32]".into(),
            }
        );
        assert_eq!(err.status(), Status::UNSUPPORTED_FEATURE);
        assert_eq!(err.to_string(), "line 3 `AND`: command AND([int32|float32]) not found");
    }

    #[test]
    fn leftover_values_are_incomplete() {
        let reg = registry();
        let src = "CONST int32 1\nCONST int32 2\n";
        let mut vars = VariableDirectory::default();
        let start = extract_variables(src, &mut vars).unwrap();
        let err = compile(&reg, src, &mut vars, start).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::Incomplete { left: 2 });
        assert_eq!(err.status(), Status::INTERNAL_SETUP_ERROR);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn out_of_range_literal_fails() {
        let reg = registry();
        for (src, status, flags) in [
            ("CONST uint8 300\nWRITE X\n", Status::OUT_OF_RANGE, Status::OVERFLOW),
            ("CONST int16 -40000\nWRITE X\n", Status::OUT_OF_RANGE, Status::UNDERFLOW),
            ("CONST int32 12abc\nWRITE X\n", Status::FATAL_ERROR, Status::ILLEGAL_OPERATION),
        ] {
            let mut vars = VariableDirectory::default();
            let start = extract_variables(src, &mut vars).unwrap();
            let err = compile(&reg, src, &mut vars, start).unwrap_err();
            assert_eq!(err.status(), status, "{src:?}");
            assert_eq!(err.line, 1);
            match err.kind {
                CompileErrorKind::BadLiteral { status, .. } => assert_eq!(status, flags),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn external_variables_use_remote_access() {
        let reg = registry();
        let src = "READ A\nWRITE B\n";
        let mut vars = VariableDirectory::default();
        let start = extract_variables(src, &mut vars).unwrap();
        if let Some(a) = vars.inputs.by_name_mut("A") {
            a.ty = T::Float64;
            a.external = Some(ExternalCell::new());
        }
        if let Some(b) = vars.outputs.by_name_mut("B") {
            b.ty = T::Float64;
        }
        let program = compile(&reg, src, &mut vars, start).unwrap();
        let rread = reg.find(RREAD, &[], &[T::Float64]).unwrap();
        let write = reg.find(WRITE, &[T::Float64], &[]).unwrap();
        assert_eq!(program.code(), [rread, 0, write, 1]);
        // External slot carries the cell index; the float64 output takes two slots.
        assert_eq!(program.data_slots(), 3);
        assert_eq!(program.data.get::<u32>(0), Some(0));
    }
}
