// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The embedder-facing handle tying source, variables, compiled code and interpreter together.

use alloc::string::String;

use crate::compiler::{self, CompileError};
use crate::context::Context;
use crate::convert::Number;
use crate::decompile::{DecompileError, Listing};
use crate::external::ExternalCell;
use crate::registry::FunctionRegistry;
use crate::status::Status;
use crate::trace::TraceSink;
use crate::types::TypeDescriptor;
use crate::value::Value;
use crate::variables::{VariableDirectory, VariableError, VariableInformation, VariableList};
use crate::vm::{self, ExecutionMode, TrapInfo, TrapKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stage {
    Source,
    Extracted,
    Compiled,
}

/// One RPN program bound to a function registry.
///
/// Typical use:
///
/// ```
/// use rpn_tape::{Evaluator, ExecutionMode, FunctionRegistry, TypeDescriptor};
///
/// let registry = FunctionRegistry::standard().unwrap();
/// let mut eval = Evaluator::new(&registry, "READ A\nCONST float64 2\nMUL\nWRITE B\n");
/// eval.extract_variables().unwrap();
/// eval.set_input_type("A", TypeDescriptor::Float64).unwrap();
/// eval.compile().unwrap();
/// eval.set_input("A", 1.25_f64).unwrap();
/// eval.execute(ExecutionMode::Safe, None).unwrap();
/// assert_eq!(eval.output_as::<f64>("B"), Some(2.5));
/// ```
#[derive(Debug)]
pub struct Evaluator<'r> {
    registry: &'r FunctionRegistry,
    source: String,
    vars: VariableDirectory,
    start_of_variables: usize,
    ctx: Context,
    stage: Stage,
}

fn lookup(list: &VariableList, name: &str) -> Result<usize, VariableError> {
    list.find(name)
        .ok_or_else(|| VariableError::Unknown { name: name.into() })
}

fn check_index(list: &VariableList, index: usize) -> Result<usize, VariableError> {
    if index < list.len() {
        Ok(index)
    } else {
        Err(VariableError::BadIndex { index })
    }
}

impl<'r> Evaluator<'r> {
    /// Wrap `source`; nothing is parsed yet.
    pub fn new(registry: &'r FunctionRegistry, source: impl Into<String>) -> Self {
        Self {
            registry,
            source: source.into(),
            vars: VariableDirectory::default(),
            start_of_variables: 0,
            ctx: Context::default(),
            stage: Stage::Source,
        }
    }

    /// Program text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Pass one: collect the input and output variables.
    ///
    /// Resets any earlier type settings and bindings.
    pub fn extract_variables(&mut self) -> Result<(), CompileError> {
        self.stage = Stage::Source;
        self.ctx = Context::default();
        self.start_of_variables = compiler::extract_variables(&self.source, &mut self.vars)?;
        self.stage = Stage::Extracted;
        Ok(())
    }

    /// Pass two: lay out memory and generate code. Runs pass one first if needed.
    pub fn compile(&mut self) -> Result<(), CompileError> {
        if self.stage == Stage::Source {
            self.extract_variables()?;
        }
        self.stage = Stage::Extracted;
        match compiler::compile(
            self.registry,
            &self.source,
            &mut self.vars,
            self.start_of_variables,
        ) {
            Ok(program) => {
                self.ctx = program.into_context();
                self.stage = Stage::Compiled;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(line = e.line, status = %e.status(), error = %e, "compile failed");
                self.ctx = Context::default();
                Err(e)
            }
        }
    }

    /// Returns `true` once [`Self::compile`] succeeded and no variable was changed since.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.stage == Stage::Compiled
    }

    fn listing(&self) -> Listing<'_> {
        Listing {
            registry: self.registry,
            vars: &self.vars,
            start_of_variables: self.start_of_variables,
        }
    }

    /// Run the compiled program once.
    ///
    /// `sink` is required in [`ExecutionMode::Debug`] and ignored otherwise.
    pub fn execute(
        &mut self,
        mode: ExecutionMode,
        sink: Option<&mut dyn TraceSink>,
    ) -> Result<(), TrapInfo> {
        if self.stage != Stage::Compiled {
            return Err(TrapInfo::new(Status::NOT_COMPLETED, TrapKind::NotCompiled));
        }
        let listing = Listing {
            registry: self.registry,
            vars: &self.vars,
            start_of_variables: self.start_of_variables,
        };
        vm::execute(&mut self.ctx, &listing, mode, sink)
    }

    /// Status accumulated by the last run.
    #[must_use]
    pub fn status(&self) -> Status {
        self.ctx.status()
    }

    /// Render the compiled code as source, optionally annotated with types.
    pub fn decompile(&self, show_types: bool) -> Result<String, DecompileError> {
        if self.stage != Stage::Compiled {
            return Err(DecompileError::NotCompiled);
        }
        self.listing()
            .decompile(&self.ctx.code, &self.ctx.data, show_types)
    }

    /// Both variable lists.
    #[must_use]
    pub fn variables(&self) -> &VariableDirectory {
        &self.vars
    }

    /// Input variables, constants included.
    #[must_use]
    pub fn inputs(&self) -> &[VariableInformation] {
        self.vars.inputs.as_slice()
    }

    /// Output variables.
    #[must_use]
    pub fn outputs(&self) -> &[VariableInformation] {
        self.vars.outputs.as_slice()
    }

    /// Input variable at `index`.
    #[must_use]
    pub fn input(&self, index: usize) -> Option<&VariableInformation> {
        self.vars.inputs.get(index)
    }

    /// Output variable at `index`.
    #[must_use]
    pub fn output(&self, index: usize) -> Option<&VariableInformation> {
        self.vars.outputs.get(index)
    }

    fn modify(
        var: Option<&mut VariableInformation>,
        index: usize,
        f: impl FnOnce(&mut VariableInformation),
    ) -> Result<(), VariableError> {
        let var = var.ok_or(VariableError::BadIndex { index })?;
        if var.constant {
            return Err(VariableError::Constant {
                name: var.name.clone(),
            });
        }
        f(var);
        Ok(())
    }

    fn invalidate(&mut self) {
        if self.stage == Stage::Compiled {
            self.stage = Stage::Extracted;
        }
    }

    /// Set the type of input `index`. Requires a recompile.
    pub fn set_input_type_at(
        &mut self,
        index: usize,
        td: TypeDescriptor,
    ) -> Result<(), VariableError> {
        Self::modify(self.vars.inputs.get_mut(index), index, |v| v.ty = td)?;
        self.invalidate();
        Ok(())
    }

    /// Set the type of the input called `name`. Requires a recompile.
    pub fn set_input_type(&mut self, name: &str, td: TypeDescriptor) -> Result<(), VariableError> {
        let index = lookup(&self.vars.inputs, name)?;
        self.set_input_type_at(index, td)
    }

    /// Set the type of output `index`; `Invalid` lets `WRITE` infer it. Requires a recompile.
    pub fn set_output_type_at(
        &mut self,
        index: usize,
        td: TypeDescriptor,
    ) -> Result<(), VariableError> {
        Self::modify(self.vars.outputs.get_mut(index), index, |v| {
            v.ty = td;
            v.inferred = false;
        })?;
        self.invalidate();
        Ok(())
    }

    /// Set the type of the output called `name`. Requires a recompile.
    pub fn set_output_type(&mut self, name: &str, td: TypeDescriptor) -> Result<(), VariableError> {
        let index = lookup(&self.vars.outputs, name)?;
        self.set_output_type_at(index, td)
    }

    /// Make input `name` read from `cell` instead of the data arena. Requires a recompile.
    pub fn bind_input_external(
        &mut self,
        name: &str,
        cell: ExternalCell,
    ) -> Result<(), VariableError> {
        let index = lookup(&self.vars.inputs, name)?;
        Self::modify(self.vars.inputs.get_mut(index), index, |v| {
            v.external = Some(cell);
        })?;
        self.invalidate();
        Ok(())
    }

    /// Make output `name` write into `cell`. The output must have a numeric type.
    /// Requires a recompile.
    pub fn bind_output_external(
        &mut self,
        name: &str,
        cell: ExternalCell,
    ) -> Result<(), VariableError> {
        let index = lookup(&self.vars.outputs, name)?;
        Self::modify(self.vars.outputs.get_mut(index), index, |v| {
            v.external = Some(cell);
        })?;
        self.invalidate();
        Ok(())
    }

    fn memory_range(&self, var: &VariableInformation) -> Option<(usize, usize)> {
        if self.stage != Stage::Compiled || var.external.is_some() {
            return None;
        }
        Some((usize::from(var.location?), var.ty.byte_size()))
    }

    /// Raw little-endian bytes of input `index`.
    ///
    /// `None` before compilation and for externally bound variables.
    #[must_use]
    pub fn input_memory_at(&self, index: usize) -> Option<&[u8]> {
        let (slot, len) = self.memory_range(self.vars.inputs.get(index)?)?;
        self.ctx.data.bytes(slot, len)
    }

    /// Writable bytes of input `index`. `None` for constants.
    pub fn input_memory_at_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let var = self.vars.inputs.get(index)?;
        if var.constant {
            return None;
        }
        let (slot, len) = self.memory_range(var)?;
        self.ctx.data.bytes_mut(slot, len)
    }

    /// Raw bytes of the input called `name`.
    #[must_use]
    pub fn input_memory(&self, name: &str) -> Option<&[u8]> {
        self.input_memory_at(self.vars.inputs.find(name)?)
    }

    /// Writable bytes of the input called `name`.
    pub fn input_memory_mut(&mut self, name: &str) -> Option<&mut [u8]> {
        let index = self.vars.inputs.find(name)?;
        self.input_memory_at_mut(index)
    }

    /// Raw bytes of output `index`.
    #[must_use]
    pub fn output_memory_at(&self, index: usize) -> Option<&[u8]> {
        let (slot, len) = self.memory_range(self.vars.outputs.get(index)?)?;
        self.ctx.data.bytes(slot, len)
    }

    /// Raw bytes of the output called `name`.
    #[must_use]
    pub fn output_memory(&self, name: &str) -> Option<&[u8]> {
        self.output_memory_at(self.vars.outputs.find(name)?)
    }

    /// Store `v` into the input called `name`; `T` must be the input's type.
    ///
    /// Writes through the external cell for bound inputs.
    pub fn set_input<T: Number>(&mut self, name: &str, v: T) -> Result<(), VariableError> {
        let index = lookup(&self.vars.inputs, name)?;
        let compiled = self.stage == Stage::Compiled;
        let Some(var) = self.vars.inputs.get(index) else {
            return Err(VariableError::BadIndex { index });
        };
        if var.constant {
            return Err(VariableError::Constant {
                name: var.name.clone(),
            });
        }
        if var.ty != T::TYPE {
            return Err(VariableError::TypeMismatch {
                name: var.name.clone(),
                expected: var.ty,
                found: T::TYPE,
            });
        }
        if let Some(cell) = &var.external {
            cell.set(v);
            return Ok(());
        }
        let slot = match var.location {
            Some(addr) if compiled => usize::from(addr),
            _ => return Err(VariableError::NotCompiled),
        };
        self.ctx.data.set(slot, v);
        Ok(())
    }

    /// Store `value` into input `index`, converting it to the input's type.
    ///
    /// Returns the conversion status; the stored value is saturated when it is not ok.
    pub fn set_input_value_at(
        &mut self,
        index: usize,
        value: Value,
    ) -> Result<Status, VariableError> {
        let index = check_index(&self.vars.inputs, index)?;
        let var = self.vars.inputs.get(index).ok_or(VariableError::BadIndex { index })?;
        if var.constant {
            return Err(VariableError::Constant {
                name: var.name.clone(),
            });
        }
        let (converted, status) = value.convert_to(var.ty);
        let mut bytes = [0_u8; 8];
        converted.write_bytes(&mut bytes);
        if let Some(cell) = &var.external {
            cell.set(u64::from_le_bytes(bytes));
            return Ok(status);
        }
        let out = self
            .input_memory_at_mut(index)
            .ok_or(VariableError::NotCompiled)?;
        let len = out.len();
        out.copy_from_slice(&bytes[..len]);
        Ok(status)
    }

    fn value_of(&self, var: &VariableInformation) -> Option<Value> {
        if let Some(cell) = &var.external {
            return cell.value(var.ty);
        }
        let (slot, len) = self.memory_range(var)?;
        Value::from_bytes(var.ty, self.ctx.data.bytes(slot, len)?)
    }

    /// Current value of the input called `name`.
    #[must_use]
    pub fn input_value(&self, name: &str) -> Option<Value> {
        self.value_of(self.vars.inputs.get(self.vars.inputs.find(name)?)?)
    }

    /// Current value of output `index`.
    #[must_use]
    pub fn output_value_at(&self, index: usize) -> Option<Value> {
        self.value_of(self.vars.outputs.get(index)?)
    }

    /// Current value of the output called `name`.
    #[must_use]
    pub fn output_value(&self, name: &str) -> Option<Value> {
        self.output_value_at(self.vars.outputs.find(name)?)
    }

    /// Current value of the output called `name`, if it has type `T`.
    #[must_use]
    pub fn output_as<T: Number>(&self, name: &str) -> Option<T> {
        self.output_value(name)?.get::<T>()
    }
}
