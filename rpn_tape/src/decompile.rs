// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering compiled code back to text.
//!
//! The same renderer drives [`Evaluator::decompile`](crate::Evaluator::decompile) and the
//! debug-mode listing. Decompiled output is valid source: constant reads come back as `CONST`
//! and external accesses as plain `READ`/`WRITE`.

use alloc::string::String;
use core::fmt::{self, Write as _};

use crate::arena::SlotArena;
use crate::context::{CodeWord, DataAddress};
use crate::ops::{CAST, CONST, READ, RREAD, RWRITE, WRITE};
use crate::registry::{FunctionRecord, FunctionRegistry, PCode};
use crate::types::TypeDescriptor;
use crate::value::Value;
use crate::variables::VariableDirectory;

/// Decompilation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecompileError {
    /// There is no successfully compiled program.
    NotCompiled,
    /// A code word that is not a registered opcode.
    BadOpcode {
        /// Offset of the word.
        offset: usize,
        /// The word.
        pcode: PCode,
    },
    /// The code ends inside an instruction.
    MissingOperand {
        /// Offset of the opcode word.
        offset: usize,
    },
}

impl fmt::Display for DecompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCompiled => write!(f, "program not compiled"),
            Self::BadOpcode { offset, pcode } => {
                write!(f, "unknown opcode {pcode} at offset {offset}")
            }
            Self::MissingOperand { offset } => {
                write!(f, "missing operand for opcode at offset {offset}")
            }
        }
    }
}

impl core::error::Error for DecompileError {}

/// Values to show next to the types; `None` entries could not be read.
pub(crate) type Shown<'v> = Option<&'v [Option<Value>]>;

/// Renders instructions using the variable names and constant values of one program.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Listing<'a> {
    pub(crate) registry: &'a FunctionRegistry,
    pub(crate) vars: &'a VariableDirectory,
    pub(crate) start_of_variables: usize,
}

impl Listing<'_> {
    fn is_constant(&self, addr: DataAddress) -> bool {
        usize::from(addr) < self.start_of_variables
    }

    /// Source-level mnemonic of an instruction.
    pub(crate) fn mnemonic(
        &self,
        record: &FunctionRecord,
        operand: Option<DataAddress>,
    ) -> &'static str {
        match record.name() {
            READ if operand.is_some_and(|a| self.is_constant(a)) => CONST,
            RREAD => READ,
            RWRITE => WRITE,
            name => name,
        }
    }

    fn operand(
        &self,
        out: &mut String,
        record: &FunctionRecord,
        addr: DataAddress,
        data: &SlotArena,
    ) {
        if self.is_constant(addr) {
            let td = record.outputs().first().copied().unwrap_or_default();
            let value = data
                .bytes(usize::from(addr), td.byte_size())
                .and_then(|bytes| Value::from_bytes(td, bytes));
            match value {
                Some(v) => {
                    let _ = write!(out, " {td} {v}");
                }
                None => {
                    let _ = write!(out, " {td} ?");
                }
            }
        } else {
            match self.vars.name_at(addr) {
                Some(name) => {
                    out.push(' ');
                    out.push_str(name);
                }
                None => {
                    let _ = write!(out, " @{addr}");
                }
            }
        }
    }

    /// Append everything after the mnemonic: operand, inputs and outputs.
    pub(crate) fn body(
        &self,
        out: &mut String,
        record: &FunctionRecord,
        operand: Option<DataAddress>,
        data: &SlotArena,
        show_types: bool,
        inputs: Shown<'_>,
        outputs: Shown<'_>,
    ) {
        let sink = record.storage().is_some();
        if sink && let Some(addr) = operand {
            self.operand(out, record, addr, data);
        }
        if (show_types || inputs.is_some()) && !record.inputs().is_empty() {
            out.push('(');
            items(out, record.inputs(), show_types, inputs);
            out.push(')');
        }
        if !sink && let Some(addr) = operand {
            self.operand(out, record, addr, data);
        }
        if record.name() == CAST
            && !show_types
            && outputs.is_none()
            && let Some(td) = record.outputs().first()
        {
            out.push(' ');
            out.push_str(td.name());
        }
        if (show_types || outputs.is_some()) && !record.outputs().is_empty() {
            out.push_str(" => (");
            items(out, record.outputs(), show_types, outputs);
            out.push(')');
        }
    }

    /// Render the whole of `code`, one instruction per line.
    pub(crate) fn decompile(
        &self,
        code: &[CodeWord],
        data: &SlotArena,
        show_types: bool,
    ) -> Result<String, DecompileError> {
        let mut out = String::new();
        let mut offset = 0;
        while let Some(&pcode) = code.get(offset) {
            let record = self
                .registry
                .record(pcode)
                .ok_or(DecompileError::BadOpcode { offset, pcode })?;
            let operand = if record.has_operand() {
                Some(
                    *code
                        .get(offset + 1)
                        .ok_or(DecompileError::MissingOperand { offset })?,
                )
            } else {
                None
            };
            out.push_str(self.mnemonic(record, operand));
            self.body(&mut out, record, operand, data, show_types, None, None);
            out.push('\n');
            offset += 1 + usize::from(operand.is_some());
        }
        Ok(out)
    }
}

fn items(out: &mut String, types: &[TypeDescriptor], show_types: bool, values: Shown<'_>) {
    for (i, td) in types.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let value = values.map(|vs| vs.get(i).copied().flatten());
        let _ = match (show_types, value) {
            (true, Some(Some(v))) => write!(out, "({td}){v}"),
            (true, Some(None)) => write!(out, "({td})?"),
            (true, None) => write!(out, "{td}"),
            (false, Some(Some(v))) => write!(out, "{v}"),
            (false, _) => write!(out, "?"),
        };
    }
}
