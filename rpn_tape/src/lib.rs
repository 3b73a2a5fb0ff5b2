// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `rpn_tape`: a typed RPN expression compiler and slot-based bytecode interpreter.
//!
//! Programs are line-oriented stack code:
//!
//! ```text
//! READ A
//! READ B
//! SUB
//! CAST int32
//! WRITE C
//! ```
//!
//! Compilation resolves every mnemonic to one exactly-typed overload in a [`FunctionRegistry`]
//! by tracking the types on the operand stack. There are no implicit conversions; `CAST`,
//! mixed-type arithmetic records and converting `WRITE`s are ordinary registry entries.
//!
//! ## Memory model
//! - Values live in 4-byte slots; 64-bit types take two.
//! - The data arena holds the `CONST` literals first and the variables after them.
//! - The operand stack is sized by the compiler to the deepest point of the program.
//! - Variables bound to an [`ExternalCell`] keep only a cell index in their slot and are
//!   accessed through `RREAD`/`RWRITE`.
//!
//! ## Lifecycle
//! [`Evaluator::extract_variables`], then optional type settings and external bindings, then
//! [`Evaluator::compile`] and any number of [`Evaluator::execute`] calls.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod arena;

pub mod compiler;
pub mod context;
pub mod convert;
pub mod decompile;
pub mod evaluator;
pub mod external;
pub mod ops;
pub mod program;
pub mod registry;
pub mod source;
pub mod status;
pub mod trace;
pub mod types;
pub mod value;
pub mod variables;
pub mod vm;

pub use compiler::{CompileError, CompileErrorKind};
pub use context::{CodeWord, Context, DataAddress, NativeFn};
pub use decompile::DecompileError;
pub use evaluator::Evaluator;
pub use external::ExternalCell;
pub use registry::{FunctionRecord, FunctionRegistry, PCode, RegistryError, TypeStack};
pub use status::Status;
pub use trace::{TraceMask, TraceSink, TraceStep};
pub use types::TypeDescriptor;
pub use value::Value;
pub use variables::{VariableDirectory, VariableError, VariableInformation};
pub use vm::{ExecutionMode, InstrLocation, TrapInfo, TrapKind};
