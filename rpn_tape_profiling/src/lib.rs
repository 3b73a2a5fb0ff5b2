// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Profiling adapters for `rpn_tape` (currently Tracy).
//!
//! This crate is `std`-only and keeps `rpn_tape` itself free of profiling dependencies.
//! It listens for per-instruction enter/exit events of debug-mode execution and emits one
//! profiling zone per executed instruction.
//!
//! ## Example
//! ```no_run
//! use rpn_tape::{Evaluator, ExecutionMode, FunctionRegistry, TypeDescriptor};
//! use rpn_tape_profiling::{ProfilingTraceSink, SignatureResolver};
//!
//! let registry = FunctionRegistry::standard()?;
//! let mut eval = Evaluator::new(&registry, "READ A\nREAD A\nMUL\nWRITE B\n");
//! eval.extract_variables()?;
//! eval.set_input_type("A", TypeDescriptor::Float32)?;
//! eval.compile()?;
//! let mut sink = ProfilingTraceSink::with_resolver(SignatureResolver::default());
//! eval.execute(ExecutionMode::Debug, Some(&mut sink))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod resolver;
mod sink;

pub use resolver::{DefaultLabelResolver, LabelResolver, SignatureResolver};
pub use sink::ProfilingTraceSink;
