// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `rpn_config`: a hierarchical configuration store and an evaluator loader on top of it.
//!
//! [`ConfigTree`] holds named nodes with typed [`Leaf`] values and a cursor for navigation.
//! [`EvaluatorConfig`] reads an evaluator description (`Code`, `InputVariables`,
//! `OutputVariables`) from a node and builds a compiled [`rpn_tape::Evaluator`].
//!
//! ```
//! use rpn_config::{ConfigTree, EvaluatorConfig};
//! use rpn_tape::{ExecutionMode, FunctionRegistry};
//!
//! let mut tree = ConfigTree::new();
//! tree.create_absolute("Offset").unwrap();
//! tree.write("Code", "READ X\nCONST int32 10\nADD\nWRITE Y\n").unwrap();
//! tree.create_relative("InputVariables.X").unwrap();
//! tree.write("Type", "int32").unwrap();
//! tree.write("Default", "5").unwrap();
//!
//! let registry = FunctionRegistry::standard().unwrap();
//! let config = EvaluatorConfig::from_tree(&tree, "Offset").unwrap();
//! let mut eval = config.build(&registry).unwrap();
//! eval.execute(ExecutionMode::Fast, None).unwrap();
//! assert_eq!(eval.output_as::<i32>("Y"), Some(15));
//! ```

#![no_std]

extern crate alloc;

mod loader;
mod tree;

pub use loader::{
    CODE, DEFAULT, EvaluatorConfig, INPUT_VARIABLES, LoadError, OUTPUT_VARIABLES, TYPE,
    VariableSpec,
};
pub use tree::{ConfigError, ConfigTree, Leaf, NodeView};
