// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building evaluators from configuration.
//!
//! An evaluator node looks like:
//!
//! ```text
//! Gain
//!   Code = "READ In\nCONST float64 2\nMUL\nWRITE Out\n"
//!   InputVariables
//!     In
//!       Type = "float64"
//!       Default = 1.0
//!   OutputVariables
//!     Out
//!       Type = "float64"
//! ```
//!
//! Output `Type` is optional; untyped outputs take the type written into them.

use core::fmt;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use rpn_tape::{
    CompileError, Evaluator, FunctionRegistry, Status, TypeDescriptor, Value, VariableError,
};

use crate::tree::{ConfigError, ConfigTree, NodeView};

/// Leaf holding the program source.
pub const CODE: &str = "Code";
/// Node holding one child node per input variable.
pub const INPUT_VARIABLES: &str = "InputVariables";
/// Node holding one child node per output variable.
pub const OUTPUT_VARIABLES: &str = "OutputVariables";
/// Leaf naming a variable type.
pub const TYPE: &str = "Type";
/// Leaf holding an input's initial value.
pub const DEFAULT: &str = "Default";

/// Evaluator loading errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// The configuration tree could not be navigated.
    Config(ConfigError),
    /// The node has no `Code` text leaf.
    MissingCode {
        /// Path of the evaluator node.
        path: Box<str>,
    },
    /// A `Type` leaf that is not a numeric type name.
    BadType {
        /// Variable name.
        variable: Box<str>,
    },
    /// A `Default` that does not fit the input type.
    BadDefault {
        /// Variable name.
        variable: Box<str>,
        /// Conversion flags.
        status: Status,
    },
    /// A configured variable the program does not use, or a rejected setting.
    Variable(VariableError),
    /// Compilation failed.
    Compile(CompileError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::MissingCode { path } => write!(f, "no {CODE} leaf under {path}"),
            Self::BadType { variable } => write!(f, "bad {TYPE} for variable {variable}"),
            Self::BadDefault { variable, status } => {
                write!(f, "bad {DEFAULT} for variable {variable}: {status}")
            }
            Self::Variable(e) => write!(f, "variable error: {e}"),
            Self::Compile(e) => write!(f, "compile error: {e}"),
        }
    }
}

impl core::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Variable(e) => Some(e),
            Self::Compile(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for LoadError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<VariableError> for LoadError {
    fn from(e: VariableError) -> Self {
        Self::Variable(e)
    }
}

impl From<CompileError> for LoadError {
    fn from(e: CompileError) -> Self {
        Self::Compile(e)
    }
}

/// Declared type and optional initial value of one variable.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableSpec {
    /// Variable name.
    pub name: Box<str>,
    /// Declared type; `Invalid` when not configured.
    pub ty: TypeDescriptor,
    /// Initial value, inputs only.
    pub default: Option<Value>,
}

/// Everything needed to build one evaluator.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluatorConfig {
    /// Program source.
    pub code: String,
    /// Configured inputs.
    pub inputs: Vec<VariableSpec>,
    /// Configured outputs.
    pub outputs: Vec<VariableSpec>,
}

fn variable_specs(
    section: Option<NodeView<'_>>,
    with_default: bool,
) -> Result<Vec<VariableSpec>, LoadError> {
    let Some(section) = section else {
        return Ok(Vec::new());
    };
    let mut specs = Vec::new();
    for node in section.nodes() {
        let variable: Box<str> = node.name().into();
        let ty = match node.text(TYPE) {
            Some(name) => {
                let td = TypeDescriptor::from_name(name);
                if !td.is_numeric() {
                    return Err(LoadError::BadType { variable });
                }
                td
            }
            None => TypeDescriptor::Invalid,
        };
        let default = match node.leaf(DEFAULT) {
            Some(leaf) if with_default => {
                Some(leaf.to_value(ty).map_err(|status| LoadError::BadDefault {
                    variable: variable.clone(),
                    status,
                })?)
            }
            _ => None,
        };
        specs.push(VariableSpec {
            name: variable,
            ty,
            default,
        });
    }
    Ok(specs)
}

impl EvaluatorConfig {
    /// Read the evaluator node at absolute `path`. The tree cursor is not moved.
    pub fn from_tree(tree: &ConfigTree, path: &str) -> Result<Self, LoadError> {
        let node = tree.view(path)?;
        let code = node
            .text(CODE)
            .ok_or_else(|| LoadError::MissingCode { path: path.into() })?;
        let section = |name| match node.node(name) {
            Ok(view) => Ok(Some(view)),
            Err(ConfigError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        };
        Ok(Self {
            code: code.into(),
            inputs: variable_specs(section(INPUT_VARIABLES)?, true)?,
            outputs: variable_specs(section(OUTPUT_VARIABLES)?, false)?,
        })
    }

    /// Extract, type, compile and initialise an evaluator.
    pub fn build<'r>(&self, registry: &'r FunctionRegistry) -> Result<Evaluator<'r>, LoadError> {
        let mut eval = Evaluator::new(registry, self.code.as_str());
        eval.extract_variables()?;
        for var in &self.inputs {
            eval.set_input_type(&var.name, var.ty)?;
        }
        for var in &self.outputs {
            eval.set_output_type(&var.name, var.ty)?;
        }
        eval.compile()?;
        for var in &self.inputs {
            let Some(value) = var.default else {
                continue;
            };
            let index = eval
                .inputs()
                .iter()
                .position(|v| v.name() == &*var.name)
                .ok_or_else(|| VariableError::Unknown {
                    name: var.name.clone(),
                })?;
            let status = eval.set_input_value_at(index, value)?;
            if !status.is_ok() {
                return Err(LoadError::BadDefault {
                    variable: var.name.clone(),
                    status,
                });
            }
        }
        tracing::debug!(
            inputs = self.inputs.len(),
            outputs = self.outputs.len(),
            "evaluator built from configuration"
        );
        Ok(eval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpn_tape::ExecutionMode;

    fn gain_tree() -> ConfigTree {
        let mut tree = ConfigTree::new();
        tree.create_absolute("Evaluators.Gain").expect("create");
        tree.write(CODE, "READ In\nCONST float64 2\nMUL\nWRITE Out\n")
            .expect("code");
        tree.create_relative("InputVariables.In").expect("create");
        tree.write(TYPE, "float64").expect("type");
        tree.write(DEFAULT, Value::F32(1.5)).expect("default");
        tree.create_absolute("Evaluators.Gain.OutputVariables.Out")
            .expect("create");
        tree.write(TYPE, "float64").expect("type");
        tree
    }

    #[test]
    fn loads_and_runs_with_defaults() {
        let tree = gain_tree();
        let config = EvaluatorConfig::from_tree(&tree, "Evaluators.Gain").expect("config");
        assert_eq!(config.inputs.len(), 1);
        assert_eq!(config.inputs[0].default, Some(Value::F64(1.5)));
        assert_eq!(config.outputs[0].ty, TypeDescriptor::Float64);

        let registry = FunctionRegistry::standard().expect("registry");
        let mut eval = config.build(&registry).expect("build");
        eval.execute(ExecutionMode::Safe, None).expect("run");
        assert_eq!(eval.output_as::<f64>("Out"), Some(3.0));
    }

    #[test]
    fn missing_code_and_bad_types_are_reported() {
        let mut tree = gain_tree();
        tree.create_absolute("Empty").expect("create");
        assert_eq!(
            EvaluatorConfig::from_tree(&tree, "Empty"),
            Err(LoadError::MissingCode {
                path: "Empty".into()
            })
        );

        tree.move_absolute("Evaluators.Gain.InputVariables.In")
            .expect("move");
        tree.write(TYPE, "complex").expect("type");
        assert_eq!(
            EvaluatorConfig::from_tree(&tree, "Evaluators.Gain"),
            Err(LoadError::BadType {
                variable: "In".into()
            })
        );
    }

    #[test]
    fn untyped_input_fails_to_compile() {
        let mut tree = gain_tree();
        tree.move_absolute("Evaluators.Gain").expect("move");
        assert!(tree.delete(INPUT_VARIABLES), "inputs removed");
        let config = EvaluatorConfig::from_tree(&tree, "Evaluators.Gain").expect("config");
        let registry = FunctionRegistry::standard().expect("registry");
        let err = config.build(&registry).expect_err("untyped input");
        assert!(
            matches!(&err, LoadError::Compile(e) if e.status() == Status::UNSUPPORTED_FEATURE),
            "{err}"
        );
    }

    #[test]
    fn oversized_default_is_rejected() {
        let mut tree = ConfigTree::new();
        tree.create_absolute("E").expect("create");
        tree.write(CODE, "READ A\nWRITE B\n").expect("code");
        tree.create_relative("InputVariables.A").expect("create");
        tree.write(TYPE, "uint8").expect("type");
        tree.write(DEFAULT, "1000").expect("default");
        assert_eq!(
            EvaluatorConfig::from_tree(&tree, "E"),
            Err(LoadError::BadDefault {
                variable: "A".into(),
                status: Status::OVERFLOW,
            })
        );
    }
}
