// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input and output variable lists.
//!
//! The compiler fills a [`VariableDirectory`] while scanning the source: inputs come from `READ`
//! of unseen names and from `CONST` literals, outputs from `WRITE`. An input and an output may
//! share a name; `READ X` after `WRITE X` refers to the output.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::context::DataAddress;
use crate::external::ExternalCell;
use crate::types::TypeDescriptor;

/// One named variable.
#[derive(Clone, Debug)]
pub struct VariableInformation {
    pub(crate) name: Box<str>,
    pub(crate) ty: TypeDescriptor,
    pub(crate) location: Option<DataAddress>,
    pub(crate) external: Option<ExternalCell>,
    pub(crate) used: bool,
    pub(crate) constant: bool,
    pub(crate) inferred: bool,
}

impl VariableInformation {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ty: TypeDescriptor::Invalid,
            location: None,
            external: None,
            used: false,
            constant: false,
            inferred: false,
        }
    }

    pub(crate) fn constant(name: Box<str>, ty: TypeDescriptor, location: DataAddress) -> Self {
        Self {
            name,
            ty,
            location: Some(location),
            external: None,
            used: false,
            constant: true,
            inferred: false,
        }
    }

    /// Variable name (`Constant@<slot>` for literals).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared (or, for untyped outputs, inferred) type.
    #[must_use]
    pub fn type_descriptor(&self) -> TypeDescriptor {
        self.ty
    }

    /// Data-arena slot; `None` until the variable has been placed by `compile`.
    #[must_use]
    pub fn location(&self) -> Option<DataAddress> {
        self.location
    }

    /// Caller-owned storage, if bound.
    #[must_use]
    pub fn external(&self) -> Option<&ExternalCell> {
        self.external.as_ref()
    }

    /// For outputs: whether a `WRITE` has been compiled for it.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Returns `true` for the synthetic variables backing `CONST` literals.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.constant
    }
}

/// Ordered list of variables, looked up by name, index or location.
#[derive(Clone, Debug, Default)]
pub struct VariableList {
    items: Vec<VariableInformation>,
}

impl VariableList {
    /// Index of the variable called `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|v| &*v.name == name)
    }

    /// Variable placed at `location`.
    #[must_use]
    pub fn at_location(&self, location: DataAddress) -> Option<&VariableInformation> {
        self.items.iter().find(|v| v.location == Some(location))
    }

    /// Variable at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&VariableInformation> {
        self.items.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut VariableInformation> {
        self.items.get_mut(index)
    }

    pub(crate) fn by_name_mut(&mut self, name: &str) -> Option<&mut VariableInformation> {
        self.items.iter_mut().find(|v| &*v.name == name)
    }

    pub(crate) fn push(&mut self, var: VariableInformation) {
        self.items.push(var);
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut VariableInformation> {
        self.items.iter_mut()
    }

    /// All variables in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[VariableInformation] {
        &self.items
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

/// The input and output lists of one program.
#[derive(Clone, Debug, Default)]
pub struct VariableDirectory {
    pub(crate) inputs: VariableList,
    pub(crate) outputs: VariableList,
}

impl VariableDirectory {
    /// Input variables, constants included.
    #[must_use]
    pub fn inputs(&self) -> &VariableList {
        &self.inputs
    }

    /// Output variables.
    #[must_use]
    pub fn outputs(&self) -> &VariableList {
        &self.outputs
    }

    /// Name of the variable placed at `location`, searching inputs then outputs.
    #[must_use]
    pub fn name_at(&self, location: DataAddress) -> Option<&str> {
        self.inputs
            .at_location(location)
            .or_else(|| self.outputs.at_location(location))
            .map(VariableInformation::name)
    }

    pub(crate) fn clear(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
    }
}

/// Failure of a variable accessor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VariableError {
    /// No variable with this name.
    Unknown {
        /// Requested name.
        name: Box<str>,
    },
    /// No variable at this index.
    BadIndex {
        /// Requested index.
        index: usize,
    },
    /// The operation needs a successfully compiled program.
    NotCompiled,
    /// The value's type differs from the variable's.
    TypeMismatch {
        /// Variable name.
        name: Box<str>,
        /// Variable type.
        expected: TypeDescriptor,
        /// Supplied type.
        found: TypeDescriptor,
    },
    /// `CONST` variables cannot be retyped or bound.
    Constant {
        /// Variable name.
        name: Box<str>,
    },
}

impl fmt::Display for VariableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { name } => write!(f, "unknown variable: {name}"),
            Self::BadIndex { index } => write!(f, "variable index out of range: {index}"),
            Self::NotCompiled => write!(f, "program not compiled"),
            Self::TypeMismatch {
                name,
                expected,
                found,
            } => write!(f, "type mismatch for {name}: expected {expected}, found {found}"),
            Self::Constant { name } => write!(f, "constant cannot be modified: {name}"),
        }
    }
}

impl core::error::Error for VariableError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_location() {
        let mut dir = VariableDirectory::default();
        dir.inputs.push(VariableInformation::constant(
            "Constant@0".into(),
            TypeDescriptor::Int8,
            0,
        ));
        let mut x = VariableInformation::new("X");
        x.location = Some(1);
        dir.inputs.push(x);
        let mut y = VariableInformation::new("X");
        y.location = Some(2);
        dir.outputs.push(y);

        assert_eq!(dir.inputs().find("X"), Some(1));
        assert_eq!(dir.outputs().find("X"), Some(0));
        assert_eq!(dir.name_at(0), Some("Constant@0"));
        assert_eq!(dir.name_at(2), Some("X"));
        assert_eq!(dir.name_at(9), None);
        assert!(dir.inputs().get(0).is_some_and(VariableInformation::is_constant), "literal");
    }
}
