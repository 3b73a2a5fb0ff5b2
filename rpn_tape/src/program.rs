// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compiled form of an RPN program.

use alloc::vec::Vec;

use crate::arena::SlotArena;
use crate::context::{CodeWord, Context};
use crate::external::ExternalCell;

/// Output of the compiler: code words plus the initial data arena.
///
/// The data arena holds the constants in `[0, start_of_variables)` followed by the variables;
/// slots of externally bound variables carry the index of their cell in [`Self::externals`].
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub(crate) code: Vec<CodeWord>,
    pub(crate) data: SlotArena,
    pub(crate) externals: Vec<ExternalCell>,
    pub(crate) stack_slots: usize,
    pub(crate) start_of_variables: usize,
}

impl Program {
    /// Code words in execution order.
    #[must_use]
    pub fn code(&self) -> &[CodeWord] {
        &self.code
    }

    /// Operand stack size in slots needed by this program.
    #[must_use]
    pub fn stack_slots(&self) -> usize {
        self.stack_slots
    }

    /// Data slot where the variables begin; everything below is a constant.
    #[must_use]
    pub fn start_of_variables(&self) -> usize {
        self.start_of_variables
    }

    /// Total data-arena size in slots.
    #[must_use]
    pub fn data_slots(&self) -> usize {
        self.data.slots()
    }

    /// Move the buffers into a fresh execution context.
    pub(crate) fn into_context(self) -> Context {
        let mut stack = SlotArena::default();
        stack.reset(self.stack_slots);
        Context {
            code: self.code,
            data: self.data,
            stack,
            externals: self.externals,
            ..Context::default()
        }
    }
}
