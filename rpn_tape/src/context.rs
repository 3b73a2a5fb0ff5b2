// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Execution state shared with native operator callbacks.
//!
//! A [`Context`] owns the compiled code words, the data arena and the operand stack, plus the
//! cursors into them. Native callbacks receive `&mut Context` and use the typed accessors below;
//! none of them panic. A miss (stack under/overrun, address outside the arena) yields a zero
//! value and latches a fault that safe and debug execution turn into `OUT_OF_RANGE`.

use alloc::vec::Vec;

use crate::arena::SlotArena;
use crate::convert::Number;
use crate::external::ExternalCell;
use crate::status::Status;
use crate::types::{Scalar, TypeDescriptor};
use crate::value::{Value, with_scalar};

/// One code word: a record index or an operand.
pub type CodeWord = u16;

/// Data-arena slot address, as carried by an operand word.
pub type DataAddress = CodeWord;

/// Signature of a native operator implementation.
pub type NativeFn = fn(&mut Context);

/// Interpreter state: three buffers, their cursors and the accumulated status.
#[derive(Debug, Default)]
pub struct Context {
    pub(crate) code: Vec<CodeWord>,
    pub(crate) pc: usize,
    pub(crate) data: SlotArena,
    pub(crate) stack: SlotArena,
    pub(crate) sp: usize,
    pub(crate) externals: Vec<ExternalCell>,
    pub(crate) status: Status,
    pub(crate) fault: bool,
}

impl Context {
    /// Read the next code word and advance past it.
    #[inline]
    pub fn fetch(&mut self) -> CodeWord {
        let word = match self.code.get(self.pc) {
            Some(&w) => w,
            None => {
                self.fault = true;
                0
            }
        };
        self.pc += 1;
        word
    }

    /// Pop a `T` off the operand stack.
    #[inline]
    pub fn pop<T: Scalar>(&mut self) -> T {
        let n = T::TYPE.slots();
        if self.sp < n {
            self.fault = true;
            self.sp = 0;
            return T::default();
        }
        self.sp -= n;
        self.stack.get(self.sp).unwrap_or_else(|| {
            self.fault = true;
            T::default()
        })
    }

    /// Push a `T` onto the operand stack.
    #[inline]
    pub fn push<T: Scalar>(&mut self, v: T) {
        if !self.stack.set(self.sp, v) {
            self.fault = true;
        }
        self.sp += T::TYPE.slots();
    }

    /// Read the `T` stored at data slot `addr`.
    #[inline]
    pub fn load<T: Scalar>(&mut self, addr: DataAddress) -> T {
        match self.data.get(usize::from(addr)) {
            Some(v) => v,
            None => {
                self.fault = true;
                T::default()
            }
        }
    }

    /// Store `v` at data slot `addr`.
    #[inline]
    pub fn store<T: Scalar>(&mut self, addr: DataAddress, v: T) {
        if !self.data.set(usize::from(addr), v) {
            self.fault = true;
        }
    }

    fn cell(&mut self, addr: DataAddress) -> Option<&ExternalCell> {
        let index = self.load::<u32>(addr) as usize;
        let cell = self.externals.get(index);
        if cell.is_none() {
            self.fault = true;
        }
        cell
    }

    /// Read through the external cell whose index is stored at data slot `addr`.
    #[inline]
    pub fn load_external<T: Number>(&mut self, addr: DataAddress) -> T {
        self.cell(addr).map(ExternalCell::get).unwrap_or_default()
    }

    /// Write through the external cell whose index is stored at data slot `addr`.
    #[inline]
    pub fn store_external<T: Number>(&mut self, addr: DataAddress, v: T) {
        if let Some(cell) = self.cell(addr) {
            cell.set(v);
        }
    }

    /// Accumulate `status` into the run status.
    #[inline]
    pub fn raise(&mut self, status: Status) {
        self.status |= status;
    }

    /// Status accumulated so far in this run.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Operand stack depth in slots.
    #[inline]
    #[must_use]
    pub fn stack_offset(&self) -> usize {
        self.sp
    }

    /// Position of the next code word.
    #[inline]
    #[must_use]
    pub fn code_offset(&self) -> usize {
        self.pc
    }

    /// Read a `T` located `depth` slots below the stack top without popping.
    pub(crate) fn peek<T: Scalar>(&self, depth: usize) -> Option<T> {
        let slot = self.sp.checked_sub(depth + T::TYPE.slots())?;
        self.stack.get(slot)
    }

    /// Dynamically typed [`Self::peek`].
    pub(crate) fn peek_value(&self, td: TypeDescriptor, depth: usize) -> Option<Value> {
        with_scalar!(td, T => self.peek::<T>(depth).map(Value::from), None)
    }

    pub(crate) fn rewind(&mut self) {
        self.pc = 0;
        self.sp = 0;
        self.status = Status::NO_ERROR;
        self.fault = false;
    }

    pub(crate) fn stack_capacity(&self) -> usize {
        self.stack.slots()
    }
}
