// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot-addressed byte storage.
//!
//! Both the data arena (constants followed by variables) and the operand stack are flat byte
//! buffers addressed in [`SLOT_BYTES`]-wide slots. Accessors are bounds checked and report a
//! miss instead of panicking.

use alloc::vec::Vec;

use crate::types::{SLOT_BYTES, Scalar};

/// A zero-initialised, slot-addressed byte buffer.
#[derive(Clone, Debug, Default)]
pub(crate) struct SlotArena {
    bytes: Vec<u8>,
}

impl SlotArena {
    /// Drop the contents and allocate `slots` zeroed slots.
    pub(crate) fn reset(&mut self, slots: usize) {
        self.bytes.clear();
        self.bytes.resize(slots * SLOT_BYTES, 0);
    }

    pub(crate) fn slots(&self) -> usize {
        self.bytes.len() / SLOT_BYTES
    }

    #[inline]
    pub(crate) fn get<T: Scalar>(&self, slot: usize) -> Option<T> {
        self.bytes(slot, T::TYPE.byte_size()).map(T::read_le)
    }

    /// Returns `false` if the value does not fit.
    #[inline]
    pub(crate) fn set<T: Scalar>(&mut self, slot: usize, v: T) -> bool {
        match self.bytes_mut(slot, T::TYPE.byte_size()) {
            Some(out) => {
                v.write_le(out);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub(crate) fn bytes(&self, slot: usize, len: usize) -> Option<&[u8]> {
        let start = slot.checked_mul(SLOT_BYTES)?;
        self.bytes.get(start..start.checked_add(len)?)
    }

    #[inline]
    pub(crate) fn bytes_mut(&mut self, slot: usize, len: usize) -> Option<&mut [u8]> {
        let start = slot.checked_mul(SLOT_BYTES)?;
        self.bytes.get_mut(start..start.checked_add(len)?)
    }
}
