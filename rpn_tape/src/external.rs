// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caller-owned variable storage.
//!
//! A variable bound to an [`ExternalCell`] is read and written through the cell instead of the
//! evaluator's data arena. Cells are cheap to clone and share their storage, so the caller keeps
//! one handle and the evaluator another.

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::types::{Scalar, TypeDescriptor};
use crate::value::Value;

/// Shared 8-byte storage for one scalar.
///
/// The cell holds raw little-endian bits; the type is whatever the bound variable declares.
/// Callers are expected to sequence their own accesses around `execute`.
#[derive(Clone, Default)]
pub struct ExternalCell(Arc<AtomicU64>);

impl ExternalCell {
    /// Create a zeroed cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cell holding `v`.
    #[must_use]
    pub fn with<T: Scalar>(v: T) -> Self {
        let cell = Self::new();
        cell.set(v);
        cell
    }

    /// Read the stored bits as `T`.
    #[inline]
    #[must_use]
    pub fn get<T: Scalar>(&self) -> T {
        T::read_le(&self.0.load(Ordering::Relaxed).to_le_bytes())
    }

    /// Store `v`, zero-filling the unused high bytes.
    #[inline]
    pub fn set<T: Scalar>(&self, v: T) {
        let mut buf = [0_u8; 8];
        v.write_le(&mut buf);
        self.0.store(u64::from_le_bytes(buf), Ordering::Relaxed);
    }

    /// Read the stored bits as a value of type `td`.
    #[must_use]
    pub fn value(&self, td: TypeDescriptor) -> Option<Value> {
        Value::from_bytes(td, &self.0.load(Ordering::Relaxed).to_le_bytes())
    }

    /// Returns `true` if both handles share storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ExternalCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalCell({:#018x})", self.0.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let a = ExternalCell::with(-152.3_f64);
        let b = a.clone();
        assert!(a.ptr_eq(&b), "clone shares");
        b.set(4_i16);
        assert_eq!(a.get::<i16>(), 4);
        assert_eq!(a.value(TypeDescriptor::Int16), Some(Value::I16(4)));
    }
}
