// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Operation records and overload resolution.
//!
//! A [`FunctionRegistry`] is an append-only table of [`FunctionRecord`]s. Several records may
//! share a mnemonic; the compiler picks one by exact comparison of the record's declared input
//! types against the top of the [`TypeStack`]. Candidates are tried in registration order and the
//! first match wins.
//!
//! Record input lists are ordered from the top of the stack downwards: `inputs[0]` is the type of
//! the value popped first.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use crate::context::NativeFn;
use crate::types::TypeDescriptor;

/// Index of a record in the registry; also the opcode word emitted into code.
pub type PCode = u16;

/// Default capacity of [`FunctionRegistry::standard`].
pub const DEFAULT_CAPACITY: usize = 16384;

/// One overload of a mnemonic.
#[derive(Clone, Debug)]
pub struct FunctionRecord {
    name: &'static str,
    inputs: Box<[TypeDescriptor]>,
    outputs: Box<[TypeDescriptor]>,
    storage: Option<TypeDescriptor>,
    operand: bool,
    func: NativeFn,
}

impl FunctionRecord {
    /// Create a record consuming `inputs` (top first) and producing `outputs` (pushed in order).
    #[must_use]
    pub fn new(
        name: &'static str,
        inputs: &[TypeDescriptor],
        outputs: &[TypeDescriptor],
        func: NativeFn,
    ) -> Self {
        Self {
            name,
            inputs: inputs.into(),
            outputs: outputs.into(),
            storage: None,
            operand: false,
            func,
        }
    }

    /// Mark the record as a sink that stores into a variable of type `storage`.
    ///
    /// A sink has no outputs; its storage type is what the output hint is matched against.
    #[must_use]
    pub fn with_storage(mut self, storage: TypeDescriptor) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Mark the record as taking one operand word after the opcode.
    #[must_use]
    pub fn with_operand(mut self) -> Self {
        self.operand = true;
        self
    }

    /// Mnemonic.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Input types, top of stack first.
    #[inline]
    #[must_use]
    pub fn inputs(&self) -> &[TypeDescriptor] {
        &self.inputs
    }

    /// Output types, in push order.
    #[inline]
    #[must_use]
    pub fn outputs(&self) -> &[TypeDescriptor] {
        &self.outputs
    }

    /// Storage type of a sink record.
    #[inline]
    #[must_use]
    pub fn storage(&self) -> Option<TypeDescriptor> {
        self.storage
    }

    /// Returns `true` if an operand word follows the opcode.
    #[inline]
    #[must_use]
    pub fn has_operand(&self) -> bool {
        self.operand
    }

    /// Native implementation.
    #[inline]
    #[must_use]
    pub fn func(&self) -> NativeFn {
        self.func
    }

    /// The type the output hint must equal: the first output, or the storage type of a sink.
    #[must_use]
    pub fn output_hint(&self) -> Option<TypeDescriptor> {
        self.outputs.first().copied().or(self.storage)
    }

    /// Net operand stack effect in slots.
    #[must_use]
    pub fn stack_effect(&self) -> isize {
        let slots = |tds: &[TypeDescriptor]| tds.iter().map(|td| td.slots()).sum::<usize>();
        slots(&self.outputs).cast_signed() - slots(&self.inputs).cast_signed()
    }

    /// Check this record against the type stack and, on a match, apply its effect.
    ///
    /// With `match_output` the entry on top must equal [`Self::output_hint`] and the inputs are
    /// checked below it. On success the hint and inputs are popped, outputs pushed and
    /// `stack_slots` updated by the size delta.
    fn try_consume(
        &self,
        types: &mut TypeStack,
        match_output: bool,
        stack_slots: &mut usize,
    ) -> Result<bool, ResolveError> {
        let hint = usize::from(match_output);
        if match_output && (types.peek(0).is_none() || types.peek(0) != self.output_hint()) {
            return Ok(false);
        }
        let inputs_match = self
            .inputs
            .iter()
            .enumerate()
            .all(|(i, &want)| types.peek(i + hint) == Some(want));
        if !inputs_match {
            return Ok(false);
        }
        if types.len() - hint - self.inputs.len() + self.outputs.len() > TypeStack::CAPACITY {
            return Err(ResolveError::TypeStackFull);
        }

        if match_output {
            types.pop();
        }
        for td in &self.inputs {
            types.pop();
            *stack_slots = stack_slots.saturating_sub(td.slots());
        }
        for &td in &self.outputs {
            types.push(td)?;
            *stack_slots += td.slots();
        }
        Ok(true)
    }
}

/// Compile-time stack of pending value types.
#[derive(Clone, Debug, Default)]
pub struct TypeStack {
    items: Vec<TypeDescriptor>,
}

impl TypeStack {
    /// Maximum depth.
    pub const CAPACITY: usize = 32;

    /// Empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `td`; fails when full.
    pub fn push(&mut self, td: TypeDescriptor) -> Result<(), ResolveError> {
        if self.items.len() >= Self::CAPACITY {
            return Err(ResolveError::TypeStackFull);
        }
        self.items.push(td);
        Ok(())
    }

    /// Pop the top entry.
    pub fn pop(&mut self) -> Option<TypeDescriptor> {
        self.items.pop()
    }

    /// Entry `depth` positions below the top (`0` is the top).
    #[must_use]
    pub fn peek(&self, depth: usize) -> Option<TypeDescriptor> {
        let idx = self.items.len().checked_sub(depth + 1)?;
        self.items.get(idx).copied()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Render up to `n` entries from the top as `[t0|t1|...]`.
    #[must_use]
    pub fn render_top(&self, n: usize) -> String {
        let mut out = String::from("[");
        for depth in 0..n.min(self.items.len()) {
            if depth > 0 {
                out.push('|');
            }
            out.push_str(self.peek(depth).unwrap_or_default().name());
        }
        out.push(']');
        out
    }
}

/// Registration failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The table is full.
    CapacityExceeded {
        /// Configured capacity.
        capacity: usize,
        /// Mnemonic of the rejected record.
        name: &'static str,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { capacity, name } => {
                write!(f, "function registry full: capacity={capacity} rejected={name}")
            }
        }
    }
}

impl core::error::Error for RegistryError {}

/// Overload resolution failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// No record with this mnemonic matches the type stack.
    NotFound,
    /// Applying the match would exceed [`TypeStack::CAPACITY`].
    TypeStackFull,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no matching overload"),
            Self::TypeStackFull => write!(f, "type stack full"),
        }
    }
}

impl core::error::Error for ResolveError {}

/// Append-only, fixed-capacity table of operation records.
#[derive(Clone, Debug)]
pub struct FunctionRegistry {
    records: Vec<FunctionRecord>,
    by_name: HashMap<&'static str, Vec<PCode>>,
    capacity: usize,
}

impl FunctionRegistry {
    /// Empty registry holding at most `capacity` records (clamped to the opcode range).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            by_name: HashMap::new(),
            capacity: capacity.min(usize::from(PCode::MAX) + 1),
        }
    }

    /// Registry with [`DEFAULT_CAPACITY`] holding the built-in operator catalogue.
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::new(DEFAULT_CAPACITY);
        crate::ops::register_builtins(&mut registry)?;
        tracing::debug!(records = registry.len(), "built-in operators registered");
        Ok(registry)
    }

    /// Append `record`, returning its opcode.
    pub fn register(&mut self, record: FunctionRecord) -> Result<PCode, RegistryError> {
        let pcode = match PCode::try_from(self.records.len()) {
            Ok(p) if self.records.len() < self.capacity => p,
            _ => {
                return Err(RegistryError::CapacityExceeded {
                    capacity: self.capacity,
                    name: record.name,
                });
            }
        };
        self.by_name.entry(record.name).or_default().push(pcode);
        self.records.push(record);
        Ok(pcode)
    }

    /// Find the first record named `name` that matches the type stack and apply it.
    pub fn resolve(
        &self,
        name: &str,
        types: &mut TypeStack,
        match_output: bool,
        stack_slots: &mut usize,
    ) -> Result<PCode, ResolveError> {
        let candidates = self.by_name.get(name).ok_or(ResolveError::NotFound)?;
        for &pcode in candidates {
            let record = &self.records[usize::from(pcode)];
            if record.try_consume(types, match_output, stack_slots)? {
                return Ok(pcode);
            }
        }
        Err(ResolveError::NotFound)
    }

    /// Opcode of the record with exactly this signature.
    #[must_use]
    pub fn find(
        &self,
        name: &str,
        inputs: &[TypeDescriptor],
        outputs: &[TypeDescriptor],
    ) -> Option<PCode> {
        self.by_name.get(name)?.iter().copied().find(|&p| {
            let r = &self.records[usize::from(p)];
            *r.inputs == *inputs && *r.outputs == *outputs
        })
    }

    /// Record for `pcode`.
    #[inline]
    #[must_use]
    pub fn record(&self, pcode: PCode) -> Option<&FunctionRecord> {
        self.records.get(usize::from(pcode))
    }

    /// All records in registration order.
    #[must_use]
    pub fn records(&self) -> &[FunctionRecord] {
        &self.records
    }

    /// Number of registered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
