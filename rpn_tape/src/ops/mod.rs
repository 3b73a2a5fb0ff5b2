// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in operator catalogue.
//!
//! Every overload is a concrete monomorphised native function registered with its exact type
//! signature. Registration order matters where signatures overlap: the first match wins.

use crate::registry::{FunctionRegistry, RegistryError};

mod arith;
mod cast;
mod compare;
mod logic;
mod math;
mod memory;

/// Push a variable's value. Takes a data-slot operand.
pub const READ: &str = "READ";
/// Pop into a variable. Takes a data-slot operand.
pub const WRITE: &str = "WRITE";
/// `READ` through an external cell.
pub const RREAD: &str = "RREAD";
/// `WRITE` through an external cell.
pub const RWRITE: &str = "RWRITE";
/// Type conversion; the target type is given in source and hinted on the type stack.
pub const CAST: &str = "CAST";
/// Source-level literal, compiled as a `READ` of constant memory.
pub const CONST: &str = "CONST";

/// Invoke `$f::<$pre.., T>($reg)?` for each numeric `T`.
macro_rules! each_numeric {
    ($reg:expr, $f:ident $(, $pre:ty)*) => {
        $f::<$($pre,)* f64>($reg)?;
        $f::<$($pre,)* f32>($reg)?;
        $f::<$($pre,)* u64>($reg)?;
        $f::<$($pre,)* i64>($reg)?;
        $f::<$($pre,)* u32>($reg)?;
        $f::<$($pre,)* i32>($reg)?;
        $f::<$($pre,)* u16>($reg)?;
        $f::<$($pre,)* i16>($reg)?;
        $f::<$($pre,)* u8>($reg)?;
        $f::<$($pre,)* i8>($reg)?;
    };
}
pub(crate) use each_numeric;

/// Register the full built-in catalogue into `registry`.
pub fn register_builtins(registry: &mut FunctionRegistry) -> Result<(), RegistryError> {
    memory::register(registry)?;
    cast::register(registry)?;
    math::register(registry)?;
    compare::register(registry)?;
    logic::register(registry)?;
    arith::register(registry)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use alloc::vec::Vec;

    use crate::context::Context;
    use crate::registry::FunctionRegistry;
    use crate::status::Status;
    use crate::types::{Scalar, TypeDescriptor};

    /// Run the record with this exact signature on a context pre-loaded with `setup`.
    pub(crate) fn run(
        registry: &FunctionRegistry,
        name: &str,
        inputs: &[TypeDescriptor],
        outputs: &[TypeDescriptor],
        setup: impl FnOnce(&mut Context),
    ) -> (Context, Status) {
        let pcode = registry
            .find(name, inputs, outputs)
            .unwrap_or_else(|| panic!("{name}{inputs:?}->{outputs:?} not registered"));
        let record = registry.record(pcode).expect("record");
        let mut ctx = Context::default();
        ctx.stack.reset(8);
        ctx.data.reset(8);
        ctx.code = Vec::from([0]);
        setup(&mut ctx);
        (record.func())(&mut ctx);
        let status = ctx.status();
        (ctx, status)
    }

    /// Apply a binary record to `x2` (below) and `x1` (top).
    pub(crate) fn binary<A: Scalar, B: Scalar, O: Scalar>(
        registry: &FunctionRegistry,
        name: &str,
        x2: B,
        x1: A,
    ) -> (O, Status) {
        let (mut ctx, status) = run(registry, name, &[A::TYPE, B::TYPE], &[O::TYPE], |ctx| {
            ctx.push(x2);
            ctx.push(x1);
        });
        let out = ctx.pop::<O>();
        assert_eq!(ctx.stack_offset(), 0, "{name} left residue");
        (out, status)
    }

    /// Apply a unary record.
    pub(crate) fn unary<A: Scalar, O: Scalar>(
        registry: &FunctionRegistry,
        name: &str,
        x: A,
    ) -> (O, Status) {
        let (mut ctx, status) = run(registry, name, &[A::TYPE], &[O::TYPE], |ctx| ctx.push(x));
        (ctx.pop::<O>(), status)
    }
}
