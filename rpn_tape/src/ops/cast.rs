// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `CAST` between every pair of numeric types.

use super::{CAST, each_numeric};
use crate::context::Context;
use crate::convert::{Number, saturate};
use crate::registry::{FunctionRecord, FunctionRegistry, RegistryError};
use crate::status::Status;

fn cast<A: Number, B: Number>(ctx: &mut Context) {
    let (v, ok) = saturate::<A, B>(ctx.pop::<A>());
    ctx.push(v);
    if !ok {
        ctx.raise(Status::OUT_OF_RANGE);
    }
}

fn register_pair<A: Number, B: Number>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    reg.register(FunctionRecord::new(CAST, &[A::TYPE], &[B::TYPE], cast::<A, B>))?;
    Ok(())
}

fn register_from<A: Number>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    each_numeric!(reg, register_pair, A);
    Ok(())
}

pub(super) fn register(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    each_numeric!(reg, register_from);
    Ok(())
}
