// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Boolean operators over `uint8` (zero is false).

use crate::context::Context;
use crate::registry::{FunctionRecord, FunctionRegistry, RegistryError};
use crate::types::TypeDescriptor;

fn and(ctx: &mut Context) {
    let x1 = ctx.pop::<u8>() != 0;
    let x2 = ctx.pop::<u8>() != 0;
    ctx.push(u8::from(x2 && x1));
}

fn or(ctx: &mut Context) {
    let x1 = ctx.pop::<u8>() != 0;
    let x2 = ctx.pop::<u8>() != 0;
    ctx.push(u8::from(x2 || x1));
}

fn xor(ctx: &mut Context) {
    let x1 = ctx.pop::<u8>() != 0;
    let x2 = ctx.pop::<u8>() != 0;
    ctx.push(u8::from(x2 ^ x1));
}

fn not(ctx: &mut Context) {
    let x = ctx.pop::<u8>();
    ctx.push(u8::from(x == 0));
}

pub(super) fn register(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    const B: TypeDescriptor = TypeDescriptor::UInt8;
    reg.register(FunctionRecord::new("AND", &[B, B], &[B], and))?;
    reg.register(FunctionRecord::new("OR", &[B, B], &[B], or))?;
    reg.register(FunctionRecord::new("XOR", &[B, B], &[B], xor))?;
    reg.register(FunctionRecord::new("NOT", &[B], &[B], not))?;
    Ok(())
}
