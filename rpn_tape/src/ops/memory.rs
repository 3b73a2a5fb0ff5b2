// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Variable access and stack duplication.

use super::{READ, RREAD, RWRITE, WRITE, each_numeric};
use crate::context::Context;
use crate::convert::{Number, saturate};
use crate::registry::{FunctionRecord, FunctionRegistry, RegistryError};
use crate::status::Status;

fn read<T: Number>(ctx: &mut Context) {
    let addr = ctx.fetch();
    let v = ctx.load::<T>(addr);
    ctx.push(v);
}

fn write<T: Number>(ctx: &mut Context) {
    let addr = ctx.fetch();
    let v = ctx.pop::<T>();
    ctx.store(addr, v);
}

fn write_converting<I: Number, O: Number>(ctx: &mut Context) {
    let addr = ctx.fetch();
    let (v, ok) = saturate::<I, O>(ctx.pop::<I>());
    if !ok {
        ctx.raise(Status::OUT_OF_RANGE);
    }
    ctx.store(addr, v);
}

fn remote_read<T: Number>(ctx: &mut Context) {
    let addr = ctx.fetch();
    let v = ctx.load_external::<T>(addr);
    ctx.push(v);
}

fn remote_write<T: Number>(ctx: &mut Context) {
    let addr = ctx.fetch();
    let v = ctx.pop::<T>();
    ctx.store_external(addr, v);
}

fn remote_write_converting<I: Number, O: Number>(ctx: &mut Context) {
    let addr = ctx.fetch();
    let (v, ok) = saturate::<I, O>(ctx.pop::<I>());
    if !ok {
        ctx.raise(Status::OUT_OF_RANGE);
    }
    ctx.store_external(addr, v);
}

fn duplicate<T: Number>(ctx: &mut Context) {
    let v = ctx.pop::<T>();
    ctx.push(v);
    ctx.push(v);
}

fn register_access<T: Number>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    reg.register(FunctionRecord::new(READ, &[], &[T::TYPE], read::<T>).with_operand())?;
    reg.register(
        FunctionRecord::new(WRITE, &[T::TYPE], &[], write::<T>)
            .with_storage(T::TYPE)
            .with_operand(),
    )?;
    reg.register(FunctionRecord::new(RREAD, &[], &[T::TYPE], remote_read::<T>).with_operand())?;
    reg.register(
        FunctionRecord::new(RWRITE, &[T::TYPE], &[], remote_write::<T>)
            .with_storage(T::TYPE)
            .with_operand(),
    )?;
    Ok(())
}

fn register_converting<I: Number, O: Number>(
    reg: &mut FunctionRegistry,
) -> Result<(), RegistryError> {
    reg.register(
        FunctionRecord::new(WRITE, &[I::TYPE], &[], write_converting::<I, O>)
            .with_storage(O::TYPE)
            .with_operand(),
    )?;
    reg.register(
        FunctionRecord::new(RWRITE, &[I::TYPE], &[], remote_write_converting::<I, O>)
            .with_storage(O::TYPE)
            .with_operand(),
    )?;
    Ok(())
}

fn register_dup<T: Number>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    reg.register(FunctionRecord::new("DUP", &[T::TYPE], &[T::TYPE, T::TYPE], duplicate::<T>))?;
    Ok(())
}

pub(super) fn register(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    each_numeric!(reg, register_access);

    register_converting::<u64, u8>(reg)?;
    register_converting::<u64, u16>(reg)?;
    register_converting::<u64, u32>(reg)?;
    register_converting::<i64, u8>(reg)?;
    register_converting::<i64, u16>(reg)?;
    register_converting::<i64, u32>(reg)?;
    register_converting::<i64, u64>(reg)?;
    register_converting::<i64, i8>(reg)?;
    register_converting::<i64, i16>(reg)?;
    register_converting::<i64, i32>(reg)?;
    register_converting::<u32, u8>(reg)?;
    register_converting::<u32, u16>(reg)?;
    register_converting::<i32, u8>(reg)?;
    register_converting::<i32, u16>(reg)?;
    register_converting::<i32, u32>(reg)?;
    register_converting::<i32, i8>(reg)?;
    register_converting::<i32, i16>(reg)?;

    each_numeric!(reg, register_dup);
    Ok(())
}
