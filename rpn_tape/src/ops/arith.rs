// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arithmetic: `ADD`, `SUB`, `MUL`, `DIV` and `NEG`.
//!
//! Integer overloads come in two flavours:
//! - *cast*: both operands are `as`-cast into the output type, then combined with a wrapping
//!   operation that raises `OVERFLOW`/`UNDERFLOW` on carry loss;
//! - *converted*: both operands go through a saturating conversion first; if either does not fit
//!   the result is `0` and `OVERFLOW` is raised.
//!
//! The second flavour is used where the output type cannot represent every input value (for
//! example `uint32` operands into an `int32` result).

use crate::context::Context;
use crate::convert::{Number, cast, saturate};
use crate::registry::{FunctionRecord, FunctionRegistry, RegistryError};
use crate::status::Status;

trait BinaryOp {
    const NAME: &'static str;
    fn apply<T: Number>(x2: T, x1: T) -> (T, Status);
}

struct Add;
struct Sub;
struct Mul;
struct Div;

impl BinaryOp for Add {
    const NAME: &'static str = "ADD";
    fn apply<T: Number>(x2: T, x1: T) -> (T, Status) {
        x2.add_flagged(x1)
    }
}

impl BinaryOp for Sub {
    const NAME: &'static str = "SUB";
    fn apply<T: Number>(x2: T, x1: T) -> (T, Status) {
        x2.sub_flagged(x1)
    }
}

impl BinaryOp for Mul {
    const NAME: &'static str = "MUL";
    fn apply<T: Number>(x2: T, x1: T) -> (T, Status) {
        x2.mul_flagged(x1)
    }
}

impl BinaryOp for Div {
    const NAME: &'static str = "DIV";
    fn apply<T: Number>(x2: T, x1: T) -> (T, Status) {
        x2.div_flagged(x1)
    }
}

/// `A` is the top operand, `B` the one below it.
fn cast_op<Op: BinaryOp, A: Number, B: Number, O: Number>(ctx: &mut Context) {
    let x1 = ctx.pop::<A>();
    let x2 = ctx.pop::<B>();
    let (r, status) = Op::apply(cast::<B, O>(x2), cast::<A, O>(x1));
    ctx.raise(status);
    ctx.push(r);
}

fn converted_op<Op: BinaryOp, A: Number, B: Number, O: Number>(ctx: &mut Context) {
    let (z1, ok1) = saturate::<A, O>(ctx.pop::<A>());
    let (z2, ok2) = saturate::<B, O>(ctx.pop::<B>());
    if ok1 && ok2 {
        let (r, status) = Op::apply(z2, z1);
        ctx.raise(status);
        ctx.push(r);
    } else {
        ctx.raise(Status::OVERFLOW);
        ctx.push(O::default());
    }
}

fn negate<A: Number, O: Number>(ctx: &mut Context) {
    match saturate::<A, O>(ctx.pop::<A>()) {
        (z, true) => {
            let (r, status) = z.neg_flagged();
            ctx.raise(status);
            ctx.push(r);
        }
        (_, false) => {
            ctx.raise(Status::UNDERFLOW);
            ctx.push(O::default());
        }
    }
}

/// `T op T -> O`, cast flavour.
fn same<Op: BinaryOp, T: Number, O: Number>(
    reg: &mut FunctionRegistry,
) -> Result<(), RegistryError> {
    reg.register(FunctionRecord::new(
        Op::NAME,
        &[T::TYPE, T::TYPE],
        &[O::TYPE],
        cast_op::<Op, T, T, O>,
    ))?;
    Ok(())
}

/// `T op T -> O`, converted flavour.
fn same_converted<Op: BinaryOp, T: Number, O: Number>(
    reg: &mut FunctionRegistry,
) -> Result<(), RegistryError> {
    reg.register(FunctionRecord::new(
        Op::NAME,
        &[T::TYPE, T::TYPE],
        &[O::TYPE],
        converted_op::<Op, T, T, O>,
    ))?;
    Ok(())
}

/// `A op B -> O` in both operand orders, cast flavour.
fn mixed<Op: BinaryOp, A: Number, B: Number, O: Number>(
    reg: &mut FunctionRegistry,
) -> Result<(), RegistryError> {
    reg.register(FunctionRecord::new(
        Op::NAME,
        &[A::TYPE, B::TYPE],
        &[O::TYPE],
        cast_op::<Op, A, B, O>,
    ))?;
    reg.register(FunctionRecord::new(
        Op::NAME,
        &[B::TYPE, A::TYPE],
        &[O::TYPE],
        cast_op::<Op, B, A, O>,
    ))?;
    Ok(())
}

/// `A op B -> O` in both operand orders, converted flavour.
fn mixed_converted<Op: BinaryOp, A: Number, B: Number, O: Number>(
    reg: &mut FunctionRegistry,
) -> Result<(), RegistryError> {
    reg.register(FunctionRecord::new(
        Op::NAME,
        &[A::TYPE, B::TYPE],
        &[O::TYPE],
        converted_op::<Op, A, B, O>,
    ))?;
    reg.register(FunctionRecord::new(
        Op::NAME,
        &[B::TYPE, A::TYPE],
        &[O::TYPE],
        converted_op::<Op, B, A, O>,
    ))?;
    Ok(())
}

fn floats<Op: BinaryOp>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    same::<Op, f64, f64>(reg)?;
    same::<Op, f32, f32>(reg)
}

/// Promotion table shared by `ADD` and `MUL`.
fn additive<Op: BinaryOp>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    same::<Op, i8, i32>(reg)?;
    same::<Op, i16, i32>(reg)?;
    same::<Op, i32, i32>(reg)?;
    same::<Op, i32, i64>(reg)?;
    same::<Op, i64, i64>(reg)?;
    same::<Op, u8, u32>(reg)?;
    same::<Op, u16, u32>(reg)?;
    same::<Op, u32, u32>(reg)?;
    same::<Op, u32, u64>(reg)?;
    same::<Op, u64, u64>(reg)?;
    signed_mixed::<Op>(reg)?;
    mixed::<Op, u8, u32, u32>(reg)?;
    mixed::<Op, u16, u32, u32>(reg)?;
    mixed::<Op, u8, u64, u64>(reg)?;
    mixed::<Op, u16, u64, u64>(reg)?;
    mixed::<Op, u32, u64, u64>(reg)
}

/// Mixed widths into `int32` and `int64`, common to all four operators except `DIV`.
fn signed_mixed<Op: BinaryOp>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    mixed::<Op, i8, i32, i32>(reg)?;
    mixed::<Op, i16, i32, i32>(reg)?;
    mixed::<Op, u8, i32, i32>(reg)?;
    mixed::<Op, u16, i32, i32>(reg)?;
    mixed_converted::<Op, u32, i32, i32>(reg)?;
    mixed::<Op, i8, i64, i64>(reg)?;
    mixed::<Op, i16, i64, i64>(reg)?;
    mixed::<Op, i32, i64, i64>(reg)?;
    mixed::<Op, u8, i64, i64>(reg)?;
    mixed::<Op, u16, i64, i64>(reg)?;
    mixed::<Op, u32, i64, i64>(reg)?;
    mixed_converted::<Op, u64, i64, i64>(reg)
}

fn subtraction(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    same::<Sub, i8, i32>(reg)?;
    same::<Sub, i16, i32>(reg)?;
    same::<Sub, i32, i32>(reg)?;
    same::<Sub, i64, i64>(reg)?;
    same::<Sub, u8, i32>(reg)?;
    same::<Sub, u16, i32>(reg)?;
    same_converted::<Sub, u32, i32>(reg)?;
    same_converted::<Sub, u64, i64>(reg)?;
    signed_mixed::<Sub>(reg)?;
    mixed_converted::<Sub, u8, u32, i32>(reg)?;
    mixed_converted::<Sub, u16, u32, i32>(reg)?;
    mixed_converted::<Sub, u8, u64, i64>(reg)?;
    mixed_converted::<Sub, u16, u64, i64>(reg)?;
    mixed_converted::<Sub, u32, u64, i64>(reg)
}

fn division(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    same::<Div, i8, i32>(reg)?;
    same::<Div, i16, i32>(reg)?;
    same::<Div, i32, i32>(reg)?;
    same::<Div, i64, i64>(reg)?;
    same::<Div, u8, u32>(reg)?;
    same::<Div, u16, u32>(reg)?;
    same::<Div, u32, u32>(reg)?;
    same::<Div, u64, u64>(reg)?;
    signed_mixed::<Div>(reg)?;
    mixed::<Div, u8, u32, u32>(reg)?;
    mixed::<Div, u16, u32, u32>(reg)?;
    mixed::<Div, u8, u64, u64>(reg)?;
    mixed::<Div, u16, u64, u64>(reg)?;
    mixed::<Div, u32, u64, u64>(reg)
}

fn negation(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    fn neg<A: Number, O: Number>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
        reg.register(FunctionRecord::new("NEG", &[A::TYPE], &[O::TYPE], negate::<A, O>))?;
        Ok(())
    }
    neg::<f64, f64>(reg)?;
    neg::<f32, f32>(reg)?;
    neg::<i8, i8>(reg)?;
    neg::<i16, i16>(reg)?;
    neg::<i32, i32>(reg)?;
    neg::<i64, i64>(reg)?;
    neg::<u8, i16>(reg)?;
    neg::<u16, i32>(reg)?;
    neg::<u32, i64>(reg)?;
    neg::<u64, i64>(reg)
}

pub(super) fn register(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    floats::<Add>(reg)?;
    floats::<Sub>(reg)?;
    floats::<Mul>(reg)?;
    floats::<Div>(reg)?;
    additive::<Add>(reg)?;
    subtraction(reg)?;
    additive::<Mul>(reg)?;
    division(reg)?;
    negation(reg)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{binary, unary};
    use crate::registry::{FunctionRegistry, TypeStack};
    use crate::status::Status;
    use crate::types::TypeDescriptor as T;

    #[test]
    fn widening_same_type_addition() {
        let reg = FunctionRegistry::standard().expect("registry");
        assert_eq!(
            binary::<i8, i8, i32>(&reg, "ADD", 127, 127),
            (254, Status::NO_ERROR)
        );
        assert_eq!(
            binary::<u16, u16, u32>(&reg, "MUL", 60000, 2),
            (120_000, Status::NO_ERROR)
        );
    }

    #[test]
    fn mixed_addition_underflow_wraps() {
        let reg = FunctionRegistry::standard().expect("registry");
        // int8 -1 below, int32 MIN on top.
        let (v, status) = binary::<i32, i8, i32>(&reg, "ADD", -1, i32::MIN);
        assert_eq!(v, i32::MAX);
        assert_eq!(status, Status::UNDERFLOW);
    }

    #[test]
    fn subtraction_order_and_conversion() {
        let reg = FunctionRegistry::standard().expect("registry");
        assert_eq!(binary::<f32, f32, f32>(&reg, "SUB", 2.0, 1.0).0, 1.0);
        assert_eq!(binary::<u8, u8, i32>(&reg, "SUB", 1, 2).0, -1);
        let (v, status) = binary::<u32, u32, i32>(&reg, "SUB", u32::MAX, 0);
        assert_eq!((v, status), (0, Status::OVERFLOW));
        let (v, status) = binary::<u32, u64, i64>(&reg, "SUB", 10, 20);
        assert_eq!((v, status), (-10, Status::NO_ERROR));
    }

    #[test]
    fn division_by_zero_is_flagged() {
        let reg = FunctionRegistry::standard().expect("registry");
        assert_eq!(
            binary::<i32, i32, i32>(&reg, "DIV", 7, 0),
            (0, Status::OVERFLOW)
        );
        assert_eq!(
            binary::<i32, i32, i32>(&reg, "DIV", i32::MIN, -1),
            (i32::MIN, Status::OVERFLOW)
        );
        assert_eq!(
            binary::<u8, u8, u32>(&reg, "DIV", 9, 2),
            (4, Status::NO_ERROR)
        );
        assert!(binary::<f64, f64, f64>(&reg, "DIV", 1.0, 0.0).0.is_infinite(), "ieee");
    }

    #[test]
    fn negation_widens_unsigned() {
        let reg = FunctionRegistry::standard().expect("registry");
        assert_eq!(unary::<u8, i16>(&reg, "NEG", 200), (-200, Status::NO_ERROR));
        assert_eq!(unary::<i8, i8>(&reg, "NEG", i8::MIN), (i8::MAX, Status::OVERFLOW));
        assert_eq!(unary::<u64, i64>(&reg, "NEG", u64::MAX), (0, Status::UNDERFLOW));
        assert_eq!(unary::<f64, f64>(&reg, "NEG", 1.5), (-1.5, Status::NO_ERROR));
    }

    #[test]
    fn overload_exactness_over_the_catalogue() {
        let reg = FunctionRegistry::standard().expect("registry");
        let resolves = |name: &str, inputs: &[T]| {
            let mut types = TypeStack::new();
            for &td in inputs.iter().rev() {
                types.push(td).expect("push");
            }
            let mut slots = 0;
            reg.resolve(name, &mut types, false, &mut slots).is_ok()
        };
        for record in reg.records().iter().filter(|r| !r.has_operand()) {
            let inputs = record.inputs();
            assert!(resolves(record.name(), inputs), "{} {inputs:?}", record.name());
            for slot in 0..inputs.len() {
                for other in T::NUMERIC.into_iter().filter(|&t| t != inputs[slot]) {
                    let mut changed = inputs.to_vec();
                    changed[slot] = other;
                    let registered = reg
                        .records()
                        .iter()
                        .any(|r| r.name() == record.name() && r.inputs() == changed.as_slice());
                    assert_eq!(
                        resolves(record.name(), &changed),
                        registered,
                        "{} {changed:?}",
                        record.name()
                    );
                }
            }
        }
    }
}
