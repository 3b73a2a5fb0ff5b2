// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Comparison operators yielding `uint8`.
//!
//! Same-typed operands compare directly. Mixed pairs convert both sides into the wider test
//! type first; if either side does not fit, the result is `0` and `OUT_OF_RANGE` is raised.

use crate::context::{Context, NativeFn};
use crate::convert::{Number, saturate};
use crate::registry::{FunctionRecord, FunctionRegistry, RegistryError};
use crate::status::Status;
use crate::types::TypeDescriptor;

use super::each_numeric;

macro_rules! comparisons {
    ($($same:ident, $mixed:ident => $op:tt),* $(,)?) => {$(
        fn $same<T: Number>(ctx: &mut Context) {
            let x1 = ctx.pop::<T>();
            let x2 = ctx.pop::<T>();
            ctx.push(u8::from(x2 $op x1));
        }

        fn $mixed<A: Number, B: Number, C: Number>(ctx: &mut Context) {
            let x1 = ctx.pop::<A>();
            let x2 = ctx.pop::<B>();
            let (z1, ok1) = saturate::<A, C>(x1);
            let (z2, ok2) = saturate::<B, C>(x2);
            if ok1 && ok2 {
                ctx.push(u8::from(z2 $op z1));
            } else {
                ctx.raise(Status::OUT_OF_RANGE);
                ctx.push(0_u8);
            }
        }
    )*};
}

comparisons! {
    equal, equal_mixed => ==,
    different, different_mixed => !=,
    greater, greater_mixed => >,
    less, less_mixed => <,
    greater_or_same, greater_or_same_mixed => >=,
    less_or_same, less_or_same_mixed => <=,
}

const BOOL: TypeDescriptor = TypeDescriptor::UInt8;

/// Same-typed overloads of one comparison for every numeric type.
macro_rules! register_same {
    ($reg:expr, $name:literal, $f:ident) => {{
        fn one<T: Number>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
            reg.register(FunctionRecord::new($name, &[T::TYPE, T::TYPE], &[BOOL], $f::<T>))?;
            Ok(())
        }
        each_numeric!($reg, one);
    }};
}

/// Register `(A, C)` and `(C, A)` compared in `C`.
fn pair<A: Number, C: Number>(
    reg: &mut FunctionRegistry,
    name: &'static str,
    ac: NativeFn,
    ca: NativeFn,
) -> Result<(), RegistryError> {
    reg.register(FunctionRecord::new(name, &[A::TYPE, C::TYPE], &[BOOL], ac))?;
    reg.register(FunctionRecord::new(name, &[C::TYPE, A::TYPE], &[BOOL], ca))?;
    Ok(())
}

macro_rules! register_mixed {
    ($reg:expr, $name:literal, $f:ident; $(($a:ty, $c:ty)),* $(,)?) => {
        $(pair::<$a, $c>($reg, $name, $f::<$a, $c, $c>, $f::<$c, $a, $c>)?;)*
    };
    ($reg:expr, $name:literal, $f:ident) => {
        register_mixed!($reg, $name, $f;
            (i8, i32), (i16, i32), (u8, i32), (u16, i32), (u32, i32),
            (i8, i64), (i16, i64), (i32, i64), (u8, i64), (u16, i64), (u32, i64), (u64, i64),
            (u8, u32), (u16, u32),
            (i8, u64), (i16, u64), (i32, u64), (u8, u64), (u16, u64), (u32, u64),
        )
    };
}

pub(super) fn register(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    register_same!(reg, "EQ", equal);
    register_same!(reg, "NEQ", different);
    register_same!(reg, "GT", greater);
    register_same!(reg, "LT", less);
    register_same!(reg, "GTE", greater_or_same);
    register_same!(reg, "LTE", less_or_same);

    register_mixed!(reg, "GT", greater_mixed);
    register_mixed!(reg, "LT", less_mixed);
    register_mixed!(reg, "GTE", greater_or_same_mixed);
    register_mixed!(reg, "LTE", less_or_same_mixed);
    register_mixed!(reg, "EQ", equal_mixed);
    register_mixed!(reg, "NEQ", different_mixed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::binary;
    use crate::registry::FunctionRegistry;
    use crate::status::Status;

    #[test]
    fn same_type_comparisons() {
        let reg = FunctionRegistry::standard().expect("registry");
        assert_eq!(binary::<f64, f64, u8>(&reg, "EQ", 15.3, 15.3).0, 1);
        assert_eq!(binary::<f64, f64, u8>(&reg, "EQ", 15.4, 15.3).0, 0);
        assert_eq!(binary::<i8, i8, u8>(&reg, "GT", 3, -2).0, 1);
        assert_eq!(binary::<u16, u16, u8>(&reg, "LTE", 4, 4).0, 1);
        assert_eq!(binary::<f32, f32, u8>(&reg, "NEQ", 1.0, 2.0).0, 1);
    }

    #[test]
    fn mixed_comparisons_convert_into_wider_type() {
        let reg = FunctionRegistry::standard().expect("registry");
        // x2 (below) = -1 as int32, x1 (top) = 200 as uint8.
        assert_eq!(binary::<u8, i32, u8>(&reg, "LT", -1, 200), (1, Status::NO_ERROR));
        assert_eq!(binary::<i32, u8, u8>(&reg, "GT", 200, -1), (1, Status::NO_ERROR));
    }

    #[test]
    fn mixed_comparison_out_of_range() {
        let reg = FunctionRegistry::standard().expect("registry");
        let (v, status) = binary::<i8, u64, u8>(&reg, "EQ", 5, -1);
        assert_eq!(v, 0);
        assert_eq!(status, Status::OUT_OF_RANGE);
        let (v, status) = binary::<u64, i64, u8>(&reg, "GTE", -1, u64::MAX);
        assert_eq!((v, status), (0, Status::OUT_OF_RANGE));
    }

    #[test]
    fn unregistered_mix_is_absent() {
        let reg = FunctionRegistry::standard().expect("registry");
        use crate::types::TypeDescriptor as T;
        assert!(reg.find("EQ", &[T::Float32, T::Float64], &[T::UInt8]).is_none(), "no float mix");
        assert!(reg.find("EQ", &[T::Int8, T::Int16], &[T::UInt8]).is_none(), "not in the table");
    }
}
