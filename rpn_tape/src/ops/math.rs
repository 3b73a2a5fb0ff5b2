// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Floating-point library functions.

use crate::context::Context;
use crate::convert::Number;
use crate::registry::{FunctionRecord, FunctionRegistry, RegistryError};

trait Real: Number {
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn log10(self) -> Self;
    fn powf(self, e: Self) -> Self;
}

macro_rules! impl_real {
    ($t:ty: $sin:ident, $cos:ident, $tan:ident, $exp:ident, $ln:ident, $log10:ident, $pow:ident) => {
        impl Real for $t {
            fn sin(self) -> Self { libm::$sin(self) }
            fn cos(self) -> Self { libm::$cos(self) }
            fn tan(self) -> Self { libm::$tan(self) }
            fn exp(self) -> Self { libm::$exp(self) }
            fn ln(self) -> Self { libm::$ln(self) }
            fn log10(self) -> Self { libm::$log10(self) }
            fn powf(self, e: Self) -> Self { libm::$pow(self, e) }
        }
    };
}

impl_real!(f32: sinf, cosf, tanf, expf, logf, log10f, powf);
impl_real!(f64: sin, cos, tan, exp, log, log10, pow);

macro_rules! unary_functions {
    ($($f:ident => $method:ident),* $(,)?) => {$(
        fn $f<T: Real>(ctx: &mut Context) {
            let x = ctx.pop::<T>();
            ctx.push(x.$method());
        }
    )*};
}

unary_functions! {
    sine => sin,
    cosine => cos,
    tangent => tan,
    exponential => exp,
    logarithm => ln,
    logarithm10 => log10,
}

fn power<T: Real>(ctx: &mut Context) {
    let exponent = ctx.pop::<T>();
    let base = ctx.pop::<T>();
    ctx.push(base.powf(exponent));
}

fn register_for<T: Real>(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    let t = T::TYPE;
    for (name, func) in [
        ("SIN", sine::<T> as fn(&mut Context)),
        ("COS", cosine::<T>),
        ("TAN", tangent::<T>),
        ("EXP", exponential::<T>),
        ("LOG", logarithm::<T>),
        ("LOG10", logarithm10::<T>),
    ] {
        reg.register(FunctionRecord::new(name, &[t], &[t], func))?;
    }
    reg.register(FunctionRecord::new("POW", &[t, t], &[t], power::<T>))?;
    Ok(())
}

pub(super) fn register(reg: &mut FunctionRegistry) -> Result<(), RegistryError> {
    register_for::<f32>(reg)?;
    register_for::<f64>(reg)?;
    Ok(())
}
