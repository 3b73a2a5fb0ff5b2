// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Numeric conversion and flag-reporting arithmetic.
//!
//! Two conversion disciplines exist:
//! - [`Number::saturate_from`] truncates toward zero and clamps to the destination range. It is
//!   what `CAST`, converting `WRITE`s and mixed-width operators use at run time.
//! - [`Number::round_from`] rounds to nearest and reports `OVERFLOW`/`UNDERFLOW` when it clamps.
//!   It backs [`convert`] and literal parsing.
//!
//! Arithmetic helpers return the wrapped result together with the flag that describes what went
//! wrong, so callers can keep running and accumulate status.

use crate::status::Status;
use crate::types::{Scalar, TypeDescriptor};
use crate::value::Value;

/// Widest intermediate form of a scalar: every integer fits in `i128`, every float in `f64`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Repr {
    /// Integer source.
    Int(i128),
    /// Floating-point source.
    Float(f64),
}

impl Repr {
    /// Integral part of a float source as `i128`; `None` for NaN or beyond the `i128` range.
    fn trunc_to_int(v: f64) -> Option<i128> {
        const LIMIT: f64 = 1.701_411_834_604_692_3e38; // 2^127
        let t = libm::trunc(v);
        if t.is_nan() || t >= LIMIT || t < -LIMIT {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, reason = "range checked above")]
        Some(t as i128)
    }
}

/// Scalar with conversion and arithmetic semantics used by the operator catalogue.
pub trait Number: Scalar + Into<Value> {
    /// Widen into a [`Repr`].
    fn to_repr(self) -> Repr;

    /// Language-level `as` cast (wrapping for integers, saturating for float to int).
    fn cast_from(r: Repr) -> Self;

    /// Truncating, saturating conversion. The flag is `false` when the value was clamped.
    fn saturate_from(r: Repr) -> (Self, bool);

    /// Round-to-nearest, saturating conversion reporting `OVERFLOW`/`UNDERFLOW`.
    fn round_from(r: Repr) -> (Self, Status);

    /// Wrapping add with the flag for the lost carry.
    fn add_flagged(self, rhs: Self) -> (Self, Status);
    /// Wrapping subtract with the flag for the lost borrow.
    fn sub_flagged(self, rhs: Self) -> (Self, Status);
    /// Wrapping multiply with the flag for the lost magnitude.
    fn mul_flagged(self, rhs: Self) -> (Self, Status);
    /// Division; integer division by zero yields `0` and `OVERFLOW`.
    fn div_flagged(self, rhs: Self) -> (Self, Status);
    /// Negation; a signed minimum saturates to the maximum and reports `OVERFLOW`.
    fn neg_flagged(self) -> (Self, Status);

    /// Returns `true` for zero.
    fn is_zero(self) -> bool;

    /// Lossy view as `f64`, used by the float math library.
    fn to_f64(self) -> f64;
}

/// Convert `src` into `D` with `saturate_from`, i.e. the run-time `CAST` rule.
#[inline]
pub fn saturate<S: Number, D: Number>(src: S) -> (D, bool) {
    D::saturate_from(src.to_repr())
}

/// Convert `src` into `D` with an `as`-style cast.
#[inline]
pub fn cast<S: Number, D: Number>(src: S) -> D {
    D::cast_from(src.to_repr())
}

macro_rules! impl_int {
    ($($t:ty),* $(,)?) => {
        $(
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_precision_loss,
                clippy::cast_sign_loss,
                clippy::cast_possible_wrap,
                reason = "casts are range checked or intentionally wrapping"
            )]
            impl Number for $t {
                #[inline]
                fn to_repr(self) -> Repr {
                    Repr::Int(i128::from(self))
                }

                #[inline]
                fn cast_from(r: Repr) -> Self {
                    match r {
                        Repr::Int(v) => v as Self,
                        Repr::Float(v) => v as Self,
                    }
                }

                fn saturate_from(r: Repr) -> (Self, bool) {
                    let v = match r {
                        Repr::Int(v) => v,
                        Repr::Float(v) => match Repr::trunc_to_int(v) {
                            Some(v) => v,
                            None if v.is_nan() => return (0, false),
                            None if v > 0.0 => return (Self::MAX, false),
                            None => return (Self::MIN, false),
                        },
                    };
                    if v > i128::from(Self::MAX) {
                        (Self::MAX, false)
                    } else if v < i128::from(Self::MIN) {
                        (Self::MIN, false)
                    } else {
                        (v as Self, true)
                    }
                }

                fn round_from(r: Repr) -> (Self, Status) {
                    let r = match r {
                        Repr::Float(v) if v.is_nan() => return (0, Status::OUT_OF_RANGE),
                        Repr::Float(v) => Repr::Float(libm::round(v)),
                        int => int,
                    };
                    match Self::saturate_from(r) {
                        (v, true) => (v, Status::NO_ERROR),
                        (v, false) if v == Self::MAX => (v, Status::OVERFLOW),
                        (v, false) => (v, Status::UNDERFLOW),
                    }
                }

                fn add_flagged(self, rhs: Self) -> (Self, Status) {
                    match self.overflowing_add(rhs) {
                        (v, false) => (v, Status::NO_ERROR),
                        (v, true) if i128::from(rhs) < 0 => (v, Status::UNDERFLOW),
                        (v, true) => (v, Status::OVERFLOW),
                    }
                }

                fn sub_flagged(self, rhs: Self) -> (Self, Status) {
                    match self.overflowing_sub(rhs) {
                        (v, false) => (v, Status::NO_ERROR),
                        (v, true) if i128::from(rhs) > 0 => (v, Status::UNDERFLOW),
                        (v, true) => (v, Status::OVERFLOW),
                    }
                }

                fn mul_flagged(self, rhs: Self) -> (Self, Status) {
                    match self.overflowing_mul(rhs) {
                        (v, false) => (v, Status::NO_ERROR),
                        (v, true) if (i128::from(self) < 0) != (i128::from(rhs) < 0) => {
                            (v, Status::UNDERFLOW)
                        }
                        (v, true) => (v, Status::OVERFLOW),
                    }
                }

                fn div_flagged(self, rhs: Self) -> (Self, Status) {
                    if rhs == 0 {
                        return (0, Status::OVERFLOW);
                    }
                    match self.overflowing_div(rhs) {
                        (v, false) => (v, Status::NO_ERROR),
                        (v, true) => (v, Status::OVERFLOW),
                    }
                }

                fn neg_flagged(self) -> (Self, Status) {
                    match self.checked_neg() {
                        Some(v) => (v, Status::NO_ERROR),
                        None if i128::from(self) < 0 => (Self::MAX, Status::OVERFLOW),
                        None => (0, Status::UNDERFLOW),
                    }
                }

                #[inline]
                fn is_zero(self) -> bool {
                    self == 0
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_float {
    ($($t:ty),* $(,)?) => {
        $(
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_precision_loss,
                trivial_numeric_casts,
                reason = "float narrowing is range checked"
            )]
            impl Number for $t {
                #[inline]
                fn to_repr(self) -> Repr {
                    Repr::Float(f64::from(self))
                }

                #[inline]
                fn cast_from(r: Repr) -> Self {
                    match r {
                        Repr::Int(v) => v as Self,
                        Repr::Float(v) => v as Self,
                    }
                }

                fn saturate_from(r: Repr) -> (Self, bool) {
                    match r {
                        Repr::Int(v) => (v as Self, true),
                        Repr::Float(v) if v.is_finite() && v > f64::from(Self::MAX) => {
                            (Self::MAX, false)
                        }
                        Repr::Float(v) if v.is_finite() && v < f64::from(Self::MIN) => {
                            (Self::MIN, false)
                        }
                        Repr::Float(v) => (v as Self, true),
                    }
                }

                fn round_from(r: Repr) -> (Self, Status) {
                    match Self::saturate_from(r) {
                        (v, true) => (v, Status::NO_ERROR),
                        (v, false) if v > 0.0 => (v, Status::OVERFLOW),
                        (v, false) => (v, Status::UNDERFLOW),
                    }
                }

                #[inline]
                fn add_flagged(self, rhs: Self) -> (Self, Status) {
                    (self + rhs, Status::NO_ERROR)
                }

                #[inline]
                fn sub_flagged(self, rhs: Self) -> (Self, Status) {
                    (self - rhs, Status::NO_ERROR)
                }

                #[inline]
                fn mul_flagged(self, rhs: Self) -> (Self, Status) {
                    (self * rhs, Status::NO_ERROR)
                }

                #[inline]
                fn div_flagged(self, rhs: Self) -> (Self, Status) {
                    (self / rhs, Status::NO_ERROR)
                }

                #[inline]
                fn neg_flagged(self) -> (Self, Status) {
                    (-self, Status::NO_ERROR)
                }

                #[inline]
                fn is_zero(self) -> bool {
                    self == 0.0
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    f64::from(self)
                }
            }
        )*
    };
}

impl_float!(f32, f64);

/// Convert the value encoded in `src_bytes` as `src` into `dest`, writing `dst_bytes`.
///
/// Same-type conversions are a byte copy. Everything else goes through round-to-nearest with
/// saturation; the returned status carries `OVERFLOW`/`UNDERFLOW` when the value was clamped,
/// `OUT_OF_RANGE` for NaN into an integer, and `UNSUPPORTED_FEATURE` for non-numeric types or
/// undersized buffers.
pub fn convert(
    dest: TypeDescriptor,
    dst_bytes: &mut [u8],
    src: TypeDescriptor,
    src_bytes: &[u8],
) -> Status {
    if !dest.is_numeric()
        || !src.is_numeric()
        || dst_bytes.len() < dest.byte_size()
        || src_bytes.len() < src.byte_size()
    {
        return Status::UNSUPPORTED_FEATURE;
    }
    if dest == src {
        let n = dest.byte_size();
        dst_bytes[..n].copy_from_slice(&src_bytes[..n]);
        return Status::NO_ERROR;
    }
    let Some(value) = Value::from_bytes(src, src_bytes) else {
        return Status::UNSUPPORTED_FEATURE;
    };
    let (out, status) = value.convert_to(dest);
    out.write_bytes(dst_bytes);
    status
}
