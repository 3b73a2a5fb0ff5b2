// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed scalar values.
//!
//! [`Value`] is the dynamically typed transport used when the static type is only known as a
//! [`TypeDescriptor`]: literal parsing, debug rendering, conversion and the typed variable
//! accessors. The interpreter itself never builds `Value`s on the hot path.

use core::fmt;

use crate::convert::{Number, Repr};
use crate::status::Status;
use crate::types::TypeDescriptor;

/// Expand `$body` once with `$t` aliased to the Rust type behind `$td`, or evaluate `$invalid`.
macro_rules! with_scalar {
    ($td:expr, $t:ident => $body:expr, $invalid:expr) => {
        match $td {
            $crate::types::TypeDescriptor::Int8 => {
                type $t = i8;
                $body
            }
            $crate::types::TypeDescriptor::Int16 => {
                type $t = i16;
                $body
            }
            $crate::types::TypeDescriptor::Int32 => {
                type $t = i32;
                $body
            }
            $crate::types::TypeDescriptor::Int64 => {
                type $t = i64;
                $body
            }
            $crate::types::TypeDescriptor::UInt8 => {
                type $t = u8;
                $body
            }
            $crate::types::TypeDescriptor::UInt16 => {
                type $t = u16;
                $body
            }
            $crate::types::TypeDescriptor::UInt32 => {
                type $t = u32;
                $body
            }
            $crate::types::TypeDescriptor::UInt64 => {
                type $t = u64;
                $body
            }
            $crate::types::TypeDescriptor::Float32 => {
                type $t = f32;
                $body
            }
            $crate::types::TypeDescriptor::Float64 => {
                type $t = f64;
                $body
            }
            $crate::types::TypeDescriptor::Invalid => $invalid,
        }
    };
}
pub(crate) use with_scalar;

/// A scalar value tagged with its type.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    /// `int8`.
    I8(i8),
    /// `int16`.
    I16(i16),
    /// `int32`.
    I32(i32),
    /// `int64`.
    I64(i64),
    /// `uint8`.
    U8(u8),
    /// `uint16`.
    U16(u16),
    /// `uint32`.
    U32(u32),
    /// `uint64`.
    U64(u64),
    /// `float32`.
    F32(f32),
    /// `float64`.
    F64(f64),
}

macro_rules! impl_from {
    ($($t:ty => $v:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(v: $t) -> Self {
                    Self::$v(v)
                }
            }
        )*
    };
}

impl_from! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

macro_rules! each_variant {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            Value::I8($v) => $body,
            Value::I16($v) => $body,
            Value::I32($v) => $body,
            Value::I64($v) => $body,
            Value::U8($v) => $body,
            Value::U16($v) => $body,
            Value::U32($v) => $body,
            Value::U64($v) => $body,
            Value::F32($v) => $body,
            Value::F64($v) => $body,
        }
    };
}

impl Value {
    /// The value's type.
    #[must_use]
    pub fn type_descriptor(&self) -> TypeDescriptor {
        match self {
            Self::I8(_) => TypeDescriptor::Int8,
            Self::I16(_) => TypeDescriptor::Int16,
            Self::I32(_) => TypeDescriptor::Int32,
            Self::I64(_) => TypeDescriptor::Int64,
            Self::U8(_) => TypeDescriptor::UInt8,
            Self::U16(_) => TypeDescriptor::UInt16,
            Self::U32(_) => TypeDescriptor::UInt32,
            Self::U64(_) => TypeDescriptor::UInt64,
            Self::F32(_) => TypeDescriptor::Float32,
            Self::F64(_) => TypeDescriptor::Float64,
        }
    }

    /// Widened form used by conversions.
    #[must_use]
    pub fn repr(&self) -> Repr {
        each_variant!(*self, v => v.to_repr())
    }

    /// Decode a value of type `td` from little-endian `bytes`.
    ///
    /// Returns `None` for `Invalid` or when `bytes` is too short.
    #[must_use]
    pub fn from_bytes(td: TypeDescriptor, bytes: &[u8]) -> Option<Self> {
        if bytes.len() < td.byte_size() {
            return None;
        }
        with_scalar!(td, T => Some(Self::from(<T as crate::types::Scalar>::read_le(bytes))), None)
    }

    /// Encode into the first `byte_size` bytes of `out`. Does nothing if `out` is too short.
    pub fn write_bytes(&self, out: &mut [u8]) {
        if out.len() < self.type_descriptor().byte_size() {
            return;
        }
        each_variant!(*self, v => crate::types::Scalar::write_le(v, out));
    }

    /// Round-to-nearest saturating conversion into `dest`.
    ///
    /// Converting into `Invalid` leaves the value unchanged and reports `UNSUPPORTED_FEATURE`.
    #[must_use]
    pub fn convert_to(&self, dest: TypeDescriptor) -> (Self, Status) {
        let repr = self.repr();
        with_scalar!(
            dest,
            T => {
                let (v, status) = T::round_from(repr);
                (Self::from(v), status)
            },
            (*self, Status::UNSUPPORTED_FEATURE)
        )
    }

    /// Extract as `T` if the value has exactly that type.
    #[must_use]
    pub fn get<T: Number>(&self) -> Option<T> {
        let (v, status) = T::round_from(self.repr());
        (self.type_descriptor() == T::TYPE && status.is_ok()).then_some(v)
    }

    /// Parse a literal as type `td`.
    ///
    /// Integers accept plain decimal text; anything else is read as a float and rounded.
    /// Text that is not a number fails with `ILLEGAL_OPERATION`; a number that does not fit
    /// fails with the conversion flag.
    pub fn parse(td: TypeDescriptor, text: &str) -> Result<Self, Status> {
        if !td.is_numeric() {
            return Err(Status::UNSUPPORTED_FEATURE);
        }
        let text = text.trim();
        let repr = if td.is_float() {
            Repr::Float(text.parse::<f64>().map_err(|_| Status::ILLEGAL_OPERATION)?)
        } else if let Ok(i) = text.parse::<i128>() {
            Repr::Int(i)
        } else {
            Repr::Float(text.parse::<f64>().map_err(|_| Status::ILLEGAL_OPERATION)?)
        };
        let (value, status) = with_scalar!(
            td,
            T => {
                let (v, status) = T::round_from(repr);
                (Self::from(v), status)
            },
            return Err(Status::UNSUPPORTED_FEATURE)
        );
        if status.is_ok() { Ok(value) } else { Err(status) }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32(v) => write!(f, "{v:?}"),
            Self::F64(v) => write!(f, "{v:?}"),
            other => each_variant!(*other, v => write!(f, "{v}")),
        }
    }
}
