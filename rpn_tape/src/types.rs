// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scalar type model.
//!
//! The evaluator only ever handles the ten fixed-width numeric kinds below. Every value that
//! lives in the data arena or on the operand stack is one of them, and every operation record
//! in the registry is keyed by them.

use core::fmt;

/// Width of one data-arena / operand-stack slot in bytes.
pub const SLOT_BYTES: usize = 4;

/// Number of slots needed to hold `bytes` bytes.
#[inline]
#[must_use]
pub const fn slots_for(bytes: usize) -> usize {
    bytes.div_ceil(SLOT_BYTES)
}

/// Identifies one of the scalar machine types (or `Invalid`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum TypeDescriptor {
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// IEEE-754 single precision.
    Float32,
    /// IEEE-754 double precision.
    Float64,
    /// No type / not yet declared.
    #[default]
    Invalid,
}

impl TypeDescriptor {
    /// All numeric descriptors in catalogue order.
    pub const NUMERIC: [Self; 10] = [
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float32,
        Self::Float64,
    ];

    /// Returns `true` for the ten scalar kinds.
    #[inline]
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Width in bits; `0` for `Invalid`.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Int8 | Self::UInt8 => 8,
            Self::Int16 | Self::UInt16 => 16,
            Self::Int32 | Self::UInt32 | Self::Float32 => 32,
            Self::Int64 | Self::UInt64 | Self::Float64 => 64,
            Self::Invalid => 0,
        }
    }

    /// Width in bytes; `0` for `Invalid`.
    #[inline]
    #[must_use]
    pub const fn byte_size(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Slots occupied in the data arena or on the operand stack.
    #[inline]
    #[must_use]
    pub const fn slots(self) -> usize {
        slots_for(self.byte_size())
    }

    /// Returns `true` for signed integers and floats.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 | Self::Float32 | Self::Float64
        )
    }

    /// Returns `true` for `Float32`/`Float64`.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Lower-case type name as used by the source language (`"int8"`, `"float64"`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Invalid => "void",
        }
    }

    /// Parse a type name. Unknown names yield `Invalid`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::NUMERIC
            .into_iter()
            .find(|td| td.name() == name)
            .unwrap_or(Self::Invalid)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Rust scalar that maps onto one [`TypeDescriptor`] and knows its little-endian encoding.
///
/// Implemented for `i8..i64`, `u8..u64`, `f32` and `f64`; the operator catalogue is written
/// generically over this trait.
pub trait Scalar: Copy + Default + PartialOrd + fmt::Debug + 'static {
    /// Descriptor for this Rust type.
    const TYPE: TypeDescriptor;

    /// Encode into the first `TYPE.byte_size()` bytes of `out`.
    fn write_le(self, out: &mut [u8]);

    /// Decode from the first `TYPE.byte_size()` bytes of `bytes`.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($t:ty => $td:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const TYPE: TypeDescriptor = TypeDescriptor::$td;

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    let bytes = self.to_le_bytes();
                    out[..bytes.len()].copy_from_slice(&bytes);
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0_u8; size_of::<$t>()];
                    buf.copy_from_slice(&bytes[..size_of::<$t>()]);
                    <$t>::from_le_bytes(buf)
                }
            }
        )*
    };
}

impl_scalar! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for td in TypeDescriptor::NUMERIC {
            assert_eq!(TypeDescriptor::from_name(td.name()), td);
            assert!(td.is_numeric(), "{td} should be numeric");
        }
        assert_eq!(TypeDescriptor::from_name("string"), TypeDescriptor::Invalid);
        assert!(!TypeDescriptor::Invalid.is_numeric());
    }

    #[test]
    fn slot_sizes() {
        assert_eq!(TypeDescriptor::UInt8.slots(), 1);
        assert_eq!(TypeDescriptor::Int16.slots(), 1);
        assert_eq!(TypeDescriptor::Float32.slots(), 1);
        assert_eq!(TypeDescriptor::Float64.slots(), 2);
        assert_eq!(TypeDescriptor::UInt64.slots(), 2);
        assert_eq!(TypeDescriptor::Invalid.slots(), 0);
    }

    #[test]
    fn scalar_le_encoding() {
        let mut buf = [0_u8; 8];
        (-2_i16).write_le(&mut buf);
        assert_eq!(i16::read_le(&buf), -2);
        1.5_f64.write_le(&mut buf);
        assert_eq!(f64::read_le(&buf), 1.5);
        assert_eq!(<u32 as Scalar>::TYPE, TypeDescriptor::UInt32);
    }
}
