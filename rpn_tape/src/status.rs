// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulating error-flag status.
//!
//! Conversions, native operator callbacks and the compiler all report failures by setting bits
//! in a [`Status`]. Bits accumulate: a later error never clears an earlier one.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// Bitflag status value. [`Status::NO_ERROR`] is the empty set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Status(u16);

impl Status {
    /// No flags set.
    pub const NO_ERROR: Self = Self(0);
    /// Malformed command: missing parameter, redeclared output.
    pub const ILLEGAL_OPERATION: Self = Self(1 << 0);
    /// Non-numeric or unknown type name, unknown variable or command.
    pub const UNSUPPORTED_FEATURE: Self = Self(1 << 1);
    /// Resource exhaustion (type stack, memory space, registry capacity).
    pub const FATAL_ERROR: Self = Self(1 << 2);
    /// Code left unexecuted, or an output read before it was written.
    pub const NOT_COMPLETED: Self = Self(1 << 3);
    /// A conversion result did not fit its destination type.
    pub const OUT_OF_RANGE: Self = Self(1 << 4);
    /// Arithmetic result above the representable range (includes integer divide by zero).
    pub const OVERFLOW: Self = Self(1 << 5);
    /// Arithmetic result below the representable range.
    pub const UNDERFLOW: Self = Self(1 << 6);
    /// The stack pointer did not return to its origin after a complete run.
    pub const INTERNAL_SETUP_ERROR: Self = Self(1 << 7);
    /// Bad call parameters (for example debug mode without a sink).
    pub const PARAMETERS_ERROR: Self = Self(1 << 8);

    const NAMES: [(Self, &'static str); 9] = [
        (Self::ILLEGAL_OPERATION, "illegalOperation"),
        (Self::UNSUPPORTED_FEATURE, "unsupportedFeature"),
        (Self::FATAL_ERROR, "fatalError"),
        (Self::NOT_COMPLETED, "notCompleted"),
        (Self::OUT_OF_RANGE, "outOfRange"),
        (Self::OVERFLOW, "overflow"),
        (Self::UNDERFLOW, "underflow"),
        (Self::INTERNAL_SETUP_ERROR, "internalSetupError"),
        (Self::PARAMETERS_ERROR, "parametersError"),
    ];

    /// Returns `true` if no flag is set.
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns `true` if any bit in `other` is set.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for Status {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Status {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return f.write_str("noError");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status({self})")
    }
}
