/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use thiserror::Error;

/// Errors raised by the bit-level codec and by the symbol transforms.
///
/// All variants are fatal for the encode/decode pipeline. The only place
/// where one of them is recovered from is the width optimizer, which treats
/// [`CodecError::Capacity`] as an infeasible candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A sequence that must be strictly ascending is not.
    #[error("not strictly ascending: {prev} is followed by {next} at index {index}")]
    Order { index: usize, prev: u64, next: u64 },

    /// A value is negative, does not fit its destination type or is
    /// otherwise not acceptable where it appears.
    #[error("value out of range: {0}")]
    Range(String),

    /// A value exceeds the total range of a code family.
    #[error("too big: {value} does not fit a code family of capacity {capacity}")]
    Capacity { value: u64, capacity: u64 },

    /// A read went past the end of the underlying buffer.
    #[error("unexpected end of stream at position {pos}")]
    EndOfStream { pos: usize },
}

impl CodecError {
    /// Whether this error only means that a value did not fit a code family.
    #[inline(always)]
    pub fn is_capacity(&self) -> bool {
        matches!(self, CodecError::Capacity { .. })
    }
}

/// Checks that `v` is strictly ascending.
pub fn require_ascending<T: Copy + Ord + Into<u64>>(v: &[T]) -> Result<(), CodecError> {
    for (index, pair) in v.windows(2).enumerate() {
        if pair[1] <= pair[0] {
            return Err(CodecError::Order {
                index: index + 1,
                prev: pair[0].into(),
                next: pair[1].into(),
            });
        }
    }
    Ok(())
}
