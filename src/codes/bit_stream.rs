/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::error::CodecError;

/// Objects that can write single bits, and therefore unary codes and
/// fixed-width binary fields, to a stream of bits.
///
/// Only [`bit`](BitWrite::bit) has to be implemented: the other methods are
/// expressed in terms of it.
pub trait BitWrite {
    /// Append one bit to the stream.
    fn bit(&mut self, bit: bool);

    /// Append `n` copies of `bit`.
    #[inline]
    fn repeat(&mut self, n: u64, bit: bool) {
        for _ in 0..n {
            self.bit(bit);
        }
    }

    /// Write `value` as a unary code: `value` one bits followed by a zero.
    #[inline]
    fn unary(&mut self, value: u64) {
        self.repeat(value, true);
        self.bit(false);
    }

    /// Write the lowest `n_bits` of `value`, most significant bit first.
    ///
    /// # Errors
    /// Fails if `n_bits` is larger than 64 or if `value` does not fit in
    /// `n_bits` bits.
    fn binary(&mut self, value: u64, n_bits: u8) -> Result<(), CodecError> {
        if n_bits > 64 {
            return Err(CodecError::Range(format!(
                "the number of bits to write has to be in [0, 64] and {} is not",
                n_bits
            )));
        }
        if n_bits < 64 && value >> n_bits != 0 {
            return Err(CodecError::Range(format!(
                "{} does not fit in {} bits",
                value, n_bits
            )));
        }
        for shift in (0..n_bits).rev() {
            self.bit((value >> shift) & 1 != 0);
        }
        Ok(())
    }

    /// Return how many bits have been written so far.
    fn bits_written(&self) -> usize;
}

/// Objects that can read single bits, and therefore unary codes and
/// fixed-width binary fields, from a stream of bits.
pub trait BitRead {
    /// Read one bit from the stream.
    ///
    /// # Errors
    /// Fails if the stream has no more bits.
    fn bit(&mut self) -> Result<bool, CodecError>;

    /// Read a unary code, that is, count one bits up to (and consuming)
    /// the first zero bit.
    #[inline]
    fn unary(&mut self) -> Result<u64, CodecError> {
        let mut count = 0;
        while self.bit()? {
            count += 1;
        }
        Ok(count)
    }

    /// Read `n_bits` bits, most significant bit first.
    fn binary(&mut self, n_bits: u8) -> Result<u64, CodecError> {
        if n_bits > 64 {
            return Err(CodecError::Range(format!(
                "the number of bits to read has to be in [0, 64] and {} is not",
                n_bits
            )));
        }
        let mut value = 0_u64;
        for _ in 0..n_bits {
            value = (value << 1) | self.bit()? as u64;
        }
        Ok(value)
    }
}
