/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::BitRead;
use crate::error::CodecError;

/// An implementation of [`BitRead`] on a slice of bytes, with the same bit
/// order as [`BitWriter`](super::BitWriter).
///
/// Bytes are pulled lazily: a new byte is read only when all the bits of the
/// current one have been consumed.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// The stream which we will read bytes from
    data: &'a [u8],
    /// The index of the next byte to pull
    pos: usize,
    /// The current byte, shifted so that the next bit is the lowest one
    buffer: u8,
    /// The number of bits of `buffer` still to be read
    bits_in_buffer: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
        }
    }

    /// Return the number of bits consumed so far.
    #[inline(always)]
    pub fn bits_read(&self) -> usize {
        self.pos * 8 - self.bits_in_buffer as usize
    }
}

impl BitRead for BitReader<'_> {
    #[inline]
    fn bit(&mut self) -> Result<bool, CodecError> {
        if self.bits_in_buffer == 0 {
            self.buffer = *self
                .data
                .get(self.pos)
                .ok_or(CodecError::EndOfStream { pos: self.pos })?;
            self.pos += 1;
            self.bits_in_buffer = 8;
        }
        let bit = self.buffer & 1 != 0;
        self.buffer >>= 1;
        self.bits_in_buffer -= 1;
        Ok(bit)
    }
}
