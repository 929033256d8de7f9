/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::BitWrite;

/// An implementation of [`BitWrite`] on an in-memory vector of bytes.
///
/// Bits are packed from the least significant to the most significant bit of
/// each byte. Pending bits are kept in a one-byte buffer that is pushed to
/// the backend as soon as it is full.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    /// The bytes completed so far
    bytes: Vec<u8>,
    /// The partial byte being filled
    buffer: u8,
    /// The number of valid bits in `buffer`, in [0, 8)
    bits_in_buffer: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pad the partial byte with zero bits so that the stream ends on a byte
    /// boundary. Does nothing if the stream is already aligned.
    pub fn finish(&mut self) {
        while self.bits_in_buffer != 0 {
            self.bit(false);
        }
    }

    /// Finish the stream and return its bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.finish();
        self.bytes
    }
}

impl BitWrite for BitWriter {
    #[inline]
    fn bit(&mut self, bit: bool) {
        if bit {
            self.buffer |= 1 << self.bits_in_buffer;
        }
        self.bits_in_buffer += 1;
        if self.bits_in_buffer == 8 {
            self.bytes.push(self.buffer);
            self.buffer = 0;
            self.bits_in_buffer = 0;
        }
    }

    #[inline(always)]
    fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bits_in_buffer as usize
    }
}
