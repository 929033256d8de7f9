/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! # Magic codes
//!
//! A Magic code family is a short, strictly ascending list of bit widths
//! `w₀ < w₁ < … < wₖ`. Bucket `i` holds `2^wᵢ` consecutive values starting
//! at the sum of the capacities of the previous buckets. A value `x` is
//! written as the index of its bucket in unary (ones terminated by a zero,
//! except for the last bucket, whose index is self-limiting) followed by the
//! offset of `x` within the bucket in binary on `wᵢ` bits.
//!
//! For example, with widths `[2, 3]` the values in `[0..4)` are written as a
//! zero bit followed by two bits, and the values in `[4..12)` as a one bit
//! followed by three bits. The value 12 cannot be represented.
//!
//! A blob written by [`Magic::bytes_from_symbols`] starts with a preamble
//! describing the family itself (the differences between consecutive widths
//! in unary, terminated by a zero difference), so that
//! [`Magic::reader_from_bytes`] needs no external configuration.

use super::{BitRead, BitReader, BitWrite, BitWriter};
use crate::error::{require_ascending, CodecError};
use crate::symbols::SymbolSource;
use itertools::Itertools;

/// One bucket of a [`Magic`] code family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// The number of bits of the binary part
    pub width: u8,
    /// `2^width`
    pub capacity: u64,
    /// The first value represented by this bucket
    pub offset: u64,
}

/// A variable-length code family for unsigned integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magic {
    buckets: Vec<Bucket>,
}

impl Magic {
    /// The largest width a bucket can have.
    pub const MAX_WIDTH: u8 = 32;

    /// The tuned widths used for the normalization blob.
    pub const NF_WIDTHS: [u8; 7] = [2, 6, 8, 11, 14, 15, 18];

    /// The tuned widths used for the specification blob.
    pub const SPEC_WIDTHS: [u8; 8] = [1, 3, 7, 13, 16, 17, 18, 19];

    /// Build a code family from a strictly ascending list of widths.
    ///
    /// # Errors
    /// [`CodecError::Order`] if the widths are not strictly ascending,
    /// [`CodecError::Range`] if the list is empty or a width is not in
    /// `[1..=MAX_WIDTH]`.
    pub fn new(widths: &[u8]) -> Result<Self, CodecError> {
        require_ascending(widths)?;
        if widths.is_empty() {
            return Err(CodecError::Range(
                "a code family needs at least one width".to_string(),
            ));
        }
        if let Some(&width) = widths
            .iter()
            .find(|&&width| width == 0 || width > Self::MAX_WIDTH)
        {
            return Err(CodecError::Range(format!(
                "widths have to be in [1, {}] and {} is not",
                Self::MAX_WIDTH,
                width
            )));
        }
        let mut sum = 0;
        let buckets = widths
            .iter()
            .map(|&width| {
                let capacity = 1_u64 << width;
                let offset = sum;
                sum += capacity;
                Bucket {
                    width,
                    capacity,
                    offset,
                }
            })
            .collect();
        Ok(Self { buckets })
    }

    /// The family used for the normalization blob.
    pub fn nf() -> Self {
        Self::from_const(&Self::NF_WIDTHS)
    }

    /// The family used for the specification blob.
    pub fn spec() -> Self {
        Self::from_const(&Self::SPEC_WIDTHS)
    }

    fn from_const(widths: &[u8]) -> Self {
        match Self::new(widths) {
            Ok(magic) => magic,
            Err(err) => unreachable!("invalid built-in widths {:?}: {}", widths, err),
        }
    }

    #[inline(always)]
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn widths(&self) -> Vec<u8> {
        self.buckets.iter().map(|bucket| bucket.width).collect()
    }

    /// Return the number of representable values, that is, the sum of the
    /// capacities of the buckets.
    pub fn capacity(&self) -> u64 {
        let last = self.last();
        last.offset + last.capacity
    }

    #[inline(always)]
    fn last(&self) -> &Bucket {
        // the constructor rejects empty families
        &self.buckets[self.buckets.len() - 1]
    }

    /// Return the index of the bucket containing `value`.
    #[inline]
    fn bucket_of(&self, value: u64) -> Result<usize, CodecError> {
        let mut rest = value;
        for (i, bucket) in self.buckets.iter().enumerate() {
            if rest < bucket.capacity {
                return Ok(i);
            }
            rest -= bucket.capacity;
        }
        Err(CodecError::Capacity {
            value,
            capacity: self.capacity(),
        })
    }

    /// Write `value` to `writer`.
    ///
    /// # Errors
    /// [`CodecError::Capacity`] if `value` is not smaller than
    /// [`capacity`](Magic::capacity). Nothing is written in that case.
    pub fn write(&self, writer: &mut impl BitWrite, value: u64) -> Result<(), CodecError> {
        let i = self.bucket_of(value)?;
        let bucket = &self.buckets[i];
        writer.repeat(i as u64, true);
        if i + 1 < self.buckets.len() {
            writer.bit(false);
        }
        writer.binary(value - bucket.offset, bucket.width)
    }

    /// Read a value from `reader`.
    pub fn read(&self, reader: &mut impl BitRead) -> Result<u64, CodecError> {
        let mut i = 0;
        while i + 1 < self.buckets.len() && reader.bit()? {
            i += 1;
        }
        let bucket = &self.buckets[i];
        Ok(bucket.offset + reader.binary(bucket.width)?)
    }

    /// Return how many bits [`write`](Magic::write) would use for `value`.
    #[inline]
    pub fn code_len(&self, value: u64) -> Result<usize, CodecError> {
        let i = self.bucket_of(value)?;
        let terminator = (i + 1 < self.buckets.len()) as usize;
        Ok(i + terminator + self.buckets[i].width as usize)
    }

    /// Write the preamble describing this family.
    pub fn write_preamble(&self, writer: &mut impl BitWrite) {
        let mut prev = 0;
        for bucket in &self.buckets {
            writer.unary((bucket.width - prev) as u64);
            prev = bucket.width;
        }
        writer.unary(0);
    }

    /// Return the length in bits of the preamble describing this family.
    pub fn preamble_len(&self) -> usize {
        // each unary delta takes delta + 1 bits, and the deltas sum to the
        // last width; the final zero delta takes one bit
        self.last().width as usize + self.buckets.len() + 1
    }

    /// Read a preamble and build the family it describes.
    pub fn read_preamble(reader: &mut impl BitRead) -> Result<Self, CodecError> {
        let mut widths = vec![];
        let mut width = 0_u64;
        loop {
            let delta = reader.unary()?;
            if delta == 0 {
                break;
            }
            width += delta;
            if width > Self::MAX_WIDTH as u64 {
                return Err(CodecError::Range(format!(
                    "preamble width {} is larger than {}",
                    width,
                    Self::MAX_WIDTH
                )));
            }
            widths.push(width as u8);
        }
        Self::new(&widths)
    }

    /// Encode the preamble followed by `symbols`, returning the resulting
    /// bytes. The last byte is padded with zeros.
    pub fn bytes_from_symbols(&self, symbols: &[u64]) -> Result<Vec<u8>, CodecError> {
        let mut writer = BitWriter::new();
        self.write_preamble(&mut writer);
        for &symbol in symbols {
            self.write(&mut writer, symbol)?;
        }
        Ok(writer.into_bytes())
    }

    /// Return the number of bytes [`bytes_from_symbols`](Magic::bytes_from_symbols)
    /// would produce, without producing them.
    pub fn encoded_len(&self, symbols: &[u64]) -> Result<usize, CodecError> {
        let mut bits = self.preamble_len();
        for &symbol in symbols {
            bits += self.code_len(symbol)?;
        }
        Ok(bits.div_ceil(8))
    }

    /// Parse the preamble at the start of `bytes` and return a reader
    /// producing the symbols that follow it.
    pub fn reader_from_bytes(bytes: &[u8]) -> Result<MagicReader<'_>, CodecError> {
        let mut reader = BitReader::new(bytes);
        let magic = Self::read_preamble(&mut reader)?;
        Ok(MagicReader { magic, reader })
    }
}

impl core::fmt::Display for Magic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.buckets.iter().map(|b| b.width).join(","))
    }
}

/// A stream of symbols decoded with a [`Magic`] family parsed from the
/// preamble of a blob.
#[derive(Debug, Clone)]
pub struct MagicReader<'a> {
    magic: Magic,
    reader: BitReader<'a>,
}

impl MagicReader<'_> {
    /// Return the family parsed from the preamble.
    pub fn magic(&self) -> &Magic {
        &self.magic
    }

    /// Return the number of bits consumed so far, preamble included.
    pub fn bits_read(&self) -> usize {
        self.reader.bits_read()
    }

    pub fn read(&mut self) -> Result<u64, CodecError> {
        self.magic.read(&mut self.reader)
    }
}

impl SymbolSource for MagicReader<'_> {
    #[inline(always)]
    fn next_symbol(&mut self) -> Result<u64, CodecError> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_layout() {
        let magic = Magic::new(&[2, 3, 5]).unwrap();
        assert_eq!(
            magic.buckets(),
            &[
                Bucket { width: 2, capacity: 4, offset: 0 },
                Bucket { width: 3, capacity: 8, offset: 4 },
                Bucket { width: 5, capacity: 32, offset: 12 },
            ]
        );
        assert_eq!(magic.capacity(), 44);
        assert_eq!(magic.to_string(), "2,3,5");
    }

    #[test]
    fn test_code_len_matches_write() {
        let magic = Magic::spec();
        for value in (0..300_000).step_by(97) {
            let mut writer = BitWriter::new();
            magic.write(&mut writer, value).unwrap();
            assert_eq!(writer.bits_written(), magic.code_len(value).unwrap());
        }
        let mut writer = BitWriter::new();
        magic.write_preamble(&mut writer);
        assert_eq!(writer.bits_written(), magic.preamble_len());
    }

    #[test]
    fn test_preamble_width_overflow() {
        let mut writer = BitWriter::new();
        writer.unary(20);
        writer.unary(20);
        writer.unary(0);
        let bytes = writer.into_bytes();
        assert!(matches!(
            Magic::reader_from_bytes(&bytes),
            Err(CodecError::Range(_))
        ));
    }
}
