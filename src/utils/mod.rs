/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Miscellaneous numeric helpers shared by the encoder, the decoder and the
//! table pipeline.

use core::cmp::Ordering;
use itertools::Itertools;

/// Map a signed integer to an unsigned one so that small magnitudes map to
/// small values: 0, -1, 1, -2, 2, … become 0, 1, 2, 3, 4, …
#[inline(always)]
pub fn from_signed(x: i64) -> u64 {
    if x < 0 {
        !(x << 1) as u64
    } else {
        (x << 1) as u64
    }
}

/// Inverse of [`from_signed`].
#[inline(always)]
pub fn to_signed(x: u64) -> i64 {
    if x & 1 != 0 {
        !(x >> 1) as i64
    } else {
        (x >> 1) as i64
    }
}

/// A strictly ascending set split into singletons and maximal runs of
/// consecutive values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Runs {
    /// Elements not adjacent to any other element, ascending
    pub singletons: Vec<u32>,
    /// The first element of each run of length at least two, ascending
    pub starts: Vec<u32>,
    /// The length of each run, in the same order as `starts`
    pub lens: Vec<u32>,
}

/// Split a strictly ascending slice into [`Runs`].
///
/// The slice is not checked: the result is meaningful only if it is
/// strictly ascending.
pub fn collect_runs(v: &[u32]) -> Runs {
    let mut runs = Runs::default();
    // along a run, value minus position is constant
    for (_, run) in &v
        .iter()
        .enumerate()
        .chunk_by(|&(i, &x)| x as i64 - i as i64)
    {
        let run = run.map(|(_, &x)| x).collect::<Vec<_>>();
        if run.len() == 1 {
            runs.singletons.push(run[0]);
        } else {
            runs.starts.push(run[0]);
            runs.lens.push(run.len() as u32);
        }
    }
    runs
}

/// Compare two sequences first by length and then lexicographically.
///
/// This is the order in which emoji sequences and flattened mappings are
/// kept by the table pipeline.
pub fn cmp_len_lex(a: &[u32], b: &[u32]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Return how many zero bytes must be appended to `len` bytes to reach a
/// multiple of `align`.
#[inline(always)]
pub fn padding_len(len: usize, align: usize) -> usize {
    (align - len % align) % align
}

/// Pad `bytes` with zeros to a multiple of `align` bytes.
pub fn pad_to(bytes: &mut Vec<u8>, align: usize) {
    bytes.resize(bytes.len() + padding_len(bytes.len(), align), 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag() {
        let expected = [(0, 0), (-1, 1), (1, 2), (-2, 3), (2, 4), (-1_114_112, 2_228_223)];
        for (signed, unsigned) in expected {
            assert_eq!(from_signed(signed), unsigned);
            assert_eq!(to_signed(unsigned), signed);
        }
    }

    #[test]
    fn test_collect_runs() {
        let runs = collect_runs(&[1, 2, 3, 7, 9, 10, 11]);
        assert_eq!(runs.singletons, vec![7]);
        assert_eq!(runs.starts, vec![1, 9]);
        assert_eq!(runs.lens, vec![3, 3]);
        assert_eq!(collect_runs(&[]), Runs::default());
    }

    #[test]
    fn test_padding() {
        for len in 0..32 {
            let mut bytes = vec![0xaa; len];
            pad_to(&mut bytes, 4);
            assert_eq!(bytes.len() % 4, 0);
            assert!(bytes.len() >= len && bytes.len() < len + 4);
            assert!(bytes[len..].iter().all(|&b| b == 0));
        }
    }
}
