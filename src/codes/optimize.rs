/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Brute-force search of the [`Magic`] family that encodes a given stream of
//! symbols in the smallest number of bytes.
//!
//! Every strictly ascending sequence of widths in `[1..=max_width]` is a
//! subset of that interval, so candidates are enumerated as bit masks. The
//! search space grows exponentially with `max_width`: this is an offline
//! tuning tool, and its result should be frozen into constants such as
//! [`Magic::NF_WIDTHS`].

use super::Magic;
use crate::error::CodecError;
use dsi_progress_logger::ConcurrentProgressLog;
use log::info;
use rayon::prelude::*;

/// The outcome of encoding a stream of symbols with a candidate family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trial {
    /// The stream fits, and its encoding (preamble included) takes this many
    /// bytes.
    Feasible(usize),
    /// Some symbol exceeds the capacity of the family.
    Infeasible,
}

/// Encode (without materializing) `symbols` with `magic`.
///
/// Running out of capacity is not an error here: it just makes the
/// candidate infeasible.
///
/// This is the cost of a family by definition: [`optimize`] ranks
/// candidates with a faster model that must return the same value for
/// every family and stream.
pub fn trial(magic: &Magic, symbols: &[u64]) -> Result<Trial, CodecError> {
    match magic.encoded_len(symbols) {
        Ok(len) => Ok(Trial::Feasible(len)),
        Err(err) if err.is_capacity() => Ok(Trial::Infeasible),
        Err(err) => Err(err),
    }
}

/// The symbols of a stream in sorted order, which makes it possible to
/// compute the cost of a family with a binary search per bucket instead of a
/// pass over the whole stream.
#[derive(Debug, Clone)]
struct SymbolStats {
    sorted: Vec<u64>,
}

impl SymbolStats {
    fn new(symbols: &[u64]) -> Self {
        let mut sorted = symbols.to_vec();
        sorted.sort_unstable();
        Self { sorted }
    }

    /// Same as [`trial`], but in time logarithmic in the number of symbols.
    fn trial(&self, magic: &Magic) -> Trial {
        if let Some(&max) = self.sorted.last() {
            if max >= magic.capacity() {
                return Trial::Infeasible;
            }
        }
        let buckets = magic.buckets();
        let mut bits = magic.preamble_len();
        let mut start = 0;
        for (i, bucket) in buckets.iter().enumerate() {
            let end = self
                .sorted
                .partition_point(|&x| x < bucket.offset + bucket.capacity);
            let terminator = (i + 1 < buckets.len()) as usize;
            bits += (end - start) * (i + terminator + bucket.width as usize);
            start = end;
        }
        Trial::Feasible(bits.div_ceil(8))
    }
}

/// Return the widths corresponding to a candidate mask.
fn widths_of(mask: u64, max_width: u8) -> Vec<u8> {
    (1..=max_width)
        .filter(|&width| (mask >> (width - 1)) & 1 != 0)
        .collect()
}

/// Return the number of non-empty subsets of `[1..=n]` with at most `k`
/// elements.
fn num_candidates(n: u8, k: usize) -> usize {
    let mut binomial = 1_usize;
    let mut total = 0;
    for i in 1..=k.min(n as usize) {
        binomial = binomial * (n as usize + 1 - i) / i;
        total += binomial;
    }
    total
}

/// Search the family minimizing the encoded length of `symbols` among all
/// families whose widths are in `[1..=max_width]` and whose number of
/// buckets is at most `max_len` (unbounded if `None`).
///
/// Among families with the same length, the one whose width list comes
/// first lexicographically (i.e., the first in a depth-first enumeration
/// `[1]`, `[1, 2]`, `[1, 2, 3]`, …) is returned, so the result does not
/// depend on the number of threads.
///
/// Returns `None` if no candidate can represent all symbols. Otherwise,
/// returns the best family and the output of its
/// [`bytes_from_symbols`](Magic::bytes_from_symbols).
pub fn optimize(
    symbols: &[u64],
    max_width: u8,
    max_len: Option<usize>,
    pl: &mut impl ConcurrentProgressLog,
) -> Result<Option<(Magic, Vec<u8>)>, CodecError> {
    if max_width == 0 || max_width > Magic::MAX_WIDTH {
        return Err(CodecError::Range(format!(
            "the maximum width has to be in [1, {}] and {} is not",
            Magic::MAX_WIDTH,
            max_width
        )));
    }
    let max_len = max_len.unwrap_or(max_width as usize);
    let stats = SymbolStats::new(symbols);

    pl.item_name("candidate");
    pl.expected_updates(Some(num_candidates(max_width, max_len)));
    pl.start(format!(
        "Searching families of at most {} widths up to {} bits for {} symbols...",
        max_len,
        max_width,
        symbols.len()
    ));

    let best = (1_u64..1 << max_width)
        .into_par_iter()
        .filter(|mask| mask.count_ones() as usize <= max_len)
        .map_with(pl.clone(), |pl, mask| -> Result<_, CodecError> {
            pl.light_update();
            let widths = widths_of(mask, max_width);
            let magic = Magic::new(&widths)?;
            Ok(match stats.trial(&magic) {
                Trial::Feasible(len) => Some((len, widths)),
                Trial::Infeasible => None,
            })
        })
        .try_reduce(
            || None,
            |a, b| {
                Ok(match (a, b) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, None) => a,
                    (None, b) => b,
                })
            },
        )?;

    pl.done();

    let Some((len, widths)) = best else {
        info!("No family can represent all the symbols");
        return Ok(None);
    };
    let magic = Magic::new(&widths)?;
    debug_assert_eq!(trial(&magic, symbols), Ok(Trial::Feasible(len)));
    let bytes = magic.bytes_from_symbols(symbols)?;
    debug_assert_eq!(bytes.len(), len);
    info!("Best family: {} ({} bytes)", magic, len);
    Ok(Some((magic, bytes)))
}
