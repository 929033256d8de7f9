/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::MAX_SET_LEN;
use crate::error::{require_ascending, CodecError};
use crate::utils::{collect_runs, from_signed};
use std::collections::BTreeMap;

/// Accumulates the symbols of one encoding session.
///
/// Each method appends the representation of one value; the methods that
/// have a precondition check it before appending anything.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    symbols: Vec<u64>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the symbols appended so far.
    #[inline(always)]
    pub fn symbols(&self) -> &[u64] {
        &self.symbols
    }

    /// Consume the encoder, returning its symbols.
    pub fn into_symbols(self) -> Vec<u64> {
        self.symbols
    }

    /// Clear the symbols so that the encoder can be reused.
    pub fn reset(&mut self) {
        self.symbols.clear();
    }

    /// Append a symbol.
    #[inline(always)]
    pub fn symbol(&mut self, x: u64) {
        self.symbols.push(x);
    }

    /// Append a string as its number of code points followed by the code
    /// points as [unsorted deltas](Encoder::unsorted_deltas).
    pub fn str(&mut self, s: &str) {
        let v = s.chars().map(u32::from).collect::<Vec<_>>();
        self.symbol(v.len() as u64);
        self.unsorted_deltas(&v);
    }

    /// Append a strictly ascending sequence as the gaps between consecutive
    /// elements (minus one), starting from a virtual -1.
    ///
    /// The length is not written.
    ///
    /// # Errors
    /// [`CodecError::Order`] if `v` is not strictly ascending.
    pub fn sorted_ascending(&mut self, v: &[u32]) -> Result<(), CodecError> {
        require_ascending(v)?;
        let mut prev = -1_i64;
        for &next in v {
            self.symbol((next as i64 - prev - 1) as u64);
            prev = next as i64;
        }
        Ok(())
    }

    /// Append a sequence as the zig-zag encoded differences between
    /// consecutive elements, starting from a virtual -1.
    ///
    /// The length is not written.
    pub fn unsorted_deltas(&mut self, v: &[u32]) {
        let mut prev = -1_i64;
        for &next in v {
            self.symbol(from_signed(next as i64 - prev));
            prev = next as i64;
        }
    }

    /// Append a strictly ascending set, collapsing runs of consecutive
    /// values.
    ///
    /// The set is written as the number of singletons and the singletons
    /// (sorted ascending), then the number of runs, the first element of
    /// each run (sorted ascending) and the run lengths (unsorted deltas).
    ///
    /// # Errors
    /// [`CodecError::Order`] if `v` is not strictly ascending,
    /// [`CodecError::Range`] if it has more than [`MAX_SET_LEN`] elements.
    pub fn unique(&mut self, v: &[u32]) -> Result<(), CodecError> {
        if v.len() > MAX_SET_LEN {
            return Err(CodecError::Range(format!(
                "set of {} elements exceeds the maximum of {}",
                v.len(),
                MAX_SET_LEN
            )));
        }
        require_ascending(v)?;
        let runs = collect_runs(v);
        self.symbol(runs.singletons.len() as u64);
        self.sorted_ascending(&runs.singletons)?;
        self.symbol(runs.starts.len() as u64);
        self.sorted_ascending(&runs.starts)?;
        self.unsorted_deltas(&runs.lens);
        Ok(())
    }

    /// Append a set of non-empty sequences as a trie.
    ///
    /// At each level, the sequences ending at that level contribute their
    /// last element as a leaf, and the remaining ones are grouped by their
    /// element at that level. A level is written as the number of leaves,
    /// the leaves, the number of groups and the group keys (both sorted
    /// ascending), followed by each group in key order.
    ///
    /// # Errors
    /// [`CodecError::Range`] if a sequence is empty, [`CodecError::Order`] if
    /// a sequence appears twice. In the latter case `index` is the position
    /// in `m` of the later copy, and `prev` and `next` are both its last
    /// element.
    pub fn tree<T: AsRef<[u32]>>(&mut self, m: &[T]) -> Result<(), CodecError> {
        let paths = m.iter().map(AsRef::as_ref).collect::<Vec<_>>();
        if paths.iter().any(|path| path.is_empty()) {
            return Err(CodecError::Range(
                "empty sequences cannot be stored in a tree".to_string(),
            ));
        }
        // stable, so equal paths keep their input order
        let mut order = (0..paths.len()).collect::<Vec<_>>();
        order.sort_by_key(|&i| paths[i]);
        if let Some(w) = order.windows(2).find(|w| paths[w[0]] == paths[w[1]]) {
            let dup = paths[w[1]];
            let leaf = dup[dup.len() - 1] as u64;
            return Err(CodecError::Order {
                index: w[1],
                prev: leaf,
                next: leaf,
            });
        }
        let sorted = order.into_iter().map(|i| paths[i]).collect::<Vec<_>>();
        self.tree_level(&sorted, 0)
    }

    fn tree_level(&mut self, m: &[&[u32]], depth: usize) -> Result<(), CodecError> {
        let mut leaves = vec![];
        let mut buckets = BTreeMap::<u32, Vec<&[u32]>>::new();
        for &path in m {
            let key = path[depth];
            if path.len() == depth + 1 {
                leaves.push(key);
            } else {
                buckets.entry(key).or_default().push(path);
            }
        }
        leaves.sort_unstable();
        self.symbol(leaves.len() as u64);
        self.sorted_ascending(&leaves)?;
        let keys = buckets.keys().copied().collect::<Vec<_>>();
        self.symbol(keys.len() as u64);
        self.sorted_ascending(&keys)?;
        for bucket in buckets.values() {
            self.tree_level(bucket, depth + 1)?;
        }
        Ok(())
    }
}
