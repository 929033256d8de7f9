/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Transforms between structured values (strings, sorted sets, delta
//! sequences, prefix trees) and streams of symbols, that is, of non-negative
//! integers.
//!
//! The [`Encoder`] appends symbols to a list it owns; the free functions in
//! [`decoder`] pull symbols from a [`SymbolSource`] and invert each transform
//! exactly. Nothing in a stream says which transform produced it: the
//! decoding calls must mirror the encoding calls one by one.

pub mod decoder;
pub use decoder::{
    collect_while, read_sorted_ascending, read_str, read_tree, read_unique,
    read_unsorted_deltas,
};

mod encoder;
pub use encoder::Encoder;

use crate::error::CodecError;

/// The largest number of elements in a set written by [`Encoder::unique`].
///
/// Decoding a set whose singletons and runs add up to more elements fails
/// before the set is expanded.
pub const MAX_SET_LEN: usize = 1 << 24;

/// A source of symbols for the decoding functions.
pub trait SymbolSource {
    /// Return the next symbol of the stream.
    fn next_symbol(&mut self) -> Result<u64, CodecError>;
}

impl<F: FnMut() -> Result<u64, CodecError>> SymbolSource for F {
    #[inline(always)]
    fn next_symbol(&mut self) -> Result<u64, CodecError> {
        self()
    }
}

/// A [`SymbolSource`] reading from a slice of symbols, such as the output
/// of [`Encoder::symbols`].
#[derive(Debug, Clone)]
pub struct SymbolSlice<'a> {
    symbols: &'a [u64],
    pos: usize,
}

impl<'a> SymbolSlice<'a> {
    pub fn new(symbols: &'a [u64]) -> Self {
        Self { symbols, pos: 0 }
    }

    /// Return the number of symbols not yet read.
    pub fn remaining(&self) -> usize {
        self.symbols.len() - self.pos
    }
}

impl SymbolSource for SymbolSlice<'_> {
    #[inline]
    fn next_symbol(&mut self) -> Result<u64, CodecError> {
        let symbol = *self
            .symbols
            .get(self.pos)
            .ok_or(CodecError::EndOfStream { pos: self.pos })?;
        self.pos += 1;
        Ok(symbol)
    }
}
