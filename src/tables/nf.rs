/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Unicode normalization data: composition exclusions, quick-check code
//! points, canonical decompositions and combining class ranks.

use super::{compile, ensure_consumed, Blob};
use crate::codes::Magic;
use crate::error::CodecError;
use crate::symbols::*;
use crate::utils::cmp_len_lex;
use anyhow::{bail, ensure, Context, Result};
use itertools::{izip, Itertools};
use log::info;
use serde::Deserialize;

/// The normalization source document, as produced by the data extraction
/// scripts.
#[derive(Debug, Clone, Deserialize)]
pub struct NfDocument {
    /// The Unicode version, possibly followed by a description
    pub unicode: String,
    pub exclusions: Vec<u32>,
    pub qc: Vec<u32>,
    /// Code points and their one or two code point decompositions
    pub decomp: Vec<(u32, Vec<u32>)>,
    /// One set of code points per combining class, in rank order
    pub ranks: Vec<Vec<u32>>,
}

/// Normalization tables, in the form in which they are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NfTables {
    /// The Unicode version
    pub version: String,
    pub exclusions: Vec<u32>,
    pub qc: Vec<u32>,
    /// Decompositions, sorted by length and then by code point
    pub decomp: Vec<(u32, Vec<u32>)>,
    pub ranks: Vec<Vec<u32>>,
}

impl TryFrom<NfDocument> for NfTables {
    type Error = anyhow::Error;

    fn try_from(doc: NfDocument) -> Result<Self> {
        let version = doc
            .unicode
            .split_whitespace()
            .next()
            .context("Missing Unicode version")?
            .to_string();
        if let Some((cp, _)) = doc
            .decomp
            .iter()
            .find(|(_, to)| to.is_empty() || to.len() > 2)
        {
            bail!("Decomposition of {:#x} must have one or two code points", cp);
        }
        // an empty rank would read back as the terminator
        ensure!(
            doc.ranks.iter().all(|rank| !rank.is_empty()),
            "Ranks must be non-empty"
        );
        let mut decomp = doc.decomp;
        decomp.sort_by(|(a, a_to), (b, b_to)| a_to.len().cmp(&b_to.len()).then(a.cmp(b)));
        Ok(Self {
            version,
            exclusions: doc.exclusions,
            qc: doc.qc,
            decomp,
            ranks: doc.ranks,
        })
    }
}

impl NfTables {
    /// Encode the tables.
    ///
    /// The rank sets are terminated by an empty set.
    pub fn encode(&self) -> Result<Vec<u64>, CodecError> {
        let mut enc = Encoder::new();
        enc.str(&self.version);
        enc.unique(&self.exclusions)?;
        enc.unique(&self.qc)?;

        for len in [1, 2] {
            let (sources, targets): (Vec<_>, Vec<_>) = self
                .decomp
                .iter()
                .filter(|(_, to)| to.len() == len)
                .map(|(cp, to)| (*cp, to.as_slice()))
                .unzip();
            enc.unique(&sources)?;
            for i in 0..len {
                enc.unsorted_deltas(&targets.iter().map(|to| to[i]).collect_vec());
            }
        }

        for rank in &self.ranks {
            enc.unique(rank)?;
        }
        enc.unique(&[])?;
        Ok(enc.into_symbols())
    }

    /// Decode tables written by [`encode`](NfTables::encode).
    pub fn decode<S: SymbolSource + ?Sized>(next: &mut S) -> Result<Self, CodecError> {
        let version = read_str(next)?;
        let exclusions = read_unique(next)?;
        let qc = read_unique(next)?;

        let sources = read_unique(next)?;
        let n = sources.len() as u64;
        let targets = read_unsorted_deltas(n, next)?;
        let mut decomp = izip!(sources, targets)
            .map(|(cp, a)| (cp, vec![a]))
            .collect_vec();

        let sources = read_unique(next)?;
        let n = sources.len() as u64;
        let first = read_unsorted_deltas(n, next)?;
        let second = read_unsorted_deltas(n, next)?;
        decomp.extend(izip!(sources, first, second).map(|(cp, a, b)| (cp, vec![a, b])));

        let ranks = collect_while(|| -> Result<_, CodecError> {
            let rank = read_unique(next)?;
            Ok((!rank.is_empty()).then_some(rank))
        })?;

        Ok(Self {
            version,
            exclusions,
            qc,
            decomp,
            ranks,
        })
    }

    /// Return the name of the first table that differs from `other`.
    pub fn first_mismatch(&self, other: &Self) -> Option<&'static str> {
        let flat = |decomp: &[(u32, Vec<u32>)]| {
            decomp
                .iter()
                .map(|(cp, to)| std::iter::once(*cp).chain(to.iter().copied()).collect_vec())
                .sorted_by(|a, b| cmp_len_lex(a, b))
                .collect_vec()
        };
        if self.version != other.version {
            Some("version")
        } else if self.exclusions != other.exclusions {
            Some("exclusions")
        } else if self.qc != other.qc {
            Some("qc")
        } else if flat(&self.decomp) != flat(&other.decomp) {
            Some("decomp")
        } else if self.ranks != other.ranks {
            Some("ranks")
        } else {
            None
        }
    }

    /// Encode the tables, write them, and check that they read back
    /// unchanged.
    pub fn build(&self, optimize: bool) -> Result<Blob> {
        let symbols = self.encode().context("Cannot encode the NF tables")?;
        let blob = compile(&symbols, Magic::nf(), optimize)?;
        info!("  NF: {} bytes using {}", blob.bytes.len(), blob.magic);

        self.verify(&blob)?;
        Ok(blob)
    }

    /// Check that `blob` decodes to exactly these tables, using all its bits
    /// but for the padding of the last byte.
    pub fn verify(&self, blob: &Blob) -> Result<()> {
        let mut reader = Magic::reader_from_bytes(&blob.bytes)?;
        ensure!(
            reader.magic() == &blob.magic,
            "The NF preamble reads back as {}",
            reader.magic()
        );
        let decoded = Self::decode(&mut reader).context("Cannot decode the NF blob")?;
        if let Some(table) = self.first_mismatch(&decoded) {
            bail!("NF round trip mismatch in {}", table);
        }
        ensure_consumed("NF", reader.bits_read(), &blob.bytes)
    }
}
