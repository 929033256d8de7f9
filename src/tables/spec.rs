/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Name normalization data: special code point sets, fenced characters,
//! mappings, script groups, emoji sequences and whole-script confusables.

use super::{compile, ensure_consumed, Blob};
use crate::codes::Magic;
use crate::error::CodecError;
use crate::symbols::*;
use crate::utils::cmp_len_lex;
use anyhow::{bail, ensure, Context, Result};
use itertools::Itertools;
use log::info;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A script group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub restricted: bool,
    /// Whether combining marks are whitelisted for this group
    #[serde(default)]
    pub cm: bool,
    pub primary: Vec<u32>,
    pub secondary: Vec<u32>,
}

impl Group {
    const RESTRICTED: u64 = 1;
    const CM: u64 = 2;

    /// Return the flags stored for this group.
    pub fn flags(&self) -> u64 {
        (self.restricted as u64 * Self::RESTRICTED) | (self.cm as u64 * Self::CM)
    }
}

/// A whole-script confusable: code points that look like `valid` ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Whole {
    pub confused: Vec<u32>,
    pub valid: Vec<u32>,
}

/// The specification source document.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecDocument {
    /// Provenance information, logged but not stored
    pub created: Option<String>,
    pub unicode: Option<String>,
    pub cldr: Option<String>,

    pub escape: Vec<u32>,
    pub ignored: Vec<u32>,
    pub cm: Vec<u32>,
    pub nsm_max: u64,
    pub nsm: Vec<u32>,
    pub nfc_check: Vec<u32>,
    pub fenced: Vec<(u32, String)>,
    pub mapped: Vec<(u32, Vec<u32>)>,
    pub groups: Vec<Group>,
    pub emoji: Vec<Vec<u32>>,
    pub wholes: Vec<Whole>,
}

/// Specification tables, in the form in which they are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecTables {
    pub escape: Vec<u32>,
    pub ignored: Vec<u32>,
    pub cm: Vec<u32>,
    pub nsm_max: u64,
    pub nsm: Vec<u32>,
    pub nfc_check: Vec<u32>,
    /// Fenced code points and their labels, sorted by code point
    pub fenced: Vec<(u32, String)>,
    /// Mappings, sorted by output length and then by code point
    pub mapped: Vec<(u32, Vec<u32>)>,
    pub groups: Vec<Group>,
    /// Emoji sequences, sorted by length and then lexicographically
    pub emoji: Vec<Vec<u32>>,
    pub wholes: Vec<Whole>,
}

fn sort_mapped(mapped: &mut [(u32, Vec<u32>)]) {
    mapped.sort_by(|(a, a_to), (b, b_to)| a_to.len().cmp(&b_to.len()).then(a.cmp(b)));
}

impl TryFrom<SpecDocument> for SpecTables {
    type Error = anyhow::Error;

    fn try_from(doc: SpecDocument) -> Result<Self> {
        info!(
            "Specification created {}, Unicode {}, CLDR {}",
            doc.created.as_deref().unwrap_or("?"),
            doc.unicode.as_deref().unwrap_or("?"),
            doc.cldr.as_deref().unwrap_or("?"),
        );
        // each of these would read back as the terminator of its list
        if let Some((cp, _)) = doc.mapped.iter().find(|(_, to)| to.is_empty()) {
            bail!("Mapping of {:#x} is empty", cp);
        }
        ensure!(
            doc.groups.iter().all(|g| !g.name.is_empty()),
            "Group names must be non-empty"
        );
        ensure!(
            doc.wholes.iter().all(|w| !w.confused.is_empty()),
            "Confused sets of wholes must be non-empty"
        );

        let mut fenced = doc.fenced;
        fenced.sort_by_key(|(cp, _)| *cp);
        let mut mapped = doc.mapped;
        sort_mapped(&mut mapped);
        let mut emoji = doc.emoji;
        emoji.sort_by(|a, b| cmp_len_lex(a, b));

        Ok(Self {
            escape: doc.escape,
            ignored: doc.ignored,
            cm: doc.cm,
            nsm_max: doc.nsm_max,
            nsm: doc.nsm,
            nfc_check: doc.nfc_check,
            fenced,
            mapped,
            groups: doc.groups,
            emoji,
            wholes: doc.wholes,
        })
    }
}

impl SpecTables {
    /// Encode the tables.
    ///
    /// Mappings are grouped by output length, each group starting with its
    /// (non-zero) length; the groups are terminated by a zero. Script groups
    /// are terminated by an empty name, and wholes by an empty confused set.
    pub fn encode(&self) -> Result<Vec<u64>, CodecError> {
        let mut enc = Encoder::new();
        enc.unique(&self.escape)?;
        enc.unique(&self.ignored)?;
        enc.unique(&self.cm)?;
        enc.symbol(self.nsm_max);
        enc.unique(&self.nsm)?;
        enc.unique(&self.nfc_check)?;

        enc.symbol(self.fenced.len() as u64);
        enc.sorted_ascending(&self.fenced.iter().map(|(cp, _)| *cp).collect_vec())?;
        for (_, label) in &self.fenced {
            enc.str(label);
        }

        let mut by_width = BTreeMap::<usize, Vec<(u32, &[u32])>>::new();
        for (cp, to) in &self.mapped {
            by_width
                .entry(to.len())
                .or_default()
                .push((*cp, to.as_slice()));
        }
        for (width, entries) in &by_width {
            enc.symbol(*width as u64);
            enc.unique(&entries.iter().map(|(cp, _)| *cp).collect_vec())?;
            for i in 0..*width {
                enc.unsorted_deltas(&entries.iter().map(|(_, to)| to[i]).collect_vec());
            }
        }
        enc.symbol(0);

        for group in &self.groups {
            enc.str(&group.name);
            enc.symbol(group.flags());
            enc.unique(&group.primary)?;
            enc.unique(&group.secondary)?;
        }
        enc.str("");

        enc.tree(&self.emoji)?;

        for whole in &self.wholes {
            enc.unique(&whole.confused)?;
            enc.unique(&whole.valid)?;
        }
        enc.unique(&[])?;
        Ok(enc.into_symbols())
    }

    /// Decode tables written by [`encode`](SpecTables::encode).
    pub fn decode<S: SymbolSource + ?Sized>(next: &mut S) -> Result<Self, CodecError> {
        let escape = read_unique(next)?;
        let ignored = read_unique(next)?;
        let cm = read_unique(next)?;
        let nsm_max = next.next_symbol()?;
        let nsm = read_unique(next)?;
        let nfc_check = read_unique(next)?;

        let n = next.next_symbol()?;
        let fenced = read_sorted_ascending(n, next)?
            .into_iter()
            .map(|cp| -> Result<_, CodecError> { Ok((cp, read_str(next)?)) })
            .collect::<Result<Vec<_>, CodecError>>()?;

        let mut mapped = collect_while(|| -> Result<_, CodecError> {
            let width = next.next_symbol()?;
            if width == 0 {
                return Ok(None);
            }
            let sources = read_unique(next)?;
            let mut targets = vec![vec![]; sources.len()];
            for _ in 0..width {
                let column = read_unsorted_deltas(sources.len() as u64, next)?;
                for (to, cp) in targets.iter_mut().zip(column) {
                    to.push(cp);
                }
            }
            Ok(Some(sources.into_iter().zip(targets).collect_vec()))
        })?
        .concat();
        sort_mapped(&mut mapped);

        let groups = collect_while(|| -> Result<_, CodecError> {
            let name = read_str(next)?;
            if name.is_empty() {
                return Ok(None);
            }
            let flags = next.next_symbol()?;
            if flags & !(Group::RESTRICTED | Group::CM) != 0 {
                return Err(CodecError::Range(format!(
                    "unknown flags {:#x} for group {}",
                    flags, name
                )));
            }
            Ok(Some(Group {
                name,
                restricted: flags & Group::RESTRICTED != 0,
                cm: flags & Group::CM != 0,
                primary: read_unique(next)?,
                secondary: read_unique(next)?,
            }))
        })?;

        let emoji = read_tree(next)?;

        let wholes = collect_while(|| -> Result<_, CodecError> {
            let confused = read_unique(next)?;
            if confused.is_empty() {
                return Ok(None);
            }
            Ok(Some(Whole {
                confused,
                valid: read_unique(next)?,
            }))
        })?;

        Ok(Self {
            escape,
            ignored,
            cm,
            nsm_max,
            nsm,
            nfc_check,
            fenced,
            mapped,
            groups,
            emoji,
            wholes,
        })
    }

    /// Return the name of the first table that differs from `other`.
    pub fn first_mismatch(&self, other: &Self) -> Option<&'static str> {
        [
            ("escape", self.escape == other.escape),
            ("ignored", self.ignored == other.ignored),
            ("cm", self.cm == other.cm),
            ("nsm_max", self.nsm_max == other.nsm_max),
            ("nsm", self.nsm == other.nsm),
            ("nfc_check", self.nfc_check == other.nfc_check),
            ("fenced", self.fenced == other.fenced),
            ("mapped", self.mapped == other.mapped),
            ("groups", self.groups == other.groups),
            ("emoji", self.emoji == other.emoji),
            ("wholes", self.wholes == other.wholes),
        ]
        .into_iter()
        .find(|(_, same)| !same)
        .map(|(name, _)| name)
    }

    /// Encode the tables, write them, and check that they read back
    /// unchanged.
    pub fn build(&self, optimize: bool) -> Result<Blob> {
        let symbols = self.encode().context("Cannot encode the spec tables")?;
        let blob = compile(&symbols, Magic::spec(), optimize)?;
        info!("Spec: {} bytes using {}", blob.bytes.len(), blob.magic);

        self.verify(&blob)?;
        Ok(blob)
    }

    /// Check that `blob` decodes to exactly these tables, using all its bits
    /// but for the padding of the last byte.
    pub fn verify(&self, blob: &Blob) -> Result<()> {
        let mut reader = Magic::reader_from_bytes(&blob.bytes)?;
        ensure!(
            reader.magic() == &blob.magic,
            "The spec preamble reads back as {}",
            reader.magic()
        );
        let decoded = Self::decode(&mut reader).context("Cannot decode the spec blob")?;
        if let Some(table) = self.first_mismatch(&decoded) {
            bail!("Spec round trip mismatch in {}", table);
        }
        ensure_consumed("spec", reader.bits_read(), &blob.bytes)
    }
}
