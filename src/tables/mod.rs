/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The two blobs consumed by the normalization runtime.
//!
//! Each blob is described by a source document (JSON), normalized into a
//! table struct ([`NfTables`], [`SpecTables`]), encoded into symbols in a
//! fixed order, written with a [`Magic`] family and finally decoded again
//! and compared with the tables it was produced from.
//!
//! There is no tagging in the blobs: the runtime must decode the fields in
//! exactly the order in which [`NfTables::encode`] and
//! [`SpecTables::encode`] write them. Groups of unknown length are
//! terminated by an explicit sentinel, documented on each encoding method.

use crate::codes::Magic;
use crate::utils::pad_to;
use anyhow::{bail, ensure, Context, Result};
use dsi_progress_logger::prelude::*;
use log::info;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub mod nf;
pub use nf::{NfDocument, NfTables};

pub mod spec;
pub use spec::{Group, SpecDocument, SpecTables, Whole};

/// Blobs are padded with zeros to a multiple of this number of bytes.
pub const ALIGN: usize = 4;

/// The largest width considered when searching for the best family.
pub const OPTIMIZE_MAX_WIDTH: u8 = 20;

/// An encoded blob together with the family it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub magic: Magic,
    /// The preamble and the symbols, not yet aligned
    pub bytes: Vec<u8>,
}

impl Blob {
    /// Return the bytes padded to [`ALIGN`] bytes, as they are stored.
    pub fn aligned(&self) -> Vec<u8> {
        let mut bytes = self.bytes.clone();
        pad_to(&mut bytes, ALIGN);
        bytes
    }
}

/// Write `symbols` with either the given tuned family or, if `optimize` is
/// true, with the best family found by a (slow) brute-force search.
pub fn compile(symbols: &[u64], fixed: Magic, optimize: bool) -> Result<Blob> {
    if optimize {
        let mut pl = concurrent_progress_logger![item_name = "candidate"];
        match crate::codes::optimize(symbols, OPTIMIZE_MAX_WIDTH, None, &mut pl)? {
            Some((magic, bytes)) => Ok(Blob { magic, bytes }),
            None => bail!(
                "No family with widths up to {} can represent the symbols",
                OPTIMIZE_MAX_WIDTH
            ),
        }
    } else {
        let bytes = fixed
            .bytes_from_symbols(symbols)
            .with_context(|| format!("Cannot encode symbols with family {}", fixed))?;
        Ok(Blob {
            magic: fixed,
            bytes,
        })
    }
}

/// Check that decoding consumed the whole blob but for the padding of the
/// last byte.
pub(crate) fn ensure_consumed(name: &str, bits_read: usize, bytes: &[u8]) -> Result<()> {
    let total = bytes.len() * 8;
    ensure!(
        bits_read <= total && total - bits_read < 8,
        "Decoding the {} blob consumed {} bits out of {}",
        name,
        bits_read,
        total
    );
    Ok(())
}

/// Load a JSON document.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    let doc = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse {}", path.display()))?;
    info!("Loaded {}", path.display());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_consumed() {
        assert!(ensure_consumed("test", 0, &[]).is_ok());
        assert!(ensure_consumed("test", 17, &[0; 3]).is_ok());
        assert!(ensure_consumed("test", 24, &[0; 3]).is_ok());
        // a whole byte left over
        assert!(ensure_consumed("test", 16, &[0; 3]).is_err());
        assert!(ensure_consumed("test", 0, &[0]).is_err());
        // read past the end
        let err = ensure_consumed("test", 25, &[0; 3]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Decoding the test blob consumed 25 bits out of 24"
        );
    }
}
