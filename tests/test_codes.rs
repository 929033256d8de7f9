/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use ens_compress::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_bits() -> Result<()> {
    let mut writer = BitWriter::new();
    writer.bit(true);
    writer.repeat(3, false);
    writer.unary(2);
    writer.binary(0b101, 3)?;
    writer.unary(0);
    assert_eq!(writer.bits_written(), 11);
    let bytes = writer.into_bytes();
    assert_eq!(bytes.len(), 2);

    let mut reader = BitReader::new(&bytes);
    assert!(reader.bit()?);
    for _ in 0..3 {
        assert!(!reader.bit()?);
    }
    assert_eq!(reader.unary()?, 2);
    assert_eq!(reader.binary(3)?, 0b101);
    assert_eq!(reader.unary()?, 0);
    // padding
    for _ in 11..16 {
        assert!(!reader.bit()?);
    }
    assert_eq!(reader.bit(), Err(CodecError::EndOfStream { pos: 2 }));
    Ok(())
}

#[test]
fn test_two_buckets() -> Result<()> {
    let magic = Magic::new(&[2, 3])?;
    assert_eq!(magic.capacity(), 12);
    for x in 0..4 {
        assert_eq!(magic.code_len(x)?, 3);
        let mut writer = BitWriter::new();
        magic.write(&mut writer, x)?;
        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        // a zero selects the first bucket
        assert!(!reader.bit()?);
        assert_eq!(reader.binary(2)?, x);
    }
    for x in 4..12 {
        // the last bucket has no terminator
        assert_eq!(magic.code_len(x)?, 4);
        let mut writer = BitWriter::new();
        magic.write(&mut writer, x)?;
        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        assert!(reader.bit()?);
        assert_eq!(reader.binary(3)?, x - 4);
    }
    let mut writer = BitWriter::new();
    assert_eq!(
        magic.write(&mut writer, 12),
        Err(CodecError::Capacity {
            value: 12,
            capacity: 12
        })
    );
    assert_eq!(writer.bits_written(), 0);
    Ok(())
}

#[test]
fn test_invalid_widths() {
    assert!(matches!(Magic::new(&[]), Err(CodecError::Range(_))));
    assert!(matches!(Magic::new(&[0, 3]), Err(CodecError::Range(_))));
    assert!(matches!(Magic::new(&[3, 33]), Err(CodecError::Range(_))));
    assert!(matches!(Magic::new(&[3, 3]), Err(CodecError::Order { .. })));
    assert!(matches!(Magic::new(&[4, 3]), Err(CodecError::Order { .. })));
    assert!(Magic::new(&[32]).is_ok());
}

#[test]
fn test_preamble() -> Result<()> {
    for magic in [Magic::nf(), Magic::spec(), Magic::new(&[1, 32])?] {
        let mut writer = BitWriter::new();
        magic.write_preamble(&mut writer);
        assert_eq!(writer.bits_written(), magic.preamble_len());
        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(Magic::read_preamble(&mut reader)?, magic);
        assert_eq!(reader.bits_read(), magic.preamble_len());
    }
    assert_eq!(Magic::nf().widths(), Magic::NF_WIDTHS);
    assert_eq!(Magic::spec().to_string(), "1,3,7,13,16,17,18,19");
    Ok(())
}

#[test]
fn test_empty_stream() -> Result<()> {
    let magic = Magic::new(&[2, 3])?;
    let bytes = magic.bytes_from_symbols(&[])?;
    // deltas 2 and 1, then the terminating zero delta
    assert_eq!(bytes, vec![0b0000_1011]);
    assert_eq!(magic.encoded_len(&[])?, 1);
    let reader = Magic::reader_from_bytes(&bytes)?;
    assert_eq!(reader.magic(), &magic);
    assert_eq!(reader.bits_read(), 6);
    Ok(())
}

#[test]
fn test_truncated() -> Result<()> {
    let magic = Magic::spec();
    let symbols = [1_000_u64, 70_000, 3];
    let bytes = magic.bytes_from_symbols(&symbols)?;
    let mut reader = Magic::reader_from_bytes(&bytes[..bytes.len() - 2])?;
    assert_eq!(reader.read()?, 1_000);
    assert!(matches!(
        reader.read(),
        Err(CodecError::EndOfStream { .. })
    ));
    assert!(matches!(
        Magic::reader_from_bytes(&[]),
        Err(CodecError::EndOfStream { pos: 0 })
    ));
    Ok(())
}

#[test]
fn test_random_round_trip() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0);
    for _ in 0..100 {
        let num_widths = rng.random_range(1..=8);
        let mut widths = (0..num_widths)
            .map(|_| rng.random_range(1..=24_u8))
            .collect::<Vec<_>>();
        widths.sort_unstable();
        widths.dedup();
        let magic = Magic::new(&widths)?;

        let symbols = (0..rng.random_range(0..1000))
            .map(|_| rng.random_range(0..magic.capacity()))
            .collect::<Vec<_>>();
        let bytes = magic.bytes_from_symbols(&symbols)?;
        assert_eq!(bytes.len(), magic.encoded_len(&symbols)?);

        let mut reader = Magic::reader_from_bytes(&bytes)?;
        assert_eq!(reader.magic(), &magic);
        for &symbol in &symbols {
            assert_eq!(reader.read()?, symbol);
        }
        assert!(bytes.len() * 8 - reader.bits_read() < 8);
    }
    Ok(())
}
