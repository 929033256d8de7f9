/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Inverses of the [`Encoder`](super::Encoder) transforms.
//!
//! Each function consumes exactly the symbols written by the matching
//! encoder method. Values that cannot have been produced by the encoder
//! (negative or larger than [`u32::MAX`], or invalid code points) are
//! reported as [`CodecError::Range`].

use super::{SymbolSource, MAX_SET_LEN};
use crate::error::CodecError;
use crate::utils::{cmp_len_lex, to_signed};

#[inline]
fn to_u32(value: i64) -> Result<u32, CodecError> {
    u32::try_from(value)
        .map_err(|_| CodecError::Range(format!("decoded value {} is not a valid u32", value)))
}

/// Read `n` elements written by
/// [`Encoder::sorted_ascending`](super::Encoder::sorted_ascending).
pub fn read_sorted_ascending<S: SymbolSource + ?Sized>(
    n: u64,
    next: &mut S,
) -> Result<Vec<u32>, CodecError> {
    let mut v = vec![];
    let mut prev = -1_i64;
    for _ in 0..n {
        let gap = next.next_symbol()?;
        let gap = i64::try_from(gap).unwrap_or(i64::MAX);
        prev = to_u32(prev.saturating_add(1).saturating_add(gap))? as i64;
        v.push(prev as u32);
    }
    Ok(v)
}

/// Read `n` elements written by
/// [`Encoder::unsorted_deltas`](super::Encoder::unsorted_deltas).
pub fn read_unsorted_deltas<S: SymbolSource + ?Sized>(
    n: u64,
    next: &mut S,
) -> Result<Vec<u32>, CodecError> {
    let mut v = vec![];
    let mut prev = -1_i64;
    for _ in 0..n {
        prev = to_u32(prev.saturating_add(to_signed(next.next_symbol()?)))? as i64;
        v.push(prev as u32);
    }
    Ok(v)
}

/// Read a string written by [`Encoder::str`](super::Encoder::str).
pub fn read_str<S: SymbolSource + ?Sized>(next: &mut S) -> Result<String, CodecError> {
    let n = next.next_symbol()?;
    read_unsorted_deltas(n, next)?
        .into_iter()
        .map(|cp| {
            char::from_u32(cp)
                .ok_or_else(|| CodecError::Range(format!("{:#x} is not a valid code point", cp)))
        })
        .collect()
}

/// Read a set written by [`Encoder::unique`](super::Encoder::unique),
/// returning its elements in ascending order.
///
/// Sets of more than [`MAX_SET_LEN`] elements are reported as
/// [`CodecError::Range`].
pub fn read_unique<S: SymbolSource + ?Sized>(next: &mut S) -> Result<Vec<u32>, CodecError> {
    let n = next.next_symbol()?;
    let mut v = read_sorted_ascending(n, next)?;
    let n = next.next_symbol()?;
    let starts = read_sorted_ascending(n, next)?;
    let lens = read_unsorted_deltas(n, next)?;
    let total = v.len() as u64 + lens.iter().map(|&len| len as u64).sum::<u64>();
    if total > MAX_SET_LEN as u64 {
        return Err(CodecError::Range(format!(
            "set of {} elements exceeds the maximum of {}",
            total, MAX_SET_LEN
        )));
    }
    v.reserve(total as usize - v.len());
    for (&start, &len) in starts.iter().zip(&lens) {
        if len > 0 && start.checked_add(len - 1).is_none() {
            return Err(CodecError::Range(format!(
                "run of length {} starting at {} overflows",
                len, start
            )));
        }
        v.extend((0..len).map(|i| start + i));
    }
    v.sort_unstable();
    Ok(v)
}

/// Read a set of sequences written by
/// [`Encoder::tree`](super::Encoder::tree).
///
/// The sequences are returned sorted by length and then lexicographically.
pub fn read_tree<S: SymbolSource + ?Sized>(next: &mut S) -> Result<Vec<Vec<u32>>, CodecError> {
    let mut ret = vec![];
    read_tree_level(next, &mut vec![], &mut ret)?;
    ret.sort_by(|a, b| cmp_len_lex(a, b));
    Ok(ret)
}

fn read_tree_level<S: SymbolSource + ?Sized>(
    next: &mut S,
    path: &mut Vec<u32>,
    ret: &mut Vec<Vec<u32>>,
) -> Result<(), CodecError> {
    let n = next.next_symbol()?;
    for leaf in read_sorted_ascending(n, next)? {
        path.push(leaf);
        ret.push(path.clone());
        path.pop();
    }
    let n = next.next_symbol()?;
    for key in read_sorted_ascending(n, next)? {
        path.push(key);
        read_tree_level(next, path, ret)?;
        path.pop();
    }
    Ok(())
}

/// Call `f` repeatedly, collecting its results until it returns `None`.
///
/// This decodes groups of unknown number terminated by a sentinel: `f`
/// decides, for each call site, which decoded value is the sentinel.
pub fn collect_while<T, E, F: FnMut() -> Result<Option<T>, E>>(mut f: F) -> Result<Vec<T>, E> {
    let mut ret = vec![];
    while let Some(item) = f()? {
        ret.push(item);
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolSlice;

    #[test]
    fn test_read_sorted_ascending() {
        let mut source = SymbolSlice::new(&[0, 0, 3, 0]);
        assert_eq!(read_sorted_ascending(4, &mut source).unwrap(), vec![0, 1, 5, 6]);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_negative_delta() {
        // -1 + (-1) is negative
        let mut source = SymbolSlice::new(&[1]);
        assert!(matches!(
            read_unsorted_deltas(1, &mut source),
            Err(CodecError::Range(_))
        ));
    }

    #[test]
    fn test_overflowing_gap() {
        let mut source = SymbolSlice::new(&[u32::MAX as u64, 0]);
        assert!(matches!(
            read_sorted_ascending(2, &mut source),
            Err(CodecError::Range(_))
        ));
        let mut source = SymbolSlice::new(&[u64::MAX]);
        assert!(matches!(
            read_sorted_ascending(1, &mut source),
            Err(CodecError::Range(_))
        ));
    }

    #[test]
    fn test_huge_run() {
        use crate::utils::from_signed;
        // a single run of u32::MAX elements starting at 0
        let symbols = [0, 1, 0, from_signed(u32::MAX as i64 + 1)];
        let mut source = SymbolSlice::new(&symbols);
        assert!(matches!(
            read_unique(&mut source),
            Err(CodecError::Range(_))
        ));
        // one singleton too many
        let symbols = [1, 0, 1, 5, from_signed(MAX_SET_LEN as i64 + 1)];
        let mut source = SymbolSlice::new(&symbols);
        assert!(matches!(
            read_unique(&mut source),
            Err(CodecError::Range(_))
        ));
    }

    #[test]
    fn test_surrogate_is_rejected() {
        // a lone surrogate code point, 0xd800
        let mut source = SymbolSlice::new(&[1, 2 * 0xd801]);
        assert!(matches!(read_str(&mut source), Err(CodecError::Range(_))));
    }

    #[test]
    fn test_closure_source() {
        let mut symbols = [1_u64, 7, 2, 1, 7, 8, 0].into_iter();
        let mut next = || symbols.next().ok_or(CodecError::EndOfStream { pos: 0 });
        assert_eq!(read_unique(&mut next).unwrap(), vec![1, 2, 3, 7, 9, 10, 11]);
        assert!(next().is_err());
    }

    #[test]
    fn test_collect_while() {
        let mut source = SymbolSlice::new(&[3, 1, 4, 0, 9]);
        let v = collect_while(|| {
            let x = source.next_symbol()?;
            Ok::<_, CodecError>((x != 0).then_some(x))
        })
        .unwrap();
        assert_eq!(v, vec![3, 1, 4]);
        assert_eq!(source.remaining(), 1);
    }
}
