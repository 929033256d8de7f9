/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! This module contains all the logic to read and write bits and codes.
//!
//! **The convention is to pack bits from the LSB to the MSB of each byte,
//! but to write binary fields from their MSB to their LSB.**
//!
//! The two orders are independent: the first bit of a field is the most
//! significant one, and it lands in the lowest free bit of the current byte.
//!
//! #### Example:
//! ```
//! use ens_compress::codes::*;
//!
//! let mut writer = BitWriter::new();
//! writer.unary(0);
//! writer.unary(3);
//! writer.binary(5, 4).unwrap();
//! let bytes = writer.into_bytes();
//! // 0 | 1110 | 0101, packed from the lowest bit of each byte
//! assert_eq!(bytes, [0b0100_1110, 0b0000_0001]);
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.unary().unwrap(), 0);
//! assert_eq!(reader.unary().unwrap(), 3);
//! assert_eq!(reader.binary(4).unwrap(), 5);
//! ```

mod bit_stream;
pub use bit_stream::{BitRead, BitWrite};

mod writer;
pub use writer::BitWriter;

mod reader;
pub use reader::BitReader;

mod magic;
pub use magic::{Bucket, Magic, MagicReader};

mod optimize;
pub use optimize::{optimize, trial, Trial};
