//! # Oak Serial - Item Serial Codec
//!
//! `oak-serial` round-trips the obfuscated, bit-packed item serials stored in
//! Oak-engine save files. It handles the three layers of the format:
//!
//! - **Envelope**: version tag, cipher seed, and a folded-CRC32 checksum
//!   wrapping the scrambled payload
//! - **Obfuscation**: a seeded XOR stream cipher with a cyclic rotation step
//! - **Fields**: variable-width bit-packed fields whose widths come from an
//!   external asset catalog
//!
//! Decoding is lossless even for payload bits the codec does not understand:
//! unconsumed trailing bits are captured on the item and re-emitted verbatim,
//! and items whose category cannot be resolved keep their original bytes and
//! re-encode unchanged.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oak_serial::{ItemCodec, PartsDatabase, Result};
//!
//! # fn load_catalog() -> PartsDatabase { PartsDatabase::new() }
//! # fn main() -> Result<()> {
//! # let serial_bytes: Vec<u8> = Vec::new();
//! let catalog = load_catalog();
//! let codec = ItemCodec::new(catalog);
//!
//! // Decode a serial; the seed comes back so re-encoding is byte-identical
//! let decoded = codec.decode(&serial_bytes)?;
//! let mut item = decoded.item;
//!
//! // Edit and re-encode
//! item.level = 72;
//! let new_serial = codec.encode(&item, decoded.seed)?;
//! # Ok(())
//! # }
//! ```
//!
//! The save-file container around the serials, the character/profile payload
//! schema, and catalog loading are out of scope; callers hand the codec byte
//! buffers and a catalog and get [`Item`] values or byte buffers back.

pub mod bitstream;
pub mod catalog;
pub mod cipher;
pub mod envelope;
pub mod error;
pub mod item;

pub use crate::bitstream::{BitReader, BitTail, BitWriter};
pub use crate::catalog::{AssetCatalog, CategoryData, PartsDatabase, WidthEntry};
pub use crate::envelope::{seed_of, Envelope, VERSION_MAX, VERSION_MIN};
pub use crate::error::{Result, SerialError, MIN_SERIAL_LEN};
pub use crate::item::{BatchDecode, BatchFailure, DecodeWarning, DecodedItem, Item, ItemCodec};
