//! Item entity and bit-packed field codec
//!
//! The plaintext inside a serial envelope is a fixed sequence of MSB-first
//! fields whose widths come from the asset catalog:
//!
//! ```text
//! [marker: 8 = 128][version: 7][balance][inv_data][manufacturer][level: 7]
//! [part_count: 6][parts...][generic_count: 4][generics...][overflow bits]
//! ```
//!
//! Identifier fields hold a catalog index plus one; index 0 on the wire is the
//! format's reserved value and decodes through a `-1` adjustment. The part and
//! generic sections are only present when the balance identifier maps to a
//! known part category; otherwise the item is marked `skip_introspection` and
//! its original bytes are preserved for re-encode.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bitstream::{BitReader, BitTail, BitWriter};
use crate::catalog::{
    AssetCatalog, BALANCE_CATEGORY, GENERIC_PART_CATEGORY, INVENTORY_CATEGORY,
    MANUFACTURER_CATEGORY,
};
use crate::envelope::{Envelope, VERSION_MIN};
use crate::error::{Result, SerialError};

/// Fixed 8-bit value opening every payload.
const PAYLOAD_MARKER: u64 = 128;

const MARKER_BITS: usize = 8;
const VERSION_BITS: usize = 7;
const LEVEL_BITS: usize = 7;
const PART_COUNT_BITS: usize = 6;
const GENERIC_COUNT_BITS: usize = 4;

/// A decoded item record.
///
/// Owns no catalog state; identifiers are resolved against a catalog at
/// encode/decode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item level, 0–127.
    pub level: u8,
    /// Balance identifier, mandatory.
    pub balance: String,
    /// Inventory-data identifier, mandatory.
    pub inv_data: String,
    /// Manufacturer identifier, mandatory.
    pub manufacturer: String,
    /// Ordered part identifiers; order is semantically significant.
    pub parts: Vec<String>,
    /// Ordered generic part identifiers, independent category from `parts`.
    pub generics: Vec<String>,
    /// Trailing bits no known field consumed, re-emitted verbatim on encode.
    pub overflow: BitTail,
    /// Payload schema version selecting catalog bit widths.
    pub version: u64,
    /// Envelope version byte; distinct from `version`.
    pub serial_version: u8,
    /// When set, encode bypasses field packing and emits `raw` unchanged.
    /// Protects items with an unrecognized category from being destroyed.
    pub skip_introspection: bool,
    /// The original serial bytes, retained for the skip-introspection fallback.
    #[serde(skip)]
    pub raw: Vec<u8>,
}

impl Default for Item {
    fn default() -> Self {
        Item {
            level: 0,
            balance: String::new(),
            inv_data: String::new(),
            manufacturer: String::new(),
            parts: Vec::new(),
            generics: Vec::new(),
            overflow: BitTail::new(),
            version: 0,
            serial_version: VERSION_MIN,
            skip_introspection: false,
            raw: Vec::new(),
        }
    }
}

/// Soft condition raised during an otherwise successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// The balance identifier has no known part category; parts and generics
    /// were not read and the item was marked `skip_introspection`.
    UnknownCategory { balance: String },
}

/// Result of decoding one serial: the item, the envelope seed it was
/// scrambled with, and any soft condition worth logging.
#[derive(Debug, Clone)]
pub struct DecodedItem {
    pub item: Item,
    pub seed: i32,
    pub warning: Option<DecodeWarning>,
}

/// One failed entry of a batch decode.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the serial in the input sequence.
    pub index: usize,
    pub error: SerialError,
}

/// Outcome of decoding many serials: successes alongside per-entry failures.
#[derive(Debug, Default)]
pub struct BatchDecode {
    pub items: Vec<DecodedItem>,
    pub failures: Vec<BatchFailure>,
}

/// Bidirectional codec between raw serials and [`Item`] values.
///
/// Holds the catalog handle it resolves identifiers against; independent
/// codecs can use independently-configured catalogs. All calls are
/// synchronous and take `&self`, so one codec can serve many threads as long
/// as the catalog is read-only — which [`AssetCatalog`] implementations are
/// after construction.
#[derive(Debug, Clone)]
pub struct ItemCodec<C> {
    catalog: C,
}

impl<C: AssetCatalog> ItemCodec<C> {
    pub fn new(catalog: C) -> Self {
        ItemCodec { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Decode a raw serial into an item.
    ///
    /// An unknown balance category does not fail the decode: the returned
    /// item carries `skip_introspection` and the warning says why, so batch
    /// callers can log it and move on without losing the item.
    pub fn decode(&self, serial: &[u8]) -> Result<DecodedItem> {
        let envelope = Envelope::decode(serial)?;
        let mut reader = BitReader::new(&envelope.plaintext);

        let marker = reader.read_bits(MARKER_BITS)?;
        if marker != PAYLOAD_MARKER {
            return Err(SerialError::MalformedPayload(marker));
        }
        let version = reader.read_bits(VERSION_BITS)?;

        let mut item = Item {
            version,
            serial_version: envelope.version,
            raw: serial.to_vec(),
            ..Item::default()
        };
        item.balance = self.read_identifier(&mut reader, BALANCE_CATEGORY, version)?;
        item.inv_data = self.read_identifier(&mut reader, INVENTORY_CATEGORY, version)?;
        item.manufacturer = self.read_identifier(&mut reader, MANUFACTURER_CATEGORY, version)?;
        item.level = reader.read_bits(LEVEL_BITS)? as u8;

        let mut warning = None;
        match self.catalog.balance_category(&item.balance) {
            Some(category) => {
                let part_bits = self.width(category, version)?;
                let part_count = reader.read_bits(PART_COUNT_BITS)?;
                for _ in 0..part_count {
                    let part = self.read_indexed(&mut reader, category, part_bits)?;
                    item.parts.push(part);
                }

                let generic_count = reader.read_bits(GENERIC_COUNT_BITS)?;
                let generic_bits = self.width(GENERIC_PART_CATEGORY, version)?;
                for _ in 0..generic_count {
                    let generic =
                        self.read_indexed(&mut reader, GENERIC_PART_CATEGORY, generic_bits)?;
                    item.generics.push(generic);
                }

                item.overflow = reader.tail();
            }
            None => {
                warn!(
                    balance = %item.balance,
                    "unknown part category, skipping introspection"
                );
                item.skip_introspection = true;
                warning = Some(DecodeWarning::UnknownCategory {
                    balance: item.balance.clone(),
                });
            }
        }

        debug!(
            level = item.level,
            version = item.version,
            parts = item.parts.len(),
            generics = item.generics.len(),
            "decoded item serial"
        );
        Ok(DecodedItem {
            item,
            seed: envelope.seed,
            warning,
        })
    }

    /// Encode an item back into a complete serial with the given seed.
    ///
    /// Fields are prepended in reverse wire order onto the preserved overflow
    /// tail, so the finalized payload reads back exactly as `decode` expects.
    pub fn encode(&self, item: &Item, seed: i32) -> Result<Vec<u8>> {
        if item.skip_introspection {
            debug!("skip-introspection item, emitting stored raw serial");
            return Ok(item.raw.clone());
        }

        let mut writer = BitWriter::with_tail(&item.overflow);

        let generic_bits = self.width(GENERIC_PART_CATEGORY, item.version)?;
        for generic in item.generics.iter().rev() {
            let index = self.index_of(GENERIC_PART_CATEGORY, generic)?;
            writer.prepend(index as u64 + 1, generic_bits)?;
        }
        writer.prepend(item.generics.len() as u64, GENERIC_COUNT_BITS)?;

        if let Some(category) = self.catalog.balance_category(&item.balance) {
            let part_bits = self.width(category, item.version)?;
            for part in item.parts.iter().rev() {
                let index = self.index_of(category, part)?;
                writer.prepend(index as u64 + 1, part_bits)?;
            }
            writer.prepend(item.parts.len() as u64, PART_COUNT_BITS)?;
        }

        writer.prepend(item.level as u64, LEVEL_BITS)?;
        for (category, identifier) in [
            (MANUFACTURER_CATEGORY, &item.manufacturer),
            (INVENTORY_CATEGORY, &item.inv_data),
            (BALANCE_CATEGORY, &item.balance),
        ] {
            let bits = self.width(category, item.version)?;
            let index = self.index_of(category, identifier)?;
            writer.prepend(index as u64 + 1, bits)?;
        }
        writer.prepend(item.version, VERSION_BITS)?;
        writer.prepend(PAYLOAD_MARKER, MARKER_BITS)?;

        Ok(Envelope::encode(
            &writer.finalize(),
            seed,
            item.serial_version,
        ))
    }

    /// Decode a whole batch, never aborting on individual failures.
    pub fn decode_batch<I, B>(&self, serials: I) -> BatchDecode
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut batch = BatchDecode::default();
        for (index, serial) in serials.into_iter().enumerate() {
            match self.decode(serial.as_ref()) {
                Ok(decoded) => batch.items.push(decoded),
                Err(error) => {
                    warn!(index, %error, "failed to decode serial in batch");
                    batch.failures.push(BatchFailure { index, error });
                }
            }
        }
        batch
    }

    fn width(&self, category: &str, version: u64) -> Result<usize> {
        self.catalog
            .bit_width(category, version)
            .ok_or_else(|| SerialError::UnknownCategory(category.to_string()))
    }

    /// Read one index field of `bits` width and resolve it through the
    /// catalog. The wire value is index+1; an unresolvable index becomes the
    /// empty identifier rather than an error.
    fn read_indexed(
        &self,
        reader: &mut BitReader<'_>,
        category: &str,
        bits: usize,
    ) -> Result<String> {
        let index = reader.read_bits(bits)?.wrapping_sub(1);
        Ok(self
            .catalog
            .asset_at(category, index)
            .unwrap_or_default()
            .to_string())
    }

    fn read_identifier(
        &self,
        reader: &mut BitReader<'_>,
        category: &str,
        version: u64,
    ) -> Result<String> {
        let bits = self.width(category, version)?;
        self.read_indexed(reader, category, bits)
    }

    fn index_of(&self, category: &str, identifier: &str) -> Result<usize> {
        self.catalog
            .index_of(category, identifier)
            .ok_or_else(|| SerialError::UnknownAsset {
                category: category.to_string(),
                identifier: identifier.to_string(),
            })
    }
}
