//! Asset catalog interface
//!
//! The field codec never owns asset data; it queries a catalog for ordered
//! asset lists, per-version index bit widths, and the balance-to-part-category
//! mapping. The catalog is read-only once built, so one instance can back any
//! number of concurrent codec calls.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Category holding item balance identifiers.
pub const BALANCE_CATEGORY: &str = "InventoryBalanceData";
/// Category holding inventory-data identifiers.
pub const INVENTORY_CATEGORY: &str = "InventoryData";
/// Category holding manufacturer identifiers.
pub const MANUFACTURER_CATEGORY: &str = "ManufacturerData";
/// Category holding generic (anointment-style) part identifiers.
pub const GENERIC_PART_CATEGORY: &str = "InventoryGenericPartData";

/// Read-only lookup interface consumed by the codec.
///
/// Lookup misses are plain `None`/`Option` values here; the codec converts
/// them into typed errors so callers can skip, log, or abort per item.
pub trait AssetCatalog {
    /// Number of bits needed to index `category`'s asset list at the given
    /// payload schema version. `None` if the category is unknown.
    fn bit_width(&self, category: &str, version: u64) -> Option<usize>;

    /// Resolve a 0-based index to an identifier. Out of range is `None`,
    /// never a panic; the decoder maps it to the empty identifier.
    fn asset_at(&self, category: &str, index: u64) -> Option<&str>;

    /// Reverse lookup, case-sensitive exact match.
    fn index_of(&self, category: &str, identifier: &str) -> Option<usize>;

    /// Part category for a balance identifier, matched case-insensitively.
    fn balance_category(&self, balance: &str) -> Option<&str>;
}

impl<C: AssetCatalog + ?Sized> AssetCatalog for &C {
    fn bit_width(&self, category: &str, version: u64) -> Option<usize> {
        (**self).bit_width(category, version)
    }
    fn asset_at(&self, category: &str, index: u64) -> Option<&str> {
        (**self).asset_at(category, index)
    }
    fn index_of(&self, category: &str, identifier: &str) -> Option<usize> {
        (**self).index_of(category, identifier)
    }
    fn balance_category(&self, balance: &str) -> Option<&str> {
        (**self).balance_category(balance)
    }
}

impl<C: AssetCatalog + ?Sized> AssetCatalog for Arc<C> {
    fn bit_width(&self, category: &str, version: u64) -> Option<usize> {
        (**self).bit_width(category, version)
    }
    fn asset_at(&self, category: &str, index: u64) -> Option<&str> {
        (**self).asset_at(category, index)
    }
    fn index_of(&self, category: &str, identifier: &str) -> Option<usize> {
        (**self).index_of(category, identifier)
    }
    fn balance_category(&self, balance: &str) -> Option<&str> {
        (**self).balance_category(balance)
    }
}

/// One entry of a category's bit-width table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidthEntry {
    /// First payload schema version this width applies to.
    pub version: u64,
    /// Index width in bits.
    pub bits: usize,
}

/// Ordered asset list plus its per-version width table.
///
/// The shape matches the extracted parts-database entries: an ordered
/// identifier list and width entries sorted by ascending version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryData {
    pub assets: Vec<String>,
    pub versions: Vec<WidthEntry>,
}

impl CategoryData {
    /// Width at `version`: the last entry with `version <= requested`, with
    /// the first entry acting as the floor for older versions.
    fn bits_at(&self, version: u64) -> Option<usize> {
        let mut bits = self.versions.first()?.bits;
        for entry in &self.versions {
            if entry.version > version {
                break;
            }
            bits = entry.bits;
        }
        Some(bits)
    }
}

/// In-memory [`AssetCatalog`] implementation.
///
/// Built explicitly and handed to the codec; there is no process-global
/// catalog. Balance keys in the part-category map are stored lowercased, and
/// queries lowercase the incoming identifier, so the mapping is
/// case-insensitive regardless of how the catalog data was cased.
#[derive(Debug, Clone, Default)]
pub struct PartsDatabase {
    categories: HashMap<String, CategoryData>,
    balance_categories: HashMap<String, String>,
}

impl PartsDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a category's asset list and width table.
    pub fn insert_category(&mut self, name: impl Into<String>, data: CategoryData) -> &mut Self {
        self.categories.insert(name.into(), data);
        self
    }

    /// Map a balance identifier to its part category.
    pub fn map_balance(
        &mut self,
        balance: impl AsRef<str>,
        category: impl Into<String>,
    ) -> &mut Self {
        self.balance_categories
            .insert(balance.as_ref().to_lowercase(), category.into());
        self
    }

    /// Build from pre-assembled maps (e.g. deserialized fixture data).
    pub fn from_parts(
        categories: HashMap<String, CategoryData>,
        balance_categories: HashMap<String, String>,
    ) -> Self {
        let balance_categories = balance_categories
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        PartsDatabase {
            categories,
            balance_categories,
        }
    }

    pub fn category(&self, name: &str) -> Option<&CategoryData> {
        self.categories.get(name)
    }
}

impl AssetCatalog for PartsDatabase {
    fn bit_width(&self, category: &str, version: u64) -> Option<usize> {
        self.categories.get(category)?.bits_at(version)
    }

    fn asset_at(&self, category: &str, index: u64) -> Option<&str> {
        let assets = &self.categories.get(category)?.assets;
        usize::try_from(index)
            .ok()
            .and_then(|i| assets.get(i))
            .map(String::as_str)
    }

    fn index_of(&self, category: &str, identifier: &str) -> Option<usize> {
        self.categories
            .get(category)?
            .assets
            .iter()
            .position(|asset| asset == identifier)
    }

    fn balance_category(&self, balance: &str) -> Option<&str> {
        self.balance_categories
            .get(&balance.to_lowercase())
            .map(String::as_str)
    }
}
