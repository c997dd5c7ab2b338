//! Cache entry wrapper with size estimation

use crate::models::CatalogItem;

/// One resident cache entry: the item plus the size estimate it was
/// admitted under
///
/// The estimate is frozen at insertion time so the accounting that added
/// it is the same accounting that removes it, whatever the item's variants
/// claim later.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub item: CatalogItem,
    pub estimated_bytes: u64,
}

impl CacheEntry {
    /// Build an entry, estimating size from the item's declared variant
    /// sizes with `fallback_bytes` for items that declare none
    pub fn new(item: CatalogItem, fallback_bytes: u64) -> Self {
        let estimated_bytes = item.images.estimated_size_bytes(fallback_bytes);
        Self {
            item,
            estimated_bytes,
        }
    }
}
