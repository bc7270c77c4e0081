use heed::types::Bytes;
use heed::Database;

use crate::registry::ExtractorFn;

/// Caller input to [`crate::Collection::add_index`] (spec §4.3 step 1-6).
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub name: String,
    /// Schema version the extractor was registered under; persisted verbatim
    /// and doubles as the high 32 bits of the extractor id (spec §3, §9).
    pub version: u32,
    pub unique: bool,
    pub sparse: bool,
    pub user_data: Vec<u8>,
}

impl IndexConfig {
    pub fn flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.unique {
            flags |= crate::registry::FLAG_UNIQUE;
        }
        if self.sparse {
            flags |= crate::registry::FLAG_SPARSE;
        }
        flags
    }
}

/// In-memory descriptor for one secondary index (spec §3).
///
/// `extractor` is a weak link resolved through the environment's registry at
/// load time. When resolution fails — unregistered extractor, or a
/// persisted schema version that no longer matches the environment's — the
/// descriptor is kept in a "skipped" state: maintenance silently ignores it
/// and queries against it fail with [`crate::ErrorCode::NotFound`].
pub struct IndexDescriptor {
    pub name: String,
    pub(crate) sub_tree_name: String,
    pub(crate) db: Database<Bytes, Bytes>,
    pub(crate) extractor_id: u64,
    pub(crate) extractor: Option<ExtractorFn>,
    pub(crate) user_data: Vec<u8>,
    pub unique: bool,
    pub sparse: bool,
}

impl IndexDescriptor {
    pub fn is_skipped(&self) -> bool {
        self.extractor.is_none()
    }
}

/// The internal sub-tree name for a secondary index (spec §6).
pub(crate) fn sub_tree_name(collection: &str, index: &str) -> String {
    format!("idx:{collection}:{index}")
}

/// The metadata-subtree key for a secondary index's persisted descriptor
/// (spec §3).
pub(crate) fn meta_key(collection: &str, index: &str) -> Vec<u8> {
    format!("{collection}:{index}").into_bytes()
}

/// The metadata-subtree key prefix shared by every index of `collection`.
pub(crate) fn meta_prefix(collection: &str) -> Vec<u8> {
    format!("{collection}:").into_bytes()
}

/// Reserved index name used to persist a collection's entry counter in the
/// metadata sub-tree (spec §9, design notes option (a)). Not a real index:
/// `add_index` refuses this name.
pub(crate) const COUNT_INDEX_NAME: &str = "__count__";

pub(crate) fn count_key(collection: &str) -> Vec<u8> {
    meta_key(collection, COUNT_INDEX_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pack_unique_and_sparse() {
        let config = IndexConfig {
            name: "email_idx".into(),
            version: 1,
            unique: true,
            sparse: true,
            user_data: Vec::new(),
        };
        assert_eq!(config.flags(), crate::registry::FLAG_UNIQUE | crate::registry::FLAG_SPARSE);
    }

    #[test]
    fn sub_tree_and_meta_naming() {
        assert_eq!(sub_tree_name("users", "email_idx"), "idx:users:email_idx");
        assert_eq!(meta_key("users", "email_idx"), b"users:email_idx");
        assert_eq!(meta_prefix("users"), b"users:");
    }
}
