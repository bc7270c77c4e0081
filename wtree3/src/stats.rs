use heed::types::Bytes;
use heed::Database;

use crate::collection::Collection;
use crate::error::Result;
use crate::txn::Transaction;

/// Size and cardinality statistics for one sub-tree, computed by a full scan
/// (spec §4.9, grounded on milli's `database_stats.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatabaseStats {
    number_of_entries: u64,
    total_key_size: u64,
    total_value_size: u64,
}

impl DatabaseStats {
    fn compute(database: Database<Bytes, Bytes>, rtxn: &heed::RoTxn<'_>) -> heed::Result<Self> {
        let mut stats = Self::default();
        let mut iter = database.iter(rtxn)?;
        while let Some((key, value)) = iter.next().transpose()? {
            stats.total_key_size += key.len() as u64;
            stats.total_value_size += value.len() as u64;
        }
        stats.number_of_entries = database.len(rtxn)?;
        Ok(stats)
    }

    pub fn number_of_entries(&self) -> u64 {
        self.number_of_entries
    }

    pub fn total_key_size(&self) -> u64 {
        self.total_key_size
    }

    pub fn total_value_size(&self) -> u64 {
        self.total_value_size
    }

    pub fn average_key_size(&self) -> u64 {
        self.total_key_size.checked_div(self.number_of_entries).unwrap_or(0)
    }

    pub fn average_value_size(&self) -> u64 {
        self.total_value_size.checked_div(self.number_of_entries).unwrap_or(0)
    }
}

/// Full-scan stats of a collection's main tree (spec §4.9). Not cheap; meant
/// for diagnostics, not the hot path.
pub fn collection_stats(collection: &Collection, txn: &Transaction) -> Result<DatabaseStats> {
    Ok(DatabaseStats::compute(collection.main_db, txn.as_ro())?)
}

/// Full-scan stats of one of a collection's index sub-trees (spec §4.9).
pub fn index_stats(collection: &Collection, index_name: &str, txn: &Transaction) -> Result<DatabaseStats> {
    let descriptor = collection
        .find_index(index_name)
        .ok_or_else(|| crate::error::Error::einval(format!("collection has no index named `{index_name}`")))?;
    Ok(DatabaseStats::compute(descriptor.db, txn.as_ro())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::index::IndexConfig;
    use crate::registry::ExtractResult;

    fn value_extractor(value: &[u8], _user_data: &[u8]) -> ExtractResult {
        ExtractResult::Key(value.to_vec())
    }

    #[test]
    fn collection_stats_reflect_contents() {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::open(dir.path(), Some(10 * 1024 * 1024), None, 1).unwrap();
        env.register_extractor(1, 0, value_extractor).unwrap();

        let mut txn = Transaction::begin(&env, true).unwrap();
        let mut collection = Collection::open(&env, &mut txn, "c", 0).unwrap();
        collection
            .add_index(
                &env,
                &mut txn,
                IndexConfig { name: "by_value".into(), version: 1, unique: false, sparse: false, user_data: Vec::new() },
            )
            .unwrap();
        collection.insert(&env, &mut txn, b"k1", b"hello").unwrap();
        collection.insert(&env, &mut txn, b"k2", b"world!").unwrap();

        let stats = collection_stats(&collection, &txn).unwrap();
        assert_eq!(stats.number_of_entries(), 2);
        assert_eq!(stats.total_key_size(), 4);
        assert_eq!(stats.total_value_size(), 11);

        let idx_stats = index_stats(&collection, "by_value", &txn).unwrap();
        assert_eq!(idx_stats.number_of_entries(), 2);
        txn.commit().unwrap();
    }

    #[test]
    fn index_stats_rejects_unknown_name() {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::open(dir.path(), Some(10 * 1024 * 1024), None, 1).unwrap();
        let mut txn = Transaction::begin(&env, true).unwrap();
        let collection = Collection::open(&env, &mut txn, "c", 0).unwrap();

        match index_stats(&collection, "missing", &txn) {
            Err(err) => assert_eq!(err.code, crate::error::ErrorCode::Einval),
            Ok(_) => panic!("expected unknown index to fail"),
        }
        txn.commit().unwrap();
    }
}
