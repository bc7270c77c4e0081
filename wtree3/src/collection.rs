use byteorder::{ByteOrder, LittleEndian};
use heed::types::Bytes;
use heed::{Database, DatabaseFlags};

use crate::env::Environment;
use crate::error::{Error, ErrorCode, Result};
use crate::index::{self, IndexConfig, IndexDescriptor, COUNT_INDEX_NAME};
use crate::maintenance::{indexes_delete, indexes_insert};
use crate::meta::MetadataRecord;
use crate::registry::extractor_id;
use crate::txn::Transaction;

/// `(existing, new, user_data) -> merged`, used by [`Collection::upsert`]
/// when an update would otherwise just overwrite the old value (spec §4.6,
/// §9 "merge function as behavior object").
pub type MergeFn = fn(old: &[u8], new: &[u8], user: &[u8]) -> Option<Vec<u8>>;

/// A named main sub-tree plus its secondary indexes and entry counter
/// (spec §3, §4.3).
pub struct Collection {
    name: String,
    pub(crate) main_db: Database<Bytes, Bytes>,
    indexes: Vec<IndexDescriptor>,
    merge_fn: Option<MergeFn>,
    merge_user_data: Vec<u8>,
}

impl Collection {
    /// Opens (creating if missing) the main sub-tree named `name`, then
    /// walks the metadata sub-tree loading every persisted index (spec
    /// §4.3). `initial_count` seeds the entry counter only the first time
    /// the collection is opened; later opens read the persisted value.
    pub fn open(env: &Environment, txn: &mut Transaction, name: &str, initial_count: u64) -> Result<Self> {
        let wtxn = txn.as_rw_mut()?;
        let main_db: Database<Bytes, Bytes> = env.env.create_database(wtxn, Some(name))?;

        let count_key = index::count_key(name);
        if env.meta_db.get(wtxn, &count_key)?.is_none() {
            let mut buf = [0u8; 8];
            LittleEndian::write_u64(&mut buf, initial_count);
            env.meta_db.put(wtxn, &count_key, &buf)?;
        }

        let prefix = index::meta_prefix(name);
        let raw_records: Vec<(String, Vec<u8>)> = env
            .meta_db
            .prefix_iter(wtxn, prefix.as_slice())?
            .map(|entry| {
                let (key, value) = entry?;
                Ok::<_, heed::Error>((
                    std::str::from_utf8(&key[prefix.len()..]).unwrap_or_default().to_string(),
                    value.to_vec(),
                ))
            })
            .collect::<heed::Result<_>>()?;

        let mut descriptors = Vec::new();
        for (index_name, value) in raw_records {
            if index_name == COUNT_INDEX_NAME {
                continue;
            }
            let record = MetadataRecord::decode(&value)?;

            let sub_tree_name = index::sub_tree_name(name, &index_name);
            let db: Database<Bytes, Bytes> = env.env.create_database(wtxn, Some(&sub_tree_name))?;

            let id = extractor_id(record.schema_version, record.flags);
            let extractor = if record.schema_version != env.schema_version() {
                tracing::warn!(
                    collection = name,
                    index = %index_name,
                    "index metadata schema version does not match environment; index skipped"
                );
                None
            } else {
                let resolved = env.registry.lookup(id);
                if resolved.is_none() {
                    tracing::warn!(
                        collection = name,
                        index = %index_name,
                        "no extractor registered for this index's id; index skipped"
                    );
                }
                resolved
            };

            descriptors.push(IndexDescriptor {
                name: index_name,
                sub_tree_name,
                db,
                extractor_id: id,
                extractor,
                user_data: record.user_data,
                unique: record.flags & crate::registry::FLAG_UNIQUE != 0,
                sparse: record.flags & crate::registry::FLAG_SPARSE != 0,
            });
        }

        Ok(Collection { name: name.to_string(), main_db, indexes: descriptors, merge_fn: None, merge_user_data: Vec::new() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural bulk delete: drops every index sub-tree and metadata
    /// record for `name`, then the main sub-tree, all in one write
    /// transaction (spec §4.3).
    ///
    /// The underlying engine does not expose removing a named sub-tree from
    /// its catalog, only clearing its contents; a dropped collection's name
    /// therefore still occupies a slot counted against `max_subtrees` for
    /// the life of the environment (documented simplification, see
    /// DESIGN.md).
    pub fn drop_collection(env: &Environment, txn: &mut Transaction, name: &str) -> Result<()> {
        let wtxn = txn.as_rw_mut()?;

        let prefix = index::meta_prefix(name);
        let mut to_clear = Vec::new();
        let mut to_remove_meta = Vec::new();
        for entry in env.meta_db.prefix_iter(wtxn, prefix.as_slice())? {
            let (key, _) = entry?;
            to_remove_meta.push(key.to_vec());
            if key != index::count_key(name).as_slice() {
                let index_name = std::str::from_utf8(&key[prefix.len()..]).unwrap_or_default();
                to_clear.push(index::sub_tree_name(name, index_name));
            }
        }

        for sub_tree in to_clear {
            let db: Database<Bytes, Bytes> = env.env.create_database(wtxn, Some(&sub_tree))?;
            db.clear(wtxn)?;
        }
        for key in to_remove_meta {
            env.meta_db.delete(wtxn, &key)?;
        }

        let main_db: Database<Bytes, Bytes> = env.env.create_database(wtxn, Some(name))?;
        main_db.clear(wtxn)?;
        Ok(())
    }

    pub fn exists(env: &Environment, txn: &Transaction, name: &str) -> Result<bool> {
        Ok(env.env.open_database::<Bytes, Bytes>(txn.as_ro(), Some(name))?.is_some())
    }

    pub fn count(&self, env: &Environment, txn: &Transaction) -> Result<u64> {
        let key = index::count_key(&self.name);
        match env.meta_db.get(txn.as_ro(), &key)? {
            Some(bytes) => Ok(LittleEndian::read_u64(bytes)),
            None => Ok(0),
        }
    }

    fn set_count(&self, env: &Environment, wtxn: &mut heed::RwTxn, value: u64) -> Result<()> {
        let key = index::count_key(&self.name);
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        env.meta_db.put(wtxn, &key, &buf)?;
        Ok(())
    }

    pub(crate) fn adjust_count(&self, env: &Environment, wtxn: &mut heed::RwTxn, delta: i64) -> Result<()> {
        let current = {
            let key = index::count_key(&self.name);
            match env.meta_db.get(wtxn, &key)? {
                Some(bytes) => LittleEndian::read_u64(bytes),
                None => 0,
            }
        };
        let updated = if delta.is_negative() {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current + delta as u64
        };
        self.set_count(env, wtxn, updated)
    }

    /// Sets the merge function used by [`Collection::upsert`] when updating
    /// an existing key. Not persisted: callers re-attach it after every
    /// open (spec §9).
    pub fn set_merge_fn(&mut self, f: MergeFn, user_data: Vec<u8>) {
        self.merge_fn = Some(f);
        self.merge_user_data = user_data;
    }

    /// Attaches a custom key comparator, permitted only before any record
    /// has been inserted (spec §4.3, §9 Open Question). `heed` binds a
    /// sub-tree's ordering to the compile-time `Comparator` type parameter
    /// of its `Database`, not to a runtime function pointer, so a true
    /// per-collection custom comparator cannot be installed through its
    /// safe public API; this always rejects with `Einval` rather than
    /// silently keeping byte-lexicographic order while claiming otherwise.
    pub fn set_compare(&mut self, env: &Environment, txn: &Transaction, _compare: fn(&[u8], &[u8]) -> std::cmp::Ordering) -> Result<()> {
        if self.count(env, txn)? != 0 {
            return Err(Error::einval("set_compare must be called before any record is inserted"));
        }
        Err(Error::einval("custom key comparators are not supported: heed ties ordering to a compile-time type, not a runtime function"))
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|d| d.name == name)
    }

    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    pub(crate) fn indexes(&self) -> &[IndexDescriptor] {
        &self.indexes
    }

    pub(crate) fn find_index(&self, name: &str) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|d| d.name == name)
    }

    /// Adds a new, initially empty secondary index (spec §4.3). Callers
    /// that need pre-existing records indexed must follow up with
    /// [`Collection::populate_index`].
    pub fn add_index(&mut self, env: &Environment, txn: &mut Transaction, config: IndexConfig) -> Result<()> {
        if config.name == COUNT_INDEX_NAME {
            return Err(Error::einval("index name `__count__` is reserved"));
        }
        if self.has_index(&config.name) {
            return Err(Error::einval(format!("collection already has an index named `{}`", config.name)));
        }

        let wtxn = txn.as_rw_mut()?;
        let sub_tree_name = index::sub_tree_name(&self.name, &config.name);

        let db: Database<Bytes, Bytes> = env
            .env
            .database_options()
            .types::<Bytes, Bytes>()
            .name(&sub_tree_name)
            .flags(DatabaseFlags::DUP_SORT)
            .create(wtxn)?;

        let flags = config.flags();
        let id = extractor_id(config.version, flags);
        let extractor = match env.registry.lookup(id) {
            Some(f) => f,
            None => {
                // Step 2 already created the sub-tree; the engine has no way to
                // remove a name from its catalog, so the best available rollback
                // is clearing it back to empty (spec §4.3, same limitation as
                // `drop_collection`). Metadata is never written for this index.
                db.clear(wtxn)?;
                return Err(Error::einval(format!(
                    "no extractor registered for (version={}, flags={flags:#x})",
                    config.version
                )));
            }
        };

        let record = MetadataRecord { schema_version: config.version, flags, user_data: config.user_data.clone() };
        let meta_key = index::meta_key(&self.name, &config.name);
        env.meta_db.put(wtxn, &meta_key, &record.encode())?;

        self.indexes.push(IndexDescriptor {
            name: config.name,
            sub_tree_name,
            db,
            extractor_id: id,
            extractor: Some(extractor),
            user_data: config.user_data,
            unique: config.unique,
            sparse: config.sparse,
        });
        Ok(())
    }

    /// Drops an index's sub-tree, metadata record, and in-memory descriptor
    /// (spec §4.3).
    pub fn drop_index(&mut self, env: &Environment, txn: &mut Transaction, name: &str) -> Result<()> {
        let position = self.indexes.iter().position(|d| d.name == name).ok_or_else(Error::not_found)?;
        let wtxn = txn.as_rw_mut()?;

        self.indexes[position].db.clear(wtxn)?;
        let meta_key = index::meta_key(&self.name, name);
        env.meta_db.delete(wtxn, &meta_key)?;

        self.indexes.remove(position);
        Ok(())
    }

    /// Scans the main tree inside a single write transaction, indexing
    /// every existing record under `name` (spec §4.3). A unique-constraint
    /// violation aborts the whole scan so the index remains untouched.
    pub fn populate_index(&mut self, _env: &Environment, txn: &mut Transaction, name: &str) -> Result<()> {
        let position = self.indexes.iter().position(|d| d.name == name).ok_or_else(Error::not_found)?;
        let wtxn = txn.as_rw_mut()?;

        let entries: Vec<(Vec<u8>, Vec<u8>)> =
            self.main_db.iter(wtxn)?.map(|r| r.map(|(k, v)| (k.to_vec(), v.to_vec()))).collect::<heed::Result<_>>()?;

        let descriptor = std::slice::from_ref(&self.indexes[position]);
        for (key, value) in entries {
            indexes_insert(wtxn, descriptor, &key, &value)?;
        }
        Ok(())
    }

    /// Read-only cross-check of the four consistency invariants (spec
    /// §4.11, §8). Delegates to [`crate::verify::verify`].
    pub fn verify(&self, env: &Environment, txn: &Transaction) -> Result<()> {
        crate::verify::verify(env, self, txn)
    }

    /// Opens an iterator over the main tree, bound to `txn`. A write
    /// transaction lets [`crate::Iter::delete`] maintain indexes and the
    /// entry counter (spec §4.8).
    pub fn iter<'e, 't>(&'t self, env: &'t Environment, txn: &'t mut Transaction<'e>) -> crate::Iter<'e, 't> {
        crate::iter::Iter::new_borrowed(self.main_db, false, txn, Some((env, self)))
    }

    /// Zero-copy lookup, valid for the lifetime of `txn` (spec §4.6).
    pub fn get<'txn>(&self, txn: &'txn Transaction, key: &[u8]) -> Result<Option<&'txn [u8]>> {
        Ok(self.main_db.get(txn.as_ro(), key)?)
    }

    /// Convenience variant that copies the result into an owned buffer.
    pub fn get_owned(&self, txn: &Transaction, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.get(txn, key)?.map(|v| v.to_vec()))
    }

    /// (1) `indexes_insert`; (2) put into the main tree with
    /// must-not-overwrite; (3) increment the counter (spec §4.6).
    pub fn insert(&self, env: &Environment, txn: &mut Transaction, key: &[u8], value: &[u8]) -> Result<()> {
        let wtxn = txn.as_rw_mut()?;
        indexes_insert(wtxn, &self.indexes, key, value)?;
        match self.main_db.put_with_flags(wtxn, heed::PutFlags::NO_OVERWRITE, key, value) {
            Ok(()) => {}
            Err(heed::Error::Mdb(heed::MdbError::KeyExist)) => {
                return Err(Error::code(ErrorCode::KeyExists));
            }
            Err(other) => return Err(other.into()),
        }
        self.adjust_count(env, wtxn, 1)
    }

    /// (1) fetch old value, not-found propagates; (2) `indexes_delete`
    /// (old); (3) `indexes_insert` (new); (4) put into the main tree (spec
    /// §4.6). The counter is unchanged.
    pub fn update(&self, _env: &Environment, txn: &mut Transaction, key: &[u8], new_value: &[u8]) -> Result<()> {
        let wtxn = txn.as_rw_mut()?;
        let old_value = self.main_db.get(wtxn, key)?.map(|v| v.to_vec()).ok_or_else(Error::not_found)?;

        indexes_delete(wtxn, &self.indexes, key, &old_value)?;
        indexes_insert(wtxn, &self.indexes, key, new_value)?;
        self.main_db.put(wtxn, key, new_value)?;
        Ok(())
    }

    /// Insert-or-merge-then-update (spec §4.6). With no key present,
    /// delegates to [`Collection::insert`]. With a key present and a merge
    /// function set, `merged = merge(old, new, user)`; a `None` result is a
    /// user-reported failure. Otherwise `merged = new`.
    pub fn upsert(&self, env: &Environment, txn: &mut Transaction, key: &[u8], new_value: &[u8]) -> Result<()> {
        let existing = {
            let wtxn = txn.as_rw_mut()?;
            self.main_db.get(wtxn, key)?.map(|v| v.to_vec())
        };

        let Some(old_value) = existing else {
            return self.insert(env, txn, key, new_value);
        };

        let merged = match self.merge_fn {
            Some(merge) => merge(&old_value, new_value, &self.merge_user_data)
                .ok_or_else(|| Error::index_error("merge function reported failure"))?,
            None => new_value.to_vec(),
        };

        let wtxn = txn.as_rw_mut()?;
        indexes_delete(wtxn, &self.indexes, key, &old_value)?;
        indexes_insert(wtxn, &self.indexes, key, &merged)?;
        self.main_db.put(wtxn, key, &merged)?;
        Ok(())
    }

    /// Fetches the current value. If absent, returns `Ok(false)` ("deleted
    /// = false", not an error). Otherwise removes it from every index and
    /// the main tree and decrements the counter (spec §4.6).
    pub fn delete(&self, env: &Environment, txn: &mut Transaction, key: &[u8]) -> Result<bool> {
        let wtxn = txn.as_rw_mut()?;
        let Some(value) = self.main_db.get(wtxn, key)?.map(|v| v.to_vec()) else {
            return Ok(false);
        };

        indexes_delete(wtxn, &self.indexes, key, &value)?;
        self.main_db.delete(wtxn, key)?;
        self.adjust_count(env, wtxn, -1)?;
        Ok(true)
    }

    /// Sequential application of [`Collection::insert`]; the first failure
    /// aborts and propagates (spec §4.6).
    pub fn insert_batch(&self, env: &Environment, txn: &mut Transaction, entries: &[(&[u8], &[u8])]) -> Result<()> {
        for (key, value) in entries {
            self.insert(env, txn, key, value)?;
        }
        Ok(())
    }

    /// Sequential application of [`Collection::upsert`] (spec §4.6).
    pub fn upsert_batch(&self, env: &Environment, txn: &mut Transaction, entries: &[(&[u8], &[u8])]) -> Result<()> {
        for (key, value) in entries {
            self.upsert(env, txn, key, value)?;
        }
        Ok(())
    }

    /// Atomic read-modify-write (spec §4.6). `f` receives the current value
    /// (`None` if absent) and returns the new one (`None` to delete/no-op).
    pub fn modify(
        &self,
        env: &Environment,
        txn: &mut Transaction,
        key: &[u8],
        f: impl FnOnce(Option<&[u8]>) -> Option<Vec<u8>>,
    ) -> Result<()> {
        let existing = {
            let wtxn = txn.as_rw_mut()?;
            self.main_db.get(wtxn, key)?.map(|v| v.to_vec())
        };

        match (existing.as_deref(), f(existing.as_deref())) {
            (None, None) => Ok(()),
            (None, Some(value)) => self.insert(env, txn, key, &value),
            (Some(old), None) => {
                let wtxn = txn.as_rw_mut()?;
                indexes_delete(wtxn, &self.indexes, key, old)?;
                self.main_db.delete(wtxn, key)?;
                self.adjust_count(env, wtxn, -1)
            }
            (Some(old), Some(new)) => {
                let wtxn = txn.as_rw_mut()?;
                indexes_delete(wtxn, &self.indexes, key, old)?;
                indexes_insert(wtxn, &self.indexes, key, &new)?;
                self.main_db.put(wtxn, key, &new)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ExtractResult;

    fn open_env() -> (tempfile::TempDir, Environment) {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::open(dir.path(), Some(10 * 1024 * 1024), None, 1).unwrap();
        (dir, env)
    }

    fn email_extractor(value: &[u8], _user_data: &[u8]) -> ExtractResult {
        if value.is_empty() {
            ExtractResult::Skip
        } else {
            ExtractResult::Key(value.to_vec())
        }
    }

    #[test]
    fn insert_get_delete_round_trip() {
        let (_dir, env) = open_env();
        let mut txn = Transaction::begin(&env, true).unwrap();
        let collection = Collection::open(&env, &mut txn, "users", 0).unwrap();

        collection.insert(&env, &mut txn, b"u1", b"alice").unwrap();
        assert_eq!(collection.get_owned(&txn, b"u1").unwrap(), Some(b"alice".to_vec()));
        assert_eq!(collection.count(&env, &txn).unwrap(), 1);

        assert!(collection.delete(&env, &mut txn, b"u1").unwrap());
        assert_eq!(collection.get_owned(&txn, b"u1").unwrap(), None);
        assert_eq!(collection.count(&env, &txn).unwrap(), 0);
        assert!(!collection.delete(&env, &mut txn, b"u1").unwrap());
        txn.commit().unwrap();
    }

    #[test]
    fn insert_duplicate_key_fails() {
        let (_dir, env) = open_env();
        let mut txn = Transaction::begin(&env, true).unwrap();
        let collection = Collection::open(&env, &mut txn, "users", 0).unwrap();
        collection.insert(&env, &mut txn, b"u1", b"alice").unwrap();
        let err = collection.insert(&env, &mut txn, b"u1", b"bob").unwrap_err();
        assert_eq!(err.code, ErrorCode::KeyExists);
        txn.commit().unwrap();
    }

    #[test]
    fn unique_index_rejection_scenario() {
        let (_dir, env) = open_env();
        env.register_extractor(1, crate::registry::FLAG_UNIQUE, email_extractor).unwrap();

        let mut txn = Transaction::begin(&env, true).unwrap();
        let mut collection = Collection::open(&env, &mut txn, "users", 0).unwrap();
        collection
            .add_index(
                &env,
                &mut txn,
                IndexConfig { name: "email_idx".into(), version: 1, unique: true, sparse: false, user_data: Vec::new() },
            )
            .unwrap();

        collection.insert(&env, &mut txn, b"u1", b"a@x").unwrap();
        assert_eq!(collection.count(&env, &txn).unwrap(), 1);

        let err = collection.insert(&env, &mut txn, b"u2", b"a@x").unwrap_err();
        assert_eq!(err.code, ErrorCode::IndexError);
        assert_eq!(collection.count(&env, &txn).unwrap(), 1);
        assert_eq!(collection.get_owned(&txn, b"u2").unwrap(), None);
        txn.commit().unwrap();
    }

    #[test]
    fn sparse_extractor_skips_empty_value() {
        let (_dir, env) = open_env();
        env.register_extractor(1, crate::registry::FLAG_SPARSE, email_extractor).unwrap();

        let mut txn = Transaction::begin(&env, true).unwrap();
        let mut collection = Collection::open(&env, &mut txn, "users", 0).unwrap();
        collection
            .add_index(
                &env,
                &mut txn,
                IndexConfig { name: "email_idx".into(), version: 1, unique: false, sparse: true, user_data: Vec::new() },
            )
            .unwrap();

        collection.insert(&env, &mut txn, b"u1", b"").unwrap();
        collection.verify(&env, &txn).unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn add_index_with_unregistered_extractor_clears_the_sub_tree_and_skips_metadata() {
        let (_dir, env) = open_env();
        let mut txn = Transaction::begin(&env, true).unwrap();
        let mut collection = Collection::open(&env, &mut txn, "users", 0).unwrap();

        let err = collection
            .add_index(
                &env,
                &mut txn,
                IndexConfig { name: "email_idx".into(), version: 9, unique: false, sparse: false, user_data: Vec::new() },
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Einval);
        assert!(!collection.has_index("email_idx"));
        assert_eq!(collection.index_count(), 0);
        txn.commit().unwrap();

        // Re-registering and retrying must succeed against the same collection:
        // the failed attempt left no orphaned metadata or populated sub-tree behind.
        env.register_extractor(9, 0, email_extractor).unwrap();
        let mut txn = Transaction::begin(&env, true).unwrap();
        let mut collection = Collection::open(&env, &mut txn, "users", 0).unwrap();
        collection
            .add_index(
                &env,
                &mut txn,
                IndexConfig { name: "email_idx".into(), version: 9, unique: false, sparse: false, user_data: Vec::new() },
            )
            .unwrap();
        assert!(collection.has_index("email_idx"));
        txn.commit().unwrap();
    }

    #[test]
    fn add_index_rejects_duplicate_name() {
        let (_dir, env) = open_env();
        env.register_extractor(1, 0, email_extractor).unwrap();
        let mut txn = Transaction::begin(&env, true).unwrap();
        let mut collection = Collection::open(&env, &mut txn, "users", 0).unwrap();
        let config =
            || IndexConfig { name: "email_idx".into(), version: 1, unique: false, sparse: false, user_data: Vec::new() };
        collection.add_index(&env, &mut txn, config()).unwrap();
        let err = collection.add_index(&env, &mut txn, config()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Einval);
        txn.commit().unwrap();
    }

    #[test]
    fn persistence_round_trip_reopens_index() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = Environment::open(dir.path(), Some(10 * 1024 * 1024), None, 1).unwrap();
            env.register_extractor(1, 0, email_extractor).unwrap();
            let mut txn = Transaction::begin(&env, true).unwrap();
            let mut collection = Collection::open(&env, &mut txn, "users", 0).unwrap();
            collection
                .add_index(
                    &env,
                    &mut txn,
                    IndexConfig {
                        name: "email_idx".into(),
                        version: 1,
                        unique: false,
                        sparse: false,
                        user_data: b"email".to_vec(),
                    },
                )
                .unwrap();
            collection.insert(&env, &mut txn, b"u1", b"a@x").unwrap();
            txn.commit().unwrap();
        }
        {
            let env = Environment::open(dir.path(), Some(10 * 1024 * 1024), None, 1).unwrap();
            env.register_extractor(1, 0, email_extractor).unwrap();
            let mut txn = Transaction::begin(&env, true).unwrap();
            let collection = Collection::open(&env, &mut txn, "users", 0).unwrap();
            assert!(collection.has_index("email_idx"));
            assert_eq!(collection.count(&env, &txn).unwrap(), 1);
            collection.verify(&env, &txn).unwrap();
            txn.commit().unwrap();
        }
    }

    #[test]
    fn set_compare_rejects_populated_collection() {
        let (dir, env) = open_env();
        let mut txn = Transaction::begin(&env, true).unwrap();
        let mut collection = Collection::open(&env, &mut txn, "c", 0).unwrap();
        collection.insert(&env, &mut txn, b"a", b"1").unwrap();

        let err = collection.set_compare(&env, &txn, |a, b| a.cmp(b)).unwrap_err();
        assert_eq!(err.code, ErrorCode::Einval);
        txn.commit().unwrap();
        drop(dir);
    }

    #[test]
    fn set_compare_on_empty_collection_reports_unsupported() {
        let (_dir, env) = open_env();
        let mut txn = Transaction::begin(&env, true).unwrap();
        let mut collection = Collection::open(&env, &mut txn, "c", 0).unwrap();

        let err = collection.set_compare(&env, &txn, |a, b| a.cmp(b)).unwrap_err();
        assert_eq!(err.code, ErrorCode::Einval);
        txn.commit().unwrap();
    }
}
