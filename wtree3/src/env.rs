use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::error::{Error, Result};
use crate::registry::{ExtractorFn, ExtractorRegistry};

/// Default map size (1 GiB) used when a caller does not request one (spec §4.1).
pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;
/// Default maximum number of sub-trees (main trees plus index trees) an
/// environment reserves room for.
pub const DEFAULT_MAX_SUBTREES: u32 = 128;

/// The reserved sub-tree that backs every collection's persisted index
/// descriptors (spec §3, §6). Not reachable through `Collection`.
pub(crate) const META_DB_NAME: &str = "__wtree3_index_meta__";

/// Packs a `(major, minor)` schema version pair into the `u32` recorded in
/// every metadata record (spec §3/§4.1).
pub fn pack_version(major: u16, minor: u16) -> u32 {
    ((major as u32) << 16) | minor as u32
}

/// Unpacks a schema version back into `(major, minor)`.
pub fn unpack_version(version: u32) -> (u16, u16) {
    ((version >> 16) as u16, version as u16)
}

/// A `wtree3` environment: one open memory-mapped engine instance bound to a
/// single directory on disk (spec §4.1). Collections and their index
/// sub-trees all live inside the environment's single `heed::Env`.
#[derive(Debug)]
pub struct Environment {
    pub(crate) env: Env,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    pub(crate) registry: Arc<ExtractorRegistry>,
    schema_version: u32,
}

impl Environment {
    /// Opens (creating if necessary) the environment rooted at `path`.
    ///
    /// `map_size` and `max_subtrees` default to [`DEFAULT_MAP_SIZE`] and
    /// [`DEFAULT_MAX_SUBTREES`] respectively. `schema_version` is stamped
    /// into every metadata record written afterwards; it does not have to
    /// match a version already on disk (spec §4.1 leaves migration to the
    /// caller).
    pub fn open(
        path: impl AsRef<Path>,
        map_size: Option<usize>,
        max_subtrees: Option<u32>,
        schema_version: u32,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::einval(format!(
                "environment path {} is not an existing directory",
                path.display()
            )));
        }

        let mut options = EnvOpenOptions::new();
        options.map_size(map_size.unwrap_or(DEFAULT_MAP_SIZE));
        // +1 for the reserved metadata sub-tree.
        options.max_dbs(max_subtrees.unwrap_or(DEFAULT_MAX_SUBTREES) + 1);

        let env = unsafe { options.open(path)? };

        let mut wtxn = env.write_txn()?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB_NAME))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), schema_version, "environment opened");

        Ok(Environment { env, meta_db, registry: Arc::new(ExtractorRegistry::new()), schema_version })
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Registers `f` as the extractor for `(version, flags)` (spec §4.4).
    /// Must happen before any collection referencing that extractor id is
    /// opened in this process.
    pub fn register_extractor(&self, version: u32, flags: u8, f: ExtractorFn) -> Result<()> {
        self.registry.register(version, flags, f)
    }

    /// Flushes the memory map to disk. `force` mirrors LMDB's distinction
    /// between an explicit sync and one already implied by a durable commit;
    /// `wtree3` always commits durably, so this is primarily useful after a
    /// batch of writes made with relaxed durability at the OS level.
    pub fn sync(&self, _force: bool) -> Result<()> {
        self.env.force_sync()?;
        Ok(())
    }

    /// Grows the environment's memory map to `new_map_size` bytes. Must be
    /// called with no other transactions open in this process (spec §4.1,
    /// `MAP_FULL` recovery path).
    ///
    /// # Safety
    /// The caller must ensure no other transaction, in this process or any
    /// other mapping the same file, is active while the resize happens.
    pub unsafe fn resize(&self, new_map_size: usize) -> Result<()> {
        self.env.resize(new_map_size)?;
        Ok(())
    }

    /// Coarse environment-wide statistics (ambient feature, not in the
    /// distilled spec; mirrors `heed::Env::info`).
    pub fn stat(&self) -> EnvironmentStat {
        let info = self.env.info();
        EnvironmentStat {
            map_size: info.map_size,
            last_page_number: info.last_page_number,
            last_txn_id: info.last_txn_id,
            max_readers: info.maximum_number_of_readers,
            num_readers: info.number_of_readers,
        }
    }
}

/// Snapshot of environment-wide memory-map and transaction counters.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentStat {
    pub map_size: usize,
    pub last_page_number: usize,
    pub last_txn_id: usize,
    pub max_readers: u32,
    pub num_readers: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_packing_round_trips() {
        assert_eq!(unpack_version(pack_version(3, 7)), (3, 7));
        assert_eq!(pack_version(0, 0), 0);
    }

    #[test]
    fn open_rejects_missing_directory() {
        let err = Environment::open("/nonexistent/wtree3/path", None, None, 1).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Einval);
    }

    #[test]
    fn open_creates_meta_db() {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::open(dir.path(), Some(10 * 1024 * 1024), None, 1).unwrap();
        assert_eq!(env.schema_version(), 1);
    }
}
