use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, Result};

/// Bit 0 of an extractor id's flag byte: at most one main-tree key may bind
/// to a given index key.
pub const FLAG_UNIQUE: u8 = 0x01;
/// Bit 1: the extractor may skip a record (the indexed field is absent).
pub const FLAG_SPARSE: u8 = 0x02;

/// What an extractor does with one `(value, user_data)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractResult {
    /// The derived index key.
    Key(Vec<u8>),
    /// Skip this record — only meaningful for sparse indexes (§4.4).
    Skip,
}

/// A pure, deterministic function from `(value, user_data)` to an index key
/// or a skip decision (spec §4.4). Given the same inputs it must always
/// return the same output, or index consistency breaks (a record would emit
/// different keys on insert versus delete).
pub type ExtractorFn = fn(value: &[u8], user_data: &[u8]) -> ExtractResult;

/// Packs a schema version and flag byte into the 64-bit id persisted
/// alongside every index descriptor (spec §3, GLOSSARY).
pub fn extractor_id(version: u32, flags: u8) -> u64 {
    ((version as u64) << 32) | (flags as u64)
}

/// Process-private mapping from extractor id to extractor function.
///
/// Populated by the caller after opening an environment and before opening
/// any collection whose persisted indexes reference those extractors.
#[derive(Default, Debug)]
pub struct ExtractorRegistry {
    functions: RwLock<HashMap<u64, ExtractorFn>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        ExtractorRegistry { functions: RwLock::new(HashMap::new()) }
    }

    /// Registers `f` under `(version, flags)`. Redefining a persisted
    /// extractor id is a configuration bug, so this refuses to replace an
    /// existing registration.
    pub fn register(&self, version: u32, flags: u8, f: ExtractorFn) -> Result<()> {
        let id = extractor_id(version, flags);
        let mut functions = self.functions.write().unwrap();
        if functions.contains_key(&id) {
            return Err(Error::einval(format!(
                "extractor id {id:#x} (version {version}, flags {flags:#x}) is already registered"
            )));
        }
        functions.insert(id, f);
        Ok(())
    }

    pub fn lookup(&self, id: u64) -> Option<ExtractorFn> {
        self.functions.read().unwrap().get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email_extractor(_value: &[u8], _user_data: &[u8]) -> ExtractResult {
        ExtractResult::Skip
    }

    #[test]
    fn packs_version_and_flags() {
        assert_eq!(extractor_id(1, FLAG_UNIQUE), (1u64 << 32) | 0x01);
        assert_eq!(extractor_id(1, FLAG_UNIQUE | FLAG_SPARSE), (1u64 << 32) | 0x03);
    }

    #[test]
    fn refuses_duplicate_registration() {
        let registry = ExtractorRegistry::new();
        registry.register(1, FLAG_UNIQUE, email_extractor).unwrap();
        let err = registry.register(1, FLAG_UNIQUE, email_extractor).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Einval);
    }

    #[test]
    fn lookup_misses_unregistered_id() {
        let registry = ExtractorRegistry::new();
        assert!(registry.lookup(extractor_id(9, 0)).is_none());
    }
}
