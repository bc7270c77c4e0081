use crate::collection::Collection;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::registry::ExtractResult;
use crate::txn::Transaction;

/// Read-only cross-check of the four consistency invariants (spec §4.11,
/// §8 invariants 2-4). Reports the first inconsistency found, naming the
/// offending index.
pub(crate) fn verify(env: &Environment, collection: &Collection, txn: &Transaction) -> Result<()> {
    let rtxn = txn.as_ro();
    let _ = env;

    for descriptor in collection.indexes() {
        let Some(extractor) = descriptor.extractor else {
            continue;
        };
        tracing::trace!(index = %descriptor.name, extractor_id = descriptor.extractor_id, "verifying index");

        // (a) every non-sparse main-tree record is present in the index.
        for entry in collection.main_db.iter(rtxn)? {
            let (main_key, value) = entry?;
            match extractor(value, &descriptor.user_data) {
                ExtractResult::Skip => {
                    if !descriptor.sparse {
                        return Err(Error::index_error(format!(
                            "index `{}` (sub-tree `{}`): record with main key {main_key:?} was skipped by a non-sparse extractor",
                            descriptor.name, descriptor.sub_tree_name
                        )));
                    }
                }
                ExtractResult::Key(index_key) => {
                    let bound = descriptor.db.get_duplicates(rtxn, index_key.as_slice())?;
                    let found = match bound {
                        Some(mut iter) => iter.any(|r| matches!(r, Ok((_, mk)) if mk == main_key)),
                        None => false,
                    };
                    if !found {
                        return Err(Error::index_error(format!(
                            "index `{}`: missing expected entry for main key {main_key:?}",
                            descriptor.name
                        )));
                    }
                }
            }
        }

        // (b) + (c): every index entry points to an existing, matching main-tree record.
        let mut last_index_key: Option<Vec<u8>> = None;
        let mut keys_for_last: usize = 0;
        for entry in descriptor.db.iter(rtxn)? {
            let (index_key, main_key) = entry?;
            let value = collection.main_db.get(rtxn, main_key)?.ok_or_else(|| {
                Error::index_error(format!(
                    "index `{}`: entry for key {index_key:?} references missing main key {main_key:?}",
                    descriptor.name
                ))
            })?;
            match extractor(value, &descriptor.user_data) {
                ExtractResult::Key(expected) if expected == index_key => {}
                _ => {
                    return Err(Error::index_error(format!(
                        "index `{}`: entry for key {index_key:?} does not match the record's extracted key",
                        descriptor.name
                    )));
                }
            }

            // (d) unique indexes: no more than one main-tree key per index key.
            if descriptor.unique {
                if last_index_key.as_deref() == Some(index_key) {
                    keys_for_last += 1;
                } else {
                    last_index_key = Some(index_key.to_vec());
                    keys_for_last = 1;
                }
                if keys_for_last > 1 {
                    return Err(Error::index_error(format!(
                        "index `{}`: unique index has more than one entry for key {index_key:?}",
                        descriptor.name
                    )));
                }
            }
        }
    }

    Ok(())
}
