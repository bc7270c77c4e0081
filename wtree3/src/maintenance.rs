use heed::{Error as HeedError, MdbError, PutFlags, RwTxn};

use crate::error::{Error, ErrorCode, Result};
use crate::index::IndexDescriptor;
use crate::registry::ExtractResult;

/// Runs every index's extractor over `(main_key, value)` and inserts the
/// derived `(index_key -> main_key)` pair, in descriptor order (spec §4.5).
///
/// Index-first-then-main ordering is the caller's responsibility: this
/// function only touches index sub-trees, so a unique-constraint violation
/// here never leaves a partial main-tree write behind.
pub(crate) fn indexes_insert(
    txn: &mut RwTxn,
    indexes: &[IndexDescriptor],
    main_key: &[u8],
    value: &[u8],
) -> Result<()> {
    for descriptor in indexes {
        let Some(extractor) = descriptor.extractor else {
            continue;
        };
        let index_key = match extractor(value, &descriptor.user_data) {
            ExtractResult::Skip => {
                if !descriptor.sparse {
                    return Err(Error::index_error(format!(
                        "index `{}` extractor skipped a record but the index is not sparse",
                        descriptor.name
                    )));
                }
                continue;
            }
            ExtractResult::Key(key) => key,
        };

        if descriptor.unique && descriptor.db.get(txn, index_key.as_slice())?.is_some() {
            return Err(Error::index_error(format!(
                "unique index `{}` already has an entry for this key",
                descriptor.name
            )));
        }

        match descriptor.db.put_with_flags(txn, PutFlags::NO_DUP_DATA, index_key.as_slice(), main_key)
        {
            Ok(()) => {}
            Err(HeedError::Mdb(MdbError::KeyExist)) => {}
            Err(other) => return Err(other.into()),
        }
    }
    Ok(())
}

/// Removes the `(index_key -> main_key)` pair from every index, in
/// descriptor order (spec §4.5). A not-found result per index is benign.
pub(crate) fn indexes_delete(
    txn: &mut RwTxn,
    indexes: &[IndexDescriptor],
    main_key: &[u8],
    value: &[u8],
) -> Result<()> {
    for descriptor in indexes {
        let Some(extractor) = descriptor.extractor else {
            continue;
        };
        let index_key = match extractor(value, &descriptor.user_data) {
            ExtractResult::Skip => continue,
            ExtractResult::Key(key) => key,
        };

        let deleted = descriptor.db.delete_one_duplicate(txn, index_key.as_slice(), main_key)?;
        let _ = deleted;
    }
    Ok(())
}

#[allow(dead_code)]
pub(crate) fn is_benign(err: &Error) -> bool {
    matches!(err.code, ErrorCode::NotFound)
}
