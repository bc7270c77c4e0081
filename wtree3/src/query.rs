use crate::collection::Collection;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::iter::Iter;
use crate::txn::Transaction;

/// Opens a read transaction, positions exactly at `key` in `index_name`'s
/// sub-tree, and returns an iterator whose "value" is the main-tree key
/// (spec §4.10). Callers extract it and look it up on the main tree under
/// [`Iter::transaction`] to retrieve the value.
pub fn index_seek<'e>(env: &'e Environment, collection: &'e Collection, index_name: &str, key: &[u8]) -> Result<Iter<'e, 'e>> {
    index_seek_impl(env, collection, index_name, key, false)
}

/// Identical to [`index_seek`] but positions at the first index key greater
/// than or equal to `key` (spec §4.10).
pub fn index_seek_range<'e>(
    env: &'e Environment,
    collection: &'e Collection,
    index_name: &str,
    key: &[u8],
) -> Result<Iter<'e, 'e>> {
    index_seek_impl(env, collection, index_name, key, true)
}

fn index_seek_impl<'e>(
    env: &'e Environment,
    collection: &'e Collection,
    index_name: &str,
    key: &[u8],
    range: bool,
) -> Result<Iter<'e, 'e>> {
    let descriptor = collection
        .find_index(index_name)
        .ok_or_else(|| Error::einval(format!("collection has no index named `{index_name}`")))?;
    if descriptor.is_skipped() {
        return Err(Error::not_found());
    }

    let txn = Transaction::begin(env, false)?;
    let mut iter = Iter::new_owned(descriptor.db, true, txn);
    if range {
        iter.seek_range(key)?;
    } else {
        iter.seek(key)?;
    }
    Ok(iter)
}
