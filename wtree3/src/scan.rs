use crate::collection::Collection;
use crate::env::Environment;
use crate::error::Result;
use crate::txn::Transaction;

/// What a scan callback returns after seeing one `(key, value)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// Positions a cursor at `start` (or the first entry if `None`) and invokes
/// `callback` on each `(key, value)` in ascending order until it returns
/// [`ScanControl::Stop`] or the current key exceeds `end` (spec §4.7).
pub fn scan_range<'e, 't>(
    env: &'t Environment,
    collection: &'t Collection,
    txn: &'t mut Transaction<'e>,
    start: Option<&[u8]>,
    end: Option<&[u8]>,
    mut callback: impl FnMut(&[u8], &[u8]) -> ScanControl,
) -> Result<()> {
    let mut iter = collection.iter(env, txn);
    match start {
        Some(key) => iter.seek_range(key)?,
        None => iter.first()?,
    }

    while iter.valid() {
        let key = iter.key().unwrap();
        if let Some(end) = end {
            if key > end {
                break;
            }
        }
        if callback(key, iter.value().unwrap()) == ScanControl::Stop {
            break;
        }
        iter.next()?;
    }
    Ok(())
}

/// Symmetric to [`scan_range`]: `start` is the upper bound (inclusive, or
/// `last` if `None`), `end` the lower bound, stepping backward (spec §4.7).
pub fn scan_reverse<'e, 't>(
    env: &'t Environment,
    collection: &'t Collection,
    txn: &'t mut Transaction<'e>,
    start: Option<&[u8]>,
    end: Option<&[u8]>,
    mut callback: impl FnMut(&[u8], &[u8]) -> ScanControl,
) -> Result<()> {
    let mut iter = collection.iter(env, txn);
    match start {
        Some(key) => {
            iter.seek_range(key)?;
            if !iter.valid() {
                // `start` is greater than every key in the tree: the greatest
                // key <= start is the last record (spec §4.7).
                iter.last()?;
            } else if iter.key() != Some(key) {
                iter.prev()?;
            }
        }
        None => iter.last()?,
    }

    while iter.valid() {
        let key = iter.key().unwrap();
        if let Some(end) = end {
            if key < end {
                break;
            }
        }
        if callback(key, iter.value().unwrap()) == ScanControl::Stop {
            break;
        }
        iter.prev()?;
    }
    Ok(())
}

/// Visits every key beginning with `prefix` in ascending order (spec §4.7).
pub fn scan_prefix<'e, 't>(
    env: &'t Environment,
    collection: &'t Collection,
    txn: &'t mut Transaction<'e>,
    prefix: &[u8],
    mut callback: impl FnMut(&[u8], &[u8]) -> ScanControl,
) -> Result<()> {
    let mut iter = collection.iter(env, txn);
    iter.seek_range(prefix)?;

    while iter.valid() {
        let key = iter.key().unwrap();
        if !key.starts_with(prefix) {
            break;
        }
        if callback(key, iter.value().unwrap()) == ScanControl::Stop {
            break;
        }
        iter.next()?;
    }
    Ok(())
}

/// `scan_range` with deletes: every matched entry is removed with full
/// index maintenance (spec §4.7). The iterator is repositioned after each
/// deletion since the engine invalidates its current slice on delete.
pub fn delete_if<'e, 't>(
    env: &'t Environment,
    collection: &'t Collection,
    txn: &'t mut Transaction<'e>,
    start: Option<&[u8]>,
    end: Option<&[u8]>,
    mut predicate: impl FnMut(&[u8], &[u8]) -> bool,
) -> Result<u64> {
    let mut iter = collection.iter(env, txn);
    match start {
        Some(key) => iter.seek_range(key)?,
        None => iter.first()?,
    }

    let mut deleted = 0u64;
    while iter.valid() {
        let key = iter.key().unwrap().to_vec();
        if let Some(end) = end {
            if key.as_slice() > end {
                break;
            }
        }
        if predicate(&key, iter.value().unwrap()) {
            iter.delete()?;
            deleted += 1;
        } else {
            iter.next()?;
        }
    }
    Ok(deleted)
}

/// `scan_range` that copies selected `(key, value)` pairs, bounded by
/// `max_count` (`0` meaning unbounded) (spec §4.7).
pub fn collect_range<'e, 't>(
    env: &'t Environment,
    collection: &'t Collection,
    txn: &'t mut Transaction<'e>,
    start: Option<&[u8]>,
    end: Option<&[u8]>,
    mut predicate: impl FnMut(&[u8], &[u8]) -> bool,
    max_count: usize,
) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut out = Vec::new();
    let result = scan_range(env, collection, txn, start, end, |k, v| {
        if predicate(k, v) {
            out.push((k.to_vec(), v.to_vec()));
        }
        if max_count != 0 && out.len() >= max_count {
            ScanControl::Stop
        } else {
            ScanControl::Continue
        }
    });
    match result {
        Ok(()) => Ok(out),
        Err(err) => Err(err),
    }
}
