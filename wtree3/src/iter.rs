use heed::types::Bytes;
use heed::Database;

use crate::collection::Collection;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::maintenance::indexes_delete;
use crate::txn::Transaction;

/// Holds the transaction an iterator runs against: either the caller's
/// (released back to them on close) or one the iterator opened itself (spec
/// §3 "may own the underlying transaction", §4.8 "close ... aborts txn if
/// owned").
enum Owner<'e, 't> {
    Borrowed(&'t mut Transaction<'e>),
    Owned(Transaction<'e>),
}

impl<'e, 't> Owner<'e, 't> {
    fn txn(&self) -> &Transaction<'e> {
        match self {
            Owner::Borrowed(t) => t,
            Owner::Owned(t) => t,
        }
    }

    fn txn_mut(&mut self) -> &mut Transaction<'e> {
        match self {
            Owner::Borrowed(t) => t,
            Owner::Owned(t) => t,
        }
    }
}

/// Context needed to route a main-tree iterator's delete through index
/// maintenance and the entry counter (spec §4.8).
struct MaintenanceCtx<'t> {
    env: &'t Environment,
    collection: &'t Collection,
}

/// A cursor bound to a transaction and a sub-tree (spec §3, §4.8). Current
/// key/value are always owned copies, re-derived from the engine on every
/// navigation call — this sidesteps holding a borrow into the transaction
/// the iterator may itself own, at the cost of a copy per step.
pub struct Iter<'e, 't> {
    db: Database<Bytes, Bytes>,
    is_index: bool,
    current: Option<(Vec<u8>, Vec<u8>)>,
    owner: Owner<'e, 't>,
    maintenance: Option<MaintenanceCtx<'t>>,
}

impl<'e, 't> Iter<'e, 't> {
    pub(crate) fn new_borrowed(
        db: Database<Bytes, Bytes>,
        is_index: bool,
        txn: &'t mut Transaction<'e>,
        maintenance: Option<(&'t Environment, &'t Collection)>,
    ) -> Self {
        Iter {
            db,
            is_index,
            current: None,
            owner: Owner::Borrowed(txn),
            maintenance: maintenance.map(|(env, collection)| MaintenanceCtx { env, collection }),
        }
    }

    pub(crate) fn new_owned(db: Database<Bytes, Bytes>, is_index: bool, txn: Transaction<'e>) -> Self {
        Iter { db, is_index, current: None, owner: Owner::Owned(txn), maintenance: None }
    }

    pub fn valid(&self) -> bool {
        self.current.is_some()
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(k, _)| k.as_slice())
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(_, v)| v.as_slice())
    }

    pub fn key_copy(&self) -> Option<Vec<u8>> {
        self.current.as_ref().map(|(k, _)| k.clone())
    }

    pub fn value_copy(&self) -> Option<Vec<u8>> {
        self.current.as_ref().map(|(_, v)| v.clone())
    }

    /// Exposes the iterator's underlying transaction so callers can run a
    /// further lookup (e.g. resolving an index iterator's main-tree key)
    /// under the same snapshot (spec §4.10).
    pub fn transaction(&self) -> &Transaction<'e> {
        self.owner.txn()
    }

    pub fn first(&mut self) -> Result<()> {
        let item = self.db.first(self.owner.txn().as_ro())?;
        self.current = item.map(|(k, v)| (k.to_vec(), v.to_vec()));
        Ok(())
    }

    pub fn last(&mut self) -> Result<()> {
        let item = self.db.last(self.owner.txn().as_ro())?;
        self.current = item.map(|(k, v)| (k.to_vec(), v.to_vec()));
        Ok(())
    }

    /// Positions exactly at `key`. For an index sub-tree this lands on the
    /// smallest duplicate value bound to `key` (spec §4.10).
    pub fn seek(&mut self, key: &[u8]) -> Result<()> {
        let rtxn = self.owner.txn().as_ro();
        self.current = match self.db.get_duplicates(rtxn, key)? {
            Some(mut dups) => dups.next().transpose()?.map(|(k, v)| (k.to_vec(), v.to_vec())),
            None => None,
        };
        Ok(())
    }

    /// Positions at the first key greater than or equal to `key` (spec
    /// §4.10).
    pub fn seek_range(&mut self, key: &[u8]) -> Result<()> {
        let item = self.db.get_greater_than_or_equal_to(self.owner.txn().as_ro(), key)?;
        self.current = item.map(|(k, v)| (k.to_vec(), v.to_vec()));
        Ok(())
    }

    /// Advances to the next entry, stepping through duplicate values before
    /// moving to the next key (spec §4.8).
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<()> {
        let Some((key, value)) = self.current.clone() else {
            self.current = None;
            return Ok(());
        };
        let rtxn = self.owner.txn().as_ro();

        if self.is_index {
            if let Some(dups) = self.db.get_duplicates(rtxn, key.as_slice())? {
                let mut best: Option<Vec<u8>> = None;
                for item in dups {
                    let (_, dv) = item?;
                    if dv > value.as_slice() && best.as_deref().is_none_or(|b| dv < b) {
                        best = Some(dv.to_vec());
                    }
                }
                if let Some(dv) = best {
                    self.current = Some((key, dv));
                    return Ok(());
                }
            }
        }

        let item = self.db.get_greater_than(rtxn, key.as_slice())?;
        self.current = item.map(|(k, v)| (k.to_vec(), v.to_vec()));
        Ok(())
    }

    /// Steps backward, symmetric to [`Iter::next`] (spec §4.8).
    pub fn prev(&mut self) -> Result<()> {
        let Some((key, value)) = self.current.clone() else {
            self.current = None;
            return Ok(());
        };
        let rtxn = self.owner.txn().as_ro();

        if self.is_index {
            if let Some(dups) = self.db.get_duplicates(rtxn, key.as_slice())? {
                let mut best: Option<Vec<u8>> = None;
                for item in dups {
                    let (_, dv) = item?;
                    if dv < value.as_slice() && best.as_deref().is_none_or(|b| dv > b) {
                        best = Some(dv.to_vec());
                    }
                }
                if let Some(dv) = best {
                    self.current = Some((key, dv));
                    return Ok(());
                }
            }
        }

        let prev_key = self.db.get_lower_than(rtxn, key.as_slice())?;
        self.current = match prev_key {
            Some((pk, _)) if self.is_index => {
                let mut last = None;
                if let Some(dups) = self.db.get_duplicates(rtxn, pk)? {
                    for item in dups {
                        last = Some(item?);
                    }
                }
                last.map(|(k, v)| (k.to_vec(), v.to_vec()))
            }
            Some((pk, pv)) => Some((pk.to_vec(), pv.to_vec())),
            None => None,
        };
        Ok(())
    }

    /// Deletes the entry at the current position (spec §4.8). Main-tree
    /// iterators route through index maintenance and the entry counter,
    /// then reposition to the successor; index iterators perform a raw
    /// pair delete with no secondary bookkeeping.
    pub fn delete(&mut self) -> Result<()> {
        let Some((key, value)) = self.current.clone() else {
            return Err(Error::einval("iterator is not positioned on an entry"));
        };

        if self.is_index {
            let wtxn = self.owner.txn_mut().as_rw_mut()?;
            self.db.delete_one_duplicate(wtxn, key.as_slice(), value.as_slice())?;
            self.next()?;
            return Ok(());
        }

        let maintenance = self.maintenance.as_ref().ok_or_else(|| {
            Error::einval("main-tree iterator delete requires maintenance context")
        })?;
        let env = maintenance.env;
        let collection = maintenance.collection;

        let wtxn = self.owner.txn_mut().as_rw_mut()?;
        indexes_delete(wtxn, collection.indexes(), key.as_slice(), value.as_slice())?;
        self.db.delete(wtxn, key.as_slice())?;
        collection.adjust_count(env, wtxn, -1)?;

        let item = self.db.get_greater_than(wtxn, key.as_slice())?;
        self.current = item.map(|(k, v)| (k.to_vec(), v.to_vec()));
        Ok(())
    }

    /// Destroys the iterator; an owned transaction is aborted (spec §4.8).
    pub fn close(self) {
        if let Owner::Owned(txn) = self.owner {
            txn.abort();
        }
    }
}
