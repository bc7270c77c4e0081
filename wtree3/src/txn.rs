use heed::{RoTxn, RwTxn};

use crate::env::Environment;
use crate::error::{Error, Result};

/// A read-only or read-write transaction against an [`Environment`] (spec
/// §4.2). Read transactions may run concurrently with any number of other
/// transactions; only one write transaction may be open at a time.
pub enum Transaction<'e> {
    Ro(RoTxn<'e>),
    Rw(RwTxn<'e>),
}

impl<'e> Transaction<'e> {
    /// Begins a transaction. `write = true` requests exclusive read-write
    /// access; `write = false` a read-only snapshot of the environment as of
    /// this call.
    pub fn begin(env: &'e Environment, write: bool) -> Result<Self> {
        if write {
            Ok(Transaction::Rw(env.env.write_txn()?))
        } else {
            Ok(Transaction::Ro(env.env.read_txn()?))
        }
    }

    pub fn is_readonly(&self) -> bool {
        matches!(self, Transaction::Ro(_))
    }

    /// Commits the transaction, making its writes (if any) durable and
    /// visible to subsequently started transactions.
    pub fn commit(self) -> Result<()> {
        match self {
            Transaction::Ro(txn) => txn.commit()?,
            Transaction::Rw(txn) => txn.commit()?,
        }
        Ok(())
    }

    /// Discards the transaction. A read transaction simply releases its
    /// reader slot; a write transaction rolls back every write made through
    /// it. Never fails (spec §4.2).
    pub fn abort(self) {
        match self {
            Transaction::Ro(_) => {}
            Transaction::Rw(txn) => txn.abort(),
        }
    }

    /// Releases a read transaction's snapshot while keeping the handle
    /// reusable (spec §3, §4.2). `heed`'s safe API wraps `RoTxn` around a
    /// raw `mdb_txn_begin`/`mdb_txn_commit` pair with no exposed
    /// `mdb_txn_reset`/`mdb_txn_renew`, so there is no way to implement this
    /// without unsafe FFI of our own; this always fails with an explicit
    /// `Einval` rather than silently no-op, the same way
    /// [`crate::Collection::set_compare`] reports its own engine-binding
    /// limitation instead of pretending to succeed.
    pub fn reset(&mut self) -> Result<()> {
        match self {
            Transaction::Ro(_) => {
                Err(Error::einval("reset is unsupported by this engine binding: heed exposes no raw txn reset/renew pair"))
            }
            Transaction::Rw(_) => Err(Error::einval("reset only applies to a read-only transaction")),
        }
    }

    /// Starts a fresh snapshot on a transaction previously released by
    /// [`Transaction::reset`] (spec §3, §4.2). Same engine-binding
    /// limitation as `reset`.
    pub fn renew(&mut self) -> Result<()> {
        match self {
            Transaction::Ro(_) => {
                Err(Error::einval("renew is unsupported by this engine binding: heed exposes no raw txn reset/renew pair"))
            }
            Transaction::Rw(_) => Err(Error::einval("renew only applies to a read-only transaction")),
        }
    }

    pub(crate) fn as_ro(&self) -> &RoTxn<'e> {
        match self {
            Transaction::Ro(txn) => txn,
            Transaction::Rw(txn) => txn,
        }
    }

    pub(crate) fn as_rw_mut(&mut self) -> Result<&mut RwTxn<'e>> {
        match self {
            Transaction::Rw(txn) => Ok(txn),
            Transaction::Ro(_) => {
                Err(crate::error::Error::einval("operation requires a write transaction"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_write_txn_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::open(dir.path(), Some(10 * 1024 * 1024), None, 1).unwrap();

        let wtxn = Transaction::begin(&env, true).unwrap();
        assert!(!wtxn.is_readonly());
        wtxn.commit().unwrap();

        let rtxn = Transaction::begin(&env, false).unwrap();
        assert!(rtxn.is_readonly());
        rtxn.abort();
    }

    #[test]
    fn reset_and_renew_report_unsupported_engine_binding() {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::open(dir.path(), Some(10 * 1024 * 1024), None, 1).unwrap();

        let mut rtxn = Transaction::begin(&env, false).unwrap();
        assert_eq!(rtxn.reset().unwrap_err().code, crate::error::ErrorCode::Einval);
        assert_eq!(rtxn.renew().unwrap_err().code, crate::error::ErrorCode::Einval);
        rtxn.abort();

        let mut wtxn = Transaction::begin(&env, true).unwrap();
        assert_eq!(wtxn.reset().unwrap_err().code, crate::error::ErrorCode::Einval);
        assert_eq!(wtxn.renew().unwrap_err().code, crate::error::ErrorCode::Einval);
        wtxn.abort();
    }

    #[test]
    fn write_txn_on_ro_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let env = Environment::open(dir.path(), Some(10 * 1024 * 1024), None, 1).unwrap();
        let mut rtxn = Transaction::begin(&env, false).unwrap();
        match rtxn.as_rw_mut() {
            Err(err) => assert_eq!(err.code, crate::error::ErrorCode::Einval),
            Ok(_) => panic!("expected read transaction to reject as_rw_mut"),
        }
    }
}
