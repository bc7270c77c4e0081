use std::fmt;

use heed::{Error as HeedError, MdbError};
use thiserror::Error;

/// Stable numeric taxonomy a caller can dispatch on (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Generic / message-only failure.
    Error,
    /// Caller passed invalid arguments.
    Einval,
    /// Allocation failed.
    Enomem,
    /// Main-tree key already present.
    KeyExists,
    /// Main-tree key or index not present.
    NotFound,
    /// Engine out of mapped space — recoverable via `Environment::resize`.
    MapFull,
    /// Write transaction exhausted its dirty-page budget — recoverable by splitting work.
    TxnFull,
    /// Unique-constraint violation, extraction failure, or verify mismatch.
    IndexError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Error => "ERROR",
            ErrorCode::Einval => "EINVAL",
            ErrorCode::Enomem => "ENOMEM",
            ErrorCode::KeyExists => "KEY_EXISTS",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::MapFull => "MAP_FULL",
            ErrorCode::TxnFull => "TXN_FULL",
            ErrorCode::IndexError => "INDEX_ERROR",
        };
        f.write_str(s)
    }
}

/// A `wtree3` failure: a taxonomy code plus an optional diagnostic message.
///
/// Errors never propagate across module boundaries as panics; every
/// fallible operation returns this type through `Result`.
#[derive(Error, Debug)]
#[error("{code}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    pub code: ErrorCode,
    pub message: Option<String>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Error { code, message: Some(message.into()) }
    }

    pub fn code(code: ErrorCode) -> Self {
        Error { code, message: None }
    }

    pub fn einval(message: impl Into<String>) -> Self {
        Error::new(ErrorCode::Einval, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Error::new(ErrorCode::IndexError, message)
    }

    pub fn not_found() -> Self {
        Error::code(ErrorCode::NotFound)
    }

    /// `MAP_FULL` and `TXN_FULL` are recoverable by the caller (resize / split
    /// the batch and retry); everything else is fatal to the enclosing
    /// transaction (spec §6).
    pub fn is_recoverable(&self) -> bool {
        matches!(self.code, ErrorCode::MapFull | ErrorCode::TxnFull)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<HeedError> for Error {
    fn from(error: HeedError) -> Error {
        match error {
            HeedError::Mdb(MdbError::KeyExist) => Error::code(ErrorCode::KeyExists),
            HeedError::Mdb(MdbError::NotFound) => Error::code(ErrorCode::NotFound),
            HeedError::Mdb(MdbError::MapFull) => Error::code(ErrorCode::MapFull),
            HeedError::Mdb(MdbError::TxnFull) => Error::code(ErrorCode::TxnFull),
            HeedError::Mdb(other) => Error::new(ErrorCode::Error, other.to_string()),
            HeedError::Io(io) => Error::new(ErrorCode::Error, io.to_string()),
            HeedError::Encoding(e) => Error::new(ErrorCode::Einval, format!("encoding failed: {e}")),
            HeedError::Decoding(e) => Error::new(ErrorCode::Einval, format!("decoding failed: {e}")),
            HeedError::DatabaseClosing => {
                Error::new(ErrorCode::Error, "database is closing".to_string())
            }
            HeedError::BadOpenOptions { .. } => {
                Error::new(ErrorCode::Einval, "environment already opened with different options")
            }
        }
    }
}
