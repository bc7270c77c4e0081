use crate::env::Environment;
use crate::error::Result;

/// Advisory memory-map hooks (spec §1, §5). `heed` manages LMDB's own
/// mapping internally and exposes no raw map pointer, so these are
/// best-effort passthroughs: never fatal, logged at trace level, present so
/// callers can tune access patterns the way the engine's own `madvise`
/// wrapper would let them.
pub fn advise_random(env: &Environment) -> Result<()> {
    let _ = env;
    tracing::trace!("advise_random: no-op (heed does not expose the raw mapping)");
    Ok(())
}

pub fn advise_sequential(env: &Environment) -> Result<()> {
    let _ = env;
    tracing::trace!("advise_sequential: no-op (heed does not expose the raw mapping)");
    Ok(())
}

pub fn advise_will_need(env: &Environment, start: &[u8], end: &[u8]) -> Result<()> {
    let _ = env;
    tracing::trace!(start = ?start, end = ?end, "advise_will_need: no-op (heed does not expose the raw mapping)");
    Ok(())
}

pub fn advise_dont_need(env: &Environment, start: &[u8], end: &[u8]) -> Result<()> {
    let _ = env;
    tracing::trace!(start = ?start, end = ?end, "advise_dont_need: no-op (heed does not expose the raw mapping)");
    Ok(())
}

pub fn lock_range(env: &Environment, start: &[u8], end: &[u8]) -> Result<()> {
    let _ = env;
    tracing::trace!(start = ?start, end = ?end, "lock_range: no-op (heed does not expose the raw mapping)");
    Ok(())
}

pub fn unlock_range(env: &Environment, start: &[u8], end: &[u8]) -> Result<()> {
    let _ = env;
    tracing::trace!(start = ?start, end = ?end, "unlock_range: no-op (heed does not expose the raw mapping)");
    Ok(())
}

pub fn prefetch_range(env: &Environment, start: &[u8], end: &[u8]) -> Result<()> {
    let _ = env;
    tracing::trace!(start = ?start, end = ?end, "prefetch_range: no-op (heed does not expose the raw mapping)");
    Ok(())
}
