//! Chunked settlement writes.

use crate::error::{SettlementError, SettlementResult};
use crate::settlement::Settlement;
use crate::store::{ChunkStats, SettlementStore};

/// Persist one chunk of settlements in a single transaction.
///
/// Every settlement in a chunk must carry the same date; the upsert
/// keys on `(seller, date)` and a mixed chunk would silently settle
/// the wrong day. An empty chunk is a no-op.
pub fn write_chunk(
    store: &mut SettlementStore,
    chunk: &[Settlement],
) -> SettlementResult<ChunkStats> {
    let first = match chunk.first() {
        Some(first) => first,
        None => return Ok(ChunkStats::default()),
    };
    if chunk
        .iter()
        .any(|s| s.settlement_date != first.settlement_date)
    {
        return Err(SettlementError::MixedChunk);
    }
    let stats = store.upsert_settlement_chunk(first.settlement_date, chunk)?;
    log::info!(
        "settlement chunk written: {} inserted, {} updated",
        stats.inserted,
        stats.updated
    );
    Ok(stats)
}
