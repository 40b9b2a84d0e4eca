//! Concurrent, order-preserving batch resolution.
//!
//! Locations are split into fixed-size chunks; each chunk is resolved on a
//! blocking worker and the chunk results are re-assembled in input order.
//! Cancellation is checked before every location.

use std::sync::Arc;

use futures::{StreamExt as _, TryStreamExt as _, stream};
use quake_keys_keys_models::ResolvedKey;
use quake_keys_location_models::LocationRecord;
use tokio_util::sync::CancellationToken;

use crate::config::BatchOptions;
use crate::progress::ProgressCallback;
use crate::{KeysLookup, LookupError};

pub(crate) async fn resolve_batch(
    lookup: Arc<KeysLookup>,
    locations: Vec<LocationRecord>,
    options: &BatchOptions,
    cancel: &CancellationToken,
    progress: Arc<dyn ProgressCallback>,
) -> Result<Vec<ResolvedKey>, LookupError> {
    if cancel.is_cancelled() {
        return Err(LookupError::Cancelled);
    }

    let total = locations.len();
    progress.set_total(total as u64);

    let chunks = into_chunks(locations, options.chunk_size.max(1));
    let message = format!("Resolving {total} locations in {} chunks", chunks.len());
    log::info!("{message} (concurrency={})", options.concurrency);
    progress.set_message(message);

    let resolved: Vec<Vec<ResolvedKey>> = stream::iter(chunks.into_iter().map(|chunk| {
        let lookup = Arc::clone(&lookup);
        let cancel = cancel.clone();
        let progress = Arc::clone(&progress);
        async move {
            tokio::task::spawn_blocking(move || {
                resolve_chunk(&lookup, &chunk, &cancel, &*progress)
            })
            .await?
        }
    }))
    .buffered(options.concurrency.max(1))
    .try_collect()
    .await?;

    let keys: Vec<ResolvedKey> = resolved.into_iter().flatten().collect();
    progress.finish(format!("Resolved {} locations", keys.len()));
    Ok(keys)
}

fn into_chunks(locations: Vec<LocationRecord>, chunk_size: usize) -> Vec<Vec<LocationRecord>> {
    let mut chunks = Vec::with_capacity(locations.len().div_ceil(chunk_size));
    let mut iter = locations.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(chunk_size).collect());
    }
    chunks
}

fn resolve_chunk(
    lookup: &KeysLookup,
    chunk: &[LocationRecord],
    cancel: &CancellationToken,
    progress: &dyn ProgressCallback,
) -> Result<Vec<ResolvedKey>, LookupError> {
    let reconciler = lookup.reconciler();
    let mut keys = Vec::with_capacity(chunk.len());
    for location in chunk {
        if cancel.is_cancelled() {
            log::debug!("Batch cancelled before location {}", location.id);
            return Err(LookupError::Cancelled);
        }
        keys.push(reconciler.resolve(location));
        progress.inc(1);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_input_in_order() {
        let locations: Vec<_> = (1..=7).map(LocationRecord::new).collect();
        let chunks = into_chunks(locations, 3);
        let sizes: Vec<_> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(chunks[2][0].id, 7);
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(into_chunks(Vec::new(), 5).is_empty());
    }
}
