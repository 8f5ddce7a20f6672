//! Batched writes
//!
//! Records are written in successive chunks of at most `chunk_size`. The
//! first failing chunk stops the run; the outcome reports how far it got
//! so the caller can surface partial success instead of swallowing it.

use promo_common::Result;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkFailure {
    /// Zero-based index of the chunk that failed
    pub chunk_index: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub total_records: usize,
    pub chunk_size: usize,
    pub chunks_written: usize,
    /// Rows the store reported as written
    pub written: u64,
    pub last_successful_chunk: Option<usize>,
    pub failure: Option<ChunkFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} records written in {} chunk(s) of <= {}",
            self.written, self.total_records, self.chunks_written, self.chunk_size
        )?;
        if let Some(failure) = &self.failure {
            write!(
                f,
                "; STOPPED at chunk {} ({}), last good chunk: {}",
                failure.chunk_index,
                failure.message,
                self.last_successful_chunk
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "none".to_string())
            )?;
        }
        Ok(())
    }
}

/// Write `records` through `write`, one chunk at a time.
///
/// `write` returns the number of rows the store accepted for that chunk.
pub async fn write_in_chunks<'a, T, F, Fut>(
    records: &'a [T],
    chunk_size: usize,
    mut write: F,
) -> BatchOutcome
where
    F: FnMut(&'a [T]) -> Fut,
    Fut: Future<Output = Result<u64>>,
{
    let chunk_size = chunk_size.max(1);
    let mut outcome = BatchOutcome {
        total_records: records.len(),
        chunk_size,
        ..BatchOutcome::default()
    };

    for (index, chunk) in records.chunks(chunk_size).enumerate() {
        match write(chunk).await {
            Ok(written) => {
                outcome.written += written;
                outcome.chunks_written += 1;
                outcome.last_successful_chunk = Some(index);
                debug!(chunk = index, rows = chunk.len(), written, "Chunk written");
            }
            Err(e) => {
                error!(
                    chunk = index,
                    written_so_far = outcome.written,
                    error = %e,
                    "Chunk write failed, stopping batch"
                );
                outcome.failure = Some(ChunkFailure {
                    chunk_index: index,
                    message: e.to_string(),
                });
                break;
            }
        }
    }

    outcome
}
