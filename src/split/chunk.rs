//! Chunk planning along an axis.

use serde::{Deserialize, Serialize};

use crate::split::error::SplitError;

/// How per-chunk results are recombined into one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Concatenate per-chunk results along the output axis, in chunk order.
    Concat,
    /// Add per-chunk results elementwise.
    Sum,
    /// Chunk-size-weighted average of per-chunk results.
    Mean,
}

/// Plan contiguous chunk lengths for an axis of length `dim`.
///
/// Produces `dim / chunk_size` full chunks followed by one remainder
/// chunk when `chunk_size` does not divide `dim`. An axis of length 0
/// yields no chunks.
pub fn chunk_sizes(dim: usize, chunk_size: usize) -> Result<Vec<usize>, SplitError> {
    if chunk_size == 0 {
        return Err(SplitError::ZeroChunkSize);
    }

    let full = dim / chunk_size;
    let remainder = dim % chunk_size;

    let mut sizes = vec![chunk_size; full];
    if remainder > 0 {
        sizes.push(remainder);
    }
    Ok(sizes)
}
