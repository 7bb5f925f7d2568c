use thiserror::Error;

use crate::device::id::DeviceError;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,

    #[error("no inputs to split")]
    NoInputs,

    #[error("axis {axis} out of bounds for {ndim}-d array")]
    AxisOutOfBounds { axis: usize, ndim: usize },

    #[error("expected {expected} axes, got {got}")]
    AxisCountMismatch { expected: usize, got: usize },

    #[error("inputs disagree on split-axis length: {expected} vs {got}")]
    SplitLenMismatch { expected: usize, got: usize },

    #[error("function returned {got} outputs for a chunk, expected {expected}")]
    OutputArityMismatch { expected: usize, got: usize },

    #[error("chunk shapes do not line up: {0}")]
    ShapeMismatch(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
