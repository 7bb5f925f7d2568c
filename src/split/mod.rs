//! Chunked function dispatch over arrays.
//!
//! - [`chunk`]: chunk planning along an axis
//! - [`call`]: the splitter itself, partitioning inputs and recombining results
//! - [`error`]: split error type

pub mod call;
pub mod chunk;
pub mod error;

pub use call::{split_func_call, Splittable};
pub use chunk::{chunk_sizes, SplitMode};
pub use error::SplitError;
