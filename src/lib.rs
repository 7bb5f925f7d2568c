//! array-device: device placement, memory queries and chunked dispatch
//! for host-array runtimes.
//!
//! Provides the device-management layer that sits under an array program:
//! canonical device identifiers, hardware and memory queries, a
//! default-device stack with scoped activation, per-device tracking of
//! live arrays, device-to-device array movement, and a splitter that
//! partitions array arguments into bounded chunks, applies a function per
//! chunk, and recombines the results.

pub mod array;
pub mod config;
pub mod device;
pub mod profiler;
pub mod split;
