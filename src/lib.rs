//! # sqsum
//!
//! Facade over the workspace crates:
//! - `sqsum-core` — `Reducer`, `Device`, `ReducerConfig`, errors
//! - `sqsum-kernels` — CUDA and host SIMD kernels
//!
//! Enable the `cuda` feature for the GPU path.

pub use sqsum_core::*;
pub use sqsum_kernels as kernels;
