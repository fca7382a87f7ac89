//! # sqsum-kernels
//!
//! CUDA (cudarc + NVRTC) and host SIMD kernels for the sum-of-squares reducer.
//!
//! Provides:
//! - Runtime SIMD capability detection (AVX2, FMA)
//! - Host-parallel fused square+add fold (rayon, AVX2/FMA inner loop)
//! - CUDA dispatch (behind `cuda` feature flag)

pub mod simd;
pub mod cpu_reduce;

#[cfg(feature = "cuda")]
pub mod cuda;

pub use simd::SimdCapability;
