//! CUDA GPU backend for the sum-of-squares reducer.
//!
//! Provides:
//! - Device context management (lazy singleton per GPU)
//! - Exclusively owned device buffers with host→device upload
//! - Kernel launcher with NVRTC compilation and module caching
//! - The fused square+add reduction kernel

pub mod context;
pub mod memory;
pub mod launch;
pub mod ops;

pub use context::{device_count, get_device, is_cuda_available, CudaError};
pub use launch::LaunchGeometry;
pub use memory::DeviceBuffer;
pub use ops::cuda_sum_of_squares_f64;
