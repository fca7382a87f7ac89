//! CUDA device context management.
//!
//! Provides lazy-initialized singleton `CudaDevice` handles per GPU index.
//! Uses `cudarc` for safe CUDA driver API access.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use cudarc::driver::CudaDevice;
use parking_lot::Mutex;

/// Global registry of CUDA device handles (one per GPU index).
static DEVICES: OnceLock<Mutex<HashMap<usize, Arc<CudaDevice>>>> = OnceLock::new();

fn devices() -> &'static Mutex<HashMap<usize, Arc<CudaDevice>>> {
    DEVICES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Get or create a CUDA device handle for the given GPU index.
///
/// The device is lazily initialized on first access and cached for reuse.
/// The handle is shared across calls; buffers allocated on it are not.
pub fn get_device(device_idx: usize) -> Result<Arc<CudaDevice>, CudaError> {
    let mut map = devices().lock();
    if let Some(dev) = map.get(&device_idx) {
        return Ok(Arc::clone(dev));
    }
    let dev = CudaDevice::new(device_idx).map_err(|e| CudaError::DeviceInit(
        format!("device {}: {}", device_idx, e),
    ))?;
    tracing::info!("initialized CUDA device {}", device_idx);
    map.insert(device_idx, Arc::clone(&dev));
    Ok(dev)
}

/// Check if any CUDA device is available.
pub fn is_cuda_available() -> bool {
    get_device(0).is_ok()
}

/// Number of available CUDA devices.
pub fn device_count() -> usize {
    (0..16).take_while(|&i| get_device(i).is_ok()).count()
}

/// CUDA-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum CudaError {
    #[error("CUDA device init failed: {0}")]
    DeviceInit(String),

    #[error("PTX compilation failed for module '{module}': {msg}")]
    PtxCompile { module: String, msg: String },

    #[error("Failed to load module '{module}': {msg}")]
    ModuleLoad { module: String, msg: String },

    #[error("Function '{func}' not found in module '{module}'")]
    FuncNotFound { module: String, func: String },

    #[error("CUDA kernel launch failed: {0}")]
    LaunchError(String),

    #[error("CUDA allocation of {bytes} bytes failed: {msg}")]
    Alloc { bytes: usize, msg: String },

    #[error("CUDA transfer failed: {0}")]
    Transfer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = CudaError::Alloc { bytes: 64, msg: "out of memory".into() };
        assert_eq!(e.to_string(), "CUDA allocation of 64 bytes failed: out of memory");
        let e = CudaError::FuncNotFound { module: "m".into(), func: "f".into() };
        assert_eq!(e.to_string(), "Function 'f' not found in module 'm'");
    }

    #[test]
    fn test_registry_caches_handles() {
        if !is_cuda_available() {
            eprintln!("CUDA not available, skipping");
            return;
        }
        let a = get_device(0).unwrap();
        let b = get_device(0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(device_count() >= 1);
    }
}
