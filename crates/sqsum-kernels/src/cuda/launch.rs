//! CUDA kernel launcher with NVRTC compilation and caching.
//!
//! Compiles CUDA C source at runtime via NVRTC, caches loaded modules per
//! device, and computes launch geometry for block reductions.

use std::collections::HashSet;
use std::sync::Arc;

use cudarc::driver::{CudaDevice, CudaFunction, LaunchConfig};
use parking_lot::Mutex;

use super::context::CudaError;

/// Registry of compiled modules per device.
/// Key: (device_idx, module_name)
static LOADED: std::sync::OnceLock<Mutex<HashSet<(usize, String)>>> =
    std::sync::OnceLock::new();

fn loaded_set() -> &'static Mutex<HashSet<(usize, String)>> {
    LOADED.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Ensure a module is compiled and loaded on the given device.
/// No-op if already loaded.
///
/// The registry lock is held across compilation so concurrent first calls
/// compile once.
pub fn ensure_module(
    device: &Arc<CudaDevice>,
    device_idx: usize,
    module_name: &str,
    cu_source: &str,
    func_names: &[&'static str],
) -> Result<(), CudaError> {
    let key = (device_idx, module_name.to_string());
    let mut set = loaded_set().lock();
    if set.contains(&key) {
        return Ok(());
    }

    let ptx = cudarc::nvrtc::compile_ptx(cu_source).map_err(|e| CudaError::PtxCompile {
        module: module_name.to_string(),
        msg: e.to_string(),
    })?;

    device
        .load_ptx(ptx, module_name, func_names)
        .map_err(|e| CudaError::ModuleLoad {
            module: module_name.to_string(),
            msg: e.to_string(),
        })?;

    tracing::info!("loaded CUDA module '{}' on device {}", module_name, device_idx);
    set.insert(key);
    Ok(())
}

/// Get a kernel function handle, loading the module if needed.
pub fn get_or_load_func(
    device: &Arc<CudaDevice>,
    device_idx: usize,
    module_name: &str,
    func_name: &str,
    cu_source: &str,
    func_names: &[&'static str],
) -> Result<CudaFunction, CudaError> {
    ensure_module(device, device_idx, module_name, cu_source, func_names)?;
    device
        .get_func(module_name, func_name)
        .ok_or_else(|| CudaError::FuncNotFound {
            module: module_name.to_string(),
            func: func_name.to_string(),
        })
}

/// Block/grid limits for a two-stage block reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchGeometry {
    /// Threads per block. Power of two in `[32, 1024]`.
    pub block_size: u32,
    /// Upper bound on stage-1 blocks (and so on the partials buffer length).
    pub max_blocks: u32,
}

impl Default for LaunchGeometry {
    fn default() -> Self {
        Self { block_size: 256, max_blocks: 1024 }
    }
}

impl LaunchGeometry {
    /// Whether the geometry is launchable by the reduction kernels.
    pub fn is_valid(&self) -> bool {
        self.block_size.is_power_of_two()
            && (32..=1024).contains(&self.block_size)
            && self.max_blocks >= 1
    }

    /// Number of stage-1 blocks for `n` elements.
    pub fn blocks_for(&self, n: usize) -> u32 {
        let bs = self.block_size as usize;
        let needed = (n + bs - 1) / bs;
        needed.clamp(1, self.max_blocks as usize) as u32
    }
}

/// 1D launch with one `f64` of dynamic shared memory per thread.
pub fn reduce_config(blocks: u32, block_size: u32) -> LaunchConfig {
    LaunchConfig {
        grid_dim: (blocks, 1, 1),
        block_dim: (block_size, 1, 1),
        shared_mem_bytes: block_size * std::mem::size_of::<f64>() as u32,
    }
}
