//! CUDA dispatch for the fused sum-of-squares reduction.
//!
//! Loads the `sum_squares` module (compiled from embedded CUDA source at
//! runtime), runs the two reduction stages and copies the scalar back.

use cudarc::driver::{CudaSlice, LaunchAsync};

use super::context::CudaError;
use super::launch::{get_or_load_func, reduce_config, LaunchGeometry};
use super::memory::DeviceBuffer;

// ============================================================================
// CUDA source (embedded at compile time)
// ============================================================================

const SUM_SQUARES_CU: &str = include_str!("kernels/sum_squares.cu");
const SUM_SQUARES_MODULE: &str = "sum_squares";
const SUM_SQUARES_FUNCS: &[&str] = &["sum_squares_partial_f64", "sum_partials_f64"];

// ============================================================================
// Reductions
// ============================================================================

/// Sum of squares of every element of `buf`.
///
/// Stage 1 writes one partial per block (at most `geometry.max_blocks`),
/// stage 2 sums those partials in a single block. The only scratch memory is
/// the partials buffer and the one-element output. Combine order is a tree,
/// not left-to-right, so the last bits may differ from a sequential sum.
pub fn cuda_sum_of_squares_f64(
    buf: &DeviceBuffer,
    geometry: LaunchGeometry,
) -> Result<f64, CudaError> {
    let Some(input) = buf.as_cuda_slice() else {
        return Ok(0.0);
    };
    if !geometry.is_valid() {
        return Err(CudaError::LaunchError(format!("invalid launch geometry {:?}", geometry)));
    }

    let dev = buf.device();
    let dev_idx = buf.device_idx();
    let n = buf.len();
    let blocks = geometry.blocks_for(n);

    let partial_fn = get_or_load_func(
        dev, dev_idx, SUM_SQUARES_MODULE, "sum_squares_partial_f64", SUM_SQUARES_CU, SUM_SQUARES_FUNCS,
    )?;
    let final_fn = get_or_load_func(
        dev, dev_idx, SUM_SQUARES_MODULE, "sum_partials_f64", SUM_SQUARES_CU, SUM_SQUARES_FUNCS,
    )?;

    let mut partials: CudaSlice<f64> = dev
        .alloc_zeros::<f64>(blocks as usize)
        .map_err(|e| CudaError::Alloc { bytes: blocks as usize * 8, msg: e.to_string() })?;
    let mut out: CudaSlice<f64> = dev
        .alloc_zeros::<f64>(1)
        .map_err(|e| CudaError::Alloc { bytes: 8, msg: e.to_string() })?;

    tracing::trace!(
        "sum_squares launch: n={} blocks={} block_size={}",
        n, blocks, geometry.block_size
    );

    unsafe {
        partial_fn
            .launch(
                reduce_config(blocks, geometry.block_size),
                (input, &mut partials, n as u64),
            )
            .map_err(|e| CudaError::LaunchError(e.to_string()))?;
        final_fn
            .launch(
                reduce_config(1, geometry.block_size),
                (&partials, &mut out, blocks),
            )
            .map_err(|e| CudaError::LaunchError(e.to_string()))?;
    }

    // Synchronous copy-back; waits for both launches on the default stream
    let host = dev
        .dtoh_sync_copy(&out)
        .map_err(|e| CudaError::Transfer(format!("dtoh_sync_copy(result): {}", e)))?;
    host.first()
        .copied()
        .ok_or_else(|| CudaError::Transfer("empty result copy".into()))
}
