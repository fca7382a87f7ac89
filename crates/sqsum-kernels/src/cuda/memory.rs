//! Device-resident input buffers.
//!
//! A [`DeviceBuffer`] is a full copy of a host `f64` slice living in GPU
//! memory. It is owned by exactly one reduction call and freed when it is
//! dropped, which covers the success path and every early `?` return.

use std::sync::Arc;

use cudarc::driver::{CudaDevice, CudaSlice};

use super::context::{get_device, CudaError};

/// An exclusively owned GPU copy of a host `f64` sequence.
///
/// Not `Clone`: nothing else may observe or reuse the allocation.
#[derive(Debug)]
pub struct DeviceBuffer {
    /// Device allocation; released by `CudaSlice`'s `Drop`. `None` when
    /// empty, since the driver rejects zero-byte allocations.
    inner: Option<CudaSlice<f64>>,
    device: Arc<CudaDevice>,
    device_idx: usize,
    len: usize,
}

impl DeviceBuffer {
    /// Allocate `data.len()` doubles on `device_idx` and copy `data` into them (H2D).
    ///
    /// Allocation and copy are separate steps so the two failure modes stay
    /// distinguishable. If the copy fails the fresh allocation is dropped
    /// before the error is returned. Empty input allocates nothing.
    pub fn from_host(device_idx: usize, data: &[f64]) -> Result<Self, CudaError> {
        let bytes = std::mem::size_of_val(data);
        let dev = get_device(device_idx)?;
        if data.is_empty() {
            return Ok(Self { inner: None, device: dev, device_idx, len: 0 });
        }

        // Safety: every element is overwritten by the copy below before any
        // kernel reads the buffer; on copy failure the buffer is dropped unread.
        let mut slice = unsafe { dev.alloc::<f64>(data.len()) }
            .map_err(|e| CudaError::Alloc { bytes, msg: e.to_string() })?;

        dev.htod_sync_copy_into(data, &mut slice)
            .map_err(|e| CudaError::Transfer(format!("htod_sync_copy_into({} bytes): {}", bytes, e)))?;

        tracing::trace!("uploaded {} f64 to cuda:{}", data.len(), device_idx);
        Ok(Self {
            inner: Some(slice),
            device: dev,
            device_idx,
            len: data.len(),
        })
    }

    /// Copy the buffer back to host (D2H).
    pub fn to_host(&self) -> Result<Vec<f64>, CudaError> {
        let Some(slice) = &self.inner else {
            return Ok(Vec::new());
        };
        self.device
            .dtoh_sync_copy(slice)
            .map_err(|e| CudaError::Transfer(format!("dtoh_sync_copy: {}", e)))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Device index.
    pub fn device_idx(&self) -> usize {
        self.device_idx
    }

    /// The device this buffer lives on.
    pub fn device(&self) -> &Arc<CudaDevice> {
        &self.device
    }

    /// Underlying slice for kernel launches; `None` for an empty buffer.
    pub fn as_cuda_slice(&self) -> Option<&CudaSlice<f64>> {
        self.inner.as_ref()
    }
}
