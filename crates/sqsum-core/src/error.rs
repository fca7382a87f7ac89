//! Error taxonomy for reductions.
//!
//! A failed call has already released whatever device memory it acquired.
//! Nothing is retried internally.

/// Errors returned by [`crate::Reducer`].
#[derive(Debug, thiserror::Error)]
pub enum SqsumError {
    /// Device memory could not hold the input copy (or reduction scratch).
    #[error("device allocation of {requested_bytes} bytes failed: {msg}")]
    Allocation { requested_bytes: usize, msg: String },

    /// A host↔device copy did not complete.
    #[error("device transfer failed: {0}")]
    Transfer(String),

    /// The requested device could not be acquired.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Kernel compilation, module load or launch failed.
    #[error("kernel launch failed: {0}")]
    Launch(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SqsumError {
    /// Whether this is the out-of-device-memory failure.
    pub fn is_allocation(&self) -> bool {
        matches!(self, SqsumError::Allocation { .. })
    }

    /// Whether this is the copy failure.
    pub fn is_transfer(&self) -> bool {
        matches!(self, SqsumError::Transfer(_))
    }
}

#[cfg(feature = "cuda")]
impl From<sqsum_kernels::cuda::CudaError> for SqsumError {
    fn from(e: sqsum_kernels::cuda::CudaError) -> Self {
        use sqsum_kernels::cuda::CudaError;
        match e {
            CudaError::Alloc { bytes, msg } => SqsumError::Allocation { requested_bytes: bytes, msg },
            CudaError::Transfer(msg) => SqsumError::Transfer(msg),
            CudaError::DeviceInit(msg) => SqsumError::DeviceUnavailable(msg),
            other @ (CudaError::PtxCompile { .. }
            | CudaError::ModuleLoad { .. }
            | CudaError::FuncNotFound { .. }
            | CudaError::LaunchError(_)) => SqsumError::Launch(other.to_string()),
        }
    }
}
