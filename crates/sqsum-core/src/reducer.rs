//! The sum-of-squares reducer.
//!
//! `Σ xᵢ²` over a read-only host slice as one fused transform-reduce
//! (`acc + x*x`, identity `0.0`). On CUDA the slice is first copied into a
//! device buffer owned by the call and dropped on every exit path.
//!
//! Parallel execution combines partial sums in a tree, so results may
//! differ in the last bits from a left-to-right sum and between devices.
//! NaN anywhere yields NaN; overflow yields `+inf`.

use sqsum_kernels::cpu_reduce;

use crate::{Device, ReducerConfig, Result};

/// Stateless sum-of-squares reducer. Cheap to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Reducer {
    config: ReducerConfig,
}

impl Reducer {
    /// Build a reducer, rejecting invalid launch parameters.
    pub fn new(config: ReducerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Default parameters on `device`.
    pub fn with_device(device: Device) -> Self {
        Self { config: ReducerConfig::on(device) }
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    pub fn device(&self) -> Device {
        self.config.device
    }

    /// Sum of the squares of `input`. Empty input gives exactly `0.0`.
    pub fn reduce_sum_of_squares(&self, input: &[f64]) -> Result<f64> {
        tracing::debug!("sum_of_squares: {} elements on {}", input.len(), self.config.device);
        match self.config.device {
            Device::Cpu => Ok(cpu_reduce::sum_of_squares_f64_with_threshold(
                input,
                self.config.par_threshold,
            )),
            Device::Cuda(idx) => self.reduce_cuda(idx, input),
        }
    }

    #[cfg(feature = "cuda")]
    fn reduce_cuda(&self, idx: usize, input: &[f64]) -> Result<f64> {
        use sqsum_kernels::cuda::{cuda_sum_of_squares_f64, DeviceBuffer, LaunchGeometry};

        let geometry = LaunchGeometry {
            block_size: self.config.block_size,
            max_blocks: self.config.max_blocks,
        };
        let buf = DeviceBuffer::from_host(idx, input)?;
        let sum = cuda_sum_of_squares_f64(&buf, geometry)?;
        Ok(sum)
    }

    #[cfg(not(feature = "cuda"))]
    fn reduce_cuda(&self, idx: usize, _input: &[f64]) -> Result<f64> {
        Err(crate::SqsumError::DeviceUnavailable(format!(
            "cuda:{} requested but built without the `cuda` feature",
            idx
        )))
    }
}

/// Sum of squares on the device selected by `SQSUM_*` environment variables.
///
/// Unset, this is `cuda:0` in builds with the `cuda` feature (input copied to
/// device memory and reduced there) and the host pool otherwise.
pub fn reduce_sum_of_squares(input: &[f64]) -> Result<f64> {
    Reducer::new(ReducerConfig::from_env())?.reduce_sum_of_squares(input)
}
