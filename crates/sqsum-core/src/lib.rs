//! # sqsum-core
//!
//! Sum of squares of a host `f64` slice, computed as a fused parallel
//! transform-reduce on an accelerator (or, opted into explicitly, the host
//! rayon pool).
//!
//! ```
//! use sqsum_core::{Device, Reducer};
//!
//! let s = Reducer::with_device(Device::Cpu).reduce_sum_of_squares(&[3.0, 4.0]).unwrap();
//! assert_eq!(s, 25.0);
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod reducer;

pub use config::ReducerConfig;
pub use device::Device;
pub use error::SqsumError;
pub use reducer::{reduce_sum_of_squares, Reducer};

pub type Result<T> = std::result::Result<T, SqsumError>;
