//! Configuration for the reducer.

use serde::{Deserialize, Serialize};

use crate::{Device, Result, SqsumError};

/// Environment variable selecting the device (`cpu`, `cuda`, `cuda:N`).
pub const ENV_DEVICE: &str = "SQSUM_DEVICE";
/// Environment variable overriding [`ReducerConfig::block_size`].
pub const ENV_BLOCK_SIZE: &str = "SQSUM_BLOCK_SIZE";
/// Environment variable overriding [`ReducerConfig::max_blocks`].
pub const ENV_MAX_BLOCKS: &str = "SQSUM_MAX_BLOCKS";
/// Environment variable overriding [`ReducerConfig::par_threshold`].
pub const ENV_PAR_THRESHOLD: &str = "SQSUM_PAR_THRESHOLD";

/// Reducer configuration.
///
/// Controls which device runs the reduction and how the work is split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Device that executes the fused transform-reduce.
    pub device: Device,

    /// CUDA threads per block. Power of two in `[32, 1024]`.
    pub block_size: u32,

    /// Cap on CUDA stage-1 blocks; bounds the partials scratch buffer.
    pub max_blocks: u32,

    /// Minimum host element count before the CPU fold goes parallel.
    pub par_threshold: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            device: Device::default(),
            block_size: 256,
            max_blocks: 1024,
            par_threshold: 8192,
        }
    }
}

impl ReducerConfig {
    /// Default config on the given device.
    pub fn on(device: Device) -> Self {
        Self { device, ..Self::default() }
    }

    /// Check launch parameters.
    pub fn validate(&self) -> Result<()> {
        check_block_size(self.block_size)?;
        check_max_blocks(self.max_blocks)
    }

    /// Defaults overridden by `SQSUM_*` environment variables.
    ///
    /// Values that do not parse or fail [`ReducerConfig::validate`] are
    /// skipped with a warning, so the result is always valid.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ReducerConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_DEVICE) {
            match v.parse::<Device>() {
                Ok(d) => cfg.device = d,
                Err(e) => tracing::warn!("ignoring {}={:?}: {}", ENV_DEVICE, v, e),
            }
        }
        override_parsed(&lookup, ENV_BLOCK_SIZE, &mut cfg.block_size, check_block_size);
        override_parsed(&lookup, ENV_MAX_BLOCKS, &mut cfg.max_blocks, check_max_blocks);
        override_parsed(&lookup, ENV_PAR_THRESHOLD, &mut cfg.par_threshold, |_| Ok(()));
        cfg
    }
}

fn check_block_size(block_size: u32) -> Result<()> {
    if !block_size.is_power_of_two() || !(32..=1024).contains(&block_size) {
        return Err(SqsumError::InvalidConfig(format!(
            "block_size must be a power of two in [32, 1024], got {}",
            block_size
        )));
    }
    Ok(())
}

fn check_max_blocks(max_blocks: u32) -> Result<()> {
    if max_blocks == 0 {
        return Err(SqsumError::InvalidConfig("max_blocks must be at least 1".into()));
    }
    Ok(())
}

fn override_parsed<F, T, C>(lookup: &F, key: &str, slot: &mut T, check: C)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
    C: Fn(T) -> Result<()>,
{
    let Some(v) = lookup(key) else { return };
    match v.trim().parse::<T>() {
        Ok(parsed) => match check(parsed) {
            Ok(()) => *slot = parsed,
            Err(e) => tracing::warn!("ignoring {}={:?}: {}", key, v, e),
        },
        Err(_) => tracing::warn!("ignoring {}={:?}: not a number", key, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let cfg = ReducerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.device, Device::default());
        assert_eq!(ReducerConfig::from_lookup(|_| None), cfg);
    }

    #[cfg(feature = "cuda")]
    #[test]
    fn test_default_runs_on_accelerator() {
        assert_eq!(ReducerConfig::from_lookup(|_| None).device, Device::Cuda(0));
    }

    #[test]
    fn test_host_is_explicit_opt_in() {
        let cfg = ReducerConfig::from_lookup(lookup_from(&[(ENV_DEVICE, "cpu")]));
        assert_eq!(cfg.device, Device::Cpu);
    }

    #[test]
    fn test_validate_rejects_bad_block_size() {
        let cfg = ReducerConfig { block_size: 100, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(SqsumError::InvalidConfig(_))));
        let cfg = ReducerConfig { block_size: 16, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = ReducerConfig { max_blocks: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_lookup_overrides() {
        let cfg = ReducerConfig::from_lookup(lookup_from(&[
            (ENV_DEVICE, "cuda:1"),
            (ENV_BLOCK_SIZE, "512"),
            (ENV_PAR_THRESHOLD, "100"),
        ]));
        assert_eq!(cfg.device, Device::Cuda(1));
        assert_eq!(cfg.block_size, 512);
        assert_eq!(cfg.max_blocks, 1024);
        assert_eq!(cfg.par_threshold, 100);
    }

    #[test]
    fn test_lookup_ignores_garbage() {
        let cfg = ReducerConfig::from_lookup(lookup_from(&[
            (ENV_DEVICE, "abacus"),
            (ENV_MAX_BLOCKS, "lots"),
        ]));
        assert_eq!(cfg, ReducerConfig::default());
    }

    #[test]
    fn test_lookup_skips_parsable_but_invalid() {
        let cfg = ReducerConfig::from_lookup(lookup_from(&[
            (ENV_DEVICE, "cpu"),
            (ENV_BLOCK_SIZE, "100"),
            (ENV_MAX_BLOCKS, "0"),
        ]));
        assert_eq!(cfg.block_size, 256);
        assert_eq!(cfg.max_blocks, 1024);
        assert!(cfg.validate().is_ok());

        let cfg = ReducerConfig::from_lookup(lookup_from(&[(ENV_BLOCK_SIZE, "2048")]));
        assert_eq!(cfg.block_size, 256);
        let cfg = ReducerConfig::from_lookup(lookup_from(&[(ENV_BLOCK_SIZE, "64")]));
        assert_eq!(cfg.block_size, 64);
    }

    #[test]
    fn test_serde_partial() {
        let cfg: ReducerConfig = serde_json::from_str(r#"{"device":"cuda:2"}"#).unwrap();
        assert_eq!(cfg.device, Device::Cuda(2));
        assert_eq!(cfg.block_size, 256);

        let cfg: ReducerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.device, Device::default());

        let json = serde_json::to_string(&ReducerConfig::on(Device::Cpu)).unwrap();
        assert!(json.contains(r#""device":"cpu""#));
    }
}
