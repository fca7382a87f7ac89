//! Runtime SIMD capability detection.
//!
//! Detected once per process and consulted by the host fold to pick its
//! inner loop.

use std::sync::OnceLock;

/// SIMD capabilities detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimdCapability {
    pub avx2: bool,
    pub fma: bool,
}

static DETECTED: OnceLock<SimdCapability> = OnceLock::new();

impl SimdCapability {
    /// Detect SIMD capabilities for the current CPU.
    pub fn detect() -> &'static SimdCapability {
        DETECTED.get_or_init(|| {
            #[cfg(target_arch = "x86_64")]
            let cap = SimdCapability {
                avx2: is_x86_feature_detected!("avx2"),
                fma: is_x86_feature_detected!("fma"),
            };

            #[cfg(not(target_arch = "x86_64"))]
            let cap = SimdCapability::scalar();

            tracing::debug!("SIMD capability: {}", cap.best_tier());
            cap
        })
    }

    /// A capability set with every extension disabled.
    pub const fn scalar() -> Self {
        SimdCapability { avx2: false, fma: false }
    }

    /// Inner loop the host fold will run, as a human-readable string.
    pub fn best_tier(&self) -> &'static str {
        if self.has_avx2_fma() {
            "AVX2+FMA"
        } else {
            "scalar"
        }
    }

    /// Whether the fused multiply-add f64x4 path can run.
    pub fn has_avx2_fma(&self) -> bool {
        self.avx2 && self.fma
    }
}
