//! Host-parallel fused square+add reduction.
//!
//! `combine(acc, x) = acc + x * x` with identity `0.0`, applied in a single
//! pass; the squared sequence is never materialized. Long inputs are split
//! across the rayon pool and the per-chunk partials are added together, so
//! the summation order (and the last bits of the result) may differ from a
//! left-to-right sequential sum.

use rayon::prelude::*;

#[cfg(target_arch = "x86_64")]
use crate::simd::SimdCapability;

/// Minimum element count before the fold is spread over rayon workers.
pub const PAR_THRESHOLD: usize = 8192;

/// Elements per rayon task once the input is past the threshold.
const CHUNK: usize = 4096;

/// Sum of squares of `data`, `0.0` when empty.
pub fn sum_of_squares_f64(data: &[f64]) -> f64 {
    sum_of_squares_f64_with_threshold(data, PAR_THRESHOLD)
}

/// Like [`sum_of_squares_f64`] with an explicit parallel cut-over.
pub fn sum_of_squares_f64_with_threshold(data: &[f64], par_threshold: usize) -> f64 {
    if data.len() < par_threshold.max(1) {
        return fold_chunk(data);
    }
    data.par_chunks(CHUNK)
        .map(fold_chunk)
        .reduce(|| 0.0, |a, b| a + b)
}

/// Sequential left-to-right reference: `((0 + x0²) + x1²) + ...`.
pub fn sum_of_squares_f64_sequential(data: &[f64]) -> f64 {
    data.iter().fold(0.0, |acc, &x| acc + x * x)
}

fn fold_chunk(chunk: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if SimdCapability::detect().has_avx2_fma() {
            // Safety: AVX2 and FMA were detected above
            return unsafe { fold_chunk_avx2(chunk) };
        }
    }
    fold_chunk_scalar(chunk)
}

/// Four independent accumulators to break the add dependency chain.
fn fold_chunk_scalar(chunk: &[f64]) -> f64 {
    let mut acc = [0.0f64; 4];
    let mut quads = chunk.chunks_exact(4);
    for q in &mut quads {
        acc[0] += q[0] * q[0];
        acc[1] += q[1] * q[1];
        acc[2] += q[2] * q[2];
        acc[3] += q[3] * q[3];
    }
    let mut tail = 0.0;
    for &x in quads.remainder() {
        tail += x * x;
    }
    (acc[0] + acc[1]) + (acc[2] + acc[3]) + tail
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
unsafe fn fold_chunk_avx2(chunk: &[f64]) -> f64 {
    use std::arch::x86_64::*;

    let mut acc0 = _mm256_setzero_pd();
    let mut acc1 = _mm256_setzero_pd();

    // 8 elements per iteration, two vector accumulators
    let mut i = 0;
    while i + 8 <= chunk.len() {
        let p = chunk.as_ptr().add(i);
        let v0 = _mm256_loadu_pd(p);
        let v1 = _mm256_loadu_pd(p.add(4));
        acc0 = _mm256_fmadd_pd(v0, v0, acc0);
        acc1 = _mm256_fmadd_pd(v1, v1, acc1);
        i += 8;
    }

    let acc = _mm256_add_pd(acc0, acc1);
    let mut lanes = [0.0f64; 4];
    _mm256_storeu_pd(lanes.as_mut_ptr(), acc);
    let mut total = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);

    // Scalar tail
    while i < chunk.len() {
        let x = chunk[i];
        total += x * x;
        i += 1;
    }
    total
}
