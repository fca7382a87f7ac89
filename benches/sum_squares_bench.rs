//! Benchmark: sequential fold vs host-parallel fold vs CUDA (with `--features cuda`).
//!
//! The CUDA column includes the host→device copy, which dominates for
//! small inputs.

use std::time::Instant;

use sqsum_core::{Device, Reducer};
use sqsum_kernels::cpu_reduce::sum_of_squares_f64_sequential;

fn bench<F: FnMut() -> f64>(iters: usize, mut f: F) -> (f64, f64) {
    let mut last = 0.0;
    let start = Instant::now();
    for _ in 0..iters {
        last = std::hint::black_box(f());
    }
    (start.elapsed().as_secs_f64() / iters as f64, last)
}

fn gbps(n: usize, secs: f64) -> f64 {
    (n * std::mem::size_of::<f64>()) as f64 / secs / 1e9
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let simd = sqsum_kernels::SimdCapability::detect();
    println!("=== Sum-of-Squares Benchmark ===");
    println!("SIMD: {} (avx2={}, fma={})\n", simd.best_tier(), simd.avx2, simd.fma);

    let host = Reducer::with_device(Device::Cpu);
    let cuda = cfg!(feature = "cuda").then(|| Reducer::with_device(Device::Cuda(0)));

    println!("{:<12} {:>12} {:>12} {:>10} {:>12} {:>10}",
        "N", "Seq (ms)", "Par (ms)", "Par GB/s", "CUDA (ms)", "CUDA GB/s");
    println!("{}", "-".repeat(72));

    for &n in &[1_000usize, 100_000, 1_000_000, 10_000_000, 50_000_000] {
        let data: Vec<f64> = (0..n).map(|i| ((i * 7 + 3) % 13) as f64 * 0.1 - 0.6).collect();
        let iters = if n <= 100_000 { 200 } else if n <= 1_000_000 { 50 } else { 5 };

        let (seq_s, want) = bench(iters, || sum_of_squares_f64_sequential(&data));
        let (par_s, got) = bench(iters, || host.reduce_sum_of_squares(&data).unwrap_or(f64::NAN));
        assert!((got - want).abs() <= 1e-9 * want.abs().max(1.0), "host mismatch at n={}", n);

        let cuda_col = match &cuda {
            Some(r) => match r.reduce_sum_of_squares(&data) {
                Ok(_) => {
                    let (s, _) = bench(iters, || r.reduce_sum_of_squares(&data).unwrap_or(f64::NAN));
                    format!("{:>10.3}ms {:>10.2}", s * 1000.0, gbps(n, s))
                }
                Err(e) => format!("{:>23}", format!("unavailable: {}", e).chars().take(23).collect::<String>()),
            },
            None => format!("{:>23}", "(no cuda feature)"),
        };

        println!("{:<12} {:>10.3}ms {:>10.3}ms {:>10.2} {}",
            n,
            seq_s * 1000.0,
            par_s * 1000.0,
            gbps(n, par_s),
            cuda_col,
        );
    }
}
