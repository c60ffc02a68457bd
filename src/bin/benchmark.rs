use dist_matrix::core::matrix::DistanceMatrix;
use ndarray::Array2;
use rand::Rng;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let n = 10_000;
    let q = 100;
    let dim = 128;

    println!("=== Benchmark: N={}, Q={}, Dim={} ===", n, q, dim);

    // 1. Generate Data
    println!("Generating data...");
    let mut rng = rand::thread_rng();
    let data = Array2::from_shape_fn((n, dim), |_| rng.gen::<f64>());
    let queries = Array2::from_shape_fn((q, dim), |_| rng.gen::<f64>());

    // 2. Compute
    println!("Computing distance matrix...");
    let start = Instant::now();
    let matrix = DistanceMatrix::compute(&data, &queries)?;
    let duration = start.elapsed();

    let pairs = (n * q) as f64;
    println!("Compute time: {:.2?}", duration);
    println!("Pairs/sec: {:.2}", pairs / duration.as_secs_f64());
    println!("Checksum: {:.6}", matrix.into_flat().iter().sum::<f64>());

    Ok(())
}
