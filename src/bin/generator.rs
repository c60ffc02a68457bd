use clap::Parser;
use dist_matrix::storage::npy;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 1000)]
    rows: usize,

    #[arg(short, long, default_value_t = 128)]
    dim: usize,

    #[arg(short, long, default_value = "data.npy")]
    output: PathBuf,

    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Generating {} vectors of dimension {}...", args.rows, args.dim);
    let start = Instant::now();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let matrix = Array2::from_shape_fn((args.rows, args.dim), |_| rng.gen::<f64>());

    println!("Saving to {:?}...", args.output);
    npy::write_matrix(&args.output, &matrix)?;
    println!("Done in {:.2?}", start.elapsed());

    Ok(())
}
