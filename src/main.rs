use dist_matrix::core::matrix::DistanceMatrix;
use dist_matrix::storage::npy;
use std::path::Path;

const QUERIES_PATH: &str = "queries.npy";
const DATA_PATH: &str = "data.npy";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let queries = npy::load_matrix(Path::new(QUERIES_PATH))?;
    let data = npy::load_matrix(Path::new(DATA_PATH))?;

    println!("Queries shape = ({}, {})", queries.nrows(), queries.ncols());
    println!("Data shape = ({}, {})", data.nrows(), data.ncols());

    let matrix = DistanceMatrix::compute(&data, &queries)?;
    println!("{:?}", matrix.into_flat());
    Ok(())
}
