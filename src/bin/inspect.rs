use dist_matrix::storage::npy;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct ArrayExport {
    path: String,
    descr: String,
    fortran_order: bool,
    rows: usize,
    cols: usize,
    min: f64,
    max: f64,
    mean: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <npy_path>", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let header = npy::read_header(path)?;
    let matrix = npy::load_matrix(path)?;

    println!("Loading array from {:?}", path);
    println!("Dtype: {}", header.descr);
    println!("Shape: ({}, {})", header.shape.0, header.shape.1);

    let count = matrix.len();
    let (min, max, mean) = if count > 0 {
        let (min, max, sum) = matrix.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, s), &v| (lo.min(v), hi.max(v), s + v),
        );
        (min, max, sum / count as f64)
    } else {
        (0.0, 0.0, 0.0)
    };

    println!("Min: {}, Max: {}, Mean: {}", min, max, mean);

    let export = ArrayExport {
        path: args[1].clone(),
        descr: header.descr,
        fortran_order: header.fortran_order,
        rows: header.shape.0,
        cols: header.shape.1,
        min,
        max,
        mean,
    };

    let json = serde_json::to_string_pretty(&export)?;
    let mut file = File::create("array.json")?;
    file.write_all(json.as_bytes())?;

    println!("Exported metadata to array.json");
    Ok(())
}
