use memmap2::Mmap;
use ndarray::Array2;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid magic bytes")]
    InvalidMagic,
    #[error("File too small")]
    FileTooSmall,
    #[error("Unsupported format version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    #[error("Unsupported dtype {0:?} (expected '<f4' or '<f8')")]
    UnsupportedDtype(String),
    #[error("Fortran-ordered arrays are not supported")]
    FortranOrder,
    #[error("Expected a 2-D array, got {0} dimension(s)")]
    NotTwoDimensional(usize),
    #[error("Shape ({0}, {1}) exceeds the addressable payload size")]
    ShapeTooLarge(usize, usize),
    #[error("Payload truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
}

/// Parsed `.npy` header metadata.
#[derive(Debug, Clone, Serialize)]
pub struct NpyHeader {
    pub descr: String,
    pub fortran_order: bool,
    pub shape: (usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F32,
    F64,
}

impl Dtype {
    fn item_size(self) -> usize {
        match self {
            Dtype::F32 => 4,
            Dtype::F64 => 8,
        }
    }

    fn from_descr(descr: &str) -> Result<Self, LoadError> {
        match descr {
            "<f4" => Ok(Dtype::F32),
            "<f8" => Ok(Dtype::F64),
            other => Err(LoadError::UnsupportedDtype(other.to_string())),
        }
    }
}

/// Reads just the header of an `.npy` file, without touching the payload.
pub fn read_header(path: &Path) -> Result<NpyHeader, LoadError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let (header, _, _) = parse_header(&mmap)?;
    Ok(header)
}

/// Loads a 2-D `.npy` array of `<f4` or `<f8` values, upcasting to `f64`.
pub fn load_matrix(path: &Path) -> Result<Array2<f64>, LoadError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let (header, dtype, data_start) = parse_header(&mmap)?;

    if header.fortran_order {
        return Err(LoadError::FortranOrder);
    }

    let (rows, cols) = header.shape;
    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(dtype.item_size()))
        .ok_or(LoadError::ShapeTooLarge(rows, cols))?;
    let found = mmap.len().saturating_sub(data_start);
    if found < expected {
        return Err(LoadError::Truncated { expected, found });
    }

    let values = decode(&mmap[data_start..data_start + expected], dtype);
    // values.len() == rows * cols by construction of `expected`
    Ok(Array2::from_shape_vec((rows, cols), values).unwrap())
}

/// Writes a matrix as a version-1.0 `.npy` file with dtype `<f8`.
pub fn write_matrix(path: &Path, matrix: &Array2<f64>) -> std::io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    // 1. Build the header dict and pad the total preamble to 64 bytes
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        matrix.nrows(),
        matrix.ncols()
    );
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_len = (dict.len() + padding + 1) as u16;

    file.write_all(MAGIC)?;
    file.write_all(&[1u8, 0u8])?;
    file.write_all(&header_len.to_le_bytes())?;
    file.write_all(dict.as_bytes())?;
    file.write_all(&vec![b' '; padding])?;
    file.write_all(b"\n")?;

    // 2. Payload, row-major little-endian
    for &v in matrix.iter() {
        file.write_all(&v.to_le_bytes())?;
    }
    file.flush()
}

fn parse_header(buf: &[u8]) -> Result<(NpyHeader, Dtype, usize), LoadError> {
    if buf.len() < 10 {
        return Err(LoadError::FileTooSmall);
    }
    if &buf[0..6] != MAGIC {
        return Err(LoadError::InvalidMagic);
    }

    let (major, minor) = (buf[6], buf[7]);
    let (header_len, header_start) = match major {
        1 => {
            let len = u16::from_le_bytes([buf[8], buf[9]]) as usize;
            (len, 10)
        }
        2 | 3 => {
            if buf.len() < 12 {
                return Err(LoadError::FileTooSmall);
            }
            let len = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
            (len, 12)
        }
        _ => return Err(LoadError::UnsupportedVersion(major, minor)),
    };

    let data_start = header_start + header_len;
    if buf.len() < data_start {
        return Err(LoadError::FileTooSmall);
    }

    let header = std::str::from_utf8(&buf[header_start..data_start])
        .map_err(|e| LoadError::MalformedHeader(e.to_string()))?;

    let descr = parse_quoted(header, "descr")?;
    let fortran_order = parse_bool(header, "fortran_order")?;
    let dims = parse_shape(header)?;
    if dims.len() != 2 {
        return Err(LoadError::NotTwoDimensional(dims.len()));
    }

    let dtype = Dtype::from_descr(&descr)?;
    let header = NpyHeader {
        descr,
        fortran_order,
        shape: (dims[0], dims[1]),
    };
    Ok((header, dtype, data_start))
}

fn dict_value<'a>(header: &'a str, key: &str) -> Result<&'a str, LoadError> {
    let pattern = format!("'{}':", key);
    let at = header
        .find(&pattern)
        .ok_or_else(|| LoadError::MalformedHeader(format!("missing key '{}'", key)))?;
    Ok(header[at + pattern.len()..].trim_start())
}

fn parse_quoted(header: &str, key: &str) -> Result<String, LoadError> {
    let rest = dict_value(header, key)?;
    let quote = match rest.chars().next() {
        Some(c @ ('\'' | '"')) => c,
        _ => return Err(LoadError::MalformedHeader(format!("'{}' is not a string", key))),
    };
    let end = rest[1..]
        .find(quote)
        .ok_or_else(|| LoadError::MalformedHeader(format!("unterminated '{}'", key)))?;
    Ok(rest[1..end + 1].to_string())
}

fn parse_bool(header: &str, key: &str) -> Result<bool, LoadError> {
    let rest = dict_value(header, key)?;
    if rest.starts_with("True") {
        Ok(true)
    } else if rest.starts_with("False") {
        Ok(false)
    } else {
        Err(LoadError::MalformedHeader(format!("'{}' is not a bool", key)))
    }
}

fn parse_shape(header: &str) -> Result<Vec<usize>, LoadError> {
    let rest = dict_value(header, "shape")?;
    if !rest.starts_with('(') {
        return Err(LoadError::MalformedHeader("'shape' is not a tuple".to_string()));
    }
    let close = rest
        .find(')')
        .ok_or_else(|| LoadError::MalformedHeader("unterminated 'shape'".to_string()))?;

    rest[1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| LoadError::MalformedHeader(format!("bad dimension {:?}", s)))
        })
        .collect()
}

fn decode(bytes: &[u8], dtype: Dtype) -> Vec<f64> {
    match dtype {
        Dtype::F64 => {
            // Zero-copy cast when the mmap offset happens to be aligned;
            // the on-disk '<' byte order matches little-endian hosts.
            if cfg!(target_endian = "little") {
                if let Ok(values) = bytemuck::try_cast_slice::<u8, f64>(bytes) {
                    return values.to_vec();
                }
            }
            bytes
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
                .collect()
        }
        Dtype::F32 => {
            if cfg!(target_endian = "little") {
                if let Ok(values) = bytemuck::try_cast_slice::<u8, f32>(bytes) {
                    return values.iter().map(|&v| v as f64).collect();
                }
            }
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes(c.try_into().unwrap()) as f64)
                .collect()
        }
    }
}
