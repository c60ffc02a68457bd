use crate::simd::get_euclidean_distance;
use ndarray::Array2;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("Dimension mismatch: data vectors have {data} components, query vectors have {queries}")]
    DimensionMismatch { data: usize, queries: usize },
}

/// N x Q grid of pairwise Euclidean distances: row index = data vector,
/// column index = query vector.
#[derive(Debug)]
pub struct DistanceMatrix {
    values: Array2<f64>,
}

impl DistanceMatrix {
    /// Computes all pairwise distances between `data` (N x D) and
    /// `queries` (Q x D). Rows are computed in parallel; each worker owns
    /// a disjoint row of the output, so no synchronization is needed.
    pub fn compute(data: &Array2<f64>, queries: &Array2<f64>) -> Result<Self, ComputeError> {
        let d = data.ncols();
        if d != queries.ncols() {
            return Err(ComputeError::DimensionMismatch {
                data: d,
                queries: queries.ncols(),
            });
        }

        let n = data.nrows();
        let q = queries.nrows();
        if n == 0 || q == 0 {
            return Ok(Self {
                values: Array2::zeros((n, q)),
            });
        }

        let dist_func = get_euclidean_distance();

        // Standard layout makes every row a contiguous slice
        let data = data.as_standard_layout();
        let queries = queries.as_standard_layout();
        let data_flat = data.as_slice().unwrap();
        let queries_flat = queries.as_slice().unwrap();

        let mut values = vec![0.0f64; n * q];
        values.par_chunks_mut(q).enumerate().for_each(|(i, row)| {
            let point = &data_flat[i * d..(i + 1) * d];
            for (j, cell) in row.iter_mut().enumerate() {
                let query = &queries_flat[j * d..(j + 1) * d];
                *cell = unsafe { dist_func(point, query) };
            }
        });

        // values.len() == n * q by construction
        Ok(Self {
            values: Array2::from_shape_vec((n, q), values).unwrap(),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    /// Row-major flattening: `flat[i * Q + j] == matrix[i][j]`.
    pub fn into_flat(self) -> Vec<f64> {
        self.values.into_raw_vec_and_offset().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::distance::euclidean_distance;
    use crate::storage::npy;
    use ndarray::array;
    use tempfile::NamedTempFile;

    #[test]
    fn test_three_four_five_triangle() {
        let data = array![[0.0, 0.0]];
        let queries = array![[3.0, 4.0]];

        let matrix = DistanceMatrix::compute(&data, &queries).unwrap();
        assert_eq!(matrix.shape(), (1, 1));
        assert_eq!(matrix.into_flat(), vec![5.0]);
    }

    #[test]
    fn test_row_major_ordering() {
        let data = array![[1.0, 1.0], [2.0, 2.0]];
        let queries = array![[1.0, 1.0]];

        let flat = DistanceMatrix::compute(&data, &queries).unwrap().into_flat();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0], 0.0);
        assert!((flat[1] - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_flatten_matches_matrix_cells() {
        let data = array![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]];
        let queries = array![[1.0, 0.0], [5.0, 4.0]];

        let matrix = DistanceMatrix::compute(&data, &queries).unwrap();
        let (n, q) = matrix.shape();
        let cells: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..q).map(|j| matrix.get(i, j)).collect())
            .collect();

        let flat = matrix.into_flat();
        assert_eq!(flat.len(), n * q);
        for i in 0..n {
            for j in 0..q {
                assert_eq!(flat[i * q + j], cells[i][j]);
            }
        }
    }

    #[test]
    fn test_matches_reference_norm() {
        let data = array![[0.5, -1.5, 2.0, 7.25], [-3.0, 0.0, 1.0, 1.0]];
        let queries = array![[1.0, 1.0, 1.0, 1.0], [0.0, 0.0, 0.0, 0.0], [2.5, -2.5, 0.5, 6.0]];

        let matrix = DistanceMatrix::compute(&data, &queries).unwrap();
        for i in 0..2 {
            for j in 0..3 {
                let reference = euclidean_distance(
                    data.row(i).as_slice().unwrap(),
                    queries.row(j).as_slice().unwrap(),
                );
                let got = matrix.get(i, j);
                assert!(got >= 0.0);
                assert!((got - reference).abs() <= 1e-9 * reference.max(1.0));
            }
        }
    }

    #[test]
    fn test_zero_iff_equal() {
        let data = array![[1.0, 2.0, 3.0], [1.0, 2.0, 3.5]];
        let queries = array![[1.0, 2.0, 3.0]];

        let matrix = DistanceMatrix::compute(&data, &queries).unwrap();
        assert_eq!(matrix.get(0, 0), 0.0);
        assert!(matrix.get(1, 0) > 0.0);
    }

    #[test]
    fn test_empty_data_set() {
        let data = Array2::<f64>::zeros((0, 2));
        let queries = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];

        let matrix = DistanceMatrix::compute(&data, &queries).unwrap();
        assert_eq!(matrix.shape(), (0, 3));
        assert_eq!(matrix.into_flat().len(), 0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let data = array![[1.0, 2.0, 3.0]];
        let queries = array![[1.0, 2.0, 3.0, 4.0]];

        let err = DistanceMatrix::compute(&data, &queries).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::DimensionMismatch { data: 3, queries: 4 }
        ));
    }

    #[test]
    fn test_npy_files_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
        let data_file = NamedTempFile::new()?;
        let queries_file = NamedTempFile::new()?;
        npy::write_matrix(data_file.path(), &array![[0.0, 0.0], [6.0, 8.0]])?;
        npy::write_matrix(queries_file.path(), &array![[3.0, 4.0]])?;

        let data = npy::load_matrix(data_file.path())?;
        let queries = npy::load_matrix(queries_file.path())?;

        let flat = DistanceMatrix::compute(&data, &queries)?.into_flat();
        assert_eq!(flat, vec![5.0, 5.0]);
        Ok(())
    }
}
