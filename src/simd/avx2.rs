use std::arch::x86_64::*;

#[target_feature(enable = "avx2", enable = "fma")]
pub unsafe fn euclidean_distance_avx2(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len();
    let mut sum256 = _mm256_setzero_pd();
    let mut i = 0;

    // Process 4 doubles at a time
    while i + 4 <= n {
        let a_vec = _mm256_loadu_pd(a.as_ptr().add(i));
        let b_vec = _mm256_loadu_pd(b.as_ptr().add(i));
        let diff = _mm256_sub_pd(a_vec, b_vec);
        // FMA: sum = sum + diff * diff
        sum256 = _mm256_fmadd_pd(diff, diff, sum256);
        i += 4;
    }

    // Reduce to 128 bits
    let sum128 = _mm_add_pd(_mm256_castpd256_pd128(sum256), _mm256_extractf128_pd(sum256, 1));
    // sum128 = [s0+s2, s1+s3]

    let sum128 = _mm_hadd_pd(sum128, sum128);
    // sum128 = [Total, Total]

    let mut sum = _mm_cvtsd_f64(sum128);

    // Handle remaining elements
    while i < n {
        let diff = a[i] - b[i];
        sum += diff * diff;
        i += 1;
    }

    sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::distance::euclidean_distance;

    #[test]
    fn test_matches_scalar_kernel() {
        if !(is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")) {
            return;
        }

        // Odd length exercises the remainder loop
        let a: Vec<f64> = (0..131).map(|i| (i as f64) * 0.37 - 12.0).collect();
        let b: Vec<f64> = (0..131).map(|i| (i as f64 % 17.0) * 1.13).collect();

        let fast = unsafe { euclidean_distance_avx2(&a, &b) };
        let slow = euclidean_distance(&a, &b);
        assert!((fast - slow).abs() <= 1e-9 * slow.max(1.0));
    }
}
