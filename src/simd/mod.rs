pub mod distance;
#[cfg(target_arch = "x86_64")]
pub mod avx2;

pub type DistanceFunc = unsafe fn(&[f64], &[f64]) -> f64;

pub fn get_euclidean_distance() -> DistanceFunc {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            return avx2::euclidean_distance_avx2;
        }
    }

    // Fallback
    wrapper_scalar
}

unsafe fn wrapper_scalar(a: &[f64], b: &[f64]) -> f64 {
    distance::euclidean_distance(a, b)
}
