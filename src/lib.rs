pub mod core;
pub mod simd;
pub mod storage;
