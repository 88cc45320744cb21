//! Lane-parallel arithmetic modulo 65537 for NF4 elements
//!
//! An NF4 element is a `u128` holding four 32-bit lanes, each a GF(65537)
//! value in `0..=65536`. These routines add, subtract and multiply all four
//! lanes at once.
//!
//! Dispatch:
//! - x86_64 with SSE4.1: `_mm_mullo_epi32` based kernels
//! - everything else: scalar per-lane loop
//!
//! The level is detected once and cached.

pub mod scalar;
#[cfg(target_arch = "x86_64")]
pub mod sse41;

use std::sync::OnceLock;

/// Lane modulus
pub const MODULUS: u32 = 65537;

static SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();

/// Lane-parallel implementation to use for the current CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    /// Scalar per-lane loop
    None,
    /// x86_64 SSE4.1 (four 32-bit lanes per register)
    Sse41,
}

/// Detect the best implementation for the running CPU
pub fn detect_simd_support() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("sse4.1") {
            return SimdLevel::Sse41;
        }
    }
    SimdLevel::None
}

/// Cached result of [`detect_simd_support`]
#[inline]
pub fn simd_level() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(|| {
        let level = detect_simd_support();
        log::debug!("NF4 lane arithmetic: {:?}", level);
        level
    })
}

#[inline]
pub fn add(a: u128, b: u128) -> u128 {
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: SSE4.1 support was detected at runtime
        SimdLevel::Sse41 => unsafe { sse41::add(a, b) },
        _ => scalar::add(a, b),
    }
}

#[inline]
pub fn sub(a: u128, b: u128) -> u128 {
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: SSE4.1 support was detected at runtime
        SimdLevel::Sse41 => unsafe { sse41::sub(a, b) },
        _ => scalar::sub(a, b),
    }
}

#[inline]
pub fn mul(a: u128, b: u128) -> u128 {
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: SSE4.1 support was detected at runtime
        SimdLevel::Sse41 => unsafe { sse41::mul(a, b) },
        _ => scalar::mul(a, b),
    }
}

/// `x[i] *= y[i]` over the shorter of the two slices
pub fn hadamard_mul(x: &mut [u128], y: &[u128]) {
    match simd_level() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: SSE4.1 support was detected at runtime
        SimdLevel::Sse41 => unsafe { sse41::hadamard_mul(x, y) },
        _ => scalar::hadamard_mul(x, y),
    }
}
