//! SSE4.1 kernels
//!
//! Multiplication relies on `2^16 ≡ -1 (mod 65537)`: a 32-bit product
//! `hi * 2^16 + lo` reduces to `lo - hi`. The only product that does not fit
//! in 32 bits is `65536 * 65536`, which wraps to zero and is patched to one.

use std::arch::x86_64::*;

#[inline(always)]
unsafe fn load(a: u128) -> __m128i {
    _mm_loadu_si128(&a as *const u128 as *const __m128i)
}

#[inline(always)]
unsafe fn store(v: __m128i) -> u128 {
    let mut out = 0u128;
    _mm_storeu_si128(&mut out as *mut u128 as *mut __m128i, v);
    out
}

#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn add_vec(a: __m128i, b: __m128i) -> __m128i {
    let modulus = _mm_set1_epi32(65537);
    let max = _mm_set1_epi32(65536);
    let c = _mm_add_epi32(a, b);
    let over = _mm_cmpgt_epi32(c, max);
    _mm_sub_epi32(c, _mm_and_si128(over, modulus))
}

#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn sub_vec(a: __m128i, b: __m128i) -> __m128i {
    let modulus = _mm_set1_epi32(65537);
    let c = _mm_sub_epi32(a, b);
    let under = _mm_cmpgt_epi32(b, a);
    _mm_add_epi32(c, _mm_and_si128(under, modulus))
}

#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn mul_vec(a: __m128i, b: __m128i) -> __m128i {
    let modulus = _mm_set1_epi32(65537);
    let max = _mm_set1_epi32(65536);
    let low_mask = _mm_set1_epi32(0xFFFF);

    let c = _mm_mullo_epi32(a, b);
    let lo = _mm_and_si128(c, low_mask);
    let hi = _mm_srli_epi32(c, 16);
    let r = _mm_sub_epi32(lo, hi);
    let under = _mm_cmpgt_epi32(hi, lo);
    let r = _mm_add_epi32(r, _mm_and_si128(under, modulus));

    // (-1) * (-1)
    let both_max = _mm_and_si128(_mm_cmpeq_epi32(a, max), _mm_cmpeq_epi32(b, max));
    _mm_or_si128(r, _mm_and_si128(both_max, _mm_set1_epi32(1)))
}

/// # Safety
/// The CPU must support SSE4.1
#[target_feature(enable = "sse4.1")]
pub unsafe fn add(a: u128, b: u128) -> u128 {
    store(add_vec(load(a), load(b)))
}

/// # Safety
/// The CPU must support SSE4.1
#[target_feature(enable = "sse4.1")]
pub unsafe fn sub(a: u128, b: u128) -> u128 {
    store(sub_vec(load(a), load(b)))
}

/// # Safety
/// The CPU must support SSE4.1
#[target_feature(enable = "sse4.1")]
pub unsafe fn mul(a: u128, b: u128) -> u128 {
    store(mul_vec(load(a), load(b)))
}

/// # Safety
/// The CPU must support SSE4.1
#[target_feature(enable = "sse4.1")]
pub unsafe fn hadamard_mul(x: &mut [u128], y: &[u128]) {
    for (a, &b) in x.iter_mut().zip(y) {
        *a = store(mul_vec(load(*a), load(b)));
    }
}
