//! Integer helpers and the numeric element abstraction
//!
//! Field implementations are generic over the unsigned integer type that
//! carries their elements. [`Element`] collects the integer operations they
//! need; it is implemented for `u16`, `u32`, `u64` and `u128`.

use smallvec::SmallVec;
use std::fmt;
use std::hash::Hash;
use std::ops::{BitAnd, BitOr, BitXor, Shl, Shr};

/// Unsigned integer type used to carry field elements
pub trait Element:
    Copy
    + Default
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + 'static
    + bytemuck::Pod
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    /// Width of the type in bits
    const BITS: u32;
    const ZERO: Self;
    const ONE: Self;

    /// Truncating conversion from `u64`
    fn from_u64(value: u64) -> Self;

    /// Truncating conversion to `u64`
    fn as_u64(self) -> u64;

    /// Truncating conversion from `u128`
    fn from_u128(value: u128) -> Self;

    fn as_u128(self) -> u128;
}

macro_rules! impl_element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const BITS: u32 = <$t>::BITS;
                const ZERO: Self = 0;
                const ONE: Self = 1;

                #[inline]
                fn from_u64(value: u64) -> Self {
                    value as $t
                }

                #[inline]
                fn as_u64(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_u128(value: u128) -> Self {
                    value as $t
                }

                #[inline]
                fn as_u128(self) -> u128 {
                    self as u128
                }
            }
        )*
    };
}

impl_element!(u16, u32, u64, u128);

/// Prime factors in ascending order, repeated by multiplicity
pub type Factors = SmallVec<[u64; 32]>;

/// Greatest common divisor (Euclid)
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Modular exponentiation `base^exponent mod modulus`
pub fn exp_mod(base: u64, mut exponent: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let m = modulus as u128;
    let mut result = 1u128;
    let mut b = base as u128 % m;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result * b % m;
        }
        b = b * b % m;
        exponent >>= 1;
    }
    result as u64
}

/// Trial-division primality test, adequate for field sizes below 2^32
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Factorize `n` into ascending primes with multiplicity
pub fn prime_factors(mut n: u64) -> Factors {
    let mut factors = Factors::new();
    let mut d = 2u64;
    while d * d <= n {
        while n % d == 0 {
            factors.push(d);
            n /= d;
        }
        d += if d == 2 { 1 } else { 2 };
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// Distinct prime factors in ascending order
pub fn distinct_prime_factors(n: u64) -> Factors {
    let mut factors = prime_factors(n);
    factors.dedup();
    factors
}

/// Smallest divisor of `order` at least `m` built from its ascending prime factors
///
/// Multiplies the prime factors of `order` (smallest first, with
/// multiplicity) until the product reaches `m`. Returns `None` when even
/// `order` itself is below `m`.
pub fn code_len_high_compo(order: u64, m: u64) -> Option<u64> {
    if m <= 1 {
        return Some(1);
    }
    let mut len = 1u64;
    for p in prime_factors(order) {
        len *= p;
        if len >= m {
            return Some(len);
        }
    }
    None
}

/// Reverse the low `bits` bits of `value`
#[inline]
pub fn bit_reverse(value: usize, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    value.reverse_bits() >> (usize::BITS - bits)
}
