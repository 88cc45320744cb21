//! Binary extension field GF(2^b), 1 <= b <= 16
//!
//! Addition and subtraction are XOR. Multiplication, division and inversion go
//! through logarithm/antilogarithm tables generated from a primitive
//! polynomial for each width. Tables are built once per width and shared by
//! every field instance of that width.
//!
//! Widths 8 and 16 use the usual storage polynomials:
//!
//! - **GF(2^8)**: 0x11D (x⁸ + x⁴ + x³ + x² + 1)
//! - **GF(2^16)**: 0x1100B (x¹⁶ + x¹² + x³ + x + 1)

use super::Field;
use crate::arith::Element;
use crate::error::{FecError, FecResult};
use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;

/// Largest supported width in bits
pub const MAX_BITS: u32 = 16;

/// Primitive polynomial for each width, indexed by `b`
const PRIMITIVE_POLYNOMIALS: [u32; MAX_BITS as usize + 1] = [
    0, 0x3, 0x7, 0xB, 0x13, 0x25, 0x43, 0x89, 0x11D, 0x211, 0x409, 0x805, 0x1053, 0x201B,
    0x4443, 0x8003, 0x1100B,
];

static TABLES: [OnceLock<GaloisTable>; MAX_BITS as usize + 1] =
    [const { OnceLock::new() }; MAX_BITS as usize + 1];

/// Logarithm and antilogarithm tables for one width
pub struct GaloisTable {
    bits: u32,
    pub log: Vec<u32>,
    /// Doubled to `2 * (q - 1)` entries so a sum of two logs never needs a modulo
    pub antilog: Vec<u32>,
}

impl GaloisTable {
    fn build(bits: u32) -> FecResult<Self> {
        let count = 1usize << bits;
        let limit = count - 1;
        let generator = PRIMITIVE_POLYNOMIALS[bits as usize];

        let mut log = vec![0u32; count];
        let mut antilog = vec![0u32; 2 * limit];
        let mut b = 1u32;

        for l in 0..limit {
            if l > 0 && b == 1 {
                return Err(FecError::invalid(format!(
                    "polynomial {:#x} is not primitive for GF(2^{})",
                    generator, bits
                )));
            }
            log[b as usize] = l as u32;
            antilog[l] = b;
            antilog[l + limit] = b;

            b <<= 1;
            if b & count as u32 != 0 {
                b ^= generator;
            }
        }

        // log(0) is undefined; keep an out-of-range marker
        log[0] = limit as u32;

        Ok(Self { bits, log, antilog })
    }

    fn get(bits: u32) -> FecResult<&'static GaloisTable> {
        let slot = &TABLES[bits as usize];
        if let Some(table) = slot.get() {
            return Ok(table);
        }
        let table = Self::build(bits)?;
        Ok(slot.get_or_init(|| table))
    }

    #[inline]
    fn limit(&self) -> usize {
        (1usize << self.bits) - 1
    }
}

/// GF(2^b) with elements carried in `T`
pub struct BinExtension<T> {
    bits: u32,
    tables: &'static GaloisTable,
    _elem: PhantomData<T>,
}

impl<T> Clone for BinExtension<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BinExtension<T> {}

impl<T> fmt::Debug for BinExtension<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinExtension")
            .field("bits", &self.bits)
            .field("polynomial", &format_args!("{:#x}", PRIMITIVE_POLYNOMIALS[self.bits as usize]))
            .finish()
    }
}

impl<T: Element> BinExtension<T> {
    /// Build GF(2^bits)
    pub fn new(bits: u32) -> FecResult<Self> {
        if bits == 0 || bits > MAX_BITS {
            return Err(FecError::invalid(format!(
                "GF(2^{}) is not supported, width must be in 1..={}",
                bits, MAX_BITS
            )));
        }
        if T::BITS < bits {
            return Err(FecError::invalid(format!(
                "{}-bit elements cannot hold GF(2^{})",
                T::BITS,
                bits
            )));
        }
        Ok(Self {
            bits,
            tables: GaloisTable::get(bits)?,
            _elem: PhantomData,
        })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Discrete logarithm of a non-zero element
    pub fn log(&self, a: T) -> Option<u32> {
        if a == T::ZERO {
            None
        } else {
            Some(self.tables.log[a.as_u64() as usize])
        }
    }

    #[inline]
    fn elem(&self, v: u32) -> T {
        T::from_u64(v as u64)
    }
}

impl<T: Element> Field for BinExtension<T> {
    type Elem = T;

    fn card(&self) -> u64 {
        1u64 << self.bits
    }

    fn characteristic(&self) -> u64 {
        2
    }

    fn check(&self, a: T) -> bool {
        a.as_u128() < (1u128 << self.bits)
    }

    #[inline]
    fn one(&self) -> T {
        T::ONE
    }

    #[inline]
    fn add(&self, a: T, b: T) -> T {
        a ^ b
    }

    #[inline]
    fn sub(&self, a: T, b: T) -> T {
        a ^ b
    }

    #[inline]
    fn neg(&self, a: T) -> T {
        a
    }

    #[inline]
    fn mul(&self, a: T, b: T) -> T {
        if a == T::ZERO || b == T::ZERO {
            return T::ZERO;
        }
        let log_a = self.tables.log[a.as_u64() as usize] as usize;
        let log_b = self.tables.log[b.as_u64() as usize] as usize;
        self.elem(self.tables.antilog[log_a + log_b])
    }

    fn inv(&self, a: T) -> FecResult<T> {
        if a == T::ZERO {
            return Err(FecError::FieldDivideByZero);
        }
        let log_a = self.tables.log[a.as_u64() as usize] as usize;
        Ok(self.elem(self.tables.antilog[self.tables.limit() - log_a]))
    }

    fn div(&self, a: T, b: T) -> FecResult<T> {
        if b == T::ZERO {
            return Err(FecError::FieldDivideByZero);
        }
        if a == T::ZERO {
            return Ok(T::ZERO);
        }
        let limit = self.tables.limit();
        let log_a = self.tables.log[a.as_u64() as usize] as usize;
        let log_b = self.tables.log[b.as_u64() as usize] as usize;
        Ok(self.elem(self.tables.antilog[log_a + limit - log_b]))
    }

    fn exp(&self, base: T, exponent: u64) -> T {
        if exponent == 0 {
            return T::ONE;
        }
        if base == T::ZERO {
            return T::ZERO;
        }
        let limit = self.tables.limit() as u64;
        let log_b = self.tables.log[base.as_u64() as usize] as u64;
        let idx = (log_b * (exponent % limit)) % limit;
        self.elem(self.tables.antilog[idx as usize])
    }

    fn from_integer(&self, i: u64) -> T {
        T::from_u64(i & 1)
    }

    fn primitive_root(&self) -> T {
        self.elem(self.tables.antilog[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gf256_basic_ops() {
        let gf = BinExtension::<u32>::new(8).unwrap();
        assert_eq!(gf.card(), 256);
        assert_eq!(gf.add(0x53, 0xCA), 0x53 ^ 0xCA);
        assert_eq!(gf.add(0x53, 0xCA), gf.sub(0x53, 0xCA));
        // x * x^7 = x^8 = x^4 + x^3 + x^2 + 1
        assert_eq!(gf.mul(2, 128), 0x1D);
        assert_eq!(gf.mul(0, 77), 0);
    }

    #[test]
    fn test_gf65536_mul_div() {
        let gf = BinExtension::<u16>::new(16).unwrap();
        let a = 0x1234;
        let b = 0x5678;
        let product = gf.mul(a, b);
        assert_eq!(gf.div(product, a).unwrap(), b);
        assert_eq!(gf.div(product, b).unwrap(), a);
        assert_eq!(gf.mul(2, 0x8000), 0x100B);
    }

    #[test]
    fn every_nonzero_element_has_an_inverse() {
        let gf = BinExtension::<u16>::new(8).unwrap();
        for a in 1u16..256 {
            let inv = gf.inv(a).unwrap();
            assert_eq!(gf.mul(a, inv), 1, "a = {}", a);
        }
        assert_eq!(gf.inv(0), Err(FecError::FieldDivideByZero));
        assert_eq!(gf.div(5, 0), Err(FecError::FieldDivideByZero));
    }

    #[test]
    fn exp_matches_repeated_multiplication() {
        let gf = BinExtension::<u32>::new(4).unwrap();
        for base in 0u32..16 {
            let mut acc = 1u32;
            for e in 0..40u64 {
                assert_eq!(gf.exp(base, e), acc, "base {} exp {}", base, e);
                acc = gf.mul(acc, base);
            }
        }
    }

    #[test]
    fn nth_roots_have_the_requested_order() {
        let gf = BinExtension::<u32>::new(8).unwrap();
        for n in [1u64, 3, 5, 15, 17, 51, 85, 255] {
            let r = gf.get_nth_root(n).unwrap();
            assert_eq!(gf.exp(r, n), 1);
            for d in 1..n {
                if n % d == 0 {
                    assert_ne!(gf.exp(r, d), 1, "order of root for n={} divides {}", n, d);
                }
            }
        }
        assert!(gf.get_nth_root(2).is_err());
        assert_eq!(gf.get_code_len_high_compo(6).unwrap(), 15);
        assert!(gf.get_code_len_high_compo(256).is_err());
    }

    #[test]
    fn derivative_scalars_reduce_mod_two() {
        let gf = BinExtension::<u32>::new(8).unwrap();
        assert_eq!(gf.from_integer(0), 0);
        assert_eq!(gf.from_integer(3), 1);
        assert_eq!(gf.from_integer(4), 0);
    }

    #[test]
    fn every_width_builds() {
        for bits in 1..=MAX_BITS {
            let gf = BinExtension::<u32>::new(bits).unwrap();
            assert_eq!(gf.exp(gf.primitive_root(), gf.card() - 1), 1);
        }
    }

    #[test]
    fn rejects_unsupported_widths() {
        assert!(BinExtension::<u32>::new(0).is_err());
        assert!(BinExtension::<u32>::new(17).is_err());
        assert!(BinExtension::<u16>::new(16).is_ok());
    }

    #[test]
    fn check_bounds_elements() {
        let gf = BinExtension::<u32>::new(8).unwrap();
        assert!(gf.check(255));
        assert!(!gf.check(256));
        assert_eq!(gf.log(0), None);
        assert_eq!(gf.log(1), Some(0));
    }
}
