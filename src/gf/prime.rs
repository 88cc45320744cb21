//! Prime field GF(p)

use super::Field;
use crate::arith::{self, Element};
use crate::error::{FecError, FecResult};
use std::marker::PhantomData;

/// GF(p) for a prime `p < 2^32`, elements in `0..p`
#[derive(Debug)]
pub struct Prime<T> {
    p: u64,
    root: u64,
    _elem: PhantomData<T>,
}

impl<T> Clone for Prime<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Prime<T> {}

impl<T: Element> Prime<T> {
    pub fn new(p: u64) -> FecResult<Self> {
        if p >= 1u64 << 32 {
            return Err(FecError::invalid(format!(
                "prime {} is too large, it must be below 2^32",
                p
            )));
        }
        if !arith::is_prime(p) {
            return Err(FecError::invalid(format!("{} is not prime", p)));
        }
        if T::BITS < 64 && p - 1 >= 1u64 << T::BITS {
            return Err(FecError::invalid(format!(
                "{}-bit elements cannot hold GF({})",
                T::BITS,
                p
            )));
        }
        let root = find_primitive_root(p);
        log::debug!("GF({}) primitive root {}", p, root);
        Ok(Self {
            p,
            root,
            _elem: PhantomData,
        })
    }

    pub fn modulus(&self) -> u64 {
        self.p
    }
}

/// Smallest generator of the multiplicative group of GF(p)
fn find_primitive_root(p: u64) -> u64 {
    let order = p - 1;
    let factors = arith::distinct_prime_factors(order);
    (1..p)
        .find(|&g| factors.iter().all(|&q| arith::exp_mod(g, order / q, p) != 1))
        .unwrap_or(1)
}

impl<T: Element> Field for Prime<T> {
    type Elem = T;

    fn card(&self) -> u64 {
        self.p
    }

    fn characteristic(&self) -> u64 {
        self.p
    }

    fn check(&self, a: T) -> bool {
        a.as_u128() < self.p as u128
    }

    #[inline]
    fn one(&self) -> T {
        T::ONE
    }

    #[inline]
    fn add(&self, a: T, b: T) -> T {
        let c = a.as_u64() + b.as_u64();
        T::from_u64(if c >= self.p { c - self.p } else { c })
    }

    #[inline]
    fn sub(&self, a: T, b: T) -> T {
        let (a, b) = (a.as_u64(), b.as_u64());
        T::from_u64(if a >= b { a - b } else { self.p - b + a })
    }

    #[inline]
    fn mul(&self, a: T, b: T) -> T {
        T::from_u64(a.as_u64() * b.as_u64() % self.p)
    }

    fn inv(&self, a: T) -> FecResult<T> {
        let a = a.as_u64();
        if a == 0 {
            return Err(FecError::FieldDivideByZero);
        }
        Ok(T::from_u64(arith::exp_mod(a, self.p - 2, self.p)))
    }

    fn exp(&self, base: T, exponent: u64) -> T {
        T::from_u64(arith::exp_mod(base.as_u64(), exponent, self.p))
    }

    fn from_integer(&self, i: u64) -> T {
        T::from_u64(i % self.p)
    }

    fn primitive_root(&self) -> T {
        T::from_u64(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fermat_prime_arithmetic() {
        let gf = Prime::<u32>::new(65537).unwrap();
        assert_eq!(gf.card(), 65537);
        assert_eq!(gf.add(65536, 1), 0);
        assert_eq!(gf.sub(0, 1), 65536);
        assert_eq!(gf.neg(5), 65532);
        assert_eq!(gf.mul(65536, 65536), 1);
        assert_eq!(gf.primitive_root(), 3);
        assert_eq!(gf.from_integer(65538), 1);
    }

    #[test]
    fn inverse_and_division() {
        let gf = Prime::<u64>::new(97).unwrap();
        for a in 1u64..97 {
            assert_eq!(gf.mul(a, gf.inv(a).unwrap()), 1);
        }
        assert_eq!(gf.inv(0), Err(FecError::FieldDivideByZero));
        assert_eq!(gf.div(10, 5).unwrap(), 2);
    }

    #[test]
    fn nth_roots_of_65537() {
        let gf = Prime::<u32>::new(65537).unwrap();
        for n in [2u64, 4, 8, 256, 65536] {
            let r = gf.get_nth_root(n).unwrap();
            assert_eq!(gf.exp(r, n), 1);
            assert_ne!(gf.exp(r, n / 2), 1);
        }
        assert!(gf.get_nth_root(3).is_err());
        assert_eq!(gf.get_code_len_high_compo(5).unwrap(), 8);
    }

    #[test]
    fn small_primes_find_generators() {
        for (p, g) in [(2u64, 1u64), (3, 2), (7, 3), (11, 2), (257, 3)] {
            let gf = Prime::<u32>::new(p).unwrap();
            assert_eq!(gf.primitive_root(), g as u32, "p = {}", p);
        }
    }

    #[test]
    fn rejects_composites_and_narrow_storage() {
        assert!(Prime::<u32>::new(65535).is_err());
        assert!(Prime::<u32>::new(1).is_err());
        assert!(Prime::<u16>::new(65537).is_err());
        assert!(Prime::<u16>::new(257).is_ok());
    }
}
