//! Finite fields used by the codecs
//!
//! - [`BinExtension`]: GF(2^b) for `b` up to 16, table driven
//! - [`Prime`]: GF(p) for a prime `p` below 2^32
//! - [`Nf4`]: up to four GF(65537) lanes packed into one element, with
//!   sentinel-aware `pack`/`unpack`
//!
//! Fields are cheap to clone. Polynomials, matrices and transforms own a copy
//! of the field they compute over.

pub mod bin_ext;
pub mod nf4;
pub mod prime;

pub use bin_ext::BinExtension;
pub use nf4::{GroupedValues, Nf4};
pub use prime::Prime;

use crate::arith::{self, Element};
use crate::error::{FecError, FecResult};
use std::fmt;

/// Arithmetic over a finite field (or a product of identical fields for NF4)
pub trait Field: Clone + fmt::Debug + Send + Sync + 'static {
    /// Integer type carrying the elements
    type Elem: Element;

    /// Cardinality `q` (sub-field cardinality for composite fields)
    fn card(&self) -> u64;

    fn characteristic(&self) -> u64;

    /// `true` when `a` is a valid element
    fn check(&self, a: Self::Elem) -> bool;

    #[inline]
    fn zero(&self) -> Self::Elem {
        Self::Elem::ZERO
    }

    fn one(&self) -> Self::Elem;

    fn add(&self, a: Self::Elem, b: Self::Elem) -> Self::Elem;

    fn sub(&self, a: Self::Elem, b: Self::Elem) -> Self::Elem;

    #[inline]
    fn neg(&self, a: Self::Elem) -> Self::Elem {
        self.sub(self.zero(), a)
    }

    fn mul(&self, a: Self::Elem, b: Self::Elem) -> Self::Elem;

    /// Multiplicative inverse; fails on zero
    fn inv(&self, a: Self::Elem) -> FecResult<Self::Elem>;

    #[inline]
    fn div(&self, a: Self::Elem, b: Self::Elem) -> FecResult<Self::Elem> {
        Ok(self.mul(a, self.inv(b)?))
    }

    /// `base^exponent` by square-and-multiply
    fn exp(&self, base: Self::Elem, mut exponent: u64) -> Self::Elem {
        let mut result = self.one();
        let mut b = base;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = self.mul(result, b);
            }
            b = self.mul(b, b);
            exponent >>= 1;
        }
        result
    }

    /// The integer `i` as a field element, i.e. `1 + 1 + ... + 1` (`i` times)
    fn from_integer(&self, i: u64) -> Self::Elem;

    /// Generator of the multiplicative group
    fn primitive_root(&self) -> Self::Elem;

    /// Element of multiplicative order exactly `n`; `n` must divide `q - 1`
    fn get_nth_root(&self, n: u64) -> FecResult<Self::Elem> {
        let order = self.card() - 1;
        if n == 0 || order % n != 0 {
            return Err(FecError::invalid(format!(
                "no root of unity of order {} in a field of {} elements",
                n,
                self.card()
            )));
        }
        Ok(self.exp(self.primitive_root(), order / n))
    }

    /// Smallest highly composite divisor of `q - 1` that is at least `m`
    fn get_code_len_high_compo(&self, m: u64) -> FecResult<u64> {
        arith::code_len_high_compo(self.card() - 1, m).ok_or_else(|| {
            FecError::invalid(format!(
                "code length {} exceeds the multiplicative group order {}",
                m,
                self.card() - 1
            ))
        })
    }

    /// `x[i] *= y[i]` element-wise
    fn hadamard_mul(&self, x: &mut [Self::Elem], y: &[Self::Elem]) {
        for (a, &b) in x.iter_mut().zip(y) {
            *a = self.mul(*a, b);
        }
    }
}
