//! Sparse polynomials over a field
//!
//! Only non-zero coefficients are stored, keyed by exponent. The zero
//! polynomial has no terms and degree 0.
//!
//! Each arithmetic operation comes in two forms: an associated `*_into`
//! function writing into a separate result, and an in-place method on `self`.

use crate::arith::Element;
use crate::error::{FecError, FecResult};
use crate::gf::Field;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Debug)]
pub struct Poly<F: Field> {
    field: F,
    terms: BTreeMap<usize, F::Elem>,
}

impl<F: Field> PartialEq for Poly<F> {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms
    }
}

impl<F: Field> Eq for Poly<F> {}

impl<F: Field> Poly<F> {
    /// The zero polynomial
    pub fn new(field: F) -> Self {
        Self {
            field,
            terms: BTreeMap::new(),
        }
    }

    /// Polynomial with dense coefficients, `coefficients[i]` for `x^i`
    pub fn from_coefficients(field: F, coefficients: &[F::Elem]) -> Self {
        let mut poly = Self::new(field);
        for (i, &c) in coefficients.iter().enumerate() {
            poly.set(i, c);
        }
        poly
    }

    /// The constant polynomial `1`
    pub fn one(field: F) -> Self {
        let one = field.one();
        let mut poly = Self::new(field);
        poly.set(0, one);
        poly
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    /// Highest exponent with a non-zero coefficient, 0 for the zero polynomial
    pub fn degree(&self) -> usize {
        self.terms.keys().next_back().copied().unwrap_or(0)
    }

    /// Leading coefficient, zero for the zero polynomial
    pub fn lead(&self) -> F::Elem {
        self.terms
            .values()
            .next_back()
            .copied()
            .unwrap_or(F::Elem::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, exponent: usize) -> F::Elem {
        self.terms.get(&exponent).copied().unwrap_or(F::Elem::ZERO)
    }

    /// Set a coefficient; a zero coefficient removes the term
    pub fn set(&mut self, exponent: usize, coef: F::Elem) {
        if coef == F::Elem::ZERO {
            self.terms.remove(&exponent);
        } else {
            self.terms.insert(exponent, coef);
        }
    }

    /// Non-zero terms in ascending exponent order
    pub fn terms(&self) -> impl Iterator<Item = (usize, F::Elem)> + '_ {
        self.terms.iter().map(|(&e, &c)| (e, c))
    }

    pub fn add_into(result: &mut Self, a: &Self, b: &Self) {
        result.terms = a.terms.clone();
        for (e, c) in b.terms() {
            let sum = result.field.add(result.get(e), c);
            result.set(e, sum);
        }
    }

    pub fn sub_into(result: &mut Self, a: &Self, b: &Self) {
        result.terms = a.terms.clone();
        for (e, c) in b.terms() {
            let diff = result.field.sub(result.get(e), c);
            result.set(e, diff);
        }
    }

    pub fn neg_into(result: &mut Self, a: &Self) {
        result.clear();
        for (e, c) in a.terms() {
            let neg = result.field.neg(c);
            result.set(e, neg);
        }
    }

    pub fn mul_into(result: &mut Self, a: &Self, b: &Self) {
        result.clear();
        for (i, ai) in a.terms() {
            for (j, bj) in b.terms() {
                let acc = result.field.add(result.get(i + j), result.field.mul(ai, bj));
                result.set(i + j, acc);
            }
        }
    }

    /// Schoolbook long division `n = q·d + r`, `deg(r) < deg(d)`
    ///
    /// Either output may be omitted.
    pub fn div_into(
        quotient: Option<&mut Self>,
        remainder: Option<&mut Self>,
        n: &Self,
        d: &Self,
    ) -> FecResult<()> {
        if d.is_zero() {
            return Err(FecError::DivideByZero);
        }
        let field = &n.field;
        let d_deg = d.degree();
        let d_lead = d.lead();

        let mut q = Self::new(field.clone());
        let mut r = n.clone();

        while !r.is_zero() && r.degree() >= d_deg {
            let shift = r.degree() - d_deg;
            let coef = field.div(r.lead(), d_lead)?;
            q.set(shift, coef);
            for (j, dj) in d.terms() {
                let updated = field.sub(r.get(j + shift), field.mul(coef, dj));
                r.set(j + shift, updated);
            }
        }

        if let Some(out) = quotient {
            out.terms = q.terms;
        }
        if let Some(out) = remainder {
            out.terms = r.terms;
        }
        Ok(())
    }

    /// Formal derivative; coefficient `i` is multiplied by the integer `i` in the field
    pub fn derivative_into(result: &mut Self, a: &Self) {
        result.clear();
        for (i, ai) in a.terms() {
            if i == 0 {
                continue;
            }
            let c = result.field.mul(ai, result.field.from_integer(i as u64));
            result.set(i - 1, c);
        }
    }

    pub fn add(&mut self, b: &Self) {
        let a = self.clone();
        Self::add_into(self, &a, b);
    }

    pub fn sub(&mut self, b: &Self) {
        let a = self.clone();
        Self::sub_into(self, &a, b);
    }

    pub fn neg(&mut self) {
        let a = self.clone();
        Self::neg_into(self, &a);
    }

    pub fn mul(&mut self, b: &Self) {
        let a = self.clone();
        Self::mul_into(self, &a, b);
    }

    /// Replace `self` by the quotient `self / d`
    pub fn div(&mut self, d: &Self) -> FecResult<()> {
        let a = self.clone();
        Self::div_into(Some(self), None, &a, d)
    }

    /// Replace `self` by the remainder `self mod d`
    pub fn rem(&mut self, d: &Self) -> FecResult<()> {
        let a = self.clone();
        Self::div_into(None, Some(self), &a, d)
    }

    pub fn derivative(&mut self) {
        let a = self.clone();
        Self::derivative_into(self, &a);
    }

    /// `self = self · (x + coef)`
    pub fn mul_to_x_plus_coef(&mut self, coef: F::Elem) {
        let mut next = BTreeMap::new();
        for (&e, &c) in &self.terms {
            // x · c·x^e
            let shifted = next.get(&(e + 1)).copied().unwrap_or(F::Elem::ZERO);
            next.insert(e + 1, self.field.add(shifted, c));
            // coef · c·x^e
            let here = next.get(&e).copied().unwrap_or(F::Elem::ZERO);
            next.insert(e, self.field.add(here, self.field.mul(coef, c)));
        }
        next.retain(|_, c| *c != F::Elem::ZERO);
        self.terms = next;
    }

    /// Value at `x` by Horner's rule
    pub fn eval(&self, x: F::Elem) -> F::Elem {
        if self.is_zero() {
            return F::Elem::ZERO;
        }
        (0..=self.degree()).rev().fold(F::Elem::ZERO, |acc, e| {
            self.field.add(self.field.mul(acc, x), self.get(e))
        })
    }

    /// Dense coefficients into `out`; terms beyond `out.len()` are dropped
    pub fn to_vec(&self, out: &mut [F::Elem]) {
        out.fill(F::Elem::ZERO);
        for (e, c) in self.terms() {
            if e < out.len() {
                out[e] = c;
            }
        }
    }

    /// Coefficients read as digits of an integer in base `card()`
    pub fn to_num(&self) -> FecResult<u128> {
        let base = self.field.card() as u128;
        let overflow = || FecError::invalid("polynomial does not fit in a 128-bit number");
        if self.is_zero() {
            return Ok(0);
        }
        (0..=self.degree()).rev().try_fold(0u128, |acc, e| {
            acc.checked_mul(base)
                .and_then(|v| v.checked_add(self.get(e).as_u128()))
                .ok_or_else(overflow)
        })
    }

    /// Inverse of [`Poly::to_num`]
    pub fn from_num(field: F, mut num: u128) -> Self {
        let base = field.card() as u128;
        let mut poly = Self::new(field);
        let mut e = 0;
        while num > 0 {
            poly.set(e, F::Elem::from_u128(num % base));
            num /= base;
            e += 1;
        }
        poly
    }
}

impl<F: Field> fmt::Display for Poly<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        for (n, (e, c)) in self.terms.iter().rev().enumerate() {
            if n > 0 {
                write!(f, " + ")?;
            }
            match e {
                0 => write!(f, "{}", c)?,
                1 => write!(f, "{}x", c)?,
                _ => write!(f, "{}x^{}", c, e)?,
            }
        }
        Ok(())
    }
}
