//! Mixed-radix transform for highly composite lengths
//!
//! Decimation in time: a length `m = p·q` transform (with `p` the smallest
//! prime factor of `m`) splits its input into `p` strided subsequences of
//! length `q`, transforms each recursively, and recombines with twiddles
//! `ω_m^(s·k)`. Prime lengths are evaluated directly.

use super::{Fft, Twiddles};
use crate::arith::{self, Element, Factors};
use crate::error::FecResult;
use crate::gf::Field;

#[derive(Clone, Debug)]
pub struct MixedRadix<F: Field> {
    tw: Twiddles<F>,
    factors: Factors,
}

impl<F: Field> MixedRadix<F> {
    pub fn new(field: F, n: usize) -> FecResult<Self> {
        let tw = Twiddles::new(field, n)?;
        let factors = arith::prime_factors(n as u64);
        log::trace!("mixed radix transform n={} factors={:?}", n, factors);
        Ok(Self { tw, factors })
    }

    /// Transform of `x`, whose length `m` divides `n`; `stride = n / m`
    fn transform(
        &self,
        x: &[F::Elem],
        depth: usize,
        stride: usize,
        twiddles: &[F::Elem],
    ) -> Vec<F::Elem> {
        let m = x.len();
        let n = self.tw.n;
        let field = &self.tw.field;

        if m == 1 {
            return x.to_vec();
        }

        let p = self.factors[depth] as usize;
        if p == m {
            return (0..m)
                .map(|k| {
                    x.iter().enumerate().fold(F::Elem::ZERO, |acc, (j, &v)| {
                        field.add(acc, field.mul(v, twiddles[(stride * j * k) % n]))
                    })
                })
                .collect();
        }

        let q = m / p;
        let subs: Vec<Vec<F::Elem>> = (0..p)
            .map(|s| {
                let sub: Vec<F::Elem> = x.iter().skip(s).step_by(p).copied().collect();
                self.transform(&sub, depth + 1, stride * p, twiddles)
            })
            .collect();

        (0..m)
            .map(|k| {
                subs.iter().enumerate().fold(F::Elem::ZERO, |acc, (s, y)| {
                    field.add(acc, field.mul(y[k % q], twiddles[(stride * s * k) % n]))
                })
            })
            .collect()
    }

    fn run(&self, output: &mut [F::Elem], input: &[F::Elem], twiddles: &[F::Elem]) {
        let n = self.tw.n;
        let mut x = vec![F::Elem::ZERO; n];
        let used = input.len().min(n);
        x[..used].copy_from_slice(&input[..used]);
        let result = self.transform(&x, 0, 1, twiddles);
        output[..n].copy_from_slice(&result);
    }
}

impl<F: Field> Fft<F> for MixedRadix<F> {
    fn len(&self) -> usize {
        self.tw.n
    }

    fn fft(&self, output: &mut [F::Elem], input: &[F::Elem]) {
        self.run(output, input, &self.tw.forward);
    }

    fn ifft(&self, output: &mut [F::Elem], input: &[F::Elem]) {
        self.run(output, input, &self.tw.inverse);
        self.tw.scale(&mut output[..self.tw.n]);
    }
}
