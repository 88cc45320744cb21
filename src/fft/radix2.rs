//! Iterative radix-2 Cooley-Tukey transform

use super::{Fft, Twiddles};
use crate::arith::{self, Element};
use crate::error::{FecError, FecResult};
use crate::gf::Field;

#[derive(Clone, Debug)]
pub struct Radix2<F: Field> {
    tw: Twiddles<F>,
    log_n: u32,
}

impl<F: Field> Radix2<F> {
    pub fn new(field: F, n: usize) -> FecResult<Self> {
        if !n.is_power_of_two() {
            return Err(FecError::invalid(format!(
                "radix-2 transform length {} is not a power of two",
                n
            )));
        }
        Ok(Self {
            tw: Twiddles::new(field, n)?,
            log_n: n.trailing_zeros(),
        })
    }

    fn transform(&self, output: &mut [F::Elem], input: &[F::Elem], twiddles: &[F::Elem]) {
        let n = self.tw.n;
        let field = &self.tw.field;

        output[..n].fill(F::Elem::ZERO);
        for (i, &x) in input.iter().enumerate().take(n) {
            output[arith::bit_reverse(i, self.log_n)] = x;
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let step = n / len;
            for start in (0..n).step_by(len) {
                for j in 0..half {
                    let w = twiddles[j * step];
                    let u = output[start + j];
                    let v = field.mul(output[start + j + half], w);
                    output[start + j] = field.add(u, v);
                    output[start + j + half] = field.sub(u, v);
                }
            }
            len <<= 1;
        }
    }
}

impl<F: Field> Fft<F> for Radix2<F> {
    fn len(&self) -> usize {
        self.tw.n
    }

    fn fft(&self, output: &mut [F::Elem], input: &[F::Elem]) {
        self.transform(output, input, &self.tw.forward);
    }

    fn ifft(&self, output: &mut [F::Elem], input: &[F::Elem]) {
        self.transform(output, input, &self.tw.inverse);
        self.tw.scale(&mut output[..self.tw.n]);
    }
}
