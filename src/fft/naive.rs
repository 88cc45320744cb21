//! Direct evaluation, `O(n²)`

use super::{Fft, Twiddles};
use crate::arith::Element;
use crate::error::FecResult;
use crate::gf::Field;

#[derive(Clone, Debug)]
pub struct Naive<F: Field> {
    tw: Twiddles<F>,
}

impl<F: Field> Naive<F> {
    pub fn new(field: F, n: usize) -> FecResult<Self> {
        Ok(Self {
            tw: Twiddles::new(field, n)?,
        })
    }

    fn run(&self, output: &mut [F::Elem], input: &[F::Elem], twiddles: &[F::Elem]) {
        let n = self.tw.n;
        let field = &self.tw.field;
        for (k, out) in output.iter_mut().enumerate().take(n) {
            *out = input
                .iter()
                .take(n)
                .enumerate()
                .fold(F::Elem::ZERO, |acc, (j, &x)| {
                    field.add(acc, field.mul(x, twiddles[(j * k) % n]))
                });
        }
    }
}

impl<F: Field> Fft<F> for Naive<F> {
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
