//! Number-theoretic transforms
//!
//! Evaluation of a coefficient vector at the `n`-th roots of unity of a
//! field: `X[k] = Σ x[j]·r^(jk)` with `r` of multiplicative order `n`.
//! Inputs shorter than `n` are zero-extended. The inverse transform uses
//! `r⁻¹` and scales by `1/n`.
//!
//! - [`Radix2`]: iterative Cooley-Tukey, `n` a power of two
//! - [`MixedRadix`]: recursive decimation in time over the prime factors of `n`
//! - [`Naive`]: direct `O(n²)` evaluation, used as a reference

pub mod mixed;
pub mod naive;
pub mod radix2;

pub use mixed::MixedRadix;
pub use naive::Naive;
pub use radix2::Radix2;

use crate::error::FecResult;
use crate::gf::Field;

/// Forward and inverse transform of a fixed length
pub trait Fft<F: Field>: Send + Sync {
    /// Transform length `n`
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `output` (length `n`) = transform of `input` (length at most `n`)
    fn fft(&self, output: &mut [F::Elem], input: &[F::Elem]);

    /// Inverse of [`Fft::fft`]
    fn ifft(&self, output: &mut [F::Elem], input: &[F::Elem]);
}

/// Radix-2 for powers of two, mixed radix otherwise
pub fn make_fft<F: Field>(field: F, n: usize) -> FecResult<Box<dyn Fft<F>>> {
    if n.is_power_of_two() {
        Ok(Box::new(Radix2::new(field, n)?))
    } else {
        Ok(Box::new(MixedRadix::new(field, n)?))
    }
}

/// Twiddle tables shared by the transforms
#[derive(Clone, Debug)]
pub(crate) struct Twiddles<F: Field> {
    pub field: F,
    pub n: usize,
    /// `r^i` for `i < n`
    pub forward: Vec<F::Elem>,
    /// `r^-i` for `i < n`
    pub inverse: Vec<F::Elem>,
    /// `1/n` in the field
    pub inv_n: F::Elem,
}

impl<F: Field> Twiddles<F> {
    pub fn new(field: F, n: usize) -> FecResult<Self> {
        let r = field.get_nth_root(n as u64)?;
        let mut forward = Vec::with_capacity(n);
        let mut acc = field.one();
        for _ in 0..n {
            forward.push(acc);
            acc = field.mul(acc, r);
        }
        let inverse = (0..n).map(|i| forward[(n - i) % n]).collect();
        let inv_n = field.inv(field.from_integer(n as u64))?;
        Ok(Self {
            field,
            n,
            forward,
            inverse,
            inv_n,
        })
    }

    pub fn scale(&self, values: &mut [F::Elem]) {
        for v in values.iter_mut() {
            *v = self.field.mul(*v, self.inv_n);
        }
    }
}
