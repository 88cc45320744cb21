//! Per-call decode state

use crate::arith::Element;
use crate::gf::Field;
use crate::poly::Poly;

/// State built from the set of surviving fragments for one decode call
///
/// For the transform codec it holds the interpolation data:
///
/// - `vx[i] = r^(fragment_ids[i])`, the evaluation points
/// - `a`, the erasure locator `A(x) = Π(x - vx[i])`
/// - `inv_a_i[z] = 1 / (x_z · A'(x_z))` for each surviving fragment id `z`
/// - `a_fft_2k`, the transform of `A` over length `len_2k`
///
/// The matrix codec only uses `fragment_ids`.
#[derive(Clone, Debug)]
pub struct DecodeContext<F: Field> {
    fragment_ids: Vec<usize>,
    pub vx: Vec<F::Elem>,
    pub a: Poly<F>,
    pub inv_a_i: Vec<F::Elem>,
    pub a_fft_2k: Vec<F::Elem>,
    len_2k: usize,
}

impl<F: Field> DecodeContext<F> {
    /// Zeroed context for a code of length `n`
    pub fn new(field: F, fragment_ids: &[usize], n: usize, len_2k: usize) -> Self {
        Self {
            fragment_ids: fragment_ids.to_vec(),
            vx: vec![F::Elem::ZERO; fragment_ids.len()],
            a: Poly::new(field),
            inv_a_i: vec![F::Elem::ZERO; n],
            a_fft_2k: vec![F::Elem::ZERO; len_2k],
            len_2k,
        }
    }

    pub fn fragment_ids(&self) -> &[usize] {
        &self.fragment_ids
    }

    pub fn len_2k(&self) -> usize {
        self.len_2k
    }
}
