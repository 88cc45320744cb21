//! Non-systematic Reed-Solomon over NF4 using number-theoretic transforms
//!
//! The `n_data` words are the coefficients of a polynomial `D`; the code
//! word is `D` evaluated at the `n`-th roots of unity, with `n` the smallest
//! power of two covering `n_data + n_parities`. Any `n_data` evaluations
//! determine `D`.
//!
//! Decoding interpolates from the surviving points `x_z = r^z`:
//!
//! ```text
//! D(x) = -(A(x) · S(x)) mod x^k
//! A(x) = Π (x - x_z)
//! S_j  = Σ v_z / (x_z · A'(x_z)) · x_z^-j      j < k
//! ```
//!
//! `S` is read off a single length-`n` transform and the product `A · S` is
//! computed with a length-`2k` transform.

use super::{DecodeContext, FecCode, FecType, Properties, ValueLocation};
use crate::arith::Element;
use crate::error::{FecError, FecResult};
use crate::fft::{make_fft, Fft};
use crate::gf::{Field, Nf4};
use crate::poly::Poly;
use log::debug;
use std::fmt;

pub struct RsNf4<T: Element> {
    field: Nf4<T>,
    word_size: usize,
    n_data: usize,
    n_parities: usize,
    n: usize,
    /// `r^i` for `i < n`
    r_powers: Vec<T>,
    fft: Box<dyn Fft<Nf4<T>>>,
    fft_2k: Box<dyn Fft<Nf4<T>>>,
    len_2k: usize,
}

impl<T: Element> fmt::Debug for RsNf4<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsNf4")
            .field("word_size", &self.word_size)
            .field("n_data", &self.n_data)
            .field("n_parities", &self.n_parities)
            .field("n", &self.n)
            .field("len_2k", &self.len_2k)
            .finish()
    }
}

impl<T: Element> RsNf4<T> {
    pub fn new(word_size: usize, n_data: usize, n_parities: usize) -> FecResult<Self> {
        if !matches!(word_size, 2 | 4 | 6 | 8) {
            return Err(FecError::invalid(format!(
                "word size {} is not supported, expected 2, 4, 6 or 8 bytes",
                word_size
            )));
        }
        if n_data == 0 || n_parities == 0 {
            return Err(FecError::invalid(format!(
                "need at least one data and one parity fragment, got {} and {}",
                n_data, n_parities
            )));
        }

        let field = Nf4::<T>::new((word_size / 2) as u32)?;
        let n = field.get_code_len_high_compo((n_data + n_parities) as u64)? as usize;
        let r = field.get_nth_root(n as u64)?;

        let mut r_powers = Vec::with_capacity(n);
        let mut acc = field.one();
        for _ in 0..n {
            r_powers.push(acc);
            acc = field.mul(acc, r);
        }

        let fft = make_fft(field.clone(), n)?;
        let len_2k = field.get_code_len_high_compo(2 * n_data as u64)? as usize;
        let fft_2k = make_fft(field.clone(), len_2k)?;

        debug!(
            "RsNf4: {} lanes n_data={} n_parities={} n={} len_2k={}",
            word_size / 2,
            n_data,
            n_parities,
            n,
            len_2k
        );

        Ok(Self {
            field,
            word_size,
            n_data,
            n_parities,
            n,
            r_powers,
            fft,
            fft_2k,
            len_2k,
        })
    }
}

impl<T: Element> FecCode for RsNf4<T> {
    type Elem = T;
    type Field = Nf4<T>;

    fn name(&self) -> &'static str {
        "RsNf4"
    }

    fn fec_type(&self) -> FecType {
        FecType::NonSystematic
    }

    fn field(&self) -> &Nf4<T> {
        &self.field
    }

    fn word_size(&self) -> usize {
        self.word_size
    }

    fn n_data(&self) -> usize {
        self.n_data
    }

    fn n_parities(&self) -> usize {
        self.n_parities
    }

    fn code_len(&self) -> usize {
        self.n
    }

    fn get_n_outputs(&self) -> usize {
        self.n
    }

    fn encode(
        &self,
        output: &mut [T],
        props: &mut [Properties],
        offset: u64,
        words: &[T],
    ) -> FecResult<()> {
        if words.len() != self.n_data || output.len() < self.n || props.len() < self.n {
            return Err(FecError::invalid(format!(
                "encode needs {} words and room for {} outputs and properties",
                self.n_data, self.n
            )));
        }

        let packed: Vec<T> = words.iter().map(|&w| self.field.pack(w, 0)).collect();
        self.fft.fft(&mut output[..self.n], &packed);

        let outputs = output.iter_mut().zip(props.iter_mut()).take(self.n);
        for (i, (out, prop)) in outputs.enumerate() {
            let grouped = self.field.unpack(*out);
            if grouped.flag > 0 {
                prop.add(ValueLocation::new(offset, i), grouped.flag.to_string());
            }
            *out = grouped.values;
        }
        Ok(())
    }

    fn decode_add_data(&mut self, _fragment_index: usize, _row: usize) -> FecResult<()> {
        Err(FecError::NotApplicable {
            operation: "decode_add_data",
            codec: "RsNf4",
        })
    }

    fn decode_add_parities(&mut self, _fragment_index: usize, _row: usize) -> FecResult<()> {
        Ok(())
    }

    fn decode_build(&mut self) -> FecResult<()> {
        Ok(())
    }

    fn decode_init(&self, fragment_ids: &[usize]) -> FecResult<DecodeContext<Nf4<T>>> {
        super::check_fragment_ids(fragment_ids, self.n_data, self.n)?;
        let field = &self.field;
        let mut context = DecodeContext::new(field.clone(), fragment_ids, self.n, self.len_2k);

        for (x, &id) in context.vx.iter_mut().zip(fragment_ids) {
            *x = self.r_powers[id];
        }

        // A(x) = Π (x - x_i)
        let mut a = Poly::one(field.clone());
        for &x in &context.vx {
            a.mul_to_x_plus_coef(field.neg(x));
        }

        // A'(r^j) for every j, then 1 / (x_i · A'(x_i)) at the surviving ids
        let mut derivative = Poly::new(field.clone());
        Poly::derivative_into(&mut derivative, &a);
        let mut dense = vec![T::ZERO; self.n];
        derivative.to_vec(&mut dense);
        self.fft.fft(&mut context.inv_a_i, &dense);
        for (i, &id) in fragment_ids.iter().enumerate() {
            let factor = field.mul(context.inv_a_i[id], context.vx[i]);
            context.inv_a_i[id] = field.inv(factor)?;
        }

        let mut a_dense = vec![T::ZERO; self.len_2k];
        a.to_vec(&mut a_dense);
        self.fft_2k.fft(&mut context.a_fft_2k, &a_dense);
        context.a = a;

        Ok(context)
    }

    fn decode_prepare(
        &self,
        context: &DecodeContext<Nf4<T>>,
        props: &[Properties],
        offset: u64,
        words: &mut [T],
    ) -> FecResult<()> {
        if props.len() < self.n {
            return Err(FecError::invalid(format!(
                "RsNf4 decode needs properties for all {} fragments, got {}",
                self.n,
                props.len()
            )));
        }
        for (word, &id) in words.iter_mut().zip(context.fragment_ids()) {
            let flag = match props[id].get(ValueLocation::new(offset, id)) {
                Some(value) => value.parse::<u32>().map_err(|_| {
                    FecError::invalid(format!(
                        "bad flag {:?} for fragment {} at offset {}",
                        value, id, offset
                    ))
                })?,
                None => 0,
            };
            *word = self.field.pack(*word, flag);
        }
        Ok(())
    }

    fn decode_apply(
        &self,
        context: &DecodeContext<Nf4<T>>,
        output: &mut [T],
        words: &[T],
    ) -> FecResult<()> {
        let field = &self.field;
        let n = self.n;
        let k = self.n_data;

        let mut w = vec![T::ZERO; n];
        for (&v, &id) in words.iter().zip(context.fragment_ids()) {
            w[id] = field.mul(v, context.inv_a_i[id]);
        }

        // E[t] = Σ w_z r^(zt), so E[n - j] = Σ w_z x_z^-j
        let mut e = vec![T::ZERO; n];
        self.fft.fft(&mut e, &w);
        let s: Vec<T> = (0..k).map(|j| e[(n - j) % n]).collect();

        let mut product = vec![T::ZERO; self.len_2k];
        self.fft_2k.fft(&mut product, &s);
        field.hadamard_mul(&mut product, &context.a_fft_2k);
        let mut coefficients = vec![T::ZERO; self.len_2k];
        self.fft_2k.ifft(&mut coefficients, &product);

        for (out, &c) in output.iter_mut().zip(&coefficients).take(k) {
            *out = field.unpack(field.neg(c)).values;
        }
        Ok(())
    }
}
