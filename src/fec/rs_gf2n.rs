//! Systematic Reed-Solomon over GF(2^8) or GF(2^16)
//!
//! Parities are `G · data` for an `n_parities × n_data` generator `G` such
//! that `[I; G]` is MDS. Decoding assembles the `n_data × n_data` rows of
//! `[I; G]` that correspond to the surviving fragments and inverts them.

use super::{DecodeContext, FecCode, FecType, Properties};
use crate::arith::Element;
use crate::error::{FecError, FecResult};
use crate::gf::{BinExtension, Field};
use crate::matrix::Matrix;
use log::debug;
use std::fmt;
use std::str::FromStr;

/// Generator construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsMatrixType {
    #[default]
    Vandermonde,
    Cauchy,
}

impl fmt::Display for RsMatrixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsMatrixType::Vandermonde => write!(f, "vandermonde"),
            RsMatrixType::Cauchy => write!(f, "cauchy"),
        }
    }
}

impl FromStr for RsMatrixType {
    type Err = FecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vandermonde" => Ok(RsMatrixType::Vandermonde),
            "cauchy" => Ok(RsMatrixType::Cauchy),
            other => Err(FecError::invalid(format!("unknown matrix type {:?}", other))),
        }
    }
}

type Gf<T> = BinExtension<T>;

#[derive(Debug, Clone)]
pub struct RsGf2n<T: Element> {
    field: Gf<T>,
    word_size: usize,
    n_data: usize,
    n_parities: usize,
    matrix_type: RsMatrixType,
    generator: Matrix<Gf<T>>,
    decode_mat: Matrix<Gf<T>>,
    /// Inverse of `decode_mat`, present after a successful `decode_build`
    decode_inv: Option<Matrix<Gf<T>>>,
}

impl<T: Element> RsGf2n<T> {
    pub fn new(
        word_size: usize,
        n_data: usize,
        n_parities: usize,
        matrix_type: RsMatrixType,
    ) -> FecResult<Self> {
        if !(1..=2).contains(&word_size) {
            return Err(FecError::invalid(format!(
                "word size {} is not supported, expected 1 or 2 bytes",
                word_size
            )));
        }
        if n_data == 0 || n_parities == 0 {
            return Err(FecError::invalid(format!(
                "need at least one data and one parity fragment, got {} and {}",
                n_data, n_parities
            )));
        }

        let field = Gf::<T>::new(8 * word_size as u32)?;
        let generator = match matrix_type {
            RsMatrixType::Vandermonde => {
                Matrix::vandermonde_suitable_for_ec(field, n_parities, n_data)?
            }
            RsMatrixType::Cauchy => Matrix::cauchy(field, n_parities, n_data)?,
        };
        debug!(
            "RsGf2n: GF(2^{}) n_data={} n_parities={} matrix={}",
            8 * word_size,
            n_data,
            n_parities,
            matrix_type
        );

        Ok(Self {
            field,
            word_size,
            n_data,
            n_parities,
            matrix_type,
            generator,
            decode_mat: Matrix::new(field, n_data, n_data),
            decode_inv: None,
        })
    }

    pub fn matrix_type(&self) -> RsMatrixType {
        self.matrix_type
    }

    /// The `n_parities × n_data` generator
    pub fn generator(&self) -> &Matrix<Gf<T>> {
        &self.generator
    }

    fn check_decode_row(&self, fragment_index: usize) -> FecResult<()> {
        if fragment_index >= self.n_data {
            return Err(FecError::invalid(format!(
                "decode input {} out of range for {} data fragments",
                fragment_index, self.n_data
            )));
        }
        Ok(())
    }
}

impl<T: Element> FecCode for RsGf2n<T> {
    type Elem = T;
    type Field = Gf<T>;

    fn name(&self) -> &'static str {
        "RsGf2n"
    }

    fn fec_type(&self) -> FecType {
        FecType::Systematic
    }

    fn field(&self) -> &Gf<T> {
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
        self.n_data + self.n_parities
    }

    fn get_n_outputs(&self) -> usize {
        self.n_parities
    }

    fn encode(
        &self,
        output: &mut [T],
        _props: &mut [Properties],
        _offset: u64,
        words: &[T],
    ) -> FecResult<()> {
        if words.len() != self.n_data || output.len() < self.n_parities {
            return Err(FecError::invalid(format!(
                "encode needs {} words and room for {} parities, got {} and {}",
                self.n_data,
                self.n_parities,
                words.len(),
                output.len()
            )));
        }
        self.generator.mul(output, words);
        Ok(())
    }

    fn decode_add_data(&mut self, fragment_index: usize, row: usize) -> FecResult<()> {
        self.check_decode_row(fragment_index)?;
        if row >= self.n_data {
            return Err(FecError::invalid(format!("data row {} out of range", row)));
        }
        let one = self.field.one();
        let dest = self.decode_mat.row_mut(fragment_index);
        dest.fill(T::ZERO);
        dest[row] = one;
        self.decode_inv = None;
        Ok(())
    }

    fn decode_add_parities(&mut self, fragment_index: usize, row: usize) -> FecResult<()> {
        self.check_decode_row(fragment_index)?;
        if row >= self.n_parities {
            return Err(FecError::invalid(format!("parity row {} out of range", row)));
        }
        self.decode_mat
            .row_mut(fragment_index)
            .copy_from_slice(self.generator.row(row));
        self.decode_inv = None;
        Ok(())
    }

    fn decode_build(&mut self) -> FecResult<()> {
        self.decode_inv = Some(self.decode_mat.inv()?);
        Ok(())
    }

    fn decode_init(&self, fragment_ids: &[usize]) -> FecResult<DecodeContext<Gf<T>>> {
        if self.decode_inv.is_none() {
            return Err(FecError::Logic(
                "RsGf2n: decode_build must succeed before decode".to_string(),
            ));
        }
        Ok(DecodeContext::new(self.field, fragment_ids, 0, 0))
    }

    fn decode_apply(
        &self,
        _context: &DecodeContext<Gf<T>>,
        output: &mut [T],
        words: &[T],
    ) -> FecResult<()> {
        let inverse = self.decode_inv.as_ref().ok_or_else(|| {
            FecError::Logic("RsGf2n: decode matrix was not built".to_string())
        })?;
        inverse.mul(output, words);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cauchy_gf256_scenario() {
        let mut rs = RsGf2n::<u32>::new(1, 4, 2, RsMatrixType::Cauchy).unwrap();
        let data = [10u32, 20, 30, 40];
        let mut parities = [0u32; 2];
        rs.encode(&mut parities, &mut [], 0, &data).unwrap();

        // lose data fragments 1 and 3
        let ids = [0usize, 2, 4, 5];
        let words = [data[0], data[2], parities[0], parities[1]];
        rs.decode_setup(&ids).unwrap();
        let mut out = [0u32; 4];
        rs.decode(&mut out, &[], 0, &ids, &words).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn gf65536_vandermonde_round_trip() {
        let mut rs = RsGf2n::<u16>::new(2, 3, 3, RsMatrixType::Vandermonde).unwrap();
        let data = [0xFFFFu16, 0x1234, 0];
        let mut parities = [0u16; 3];
        rs.encode(&mut parities, &mut [], 0, &data).unwrap();

        let ids = [3usize, 4, 5];
        rs.decode_setup(&ids).unwrap();
        let mut out = [0u16; 3];
        rs.decode(&mut out, &[], 0, &ids, &parities).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn decode_before_build_is_a_logic_error() {
        let mut rs = RsGf2n::<u32>::new(1, 2, 1, RsMatrixType::Vandermonde).unwrap();
        let mut out = [0u32; 2];
        let err = rs.decode(&mut out, &[], 0, &[0, 1], &[1, 2]).unwrap_err();
        assert!(matches!(err, FecError::Logic(_)));

        rs.decode_setup(&[0, 1]).unwrap();
        assert!(rs.decode(&mut out, &[], 0, &[0, 1], &[1, 2]).is_ok());

        // a further add invalidates the built matrix
        rs.decode_add_parities(1, 0).unwrap();
        let err = rs.decode(&mut out, &[], 0, &[0, 2], &[1, 2]).unwrap_err();
        assert!(matches!(err, FecError::Logic(_)));
    }

    #[test]
    fn repeated_rows_are_singular() {
        let mut rs = RsGf2n::<u32>::new(1, 2, 2, RsMatrixType::Cauchy).unwrap();
        rs.decode_add_data(0, 1).unwrap();
        rs.decode_add_data(1, 1).unwrap();
        assert!(matches!(rs.decode_build(), Err(FecError::SingularMatrix { .. })));
    }

    #[test]
    fn construction_limits() {
        assert!(RsGf2n::<u32>::new(3, 4, 2, RsMatrixType::Cauchy).is_err());
        assert!(RsGf2n::<u32>::new(0, 4, 2, RsMatrixType::Cauchy).is_err());
        assert!(RsGf2n::<u32>::new(1, 0, 2, RsMatrixType::Cauchy).is_err());
        assert!(RsGf2n::<u32>::new(1, 200, 57, RsMatrixType::Cauchy).is_err());
        assert!(RsGf2n::<u32>::new(1, 200, 56, RsMatrixType::Cauchy).is_ok());
    }

    #[test]
    fn matrix_type_parses() {
        assert_eq!("Cauchy".parse::<RsMatrixType>().unwrap(), RsMatrixType::Cauchy);
        assert_eq!(
            "vandermonde".parse::<RsMatrixType>().unwrap(),
            RsMatrixType::Vandermonde
        );
        assert!("reed".parse::<RsMatrixType>().is_err());
        assert_eq!(RsMatrixType::Cauchy.to_string(), "cauchy");
    }

    #[test]
    fn codec_parameters() {
        let rs = RsGf2n::<u32>::new(1, 4, 2, RsMatrixType::Cauchy).unwrap();
        assert_eq!(rs.fec_type(), FecType::Systematic);
        assert_eq!(rs.code_len(), 6);
        assert_eq!(rs.get_n_outputs(), 2);
        assert_eq!(rs.generator().rows(), 2);
        assert_eq!(rs.generator().cols(), 4);
    }
}
