//! Dense matrices over a field
//!
//! Row-major storage. Provides the two generator constructions used by the
//! systematic codec, both of which make `[I; G]` MDS: every square
//! submatrix built from any `cols` of its rows is invertible.

use crate::arith::Element;
use crate::error::{FecError, FecResult};
use crate::gf::Field;
use std::fmt;

#[derive(Clone, Debug)]
pub struct Matrix<F: Field> {
    field: F,
    rows: usize,
    cols: usize,
    data: Vec<F::Elem>,
}

impl<F: Field> PartialEq for Matrix<F> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data == other.data
    }
}

impl<F: Field> Matrix<F> {
    /// Zero matrix
    pub fn new(field: F, rows: usize, cols: usize) -> Self {
        Self {
            field,
            rows,
            cols,
            data: vec![F::Elem::ZERO; rows * cols],
        }
    }

    pub fn identity(field: F, n: usize) -> Self {
        let one = field.one();
        let mut m = Self::new(field, n, n);
        for i in 0..n {
            m.set(i, i, one);
        }
        m
    }

    /// Generator `V_bottom · V_top⁻¹` of an extended Vandermonde matrix
    ///
    /// The `(rows + cols) × cols` Vandermonde matrix is evaluated at the
    /// points `0, 1, 2, …`.
    pub fn vandermonde_suitable_for_ec(field: F, rows: usize, cols: usize) -> FecResult<Self> {
        Self::check_points(&field, rows, cols)?;
        let total = rows + cols;

        let mut vandermonde = Self::new(field.clone(), total, cols);
        for i in 0..total {
            let point = F::Elem::from_u64(i as u64);
            for j in 0..cols {
                vandermonde.set(i, j, field.exp(point, j as u64));
            }
        }

        let top: Vec<usize> = (0..cols).collect();
        let bottom: Vec<usize> = (cols..total).collect();
        let top_inv = vandermonde.submatrix(&top).inv()?;
        vandermonde.submatrix(&bottom).multiply(&top_inv)
    }

    /// Cauchy generator `1 / (x_i - y_j)` with `x_i = i`, `y_j = rows + j`
    pub fn cauchy(field: F, rows: usize, cols: usize) -> FecResult<Self> {
        Self::check_points(&field, rows, cols)?;
        let mut m = Self::new(field.clone(), rows, cols);
        for i in 0..rows {
            let x = F::Elem::from_u64(i as u64);
            for j in 0..cols {
                let y = F::Elem::from_u64((rows + j) as u64);
                m.set(i, j, field.inv(field.sub(x, y))?);
            }
        }
        Ok(m)
    }

    fn check_points(field: &F, rows: usize, cols: usize) -> FecResult<()> {
        if (rows + cols) as u64 > field.card() {
            return Err(FecError::invalid(format!(
                "{} x {} generator needs {} distinct points but the field has {}",
                rows,
                cols,
                rows + cols,
                field.card()
            )));
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> F::Elem {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: F::Elem) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[F::Elem] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [F::Elem] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// New matrix made of the given rows, in order
    pub fn submatrix(&self, rows: &[usize]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * self.cols);
        for &r in rows {
            data.extend_from_slice(self.row(r));
        }
        Self {
            field: self.field.clone(),
            rows: rows.len(),
            cols: self.cols,
            data,
        }
    }

    /// `output = self · input`
    pub fn mul(&self, output: &mut [F::Elem], input: &[F::Elem]) {
        for (r, out) in output.iter_mut().enumerate().take(self.rows) {
            *out = self
                .row(r)
                .iter()
                .zip(input)
                .fold(F::Elem::ZERO, |acc, (&m, &x)| {
                    self.field.add(acc, self.field.mul(m, x))
                });
        }
    }

    /// Matrix product `self · other`
    pub fn multiply(&self, other: &Self) -> FecResult<Self> {
        if self.cols != other.rows {
            return Err(FecError::invalid(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Self::new(self.field.clone(), self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let v = (0..self.cols).fold(F::Elem::ZERO, |acc, t| {
                    self.field
                        .add(acc, self.field.mul(self.get(i, t), other.get(t, j)))
                });
                out.set(i, j, v);
            }
        }
        Ok(out)
    }

    /// Inverse by Gauss-Jordan elimination on `[A | I]`
    pub fn inv(&self) -> FecResult<Self> {
        let n = self.rows;
        if n == 0 || self.cols != n {
            return Err(FecError::invalid(format!(
                "cannot invert a {}x{} matrix",
                self.rows, self.cols
            )));
        }
        let field = &self.field;

        // Augmented matrix [A | I]
        let mut aug = vec![vec![F::Elem::ZERO; n * 2]; n];
        for i in 0..n {
            aug[i][..n].copy_from_slice(self.row(i));
            aug[i][n + i] = field.one();
        }

        for col in 0..n {
            let pivot_row = (col..n)
                .find(|&row| aug[row][col] != F::Elem::ZERO)
                .ok_or(FecError::SingularMatrix { column: col })?;

            if pivot_row != col {
                aug.swap(col, pivot_row);
            }

            let pivot_inv = field.inv(aug[col][col])?;
            for v in aug[col].iter_mut() {
                *v = field.mul(*v, pivot_inv);
            }

            let pivot = aug[col].clone();
            for (row, values) in aug.iter_mut().enumerate() {
                if row == col {
                    continue;
                }
                let factor = values[col];
                if factor == F::Elem::ZERO {
                    continue;
                }
                for (v, &p) in values.iter_mut().zip(&pivot) {
                    *v = field.sub(*v, field.mul(factor, p));
                }
            }
        }

        let mut inverse = Self::new(field.clone(), n, n);
        for (i, values) in aug.iter().enumerate() {
            inverse.row_mut(i).copy_from_slice(&values[n..]);
        }
        Ok(inverse)
    }
}

impl<F: Field> fmt::Display for Matrix<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let row: Vec<String> = self.row(r).iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf::{BinExtension, Prime};

    fn gf256() -> BinExtension<u32> {
        BinExtension::new(8).unwrap()
    }

    #[test]
    fn identity_is_its_own_inverse() {
        let id = Matrix::identity(gf256(), 5);
        assert_eq!(id.inv().unwrap(), id);
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let gf = Prime::<u32>::new(97).unwrap();
        let mut m = Matrix::new(gf, 3, 3);
        let values = [2, 3, 5, 7, 11, 13, 17, 19, 23];
        for (i, &v) in values.iter().enumerate() {
            m.set(i / 3, i % 3, v);
        }
        let inv = m.inv().unwrap();
        assert_eq!(m.multiply(&inv).unwrap(), Matrix::identity(gf, 3));
        assert_eq!(inv.multiply(&m).unwrap(), Matrix::identity(gf, 3));
    }

    #[test]
    fn singular_matrix_reports_column() {
        let gf = gf256();
        let mut m = Matrix::new(gf, 3, 3);
        // column 1 = column 0, so elimination runs out of pivots at column 1
        for r in 0..3 {
            m.set(r, 0, (r + 1) as u32);
            m.set(r, 1, (r + 1) as u32);
            m.set(r, 2, (r * r + 7) as u32);
        }
        assert_eq!(m.inv(), Err(FecError::SingularMatrix { column: 1 }));

        let not_square = Matrix::new(gf, 2, 3);
        assert!(matches!(not_square.inv(), Err(FecError::InvalidArgument(_))));
    }

    #[test]
    fn matrix_vector_product() {
        let gf = Prime::<u32>::new(97).unwrap();
        let mut m = Matrix::new(gf, 2, 3);
        m.row_mut(0).copy_from_slice(&[1, 2, 3]);
        m.row_mut(1).copy_from_slice(&[4, 5, 6]);
        let mut out = [0u32; 2];
        m.mul(&mut out, &[1, 1, 10]);
        assert_eq!(out, [33, 69]);
    }

    #[test]
    fn generators_are_mds() {
        let gf = gf256();
        for (rows, cols) in [(2, 4), (3, 3), (4, 6)] {
            for generator in [
                Matrix::vandermonde_suitable_for_ec(gf, rows, cols).unwrap(),
                Matrix::cauchy(gf, rows, cols).unwrap(),
            ] {
                let mut full = Matrix::new(gf, rows + cols, cols);
                for i in 0..cols {
                    full.set(i, i, 1);
                }
                for r in 0..rows {
                    full.row_mut(cols + r).copy_from_slice(generator.row(r));
                }
                // every choice of `cols` rows out of `rows + cols`
                for mask in 0u32..(1 << (rows + cols)) {
                    if mask.count_ones() as usize != cols {
                        continue;
                    }
                    let picked: Vec<usize> =
                        (0..rows + cols).filter(|&i| mask >> i & 1 == 1).collect();
                    assert!(full.submatrix(&picked).inv().is_ok(), "rows {:?}", picked);
                }
            }
        }
    }

    #[test]
    fn generator_size_is_bounded_by_the_field() {
        let gf = BinExtension::<u32>::new(4).unwrap();
        assert!(Matrix::cauchy(gf, 8, 8).is_ok());
        assert!(Matrix::cauchy(gf, 9, 8).is_err());
        assert!(Matrix::vandermonde_suitable_for_ec(gf, 9, 8).is_err());
    }

    #[test]
    fn display_prints_rows() {
        let m = Matrix::identity(gf256(), 2);
        assert_eq!(m.to_string(), "1 0\n0 1\n");
    }
}
