//! Exact rational matrices
//!
//! All matrices are dense and row-major. Vectors are treated as rows,
//! so a linear map `M` acts as `v * M`.
use std::fmt::{self, Display};
use std::ops::{Add, Mul};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

pub type Rational = BigRational;

pub(crate) fn int(x: i64) -> Rational {
    Rational::from_integer(BigInt::from(x))
}

pub(crate) fn to_i64(x: &Rational) -> Option<i64> {
    if x.is_integer() {
        x.to_integer().to_i64()
    } else {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Matrix {
    nrows: usize,
    ncols: usize,
    data: Vec<Rational>,
}

impl Matrix {
    pub fn zero(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            data: vec![Rational::zero(); nrows * ncols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut res = Self::zero(n, n);
        for i in 0..n {
            res.set(i, i, Rational::one());
        }
        res
    }

    /// Builds a matrix with `ncols` columns from its rows
    pub fn from_rows<R>(ncols: usize, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = Rational>,
    {
        let mut data = Vec::new();
        let mut nrows = 0;
        for row in rows {
            let len = data.len();
            data.extend(row);
            debug_assert_eq!(data.len() - len, ncols);
            nrows += 1;
        }
        Self { nrows, ncols, data }
    }

    pub fn from_int_rows<R>(ncols: usize, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: AsRef<[i64]>,
    {
        Self::from_rows(
            ncols,
            rows.into_iter()
                .map(|r| Vec::from_iter(r.as_ref().iter().map(|&x| int(x)))),
        )
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    pub fn get(&self, i: usize, j: usize) -> &Rational {
        &self.data[i * self.ncols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: Rational) {
        self.data[i * self.ncols + j] = value;
    }

    pub(crate) fn add_to(&mut self, i: usize, j: usize, x: &Rational) {
        self.data[i * self.ncols + j] += x;
    }

    pub fn row(&self, i: usize) -> &[Rational] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Rational]> + '_ {
        (0..self.nrows).map(|i| self.row(i))
    }

    pub fn set_row(&mut self, i: usize, row: &[Rational]) {
        debug_assert_eq!(row.len(), self.ncols);
        self.data[i * self.ncols..(i + 1) * self.ncols].clone_from_slice(row);
    }

    pub fn transpose(&self) -> Self {
        let mut res = Self::zero(self.ncols, self.nrows);
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                res.set(j, i, self.get(i, j).clone());
            }
        }
        res
    }

    /// The block of `nrows` x `ncols` entries starting at `(row, col)`
    pub fn sub_matrix(&self, row: usize, col: usize, nrows: usize, ncols: usize) -> Self {
        Self::from_rows(
            ncols,
            (row..row + nrows).map(|i| self.row(i)[col..col + ncols].to_vec()),
        )
    }

    pub fn is_integral(&self) -> bool {
        self.data.iter().all(|x| x.is_integer())
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|x| x.is_zero())
    }

    /// Checks for an integral matrix with determinant `±1`
    pub fn is_unimodular(&self) -> bool {
        self.is_square() && self.is_integral() && self.determinant().abs().is_one()
    }

    pub fn to_i64_rows(&self) -> Option<Vec<Vec<i64>>> {
        self.rows()
            .map(|row| row.iter().map(to_i64).collect::<Option<Vec<_>>>())
            .collect()
    }

    pub fn scaled(&self, f: &Rational) -> Self {
        Self {
            nrows: self.nrows,
            ncols: self.ncols,
            data: Vec::from_iter(self.data.iter().map(|x| x * f)),
        }
    }

    fn swap_rows(&mut self, i: usize, j: usize) {
        if i != j {
            for k in 0..self.ncols {
                self.data.swap(i * self.ncols + k, j * self.ncols + k);
            }
        }
    }

    fn negate_row(&mut self, i: usize) {
        for x in &mut self.data[i * self.ncols..(i + 1) * self.ncols] {
            *x = -&*x;
        }
    }

    fn scale_row(&mut self, i: usize, f: &Rational) {
        for x in &mut self.data[i * self.ncols..(i + 1) * self.ncols] {
            *x *= f;
        }
    }

    /// row[target] -= f * row[source]
    fn sub_row_multiple(&mut self, target: usize, source: usize, f: &Rational) {
        for k in 0..self.ncols {
            let x = self.get(source, k) * f;
            self.data[target * self.ncols + k] -= x;
        }
    }

    /// Brings the matrix into row echelon form
    ///
    /// With `integral` set, rows are only combined with integer
    /// factors, so the row lattice is preserved and the result is a
    /// Hermite normal form when `clear_above` is also set. Row
    /// operations are mirrored on `other` if given. Pivots are made
    /// positive. Returns the sign change the operations introduced
    /// into the determinant.
    pub fn triangulate(
        &mut self,
        mut other: Option<&mut Matrix>,
        integral: bool,
        clear_above: bool,
    ) -> i32 {
        let factor = |a: &Rational, b: &Rational| {
            let q = a / b;
            if integral {
                q.floor()
            } else {
                q
            }
        };

        let mut sign = 1;
        let (mut row, mut col) = (0, 0);
        while row < self.nrows && col < self.ncols {
            let pivot = (row..self.nrows)
                .filter(|&i| !self.get(i, col).is_zero())
                .min_by_key(|&i| self.get(i, col).abs());
            let Some(pivot) = pivot else {
                col += 1;
                continue;
            };
            if pivot != row {
                self.swap_rows(row, pivot);
                if let Some(other) = other.as_deref_mut() {
                    other.swap_rows(row, pivot);
                }
                sign = -sign;
            }
            if self.get(row, col).is_negative() {
                self.negate_row(row);
                if let Some(other) = other.as_deref_mut() {
                    other.negate_row(row);
                }
                sign = -sign;
            }
            for i in row + 1..self.nrows {
                if self.get(i, col).is_zero() {
                    continue;
                }
                let f = factor(self.get(i, col), self.get(row, col));
                self.sub_row_multiple(i, row, &f);
                if let Some(other) = other.as_deref_mut() {
                    other.sub_row_multiple(i, row, &f);
                }
            }
            if (row + 1..self.nrows).all(|i| self.get(i, col).is_zero()) {
                row += 1;
                col += 1;
            }
        }

        if clear_above {
            let mut col = 0;
            for row in 0..self.nrows {
                while col < self.ncols && self.get(row, col).is_zero() {
                    col += 1;
                }
                if col >= self.ncols {
                    break;
                }
                for i in 0..row {
                    if self.get(i, col).is_zero() {
                        continue;
                    }
                    let f = factor(self.get(i, col), self.get(row, col));
                    self.sub_row_multiple(i, row, &f);
                    if let Some(other) = other.as_deref_mut() {
                        other.sub_row_multiple(i, row, &f);
                    }
                }
            }
        }
        sign
    }

    pub fn rank(&self) -> usize {
        let mut m = self.clone();
        m.triangulate(None, false, false);
        m.rows().filter(|row| row.iter().any(|x| !x.is_zero())).count()
    }

    pub fn determinant(&self) -> Rational {
        debug_assert!(self.is_square());
        let mut m = self.clone();
        let sign = m.triangulate(None, false, false);
        let det = (0..m.nrows).fold(Rational::one(), |acc, i| acc * m.get(i, i));
        if sign < 0 {
            -det
        } else {
            det
        }
    }

    /// Solves `a * x = b`, setting free variables to zero
    pub fn solve(a: &Matrix, b: &Matrix) -> Option<Matrix> {
        debug_assert_eq!(a.nrows, b.nrows);
        let mut a = a.clone();
        let mut b = b.clone();
        let mut pivots = Vec::new();
        let mut row = 0;
        for col in 0..a.ncols {
            if row == a.nrows {
                break;
            }
            let Some(p) = (row..a.nrows).find(|&i| !a.get(i, col).is_zero()) else {
                continue;
            };
            a.swap_rows(row, p);
            b.swap_rows(row, p);
            let f = a.get(row, col).recip();
            a.scale_row(row, &f);
            b.scale_row(row, &f);
            for i in 0..a.nrows {
                if i != row && !a.get(i, col).is_zero() {
                    let f = a.get(i, col).clone();
                    a.sub_row_multiple(i, row, &f);
                    b.sub_row_multiple(i, row, &f);
                }
            }
            pivots.push(col);
            row += 1;
        }
        if (row..b.nrows).any(|i| b.row(i).iter().any(|x| !x.is_zero())) {
            return None;
        }
        let mut x = Matrix::zero(a.ncols, b.ncols);
        for (i, &col) in pivots.iter().enumerate() {
            x.set_row(col, b.row(i));
        }
        Some(x)
    }

    pub fn inverse(&self) -> Option<Matrix> {
        if !self.is_square() || self.rank() < self.nrows {
            return None;
        }
        Self::solve(self, &Self::identity(self.nrows))
    }

    /// Finds `x` with `x * self = v`
    pub fn solution_in_rows(&self, v: &[Rational]) -> Option<Vec<Rational>> {
        let rhs = Matrix::from_rows(1, v.iter().map(|x| [x.clone()]));
        let x = Self::solve(&self.transpose(), &rhs)?;
        Some(x.data)
    }

    /// Completes the rows of `self` to a basis of the full space by
    /// appending unit vectors.
    pub fn extended_to_basis(&self) -> Matrix {
        let mut res = self.clone();
        let mut rank = res.rank();
        for i in 0..self.ncols {
            if rank == self.ncols {
                break;
            }
            let mut candidate = res.clone();
            candidate.nrows += 1;
            candidate.data.extend(
                (0..self.ncols).map(|j| if i == j { Rational::one() } else { Rational::zero() }),
            );
            let r = candidate.rank();
            if r > rank {
                res = candidate;
                rank = r;
            }
        }
        res
    }
}

impl<'a> Mul<&'a Matrix> for &'a Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &'a Matrix) -> Matrix {
        debug_assert_eq!(self.ncols, rhs.nrows);
        let mut res = Matrix::zero(self.nrows, rhs.ncols);
        for i in 0..self.nrows {
            for k in 0..self.ncols {
                let a = self.get(i, k);
                if a.is_zero() {
                    continue;
                }
                for j in 0..rhs.ncols {
                    let x = a * rhs.get(k, j);
                    res.data[i * rhs.ncols + j] += x;
                }
            }
        }
        res
    }
}

impl<'a> Add<&'a Matrix> for &'a Matrix {
    type Output = Matrix;

    fn add(self, rhs: &'a Matrix) -> Matrix {
        debug_assert_eq!((self.nrows, self.ncols), (rhs.nrows, rhs.ncols));
        Matrix {
            nrows: self.nrows,
            ncols: self.ncols,
            data: Vec::from_iter(self.data.iter().zip(&rhs.data).map(|(a, b)| a + b)),
        }
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "[")?;
            for (j, x) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{x}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
