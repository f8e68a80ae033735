//! Points, vectors and affine operators in row convention
use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::ops::{Add, Neg, Sub};

use itertools::Itertools;
use num_traits::{One, Signed, Zero};

use crate::matrix::{int, to_i64, Matrix, Rational};

/// A translation vector with exact rational coordinates
///
/// Vectors compare lexicographically by their coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vector(Vec<Rational>);

/// A position with exact rational coordinates
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point(Vec<Rational>);

fn times(coords: &[Rational], m: &Matrix) -> Vec<Rational> {
    debug_assert_eq!(coords.len(), m.nrows());
    Vec::from_iter((0..m.ncols()).map(|j| {
        coords
            .iter()
            .enumerate()
            .filter(|(_, x)| !x.is_zero())
            .fold(Rational::zero(), |acc, (i, x)| acc + x * m.get(i, j))
    }))
}

fn mod_z(coords: &[Rational]) -> Vec<Rational> {
    Vec::from_iter(coords.iter().map(|x| x - x.floor()))
}

impl Vector {
    pub fn new(coords: Vec<Rational>) -> Self {
        Self(coords)
    }

    pub fn zero(dim: usize) -> Self {
        Self(vec![Rational::zero(); dim])
    }

    pub fn unit(dim: usize, i: usize) -> Self {
        let mut v = Self::zero(dim);
        v.0[i] = Rational::one();
        v
    }

    pub fn from_ints(coords: &[i64]) -> Self {
        Self(Vec::from_iter(coords.iter().map(|&x| int(x))))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn coords(&self) -> &[Rational] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|x| x.is_zero())
    }

    pub fn is_integral(&self) -> bool {
        self.0.iter().all(|x| x.is_integer())
    }

    pub fn to_ints(&self) -> Option<Vec<i64>> {
        self.0.iter().map(to_i64).collect()
    }

    /// Sign of the first nonzero coordinate
    pub fn sign(&self) -> Ordering {
        self.0
            .iter()
            .find(|x| !x.is_zero())
            .map(|x| if x.is_positive() { Ordering::Greater } else { Ordering::Less })
            .unwrap_or(Ordering::Equal)
    }

    pub fn times(&self, m: &Matrix) -> Vector {
        Vector(times(&self.0, m))
    }

    /// Reduces all coordinates into `[0, 1)`
    pub fn mod_z(&self) -> Vector {
        Vector(mod_z(&self.0))
    }
}

impl Point {
    pub fn new(coords: Vec<Rational>) -> Self {
        Self(coords)
    }

    pub fn origin(dim: usize) -> Self {
        Self(vec![Rational::zero(); dim])
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn coords(&self) -> &[Rational] {
        &self.0
    }

    pub fn times(&self, m: &Matrix) -> Point {
        Point(times(&self.0, m))
    }

    pub fn mod_z(&self) -> Point {
        Point(mod_z(&self.0))
    }
}

impl<'a> Add<&'a Vector> for &'a Vector {
    type Output = Vector;

    fn add(self, rhs: &'a Vector) -> Vector {
        Vector(Vec::from_iter(self.0.iter().zip(&rhs.0).map(|(a, b)| a + b)))
    }
}

impl<'a> Sub<&'a Vector> for &'a Vector {
    type Output = Vector;

    fn sub(self, rhs: &'a Vector) -> Vector {
        Vector(Vec::from_iter(self.0.iter().zip(&rhs.0).map(|(a, b)| a - b)))
    }
}

impl Neg for &Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector(Vec::from_iter(self.0.iter().map(|a| -a)))
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        -&self
    }
}

impl<'a> Add<&'a Vector> for &'a Point {
    type Output = Point;

    fn add(self, rhs: &'a Vector) -> Point {
        Point(Vec::from_iter(self.0.iter().zip(&rhs.0).map(|(a, b)| a + b)))
    }
}

impl<'a> Sub<&'a Point> for &'a Point {
    type Output = Vector;

    fn sub(self, rhs: &'a Point) -> Vector {
        Vector(Vec::from_iter(self.0.iter().zip(&rhs.0).map(|(a, b)| a - b)))
    }
}

impl<'a> Sub<&'a Vector> for &'a Point {
    type Output = Point;

    fn sub(self, rhs: &'a Vector) -> Point {
        Point(Vec::from_iter(self.0.iter().zip(&rhs.0).map(|(a, b)| a - b)))
    }
}

fn fmt_coords(coords: &[Rational], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({})", coords.iter().format(","))
}

impl Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_coords(&self.0, f)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_coords(&self.0, f)
    }
}

/// An affine map `p -> p * linear + translation`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Operator {
    linear: Matrix,
    translation: Vector,
}

impl Operator {
    pub fn new(linear: Matrix, translation: Vector) -> Self {
        debug_assert!(linear.is_square());
        debug_assert_eq!(linear.nrows(), translation.dimension());
        Self { linear, translation }
    }

    pub fn linear(linear: Matrix) -> Self {
        let dim = linear.nrows();
        Self::new(linear, Vector::zero(dim))
    }

    pub fn identity(dim: usize) -> Self {
        Self::linear(Matrix::identity(dim))
    }

    pub fn dimension(&self) -> usize {
        self.translation.dimension()
    }

    pub fn linear_part(&self) -> &Matrix {
        &self.linear
    }

    pub fn translation(&self) -> &Vector {
        &self.translation
    }

    pub fn apply(&self, p: &Point) -> Point {
        &p.times(&self.linear) + &self.translation
    }

    pub fn apply_vector(&self, v: &Vector) -> Vector {
        v.times(&self.linear)
    }

    /// The operator applying first `self`, then `other`
    pub fn then(&self, other: &Operator) -> Operator {
        Operator {
            linear: &self.linear * &other.linear,
            translation: &self.translation.times(&other.linear) + &other.translation,
        }
    }

    pub fn inverse(&self) -> Option<Operator> {
        let linear = self.linear.inverse()?;
        let translation = -self.translation.times(&linear);
        Some(Operator { linear, translation })
    }

    /// The same operator with its translation reduced into `[0, 1)`
    pub fn modulo_z(&self) -> Operator {
        Operator {
            linear: self.linear.clone(),
            translation: self.translation.mod_z(),
        }
    }
}

const VARIABLES: [&str; 3] = ["x", "y", "z"];

impl Display for Operator {
    /// Formats in the usual crystallographic notation, e.g. `-z,y+1/2,x`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dim = self.dimension();
        let var = |i: usize| {
            if dim <= VARIABLES.len() {
                VARIABLES[i].to_owned()
            } else {
                format!("x{}", i + 1)
            }
        };
        let terms = (0..dim).map(|j| {
            let mut s = String::new();
            for i in 0..dim {
                let c = self.linear.get(i, j);
                if c.is_zero() {
                    continue;
                }
                if c.is_positive() && !s.is_empty() {
                    s.push('+');
                }
                if *c == -Rational::one() {
                    s.push('-');
                } else if !c.is_one() {
                    s.push_str(&c.to_string());
                }
                s.push_str(&var(i));
            }
            let t = &self.translation.coords()[j];
            if !t.is_zero() {
                if t.is_positive() && !s.is_empty() {
                    s.push('+');
                }
                s.push_str(&t.to_string());
            }
            if s.is_empty() {
                s.push('0');
            }
            s
        });
        write!(f, "{}", terms.format(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64, d: i64) -> Rational {
        Rational::new(n.into(), d.into())
    }

    #[test]
    fn vector_ops() {
        let a = Vector::from_ints(&[1, -2, 0]);
        let b = Vector::new(vec![q(1, 2), q(1, 3), q(-5, 4)]);
        assert_eq!(&(&a + &b) - &b, a);
        assert_eq!(a.sign(), Ordering::Greater);
        assert_eq!((-&a).sign(), Ordering::Less);
        assert_eq!(Vector::zero(3).sign(), Ordering::Equal);
        assert_eq!(b.mod_z(), Vector::new(vec![q(1, 2), q(1, 3), q(3, 4)]));
        assert!(a.is_integral());
        assert!(!b.is_integral());
        assert_eq!(a.to_ints(), Some(vec![1, -2, 0]));
        assert!(Vector::from_ints(&[0, -1]) < Vector::from_ints(&[0, 1]));
    }

    #[test]
    fn operator_composition() {
        let swap = Matrix::from_int_rows(2, [[0, 1], [1, 0]]);
        let a = Operator::new(swap, Vector::new(vec![q(1, 2), q(0, 1)]));
        let b = Operator::linear(Matrix::from_int_rows(2, [[-1, 0], [0, 1]]));
        let p = Point::new(vec![q(1, 3), q(1, 5)]);
        assert_eq!(a.then(&b).apply(&p), b.apply(&a.apply(&p)));
        let inv = a.inverse().unwrap();
        assert_eq!(inv.apply(&a.apply(&p)), p);
        assert_eq!(a.then(&inv), Operator::identity(2));
    }

    #[test]
    fn operator_display() {
        let rot = Matrix::from_int_rows(3, [[0, 0, 1], [0, 1, 0], [-1, 0, 0]]);
        let op = Operator::new(rot, Vector::new(vec![q(0, 1), q(1, 2), q(0, 1)]));
        assert_eq!(op.to_string(), "-z,y+1/2,x");
        assert_eq!(Operator::identity(2).to_string(), "x,y");
        let twice = Operator::linear(Matrix::from_int_rows(2, [[2, 0], [0, 1]]));
        assert_eq!(twice.to_string(), "2x,y");
    }
}
