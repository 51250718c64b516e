//! A thin univariate polynomial type over the extension field `X`.
//!
//! `lambdaworks-math`'s `Polynomial<FieldElement<F>>` covers the base field
//! directly, but it is not generic over this crate's own `X`, so this
//! module supplies the small amount of extension-field polynomial
//! machinery the FRI/AIR layers need (evaluation, scaling, degree) on top
//! of it, the same way `original_source/`'s `univariate.py` layers `X`
//! arithmetic onto base-field NTT primitives.

use crate::field::{BFE, XFE};

#[derive(Clone, Debug, PartialEq)]
pub struct XPolynomial {
    /// Coefficients, lowest degree first.
    pub coefficients: Vec<XFE>,
}

impl XPolynomial {
    pub fn new(coefficients: Vec<XFE>) -> Self {
        let mut p = Self { coefficients };
        p.trim();
        p
    }

    pub fn zero() -> Self {
        Self::new(vec![])
    }

    fn trim(&mut self) {
        while self.coefficients.last().map(|c| c.is_zero()) == Some(true) {
            self.coefficients.pop();
        }
    }

    /// Highest nonzero coefficient's index, or -1 for the zero polynomial
    ///.
    pub fn degree(&self) -> isize {
        if self.coefficients.is_empty() {
            -1
        } else {
            (self.coefficients.len() - 1) as isize
        }
    }

    pub fn evaluate(&self, point: &XFE) -> XFE {
        self.coefficients
            .iter()
            .rev()
            .fold(XFE::zero(), |acc, c| acc * *point + *c)
    }

    /// `p(offset * x)`.
    pub fn scale(&self, offset: &BFE) -> Self {
        let mut power = XFE::one();
        let scaled = self
            .coefficients
            .iter()
            .map(|c| {
                let out = *c * power;
                power = power * XFE::lift(offset);
                out
            })
            .collect();
        Self::new(scaled)
    }

    /// Splits coordinate-wise into `X::DEGREE` base-field coefficient
    /// vectors, padded to `len`. Used to drive the per-coordinate NTT in
    /// `Domain::xevaluate`.
    pub fn coordinate_polys(&self, len: usize) -> [Vec<BFE>; 3] {
        let mut out: [Vec<BFE>; 3] = [vec![BFE::zero(); len], vec![BFE::zero(); len], vec![BFE::zero(); len]];
        for (i, c) in self.coefficients.iter().enumerate() {
            for j in 0..3 {
                out[j][i] = c.0[j].clone();
            }
        }
        out
    }

    pub fn from_coordinate_polys(coords: [Vec<BFE>; 3]) -> Self {
        let len = coords[0].len();
        let coeffs = (0..len)
            .map(|i| XFE::new(coords[0][i].clone(), coords[1][i].clone(), coords[2][i].clone()))
            .collect();
        Self::new(coeffs)
    }
}

impl std::ops::Add for XPolynomial {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let len = self.coefficients.len().max(rhs.coefficients.len());
        let mut out = vec![XFE::zero(); len];
        for (i, c) in self.coefficients.iter().enumerate() {
            out[i] = out[i] + *c;
        }
        for (i, c) in rhs.coefficients.iter().enumerate() {
            out[i] = out[i] + *c;
        }
        Self::new(out)
    }
}

impl std::ops::Sub for XPolynomial {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let len = self.coefficients.len().max(rhs.coefficients.len());
        let mut out = vec![XFE::zero(); len];
        for (i, c) in self.coefficients.iter().enumerate() {
            out[i] = out[i] + *c;
        }
        for (i, c) in rhs.coefficients.iter().enumerate() {
            out[i] = out[i] - *c;
        }
        Self::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_constant() {
        let p = XPolynomial::new(vec![XFE::lift(&BFE::from(7u64))]);
        assert_eq!(p.evaluate(&XFE::one()), XFE::lift(&BFE::from(7u64)));
    }

    #[test]
    fn degree_of_zero_is_negative_one() {
        assert_eq!(XPolynomial::zero().degree(), -1);
    }
}
