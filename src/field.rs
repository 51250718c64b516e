//! Field substrate: the base field `F` and its cubic extension `X`.
//!
//! `F` is reused wholesale from `lambdaworks-math` (`Stark252PrimeField`) —
//! ring ops, inversion, sampling and byte encoding all come from the
//! library. `X` is this crate's own cubic extension `F[x] / (x^3 - x - 1)`,
//! the classical modulus used by
//! the `stark-brainfuck`/`stark-anatomy` lineage this system descends from.

use lambdaworks_math::field::element::FieldElement;
use lambdaworks_math::field::fields::fft_friendly::stark_252_prime_field::Stark252PrimeField;
use lambdaworks_math::traits::ByteConversion;
use std::ops::{Add, Div, Mul, Neg, Sub};

pub type BaseField = Stark252PrimeField;
/// `F` — the base field.
pub type BFE = FieldElement<BaseField>;

/// `X` — the degree-3 extension of `F` modulo `x^3 - x - 1`, represented by
/// its coefficients `[c0, c1, c2]` (lowest degree first).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtensionFieldElement(pub [BFE; 3]);

pub type XFE = ExtensionFieldElement;

impl ExtensionFieldElement {
    pub const DEGREE: usize = 3;

    pub fn zero() -> Self {
        Self([BFE::zero(), BFE::zero(), BFE::zero()])
    }

    pub fn one() -> Self {
        Self([BFE::one(), BFE::zero(), BFE::zero()])
    }

    pub fn new(c0: BFE, c1: BFE, c2: BFE) -> Self {
        Self([c0, c1, c2])
    }

    /// Canonical embedding of a base-field element into the extension.
    pub fn lift(base: &BFE) -> Self {
        Self([base.clone(), BFE::zero(), BFE::zero()])
    }

    /// `Some(base)` if this element lies in the base field (c1 == c2 == 0).
    pub fn to_base(&self) -> Option<BFE> {
        if self.0[1] == BFE::zero() && self.0[2] == BFE::zero() {
            Some(self.0[0].clone())
        } else {
            None
        }
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::zero()
    }

    pub fn square(&self) -> Self {
        *self * *self
    }

    pub fn pow(&self, mut exponent: u64) -> Self {
        let mut base = *self;
        let mut acc = Self::one();
        while exponent > 0 {
            if exponent & 1 == 1 {
                acc = acc * base;
            }
            base = base * base;
            exponent >>= 1;
        }
        acc
    }

    /// Inversion via the extended Euclidean algorithm against the
    /// irreducible modulus `x^3 - x - 1`.
    pub fn inv(&self) -> Self {
        assert!(!self.is_zero(), "cannot invert the zero extension element");
        let modulus: Vec<BFE> = vec![-BFE::one(), -BFE::one(), BFE::zero(), BFE::one()];
        let a: Vec<BFE> = self.0.to_vec();
        let (_, _, inv_s) = extended_gcd(&modulus, &a);
        let mut coeffs = [BFE::zero(); 3];
        for (i, c) in inv_s.into_iter().take(3).enumerate() {
            coeffs[i] = c;
        }
        Self(coeffs)
    }

    /// Samples an extension-field element by hashing `seed`'s three
    /// consecutive 8-byte windows into base-field limbs (mirrors the
    /// transcript's base-field sampling, tripled for the extension).
    pub fn sample(seed: &[u8]) -> Self {
        use sha3::{Digest, Sha3_256};
        let mut limbs = [BFE::zero(); 3];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let mut hasher = Sha3_256::new();
            hasher.update(seed);
            hasher.update([i as u8]);
            let digest = hasher.finalize();
            let value = u64::from_be_bytes(digest[..8].try_into().unwrap());
            *limb = BFE::from(value);
        }
        Self(limbs)
    }
}

fn poly_trim(p: &[BFE]) -> Vec<BFE> {
    let mut p = p.to_vec();
    while p.len() > 1 && p.last() == Some(&BFE::zero()) {
        p.pop();
    }
    p
}

fn poly_deg(p: &[BFE]) -> isize {
    let p = poly_trim(p);
    if p.len() == 1 && p[0] == BFE::zero() {
        -1
    } else {
        (p.len() - 1) as isize
    }
}

fn poly_divmod(a: &[BFE], b: &[BFE]) -> (Vec<BFE>, Vec<BFE>) {
    let mut rem = poly_trim(a);
    let b = poly_trim(b);
    let b_deg = poly_deg(&b);
    let b_lead_inv = b.last().unwrap().inv();
    let mut quotient = vec![BFE::zero(); rem.len()];
    while poly_deg(&rem) >= b_deg && poly_deg(&rem) >= 0 {
        let shift = (poly_deg(&rem) - b_deg) as usize;
        let coeff = rem.last().unwrap().clone() * &b_lead_inv;
        quotient[shift] = quotient[shift].clone() + &coeff;
        for (i, bc) in b.iter().enumerate() {
            rem[shift + i] = rem[shift + i].clone() - &(coeff.clone() * bc);
        }
        rem = poly_trim(&rem);
        if poly_deg(&rem) < 0 {
            break;
        }
    }
    (poly_trim(&quotient), rem)
}

fn poly_sub(a: &[BFE], b: &[BFE]) -> Vec<BFE> {
    let len = a.len().max(b.len());
    let mut out = vec![BFE::zero(); len];
    for (i, v) in a.iter().enumerate() {
        out[i] = out[i].clone() + v;
    }
    for (i, v) in b.iter().enumerate() {
        out[i] = out[i].clone() - v;
    }
    poly_trim(&out)
}

fn poly_mul(a: &[BFE], b: &[BFE]) -> Vec<BFE> {
    let mut out = vec![BFE::zero(); a.len() + b.len() - 1];
    for (i, ac) in a.iter().enumerate() {
        for (j, bc) in b.iter().enumerate() {
            out[i + j] = out[i + j].clone() + &(ac.clone() * bc);
        }
    }
    poly_trim(&out)
}

/// Extended Euclidean algorithm over `F[x]`: returns `(gcd, s, t)` with
/// `s*a + t*b == gcd`. Used to invert elements of `X = F[x]/(x^3 - x - 1)`
/// by running it against the irreducible modulus.
fn extended_gcd(a: &[BFE], b: &[BFE]) -> (Vec<BFE>, Vec<BFE>, Vec<BFE>) {
    let (mut old_r, mut r) = (poly_trim(a), poly_trim(b));
    let (mut old_s, mut s) = (vec![BFE::one()], vec![BFE::zero()]);
    let (mut old_t, mut t) = (vec![BFE::zero()], vec![BFE::one()]);

    while poly_deg(&r) >= 0 {
        let (q, rem) = poly_divmod(&old_r, &r);
        old_r = r;
        r = rem;
        let new_s = poly_sub(&old_s, &poly_mul(&q, &s));
        old_s = s;
        s = new_s;
        let new_t = poly_sub(&old_t, &poly_mul(&q, &t));
        old_t = t;
        t = new_t;
    }
    // Normalize so the gcd is monic.
    let lead_inv = old_r.last().unwrap().inv();
    let normalize = |p: Vec<BFE>| p.into_iter().map(|c| c * &lead_inv).collect::<Vec<_>>();
    (normalize(old_r), normalize(old_s), normalize(old_t))
}

impl Add for ExtensionFieldElement {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self([
            self.0[0].clone() + &rhs.0[0],
            self.0[1].clone() + &rhs.0[1],
            self.0[2].clone() + &rhs.0[2],
        ])
    }
}

impl Sub for ExtensionFieldElement {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self([
            self.0[0].clone() - &rhs.0[0],
            self.0[1].clone() - &rhs.0[1],
            self.0[2].clone() - &rhs.0[2],
        ])
    }
}

impl Neg for ExtensionFieldElement {
    type Output = Self;
    fn neg(self) -> Self {
        Self([-self.0[0].clone(), -self.0[1].clone(), -self.0[2].clone()])
    }
}

impl Mul for ExtensionFieldElement {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let a = &self.0;
        let b = &rhs.0;
        let c0 = a[0].clone() * &b[0];
        let c1 = a[0].clone() * &b[1] + &(a[1].clone() * &b[0]);
        let c2 = a[0].clone() * &b[2] + &(a[1].clone() * &b[1]) + &(a[2].clone() * &b[0]);
        let c3 = a[1].clone() * &b[2] + &(a[2].clone() * &b[1]);
        let c4 = a[2].clone() * &b[2];
        // reduce modulo x^3 - x - 1: x^3 = x + 1, x^4 = x^2 + x
        Self([
            c0 + &c3,
            c1 + &c3 + &c4,
            c2 + &c4,
        ])
    }
}

impl Div for ExtensionFieldElement {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        self * rhs.inv()
    }
}

impl Mul<&BFE> for ExtensionFieldElement {
    type Output = Self;
    fn mul(self, rhs: &BFE) -> Self {
        Self([
            self.0[0].clone() * rhs,
            self.0[1].clone() * rhs,
            self.0[2].clone() * rhs,
        ])
    }
}

impl std::iter::Sum for ExtensionFieldElement {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

/// Batch inversion: one field inversion for `n` elements, following the
/// standard Montgomery trick (the algebra substrate's pattern for `F`,
/// generalized here to `X`).
pub fn batch_inverse_xfe(values: &[ExtensionFieldElement]) -> Vec<ExtensionFieldElement> {
    if values.is_empty() {
        return vec![];
    }
    let mut prefix = Vec::with_capacity(values.len());
    let mut acc = ExtensionFieldElement::one();
    for v in values {
        prefix.push(acc);
        acc = acc * *v;
    }
    let mut inv_acc = acc.inv();
    let mut result = vec![ExtensionFieldElement::zero(); values.len()];
    for i in (0..values.len()).rev() {
        result[i] = inv_acc * prefix[i];
        inv_acc = inv_acc * values[i];
    }
    result
}

pub fn bfe_to_bytes(x: &BFE) -> Vec<u8> {
    x.to_bytes_be()
}

pub fn xfe_to_bytes(x: &ExtensionFieldElement) -> Vec<u8> {
    let mut out = Vec::with_capacity(96);
    for limb in &x.0 {
        out.extend_from_slice(&limb.to_bytes_be());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_is_multiplicative_identity() {
        let x = ExtensionFieldElement::new(BFE::from(5u64), BFE::from(7u64), BFE::from(11u64));
        assert_eq!(x * x.inv(), ExtensionFieldElement::one());
    }

    #[test]
    fn lift_round_trips_through_to_base() {
        let b = BFE::from(42u64);
        let x = ExtensionFieldElement::lift(&b);
        assert_eq!(x.to_base(), Some(b));

        let not_base = ExtensionFieldElement::new(BFE::from(1u64), BFE::from(1u64), BFE::zero());
        assert_eq!(not_base.to_base(), None);
    }

    #[test]
    fn arithmetic_agrees_with_naive_polynomial_reduction() {
        // x^3 = x + 1, so (1 + 0*x + 0*x^2) representing the constant 1 times
        // itself three times via repeated squaring should equal pow(3).
        let x = ExtensionFieldElement::new(BFE::zero(), BFE::one(), BFE::zero());
        let cubed = x * x * x;
        let expected = ExtensionFieldElement::new(BFE::one(), BFE::one(), BFE::zero());
        assert_eq!(cubed, expected);
        assert_eq!(x.pow(3), expected);
    }

    #[test]
    fn batch_inverse_matches_individual_inversion() {
        let values: Vec<ExtensionFieldElement> = (1..=4u64)
            .map(|i| ExtensionFieldElement::lift(&BFE::from(i)))
            .collect();
        let batch = batch_inverse_xfe(&values);
        for (v, inv) in values.iter().zip(batch.iter()) {
            assert_eq!(*inv, v.inv());
        }
    }

    #[test]
    fn sub_and_neg_are_consistent() {
        let a = ExtensionFieldElement::new(BFE::from(3u64), BFE::from(4u64), BFE::from(5u64));
        let b = ExtensionFieldElement::new(BFE::from(1u64), BFE::from(2u64), BFE::from(9u64));
        assert_eq!(a - b, a + (-b));
    }
}
