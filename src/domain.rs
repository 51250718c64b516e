//! Evaluation domain: the multiplicative coset `g · <omega>` of size
//! `N = 2^k`.
//!
//! Base-field NTT work is delegated to `lambdaworks-math`'s `FFTPoly` trait
//! (`evaluate_offset_fft` / `interpolate_offset_fft`), matching the
//! teacher's own LDE evaluation helper (`evaluate_polynomial_on_lde_domain`
//! in `starks/prover.rs`). The extension-field variants run that same NTT
//! independently on each of the three base-field coordinates and reassemble
//! per index, exactly as `original_source/fri.py`'s `xevaluate` does.

use lambdaworks_math::fft::polynomial::FFTPoly;
use lambdaworks_math::polynomial::Polynomial;

use crate::field::{BFE, XFE};
use crate::polynomial::XPolynomial;

/// An immutable coset domain, constructed once per FRI instance and halved
/// (`omega -> omega^2`, `offset -> offset^2`) across rounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    pub offset: BFE,
    pub generator: BFE,
    pub length: usize,
}

impl Domain {
    pub fn new(offset: BFE, generator: BFE, length: usize) -> Self {
        debug_assert!(length.is_power_of_two());
        Self {
            offset,
            generator,
            length,
        }
    }

    /// `g * omega^i`.
    pub fn point(&self, i: usize) -> BFE {
        &self.offset * self.generator.pow(i as u64)
    }

    pub fn points(&self) -> Vec<BFE> {
        (0..self.length).map(|i| self.point(i)).collect()
    }

    /// Precondition this domain's FRI round relies on: `omega` has order
    /// exactly `N`, i.e. `omega^(N-1) == omega^-1`.
    pub fn has_correct_generator_order(&self) -> bool {
        self.generator.pow((self.length - 1) as u64) == self.generator.inv()
    }

    /// Evaluates `p` (degree `< N`) over the coset via coset-NTT.
    pub fn evaluate(&self, p: &Polynomial<BFE>) -> Vec<BFE> {
        debug_assert!((p.degree() as isize) < self.length as isize);
        p.evaluate_offset_fft(1, Some(self.length), &self.offset)
            .expect("coset NTT evaluation failed")
    }

    /// Inverse of `evaluate`: `interpolate(evaluate(p)) == p`.
    pub fn interpolate(&self, values: &[BFE]) -> Polynomial<BFE> {
        Polynomial::interpolate_offset_fft(values, &self.offset)
            .expect("coset NTT interpolation failed")
    }

    /// Extension-field evaluation: runs the base-field NTT independently on
    /// each of the three coordinates, then reassembles per index.
    pub fn xevaluate(&self, p: &XPolynomial) -> Vec<XFE> {
        let coords = p.coordinate_polys(self.length);
        let evaluated: Vec<Vec<BFE>> = coords
            .into_iter()
            .map(|coeffs| self.evaluate(&Polynomial::new(&coeffs)))
            .collect();
        (0..self.length)
            .map(|i| XFE::new(evaluated[0][i].clone(), evaluated[1][i].clone(), evaluated[2][i].clone()))
            .collect()
    }

    pub fn xinterpolate(&self, values: &[XFE]) -> XPolynomial {
        let mut coords: [Vec<BFE>; 3] = [
            Vec::with_capacity(values.len()),
            Vec::with_capacity(values.len()),
            Vec::with_capacity(values.len()),
        ];
        for v in values {
            for j in 0..3 {
                coords[j].push(v.0[j].clone());
            }
        }
        let interpolated: Vec<Vec<BFE>> = coords
            .into_iter()
            .map(|col| self.interpolate(&col).coefficients().to_vec())
            .collect();
        let len = interpolated.iter().map(|c| c.len()).max().unwrap_or(0);
        let mut padded = interpolated;
        for col in padded.iter_mut() {
            col.resize(len, BFE::zero());
        }
        let mut it = padded.into_iter();
        let c0 = it.next().unwrap();
        let c1 = it.next().unwrap();
        let c2 = it.next().unwrap();
        XPolynomial::from_coordinate_polys([c0, c1, c2])
    }

    /// The next domain in the FRI commit-phase chain: `(g^2, omega^2, N/2)`.
    pub fn halve(&self) -> Domain {
        Domain {
            offset: self.offset.square(),
            generator: self.generator.square(),
            length: self.length / 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambdaworks_math::field::traits::IsFFTField;

    fn domain_of_size(n: usize) -> Domain {
        let order = n.trailing_zeros() as u64;
        let generator = crate::field::BaseField::get_primitive_root_of_unity(order).unwrap();
        Domain::new(BFE::from(3u64), generator, n)
    }

    #[test]
    fn round_trip_low_degree_polynomial() {
        let domain = domain_of_size(16);
        let coeffs: Vec<BFE> = (0..5).map(|i| BFE::from(i as u64 + 1)).collect();
        let p = Polynomial::new(&coeffs);
        let codeword = domain.evaluate(&p);
        let back = domain.interpolate(&codeword);
        assert_eq!(back, p);
    }

    #[test]
    fn generator_has_correct_order() {
        let domain = domain_of_size(16);
        assert!(domain.has_correct_generator_order());
    }
}
