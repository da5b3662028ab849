// Copyright 2025 Chainflip Labs GmbH
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

use crate::group::{ECPoint, ECScalar, Rng};

/// A polynomial over `Z_q` represented by its coefficients, lowest degree
/// first (`coefficients[0]` is the constant term `f(0)`).
#[derive(Clone, Debug)]
pub struct Polynomial<S: ECScalar> {
	coefficients: Vec<S>,
}

/// The falling factorial `k! / (k - rank)!`, i.e. the constant that appears
/// when differentiating `x^k` `rank` times: `d^rank/dx^rank x^k = P(k, rank)
/// x^(k - rank)`.
fn falling_factorial<S: ECScalar>(k: u32, rank: u32) -> S {
	if rank > k {
		return S::zero()
	}
	let mut acc = S::one();
	for i in 0..rank {
		acc = acc * S::from(k - i);
	}
	acc
}

impl<S: ECScalar> Polynomial<S> {
	/// Samples a random polynomial of degree `threshold - 1` with the given
	/// constant term. DKG uses a random constant term (the fresh key-share
	/// contribution); reshare uses a zero constant term (so the sum of all
	/// zero-polynomials doesn't move the public key).
	pub fn random_with_constant_term(threshold: usize, constant_term: S, rng: &mut Rng) -> Self {
		assert!(threshold >= 1, "a threshold of at least 1 is required");
		let mut coefficients = Vec::with_capacity(threshold);
		coefficients.push(constant_term);
		for _ in 1..threshold {
			coefficients.push(S::random(rng));
		}
		Polynomial { coefficients }
	}

	pub fn coefficients(&self) -> &[S] {
		&self.coefficients
	}

	pub fn degree(&self) -> usize {
		self.coefficients.len().saturating_sub(1)
	}

	/// Horner evaluation of the `rank`-th formal derivative of this
	/// polynomial at `x`, reduced mod `q` (spec: evaluate(polynomial, x,
	/// rank)).
	pub fn evaluate(&self, x: &S, rank: u32) -> S {
		let deg = self.degree() as u32;
		if rank > deg {
			return S::zero()
		}
		let mut acc = S::zero();
		for k in (rank..=deg).rev() {
			let term = falling_factorial::<S>(k, rank) * self.coefficients[k as usize].clone();
			acc = acc * x.clone() + term;
		}
		acc
	}

	/// Feldman commitments: `c_k . G` for every coefficient, used to let
	/// peers verify a received share without learning the polynomial.
	pub fn commit<P: ECPoint<Scalar = S>>(&self) -> Vec<P> {
		self.coefficients.iter().map(P::from_scalar).collect()
	}
}

/// Verifies a share `f^(rank)(x)` against Feldman commitments
/// `[c_0.G, c_1.G, ..., c_{t-1}.G]`, i.e. checks `share . G ==
/// sum_{k>=rank} P(k,rank) x^(k-rank) . (c_k . G)`.
pub fn verify_share<P: ECPoint>(
	share: &P::Scalar,
	x: &P::Scalar,
	rank: u32,
	commitments: &[P],
) -> bool {
	let mut x_pow = P::Scalar::one();
	let mut expected = P::point_at_infinity();
	for (k, c_k_g) in commitments.iter().enumerate() {
		let k = k as u32;
		if k < rank {
			continue
		}
		let coeff = falling_factorial::<P::Scalar>(k, rank) * x_pow.clone();
		expected = expected + (*c_k_g * &coeff);
		x_pow = x_pow * x.clone();
	}

	P::from_scalar(share) == expected
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::curves::secp256k1::{Point, Scalar};
	use rand::SeedableRng;

	fn poly(coeffs: &[u32]) -> Polynomial<Scalar> {
		Polynomial { coefficients: coeffs.iter().map(|c| Scalar::from(*c)).collect() }
	}

	#[test]
	fn evaluate_rank_0_matches_direct_sum() {
		// f(x) = 3 + 2x + 5x^2
		let f = poly(&[3, 2, 5]);
		let x = Scalar::from(4u32);
		// f(4) = 3 + 8 + 80 = 91
		assert_eq!(f.evaluate(&x, 0), Scalar::from(91u32));
	}

	#[test]
	fn evaluate_rank_1_matches_derivative() {
		// f(x) = 3 + 2x + 5x^2, f'(x) = 2 + 10x
		let f = poly(&[3, 2, 5]);
		let x = Scalar::from(4u32);
		// f'(4) = 2 + 40 = 42
		assert_eq!(f.evaluate(&x, 1), Scalar::from(42u32));
	}

	#[test]
	fn evaluate_rank_2_matches_second_derivative() {
		// f''(x) = 10 (constant)
		let f = poly(&[3, 2, 5]);
		let x = Scalar::from(4u32);
		assert_eq!(f.evaluate(&x, 2), Scalar::from(10u32));
	}

	#[test]
	fn rank_above_degree_is_zero() {
		let f = poly(&[3, 2, 5]);
		let x = Scalar::from(4u32);
		assert_eq!(f.evaluate(&x, 3), Scalar::zero());
	}

	#[test]
	fn shares_verify_against_feldman_commitments() {
		let mut rng = Rng::from_seed([7; 32]);
		let f = Polynomial::random_with_constant_term(3, Scalar::random(&mut rng), &mut rng);
		let commitments: Vec<Point> = f.commit();

		for x in [1u32, 2, 3, 4] {
			let x = Scalar::from(x);
			for rank in [0u32, 1] {
				let share = f.evaluate(&x, rank);
				assert!(verify_share(&share, &x, rank, &commitments));
			}
		}
	}

	#[test]
	fn tampered_share_fails_verification() {
		let mut rng = Rng::from_seed([8; 32]);
		let f = Polynomial::random_with_constant_term(3, Scalar::random(&mut rng), &mut rng);
		let commitments: Vec<Point> = f.commit();

		let x = Scalar::from(1u32);
		let mut share = f.evaluate(&x, 0);
		share = share + Scalar::one();

		assert!(!verify_share(&share, &x, 0, &commitments));
	}
}
