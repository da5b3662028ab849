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

use crate::group::{ECPoint, ECScalar};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A Birkhoff parameter: a participant's position `(x, rank)` in the
/// interpolation scheme. `rank` is the order of the formal derivative this
/// participant's share corresponds to; plain Shamir sharing is the special
/// case where every participant has `rank == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BK<S> {
	pub x: S,
	pub rank: u32,
}

impl<S> BK<S> {
	pub fn new(x: S, rank: u32) -> Self {
		BK { x, rank }
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
	#[error("expected {expected} BKs for this threshold, got {actual}")]
	InconsistentQuorum { expected: usize, actual: usize },
	#[error("the selected BKs are linearly dependent; no unique interpolation exists")]
	IllConditioned,
	#[error("duplicate (x, rank) pair among the supplied BKs")]
	DuplicateBk,
}

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

/// Row `i` of the Birkhoff matrix: `M[i][k] = P(k, rank_i) * x_i^(k -
/// rank_i)` for `k >= rank_i`, else `0`, for `k` in `0..threshold`.
fn matrix_row<S: ECScalar>(bk: &BK<S>, threshold: usize) -> Vec<S> {
	let mut row = Vec::with_capacity(threshold);
	let mut x_pow = S::one();
	for k in 0..threshold as u32 {
		if k < bk.rank {
			row.push(S::zero());
		} else {
			row.push(falling_factorial::<S>(k, bk.rank) * x_pow.clone());
			x_pow = x_pow.clone() * bk.x.clone();
		}
	}
	row
}

fn check_quorum<S: Clone + PartialEq>(bks: &[BK<S>], threshold: usize) -> Result<(), ShareError> {
	if bks.len() != threshold {
		return Err(ShareError::InconsistentQuorum { expected: threshold, actual: bks.len() })
	}
	for i in 0..bks.len() {
		for j in (i + 1)..bks.len() {
			if bks[i].x == bks[j].x && bks[i].rank == bks[j].rank {
				return Err(ShareError::DuplicateBk)
			}
		}
	}
	Ok(())
}

/// Solves the Birkhoff system `M^T . lambda = target_row` via Gaussian
/// elimination over `Z_q`, where `target_row[k] = P(k, target_rank) *
/// target_x^(k - target_rank)`. `lambda[i]` is the coefficient by which
/// participant `i`'s share must be multiplied so that
/// `sum_i lambda[i] * f^(rank_i)(x_i) == f^(target_rank)(target_x)`.
///
/// `compute_coefficients` is the special case `(target_x, target_rank) ==
/// (0, 0)`; `add_share_coefficient` evaluates at the new participant's BK
/// instead, reusing the same solve to let the new share be reconstructed
/// from (secret-shared) contributions of the existing quorum without any
/// single old peer learning it directly.
pub fn evaluate_coefficients_at<S: ECScalar>(
	bks: &[BK<S>],
	target_x: &S,
	target_rank: u32,
	threshold: usize,
) -> Result<Vec<S>, ShareError> {
	check_quorum(bks, threshold)?;

	let t = threshold;
	// Build the augmented matrix for M^T . lambda = target_row: row `k`
	// holds (M[0][k], M[1][k], ..., M[t-1][k] | target_row[k]).
	let rows: Vec<Vec<S>> = bks.iter().map(|bk| matrix_row(bk, t)).collect();
	let target_row = matrix_row(&BK { x: target_x.clone(), rank: target_rank }, t);

	let mut aug: Vec<Vec<S>> = (0..t)
		.map(|k| {
			let mut row: Vec<S> = (0..t).map(|i| rows[i][k].clone()).collect();
			row.push(target_row[k].clone());
			row
		})
		.collect();

	// Gaussian elimination with partial pivoting (values are public BK
	// coordinates, so variable-time arithmetic is fine here).
	for col in 0..t {
		let pivot_row = (col..t).find(|&r| aug[r][col] != S::zero());
		let pivot_row = pivot_row.ok_or(ShareError::IllConditioned)?;
		aug.swap(col, pivot_row);

		let pivot_inv = aug[col][col].clone().invert().ok_or(ShareError::IllConditioned)?;
		for c in 0..=t {
			aug[col][c] = aug[col][c].clone() * pivot_inv.clone();
		}

		for r in 0..t {
			if r == col {
				continue
			}
			let factor = aug[r][col].clone();
			if factor == S::zero() {
				continue
			}
			for c in 0..=t {
				let sub = aug[col][c].clone() * factor.clone();
				aug[r][c] = aug[r][c].clone() - sub;
			}
		}
	}

	Ok((0..t).map(|r| aug[r][t].clone()).collect())
}

/// `compute-coefficients(BKs, threshold, q) -> vector of scalars` (spec
/// section 4.1): the Birkhoff coefficients that reconstruct `f(0)`.
pub fn compute_coefficients<S: ECScalar>(
	bks: &[BK<S>],
	threshold: usize,
) -> Result<Vec<S>, ShareError> {
	evaluate_coefficients_at(bks, &S::zero(), 0, threshold)
}

/// `validate-public-key(BKs, siGs, threshold, expected)` (spec section
/// 4.1): computes `sum_i lambda_i . siG_i` and checks it equals `expected`.
pub fn validate_public_key<P: ECPoint>(
	bks: &[BK<P::Scalar>],
	si_gs: &[P],
	threshold: usize,
	expected: &P,
) -> Result<bool, ShareError> {
	if si_gs.len() != bks.len() {
		return Err(ShareError::InconsistentQuorum { expected: bks.len(), actual: si_gs.len() })
	}

	let coeffs = compute_coefficients(bks, threshold)?;
	let reconstructed: P =
		coeffs.into_iter().zip(si_gs.iter()).map(|(lambda, si_g)| *si_g * &lambda).sum();

	Ok(reconstructed == *expected)
}

/// `add-share-coefficient(existing BKs, own BK, new BK, q, threshold)`
/// (spec section 4.1): the factor an existing peer applies to its own
/// share `s_i` so that the resulting value, summed across the whole
/// existing quorum, equals `f^(new_bk.rank)(new_bk.x)` — the share the new
/// participant should end up holding, without disclosing it to any single
/// old peer.
pub fn add_share_coefficient<S: ECScalar>(
	existing_bks: &[BK<S>],
	own_bk: &BK<S>,
	new_bk: &BK<S>,
	threshold: usize,
) -> Result<S, ShareError> {
	let coeffs = evaluate_coefficients_at(existing_bks, &new_bk.x, new_bk.rank, threshold)?;
	let own_pos = existing_bks
		.iter()
		.position(|bk| bk == own_bk)
		.ok_or(ShareError::InconsistentQuorum { expected: threshold, actual: 0 })?;
	Ok(coeffs[own_pos].clone())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::curves::secp256k1::{Point, Scalar};
	use crate::share::Polynomial;
	use rand::SeedableRng;

	fn bk(x: u32, rank: u32) -> BK<Scalar> {
		BK::new(Scalar::from(x), rank)
	}

	#[test]
	fn reconstructs_f0_for_plain_shamir_bks() {
		let mut rng = crate::group::Rng::from_seed([9; 32]);
		let secret = Scalar::random(&mut rng);
		let f = Polynomial::random_with_constant_term(3, secret.clone(), &mut rng);

		let bks = vec![bk(1, 0), bk(2, 0), bk(3, 0)];
		let shares: Vec<Scalar> = bks.iter().map(|b| f.evaluate(&b.x, b.rank)).collect();

		let coeffs = compute_coefficients(&bks, 3).unwrap();
		let reconstructed: Scalar =
			coeffs.into_iter().zip(shares).map(|(l, s)| l * s).sum();

		assert_eq!(reconstructed, secret);
	}

	#[test]
	fn reconstructs_f0_with_mixed_ranks() {
		let mut rng = crate::group::Rng::from_seed([10; 32]);
		let secret = Scalar::random(&mut rng);
		let f = Polynomial::random_with_constant_term(3, secret.clone(), &mut rng);

		// Any quorum must include at least one rank-0 BK to be Birkhoff-feasible
		// for this simple construction.
		let bks = vec![bk(1, 0), bk(4, 1), bk(5, 1)];
		let shares: Vec<Scalar> = bks.iter().map(|b| f.evaluate(&b.x, b.rank)).collect();

		let coeffs = compute_coefficients(&bks, 3).unwrap();
		let reconstructed: Scalar =
			coeffs.into_iter().zip(shares).map(|(l, s)| l * s).sum();

		assert_eq!(reconstructed, secret);
	}

	#[test]
	fn wrong_quorum_size_is_rejected() {
		let bks = vec![bk(1, 0), bk(2, 0)];
		assert_eq!(
			compute_coefficients(&bks, 3),
			Err(ShareError::InconsistentQuorum { expected: 3, actual: 2 })
		);
	}

	#[test]
	fn duplicate_bk_is_rejected() {
		let bks = vec![bk(1, 0), bk(1, 0), bk(2, 0)];
		assert_eq!(compute_coefficients(&bks, 3), Err(ShareError::DuplicateBk));
	}

	#[test]
	fn validate_public_key_detects_mismatch() {
		let mut rng = crate::group::Rng::from_seed([11; 32]);
		let secret = Scalar::random(&mut rng);
		let f = Polynomial::random_with_constant_term(3, secret.clone(), &mut rng);

		let bks = vec![bk(1, 0), bk(2, 0), bk(3, 0)];
		let si_gs: Vec<Point> =
			bks.iter().map(|b| Point::from_scalar(&f.evaluate(&b.x, b.rank))).collect();

		let expected = Point::from_scalar(&secret);
		assert!(validate_public_key(&bks, &si_gs, 3, &expected).unwrap());

		let wrong = Point::from_scalar(&(secret + Scalar::one()));
		assert!(!validate_public_key(&bks, &si_gs, 3, &wrong).unwrap());
	}

	#[test]
	fn add_share_coefficient_lets_new_peer_recover_its_share() {
		let mut rng = crate::group::Rng::from_seed([12; 32]);
		let secret = Scalar::random(&mut rng);
		let f = Polynomial::random_with_constant_term(3, secret, &mut rng);

		let existing = vec![bk(1, 0), bk(2, 0), bk(3, 0)];
		let new_bk = bk(4, 0);

		let contributions: Vec<Scalar> = existing
			.iter()
			.map(|own| {
				let lambda =
					add_share_coefficient(&existing, own, &new_bk, 3).unwrap();
				lambda * f.evaluate(&own.x, own.rank)
			})
			.collect();

		let new_share: Scalar = contributions.into_iter().sum();
		assert_eq!(new_share, f.evaluate(&new_bk.x, new_bk.rank));
	}
}
