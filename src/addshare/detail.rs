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

//! Pure round-local computations for add-share (spec section 4.6), kept
//! separate from [`crate::addshare`]'s message-driven orchestration so they
//! can be unit tested without a multi-party harness.

use std::collections::BTreeMap;

use crate::{
	group::{ECScalar, Rng},
	message::PeerId,
	share::BK,
};

/// Checks every `BK` across the quorum is pairwise distinct in `(x, rank)`
/// (spec section 3's BK invariant).
pub fn check_distinct_bks<S: Clone + PartialEq>(
	bks: &BTreeMap<PeerId, BK<S>>,
) -> Result<(), (PeerId, PeerId)> {
	let entries: Vec<_> = bks.iter().collect();
	for i in 0..entries.len() {
		for j in (i + 1)..entries.len() {
			let (pi, bi) = entries[i];
			let (pj, bj) = entries[j];
			if bi.x == bj.x && bi.rank == bj.rank {
				return Err((pi.clone(), pj.clone()))
			}
		}
	}
	Ok(())
}

/// Picks a fresh `x` for the new participant: uniformly random, nonzero,
/// and distinct from every `x` already in use (spec section 3's "distinct
/// x per participant" invariant).
pub fn choose_fresh_x<S: ECScalar>(existing: &[S], rng: &mut Rng) -> S {
	loop {
		let candidate = S::random(rng);
		if candidate != S::zero() && !existing.iter().any(|x| x == &candidate) {
			return candidate
		}
	}
}

/// Splits `total` into `other_count` uniformly random shares (one per other
/// old peer) plus one deterministic residual that makes all of them, plus
/// the pieces kept by the splitting peer, sum to `total` (spec section 4.6
/// step 3: "splits lambda'_i . s_i into random shares whose sum is
/// lambda'_i . s_i. One share (delta_{i,i}) is kept and the others are sent
/// privately to each old peer j"). The residual doubles as delta_{i,i} —
/// the piece the splitting peer keeps for its own refreshed share — and as
/// delta_i, the value delivered to the new peer (spec section 4.6 step 4:
/// delta_i = lambda'_i . s_i - sum_j delta_{i,j}, summed over the sent
/// shares only).
pub fn split_with_residual<S: ECScalar>(
	total: &S,
	other_count: usize,
	rng: &mut Rng,
) -> (Vec<S>, S) {
	let randoms: Vec<S> = (0..other_count).map(|_| S::random(rng)).collect();
	let sum_randoms: S = randoms.iter().cloned().sum();
	let residual = total.clone() - sum_randoms;
	(randoms, residual)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::curves::secp256k1::Scalar;
	use rand::SeedableRng;

	#[test]
	fn split_with_residual_sums_back_to_total() {
		let mut rng = crate::group::Rng::from_seed([70; 32]);
		let total = Scalar::from(12345u32);
		let (randoms, residual) = split_with_residual(&total, 4, &mut rng);
		let sum: Scalar = randoms.into_iter().chain(std::iter::once(residual)).sum();
		assert_eq!(sum, total);
	}

	#[test]
	fn choose_fresh_x_avoids_collisions() {
		let mut rng = crate::group::Rng::from_seed([71; 32]);
		let existing = vec![Scalar::from(1u32), Scalar::from(2u32), Scalar::from(3u32)];
		for _ in 0..50 {
			let x = choose_fresh_x(&existing, &mut rng);
			assert!(!existing.contains(&x));
			assert_ne!(x, Scalar::zero());
		}
	}

	#[test]
	fn distinct_bks_pass_and_collisions_are_caught() {
		let mut bks = BTreeMap::new();
		bks.insert("a".to_string(), BK::<Scalar> { x: Scalar::from(1u32), rank: 0 });
		bks.insert("b".to_string(), BK::<Scalar> { x: Scalar::from(1u32), rank: 0 });
		assert!(check_distinct_bks(&bks).is_err());

		let mut ok = BTreeMap::new();
		ok.insert("a".to_string(), BK::<Scalar> { x: Scalar::from(1u32), rank: 0 });
		ok.insert("b".to_string(), BK::<Scalar> { x: Scalar::from(2u32), rank: 0 });
		assert!(check_distinct_bks(&ok).is_ok());
	}
}
