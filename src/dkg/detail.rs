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

//! Pure round-local computations for DKG (spec section 4.3), kept separate
//! from [`crate::dkg`]'s message-driven orchestration so they can be unit
//! tested without a multi-party harness.

use std::collections::BTreeMap;

use crate::{
	group::ECPoint,
	message::PeerId,
	share::BK,
};

/// The byte payload a party hash-commits to in round 1: its own `BK` and
/// Feldman coefficient points. Both sides must serialize identically, so
/// this is the single place that defines the encoding.
pub fn commitment_payload<P: ECPoint>(bk: &BK<P::Scalar>, coeffs: &[P]) -> Vec<u8> {
	bincode::serialize(&(bk, coeffs)).expect("serialization of scalars/points cannot fail")
}

/// Checks every decommitted `BK` across the quorum is pairwise distinct in
/// `(x, rank)` (spec section 3's BK invariant).
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

/// The group public key implied by the quorum's Feldman commitments:
/// `Y = sum_k f_k(0) . G`, i.e. the sum of every peer's constant-term
/// commitment point.
pub fn reconstruct_public_key<P: ECPoint>(constant_term_points: impl Iterator<Item = P>) -> P {
	constant_term_points.fold(P::point_at_infinity(), |acc, p| acc + p)
}
