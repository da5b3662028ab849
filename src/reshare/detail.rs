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

//! Pure round-local computations for reshare (spec section 4.5), kept
//! separate from [`crate::reshare`]'s message-driven orchestration so they
//! can be unit tested without a multi-party harness.

use std::collections::BTreeMap;

use crate::{group::ECPoint, message::PeerId, share::BK};

/// The byte payload a party hash-commits to in round 1: its own `BK` and
/// the Feldman coefficient points of its zero-sharing polynomial.
pub fn commitment_payload<P: ECPoint>(bk: &BK<P::Scalar>, coeffs: &[P]) -> Vec<u8> {
	bincode::serialize(&(bk, coeffs)).expect("serialization of scalars/points cannot fail")
}

/// The byte payload every peer should compute identically from the
/// session's BK assignment, echoed in round 0 so a coordinator handing out
/// inconsistent quorum views to different peers is caught (spec section
/// 13's broadcast-consistency check).
pub fn quorum_payload<S: Clone + Ord + serde::Serialize>(
	bks: &BTreeMap<PeerId, BK<S>>,
) -> Vec<u8> {
	bincode::serialize(bks).expect("serialization of the BK map cannot fail")
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

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{curves::secp256k1::Scalar, share::BK};

	#[test]
	fn quorum_payload_is_order_independent_of_insertion() {
		let mut a = BTreeMap::new();
		a.insert("peer-2".to_string(), BK { x: Scalar::from(2u32), rank: 0 });
		a.insert("peer-1".to_string(), BK { x: Scalar::from(1u32), rank: 0 });
		let mut b = BTreeMap::new();
		b.insert("peer-1".to_string(), BK { x: Scalar::from(1u32), rank: 0 });
		b.insert("peer-2".to_string(), BK { x: Scalar::from(2u32), rank: 0 });
		assert_eq!(quorum_payload(&a), quorum_payload(&b));
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
