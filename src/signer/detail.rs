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

//! Pure round-local computations for the signer (spec section 4.4), kept
//! separate from [`crate::signer`]'s message-driven orchestration so they
//! can be unit tested without a multi-party harness.

use crate::group::ECPoint;

/// The byte payload a party hash-commits to for a single curve point
/// (round 4's `a_i . G`).
pub fn point_payload<P: ECPoint>(point: &P) -> Vec<u8> {
	bincode::serialize(point).expect("serialization of a point cannot fail")
}

/// The byte payload for a commitment to a pair of curve points (rounds 5-6's
/// `(V_i, A_i)` and rounds 7-8's `(U_i, T_i)`).
pub fn pair_payload<P: ECPoint>(a: &P, b: &P) -> Vec<u8> {
	bincode::serialize(&(a, b)).expect("serialization of points cannot fail")
}

/// Sums an iterator of points, starting from the identity.
pub fn sum_points<P: ECPoint>(points: impl Iterator<Item = P>) -> P {
	points.fold(P::point_at_infinity(), |acc, p| acc + p)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		curves::secp256k1::{Point, Scalar},
		group::Rng,
	};
	use rand::SeedableRng;

	#[test]
	fn point_payload_is_deterministic() {
		let mut rng = Rng::from_seed([60; 32]);
		let p = Point::from_scalar(&Scalar::random(&mut rng));
		assert_eq!(point_payload(&p), point_payload(&p));
	}

	#[test]
	fn sum_points_matches_manual_fold() {
		let mut rng = Rng::from_seed([61; 32]);
		let a = Point::from_scalar(&Scalar::random(&mut rng));
		let b = Point::from_scalar(&Scalar::random(&mut rng));
		let c = Point::from_scalar(&Scalar::random(&mut rng));
		assert_eq!(sum_points([a, b, c].into_iter()), a + b + c);
	}
}
