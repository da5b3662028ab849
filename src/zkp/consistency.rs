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

//! Chaum-Pedersen equality-of-discrete-log proof: shows that two points,
//! taken over two (possibly different) bases, commit to the same secret
//! scalar. The signer's round 7 uses this to bind `V_i` (committed over
//! base `R`) and `A_i` (committed over base `G`) to a shared underlying
//! value without revealing it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::group::{ECPoint, ECScalar, Rng};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ConsistencyProof<P: ECPoint> {
	t1: P,
	t2: P,
	response: P::Scalar,
}

fn challenge<P: ECPoint>(
	context: &[u8],
	base1: &P,
	base2: &P,
	point1: &P,
	point2: &P,
	t1: &P,
	t2: &P,
) -> P::Scalar {
	let mut hasher = Sha256::new();
	hasher.update(context);
	for p in [base1, base2, point1, point2, t1, t2] {
		hasher.update(p.as_bytes());
	}
	let digest = hasher.finalize();
	let mut bytes = [0u8; 32];
	bytes.copy_from_slice(&digest[..32]);
	P::Scalar::from_bytes_mod_order(&bytes)
}

/// Proves knowledge of `secret` such that `point1 == base1 * secret` and
/// `point2 == base2 * secret`, for the points the caller derives separately.
pub fn prove<P: ECPoint>(
	secret: &P::Scalar,
	base1: &P,
	base2: &P,
	context: &[u8],
	rng: &mut Rng,
) -> ConsistencyProof<P> {
	let k = P::Scalar::random(rng);
	let t1 = *base1 * &k;
	let t2 = *base2 * &k;
	let point1 = *base1 * secret;
	let point2 = *base2 * secret;
	let e = challenge(context, base1, base2, &point1, &point2, &t1, &t2);
	let response = k + e * secret.clone();
	ConsistencyProof { t1, t2, response }
}

pub fn verify<P: ECPoint>(
	point1: &P,
	point2: &P,
	base1: &P,
	base2: &P,
	proof: &ConsistencyProof<P>,
	context: &[u8],
) -> bool {
	let e = challenge(context, base1, base2, point1, point2, &proof.t1, &proof.t2);
	(*base1 * &proof.response == proof.t1 + *point1 * e.clone()) &&
		(*base2 * &proof.response == proof.t2 + *point2 * e)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::curves::secp256k1::{Point, Scalar};
	use rand::SeedableRng;

	#[test]
	fn honest_proof_verifies() {
		let mut rng = Rng::from_seed([50; 32]);
		let secret = Scalar::random(&mut rng);
		let base1 = Point::base_point();
		let base2 = Point::from_scalar(&Scalar::random(&mut rng));
		let point1 = base1 * &secret;
		let point2 = base2 * &secret;

		let proof = prove(&secret, &base1, &base2, b"signer:round7", &mut rng);
		assert!(verify(&point1, &point2, &base1, &base2, &proof, b"signer:round7"));
	}

	#[test]
	fn inconsistent_points_fail() {
		let mut rng = Rng::from_seed([51; 32]);
		let secret = Scalar::random(&mut rng);
		let other_secret = Scalar::random(&mut rng);
		let base1 = Point::base_point();
		let base2 = Point::from_scalar(&Scalar::random(&mut rng));
		let point1 = base1 * &secret;
		// point2 committed under a *different* secret than the proof attests to.
		let point2 = base2 * &other_secret;

		let proof = prove(&secret, &base1, &base2, b"ctx", &mut rng);
		assert!(!verify(&point1, &point2, &base1, &base2, &proof, b"ctx"));
	}
}
