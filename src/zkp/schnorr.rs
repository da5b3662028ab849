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

//! Schnorr proof of knowledge of a discrete log, used both for DKG's
//! proof-of-knowledge-of-`s_i` round and for the signer's several
//! knowledge-of-exponent rounds. Fiat-Shamir, non-interactive.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::group::{ECPoint, ECScalar, Rng};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct SchnorrProof<P: ECPoint> {
	commitment: P,
	response: P::Scalar,
}

fn challenge<P: ECPoint>(context: &[u8], public: &P, commitment: &P) -> P::Scalar {
	let mut hasher = Sha256::new();
	hasher.update(context);
	hasher.update(public.as_bytes());
	hasher.update(commitment.as_bytes());
	let digest = hasher.finalize();
	let mut bytes = [0u8; 32];
	bytes.copy_from_slice(&digest[..32]);
	P::Scalar::from_bytes_mod_order(&bytes)
}

/// Proves knowledge of `secret` such that `public == secret * G`. `context`
/// binds the proof to its usage site (e.g. a ceremony id and round tag) so
/// proofs can't be replayed across ceremonies.
pub fn prove<P: ECPoint>(secret: &P::Scalar, context: &[u8], rng: &mut Rng) -> SchnorrProof<P> {
	let k = P::Scalar::random(rng);
	let commitment = P::from_scalar(&k);
	let public = P::from_scalar(secret);
	let e = challenge(context, &public, &commitment);
	let response = k + e * secret.clone();
	SchnorrProof { commitment, response }
}

pub fn verify<P: ECPoint>(public: &P, proof: &SchnorrProof<P>, context: &[u8]) -> bool {
	let e = challenge(context, public, &proof.commitment);
	P::from_scalar(&proof.response) == proof.commitment + *public * e
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::curves::secp256k1::{Point, Scalar};
	use rand::SeedableRng;

	#[test]
	fn honest_proof_verifies() {
		let mut rng = Rng::from_seed([30; 32]);
		let secret = Scalar::random(&mut rng);
		let public = Point::from_scalar(&secret);

		let proof = prove::<Point>(&secret, b"ceremony-1:dkg:round4", &mut rng);
		assert!(verify(&public, &proof, b"ceremony-1:dkg:round4"));
	}

	#[test]
	fn proof_rejects_wrong_context() {
		let mut rng = Rng::from_seed([31; 32]);
		let secret = Scalar::random(&mut rng);
		let public = Point::from_scalar(&secret);

		let proof = prove::<Point>(&secret, b"ceremony-1:dkg:round4", &mut rng);
		assert!(!verify(&public, &proof, b"ceremony-2:dkg:round4"));
	}

	#[test]
	fn proof_rejects_wrong_public_point() {
		let mut rng = Rng::from_seed([32; 32]);
		let secret = Scalar::random(&mut rng);
		let other = Point::from_scalar(&Scalar::random(&mut rng));

		let proof = prove::<Point>(&secret, b"ctx", &mut rng);
		assert!(!verify(&other, &proof, b"ctx"));
	}
}
