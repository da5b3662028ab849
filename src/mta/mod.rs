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

//! The multiplicative-to-additive (MtA) share-conversion engine (component
//! M): turns `(a, b)` held respectively by a sender and a receiver into
//! `(alpha, beta)` with `alpha + beta == a * b (mod q)`, neither party
//! learning the other's input. Built on top of G, S's scalar field, the
//! opaque [`HomomorphicScheme`] (H), and the Paillier/curve consistency
//! proof from [`crate::zkp::homomorphic_proofs`] (Z). Re-used identically
//! by DKG and by the signer's round 3.

use num_bigint::BigUint;
use rand::RngCore;
use thiserror::Error;

use crate::{
	group::{ECScalar, Rng},
	homomorphic::{HeError, HomomorphicScheme},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtaError {
	#[error("sender's ciphertext-well-formed proof failed to verify")]
	ProofInvalid,
	#[error(transparent)]
	Homomorphic(#[from] HeError),
}

/// Additional bits of statistical slack above `q` when the receiver samples
/// its blinding value `beta'`, so that `alpha := a*k + beta' (mod q)` leaks
/// nothing about `k` even though the arithmetic happens over the integers.
const STATISTICAL_SECURITY_BITS: usize = 256;

fn sample_below(bound: &BigUint, rng: &mut Rng) -> BigUint {
	let bits = bound.bits().max(1) as usize;
	loop {
		let mut bytes = vec![0u8; bits.div_ceil(8)];
		rng.fill_bytes(&mut bytes);
		let candidate = BigUint::from_bytes_be(&bytes);
		if &candidate < bound {
			return candidate
		}
	}
}

/// Step 1: the sender encrypts its scalar under its own homomorphic public
/// key and attaches a ciphertext-well-formed proof.
pub fn sender_encrypt<H: HomomorphicScheme, S: ECScalar>(
	pk: &H::PublicKey,
	value: &S,
	rng: &mut Rng,
) -> (H::Ciphertext, H::CiphertextProof, BigUint) {
	let plaintext = value.to_bigint();
	let (ciphertext, randomness) = H::encrypt(pk, &plaintext, rng);
	let proof = H::prove_well_formed(pk, &plaintext, &randomness, &ciphertext, rng);
	(ciphertext, proof, randomness)
}

/// Steps 2-3 (receiver side): verify the sender's proof, fold in a random
/// blinding value, and return the ciphertext to send back plus this party's
/// additive share `beta := -beta' mod q`.
pub fn receiver_respond<H: HomomorphicScheme, S: ECScalar>(
	pk: &H::PublicKey,
	ciphertext: &H::Ciphertext,
	proof: &H::CiphertextProof,
	value: &S,
	rng: &mut Rng,
) -> Result<(H::Ciphertext, S), MtaError> {
	if !H::verify_well_formed(pk, ciphertext, proof) {
		return Err(MtaError::ProofInvalid)
	}

	let q = S::curve_order();
	let sample_bound = &q << STATISTICAL_SECURITY_BITS;
	if sample_bound >= H::message_range(pk) {
		return Err(MtaError::Homomorphic(HeError::OutOfRange))
	}
	let beta_prime = sample_below(&sample_bound, rng);

	let scaled = H::mul_const(pk, ciphertext, &value.to_bigint());
	let (blind_cipher, _) = H::encrypt(pk, &beta_prime, rng);
	let combined = H::add(pk, &scaled, &blind_cipher);

	let beta_prime_scalar = S::from_bigint(&beta_prime);
	Ok((combined, -beta_prime_scalar))
}

/// Step 3 (sender side): decrypt the returned ciphertext and reduce mod q
/// to obtain this party's additive share `alpha`.
pub fn sender_finish<H: HomomorphicScheme, S: ECScalar>(
	pk: &H::PublicKey,
	sk: &H::SecretKey,
	combined: &H::Ciphertext,
) -> Result<S, MtaError> {
	let alpha_prime = H::decrypt(pk, sk, combined)?;
	Ok(S::from_bigint(&alpha_prime))
}

/// The `GetProofWithCheck`/`VerifyProofWithCheck` adjunct: proves the
/// sender's MtA input is the same value it previously committed to as a
/// curve point (e.g. `k_i . G`), crossing the H/G boundary via the concrete
/// Paillier scheme.
pub mod consistency {
	use crate::{
		group::{ECPoint, Rng},
		homomorphic::{PaillierCiphertext, PaillierPublicKey},
		zkp::homomorphic_proofs::{self, MtaConsistencyProof},
	};
	use num_bigint::BigUint;

	pub fn get_proof_with_check<P: ECPoint>(
		pk: &PaillierPublicKey,
		value: &P::Scalar,
		randomness: &BigUint,
		ciphertext: &PaillierCiphertext,
		rng: &mut Rng,
	) -> MtaConsistencyProof<P> {
		homomorphic_proofs::prove::<P>(pk, value, randomness, ciphertext, rng)
	}

	pub fn verify_proof_with_check<P: ECPoint>(
		pk: &PaillierPublicKey,
		ciphertext: &PaillierCiphertext,
		committed_point: &P,
		proof: &MtaConsistencyProof<P>,
	) -> bool {
		homomorphic_proofs::verify(pk, ciphertext, committed_point, proof)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{curves::secp256k1::Scalar, homomorphic::PaillierScheme};
	use rand::SeedableRng;

	#[test]
	fn mta_round_produces_additive_shares_of_the_product() {
		let mut rng = Rng::from_seed([80; 32]);
		let (pk, sk) = PaillierScheme::keygen(&mut rng);

		let a = Scalar::random(&mut rng);
		let b = Scalar::random(&mut rng);

		let (cipher, proof, _r) = sender_encrypt::<PaillierScheme, Scalar>(&pk, &a, &mut rng);
		let (returned, beta) =
			receiver_respond::<PaillierScheme, Scalar>(&pk, &cipher, &proof, &b, &mut rng).unwrap();
		let alpha = sender_finish::<PaillierScheme, Scalar>(&pk, &sk, &returned).unwrap();

		assert_eq!(alpha + beta, a * b);
	}

	#[test]
	fn tampered_proof_is_rejected() {
		let mut rng = Rng::from_seed([81; 32]);
		let (pk, _sk) = PaillierScheme::keygen(&mut rng);
		let (pk_other, _) = PaillierScheme::keygen(&mut rng);

		let a = Scalar::random(&mut rng);
		let b = Scalar::random(&mut rng);

		let (cipher, _proof, r) = sender_encrypt::<PaillierScheme, Scalar>(&pk, &a, &mut rng);
		// A proof generated against the wrong public key must not verify.
		let bad_proof =
			PaillierScheme::prove_well_formed(&pk_other, &a.to_bigint(), &r, &cipher, &mut rng);

		let result =
			receiver_respond::<PaillierScheme, Scalar>(&pk, &cipher, &bad_proof, &b, &mut rng);
		assert_eq!(result, Err(MtaError::ProofInvalid));
	}
}
