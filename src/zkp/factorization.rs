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

//! Proof of knowledge of a discrete log in a hidden-order group `Z_N^*`,
//! where `N` is an RSA-style composite modulus. This is the "integer
//! factorization" proof shape used by fs-dkr-style auxiliary-modulus setup
//! (its `DLogStatement`/`CompositeDLogProof`): the statement names a
//! modulus and two group elements, `X` and `Y`, and the proof attests to
//! knowledge of `secret` with `Y == X^secret mod N`, without requiring the
//! verifier to know the group's order.
//!
//! The witness carries the modulus's factors because the party that ran
//! `keygen` for this auxiliary modulus is also the only one who can sample
//! the blinding factor from a range wide enough to statistically hide
//! `secret`; the proof itself only needs `secret`, not `p` and `q` directly.

use num_bigint::BigUint;
use num_traits::One;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::group::Rng;

const CHALLENGE_BITS: usize = 128;
/// Slack added on top of `N`'s bit length when sampling the blinding factor,
/// so the response statistically hides `secret` regardless of the (unknown
/// to the verifier) order of `X` in `Z_N^*`.
const SLACK_BITS: usize = 256;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FactorizationStatement {
	pub n: BigUint,
	pub x: BigUint,
	pub y: BigUint,
}

pub struct FactorizationWitness {
	pub secret: BigUint,
	pub p: BigUint,
	pub q: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorizationProof {
	commitment: BigUint,
	response: BigUint,
}

fn challenge(statement: &FactorizationStatement, commitment: &BigUint) -> BigUint {
	let mut hasher = Sha256::new();
	hasher.update(statement.n.to_bytes_be());
	hasher.update(statement.x.to_bytes_be());
	hasher.update(statement.y.to_bytes_be());
	hasher.update(commitment.to_bytes_be());
	let digest = hasher.finalize();
	BigUint::from_bytes_be(&digest[..CHALLENGE_BITS / 8])
}

fn sample_blinding(n: &BigUint, rng: &mut Rng) -> BigUint {
	let bits = n.bits() as usize + SLACK_BITS;
	let mut bytes = vec![0u8; bits.div_ceil(8)];
	rng.fill_bytes(&mut bytes);
	BigUint::from_bytes_be(&bytes)
}

/// `witness.secret` must satisfy `statement.y == statement.x.modpow(secret,
/// n)`; the caller is responsible for having derived the statement that way
/// (e.g. during auxiliary-modulus setup for the homomorphic scheme).
pub fn prove(
	witness: &FactorizationWitness,
	statement: &FactorizationStatement,
	rng: &mut Rng,
) -> FactorizationProof {
	debug_assert_eq!(&witness.p * &witness.q, statement.n, "witness does not factor n");

	let blind = sample_blinding(&statement.n, rng);
	let commitment = statement.x.modpow(&blind, &statement.n);
	let e = challenge(statement, &commitment);
	let response = blind + &e * &witness.secret;

	FactorizationProof { commitment, response }
}

pub fn verify(statement: &FactorizationStatement, proof: &FactorizationProof) -> bool {
	if statement.n < BigUint::one() || statement.x >= statement.n || statement.y >= statement.n {
		return false
	}
	let e = challenge(statement, &proof.commitment);
	let lhs = statement.x.modpow(&proof.response, &statement.n);
	let rhs = &proof.commitment * statement.y.modpow(&e, &statement.n) % &statement.n;
	lhs == rhs
}

#[cfg(test)]
mod tests {
	use super::*;
	use num_traits::Zero;
	use rand::SeedableRng;

	/// Miller-Rabin primality test, deterministic witness base set is
	/// overkill for production but more than enough for test fixtures.
	fn is_probably_prime(n: &BigUint, rng: &mut Rng) -> bool {
		if *n < BigUint::from(3u32) {
			return *n == BigUint::from(2u32)
		}
		if (n % 2u32).is_zero() {
			return false
		}
		let one = BigUint::one();
		let n_minus_one = n - &one;
		let mut d = n_minus_one.clone();
		let mut r = 0u32;
		while (&d % 2u32).is_zero() {
			d /= 2u32;
			r += 1;
		}
		'witness: for _ in 0..40 {
			let a = sample_blinding(n, rng) % (n - BigUint::from(3u32)) + BigUint::from(2u32);
			let mut x = a.modpow(&d, n);
			if x == one || x == n_minus_one {
				continue
			}
			for _ in 0..r - 1 {
				x = x.modpow(&BigUint::from(2u32), n);
				if x == n_minus_one {
					continue 'witness
				}
			}
			return false
		}
		true
	}

	fn generate_prime(bits: u64, rng: &mut Rng) -> BigUint {
		loop {
			let mut bytes = vec![0u8; (bits as usize).div_ceil(8)];
			rng.fill_bytes(&mut bytes);
			bytes[0] |= 0x80;
			*bytes.last_mut().unwrap() |= 1;
			let candidate = BigUint::from_bytes_be(&bytes);
			if is_probably_prime(&candidate, rng) {
				return candidate
			}
		}
	}

	fn setup(rng: &mut Rng) -> (FactorizationStatement, FactorizationWitness) {
		let p = generate_prime(256, rng);
		let q = generate_prime(256, rng);
		let n = &p * &q;
		let secret = BigUint::from(777u64);
		let x = BigUint::from(5u64);
		let y = x.modpow(&secret, &n);
		(FactorizationStatement { n: n.clone(), x, y }, FactorizationWitness { secret, p, q })
	}

	#[test]
	fn honest_proof_verifies() {
		let mut rng = Rng::from_seed([60; 32]);
		let (statement, witness) = setup(&mut rng);
		let proof = prove(&witness, &statement, &mut rng);
		assert!(verify(&statement, &proof));
	}

	#[test]
	fn mutating_x_is_rejected() {
		let mut rng = Rng::from_seed([61; 32]);
		let (mut statement, witness) = setup(&mut rng);
		let proof = prove(&witness, &statement, &mut rng);
		statement.x += BigUint::one();
		assert!(!verify(&statement, &proof));
	}

	#[test]
	fn mutating_y_to_equal_n_is_rejected() {
		let mut rng = Rng::from_seed([62; 32]);
		let (mut statement, witness) = setup(&mut rng);
		let proof = prove(&witness, &statement, &mut rng);
		statement.y = statement.n.clone();
		assert!(!verify(&statement, &proof));
	}

	#[test]
	fn independent_honest_proofs_both_verify() {
		let mut rng = Rng::from_seed([63; 32]);
		let (statement, witness) = setup(&mut rng);
		let proof_a = prove(&witness, &statement, &mut rng);
		let proof_b = prove(&witness, &statement, &mut rng);
		assert!(verify(&statement, &proof_a));
		assert!(verify(&statement, &proof_b));
	}
}
