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

//! Paillier-backed [`HomomorphicScheme`], the reference implementation of
//! the opaque H interface. Built on `kzen-paillier` bridged through
//! `curv-kzen`'s `BigInt`, the same pairing used by fs-dkr for GG18/GG20
//! style MPC-ECDSA additions and resharing.

use curv::{arithmetic::Converter, BigInt};
use num_bigint::BigUint;
use num_traits::One;
use paillier::{
	Add, Decrypt, EncryptWithChosenRandomness, EncryptionKey, KeyGeneration, Mul,
	DecryptionKey as PaillierDecryptionKey, Paillier, RawCiphertext, RawPlaintext, Randomness,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::scheme::{HeError, HomomorphicScheme};
use crate::group::Rng;

/// Challenge space for the plaintext-knowledge sigma protocol below: small
/// enough that `s_m = m' + e*m` doesn't overflow the statistical slack, large
/// enough that a cheating prover succeeds with only negligible probability.
const CHALLENGE_BITS: usize = 128;

fn hash_to_challenge(n: &BigUint, ciphertext: &BigUint, commitment: &BigUint) -> BigUint {
	let mut hasher = Sha256::new();
	hasher.update(n.to_bytes_be());
	hasher.update(ciphertext.to_bytes_be());
	hasher.update(commitment.to_bytes_be());
	let digest = hasher.finalize();
	BigUint::from_bytes_be(&digest[..CHALLENGE_BITS / 8])
}

fn sample_biguint_below(bound: &BigUint, rng: &mut Rng) -> BigUint {
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

/// Proof of knowledge of a Paillier plaintext and its encryption randomness
/// (spec section 6.4's `VerifyEnc`), following the standard sigma protocol
/// for `c = g^m . r^N mod N^2` (Damgard-Jurik style, as used by fs-dkr and
/// tofn for their own ciphertext-well-formed checks).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaintextKnowledgeProof {
	commitment: BigUint,
	s_plaintext: BigUint,
	s_randomness: BigUint,
}

fn to_curv(n: &BigUint) -> BigInt {
	BigInt::from_bytes(&n.to_bytes_be())
}

fn from_curv(n: &BigInt) -> BigUint {
	BigUint::from_bytes_be(&n.to_bytes())
}

fn sample_randomness(n: &BigInt, rng: &mut Rng) -> BigInt {
	// Uniform sample in [1, N), used as the Paillier encryption randomness.
	let n_bits = from_curv(n).bits().max(1) as usize;
	loop {
		let mut bytes = vec![0u8; n_bits.div_ceil(8)];
		rng.fill_bytes(&mut bytes);
		let candidate = BigUint::from_bytes_be(&bytes);
		if candidate > BigUint::from(0u32) && candidate < from_curv(n) {
			return to_curv(&candidate)
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaillierPublicKey(EncryptionKey);

#[derive(Clone)]
pub struct PaillierSecretKey(PaillierDecryptionKey);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaillierCiphertext(BigInt);

/// Reference Paillier implementation of the [`HomomorphicScheme`] interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaillierScheme;

impl HomomorphicScheme for PaillierScheme {
	type PublicKey = PaillierPublicKey;
	type SecretKey = PaillierSecretKey;
	type Ciphertext = PaillierCiphertext;

	fn keygen(_rng: &mut Rng) -> (Self::PublicKey, Self::SecretKey) {
		let keypair = Paillier::keypair();
		let (ek, dk) = keypair.keys();
		(PaillierPublicKey(ek), PaillierSecretKey(dk))
	}

	fn message_range(pk: &Self::PublicKey) -> BigUint {
		// Paillier's plaintext space is Z_N; N is always large enough
		// (>2048 bits) to dwarf q^3 for any curve this crate supports.
		from_curv(&pk.0.n)
	}

	fn encrypt(
		pk: &Self::PublicKey,
		plaintext: &BigUint,
		rng: &mut Rng,
	) -> (Self::Ciphertext, BigUint) {
		let randomness = sample_randomness(&pk.0.n, rng);
		let ciphertext = Paillier::encrypt_with_chosen_randomness(
			&pk.0,
			RawPlaintext::from(to_curv(plaintext)),
			&Randomness(randomness.clone()),
		);
		(PaillierCiphertext(ciphertext.0.into_owned()), from_curv(&randomness))
	}

	fn add(pk: &Self::PublicKey, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Self::Ciphertext {
		let sum = Paillier::add(
			&pk.0,
			RawCiphertext::from(a.0.clone()),
			RawCiphertext::from(b.0.clone()),
		);
		PaillierCiphertext(sum.0.into_owned())
	}

	fn mul_const(pk: &Self::PublicKey, c: &Self::Ciphertext, k: &BigUint) -> Self::Ciphertext {
		let scaled = Paillier::mul(
			&pk.0,
			RawCiphertext::from(c.0.clone()),
			RawPlaintext::from(to_curv(k)),
		);
		PaillierCiphertext(scaled.0.into_owned())
	}

	fn decrypt(
		_pk: &Self::PublicKey,
		sk: &Self::SecretKey,
		c: &Self::Ciphertext,
	) -> Result<BigUint, HeError> {
		let plaintext: RawPlaintext = Paillier::decrypt(&sk.0, RawCiphertext::from(c.0.clone()));
		Ok(from_curv(&plaintext.0.into_owned()))
	}

	type CiphertextProof = PlaintextKnowledgeProof;

	fn prove_well_formed(
		pk: &Self::PublicKey,
		plaintext: &BigUint,
		randomness: &BigUint,
		ciphertext: &Self::Ciphertext,
		rng: &mut Rng,
	) -> Self::CiphertextProof {
		let n = pk.n();
		let nn = &n * &n;
		let g = &n + BigUint::one();
		let c = from_curv(&ciphertext.0);

		// m' is drawn from a range wide enough that s_plaintext statistically
		// hides the real plaintext even once the challenge is folded in.
		let slack_bound = &n << CHALLENGE_BITS;
		let m_blind = sample_biguint_below(&slack_bound, rng);
		let r_blind = sample_biguint_below(&n, rng);

		let commitment = g.modpow(&m_blind, &nn) * r_blind.modpow(&n, &nn) % &nn;
		let e = hash_to_challenge(&n, &c, &commitment);

		let s_plaintext = m_blind + &e * plaintext;
		let s_randomness = r_blind * randomness.modpow(&e, &n) % &n;

		PlaintextKnowledgeProof { commitment, s_plaintext, s_randomness }
	}

	fn verify_well_formed(
		pk: &Self::PublicKey,
		ciphertext: &Self::Ciphertext,
		proof: &Self::CiphertextProof,
	) -> bool {
		let n = pk.n();
		let nn = &n * &n;
		let g = &n + BigUint::one();
		let c = from_curv(&ciphertext.0);

		let e = hash_to_challenge(&n, &c, &proof.commitment);

		// A cheating prover would need `s_plaintext` far outside the slack
		// range to smuggle in an out-of-range plaintext; this bound is this
		// scheme's stand-in for a full interval range proof.
		if proof.s_plaintext >= (&n << (CHALLENGE_BITS + 1)) {
			return false
		}

		let lhs = g.modpow(&proof.s_plaintext, &nn) * proof.s_randomness.modpow(&n, &nn) % &nn;
		let rhs = &proof.commitment * c.modpow(&e, &nn) % &nn;
		lhs == rhs
	}
}

impl PaillierPublicKey {
	pub fn n(&self) -> BigUint {
		from_curv(&self.0.n)
	}
}

impl PaillierCiphertext {
	pub fn as_biguint(&self) -> BigUint {
		from_curv(&self.0)
	}
}
