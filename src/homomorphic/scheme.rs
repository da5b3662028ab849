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

use num_bigint::BigUint;
use thiserror::Error;

use crate::group::Rng;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeError {
	#[error("ciphertext is not well-formed")]
	CipherMalformed,
	#[error("decryption failed")]
	DecryptFailure,
	#[error("zero-knowledge proof is invalid")]
	ProofInvalid,
	#[error("plaintext is out of the scheme's message range")]
	OutOfRange,
}

/// The opaque additively-homomorphic encryption interface consumed by the
/// MtA engine (spec section 6.4). The core never reasons about the concrete
/// cryptosystem; everything downstream programs against this trait.
pub trait HomomorphicScheme: Clone + Send + Sync + 'static {
	type PublicKey: Clone + std::fmt::Debug + serde::Serialize + for<'de> serde::Deserialize<'de> + Send + Sync;
	type SecretKey: Clone + Send + Sync;
	type Ciphertext: Clone + std::fmt::Debug + PartialEq + serde::Serialize + for<'de> serde::Deserialize<'de> + Send + Sync;

	/// Generates a fresh keypair. Session-scoped: owned by the session that
	/// created it, per the concurrency model's "shared resources" clause.
	fn keygen(rng: &mut Rng) -> (Self::PublicKey, Self::SecretKey);

	/// The largest plaintext this scheme will accept, which must be at
	/// least `q^3` for MtA to be statistically hiding (spec section 6.4).
	fn message_range(pk: &Self::PublicKey) -> BigUint;

	/// Encrypts `plaintext`, returning the ciphertext and the randomness
	/// used (needed by some zero-knowledge proofs over the ciphertext).
	fn encrypt(pk: &Self::PublicKey, plaintext: &BigUint, rng: &mut Rng) -> (Self::Ciphertext, BigUint);

	fn add(pk: &Self::PublicKey, a: &Self::Ciphertext, b: &Self::Ciphertext) -> Self::Ciphertext;

	fn mul_const(pk: &Self::PublicKey, c: &Self::Ciphertext, k: &BigUint) -> Self::Ciphertext;

	fn decrypt(pk: &Self::PublicKey, sk: &Self::SecretKey, c: &Self::Ciphertext) -> Result<BigUint, HeError>;

	type CiphertextProof: Clone + std::fmt::Debug + serde::Serialize + for<'de> serde::Deserialize<'de> + Send + Sync;

	/// Proves that `ciphertext` encrypts `plaintext` under `randomness`,
	/// without revealing either (spec section 6.4's `VerifyEnc`).
	fn prove_well_formed(
		pk: &Self::PublicKey,
		plaintext: &BigUint,
		randomness: &BigUint,
		ciphertext: &Self::Ciphertext,
		rng: &mut Rng,
	) -> Self::CiphertextProof;

	fn verify_well_formed(
		pk: &Self::PublicKey,
		ciphertext: &Self::Ciphertext,
		proof: &Self::CiphertextProof,
	) -> bool;
}
