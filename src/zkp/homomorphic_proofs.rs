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

//! The MtA "curve-point consistency" proof (spec section 4.2's
//! `GetProofWithCheck`/`VerifyProofWithCheck` adjunct): proves that a
//! Paillier ciphertext encrypts the same value committed to by a curve
//! point, e.g. binding a party's encrypted nonce `k_i` to the `K_i = k_i *
//! G` it published earlier. This crosses the H/G boundary, so unlike the
//! rest of the ZK library it is specific to the concrete Paillier scheme
//! rather than generic over [`crate::homomorphic::HomomorphicScheme`].

use num_bigint::BigUint;
use num_traits::One;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
	group::{ECPoint, ECScalar, Rng},
	homomorphic::{PaillierCiphertext, PaillierPublicKey},
};

const CHALLENGE_BITS: usize = 128;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MtaConsistencyProof<P: ECPoint> {
	cipher_commitment: BigUint,
	point_commitment: P,
	s_plaintext: BigUint,
	s_randomness: BigUint,
}

fn challenge<P: ECPoint>(
	n: &BigUint,
	ciphertext: &BigUint,
	cipher_commitment: &BigUint,
	point_commitment: &P,
) -> BigUint {
	let mut hasher = Sha256::new();
	hasher.update(n.to_bytes_be());
	hasher.update(ciphertext.to_bytes_be());
	hasher.update(cipher_commitment.to_bytes_be());
	hasher.update(point_commitment.as_bytes());
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

/// `plaintext` is `value.to_bigint()`; the caller supplies both so the
/// proof doesn't need to reduce between the curve's scalar field and the
/// Paillier plaintext ring itself.
pub fn prove<P: ECPoint>(
	pk: &PaillierPublicKey,
	value: &P::Scalar,
	randomness: &BigUint,
	ciphertext: &PaillierCiphertext,
	rng: &mut Rng,
) -> MtaConsistencyProof<P> {
	let n = pk.n();
	let nn = &n * &n;
	let g = &n + BigUint::one();
	let c = ciphertext.as_biguint();
	let plaintext = value.to_bigint();

	let slack_bound = &n << CHALLENGE_BITS;
	let m_blind = sample_biguint_below(&slack_bound, rng);
	let r_blind = sample_biguint_below(&n, rng);

	let cipher_commitment = g.modpow(&m_blind, &nn) * r_blind.modpow(&n, &nn) % &nn;
	let blind_scalar = P::Scalar::from_bigint(&(&m_blind % P::Scalar::curve_order()));
	let point_commitment = P::from_scalar(&blind_scalar);

	let e = challenge(&n, &c, &cipher_commitment, &point_commitment);

	let s_plaintext = m_blind + &e * &plaintext;
	let s_randomness = r_blind * randomness.modpow(&e, &n) % &n;

	MtaConsistencyProof { cipher_commitment, point_commitment, s_plaintext, s_randomness }
}

pub fn verify<P: ECPoint>(
	pk: &PaillierPublicKey,
	ciphertext: &PaillierCiphertext,
	point: &P,
	proof: &MtaConsistencyProof<P>,
) -> bool {
	let n = pk.n();
	let nn = &n * &n;
	let g = &n + BigUint::one();
	let c = ciphertext.as_biguint();

	let e = challenge(&n, &c, &proof.cipher_commitment, &proof.point_commitment);

	if proof.s_plaintext >= (&n << (CHALLENGE_BITS + 1)) {
		return false
	}

	let lhs = g.modpow(&proof.s_plaintext, &nn) * proof.s_randomness.modpow(&n, &nn) % &nn;
	let rhs = &proof.cipher_commitment * c.modpow(&e, &nn) % &nn;
	if lhs != rhs {
		return false
	}

	let s_mod_q = &proof.s_plaintext % P::Scalar::curve_order();
	let s_scalar = P::Scalar::from_bigint(&s_mod_q);
	let e_scalar = P::Scalar::from_bigint(&e);

	P::from_scalar(&s_scalar) == proof.point_commitment + *point * e_scalar
}
