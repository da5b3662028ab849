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

//! Signature output and recovery helpers (spec sections 6.6, 10): the
//! `(R, s)` pair a Signer session produces, standard ECDSA verification
//! against a public key and hashed message, and Ethereum-style recovery-id
//! encoding with low-s normalization. Grounded on the teacher's
//! `CryptoScheme::verify_signature` shape (`crypto.rs`), generalized from
//! Schnorr to ECDSA.

use serde::{Deserialize, Serialize};

use crate::group::{ECPoint, ECScalar};

/// An ECDSA signature: the full nonce-commitment point `R` (so a recovery
/// id can be derived) plus the scalar `s`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Signature<P: ECPoint> {
	pub r_point: P,
	pub s: P::Scalar,
}

impl<P: ECPoint> Signature<P> {
	/// `r := R.x mod q` (spec section 4.4's numeric/ordering notes).
	pub fn r(&self) -> P::Scalar {
		self.r_point.x_scalar_mod_q()
	}

	/// Standard ECDSA verification: `u1 = m * s^-1`, `u2 = r * s^-1`,
	/// accept iff `(u1.G + u2.Y).x mod q == r` (P2/P3/P4/P7).
	pub fn verify(&self, public_key: &P, msg_hash: &P::Scalar) -> bool {
		let r = self.r();
		if r == P::Scalar::zero() || self.s == P::Scalar::zero() {
			return false
		}
		let Some(s_inv) = self.s.clone().invert() else { return false };
		let u1 = msg_hash.clone() * &s_inv;
		let u2 = r.clone() * &s_inv;
		let candidate = P::from_scalar(&u1) + *public_key * &u2;
		candidate.x_scalar_mod_q() == r
	}

	/// Low-s normalization (spec section 6.6, P7): if `s > q/2`, replace it
	/// with `q - s` and flip the recovery bit's parity.
	fn normalized(&self) -> (P::Scalar, bool) {
		let q = P::Scalar::curve_order();
		let half_q = &q >> 1;
		let s_int = self.s.to_bigint();
		if s_int > half_q {
			(P::Scalar::from_bigint(&(q - s_int)), true)
		} else {
			(self.s.clone(), false)
		}
	}

	/// Ethereum recovery form (spec section 6.6): `[R.x (32) || s (32) || v
	/// (1)]`, `v` the parity of `R.y` XOR'd with the low-s flip.
	pub fn to_eth_bytes(&self) -> [u8; 65] {
		let (s, flipped) = self.normalized();
		let mut out = [0u8; 65];
		out[0..32].copy_from_slice(&self.r_point.x_bytes());
		out[32..64].copy_from_slice(&s.to_bytes());
		let parity_even = self.r_point.is_even_y();
		// v=0 for even R.y, v=1 for odd; flipped by the low-s normalization.
		out[64] = (!parity_even ^ flipped) as u8;
		out
	}
}

/// Recovers the public key from an Ethereum-form signature (spec section
/// 6.6/10, P7): the inverse of [`Signature::to_eth_bytes`]. `v` is the
/// recovery bit as encoded by `to_eth_bytes` (even/odd parity of whichever
/// `R` the low-s-normalized `s` belongs to; see that method's doc comment).
///
/// `Q = r^-1 . (s.R - m.G)`, the standard ECDSA recovery formula, with `R`
/// reconstructed from `r` as an x-coordinate and `v` as its y-parity.
/// Returns `None` if `r`/`s` are out of range or `r` is not the x-coordinate
/// of any curve point.
pub fn recover<P: ECPoint>(
	r: &[u8; 32],
	s: &[u8; 32],
	v: u8,
	msg_hash: &P::Scalar,
) -> Option<P> {
	let r_scalar = P::Scalar::from_bytes_mod_order(r);
	if r_scalar == P::Scalar::zero() {
		return None
	}
	let s_scalar = P::Scalar::from_bytes_mod_order(s);
	if s_scalar == P::Scalar::zero() {
		return None
	}
	let r_inv = r_scalar.invert()?;

	// v=0 encodes an even-parity `R`; see `to_eth_bytes`.
	let is_even_y = v == 0;
	let r_point = P::from_x_and_parity(r, is_even_y)?;

	let candidate = (r_point * &s_scalar - P::from_scalar(msg_hash)) * &r_inv;
	Some(candidate)
}
