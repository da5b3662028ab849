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

//! Pedersen-style hash commitments: bind a payload with a fresh random salt,
//! reveal both later. Used by nearly every round of DKG and signing to stop
//! a party from choosing its own contribution after seeing everyone else's.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::group::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt(pub [u8; 32]);

fn digest(payload: &[u8], salt: &[u8; 32]) -> [u8; 32] {
	let mut hasher = Sha256::new();
	hasher.update(payload);
	hasher.update(salt);
	let mut out = [0u8; 32];
	out.copy_from_slice(&hasher.finalize());
	out
}

pub fn commit(payload: &[u8], rng: &mut Rng) -> (Commitment, Salt) {
	let mut salt = [0u8; 32];
	rng.fill_bytes(&mut salt);
	(Commitment(digest(payload, &salt)), Salt(salt))
}

pub fn open(commitment: &Commitment, payload: &[u8], salt: &Salt) -> bool {
	digest(payload, &salt.0) == commitment.0
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;

	#[test]
	fn honest_reveal_opens() {
		let mut rng = Rng::from_seed([40; 32]);
		let (commitment, salt) = commit(b"round-payload", &mut rng);
		assert!(open(&commitment, b"round-payload", &salt));
	}

	#[test]
	fn tampered_payload_fails_to_open() {
		let mut rng = Rng::from_seed([41; 32]);
		let (commitment, salt) = commit(b"round-payload", &mut rng);
		assert!(!open(&commitment, b"different-payload", &salt));
	}

	#[test]
	fn tampered_salt_fails_to_open() {
		let mut rng = Rng::from_seed([42; 32]);
		let (commitment, _salt) = commit(b"round-payload", &mut rng);
		assert!(!open(&commitment, b"round-payload", &Salt([0u8; 32])));
	}
}
