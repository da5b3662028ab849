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

//! DKG wire data (spec section 4.3), one variant per round, following the
//! teacher's `KeygenData` enum (`client/keygen/keygen_data.rs`). New
//! variants must only be appended (spec section 6.5).

use serde::{Deserialize, Serialize};

use crate::{
	group::ECPoint,
	homomorphic::HomomorphicScheme,
	share::BK,
	zkp::{
		commitment::{Commitment, Salt},
		schnorr::SchnorrProof,
	},
};

/// Round 1: hash commitment to `(bk, feldman_coeffs)`, plus the peer's
/// homomorphic public key (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "H::PublicKey: Serialize + for<'d> Deserialize<'d>")]
pub struct HashComm1<H: HomomorphicScheme> {
	pub comm: Commitment,
	pub he_pubkey: H::PublicKey,
}

/// Round 2: the decommitment (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Decommit2<P: ECPoint> {
	pub bk: BK<P::Scalar>,
	pub coeffs: Vec<P>,
	pub salt: Salt,
}

/// Round 3: this sender's share for one specific recipient (private,
/// unicast per recipient).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Shares3<P: ECPoint> {
	pub share: P::Scalar,
}

/// Round 4: proof of knowledge of the final share `s_i`, plus the witness
/// point `s_i . G` the proof is checked against (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Complete4<P: ECPoint> {
	pub si_g: P,
	pub proof: SchnorrProof<P>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "H::PublicKey: Serialize + for<'d> Deserialize<'d>")]
pub enum DkgData<P: ECPoint, H: HomomorphicScheme> {
	HashComm1(HashComm1<H>),
	#[serde(bound = "")]
	Decommit2(Decommit2<P>),
	#[serde(bound = "")]
	Shares3(Shares3<P>),
	#[serde(bound = "")]
	Complete4(Complete4<P>),
}

impl<P: ECPoint, H: HomomorphicScheme> DkgData<P, H> {
	/// The round index this variant belongs to (spec section 6.5's
	/// monotonically ordered message types).
	pub fn round(&self) -> u32 {
		match self {
			DkgData::HashComm1(_) => 0,
			DkgData::Decommit2(_) => 1,
			DkgData::Shares3(_) => 2,
			DkgData::Complete4(_) => 3,
		}
	}
}
