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

//! Reshare wire data (spec section 4.5), one variant per round, following
//! the same shape as [`crate::dkg::data`]. New variants must only be
//! appended (spec section 6.5).

use serde::{Deserialize, Serialize};

use crate::{
	group::ECPoint,
	share::BK,
	zkp::{commitment::Salt, schnorr::SchnorrProof},
};

/// Round 0 (`HashComm`): a hash commitment to this peer's zero-sharing
/// polynomial, plus an echo of the quorum's BK assignment as this peer
/// sees it (spec section 13's broadcast-consistency check).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HashComm1 {
	pub comm: crate::zkp::commitment::Commitment,
	pub quorum_echo: Vec<u8>,
}

/// Round 1 (`Decommit`): the peer's `BK` and Feldman coefficients for its
/// zero-sharing polynomial. `coeffs[0]` must be the point at infinity
/// (spec section 4.5's zero constant term).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Decommit2<P: ECPoint> {
	pub bk: BK<P::Scalar>,
	pub coeffs: Vec<P>,
	pub salt: Salt,
}

/// Round 2 (`Shares`): this peer's zero-share sent privately to one
/// recipient (unicast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Shares3<P: ECPoint> {
	pub share: P::Scalar,
}

/// Round 3 (`Complete`): proof of knowledge of the refreshed share,
/// confirming it still sits behind the peer's original `siG` (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Complete4<P: ECPoint> {
	pub si_g: P,
	pub proof: SchnorrProof<P>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ReshareData<P: ECPoint> {
	HashComm1(HashComm1),
	#[serde(bound = "")]
	Decommit2(Decommit2<P>),
	#[serde(bound = "")]
	Shares3(Shares3<P>),
	#[serde(bound = "")]
	Complete4(Complete4<P>),
}

impl<P: ECPoint> ReshareData<P> {
	/// The round index this variant belongs to (spec section 6.5's
	/// monotonically ordered message types).
	pub fn round(&self) -> u32 {
		match self {
			ReshareData::HashComm1(_) => 0,
			ReshareData::Decommit2(_) => 1,
			ReshareData::Shares3(_) => 2,
			ReshareData::Complete4(_) => 3,
		}
	}
}
