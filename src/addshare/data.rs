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

//! Add-share wire data (spec section 4.6), one variant per round, following
//! the same shape as [`crate::reshare::data`]. New variants must only be
//! appended (spec section 6.5). Unlike DKG/reshare, the four rounds are not
//! symmetric: round 0 is sent only by old peers, round 1 only by the new
//! peer, round 2 unicasts in both directions, and round 3 only by the new
//! peer again.

use serde::{Deserialize, Serialize};

use crate::{
	group::ECPoint,
	share::BK,
	zkp::schnorr::SchnorrProof,
};

/// Round 0 (`OldInfo`): an old peer's public key, its current `BK`, its
/// `siG`, and a proof of knowledge of the share behind it (broadcast by
/// every old peer, spec section 4.6 step 1).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct OldInfo0<P: ECPoint> {
	pub public_key: P,
	pub threshold: u32,
	pub bk: BK<P::Scalar>,
	pub si_g: P,
	pub proof: SchnorrProof<P>,
}

/// Round 1 (`NewBk`): the new peer's freshly chosen `BK`, broadcast once it
/// has verified the old quorum's public key (spec section 4.6 step 2).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct NewBk1<P: ECPoint> {
	pub bk: BK<P::Scalar>,
}

/// Round 2 (`Deltas`): one old peer's contribution to one recipient —
/// either another old peer's refreshed-share piece `delta_{i,j}`, or the
/// new peer's residual piece `delta_i` (spec section 4.6 step 3-4).
/// Unicast per recipient, accompanied by a proof binding the contribution
/// to the sender's existing `siG`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Deltas2<P: ECPoint> {
	pub share: P::Scalar,
	pub si_g: P,
	pub proof: SchnorrProof<P>,
}

/// Round 3 (`Proof`): the new peer's proof of knowledge of its final share
/// `s_new`, broadcast for the old quorum's final verification (spec
/// section 4.6 step 5).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Proof3<P: ECPoint> {
	pub si_g: P,
	pub proof: SchnorrProof<P>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum AddShareData<P: ECPoint> {
	OldInfo0(OldInfo0<P>),
	#[serde(bound = "")]
	NewBk1(NewBk1<P>),
	#[serde(bound = "")]
	Deltas2(Deltas2<P>),
	#[serde(bound = "")]
	Proof3(Proof3<P>),
}

impl<P: ECPoint> AddShareData<P> {
	/// The round index this variant belongs to (spec section 6.5's
	/// monotonically ordered message types).
	pub fn round(&self) -> u32 {
		match self {
			AddShareData::OldInfo0(_) => 0,
			AddShareData::NewBk1(_) => 1,
			AddShareData::Deltas2(_) => 2,
			AddShareData::Proof3(_) => 3,
		}
	}
}
