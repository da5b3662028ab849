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

//! Session configuration (ambient, spec section 11.3): the construction-time
//! object an application builds and hands to a session, per spec section
//! 2's "application constructs a session with (peer-manager, curve,
//! threshold, rank, prior-result)". A plain data struct passed by value,
//! following the teacher's `ThresholdParameters`/`CeremonyCommon`
//! (`client/common/ceremony_stage.rs`) rather than any global mutable
//! engine state (spec section 9's "Global engines ... as singletons"
//! redesign flag).

use std::collections::BTreeMap;

use crate::{group::ECPoint, message::PeerId, share::BK};

/// Key material carried over from a prior ceremony (DKG, reshare, or
/// add-share), needed to start a Signer, Reshare, or AddShare session.
#[derive(Clone, Debug)]
pub struct PriorKeyMaterial<P: ECPoint> {
	pub public_key: P,
	pub own_share: P::Scalar,
	/// `siG` for every peer in the prior quorum, needed to re-verify the
	/// public key via `validate_public_key` before trusting the share set.
	pub si_gs: BTreeMap<PeerId, P>,
}

/// Construction-time configuration for a DKG, Signer, Reshare, or AddShare
/// session (spec section 3's "Session" entity).
#[derive(Clone, Debug)]
pub struct SessionConfig<P: ECPoint> {
	pub ceremony_id: u64,
	/// The threshold `t`: the exact size of a valid quorum.
	pub threshold: usize,
	/// This party's own peer id, as returned by `PeerManager::self_id`.
	pub own_peer_id: PeerId,
	/// The Birkhoff parameter of every participant in this ceremony,
	/// keyed by peer id.
	pub bks: BTreeMap<PeerId, BK<P::Scalar>>,
	/// Present for Signer, Reshare, and AddShare; absent for DKG.
	pub prior: Option<PriorKeyMaterial<P>>,
}

impl<P: ECPoint> SessionConfig<P> {
	pub fn own_bk(&self) -> Option<&BK<P::Scalar>> {
		self.bks.get(&self.own_peer_id)
	}

	pub fn peer_ids(&self) -> Vec<PeerId> {
		self.bks.keys().cloned().collect()
	}

	pub fn bk_list(&self) -> Vec<BK<P::Scalar>> {
		self.bks.values().cloned().collect()
	}

	/// Peers other than ourselves, in a stable order.
	pub fn other_peer_ids(&self) -> Vec<PeerId> {
		self.bks.keys().filter(|id| **id != self.own_peer_id).cloned().collect()
	}
}

/// Construction-time configuration for an AddShare session (component A,
/// spec section 4.6). Unlike [`SessionConfig`], the participants are not
/// symmetric: an existing quorum of `threshold` old peers extends itself
/// with exactly one new peer, so the two sides of the ceremony are
/// configured differently. `prior` distinguishes the role: `Some` for an
/// old peer (its existing share and the quorum's `siG`s), `None` for the
/// new peer (it starts with no key material at all).
#[derive(Clone, Debug)]
pub struct AddShareConfig<P: ECPoint> {
	pub ceremony_id: u64,
	/// The size of the *old* quorum (the threshold the group was created
	/// with); also the number of BKs in `old_bks`.
	pub threshold: usize,
	pub own_peer_id: PeerId,
	/// The Birkhoff parameter of every member of the old quorum.
	pub old_bks: BTreeMap<PeerId, BK<P::Scalar>>,
	pub new_peer_id: PeerId,
	/// The rank the new participant is being added at. Its `x` is chosen
	/// freshly by the new peer itself, after it has verified the old
	/// quorum's public key (spec section 4.6 step 2).
	pub new_rank: u32,
	pub prior: Option<PriorKeyMaterial<P>>,
}

impl<P: ECPoint> AddShareConfig<P> {
	pub fn is_new_peer(&self) -> bool {
		self.prior.is_none()
	}

	pub fn old_peer_ids(&self) -> Vec<PeerId> {
		self.old_bks.keys().cloned().collect()
	}

	pub fn old_bk_list(&self) -> Vec<BK<P::Scalar>> {
		self.old_bks.values().cloned().collect()
	}

	pub fn own_old_bk(&self) -> Option<&BK<P::Scalar>> {
		self.old_bks.get(&self.own_peer_id)
	}

	/// Every other participant: the old peers (minus ourselves, if we are
	/// one) plus the new peer.
	pub fn other_peer_ids(&self) -> Vec<PeerId> {
		let mut ids: Vec<PeerId> = self.old_bks.keys().cloned().collect();
		if !ids.contains(&self.new_peer_id) {
			ids.push(self.new_peer_id.clone());
		}
		ids.retain(|id| *id != self.own_peer_id);
		ids
	}
}
