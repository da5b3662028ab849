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

//! Extending an existing quorum with a new participant while preserving
//! the public key (component A, spec section 4.6). Unlike DKG, signer and
//! reshare, the two sides of this ceremony play different roles: the
//! `threshold` old peers already hold shares and prove it; the new peer
//! starts from nothing and ends up with a share of its own. One
//! [`AddShareSession`] instance plays either role, selected by whether
//! [`crate::config::AddShareConfig::prior`] is present.
//!
//! Four rounds: old peers broadcast their current public commitments
//! (round 0); the new peer, once it has verified the old public key via
//! Birkhoff interpolation, broadcasts its freshly chosen `BK` (round 1);
//! every old peer secret-shares its `add-share-coefficient`-weighted share
//! among the old quorum and a residual to the new peer (round 2, unicast);
//! the new peer broadcasts a proof of knowledge of its assembled share for
//! the old quorum's final check (round 3).

pub mod data;
pub mod detail;

use std::collections::BTreeMap;

use crate::{
	ceremony::CeremonyError,
	config::{AddShareConfig, PriorKeyMaterial},
	group::{ECPoint, ECScalar, Rng},
	message::{Envelope, Mailbox, OutboundMessage, PeerId, SessionState, StateListener},
	share::{self, BK},
	zkp::schnorr,
};

pub use data::AddShareData;

/// Which round this session is currently collecting messages for. Rounds
/// 1 and 3 only ever have the new peer as sender, so only old-peer
/// sessions actually wait in `AwaitingNewBk1`/`AwaitingProof3` — the new
/// peer's own session settles both stages without anyone to wait for the
/// moment it has sent its own message (see `expected_for`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
	AwaitingOldInfo0,
	AwaitingNewBk1,
	AwaitingDeltas2,
	AwaitingProof3,
	Done,
	Failed,
}

/// Output of a successful add-share: the unchanged public key, this
/// party's (possibly refreshed) share, and the extended quorum's `siG`s
/// and `BK`s.
#[derive(Clone, Debug)]
pub struct AddShareResult<P: ECPoint> {
	pub public_key: P,
	pub own_share: P::Scalar,
	pub si_gs: BTreeMap<PeerId, P>,
	pub bks: BTreeMap<PeerId, BK<P::Scalar>>,
}

impl<P: ECPoint> From<AddShareResult<P>> for PriorKeyMaterial<P> {
	fn from(result: AddShareResult<P>) -> Self {
		PriorKeyMaterial { public_key: result.public_key, own_share: result.own_share, si_gs: result.si_gs }
	}
}

fn context(ceremony_id: u64, tag: &str) -> Vec<u8> {
	format!("addshare:{ceremony_id}:{tag}").into_bytes()
}

/// Picks `threshold - 1` old BKs plus the new BK: a valid size-`threshold`
/// quorum of the extended group, used to re-verify the public key (spec
/// section 4.6 step 5's "all peers re-verify Y via Birkhoff on the
/// extended quorum").
fn extended_verification_quorum<P: ECPoint>(
	old_bks: &BTreeMap<PeerId, BK<P::Scalar>>,
	new_bk: &BK<P::Scalar>,
	threshold: usize,
) -> Vec<BK<P::Scalar>> {
	let mut by_x: Vec<&BK<P::Scalar>> = old_bks.values().collect();
	by_x.sort_by(|a, b| a.x.cmp(&b.x));
	let mut quorum: Vec<BK<P::Scalar>> =
		by_x.into_iter().take(threshold.saturating_sub(1)).cloned().collect();
	quorum.push(new_bk.clone());
	quorum
}

/// The add-share session. Plays the old-peer role when `config.prior` is
/// `Some`, the new-peer role when it is `None`.
pub struct AddShareSession<P: ECPoint> {
	config: AddShareConfig<P>,
	others: Vec<PeerId>,
	old_peer_ids: Vec<PeerId>,
	rng: Rng,
	stage: Stage,
	mailbox: Mailbox<Envelope<AddShareData<P>>>,

	old_info: BTreeMap<PeerId, data::OldInfo0<P>>,
	new_bk: Option<BK<P::Scalar>>,
	own_kept_delta: Option<P::Scalar>,
	delta_contributions: BTreeMap<PeerId, P::Scalar>,

	final_share: P::Scalar,
	new_si_g: Option<P>,

	listener: Box<dyn StateListener>,
	state: SessionState,
}

impl<P: ECPoint> AddShareSession<P> {
	pub fn new(
		config: AddShareConfig<P>,
		mut rng: Rng,
		listener: Box<dyn StateListener>,
	) -> (Self, Vec<OutboundMessage>) {
		let others = config.other_peer_ids();
		let old_peer_ids = config.old_peer_ids();

		let mut old_info = BTreeMap::new();
		let mut outbound = Vec::new();

		if let Some(prior) = &config.prior {
			let own_bk = config.own_old_bk().cloned().expect("own BK must be present in config.old_bks");
			let si_g = P::from_scalar(&prior.own_share);
			let proof = schnorr::prove::<P>(&prior.own_share, &context(config.ceremony_id, "oldinfo0"), &mut rng);
			let msg = data::OldInfo0 {
				public_key: prior.public_key,
				threshold: config.threshold as u32,
				bk: own_bk,
				si_g,
				proof,
			};
			old_info.insert(config.own_peer_id.clone(), msg.clone());
			outbound.push(OutboundMessage {
				to: None,
				payload: bincode::serialize(&Envelope {
					ceremony_id: config.ceremony_id,
					round: 0,
					sender: config.own_peer_id.clone(),
					data: AddShareData::<P>::OldInfo0(msg),
				})
				.expect("serialization cannot fail"),
			});
		}

		let session = AddShareSession {
			config,
			others,
			old_peer_ids,
			rng,
			stage: Stage::AwaitingOldInfo0,
			mailbox: Mailbox::new(),
			old_info,
			new_bk: None,
			own_kept_delta: None,
			delta_contributions: BTreeMap::new(),
			final_share: P::Scalar::zero(),
			new_si_g: None,
			listener,
			state: SessionState::Init,
		};
		(session, outbound)
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	fn set_state(&mut self, new: SessionState) {
		if new != self.state {
			self.listener.on_state_changed(self.state, new);
			self.state = new;
		}
	}

	fn round_index(&self) -> u32 {
		match self.stage {
			Stage::AwaitingOldInfo0 => 0,
			Stage::AwaitingNewBk1 => 1,
			Stage::AwaitingDeltas2 => 2,
			Stage::AwaitingProof3 => 3,
			Stage::Done | Stage::Failed => u32::MAX,
		}
	}

	/// Who this session still needs a payload from, for the current stage.
	/// The new peer's own session never waits in `AwaitingNewBk1` or
	/// `AwaitingProof3` — it is the sole sender for both rounds, so its own
	/// copy of those stages is settled inline in `finish_round0` /
	/// `finish_round2`.
	fn expected_for(&self, stage: Stage) -> Vec<PeerId> {
		let is_new_peer = self.config.is_new_peer();
		match stage {
			Stage::AwaitingOldInfo0 =>
				self.old_peer_ids.iter().filter(|p| **p != self.config.own_peer_id).cloned().collect(),
			Stage::AwaitingNewBk1 =>
				if is_new_peer {
					vec![]
				} else {
					vec![self.config.new_peer_id.clone()]
				},
			Stage::AwaitingDeltas2 =>
				if is_new_peer {
					self.old_peer_ids.clone()
				} else {
					self.old_peer_ids.iter().filter(|p| **p != self.config.own_peer_id).cloned().collect()
				},
			Stage::AwaitingProof3 =>
				if is_new_peer {
					vec![]
				} else {
					vec![self.config.new_peer_id.clone()]
				},
			Stage::Done | Stage::Failed => vec![],
		}
	}

	/// Stop the session: moves any non-`Done` state to `Failed` (spec
	/// section 5's cancellation clause). Idempotent.
	pub fn stop(&mut self) {
		if self.state != SessionState::Done {
			self.stage = Stage::Failed;
			self.set_state(SessionState::Failed);
		}
	}

	fn fail(&mut self, err: CeremonyError) -> CeremonyError {
		err.log();
		self.stage = Stage::Failed;
		self.set_state(SessionState::Failed);
		err
	}

	/// Feeds one inbound envelope to the session. Returns any outbound
	/// messages the resulting round transition produced.
	pub fn handle_message(
		&mut self,
		envelope: Envelope<AddShareData<P>>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		if self.stage == Stage::Done || self.stage == Stage::Failed {
			return Ok(vec![])
		}
		self.set_state(SessionState::Working);

		if !self.others.contains(&envelope.sender) {
			return Err(self.fail(CeremonyError::PeerProtocol {
				peer: envelope.sender,
				reason: "message from unknown peer".into(),
			}))
		}
		let expected_round = envelope.data.round();
		let current = self.round_index();
		let sender = envelope.sender.clone();
		match self.mailbox.store(current, expected_round, sender.clone(), envelope) {
			Ok(_) => {},
			Err(e) =>
				return Err(self.fail(CeremonyError::PeerProtocol { peer: sender, reason: e.to_string() })),
		}

		let expected = self.expected_for(self.stage);
		let Some(ready) = self.mailbox.take_ready(current, &expected) else { return Ok(vec![]) };
		self.advance(ready)
	}

	fn advance(
		&mut self,
		ready: Vec<(PeerId, Envelope<AddShareData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		match self.stage {
			Stage::AwaitingOldInfo0 => self.finish_round0(ready),
			Stage::AwaitingNewBk1 => self.finish_round1(ready),
			Stage::AwaitingDeltas2 => self.finish_round2(ready),
			Stage::AwaitingProof3 => self.finish_round3(ready),
			Stage::Done | Stage::Failed => Ok(vec![]),
		}
	}

	fn finish_round0(
		&mut self,
		ready: Vec<(PeerId, Envelope<AddShareData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let AddShareData::OldInfo0(msg) = envelope.data else { unreachable!("mailbox routes by round") };
			if !schnorr::verify(&msg.si_g, &msg.proof, &context(self.config.ceremony_id, "oldinfo0")) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"proof of knowledge of siG failed to verify",
				)))
			}
			self.old_info.insert(peer, msg);
		}

		if self.old_info.len() != self.config.threshold {
			return Err(self.fail(CeremonyError::QuorumInconsistent(format!(
				"expected {} old peers, heard from {}",
				self.config.threshold,
				self.old_info.len()
			))))
		}

		let bks_only: BTreeMap<PeerId, BK<P::Scalar>> =
			self.old_info.iter().map(|(peer, msg)| (peer.clone(), msg.bk.clone())).collect();
		if let Err((a, b)) = detail::check_distinct_bks(&bks_only) {
			return Err(self.fail(CeremonyError::QuorumInconsistent(format!(
				"{a} and {b} declared colliding BKs"
			))))
		}

		let expected_pk = self.old_info.values().next().expect("length checked above").public_key;
		if self.old_info.values().any(|msg| msg.public_key != expected_pk) {
			return Err(self.fail(CeremonyError::QuorumInconsistent(
				"old peers disagree on the public key being extended".into(),
			)))
		}
		if self.old_info.values().any(|msg| msg.threshold as usize != self.config.threshold) {
			return Err(self.fail(CeremonyError::QuorumInconsistent(
				"old peers disagree on the threshold".into(),
			)))
		}

		let bks: Vec<BK<P::Scalar>> = self.old_info.values().map(|msg| msg.bk.clone()).collect();
		let si_gs: Vec<P> = self.old_info.values().map(|msg| msg.si_g).collect();
		match share::validate_public_key(&bks, &si_gs, self.config.threshold, &expected_pk) {
			Ok(true) => {},
			Ok(false) =>
				return Err(self.fail(CeremonyError::QuorumInconsistent(
					"old quorum's siGs do not reconstruct the claimed public key".into(),
				))),
			Err(e) => return Err(self.fail(e.into())),
		}

		if self.config.is_new_peer() {
			let existing_xs: Vec<P::Scalar> = bks.iter().map(|bk| bk.x.clone()).collect();
			let x = detail::choose_fresh_x::<P::Scalar>(&existing_xs, &mut self.rng);
			let bk = BK::new(x, self.config.new_rank);
			self.new_bk = Some(bk.clone());
			self.stage = Stage::AwaitingDeltas2;
			return Ok(vec![OutboundMessage {
				to: None,
				payload: bincode::serialize(&Envelope {
					ceremony_id: self.config.ceremony_id,
					round: 1,
					sender: self.config.own_peer_id.clone(),
					data: AddShareData::<P>::NewBk1(data::NewBk1 { bk }),
				})
				.expect("serialization cannot fail"),
			}])
		}

		self.stage = Stage::AwaitingNewBk1;
		Ok(vec![])
	}

	fn finish_round1(
		&mut self,
		ready: Vec<(PeerId, Envelope<AddShareData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		let (sender, envelope) = ready.into_iter().next().expect("exactly one expected sender");
		let AddShareData::NewBk1(msg) = envelope.data else { unreachable!() };
		self.new_bk = Some(msg.bk.clone());

		let own_bk = self.config.own_old_bk().cloned().expect("checked at construction");
		let own_share = self
			.config
			.prior
			.as_ref()
			.expect("old-peer role checked at construction")
			.own_share
			.clone();
		let existing_bks = self.config.old_bk_list();
		let lambda = share::add_share_coefficient(&existing_bks, &own_bk, &msg.bk, self.config.threshold)
			.map_err(|e| self.fail(e.into()))?;
		let weighted = lambda * own_share.clone();

		let other_old_peers: Vec<PeerId> =
			self.old_peer_ids.iter().filter(|p| **p != self.config.own_peer_id).cloned().collect();
		let (randoms, kept) =
			detail::split_with_residual::<P::Scalar>(&weighted, other_old_peers.len(), &mut self.rng);
		self.own_kept_delta = Some(kept.clone());
		let proof = schnorr::prove::<P>(&own_share, &context(self.config.ceremony_id, "deltas2"), &mut self.rng);
		let si_g = P::from_scalar(&own_share);

		let mut outbound = Vec::with_capacity(other_old_peers.len() + 1);
		for (peer, share_piece) in other_old_peers.iter().zip(randoms.into_iter()) {
			outbound.push(OutboundMessage {
				to: Some(peer.clone()),
				payload: bincode::serialize(&Envelope {
					ceremony_id: self.config.ceremony_id,
					round: 2,
					sender: self.config.own_peer_id.clone(),
					data: AddShareData::<P>::Deltas2(data::Deltas2 {
						share: share_piece,
						si_g,
						proof: proof.clone(),
					}),
				})
				.expect("serialization cannot fail"),
			});
		}
		// delta_i, the new peer's piece, is the same value kept as delta_{i,i}
		// (spec section 4.6 step 4).
		outbound.push(OutboundMessage {
			to: Some(self.config.new_peer_id.clone()),
			payload: bincode::serialize(&Envelope {
				ceremony_id: self.config.ceremony_id,
				round: 2,
				sender: self.config.own_peer_id.clone(),
				data: AddShareData::<P>::Deltas2(data::Deltas2 { share: kept, si_g, proof }),
			})
			.expect("serialization cannot fail"),
		});

		let _ = sender;
		self.stage = Stage::AwaitingDeltas2;
		Ok(outbound)
	}

	fn finish_round2(
		&mut self,
		ready: Vec<(PeerId, Envelope<AddShareData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let AddShareData::Deltas2(msg) = envelope.data else { unreachable!() };
			let claimed_si_g = self
				.old_info
				.get(&peer)
				.map(|info| info.si_g)
				.ok_or_else(|| CeremonyError::Internal("missing round-0 info for sender".into()))?;
			if msg.si_g != claimed_si_g {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"delta's siG does not match the sender's round-0 announcement",
				)))
			}
			if !schnorr::verify(&msg.si_g, &msg.proof, &context(self.config.ceremony_id, "deltas2")) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"proof accompanying delta share failed to verify",
				)))
			}
			self.delta_contributions.insert(peer, msg.share);
		}

		if self.config.is_new_peer() {
			let s_new: P::Scalar = self.delta_contributions.values().cloned().sum();
			self.final_share = s_new.clone();
			let si_g = P::from_scalar(&s_new);
			self.new_si_g = Some(si_g);

			let new_bk = self.new_bk.clone().expect("set in finish_round0");
			let quorum = extended_verification_quorum::<P>(&self.config.old_bks, &new_bk, self.config.threshold);
			let mut si_gs: Vec<P> = quorum
				.iter()
				.take(quorum.len() - 1)
				.map(|bk| {
					self.old_info
						.values()
						.find(|info| info.bk == *bk)
						.map(|info| info.si_g)
						.expect("quorum drawn from old_info")
				})
				.collect();
			si_gs.push(si_g);
			let expected_pk = self.old_info.values().next().expect("present").public_key;
			match share::validate_public_key(&quorum, &si_gs, self.config.threshold, &expected_pk) {
				Ok(true) => {},
				Ok(false) =>
					return Err(self.fail(CeremonyError::QuorumInconsistent(
						"new share does not extend the public key correctly".into(),
					))),
				Err(e) => return Err(self.fail(e.into())),
			}

			let proof = schnorr::prove::<P>(&s_new, &context(self.config.ceremony_id, "proof3"), &mut self.rng);
			self.stage = Stage::Done;
			self.set_state(SessionState::Done);
			return Ok(vec![OutboundMessage {
				to: None,
				payload: bincode::serialize(&Envelope {
					ceremony_id: self.config.ceremony_id,
					round: 3,
					sender: self.config.own_peer_id.clone(),
					data: AddShareData::<P>::Proof3(data::Proof3 { si_g, proof }),
				})
				.expect("serialization cannot fail"),
			}])
		}

		let kept = self.own_kept_delta.clone().expect("computed in finish_round1");
		let received: P::Scalar = self.delta_contributions.values().cloned().sum();
		self.final_share = kept + received;

		self.stage = Stage::AwaitingProof3;
		Ok(vec![])
	}

	fn finish_round3(
		&mut self,
		ready: Vec<(PeerId, Envelope<AddShareData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		let (peer, envelope) = ready.into_iter().next().expect("exactly one expected sender");
		let AddShareData::Proof3(msg) = envelope.data else { unreachable!() };
		if !schnorr::verify(&msg.si_g, &msg.proof, &context(self.config.ceremony_id, "proof3")) {
			return Err(self.fail(CeremonyError::crypto_verify_failure(
				Some(peer),
				"new peer's proof of knowledge of its final share failed to verify",
			)))
		}
		self.new_si_g = Some(msg.si_g);

		let new_bk = self.new_bk.clone().expect("set in finish_round1");
		let quorum = extended_verification_quorum::<P>(&self.config.old_bks, &new_bk, self.config.threshold);
		let mut si_gs: Vec<P> = quorum
			.iter()
			.take(quorum.len() - 1)
			.map(|bk| {
				self.old_info
					.values()
					.find(|info| info.bk == *bk)
					.map(|info| info.si_g)
					.expect("quorum drawn from old_info")
			})
			.collect();
		si_gs.push(msg.si_g);
		let expected_pk = self.old_info.values().next().expect("present").public_key;
		match share::validate_public_key(&quorum, &si_gs, self.config.threshold, &expected_pk) {
			Ok(true) => {},
			Ok(false) =>
				return Err(self.fail(CeremonyError::QuorumInconsistent(
					"extended quorum no longer reconstructs the original public key".into(),
				))),
			Err(e) => return Err(self.fail(e.into())),
		}

		self.stage = Stage::Done;
		self.set_state(SessionState::Done);
		Ok(vec![])
	}

	/// Returns the completed key material, or `NotReady` before `Done`.
	pub fn get_result(&self) -> Result<AddShareResult<P>, CeremonyError> {
		if self.stage != Stage::Done {
			return Err(CeremonyError::NotReady)
		}
		let expected_pk = self.old_info.values().next().expect("present once Done").public_key;
		let new_bk = self.new_bk.clone().expect("present once Done");

		let mut bks: BTreeMap<PeerId, BK<P::Scalar>> =
			self.old_info.iter().map(|(peer, info)| (peer.clone(), info.bk.clone())).collect();
		bks.insert(self.config.new_peer_id.clone(), new_bk);

		let mut si_gs: BTreeMap<PeerId, P> =
			self.old_info.iter().map(|(peer, info)| (peer.clone(), info.si_g)).collect();
		si_gs.insert(self.config.new_peer_id.clone(), self.new_si_g.expect("present once Done"));

		Ok(AddShareResult { public_key: expected_pk, own_share: self.final_share.clone(), si_gs, bks })
	}
}
