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

//! Distributed key generation (component D, spec section 4.3): Feldman VSS
//! plus commit/decommit plus a Schnorr proof of share. Four message rounds,
//! driven by a tagged-enum stage machine (spec section 9's redesign note)
//! rather than the teacher's `dyn CeremonyStage` trait-object dispatch.

pub mod data;
pub mod detail;

use std::collections::BTreeMap;

use crate::{
	ceremony::CeremonyError,
	config::{PriorKeyMaterial, SessionConfig},
	group::{ECPoint, ECScalar, Rng},
	homomorphic::HomomorphicScheme,
	message::{Envelope, Mailbox, OutboundMessage, PeerId, SessionState, StateListener},
	share::{self, Polynomial, BK},
	zkp::{commitment, schnorr},
};

pub use data::DkgData;

/// Which round this session is currently collecting messages for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
	AwaitingHashComm1,
	AwaitingDecommit2,
	AwaitingShares3,
	AwaitingComplete4,
	Done,
	Failed,
}

/// Output of a successful DKG (spec section 4.3 step 4-5): this party's
/// final share, the group public key, and every party's `siG` (needed to
/// re-verify the public key later via `validate_public_key`).
#[derive(Clone, Debug)]
pub struct DkgResult<P: ECPoint> {
	pub public_key: P,
	pub own_share: P::Scalar,
	pub si_gs: BTreeMap<PeerId, P>,
	pub bks: BTreeMap<PeerId, BK<P::Scalar>>,
}

impl<P: ECPoint> From<DkgResult<P>> for PriorKeyMaterial<P> {
	fn from(result: DkgResult<P>) -> Self {
		PriorKeyMaterial {
			public_key: result.public_key,
			own_share: result.own_share,
			si_gs: result.si_gs,
		}
	}
}

fn context(ceremony_id: u64, tag: &str) -> Vec<u8> {
	format!("dkg:{ceremony_id}:{tag}").into_bytes()
}

/// The DKG session. Generic over the curve `P` and the homomorphic scheme
/// `H` used only to publish a keypair peers can reuse for a subsequent
/// Signer session (spec section 4.3 round 1).
pub struct DkgSession<P: ECPoint, H: HomomorphicScheme> {
	config: SessionConfig<P>,
	others: Vec<PeerId>,
	rng: Rng,
	stage: Stage,
	mailbox: Mailbox<Envelope<DkgData<P, H>>>,

	own_poly: Polynomial<P::Scalar>,
	own_he_keys: (H::PublicKey, H::SecretKey),
	own_salt: commitment::Salt,

	comms: BTreeMap<PeerId, (commitment::Commitment, H::PublicKey)>,
	decommits: BTreeMap<PeerId, (BK<P::Scalar>, Vec<P>)>,
	shares: BTreeMap<PeerId, P::Scalar>,
	si_gs: BTreeMap<PeerId, P>,

	listener: Box<dyn StateListener>,
	state: SessionState,
}

impl<P: ECPoint, H: HomomorphicScheme> DkgSession<P, H> {
	pub fn new(
		config: SessionConfig<P>,
		mut rng: Rng,
		listener: Box<dyn StateListener>,
	) -> (Self, Vec<OutboundMessage>) {
		let own_bk = config.own_bk().cloned().expect("own BK must be present in config.bks");
		let own_poly =
			Polynomial::random_with_constant_term(config.threshold, P::Scalar::random(&mut rng), &mut rng);
		let own_he_keys = H::keygen(&mut rng);
		let coeffs: Vec<P> = own_poly.commit();
		let payload = detail::commitment_payload(&own_bk, &coeffs);
		let (comm, salt) = commitment::commit(&payload, &mut rng);

		let mut comms = BTreeMap::new();
		comms.insert(config.own_peer_id.clone(), (comm.clone(), own_he_keys.0.clone()));

		let others = config.other_peer_ids();
		let outbound = vec![OutboundMessage {
			to: None,
			payload: bincode::serialize(&Envelope {
				ceremony_id: config.ceremony_id,
				round: 0,
				sender: config.own_peer_id.clone(),
				data: DkgData::<P, H>::HashComm1(data::HashComm1 { comm, he_pubkey: own_he_keys.0.clone() }),
			})
			.expect("serialization cannot fail"),
		}];

		let session = DkgSession {
			config,
			others,
			rng,
			stage: Stage::AwaitingHashComm1,
			mailbox: Mailbox::new(),
			own_poly,
			own_he_keys,
			own_salt: salt,
			comms,
			decommits: BTreeMap::new(),
			shares: BTreeMap::new(),
			si_gs: BTreeMap::new(),
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
			Stage::AwaitingHashComm1 => 0,
			Stage::AwaitingDecommit2 => 1,
			Stage::AwaitingShares3 => 2,
			Stage::AwaitingComplete4 => 3,
			Stage::Done | Stage::Failed => u32::MAX,
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
		envelope: Envelope<DkgData<P, H>>,
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

		let Some(ready) = self.mailbox.take_ready(current, &self.others) else { return Ok(vec![]) };
		self.advance(ready)
	}

	fn advance(
		&mut self,
		ready: Vec<(PeerId, Envelope<DkgData<P, H>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		match self.stage {
			Stage::AwaitingHashComm1 => self.finish_round1(ready),
			Stage::AwaitingDecommit2 => self.finish_round2(ready),
			Stage::AwaitingShares3 => self.finish_round3(ready),
			Stage::AwaitingComplete4 => self.finish_round4(ready),
			Stage::Done | Stage::Failed => Ok(vec![]),
		}
	}

	fn finish_round1(
		&mut self,
		ready: Vec<(PeerId, Envelope<DkgData<P, H>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let DkgData::HashComm1(msg) = envelope.data else { unreachable!("mailbox routes by round") };
			self.comms.insert(peer, (msg.comm, msg.he_pubkey));
		}

		let own_bk = self.config.own_bk().cloned().expect("checked at construction");
		let coeffs = self.own_poly.commit::<P>();
		let envelope = Envelope {
			ceremony_id: self.config.ceremony_id,
			round: 1,
			sender: self.config.own_peer_id.clone(),
			data: DkgData::<P, H>::Decommit2(data::Decommit2 { bk: own_bk.clone(), coeffs: coeffs.clone(), salt: self.own_salt }),
		};
		self.decommits.insert(self.config.own_peer_id.clone(), (own_bk, coeffs));
		self.stage = Stage::AwaitingDecommit2;
		Ok(vec![OutboundMessage {
			to: None,
			payload: bincode::serialize(&envelope).expect("serialization cannot fail"),
		}])
	}

	fn finish_round2(
		&mut self,
		ready: Vec<(PeerId, Envelope<DkgData<P, H>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let DkgData::Decommit2(msg) = envelope.data else { unreachable!() };
			let (comm, _he_pubkey) =
				self.comms.get(&peer).cloned().ok_or_else(|| CeremonyError::Internal("missing commitment".into()))?;
			let payload = detail::commitment_payload(&msg.bk, &msg.coeffs);
			if !commitment::open(&comm, &payload, &msg.salt) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"decommitment does not match round-1 commitment",
				)))
			}
			if msg.coeffs.len() != self.config.threshold {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"wrong number of Feldman coefficients for the declared threshold",
				)))
			}
			self.decommits.insert(peer, (msg.bk, msg.coeffs));
		}

		let bks_only: BTreeMap<PeerId, BK<P::Scalar>> =
			self.decommits.iter().map(|(peer, (bk, _))| (peer.clone(), bk.clone())).collect();
		if let Err((a, b)) = detail::check_distinct_bks(&bks_only) {
			return Err(self.fail(CeremonyError::QuorumInconsistent(format!(
				"{a} and {b} declared colliding BKs"
			))))
		}

		let mut outbound = Vec::new();
		for peer in &self.others {
			let (peer_bk, _) = self.decommits.get(peer).expect("collected above");
			let share = self.own_poly.evaluate(&peer_bk.x, peer_bk.rank);
			outbound.push(OutboundMessage {
				to: Some(peer.clone()),
				payload: bincode::serialize(&Envelope {
					ceremony_id: self.config.ceremony_id,
					round: 2,
					sender: self.config.own_peer_id.clone(),
					data: DkgData::<P, H>::Shares3(data::Shares3 { share }),
				})
				.expect("serialization cannot fail"),
			});
		}
		let own_bk = self.config.own_bk().expect("checked at construction");
		let own_share_to_self = self.own_poly.evaluate(&own_bk.x, own_bk.rank);
		self.shares.insert(self.config.own_peer_id.clone(), own_share_to_self);

		self.stage = Stage::AwaitingShares3;
		Ok(outbound)
	}

	fn finish_round3(
		&mut self,
		ready: Vec<(PeerId, Envelope<DkgData<P, H>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		let own_bk = self.config.own_bk().cloned().expect("checked at construction");
		for (peer, envelope) in ready {
			let DkgData::Shares3(msg) = envelope.data else { unreachable!() };
			let (_, coeffs) =
				self.decommits.get(&peer).ok_or_else(|| CeremonyError::Internal("missing decommit".into()))?;
			if !share::verify_share(&msg.share, &own_bk.x, own_bk.rank, coeffs) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"received share fails Feldman verification",
				)))
			}
			self.shares.insert(peer, msg.share);
		}

		let final_share: P::Scalar = self.shares.values().cloned().sum();
		let si_g = P::from_scalar(&final_share);
		let proof = schnorr::prove::<P>(&final_share, &context(self.config.ceremony_id, "proof4"), &mut self.rng);
		self.si_gs.insert(self.config.own_peer_id.clone(), si_g.clone());

		// Stash the reconstructed share for finalization; `shares` has served
		// its purpose and is no longer read.
		self.shares.clear();
		self.shares.insert(self.config.own_peer_id.clone(), final_share);

		self.stage = Stage::AwaitingComplete4;
		Ok(vec![OutboundMessage {
			to: None,
			payload: bincode::serialize(&Envelope {
				ceremony_id: self.config.ceremony_id,
				round: 3,
				sender: self.config.own_peer_id.clone(),
				data: DkgData::<P, H>::Complete4(data::Complete4 { si_g, proof }),
			})
			.expect("serialization cannot fail"),
		}])
	}

	fn finish_round4(
		&mut self,
		ready: Vec<(PeerId, Envelope<DkgData<P, H>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let DkgData::Complete4(msg) = envelope.data else { unreachable!() };
			if !schnorr::verify(&msg.si_g, &msg.proof, &context(self.config.ceremony_id, "proof4")) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"Schnorr proof of share knowledge failed to verify",
				)))
			}
			self.si_gs.insert(peer, msg.si_g);
		}

		let public_key = detail::reconstruct_public_key(
			self.decommits.values().map(|(_, coeffs)| coeffs[0]),
		);

		let mut by_x: Vec<(&PeerId, &BK<P::Scalar>)> = self.config.bks.iter().collect();
		by_x.sort_by(|a, b| a.1.x.cmp(&b.1.x));
		let quorum: Vec<_> = by_x.into_iter().take(self.config.threshold).collect();
		let quorum_bks: Vec<BK<P::Scalar>> = quorum.iter().map(|(_, bk)| (*bk).clone()).collect();
		let quorum_si_gs: Vec<P> = quorum
			.iter()
			.map(|(peer, _)| self.si_gs.get(*peer).cloned().expect("collected above"))
			.collect();

		match share::validate_public_key(&quorum_bks, &quorum_si_gs, self.config.threshold, &public_key) {
			Ok(true) => {},
			Ok(false) =>
				return Err(self.fail(CeremonyError::QuorumInconsistent(
					"reconstructed public key does not match the Feldman commitments".into(),
				))),
			Err(e) => return Err(self.fail(e.into())),
		}

		self.stage = Stage::Done;
		self.set_state(SessionState::Done);
		Ok(vec![])
	}

	/// Returns the completed key material, or `NotReady` before `Done`.
	pub fn get_result(&self) -> Result<DkgResult<P>, CeremonyError> {
		if self.stage != Stage::Done {
			return Err(CeremonyError::NotReady)
		}
		let public_key = detail::reconstruct_public_key(self.decommits.values().map(|(_, c)| c[0]));
		Ok(DkgResult {
			public_key,
			own_share: self.shares.get(&self.config.own_peer_id).cloned().expect("present once Done"),
			si_gs: self.si_gs.clone(),
			bks: self.config.bks.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		curves::secp256k1::{Point, Scalar},
		homomorphic::PaillierScheme,
		message::NullStateListener,
	};
	use rand::SeedableRng;

	/// Drives a three-party, threshold-3 DKG to completion and checks every
	/// party agrees on the public key and that the quorum's `siG`s
	/// reconstruct it (spec section 8 P1/P2).
	#[test]
	fn three_party_dkg_agrees_on_public_key() {
		let peers = vec!["p1".to_string(), "p2".to_string(), "p3".to_string()];
		let threshold = 3;
		let bks: BTreeMap<String, BK<Scalar>> = peers
			.iter()
			.enumerate()
			.map(|(i, p)| (p.clone(), BK::new(Scalar::from((i + 1) as u32), 0)))
			.collect();

		let mut sessions: BTreeMap<String, DkgSession<Point, PaillierScheme>> = BTreeMap::new();
		let mut pending: Vec<(Option<String>, Envelope<DkgData<Point, PaillierScheme>>)> = Vec::new();

		for (i, peer) in peers.iter().enumerate() {
			let config = SessionConfig {
				ceremony_id: 1,
				threshold,
				own_peer_id: peer.clone(),
				bks: bks.clone(),
				prior: None,
			};
			let rng = Rng::from_seed([(10 + i) as u8; 32]);
			let (session, outbound) = DkgSession::new(config, rng, Box::new(NullStateListener));
			for msg in outbound {
				let envelope = bincode::deserialize(&msg.payload).unwrap();
				pending.push((msg.to, envelope));
			}
			sessions.insert(peer.clone(), session);
		}

		let mut guard = 0;
		while let Some((to, envelope)) = pending.pop() {
			guard += 1;
			assert!(guard < 10_000, "ceremony did not converge");
			let sender = envelope.sender.clone();
			let recipients: Vec<String> = match to {
				Some(peer) => vec![peer],
				None => peers.iter().filter(|id| **id != sender).cloned().collect(),
			};
			for recipient in recipients {
				let session = sessions.get_mut(&recipient).expect("known peer");
				let outbound = session.handle_message(envelope.clone()).expect("honest ceremony");
				for msg in outbound {
					let env = bincode::deserialize(&msg.payload).unwrap();
					pending.push((msg.to, env));
				}
			}
		}

		for peer in &peers {
			assert_eq!(sessions[peer].state(), SessionState::Done);
		}

		let results: Vec<DkgResult<Point>> =
			peers.iter().map(|p| sessions[p].get_result().unwrap()).collect();
		for r in &results[1..] {
			assert_eq!(r.public_key, results[0].public_key);
		}

		let quorum_bks: Vec<BK<Scalar>> = peers.iter().map(|p| bks[p].clone()).collect();
		let quorum_si_gs: Vec<Point> = peers.iter().map(|p| results[0].si_gs[p]).collect();
		assert!(share::validate_public_key(&quorum_bks, &quorum_si_gs, threshold, &results[0].public_key).unwrap());
	}
}
