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

//! Share refresh preserving the public key (component R, spec section 4.5):
//! each peer secret-shares zero with a fresh degree-(t-1) polynomial,
//! distributes shares via the same Birkhoff evaluation DKG uses, and every
//! peer adds its received zero-shares onto its existing share. Four
//! message rounds, the same tagged-enum stage shape as [`crate::dkg`], with
//! an added round-0 echo of the quorum's `BK` assignment (spec section 13)
//! so a coordinator handing out inconsistent views is caught before any
//! cryptography runs.

pub mod data;
pub mod detail;

use std::collections::BTreeMap;

use crate::{
	ceremony::{self, CeremonyError},
	config::{PriorKeyMaterial, SessionConfig},
	group::{ECPoint, ECScalar, Rng},
	message::{Envelope, Mailbox, OutboundMessage, PeerId, SessionState, StateListener},
	share::{self, Polynomial, BK},
	zkp::{commitment, schnorr},
};

pub use data::ReshareData;

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

/// Output of a successful reshare: the unchanged public key, this party's
/// refreshed share, and every party's (unchanged) `siG`.
#[derive(Clone, Debug)]
pub struct ReshareResult<P: ECPoint> {
	pub public_key: P,
	pub own_share: P::Scalar,
	pub si_gs: BTreeMap<PeerId, P>,
}

impl<P: ECPoint> From<ReshareResult<P>> for PriorKeyMaterial<P> {
	fn from(result: ReshareResult<P>) -> Self {
		PriorKeyMaterial { public_key: result.public_key, own_share: result.own_share, si_gs: result.si_gs }
	}
}

fn context(ceremony_id: u64, tag: &str) -> Vec<u8> {
	format!("reshare:{ceremony_id}:{tag}").into_bytes()
}

/// The reshare session. Requires `config.prior` (the key material being
/// refreshed); every peer in `config.bks` is a member of the quorum.
pub struct ReshareSession<P: ECPoint> {
	config: SessionConfig<P>,
	others: Vec<PeerId>,
	rng: Rng,
	stage: Stage,
	mailbox: Mailbox<Envelope<ReshareData<P>>>,

	expected_public_key: P,
	own_poly: Polynomial<P::Scalar>,
	own_salt: commitment::Salt,

	comms: BTreeMap<PeerId, commitment::Commitment>,
	quorum_echoes: BTreeMap<PeerId, Vec<u8>>,
	decommits: BTreeMap<PeerId, (BK<P::Scalar>, Vec<P>)>,
	zero_shares: BTreeMap<PeerId, P::Scalar>,
	si_gs: BTreeMap<PeerId, P>,
	final_share: P::Scalar,

	listener: Box<dyn StateListener>,
	state: SessionState,
}

impl<P: ECPoint> ReshareSession<P> {
	pub fn new(
		config: SessionConfig<P>,
		mut rng: Rng,
		listener: Box<dyn StateListener>,
	) -> (Self, Vec<OutboundMessage>) {
		let prior = config.prior.clone().expect("a Reshare session requires prior key material");
		let own_bk = config.own_bk().cloned().expect("own BK must be present in config.bks");
		let own_poly =
			Polynomial::random_with_constant_term(config.threshold, P::Scalar::zero(), &mut rng);
		let coeffs: Vec<P> = own_poly.commit();
		let payload = detail::commitment_payload(&own_bk, &coeffs);
		let (comm, salt) = commitment::commit(&payload, &mut rng);
		let quorum_echo = detail::quorum_payload(&config.bks);

		let mut comms = BTreeMap::new();
		comms.insert(config.own_peer_id.clone(), comm.clone());
		let mut quorum_echoes = BTreeMap::new();
		quorum_echoes.insert(config.own_peer_id.clone(), quorum_echo.clone());

		let others = config.other_peer_ids();
		let outbound = vec![OutboundMessage {
			to: None,
			payload: bincode::serialize(&Envelope {
				ceremony_id: config.ceremony_id,
				round: 0,
				sender: config.own_peer_id.clone(),
				data: ReshareData::<P>::HashComm1(data::HashComm1 { comm, quorum_echo }),
			})
			.expect("serialization cannot fail"),
		}];

		let session = ReshareSession {
			config,
			others,
			rng,
			stage: Stage::AwaitingHashComm1,
			mailbox: Mailbox::new(),
			expected_public_key: prior.public_key,
			own_poly,
			own_salt: salt,
			comms,
			quorum_echoes,
			decommits: BTreeMap::new(),
			zero_shares: BTreeMap::new(),
			si_gs: BTreeMap::new(),
			final_share: prior.own_share,
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
		envelope: Envelope<ReshareData<P>>,
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
		ready: Vec<(PeerId, Envelope<ReshareData<P>>)>,
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
		ready: Vec<(PeerId, Envelope<ReshareData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let ReshareData::HashComm1(msg) = envelope.data else { unreachable!("mailbox routes by round") };
			self.comms.insert(peer.clone(), msg.comm);
			self.quorum_echoes.insert(peer, msg.quorum_echo);
		}

		let own_bk = self.config.own_bk().cloned().expect("checked at construction");
		let coeffs = self.own_poly.commit::<P>();
		let envelope = Envelope {
			ceremony_id: self.config.ceremony_id,
			round: 1,
			sender: self.config.own_peer_id.clone(),
			data: ReshareData::<P>::Decommit2(data::Decommit2 { bk: own_bk.clone(), coeffs: coeffs.clone(), salt: self.own_salt }),
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
		ready: Vec<(PeerId, Envelope<ReshareData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let ReshareData::Decommit2(msg) = envelope.data else { unreachable!() };
			let comm = self.comms.get(&peer).cloned().ok_or_else(|| CeremonyError::Internal("missing commitment".into()))?;
			let payload = detail::commitment_payload(&msg.bk, &msg.coeffs);
			if !commitment::open(&comm, &payload, &msg.salt) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"decommitment does not match round-0 commitment",
				)))
			}
			if msg.coeffs.len() != self.config.threshold {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"wrong number of Feldman coefficients for the declared threshold",
				)))
			}
			if msg.coeffs[0] != P::point_at_infinity() {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"reshare polynomial's constant term is not zero",
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

		let own_echo = self.quorum_echoes.get(&self.config.own_peer_id).cloned().expect("set at construction");
		let quorum_size = self.quorum_echoes.len();
		let frequent =
			ceremony::find_frequent_element(self.quorum_echoes.values().cloned(), ceremony::threshold_for_broadcast_verification(quorum_size));
		if frequent.as_ref() != Some(&own_echo) {
			return Err(self.fail(CeremonyError::QuorumInconsistent(
				"peers do not agree on the quorum's BK assignment".into(),
			)))
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
					data: ReshareData::<P>::Shares3(data::Shares3 { share }),
				})
				.expect("serialization cannot fail"),
			});
		}
		let own_bk = self.config.own_bk().expect("checked at construction");
		let own_zero_share = self.own_poly.evaluate(&own_bk.x, own_bk.rank);
		self.zero_shares.insert(self.config.own_peer_id.clone(), own_zero_share);

		self.stage = Stage::AwaitingShares3;
		Ok(outbound)
	}

	fn finish_round3(
		&mut self,
		ready: Vec<(PeerId, Envelope<ReshareData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		let own_bk = self.config.own_bk().cloned().expect("checked at construction");
		for (peer, envelope) in ready {
			let ReshareData::Shares3(msg) = envelope.data else { unreachable!() };
			let (_, coeffs) =
				self.decommits.get(&peer).ok_or_else(|| CeremonyError::Internal("missing decommit".into()))?;
			if !share::verify_share(&msg.share, &own_bk.x, own_bk.rank, coeffs) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"received zero-share fails Feldman verification",
				)))
			}
			self.zero_shares.insert(peer, msg.share);
		}

		let zero_sum: P::Scalar = self.zero_shares.values().cloned().sum();
		self.final_share = self.final_share.clone() + zero_sum;
		let si_g = P::from_scalar(&self.final_share);
		let proof = schnorr::prove::<P>(&self.final_share, &context(self.config.ceremony_id, "complete4"), &mut self.rng);
		self.si_gs.insert(self.config.own_peer_id.clone(), si_g.clone());

		self.stage = Stage::AwaitingComplete4;
		Ok(vec![OutboundMessage {
			to: None,
			payload: bincode::serialize(&Envelope {
				ceremony_id: self.config.ceremony_id,
				round: 3,
				sender: self.config.own_peer_id.clone(),
				data: ReshareData::<P>::Complete4(data::Complete4 { si_g, proof }),
			})
			.expect("serialization cannot fail"),
		}])
	}

	fn finish_round4(
		&mut self,
		ready: Vec<(PeerId, Envelope<ReshareData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let ReshareData::Complete4(msg) = envelope.data else { unreachable!() };
			if !schnorr::verify(&msg.si_g, &msg.proof, &context(self.config.ceremony_id, "complete4")) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"Schnorr proof of refreshed-share knowledge failed to verify",
				)))
			}
			self.si_gs.insert(peer, msg.si_g);
		}

		let mut by_x: Vec<(&PeerId, &BK<P::Scalar>)> = self.config.bks.iter().collect();
		by_x.sort_by(|a, b| a.1.x.cmp(&b.1.x));
		let quorum: Vec<_> = by_x.into_iter().take(self.config.threshold).collect();
		let quorum_bks: Vec<BK<P::Scalar>> = quorum.iter().map(|(_, bk)| (*bk).clone()).collect();
		let quorum_si_gs: Vec<P> = quorum
			.iter()
			.map(|(peer, _)| self.si_gs.get(*peer).cloned().expect("collected above"))
			.collect();

		match share::validate_public_key(&quorum_bks, &quorum_si_gs, self.config.threshold, &self.expected_public_key) {
			Ok(true) => {},
			Ok(false) =>
				return Err(self.fail(CeremonyError::QuorumInconsistent(
					"refreshed shares no longer reconstruct the original public key".into(),
				))),
			Err(e) => return Err(self.fail(e.into())),
		}

		self.stage = Stage::Done;
		self.set_state(SessionState::Done);
		Ok(vec![])
	}

	/// Returns the completed key material, or `NotReady` before `Done`.
	pub fn get_result(&self) -> Result<ReshareResult<P>, CeremonyError> {
		if self.stage != Stage::Done {
			return Err(CeremonyError::NotReady)
		}
		Ok(ReshareResult {
			public_key: self.expected_public_key,
			own_share: self.final_share.clone(),
			si_gs: self.si_gs.clone(),
		})
	}
}
