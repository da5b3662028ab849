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

//! Interactive threshold-ECDSA signing (component P, spec section 4.4): ten
//! message rounds driven by a tagged-enum stage machine, the same shape as
//! [`crate::dkg`]. Every participant in a session's [`SessionConfig`] is a
//! member of the signing quorum itself (unlike DKG, a Signer session always
//! carries `prior` key material).
//!
//! Round shape, following Gennaro-Goldfeder's GG18 (with Birkhoff
//! interpolation standing in for their plain Shamir reconstruction):
//! each party picks a nonce share `k_i` and a blinding factor `gamma_i`
//! (published as `a_i` in rounds 0/4, reusing the letter the wire data uses).
//! Rounds 2-3 run the MtA engine twice per peer pair (once for the `k.gamma`
//! product, once for the `k.w` product, `w_i` the party's Birkhoff-weighted
//! key share) to additively share `delta = k.gamma` (revealed, to invert)
//! and `sigma = k.x` (kept secret). Round 4 decommits `Gamma = gamma.G` and
//! derives `R = Gamma * delta^-1`, `r = R.x mod q`. Rounds 5-8 run the
//! consistency check from GG18's phase 6: `V_i := sigma_i.R + l_i.G`,
//! `A_i := rho_i.G` (fresh blinds `l_i`, `rho_i`), then `U_i := rho_i.(V-Y)`,
//! `T_i := l_i.A`; `sum(U_i) == sum(T_i)` holds iff `sigma.R == Y`, binding
//! the revealed nonce commitment to the real public key without leaking
//! `sigma`. Round 9 reveals `s_i := k_i.m + r.sigma_i`; `s := sum(s_i)`.

pub mod data;
pub mod detail;

use std::collections::BTreeMap;

use crate::{
	ceremony::CeremonyError,
	config::SessionConfig,
	group::{ECPoint, ECScalar, Rng},
	homomorphic::{
		HomomorphicScheme, PaillierCiphertext, PaillierPublicKey, PaillierScheme, PaillierSecretKey,
		PlaintextKnowledgeProof,
	},
	message::{Envelope, Mailbox, OutboundMessage, PeerId, SessionState, StateListener},
	mta,
	result::Signature,
	zkp::{
		commitment::{self, Commitment, Salt},
		consistency,
		homomorphic_proofs::MtaConsistencyProof,
		schnorr,
	},
};

pub use data::SignerData;

/// Which round this session is currently collecting messages for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
	AwaitingPubKey0,
	AwaitingEncK1,
	AwaitingMta2,
	AwaitingDelta3,
	AwaitingProofAi4,
	AwaitingCommitViAi5,
	AwaitingDecommitViAi6,
	AwaitingCommitUiTi7,
	AwaitingDecommitUiTi8,
	AwaitingSi9,
	Done,
	Failed,
}

fn context(ceremony_id: u64, tag: &str) -> Vec<u8> {
	format!("signer:{ceremony_id}:{tag}").into_bytes()
}

/// An interactive signing session. Always carries `prior` key material
/// (spec section 4.4's precondition); every peer in `config.bks` is a
/// member of the signing quorum.
pub struct SignerSession<P: ECPoint> {
	config: SessionConfig<P>,
	others: Vec<PeerId>,
	rng: Rng,
	stage: Stage,
	mailbox: Mailbox<Envelope<SignerData<P>>>,

	/// The message scalar being signed (`H(message) mod q`, spec section 6.6).
	msg_hash: P::Scalar,
	public_key: P,
	lambdas: BTreeMap<PeerId, P::Scalar>,

	own_gamma_i: P::Scalar,
	own_k_i: P::Scalar,
	own_w_i: P::Scalar,
	own_he_keys: (PaillierPublicKey, PaillierSecretKey),
	own_salt_ai: Salt,

	/// Round 0: peer homomorphic public keys and commitments to `a_i . G`.
	comms_ai: BTreeMap<PeerId, (Commitment, PaillierPublicKey)>,
	/// Round 1: peer encrypted nonce shares, needed as MtA inputs in round 2.
	enc_ks: BTreeMap<PeerId, (PaillierCiphertext, PlaintextKnowledgeProof)>,
	/// Round 2: each peer's fresh encryption of its own `gamma` alongside a
	/// consistency proof, held back until `a_i . G` is decommitted in round 4.
	gamma_ciphers_from: BTreeMap<PeerId, (PaillierCiphertext, MtaConsistencyProof<P>)>,

	own_delta_i: P::Scalar,
	own_sigma_i: P::Scalar,
	delta: P::Scalar,

	ai_gs: BTreeMap<PeerId, P>,
	r_point: P,
	r: P::Scalar,

	own_rho_i: P::Scalar,
	own_l_i: P::Scalar,
	own_v_i: P,
	own_rho_g_i: P,
	salts_via: (Salt, Salt),
	comms_via: BTreeMap<PeerId, (Commitment, Commitment)>,

	v_is: BTreeMap<PeerId, P>,
	rho_gs: BTreeMap<PeerId, P>,
	l_is: BTreeMap<PeerId, P::Scalar>,
	v_point: P,
	a_point: P,

	own_u_i: P,
	own_t_i: P,
	salts_uti: (Salt, Salt),
	comms_uti: BTreeMap<PeerId, (Commitment, Commitment)>,
	u_is: BTreeMap<PeerId, P>,
	t_is: BTreeMap<PeerId, P>,

	own_s_i: P::Scalar,

	result: Option<Signature<P>>,

	listener: Box<dyn StateListener>,
	state: SessionState,
}

impl<P: ECPoint> SignerSession<P> {
	pub fn new(
		config: SessionConfig<P>,
		msg_hash: P::Scalar,
		mut rng: Rng,
		listener: Box<dyn StateListener>,
	) -> (Self, Vec<OutboundMessage>) {
		let prior = config.prior.clone().expect("a Signer session requires prior key material");
		let bks = config.bk_list();
		let lambda_values = crate::share::compute_coefficients(&bks, config.threshold)
			.expect("session config's bks must match its threshold");
		let lambdas: BTreeMap<PeerId, P::Scalar> =
			config.peer_ids().into_iter().zip(lambda_values).collect();
		let own_lambda = lambdas.get(&config.own_peer_id).cloned().expect("own peer id must have a BK");
		let own_w_i = own_lambda * prior.own_share.clone();

		let own_gamma_i = P::Scalar::random(&mut rng);
		let own_k_i = P::Scalar::random(&mut rng);
		let own_he_keys = PaillierScheme::keygen(&mut rng);

		let ai_g = P::from_scalar(&own_gamma_i);
		let (comm_ai_g, own_salt_ai) = commitment::commit(&detail::point_payload(&ai_g), &mut rng);

		let mut comms_ai = BTreeMap::new();
		comms_ai.insert(config.own_peer_id.clone(), (comm_ai_g.clone(), own_he_keys.0.clone()));

		let others = config.other_peer_ids();
		let outbound = vec![OutboundMessage {
			to: None,
			payload: bincode::serialize(&Envelope {
				ceremony_id: config.ceremony_id,
				round: 0,
				sender: config.own_peer_id.clone(),
				data: SignerData::<P>::PubKey0(data::PubKey0 {
					he_pubkey: own_he_keys.0.clone(),
					comm_ai_g,
				}),
			})
			.expect("serialization cannot fail"),
		}];

		let session = SignerSession {
			config,
			others,
			rng,
			stage: Stage::AwaitingPubKey0,
			mailbox: Mailbox::new(),
			msg_hash,
			public_key: prior.public_key,
			lambdas,
			own_gamma_i,
			own_k_i,
			own_w_i,
			own_he_keys,
			own_salt_ai,
			comms_ai,
			enc_ks: BTreeMap::new(),
			gamma_ciphers_from: BTreeMap::new(),
			own_delta_i: P::Scalar::zero(),
			own_sigma_i: P::Scalar::zero(),
			delta: P::Scalar::zero(),
			ai_gs: BTreeMap::new(),
			r_point: P::point_at_infinity(),
			r: P::Scalar::zero(),
			own_rho_i: P::Scalar::zero(),
			own_l_i: P::Scalar::zero(),
			own_v_i: P::point_at_infinity(),
			own_rho_g_i: P::point_at_infinity(),
			salts_via: (Salt([0u8; 32]), Salt([0u8; 32])),
			comms_via: BTreeMap::new(),
			v_is: BTreeMap::new(),
			rho_gs: BTreeMap::new(),
			l_is: BTreeMap::new(),
			v_point: P::point_at_infinity(),
			a_point: P::point_at_infinity(),
			own_u_i: P::point_at_infinity(),
			own_t_i: P::point_at_infinity(),
			salts_uti: (Salt([0u8; 32]), Salt([0u8; 32])),
			comms_uti: BTreeMap::new(),
			u_is: BTreeMap::new(),
			t_is: BTreeMap::new(),
			own_s_i: P::Scalar::zero(),
			result: None,
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
			Stage::AwaitingPubKey0 => 0,
			Stage::AwaitingEncK1 => 1,
			Stage::AwaitingMta2 => 2,
			Stage::AwaitingDelta3 => 3,
			Stage::AwaitingProofAi4 => 4,
			Stage::AwaitingCommitViAi5 => 5,
			Stage::AwaitingDecommitViAi6 => 6,
			Stage::AwaitingCommitUiTi7 => 7,
			Stage::AwaitingDecommitUiTi8 => 8,
			Stage::AwaitingSi9 => 9,
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
		envelope: Envelope<SignerData<P>>,
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
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		match self.stage {
			Stage::AwaitingPubKey0 => self.finish_round1(ready),
			Stage::AwaitingEncK1 => self.finish_round2(ready),
			Stage::AwaitingMta2 => self.finish_round3(ready),
			Stage::AwaitingDelta3 => self.finish_round4(ready),
			Stage::AwaitingProofAi4 => self.finish_round5(ready),
			Stage::AwaitingCommitViAi5 => self.finish_round6(ready),
			Stage::AwaitingDecommitViAi6 => self.finish_round7(ready),
			Stage::AwaitingCommitUiTi7 => self.finish_round8(ready),
			Stage::AwaitingDecommitUiTi8 => self.finish_round9(ready),
			Stage::AwaitingSi9 => self.finish_round10(ready),
			Stage::Done | Stage::Failed => Ok(vec![]),
		}
	}

	fn broadcast(&self, round: u32, data: SignerData<P>) -> OutboundMessage {
		OutboundMessage {
			to: None,
			payload: bincode::serialize(&Envelope {
				ceremony_id: self.config.ceremony_id,
				round,
				sender: self.config.own_peer_id.clone(),
				data,
			})
			.expect("serialization cannot fail"),
		}
	}

	fn finish_round1(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let SignerData::PubKey0(msg) = envelope.data else { unreachable!("mailbox routes by round") };
			self.comms_ai.insert(peer, (msg.comm_ai_g, msg.he_pubkey));
		}

		let plaintext = self.own_k_i.to_bigint();
		let (enc_k, randomness) = PaillierScheme::encrypt(&self.own_he_keys.0, &plaintext, &mut self.rng);
		let proof =
			PaillierScheme::prove_well_formed(&self.own_he_keys.0, &plaintext, &randomness, &enc_k, &mut self.rng);

		self.stage = Stage::AwaitingEncK1;
		Ok(vec![self.broadcast(1, SignerData::EncK1(data::EncK1 { enc_k, proof }))])
	}

	fn finish_round2(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let SignerData::EncK1(msg) = envelope.data else { unreachable!() };
			let (_, he_pubkey) = self
				.comms_ai
				.get(&peer)
				.cloned()
				.ok_or_else(|| CeremonyError::Internal("missing round-0 commitment".into()))?;
			if !PaillierScheme::verify_well_formed(&he_pubkey, &msg.enc_k, &msg.proof) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"encrypted nonce share failed its well-formedness proof",
				)))
			}
			self.enc_ks.insert(peer, (msg.enc_k, msg.proof));
		}

		self.own_delta_i = self.own_k_i.clone() * self.own_gamma_i.clone();
		self.own_sigma_i = self.own_k_i.clone() * self.own_w_i.clone();

		let mut outbound = Vec::with_capacity(self.others.len());
		for peer in self.others.clone() {
			let (peer_he_pubkey, _) = self.comms_ai.get(&peer).cloned().expect("collected above");
			let (peer_enc_k, peer_proof) = self.enc_ks.get(&peer).cloned().expect("collected above");

			let (combined_gamma, beta_gamma) = mta::receiver_respond::<PaillierScheme, P::Scalar>(
				&peer_he_pubkey,
				&peer_enc_k,
				&peer_proof,
				&self.own_gamma_i,
				&mut self.rng,
			)
			.map_err(|e| self.fail(CeremonyError::crypto_verify_failure(Some(peer.clone()), e.to_string())))?;
			let (combined_sigma, beta_sigma) = mta::receiver_respond::<PaillierScheme, P::Scalar>(
				&peer_he_pubkey,
				&peer_enc_k,
				&peer_proof,
				&self.own_w_i,
				&mut self.rng,
			)
			.map_err(|e| self.fail(CeremonyError::crypto_verify_failure(Some(peer.clone()), e.to_string())))?;

			self.own_delta_i = self.own_delta_i.clone() + beta_gamma;
			self.own_sigma_i = self.own_sigma_i.clone() + beta_sigma;

			let (gamma_cipher, gamma_rand) =
				PaillierScheme::encrypt(&peer_he_pubkey, &self.own_gamma_i.to_bigint(), &mut self.rng);
			let gamma_proof = mta::consistency::get_proof_with_check::<P>(
				&peer_he_pubkey,
				&self.own_gamma_i,
				&gamma_rand,
				&gamma_cipher,
				&mut self.rng,
			);
			let (sigma_cipher, sigma_rand) =
				PaillierScheme::encrypt(&peer_he_pubkey, &self.own_w_i.to_bigint(), &mut self.rng);
			let sigma_proof = mta::consistency::get_proof_with_check::<P>(
				&peer_he_pubkey,
				&self.own_w_i,
				&sigma_rand,
				&sigma_cipher,
				&mut self.rng,
			);

			outbound.push(OutboundMessage {
				to: Some(peer.clone()),
				payload: bincode::serialize(&Envelope {
					ceremony_id: self.config.ceremony_id,
					round: 2,
					sender: self.config.own_peer_id.clone(),
					data: SignerData::<P>::Mta2(data::Mta2 {
						combined_gamma,
						combined_sigma,
						gamma_cipher,
						gamma_proof,
						sigma_cipher,
						sigma_proof,
					}),
				})
				.expect("serialization cannot fail"),
			});
		}

		self.stage = Stage::AwaitingMta2;
		Ok(outbound)
	}

	fn finish_round3(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let SignerData::Mta2(msg) = envelope.data else { unreachable!() };

			let alpha_gamma = mta::sender_finish::<PaillierScheme, P::Scalar>(
				&self.own_he_keys.0,
				&self.own_he_keys.1,
				&msg.combined_gamma,
			)
			.map_err(|e| self.fail(CeremonyError::crypto_verify_failure(Some(peer.clone()), e.to_string())))?;
			let alpha_sigma = mta::sender_finish::<PaillierScheme, P::Scalar>(
				&self.own_he_keys.0,
				&self.own_he_keys.1,
				&msg.combined_sigma,
			)
			.map_err(|e| self.fail(CeremonyError::crypto_verify_failure(Some(peer.clone()), e.to_string())))?;
			self.own_delta_i = self.own_delta_i.clone() + alpha_gamma;
			self.own_sigma_i = self.own_sigma_i.clone() + alpha_sigma;

			let peer_lambda = self.lambdas.get(&peer).cloned().expect("every peer has a BK");
			let peer_si_g = self
				.config
				.prior
				.as_ref()
				.expect("checked at construction")
				.si_gs
				.get(&peer)
				.cloned()
				.ok_or_else(|| CeremonyError::Internal("missing prior siG for peer".into()))?;
			let peer_w_g = peer_si_g * &peer_lambda;
			if !mta::consistency::verify_proof_with_check(
				&self.own_he_keys.0,
				&msg.sigma_cipher,
				&peer_w_g,
				&msg.sigma_proof,
			) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"sigma-channel MtA consistency proof failed to verify",
				)))
			}

			self.gamma_ciphers_from.insert(peer, (msg.gamma_cipher, msg.gamma_proof));
		}

		self.stage = Stage::AwaitingDelta3;
		Ok(vec![self.broadcast(3, SignerData::Delta3(data::Delta3 { delta_i: self.own_delta_i.clone() }))])
	}

	fn finish_round4(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		let mut delta = self.own_delta_i.clone();
		for (_peer, envelope) in ready {
			let SignerData::Delta3(msg) = envelope.data else { unreachable!() };
			delta = delta + msg.delta_i;
		}
		self.delta = delta;

		let ai_g = P::from_scalar(&self.own_gamma_i);
		self.stage = Stage::AwaitingProofAi4;
		Ok(vec![self.broadcast(
			4,
			SignerData::ProofAi4(data::ProofAi4 {
				ai_g,
				salt: self.own_salt_ai,
				proof: schnorr::prove::<P>(&self.own_gamma_i, &context(self.config.ceremony_id, "proofai4"), &mut self.rng),
			}),
		)])
	}

	fn finish_round5(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let SignerData::ProofAi4(msg) = envelope.data else { unreachable!() };
			let (comm_ai_g, _) =
				self.comms_ai.get(&peer).cloned().ok_or_else(|| CeremonyError::Internal("missing comm_ai_g".into()))?;
			if !commitment::open(&comm_ai_g, &detail::point_payload(&msg.ai_g), &msg.salt) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"a_i . G decommitment does not match round-0 commitment",
				)))
			}
			if !schnorr::verify(&msg.ai_g, &msg.proof, &context(self.config.ceremony_id, "proofai4")) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"Schnorr proof of knowledge of gamma_i failed to verify",
				)))
			}
			let (gamma_cipher, gamma_proof) = self
				.gamma_ciphers_from
				.get(&peer)
				.cloned()
				.ok_or_else(|| CeremonyError::Internal("missing gamma consistency material".into()))?;
			if !mta::consistency::verify_proof_with_check(&self.own_he_keys.0, &gamma_cipher, &msg.ai_g, &gamma_proof) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"gamma-channel MtA consistency proof failed to verify",
				)))
			}
			self.ai_gs.insert(peer, msg.ai_g);
		}
		self.ai_gs.insert(self.config.own_peer_id.clone(), P::from_scalar(&self.own_gamma_i));

		let gamma_point = detail::sum_points(self.ai_gs.values().cloned());
		let delta_inv = self.delta.clone().invert().ok_or_else(|| {
			self.fail(CeremonyError::crypto_verify_failure(None, "delta has no inverse; restart with fresh nonces"))
		})?;
		let r_point = gamma_point * &delta_inv;
		let r = r_point.x_scalar_mod_q();
		if r == P::Scalar::zero() {
			return Err(self.fail(CeremonyError::crypto_verify_failure(
				None,
				"signature nonce degenerated to r = 0; restart with fresh nonces",
			)))
		}
		self.r_point = r_point;
		self.r = r;

		let own_rho_i = P::Scalar::random(&mut self.rng);
		let own_l_i = P::Scalar::random(&mut self.rng);
		let own_v_i = self.r_point * &self.own_sigma_i + P::from_scalar(&own_l_i);
		let own_rho_g_i = P::from_scalar(&own_rho_i);

		let (comm_v, salt_v) = commitment::commit(&detail::point_payload(&own_v_i), &mut self.rng);
		let (comm_a, salt_a) = commitment::commit(&detail::point_payload(&own_rho_g_i), &mut self.rng);
		self.comms_via.insert(self.config.own_peer_id.clone(), (comm_v.clone(), comm_a.clone()));

		self.own_rho_i = own_rho_i;
		self.own_l_i = own_l_i;
		self.own_v_i = own_v_i;
		self.own_rho_g_i = own_rho_g_i;
		self.salts_via = (salt_v, salt_a);

		self.stage = Stage::AwaitingCommitViAi5;
		Ok(vec![self.broadcast(5, SignerData::CommitViAi5(data::CommitViAi5 { comm_v, comm_a }))])
	}

	fn finish_round6(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let SignerData::CommitViAi5(msg) = envelope.data else { unreachable!() };
			self.comms_via.insert(peer, (msg.comm_v, msg.comm_a));
		}

		self.stage = Stage::AwaitingDecommitViAi6;
		Ok(vec![self.broadcast(
			6,
			SignerData::DecommitViAi6(data::DecommitViAi6 {
				v_i: self.own_v_i,
				a_i: self.own_rho_g_i,
				l_i: self.own_l_i.clone(),
				salt_v: self.salts_via.0,
				salt_a: self.salts_via.1,
			}),
		)])
	}

	fn finish_round7(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let SignerData::DecommitViAi6(msg) = envelope.data else { unreachable!() };
			let (comm_v, comm_a) =
				self.comms_via.get(&peer).cloned().ok_or_else(|| CeremonyError::Internal("missing comm_v/comm_a".into()))?;
			if !commitment::open(&comm_v, &detail::point_payload(&msg.v_i), &msg.salt_v) ||
				!commitment::open(&comm_a, &detail::point_payload(&msg.a_i), &msg.salt_a)
			{
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"V_i/A_i decommitment does not match round-5 commitment",
				)))
			}
			self.v_is.insert(peer.clone(), msg.v_i);
			self.rho_gs.insert(peer.clone(), msg.a_i);
			self.l_is.insert(peer, msg.l_i);
		}
		self.v_is.insert(self.config.own_peer_id.clone(), self.own_v_i);
		self.rho_gs.insert(self.config.own_peer_id.clone(), self.own_rho_g_i);
		self.l_is.insert(self.config.own_peer_id.clone(), self.own_l_i.clone());

		let v_point = detail::sum_points(self.v_is.values().cloned());
		let a_point = detail::sum_points(self.rho_gs.values().cloned());
		self.v_point = v_point;
		self.a_point = a_point;

		let v_minus_y = v_point - self.public_key;
		let own_u_i = v_minus_y * &self.own_rho_i;
		let own_t_i = a_point * &self.own_l_i;

		let (comm_u, salt_u) = commitment::commit(&detail::point_payload(&own_u_i), &mut self.rng);
		let (comm_t, salt_t) = commitment::commit(&detail::point_payload(&own_t_i), &mut self.rng);
		self.comms_uti.insert(self.config.own_peer_id.clone(), (comm_u.clone(), comm_t.clone()));

		self.own_u_i = own_u_i;
		self.own_t_i = own_t_i;
		self.salts_uti = (salt_u, salt_t);

		self.stage = Stage::AwaitingCommitUiTi7;
		Ok(vec![self.broadcast(7, SignerData::CommitUiTi7(data::CommitUiTi7 { comm_u, comm_t }))])
	}

	fn finish_round8(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		for (peer, envelope) in ready {
			let SignerData::CommitUiTi7(msg) = envelope.data else { unreachable!() };
			self.comms_uti.insert(peer, (msg.comm_u, msg.comm_t));
		}

		let v_minus_y = self.v_point - self.public_key;
		let proof = consistency::prove::<P>(
			&self.own_rho_i,
			&v_minus_y,
			&P::base_point(),
			&context(self.config.ceremony_id, "uiti8"),
			&mut self.rng,
		);

		self.stage = Stage::AwaitingDecommitUiTi8;
		Ok(vec![self.broadcast(
			8,
			SignerData::DecommitUiTi8(data::DecommitUiTi8 {
				u_i: self.own_u_i,
				t_i: self.own_t_i,
				salt_u: self.salts_uti.0,
				salt_t: self.salts_uti.1,
				consistency_proof: proof,
			}),
		)])
	}

	fn finish_round9(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		let v_minus_y = self.v_point - self.public_key;
		for (peer, envelope) in ready {
			let SignerData::DecommitUiTi8(msg) = envelope.data else { unreachable!() };
			let (comm_u, comm_t) =
				self.comms_uti.get(&peer).cloned().ok_or_else(|| CeremonyError::Internal("missing comm_u/comm_t".into()))?;
			if !commitment::open(&comm_u, &detail::point_payload(&msg.u_i), &msg.salt_u) ||
				!commitment::open(&comm_t, &detail::point_payload(&msg.t_i), &msg.salt_t)
			{
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"U_i/T_i decommitment does not match round-7 commitment",
				)))
			}
			let peer_l_i = self.l_is.get(&peer).cloned().expect("collected at round 6");
			if self.a_point * &peer_l_i != msg.t_i {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"T_i does not equal the revealed l_i times A",
				)))
			}
			let peer_a_i = self.rho_gs.get(&peer).cloned().expect("collected at round 6");
			if !consistency::verify(
				&msg.u_i,
				&peer_a_i,
				&v_minus_y,
				&P::base_point(),
				&msg.consistency_proof,
				&context(self.config.ceremony_id, "uiti8"),
			) {
				return Err(self.fail(CeremonyError::crypto_verify_failure(
					Some(peer),
					"consistency proof binding U_i/A_i to a shared rho_i failed to verify",
				)))
			}
			self.u_is.insert(peer.clone(), msg.u_i);
			self.t_is.insert(peer, msg.t_i);
		}
		self.u_is.insert(self.config.own_peer_id.clone(), self.own_u_i);
		self.t_is.insert(self.config.own_peer_id.clone(), self.own_t_i);

		let u_sum = detail::sum_points(self.u_is.values().cloned());
		let t_sum = detail::sum_points(self.t_is.values().cloned());
		if u_sum != t_sum {
			return Err(self.fail(CeremonyError::crypto_verify_failure(
				None,
				"sum of U_i does not equal sum of T_i; nonce is inconsistent with the public key",
			)))
		}

		self.own_s_i = self.own_k_i.clone() * self.msg_hash.clone() + self.r.clone() * self.own_sigma_i.clone();

		self.stage = Stage::AwaitingSi9;
		Ok(vec![self.broadcast(9, SignerData::Si9(data::Si9 { s_i: self.own_s_i.clone() }))])
	}

	fn finish_round10(
		&mut self,
		ready: Vec<(PeerId, Envelope<SignerData<P>>)>,
	) -> Result<Vec<OutboundMessage>, CeremonyError> {
		let mut s = self.own_s_i.clone();
		for (_peer, envelope) in ready {
			let SignerData::Si9(msg) = envelope.data else { unreachable!() };
			s = s + msg.s_i;
		}

		let signature = Signature { r_point: self.r_point, s };
		if !signature.verify(&self.public_key, &self.msg_hash) {
			return Err(self.fail(CeremonyError::crypto_verify_failure(
				None,
				"aggregated signature failed ECDSA verification",
			)))
		}

		self.result = Some(signature);
		self.stage = Stage::Done;
		self.set_state(SessionState::Done);
		Ok(vec![])
	}

	/// Returns the completed signature, or `NotReady` before `Done`.
	pub fn get_result(&self) -> Result<Signature<P>, CeremonyError> {
		self.result.clone().ok_or(CeremonyError::NotReady)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		curves::secp256k1::{Point, Scalar},
		message::NullStateListener,
		share::Polynomial,
	};
	use rand::SeedableRng;

	/// Drives a three-party, threshold-3 signing ceremony to completion and
	/// checks every party produces the same valid signature over the same
	/// message (spec section 8 P6/P7).
	#[test]
	fn three_party_signer_produces_valid_signature() {
		let mut seed_rng = Rng::from_seed([60; 32]);
		let secret = Scalar::random(&mut seed_rng);
		let threshold = 3;
		let poly = Polynomial::random_with_constant_term(threshold, secret.clone(), &mut seed_rng);
		let public_key = Point::from_scalar(&secret);
		let msg_hash = Scalar::random(&mut seed_rng);

		let peers = vec!["p1".to_string(), "p2".to_string(), "p3".to_string()];
		let bks: BTreeMap<String, BK<Scalar>> = peers
			.iter()
			.enumerate()
			.map(|(i, p)| (p.clone(), BK::new(Scalar::from((i + 1) as u32), 0)))
			.collect();
		let shares: BTreeMap<String, Scalar> =
			bks.iter().map(|(p, bk)| (p.clone(), poly.evaluate(&bk.x, bk.rank))).collect();
		let si_gs: BTreeMap<String, Point> =
			shares.iter().map(|(p, s)| (p.clone(), Point::from_scalar(s))).collect();

		let mut sessions: BTreeMap<String, SignerSession<Point>> = BTreeMap::new();
		let mut pending: Vec<(Option<String>, Envelope<SignerData<Point>>)> = Vec::new();

		for (i, peer) in peers.iter().enumerate() {
			let config = SessionConfig {
				ceremony_id: 1,
				threshold,
				own_peer_id: peer.clone(),
				bks: bks.clone(),
				prior: Some(crate::config::PriorKeyMaterial {
					public_key,
					own_share: shares[peer].clone(),
					si_gs: si_gs.clone(),
				}),
			};
			let rng = Rng::from_seed([(70 + i) as u8; 32]);
			let (session, outbound) =
				SignerSession::new(config, msg_hash.clone(), rng, Box::new(NullStateListener));
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

		let signatures: Vec<Signature<Point>> =
			peers.iter().map(|p| sessions[p].get_result().unwrap()).collect();
		for sig in &signatures {
			assert!(sig.verify(&public_key, &msg_hash));
		}
		for sig in &signatures[1..] {
			assert_eq!(sig.r(), signatures[0].r());
			assert_eq!(sig.s, signatures[0].s);
		}
	}
}
