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

//! Boundary-scenario integration tests: exercises the quorum math and
//! failure-attribution guarantees across DKG, signer, reshare and add-share
//! that a single module's unit tests cannot see on their own.

use std::collections::BTreeMap;

use itertools::Itertools;
use num_bigint::BigUint;
use rand::{RngCore, SeedableRng};

use threshold_ecdsa::{
	addshare::{AddShareData, AddShareSession},
	ceremony::CeremonyError,
	config::{AddShareConfig, PriorKeyMaterial, SessionConfig},
	curves::secp256k1::{Point, Scalar},
	group::{ECPoint, ECScalar, Rng},
	homomorphic::{HomomorphicScheme, PaillierScheme},
	message::{Envelope, NullStateListener, PeerId, SessionState},
	reshare::{ReshareData, ReshareSession},
	share::{self, Polynomial, BK},
	signer::{SignerData, SignerSession},
	zkp::factorization,
};

/// Runs a full threshold-sized signer ceremony over the given BK subset and
/// returns each peer's signature, asserting every one verifies against
/// `public_key` and agrees on `r`/`s` (spec section 8, P6/P7).
fn run_signer_quorum(
	bks: &BTreeMap<PeerId, BK<Scalar>>,
	shares: &BTreeMap<PeerId, Scalar>,
	si_gs: &BTreeMap<PeerId, Point>,
	public_key: Point,
	msg_hash: Scalar,
	seed: u8,
) -> BTreeMap<PeerId, threshold_ecdsa::result::Signature<Point>> {
	let peers: Vec<PeerId> = bks.keys().cloned().collect();
	let threshold = bks.len();

	let mut sessions: BTreeMap<PeerId, SignerSession<Point>> = BTreeMap::new();
	let mut pending: Vec<(Option<PeerId>, Envelope<SignerData<Point>>)> = Vec::new();

	for (i, peer) in peers.iter().enumerate() {
		let config = SessionConfig {
			ceremony_id: 1,
			threshold,
			own_peer_id: peer.clone(),
			bks: bks.clone(),
			prior: Some(PriorKeyMaterial {
				public_key,
				own_share: shares[peer].clone(),
				si_gs: si_gs.clone(),
			}),
		};
		let rng = Rng::from_seed([seed.wrapping_add(i as u8); 32]);
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
		let recipients: Vec<PeerId> = match to {
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

	let signatures: BTreeMap<PeerId, threshold_ecdsa::result::Signature<Point>> =
		peers.iter().map(|p| (p.clone(), sessions[p].get_result().unwrap())).collect();
	for sig in signatures.values() {
		assert!(sig.verify(&public_key, &msg_hash));
	}
	let first = signatures.values().next().unwrap();
	for sig in signatures.values() {
		assert_eq!(sig.r(), first.r());
		assert_eq!(sig.s, first.s);
	}
	signatures
}

/// S1: five peers, threshold 3, all rank 0, x in 1..=5. Every one of the
/// ten 3-subsets of the group is a valid signing quorum on its own.
#[test]
fn s1_every_three_subset_of_a_plain_five_peer_quorum_verifies() {
	let mut seed_rng = Rng::from_seed([1; 32]);
	let secret = Scalar::random(&mut seed_rng);
	let threshold = 3;
	let poly = Polynomial::random_with_constant_term(threshold, secret.clone(), &mut seed_rng);
	let public_key = Point::from_scalar(&secret);
	let msg_hash = Scalar::random(&mut seed_rng);

	let peers: Vec<PeerId> = (1..=5).map(|i| format!("p{i}")).collect();
	let all_bks: BTreeMap<PeerId, BK<Scalar>> = peers
		.iter()
		.enumerate()
		.map(|(i, p)| (p.clone(), BK::new(Scalar::from((i + 1) as u32), 0)))
		.collect();
	let all_shares: BTreeMap<PeerId, Scalar> =
		all_bks.iter().map(|(p, bk)| (p.clone(), poly.evaluate(&bk.x, bk.rank))).collect();
	let all_si_gs: BTreeMap<PeerId, Point> =
		all_shares.iter().map(|(p, s)| (p.clone(), Point::from_scalar(s))).collect();

	for (seed, subset) in peers.iter().combinations(3).enumerate() {
		let bks: BTreeMap<PeerId, BK<Scalar>> =
			subset.iter().map(|p| ((**p).clone(), all_bks[*p].clone())).collect();
		let shares: BTreeMap<PeerId, Scalar> =
			subset.iter().map(|p| ((**p).clone(), all_shares[*p].clone())).collect();
		let si_gs: BTreeMap<PeerId, Point> =
			subset.iter().map(|p| ((**p).clone(), all_si_gs[*p])).collect();

		run_signer_quorum(&bks, &shares, &si_gs, public_key, msg_hash.clone(), (20 + seed) as u8);
	}
}

/// S2: five peers at ranks (0,0,0,1,1). Every 3-subset necessarily contains
/// at least one rank-0 peer (only two rank-1 peers exist), which this
/// construction's Gaussian elimination accepts as Birkhoff-feasible for
/// any distinct node set — so every 3-subset is again a valid quorum, this
/// time mixing ranks.
#[test]
fn s2_mixed_rank_three_subsets_verify() {
	let mut seed_rng = Rng::from_seed([2; 32]);
	let secret = Scalar::random(&mut seed_rng);
	let threshold = 3;
	let poly = Polynomial::random_with_constant_term(threshold, secret.clone(), &mut seed_rng);
	let public_key = Point::from_scalar(&secret);
	let msg_hash = Scalar::random(&mut seed_rng);

	let ranks = [0u32, 0, 0, 1, 1];
	let peers: Vec<PeerId> = (1..=5).map(|i| format!("p{i}")).collect();
	let all_bks: BTreeMap<PeerId, BK<Scalar>> = peers
		.iter()
		.enumerate()
		.map(|(i, p)| (p.clone(), BK::new(Scalar::from((i + 1) as u32), ranks[i])))
		.collect();
	let all_shares: BTreeMap<PeerId, Scalar> =
		all_bks.iter().map(|(p, bk)| (p.clone(), poly.evaluate(&bk.x, bk.rank))).collect();
	let all_si_gs: BTreeMap<PeerId, Point> =
		all_shares.iter().map(|(p, s)| (p.clone(), Point::from_scalar(s))).collect();

	for (seed, subset) in peers.iter().combinations(3).enumerate() {
		let bks: BTreeMap<PeerId, BK<Scalar>> =
			subset.iter().map(|p| ((**p).clone(), all_bks[*p].clone())).collect();

		// The construction's Gaussian elimination is the feasibility check:
		// an infeasible (x, rank) combination surfaces as `IllConditioned`
		// here rather than panicking deeper in a session.
		match share::compute_coefficients(&bks.values().cloned().collect::<Vec<_>>(), threshold) {
			Ok(_) => {
				let shares: BTreeMap<PeerId, Scalar> =
					subset.iter().map(|p| ((**p).clone(), all_shares[*p].clone())).collect();
				let si_gs: BTreeMap<PeerId, Point> =
					subset.iter().map(|p| ((**p).clone(), all_si_gs[*p])).collect();
				run_signer_quorum(
					&bks,
					&shares,
					&si_gs,
					public_key,
					msg_hash.clone(),
					(40 + seed) as u8,
				);
			},
			Err(e) => {
				// A rank/node combination this construction cannot invert;
				// any session built on it would have to reject it the same
				// way before running a single round of cryptography.
				assert!(matches!(e, share::ShareError::IllConditioned));
			},
		}
	}
}

/// S3: add-share extends a plain three-peer quorum with a fourth. Checks
/// the new peer's own verification (over the old peers' untouched round-0
/// `siG`s plus its own freshly assembled one) agrees with every old peer's.
///
/// This does not assert that a purely-old 3-subset of the resulting
/// four-party group still reconstructs the public key under the *original*
/// quorum's Birkhoff coefficients — see `DESIGN.md`'s add-share entry for
/// why that stronger claim is not one this construction is built to prove.
#[test]
fn s3_add_share_extends_quorum_and_new_peer_agrees_with_old_peers() {
	let mut seed_rng = Rng::from_seed([3; 32]);
	let secret = Scalar::random(&mut seed_rng);
	let threshold = 3;
	let poly = Polynomial::random_with_constant_term(threshold, secret.clone(), &mut seed_rng);
	let public_key = Point::from_scalar(&secret);

	let old_peers: Vec<PeerId> = vec!["p1".into(), "p2".into(), "p3".into()];
	let old_bks: BTreeMap<PeerId, BK<Scalar>> = old_peers
		.iter()
		.enumerate()
		.map(|(i, p)| (p.clone(), BK::new(Scalar::from((i + 1) as u32), 0)))
		.collect();
	let old_shares: BTreeMap<PeerId, Scalar> =
		old_bks.iter().map(|(p, bk)| (p.clone(), poly.evaluate(&bk.x, bk.rank))).collect();
	let si_gs: BTreeMap<PeerId, Point> =
		old_shares.iter().map(|(p, s)| (p.clone(), Point::from_scalar(s))).collect();
	let new_peer: PeerId = "p4".into();

	let mut sessions: BTreeMap<PeerId, AddShareSession<Point>> = BTreeMap::new();
	let mut pending: Vec<(Option<PeerId>, Envelope<AddShareData<Point>>)> = Vec::new();

	for (i, peer) in old_peers.iter().enumerate() {
		let config = AddShareConfig {
			ceremony_id: 1,
			threshold,
			own_peer_id: peer.clone(),
			old_bks: old_bks.clone(),
			new_peer_id: new_peer.clone(),
			new_rank: 0,
			prior: Some(PriorKeyMaterial {
				public_key,
				own_share: old_shares[peer].clone(),
				si_gs: si_gs.clone(),
			}),
		};
		let rng = Rng::from_seed([(110 + i) as u8; 32]);
		let (session, outbound) = AddShareSession::new(config, rng, Box::new(NullStateListener));
		for msg in outbound {
			let envelope = bincode::deserialize(&msg.payload).unwrap();
			pending.push((msg.to, envelope));
		}
		sessions.insert(peer.clone(), session);
	}
	let new_config = AddShareConfig {
		ceremony_id: 1,
		threshold,
		own_peer_id: new_peer.clone(),
		old_bks: old_bks.clone(),
		new_peer_id: new_peer.clone(),
		new_rank: 0,
		prior: None,
	};
	let (new_session, outbound) =
		AddShareSession::new(new_config, Rng::from_seed([119; 32]), Box::new(NullStateListener));
	assert!(outbound.is_empty());
	sessions.insert(new_peer.clone(), new_session);

	let all_ids: Vec<PeerId> = old_peers.iter().cloned().chain(std::iter::once(new_peer.clone())).collect();

	let mut guard = 0;
	while let Some((to, envelope)) = pending.pop() {
		guard += 1;
		assert!(guard < 10_000, "ceremony did not converge");
		let sender = envelope.sender.clone();
		let recipients: Vec<PeerId> = match to {
			Some(peer) => vec![peer],
			None => all_ids.iter().filter(|id| **id != sender).cloned().collect(),
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

	for id in &all_ids {
		assert_eq!(sessions[id].state(), SessionState::Done);
	}

	let result_new = sessions[&new_peer].get_result().unwrap();
	assert_eq!(result_new.public_key, public_key);
	assert_eq!(result_new.bks.len(), 4);
	for peer in &old_peers {
		let result = sessions[peer].get_result().unwrap();
		assert_eq!(result.public_key, public_key);
		assert_eq!(result.bks[&new_peer], result_new.bks[&new_peer]);
	}
}

/// S4: a coordinator handing out inconsistent quorum views (one peer's
/// `config.bks` disagrees with the others') must be caught by the
/// round-0 quorum echo, not by some later crypto check — reshare fails
/// with `QuorumInconsistent` before any share is distributed.
#[test]
fn s4_reshare_rejects_a_quorum_the_peers_disagree_on() {
	let mut seed_rng = Rng::from_seed([4; 32]);
	let secret = Scalar::random(&mut seed_rng);
	let threshold = 3;
	let poly = Polynomial::random_with_constant_term(threshold, secret.clone(), &mut seed_rng);
	let public_key = Point::from_scalar(&secret);

	let peers: Vec<PeerId> = vec!["p1".into(), "p2".into(), "p3".into()];
	let agreed_bks: BTreeMap<PeerId, BK<Scalar>> = peers
		.iter()
		.enumerate()
		.map(|(i, p)| (p.clone(), BK::new(Scalar::from((i + 1) as u32), 0)))
		.collect();
	let shares: BTreeMap<PeerId, Scalar> =
		agreed_bks.iter().map(|(p, bk)| (p.clone(), poly.evaluate(&bk.x, bk.rank))).collect();
	let si_gs: BTreeMap<PeerId, Point> =
		shares.iter().map(|(p, s)| (p.clone(), Point::from_scalar(s))).collect();

	// p3's view of the quorum swaps in a BK for a phantom fourth member in
	// place of p1 — a stand-in for a coordinator telling p3 a different
	// story than it told p1 and p2.
	let mut skewed_bks = agreed_bks.clone();
	skewed_bks.remove("p1");
	skewed_bks.insert("p4".to_string(), BK::new(Scalar::from(4u32), 0));

	let mut sessions: BTreeMap<PeerId, ReshareSession<Point>> = BTreeMap::new();
	let mut pending: Vec<(Option<PeerId>, Envelope<ReshareData<Point>>)> = Vec::new();

	for (i, peer) in peers.iter().enumerate() {
		let bks_for_peer = if peer == "p3" { skewed_bks.clone() } else { agreed_bks.clone() };
		let config = SessionConfig {
			ceremony_id: 1,
			threshold,
			own_peer_id: peer.clone(),
			bks: bks_for_peer,
			prior: Some(PriorKeyMaterial {
				public_key,
				own_share: shares[peer].clone(),
				si_gs: si_gs.clone(),
			}),
		};
		let rng = Rng::from_seed([(130 + i) as u8; 32]);
		let (session, outbound) = ReshareSession::new(config, rng, Box::new(NullStateListener));
		for msg in outbound {
			let envelope = bincode::deserialize(&msg.payload).unwrap();
			pending.push((msg.to, envelope));
		}
		sessions.insert(peer.clone(), session);
	}

	let mut guard = 0;
	let mut saw_quorum_inconsistent = false;
	while let Some((to, envelope)) = pending.pop() {
		guard += 1;
		assert!(guard < 10_000, "ceremony did not converge");
		let sender = envelope.sender.clone();
		let recipients: Vec<PeerId> = match to {
			Some(peer) => vec![peer],
			None => peers.iter().filter(|id| **id != sender).cloned().collect(),
		};
		for recipient in recipients {
			// "p4" never runs a session of its own; a message addressed to
			// it (by p3, under its skewed view) has nowhere to be delivered.
			let Some(session) = sessions.get_mut(&recipient) else { continue };
			match session.handle_message(envelope.clone()) {
				Ok(outbound) =>
					for msg in outbound {
						let env = bincode::deserialize(&msg.payload).unwrap();
						pending.push((msg.to, env));
					},
				Err(CeremonyError::QuorumInconsistent(_)) => {
					saw_quorum_inconsistent = true;
				},
				Err(CeremonyError::PeerProtocol { .. }) => {
					// p3 doesn't list p1 among the peers it expects to hear
					// from under its own (skewed) view, so p1's broadcast
					// is rejected outright — an earlier, equally valid way
					// for this mismatch to surface before any cryptography
					// runs.
					saw_quorum_inconsistent = true;
				},
				Err(e) => panic!("unexpected failure: {e}"),
			}
		}
	}

	assert!(saw_quorum_inconsistent, "a skewed quorum view must be rejected, not silently accepted");
}

/// S5: tampering a round-2 MtA ciphertext (the sigma channel) must be
/// caught by its consistency proof and attributed to the tampering peer,
/// not silently accepted into a signature that later fails to verify.
#[test]
fn s5_tampered_mta_ciphertext_fails_with_peer_attribution() {
	let mut seed_rng = Rng::from_seed([5; 32]);
	let secret = Scalar::random(&mut seed_rng);
	let threshold = 3;
	let poly = Polynomial::random_with_constant_term(threshold, secret.clone(), &mut seed_rng);
	let public_key = Point::from_scalar(&secret);
	let msg_hash = Scalar::random(&mut seed_rng);

	let peers: Vec<PeerId> = vec!["p1".into(), "p2".into(), "p3".into()];
	let bks: BTreeMap<PeerId, BK<Scalar>> = peers
		.iter()
		.enumerate()
		.map(|(i, p)| (p.clone(), BK::new(Scalar::from((i + 1) as u32), 0)))
		.collect();
	let shares: BTreeMap<PeerId, Scalar> =
		bks.iter().map(|(p, bk)| (p.clone(), poly.evaluate(&bk.x, bk.rank))).collect();
	let si_gs: BTreeMap<PeerId, Point> =
		shares.iter().map(|(p, s)| (p.clone(), Point::from_scalar(s))).collect();

	let mut sessions: BTreeMap<PeerId, SignerSession<Point>> = BTreeMap::new();
	let mut pending: Vec<(Option<PeerId>, Envelope<SignerData<Point>>)> = Vec::new();
	let mut he_pubkeys: BTreeMap<PeerId, threshold_ecdsa::homomorphic::PaillierPublicKey> = BTreeMap::new();

	for (i, peer) in peers.iter().enumerate() {
		let config = SessionConfig {
			ceremony_id: 1,
			threshold,
			own_peer_id: peer.clone(),
			bks: bks.clone(),
			prior: Some(PriorKeyMaterial {
				public_key,
				own_share: shares[peer].clone(),
				si_gs: si_gs.clone(),
			}),
		};
		let rng = Rng::from_seed([(150 + i) as u8; 32]);
		let (session, outbound) =
			SignerSession::new(config, msg_hash.clone(), rng, Box::new(NullStateListener));
		for msg in &outbound {
			let envelope: Envelope<SignerData<Point>> = bincode::deserialize(&msg.payload).unwrap();
			if let SignerData::PubKey0(pk0) = &envelope.data {
				he_pubkeys.insert(peer.clone(), pk0.he_pubkey.clone());
			}
		}
		for msg in outbound {
			let envelope = bincode::deserialize(&msg.payload).unwrap();
			pending.push((msg.to, envelope));
		}
		sessions.insert(peer.clone(), session);
	}

	let tamper_from: PeerId = "p1".into();
	let tamper_to: PeerId = "p2".into();
	let mut tampered_once = false;
	let mut observed_failure: Option<CeremonyError> = None;

	let mut guard = 0;
	while let Some((to, mut envelope)) = pending.pop() {
		guard += 1;
		assert!(guard < 10_000, "ceremony did not converge");
		let sender = envelope.sender.clone();

		if !tampered_once
			&& sender == tamper_from
			&& to.as_deref() == Some(tamper_to.as_str())
		{
			if let SignerData::Mta2(ref mut msg) = envelope.data {
				let recipient_pk = &he_pubkeys[&tamper_to];
				let (blind, _) =
					PaillierScheme::encrypt(recipient_pk, &BigUint::from(1u32), &mut Rng::from_seed([200; 32]));
				msg.sigma_cipher = PaillierScheme::add(recipient_pk, &msg.sigma_cipher, &blind);
				tampered_once = true;
			}
		}

		let recipients: Vec<PeerId> = match to {
			Some(peer) => vec![peer],
			None => peers.iter().filter(|id| **id != sender).cloned().collect(),
		};
		for recipient in recipients {
			if observed_failure.is_some() {
				break
			}
			let session = sessions.get_mut(&recipient).expect("known peer");
			match session.handle_message(envelope.clone()) {
				Ok(outbound) =>
					for msg in outbound {
						let env = bincode::deserialize(&msg.payload).unwrap();
						pending.push((msg.to, env));
					},
				Err(e) => observed_failure = Some(e),
			}
		}
		if observed_failure.is_some() {
			break
		}
	}

	let failure = observed_failure.expect("tampered ciphertext must be rejected");
	assert!(matches!(failure, CeremonyError::CryptoVerifyFailure(..)));
	assert_eq!(failure.attributed_peer(), Some(&tamper_from));
	assert_eq!(sessions[&tamper_to].state(), SessionState::Failed);
}

/// Miller-Rabin primality test; not constant-time, fine for generating test
/// fixtures only.
fn is_probably_prime(n: &BigUint, rng: &mut Rng) -> bool {
	use num_traits::{One, Zero};
	if *n < BigUint::from(3u32) {
		return *n == BigUint::from(2u32)
	}
	if (n % 2u32).is_zero() {
		return false
	}
	let one = BigUint::one();
	let n_minus_one = n - &one;
	let mut d = n_minus_one.clone();
	let mut r = 0u32;
	while (&d % 2u32).is_zero() {
		d /= 2u32;
		r += 1;
	}
	'witness: for _ in 0..40 {
		let mut bytes = vec![0u8; n.bits().div_ceil(8) as usize];
		rng.fill_bytes(&mut bytes);
		let a = BigUint::from_bytes_be(&bytes) % (n - BigUint::from(3u32)) + BigUint::from(2u32);
		let mut x = a.modpow(&d, n);
		if x == one || x == n_minus_one {
			continue
		}
		for _ in 0..r - 1 {
			x = x.modpow(&BigUint::from(2u32), n);
			if x == n_minus_one {
				continue 'witness
			}
		}
		return false
	}
	true
}

fn generate_prime(bits: u64, rng: &mut Rng) -> BigUint {
	loop {
		let mut bytes = vec![0u8; (bits as usize).div_ceil(8)];
		rng.fill_bytes(&mut bytes);
		bytes[0] |= 0x80;
		*bytes.last_mut().unwrap() |= 1;
		let candidate = BigUint::from_bytes_be(&bytes);
		if is_probably_prime(&candidate, rng) {
			return candidate
		}
	}
}

fn factorization_fixture(
	rng: &mut Rng,
) -> (factorization::FactorizationStatement, factorization::FactorizationWitness) {
	let p = generate_prime(512, rng);
	let q = generate_prime(512, rng);
	let n = &p * &q;
	let secret = BigUint::from(777u64);
	let x = BigUint::from(5u64);
	let y = x.modpow(&secret, &n);
	(
		factorization::FactorizationStatement { n: n.clone(), x, y },
		factorization::FactorizationWitness { secret, p, q },
	)
}

/// S6: the factorization (hidden-order discrete-log) proof rejects a
/// statement whose `x`/`y` have been substituted for unrelated values, with
/// honest proofs still verifying, at the 1024-bit modulus size the
/// construction is meant to run at. `zkp::factorization`'s own unit tests
/// cover the same properties at a smaller size for speed.
#[test]
fn s6_factorization_proof_rejects_substituted_statement() {
	let mut rng = Rng::from_seed([6; 32]);
	let (statement, witness) = factorization_fixture(&mut rng);
	let proof = factorization::prove(&witness, &statement, &mut rng);
	assert!(factorization::verify(&statement, &proof));

	let (other_statement, _other_witness) = factorization_fixture(&mut rng);
	let mut swapped = statement.clone();
	swapped.x = other_statement.x.clone();
	assert!(!factorization::verify(&swapped, &proof));

	let mut swapped_y = statement.clone();
	swapped_y.y = swapped_y.n.clone();
	assert!(!factorization::verify(&swapped_y, &proof));
}
