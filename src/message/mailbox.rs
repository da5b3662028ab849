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

//! Per-peer, per-round message buffer (spec section 3's "Peer slot": "at
//! most one payload per round"; spec section 4.4's state machine contract:
//! "A peer message arriving for a future round is buffered in the peer
//! slot, not dropped... a message arriving for a past round is discarded...
//! Duplicate payloads per (peer, round) are rejected").
//!
//! Rounds are identified by a caller-assigned `u32` tag (a session's stage
//! index); the mailbox itself is agnostic to what a round means.

use std::collections::BTreeMap;

use crate::message::PeerId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MailboxError {
	#[error("duplicate payload from {peer} for round {round}")]
	Duplicate { peer: PeerId, round: u32 },
}

/// Buffers payloads of type `M` per `(round, peer)`. Owned by a
/// [`crate::ceremony::Session`]; garbage-collected at session end (spec
/// section 3's peer-slot lifecycle) simply by dropping the mailbox.
#[derive(Default)]
pub struct Mailbox<M> {
	buffered: BTreeMap<(u32, PeerId), M>,
}

impl<M> Mailbox<M> {
	pub fn new() -> Self {
		Mailbox { buffered: BTreeMap::new() }
	}

	/// Stores `payload` from `peer` for `round`, unless it arrived for a
	/// round already passed (silently discarded, per spec) or a payload
	/// from this peer for this round was already stored (rejected).
	///
	/// Returns `Ok(true)` if the payload was buffered, `Ok(false)` if it was
	/// silently discarded as stale.
	pub fn store(
		&mut self,
		current_round: u32,
		round: u32,
		peer: PeerId,
		payload: M,
	) -> Result<bool, MailboxError> {
		if round < current_round {
			return Ok(false)
		}
		if self.buffered.contains_key(&(round, peer.clone())) {
			return Err(MailboxError::Duplicate { peer, round })
		}
		self.buffered.insert((round, peer), payload);
		Ok(true)
	}

	/// If every id in `expected` has a buffered payload for `round`, removes
	/// and returns them all (in the order of `expected`); otherwise leaves
	/// the mailbox untouched and returns `None`.
	pub fn take_ready(
		&mut self,
		round: u32,
		expected: &[PeerId],
	) -> Option<Vec<(PeerId, M)>> {
		if !expected.iter().all(|peer| self.buffered.contains_key(&(round, peer.clone()))) {
			return None
		}
		Some(
			expected
				.iter()
				.map(|peer| {
					let payload = self.buffered.remove(&(round, peer.clone())).expect("checked above");
					(peer.clone(), payload)
				})
				.collect(),
		)
	}

	/// Peers we are still waiting on for `round`.
	pub fn awaited(&self, round: u32, expected: &[PeerId]) -> Vec<PeerId> {
		expected
			.iter()
			.filter(|peer| !self.buffered.contains_key(&(round, (*peer).clone())))
			.cloned()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn buffers_future_round_and_becomes_ready() {
		let mut mailbox: Mailbox<u8> = Mailbox::new();
		let peers = vec!["a".to_string(), "b".to_string()];

		assert!(mailbox.store(0, 1, "a".to_string(), 1).unwrap());
		assert!(mailbox.take_ready(0, &peers).is_none());
		assert!(mailbox.store(0, 1, "b".to_string(), 2).unwrap());
		assert!(mailbox.take_ready(0, &peers).is_none());

		let ready = mailbox.take_ready(1, &peers).unwrap();
		assert_eq!(ready, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
	}

	#[test]
	fn discards_stale_round() {
		let mut mailbox: Mailbox<u8> = Mailbox::new();
		assert!(!mailbox.store(2, 0, "a".to_string(), 9).unwrap());
	}

	#[test]
	fn rejects_duplicate_payload() {
		let mut mailbox: Mailbox<u8> = Mailbox::new();
		mailbox.store(0, 0, "a".to_string(), 1).unwrap();
		assert_eq!(
			mailbox.store(0, 0, "a".to_string(), 2),
			Err(MailboxError::Duplicate { peer: "a".to_string(), round: 0 })
		);
	}
}
