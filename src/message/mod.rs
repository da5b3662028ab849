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

//! The message framework (component F, transport half): the [`PeerManager`]
//! and [`StateListener`] interfaces a host implements (spec sections 6.1,
//! 6.2), plus the per-peer mailbox a session uses to buffer inbound
//! messages that have arrived for a future round (spec section 4.4's
//! "a peer message arriving for a future round is buffered in the peer
//! slot, not dropped").

mod mailbox;
mod peer_manager;

pub use mailbox::{Mailbox, MailboxError};
pub use peer_manager::{PeerId, PeerManager};

/// States of a [`crate::ceremony`] session (spec section 2, section 6.2).
/// `StateListener::on_state_changed` fires exactly once per transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
	Init,
	Working,
	Done,
	Failed,
}

/// Consumed by the session (spec section 6.2): observes the session's
/// `{Init -> Working -> Done | Failed}` lifecycle.
pub trait StateListener: Send {
	fn on_state_changed(&mut self, old: SessionState, new: SessionState);
}

/// A listener that does nothing; used as the default when the application
/// doesn't need to observe the ceremony lifecycle.
#[derive(Default)]
pub struct NullStateListener;

impl StateListener for NullStateListener {
	fn on_state_changed(&mut self, _old: SessionState, _new: SessionState) {}
}

/// A message a session wants delivered. `to: None` means broadcast to
/// every other peer in the quorum; `to: Some(peer)` is a private unicast
/// (e.g. DKG round 3's per-recipient shares).
#[derive(Debug, Clone)]
pub struct OutboundMessage {
	pub to: Option<PeerId>,
	pub payload: Vec<u8>,
}

/// A session's outer wire envelope (spec section 6.5): `{ ceremony_id,
/// round, sender, data }`. `round` lets a receiver buffer a payload that
/// arrived early without inspecting `data`'s concrete variant. Message
/// types within a session are ordered monotonically and new ones must only
/// be appended (spec section 6.5's backward-compatibility clause).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(bound = "D: serde::Serialize + for<'d> serde::Deserialize<'d>")]
pub struct Envelope<D> {
	pub ceremony_id: u64,
	pub round: u32,
	pub sender: PeerId,
	pub data: D,
}

/// Dispatches `messages` over `peer_manager`, expanding broadcasts to every
/// peer in `others`.
pub fn dispatch(
	peer_manager: &dyn PeerManager,
	others: &[PeerId],
	messages: Vec<OutboundMessage>,
) {
	for message in messages {
		match message.to {
			Some(peer) => peer_manager.must_send(&peer, message.payload),
			None =>
				for peer in others {
					peer_manager.must_send(peer, message.payload.clone());
				},
		}
	}
}
