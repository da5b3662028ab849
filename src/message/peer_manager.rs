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

//! The `PeerManager` interface consumed by every session (spec section
//! 6.1). The core never touches a network socket; a host wires up
//! `PeerManager` over whatever transport it runs (libp2p, a test harness in
//! a single process, ...) and the ceremony machinery only ever calls
//! `must_send`.

use std::collections::BTreeSet;

/// Opaque peer identity. The core treats peer ids as opaque, totally
/// ordered strings; `BK::x` is a separate, protocol-level identity that a
/// `PeerManager` id maps to via the session's [`crate::config::SessionConfig`].
pub type PeerId = String;

#[cfg_attr(feature = "test", mockall::automock)]
pub trait PeerManager: Send + Sync {
	fn self_id(&self) -> PeerId;

	fn peer_ids(&self) -> BTreeSet<PeerId>;

	fn num_peers(&self) -> usize {
		self.peer_ids().len()
	}

	/// Fire-and-forget reliable unicast (spec section 6.1): at-least-once
	/// delivery, no reordering guarantee across peers. The core treats this
	/// as infallible (spec section 7's "the core treats send as infallible").
	fn must_send(&self, peer: &PeerId, message: Vec<u8>);
}
