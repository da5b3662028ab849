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

//! The error taxonomy (spec section 7): seven kinds, surfaced as tagged
//! values. Grounded on the teacher's `CeremonyFailureReason`
//! (`client/common/failure_reason.rs`), which pairs every failure with a
//! `.log()` call and, where possible, the misbehaving peer.

use thiserror::Error;

use crate::message::PeerId;

/// Per-kind log tag, following the teacher's
/// `KEYGEN_CEREMONY_FAILED`/`REQUEST_TO_SIGN_IGNORED`-style constants.
const TAG_INPUT_INVALID: &str = "ceremony.input_invalid";
const TAG_CRYPTO_VERIFY_FAILURE: &str = "ceremony.crypto_verify_failure";
const TAG_QUORUM_INCONSISTENT: &str = "ceremony.quorum_inconsistent";
const TAG_PEER_PROTOCOL: &str = "ceremony.peer_protocol";
const TAG_HOMOMORPHIC_FAILURE: &str = "ceremony.homomorphic_failure";
const TAG_INTERNAL: &str = "ceremony.internal";
const TAG_NOT_READY: &str = "ceremony.not_ready";

/// Wraps an optional peer attribution so its `Display` impl can be spliced
/// directly into a `thiserror` format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution(pub Option<PeerId>);

impl std::fmt::Display for Attribution {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.0 {
			Some(peer) => write!(f, " (attributed to {peer})"),
			None => Ok(()),
		}
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CeremonyError {
	#[error("input invalid: {0}")]
	InputInvalid(String),

	#[error("crypto verification failed{0}: {1}")]
	CryptoVerifyFailure(Attribution, String),

	#[error("quorum inconsistent: {0}")]
	QuorumInconsistent(String),

	#[error("peer protocol violation by {peer}: {reason}")]
	PeerProtocol { peer: PeerId, reason: String },

	#[error("homomorphic-encryption failure: {0}")]
	HomomorphicFailure(String),

	#[error("internal error: {0}")]
	Internal(String),

	#[error("GetResult called before the session reached Done")]
	NotReady,
}

impl CeremonyError {
	pub fn crypto_verify_failure(peer: Option<PeerId>, reason: impl Into<String>) -> Self {
		CeremonyError::CryptoVerifyFailure(Attribution(peer), reason.into())
	}
}

impl CeremonyError {
	/// The teacher's `CeremonyFailureReason::log` shape: a short tag plus
	/// the variant's `Display` message, at `tracing::warn!`.
	pub fn log(&self) {
		let tag = match self {
			CeremonyError::InputInvalid(_) => TAG_INPUT_INVALID,
			CeremonyError::CryptoVerifyFailure(..) => TAG_CRYPTO_VERIFY_FAILURE,
			CeremonyError::QuorumInconsistent(_) => TAG_QUORUM_INCONSISTENT,
			CeremonyError::PeerProtocol { .. } => TAG_PEER_PROTOCOL,
			CeremonyError::HomomorphicFailure(_) => TAG_HOMOMORPHIC_FAILURE,
			CeremonyError::Internal(_) => TAG_INTERNAL,
			CeremonyError::NotReady => TAG_NOT_READY,
		};
		tracing::warn!(tag, "{self}");
	}

	/// The peer this failure should be attributed to, if any (spec section
	/// 4.4: "surfaces it as VerifyFailure with a peer attribution when
	/// possible").
	pub fn attributed_peer(&self) -> Option<&PeerId> {
		match self {
			CeremonyError::CryptoVerifyFailure(Attribution(peer), _) => peer.as_ref(),
			CeremonyError::PeerProtocol { peer, .. } => Some(peer),
			_ => None,
		}
	}
}

impl From<crate::share::ShareError> for CeremonyError {
	fn from(e: crate::share::ShareError) -> Self {
		CeremonyError::QuorumInconsistent(e.to_string())
	}
}

impl From<crate::homomorphic::HeError> for CeremonyError {
	fn from(e: crate::homomorphic::HeError) -> Self {
		CeremonyError::HomomorphicFailure(e.to_string())
	}
}

impl From<crate::mta::MtaError> for CeremonyError {
	fn from(e: crate::mta::MtaError) -> Self {
		CeremonyError::HomomorphicFailure(e.to_string())
	}
}
