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

//! The ceremony state-machine half of the message framework (component F).
//! [`crate::dkg`], [`crate::signer`], [`crate::reshare`] and
//! [`crate::addshare`] each define their own tagged-enum stage machine
//! (spec section 9's redesign note: "a tagged enum plus one transition
//! function per round is preferred" over subtype polymorphism) built on
//! the shared pieces here: the error taxonomy, and the broadcast-echo
//! consistency check (spec section 13 / the teacher's
//! `client/utils.rs::find_frequent_element` and
//! `threshold_for_broadcast_verification`).

pub mod error;

pub use error::CeremonyError;

use itertools::Itertools;

/// The threshold of identical echoes required to accept a broadcast value
/// as agreed-upon (spec section 13): more than half the quorum, so that a
/// disagreement can only arise from a minority of malicious senders.
pub fn threshold_for_broadcast_verification(quorum_size: usize) -> usize {
	quorum_size / 2
}

/// Returns the element that appears more than `threshold` times in `iter`,
/// if any — used to find the majority value of an echoed broadcast (spec
/// section 13's "a joint check proving the ... aggregate is consistent").
pub fn find_frequent_element<T, Iter>(iter: Iter, threshold: usize) -> Option<T>
where
	T: Clone + Ord,
	Iter: Iterator<Item = T>,
{
	iter.sorted_unstable()
		.group_by(|x| x.clone())
		.into_iter()
		.map(|(key, group)| (key, group.count()))
		.find(|(_, count)| *count > threshold)
		.map(|(x, _)| x)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn threshold_is_half_rounding_down() {
		assert_eq!(threshold_for_broadcast_verification(1), 0);
		assert_eq!(threshold_for_broadcast_verification(3), 1);
		assert_eq!(threshold_for_broadcast_verification(100), 50);
	}

	#[test]
	fn finds_majority_element() {
		assert_eq!(find_frequent_element([1, 2, 3, 2, 3, 3].into_iter(), 2), Some(3));
		assert_eq!(find_frequent_element([1, 2, 3, 2, 3, 3].into_iter(), 3), None);
		assert_eq!(find_frequent_element::<u32, _>([].into_iter(), 3), None);
	}
}
