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

//! The homomorphic-encryption interface (component H): an opaque additively
//! homomorphic public-key scheme, consumed but not implemented by the core
//! protocol logic. [`paillier_scheme`] provides a concrete Paillier-backed
//! implementation so the crate is runnable end to end.

mod paillier_scheme;
mod scheme;

pub use paillier_scheme::{PaillierCiphertext, PaillierPublicKey, PaillierScheme, PlaintextKnowledgeProof};
pub use scheme::{HeError, HomomorphicScheme};
