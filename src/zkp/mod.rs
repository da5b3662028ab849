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

//! The zero-knowledge proof library (component Z): Schnorr proofs of
//! knowledge, hash commitments, a consistency-of-two-commitments proof, an
//! integer-factorization (hidden-order group) discrete-log proof, and the
//! Paillier/curve consistency proof used by the MtA engine.

pub mod commitment;
pub mod consistency;
pub mod factorization;
pub mod homomorphic_proofs;
pub mod schnorr;
