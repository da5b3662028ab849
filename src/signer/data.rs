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

//! Signer wire data (spec section 4.4), one variant per round, following
//! the same shape as [`crate::dkg::data`]. New variants must only be
//! appended (spec section 6.5).

use serde::{Deserialize, Serialize};

use crate::{
	group::ECPoint,
	homomorphic::{PaillierCiphertext, PaillierPublicKey, PlaintextKnowledgeProof},
	zkp::{
		commitment::{Commitment, Salt},
		consistency::ConsistencyProof,
		homomorphic_proofs::MtaConsistencyProof,
		schnorr::SchnorrProof,
	},
};

/// Round 0 (`PubKey`): a peer's homomorphic public key and a hash
/// commitment to `a_i . G` (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PubKey0 {
	pub he_pubkey: PaillierPublicKey,
	pub comm_ai_g: Commitment,
}

/// Round 1 (`EncK`): the peer's encrypted nonce share (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncK1 {
	pub enc_k: PaillierCiphertext,
	pub proof: PlaintextKnowledgeProof,
}

/// Round 2 (`MtA`): this sender's response to one specific recipient's
/// encrypted nonce, for both the gamma (`a_i`) and sigma (`w_i`)
/// conversions (private, unicast per recipient).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Mta2<P: ECPoint> {
	pub combined_gamma: PaillierCiphertext,
	pub combined_sigma: PaillierCiphertext,
	/// Fresh encryption of this sender's `a_i` under the recipient's key,
	/// plus a proof it matches `a_i . G` once that's decommitted at round 4.
	pub gamma_cipher: PaillierCiphertext,
	pub gamma_proof: MtaConsistencyProof<P>,
	/// Fresh encryption of this sender's `w_i` under the recipient's key,
	/// plus a proof it matches the already-public `w_i . G`.
	pub sigma_cipher: PaillierCiphertext,
	pub sigma_proof: MtaConsistencyProof<P>,
}

/// Round 3 (`Delta`): this peer's share of `k . gamma` (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Delta3<P: ECPoint> {
	pub delta_i: P::Scalar,
}

/// Round 4 (`ProofAi`): decommits `a_i . G` and proves knowledge of `a_i`
/// (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ProofAi4<P: ECPoint> {
	pub ai_g: P,
	pub salt: Salt,
	pub proof: SchnorrProof<P>,
}

/// Round 5 (`CommitViAi`): hash commitments to `V_i` and `A_i` (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitViAi5 {
	pub comm_v: Commitment,
	pub comm_a: Commitment,
}

/// Round 6 (`DecommitViAi`): the decommitment of `V_i := sigma_i.R + l_i.G`
/// and `A_i := rho_i.G`, with `l_i` revealed in the clear. The proof that
/// `rho_i` behind `A_i` is the same one used to form `U_i` is deferred to
/// round 8, once `V` and the public key are both known (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DecommitViAi6<P: ECPoint> {
	pub v_i: P,
	pub a_i: P,
	pub l_i: P::Scalar,
	pub salt_v: Salt,
	pub salt_a: Salt,
}

/// Round 7 (`CommitUiTi`): hash commitments to `U_i` and `T_i` (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitUiTi7 {
	pub comm_u: Commitment,
	pub comm_t: Commitment,
}

/// Round 8 (`DecommitUiTi`): the decommitment plus a consistency proof
/// binding `U_i`/`T_i` to the shared `rho_i` (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DecommitUiTi8<P: ECPoint> {
	pub u_i: P,
	pub t_i: P,
	pub salt_u: Salt,
	pub salt_t: Salt,
	pub consistency_proof: ConsistencyProof<P>,
}

/// Round 9 (`Si`): this peer's share of the ECDSA signature scalar
/// (broadcast).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Si9<P: ECPoint> {
	pub s_i: P::Scalar,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum SignerData<P: ECPoint> {
	PubKey0(PubKey0),
	#[serde(bound = "")]
	EncK1(EncK1),
	#[serde(bound = "")]
	Mta2(Mta2<P>),
	#[serde(bound = "")]
	Delta3(Delta3<P>),
	#[serde(bound = "")]
	ProofAi4(ProofAi4<P>),
	CommitViAi5(CommitViAi5),
	#[serde(bound = "")]
	DecommitViAi6(DecommitViAi6<P>),
	CommitUiTi7(CommitUiTi7),
	#[serde(bound = "")]
	DecommitUiTi8(DecommitUiTi8<P>),
	#[serde(bound = "")]
	Si9(Si9<P>),
}

impl<P: ECPoint> SignerData<P> {
	/// The round index this variant belongs to (spec section 6.5's
	/// monotonically ordered message types).
	pub fn round(&self) -> u32 {
		match self {
			SignerData::PubKey0(_) => 0,
			SignerData::EncK1(_) => 1,
			SignerData::Mta2(_) => 2,
			SignerData::Delta3(_) => 3,
			SignerData::ProofAi4(_) => 4,
			SignerData::CommitViAi5(_) => 5,
			SignerData::DecommitViAi6(_) => 6,
			SignerData::CommitUiTi7(_) => 7,
			SignerData::DecommitUiTi8(_) => 8,
			SignerData::Si9(_) => 9,
		}
	}
}
