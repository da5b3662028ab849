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

//! The secret-sharing layer (component S): Birkhoff interpolation over
//! `Z_q`, the numerical heart shared by DKG, signing, reshare and add-share.

mod birkhoff;
mod polynomial;

pub use birkhoff::{
	add_share_coefficient, compute_coefficients, evaluate_coefficients_at, validate_public_key,
	ShareError, BK,
};
pub use polynomial::{verify_share, Polynomial};
