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

//! The opaque group abstraction (component G): identity, base point, point
//! addition, scalar multiplication, negation, encoding, equality, curve order.
//! Concrete curve arithmetic lives under [`crate::curves`]; this module only
//! defines the boundary the rest of the crate programs against.

use generic_array::{typenum::Unsigned, ArrayLength, GenericArray};
use std::fmt::Debug;
use zeroize::{DefaultIsZeroes, ZeroizeOnDrop};

/// Source of randomness threaded through the whole crate. We pin a concrete
/// generator (rather than `dyn RngCore`) so that its behaviour can't change
/// from under us between releases.
pub type Rng = rand::rngs::StdRng;

/// Upper bound on the size of a point and scalar in bytes, useful for
/// pre-sizing buffers; checked against concrete curves in their own tests.
pub const MAX_POINT_SIZE: usize = 33;
pub const MAX_SCALAR_SIZE: usize = 32;

/// A point on an elliptic curve, or its identity element.
pub trait ECPoint:
	Clone
	+ Copy
	+ Debug
	+ Default
	+ DefaultIsZeroes
	+ 'static
	+ serde::Serialize
	+ for<'de> serde::Deserialize<'de>
	+ std::ops::Mul<Self::Scalar, Output = Self>
	+ for<'a> std::ops::Mul<&'a Self::Scalar, Output = Self>
	+ std::ops::Sub<Output = Self>
	+ std::ops::Add<Output = Self>
	+ std::ops::Neg<Output = Self>
	+ std::iter::Sum
	+ PartialEq
	+ Ord
	+ Sync
	+ Send
{
	type Scalar: ECScalar;

	type CompressedPointLength: ArrayLength + Unsigned;

	/// The group's generator, `G`.
	fn base_point() -> Self;

	fn from_scalar(scalar: &Self::Scalar) -> Self;

	/// Compressed encoding: `0x02/0x03 || X` for secp256k1-family curves.
	fn as_bytes(&self) -> GenericArray<u8, Self::CompressedPointLength>;

	fn x_bytes(&self) -> [u8; 32];

	/// Reduce the affine x-coordinate mod the curve order `q`. Used to build
	/// `r` in ECDSA signatures (spec section 4.4 round 5).
	fn x_scalar_mod_q(&self) -> Self::Scalar;

	fn is_even_y(&self) -> bool;

	/// Reconstructs a point from its affine x-coordinate and the parity of
	/// its y-coordinate, i.e. decompression. Returns `None` if `x` is not
	/// the x-coordinate of any point on the curve. Used by ECDSA public-key
	/// recovery (spec section 6.6/10), the inverse of `is_even_y`/`x_bytes`.
	fn from_x_and_parity(x: &[u8; 32], is_even_y: bool) -> Option<Self>;

	fn point_at_infinity() -> Self;

	fn is_point_at_infinity(&self) -> bool {
		self == &Self::point_at_infinity()
	}
}

/// A scalar in `Z_q` for the curve's order `q`.
pub trait ECScalar:
	Clone
	+ Debug
	+ Sized
	+ Default
	+ serde::Serialize
	+ for<'de> serde::Deserialize<'de>
	+ for<'a> std::ops::Mul<&'a Self, Output = Self>
	+ for<'a> std::ops::Add<&'a Self, Output = Self>
	+ std::ops::Mul<Output = Self>
	+ std::ops::Add<Output = Self>
	+ std::ops::Sub<Output = Self>
	+ std::ops::Neg<Output = Self>
	+ std::iter::Sum
	+ zeroize::Zeroize
	+ PartialEq
	+ Ord
	+ Sync
	+ Send
	+ ZeroizeOnDrop
	+ std::convert::From<u32>
{
	fn random(rng: &mut Rng) -> Self;

	fn from_bytes_mod_order(x: &[u8; 32]) -> Self;

	fn to_bytes(&self) -> [u8; 32];

	/// The plain big-endian integer value, needed by the homomorphic layer
	/// (Paillier plaintexts are arbitrary-precision integers, not curve
	/// scalars) and by zero-knowledge proofs that range over `Z_q`.
	fn to_bigint(&self) -> num_bigint::BigUint;

	fn from_bigint(x: &num_bigint::BigUint) -> Self;

	fn zero() -> Self;

	fn one() -> Self;

	fn invert(&self) -> Option<Self>;

	/// The curve's order `q`, as a big integer. Constant per curve, but
	/// exposed as an instance method so it can be reached generically.
	fn curve_order() -> num_bigint::BigUint;
}
