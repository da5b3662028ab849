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

//! The only concrete curve this crate ships: secp256k1, the curve every
//! boundary scenario in the test suite signs over. Other curves named by the
//! group interface (P-256, P-384, Ristretto255) can be added by implementing
//! [`ECPoint`]/[`ECScalar`] the same way; the share layer and ceremony
//! machinery are generic over the trait, not this module.

mod helpers;

use crate::group::{ECPoint, ECScalar, Rng};
use num_bigint::BigUint;
use secp256k1::constants::{CURVE_ORDER, SECRET_KEY_SIZE};
use serde::{Deserialize, Serialize};

type SK = secp256k1::SecretKey;
type PK = secp256k1::PublicKey;

// Wrapped in `Option` so a "zero" scalar (identity under addition) doesn't
// need a sentinel value inside `secp256k1::SecretKey`, which rejects zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scalar(Option<SK>);

// `None` represents the point at infinity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point(Option<PK>);

const GENERATOR_COMPRESSED: [u8; 33] = [
	0x02, 0x79, 0xBE, 0x66, 0x7E, 0xF9, 0xDC, 0xBB, 0xAC, 0x55, 0xA0, 0x62, 0x95, 0xCE, 0x87, 0x0B,
	0x07, 0x02, 0x9B, 0xFC, 0xDB, 0x2D, 0xCE, 0x28, 0xD9, 0x59, 0xF2, 0x81, 0x5B, 0x16, 0xF8, 0x17,
	0x98,
];

lazy_static::lazy_static! {
	static ref GENERATOR: Point = Point(Some(PK::from_slice(&GENERATOR_COMPRESSED).unwrap()));
	static ref GROUP_ORDER_BIG_UINT: BigUint = BigUint::from_bytes_be(&CURVE_ORDER);
}

mod point_impls {

	use super::*;

	const POINT_AT_INFINITY_COMPRESSED: [u8; 33] = [0; 33];

	derive_point_impls!(Point, Scalar);

	impl<B: std::borrow::Borrow<Scalar>> std::ops::Mul<B> for Point {
		type Output = Self;

		fn mul(self, scalar: B) -> Self::Output {
			let inner = match (self.0, scalar.borrow().0) {
				(None, _) | (_, None) => {
					// Multiplication by 0 yields the point at infinity.
					None
				},
				(Some(point), Some(scalar)) => Some(
					point
						.mul_tweak(secp256k1::SECP256K1, &scalar.into())
						.expect("scalar must be valid and non-zero"),
				),
			};

			Point(inner)
		}
	}

	impl std::ops::Add for Point {
		type Output = Self;

		fn add(self, rhs: Self) -> Self::Output {
			let inner = match (self.0, rhs.0) {
				(None, rhs) => rhs,
				(lhs, None) => lhs,
				(Some(lhs), Some(rhs)) => {
					// Can only fail if the result is the point at infinity, which we
					// represent with `None`.
					lhs.combine(&rhs).ok()
				},
			};
			Point(inner)
		}
	}

	impl std::ops::Neg for Point {
		type Output = Self;

		fn neg(self) -> Self::Output {
			Point(self.0.map(|p| p.negate(secp256k1::SECP256K1)))
		}
	}

	impl std::ops::Sub for Point {
		type Output = Self;

		// Addition by design: we negate the right operand first.
		#[allow(clippy::suspicious_arithmetic_impl)]
		fn sub(self, rhs: Self) -> Self::Output {
			self + (-rhs)
		}
	}

	impl ECPoint for Point {
		type Scalar = Scalar;
		type CompressedPointLength = typenum::U33;

		fn base_point() -> Self {
			*Self::generator()
		}

		fn from_scalar(scalar: &Self::Scalar) -> Self {
			*Self::generator() * scalar
		}

		// Depends on the signing scheme whether parity should be encoded in the
		// wire format; here we always expose the full compressed point and let
		// callers that need the bare x-coordinate use `x_bytes`.
		fn as_bytes(&self) -> generic_array::GenericArray<u8, Self::CompressedPointLength> {
			match self.0 {
				Some(pk) => pk.serialize(),
				None => POINT_AT_INFINITY_COMPRESSED,
			}
			.into()
		}

		fn x_bytes(&self) -> [u8; 32] {
			let mut result: [u8; 32] = Default::default();
			result.copy_from_slice(self.as_bytes()[1..33].as_ref());
			result
		}

		fn x_scalar_mod_q(&self) -> Self::Scalar {
			Scalar::from_bytes_mod_order(&self.x_bytes())
		}

		fn is_even_y(&self) -> bool {
			self.as_bytes()[0] == 2
		}

		fn from_x_and_parity(x: &[u8; 32], is_even_y: bool) -> Option<Self> {
			let mut compressed = [0u8; 33];
			compressed[0] = if is_even_y { 2 } else { 3 };
			compressed[1..].copy_from_slice(x);
			PK::from_slice(&compressed).ok().map(|pk| Point(Some(pk)))
		}

		fn point_at_infinity() -> Self {
			Point(None)
		}
	}

	impl Serialize for Point {
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: serde::Serializer,
		{
			let bytes = self.as_bytes();
			let bytes_ref: &[u8; 33] = bytes.as_ref();

			use serde::ser::SerializeTuple;
			let mut tup = serializer.serialize_tuple(33)?;
			for byte in bytes_ref {
				tup.serialize_element(byte)?;
			}
			tup.end()
		}
	}

	impl<'de> Deserialize<'de> for Point {
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: serde::Deserializer<'de>,
		{
			let bytes =
				deserializer.deserialize_tuple(33, helpers::ArrayVisitor::<[u8; 33]>::new())?;

			if bytes == POINT_AT_INFINITY_COMPRESSED {
				Ok(Point::point_at_infinity())
			} else {
				PK::from_slice(&bytes)
					.map(|pk| Point(Some(pk)))
					.map_err(serde::de::Error::custom)
			}
		}
	}

	impl Point {
		fn generator() -> &'static Point {
			&GENERATOR
		}

		pub fn get_element(&self) -> secp256k1::PublicKey {
			// Public only because the result type (`crate::result::Signature`) needs
			// the underlying library type to recover an address; not reachable on
			// values a remote party controls without first passing curve validation.
			self.0.expect("unexpected point at infinity")
		}

		pub fn random(rng: &mut Rng) -> Self {
			Point::from_scalar(&Scalar::random(rng))
		}
	}
}

mod scalar_impls {

	use super::*;

	derive_scalar_impls!(Scalar);

	impl Scalar {
		/// Expects `x` to already be within the group, i.e. smaller than `q`.
		fn from_reduced_bigint(x: &BigUint) -> Self {
			use num_traits::identities::Zero;

			assert!(x < &GROUP_ORDER_BIG_UINT, "x not within the group");

			if x.is_zero() {
				Scalar(None)
			} else {
				let x_bytes = x.to_bytes_be();
				let mut array = [0u8; SECRET_KEY_SIZE];
				array[SECRET_KEY_SIZE - x_bytes.len()..].copy_from_slice(&x_bytes);

				// Safe: `x` is within the group and `array` is correctly sized.
				Scalar(Some(SK::from_slice(&array).unwrap()))
			}
		}

		pub fn as_bytes(&self) -> &[u8; SECRET_KEY_SIZE] {
			match self.0.as_ref() {
				Some(sk) => sk.as_ref(),
				None => &ZERO_SCALAR_BYTES,
			}
		}
	}

	impl Ord for Scalar {
		fn cmp(&self, other: &Self) -> std::cmp::Ordering {
			self.as_bytes().cmp(other.as_bytes())
		}
	}

	impl PartialOrd for Scalar {
		fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
			Some(self.cmp(other))
		}
	}

	impl std::ops::Neg for Scalar {
		type Output = Scalar;

		fn neg(self) -> Self::Output {
			Scalar::zero() - self
		}
	}

	impl ECScalar for Scalar {
		fn random(rng: &mut Rng) -> Self {
			let sk = SK::new(rng);
			// Guaranteed non-zero by `SK::new`.
			Scalar(Some(sk))
		}

		fn from_bytes_mod_order(x: &[u8; 32]) -> Self {
			let x = {
				let mut x = BigUint::from_bytes_be(x);

				// `x` is only 32 bytes, so it is smaller than twice the group's
				// order; a single subtraction suffices.
				if x >= *GROUP_ORDER_BIG_UINT {
					x -= &*GROUP_ORDER_BIG_UINT;
				}
				x
			};

			Self::from_reduced_bigint(&x)
		}

		fn to_bytes(&self) -> [u8; 32] {
			*self.as_bytes()
		}

		fn to_bigint(&self) -> BigUint {
			BigUint::from_bytes_be(self.as_bytes())
		}

		fn from_bigint(x: &BigUint) -> Self {
			// `x` may be arbitrarily large (MtA's unreduced products are
			// ~512 bits); reduce the whole integer mod q before converting,
			// rather than truncating to the low 32 bytes first.
			Self::from_reduced_bigint(&(x % Self::curve_order()))
		}

		fn zero() -> Self {
			Scalar(None)
		}

		fn one() -> Self {
			Scalar::from(1u32)
		}

		// Not constant-time; only called on public values (BK coordinates, the
		// Birkhoff coefficient solve).
		fn invert(&self) -> Option<Self> {
			self.0.map(|x| {
				let x = BigUint::from_bytes_be(x.as_ref());
				let order = BigUint::from_bytes_be(&CURVE_ORDER);

				// Fermat's little theorem: x^(order - 2) mod order is the inverse
				// since `order` is prime.
				let inverse = x.modpow(&(&order - 2u32), &order);

				Self::from_reduced_bigint(&inverse)
			})
		}

		fn curve_order() -> BigUint {
			GROUP_ORDER_BIG_UINT.clone()
		}
	}

	impl zeroize::Zeroize for Scalar {
		fn zeroize(&mut self) {
			use core::sync::atomic;
			unsafe { std::ptr::write_volatile(self, Scalar::zero()) };
			atomic::compiler_fence(atomic::Ordering::SeqCst);
		}
	}

	impl From<u32> for Scalar {
		fn from(x: u32) -> Self {
			if x == 0 {
				Scalar(None)
			} else {
				let mut array = [0u8; 32];
				array[28..].copy_from_slice(&x.to_be_bytes());

				// `x` is a u32, so it's within the curve order by construction.
				Scalar(Some(SK::from_slice(&array).unwrap()))
			}
		}
	}

	impl std::ops::Sub for &Scalar {
		type Output = Scalar;

		#[allow(clippy::suspicious_arithmetic_impl)]
		fn sub(self, rhs: Self) -> Self::Output {
			match rhs.0 {
				None => self.clone(),
				Some(x) => self + &Scalar(Some(x.negate())),
			}
		}
	}

	impl std::ops::Mul for &Scalar {
		type Output = Scalar;

		fn mul(self, rhs: Self) -> Self::Output {
			let inner = match (self.0, rhs.0) {
				(None, _) | (_, None) => None,
				(Some(lhs), Some(rhs)) =>
					Some(lhs.mul_tweak(&rhs.into()).expect("operands are valid")),
			};
			Scalar(inner)
		}
	}

	impl std::ops::Add for &Scalar {
		type Output = Scalar;

		fn add(self, rhs: Self) -> Self::Output {
			let inner = match (self.0, rhs.0) {
				(None, rhs) => rhs,
				(lhs, None) => lhs,
				(Some(lhs), Some(rhs)) => lhs.add_tweak(&rhs.into()).ok(),
			};

			Scalar(inner)
		}
	}

	const ZERO_SCALAR_BYTES: [u8; 32] = [0; 32];

	impl Serialize for Scalar {
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: serde::Serializer,
		{
			let bytes = self.0.as_ref().map(|x| x.as_ref()).unwrap_or(&ZERO_SCALAR_BYTES);

			use serde::ser::SerializeTuple;
			let mut tup = serializer.serialize_tuple(32)?;
			for byte in bytes {
				tup.serialize_element(byte)?;
			}
			tup.end()
		}
	}

	impl<'de> Deserialize<'de> for Scalar {
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: serde::Deserializer<'de>,
		{
			let mut bytes: [u8; 32] = [0; 32];
			<[u8; 32]>::deserialize_in_place(deserializer, &mut bytes)?;

			if bytes == ZERO_SCALAR_BYTES {
				Ok(Scalar::zero())
			} else {
				SK::from_slice(&bytes).map(|x| Scalar(Some(x))).map_err(serde::de::Error::custom)
			}
		}
	}

	#[cfg(test)]
	impl Scalar {
		pub fn from_hex(sk_hex: &str) -> Self {
			let bytes = hex::decode(sk_hex).expect("input must be hex encoded");
			Scalar(Some(SK::from_slice(&bytes).expect("invalid scalar")))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;

	#[test]
	fn ensure_serialization_is_consistent() {
		let mut rng = Rng::from_seed([0; 32]);

		let scalar = Scalar::random(&mut rng);

		let scalar_bytes = bincode::serialize(&scalar).unwrap();
		let scalar_recovered: Scalar = bincode::deserialize(&scalar_bytes).unwrap();
		assert_eq!(scalar, scalar_recovered);

		let point = Point::from_scalar(&scalar);
		let point_bytes = bincode::serialize(&point).unwrap();
		let point_recovered: Point = bincode::deserialize(&point_bytes).unwrap();
		assert_eq!(point, point_recovered);
	}

	#[test]
	fn negation_is_the_additive_inverse() {
		let mut rng = Rng::from_seed([1; 32]);
		let p = Point::random(&mut rng);
		assert_eq!(p + (-p), Point::point_at_infinity());
	}

	#[test]
	fn scalar_invert_round_trips() {
		let mut rng = Rng::from_seed([2; 32]);
		let s = Scalar::random(&mut rng);
		let inv = s.clone().invert().unwrap();
		assert_eq!(s * inv, Scalar::one());
	}

	#[test]
	fn x_scalar_mod_q_matches_point_x_bytes_reduced() {
		let mut rng = Rng::from_seed([3; 32]);
		let p = Point::random(&mut rng);
		let reduced = Scalar::from_bytes_mod_order(&p.x_bytes());
		assert_eq!(p.x_scalar_mod_q(), reduced);
	}

	/// `from_bigint` must reduce the whole integer mod `q`, not just its low
	/// 32 bytes (MtA's intermediate values are ~512 bits: `a*b + beta'`
	/// where `beta'` is sampled up to `q << 256`).
	#[test]
	fn from_bigint_reduces_values_far_larger_than_256_bits() {
		let q = Scalar::curve_order();

		// `x = 3*q + 7`, comfortably over 256 bits for any prime-order curve.
		let x = &q * BigUint::from(3u32) + BigUint::from(7u32);
		assert_eq!(Scalar::from_bigint(&x), Scalar::from(7u32));

		// A ~512-bit value built the way MtA does: `a*b + beta'` with `beta'`
		// itself close to `q << 256`.
		let a = BigUint::from(50u32);
		let b = BigUint::from(40u32);
		let beta_prime = (&q << 200usize) + BigUint::from(123_456_789u64);
		let unreduced = &a * &b + &beta_prime;
		let expected = Scalar::from_bigint(&(&unreduced % &q));
		assert_eq!(Scalar::from_bigint(&unreduced), expected);
		assert_ne!(
			Scalar::from_bigint(&unreduced),
			Scalar::from_bytes_mod_order(&{
				let bytes = unreduced.to_bytes_be();
				let mut truncated = [0u8; 32];
				let len = bytes.len().min(32);
				truncated[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
				truncated
			}),
			"from_bigint must not match the old low-32-byte-then-reduce behaviour"
		);
	}
}
