//! A GG18-family threshold-ECDSA cryptosystem: distributed key generation,
//! interactive signing, reshare, and add-share, built on a Birkhoff
//! interpolation share layer so that classic Shamir quorums and
//! rank-weighted hierarchical quorums are the same code path.
//!
//! The crate is organized bottom-up: [`group`]/[`curves`] define the elliptic
//! curve boundary, [`share`] the secret-sharing math, [`homomorphic`]/[`zkp`]
//! the cryptographic primitives the protocols compose, [`mta`] the
//! multiplicative-to-additive engine shared by signing, and [`message`]/
//! [`ceremony`] the transport and state-machine scaffolding that [`dkg`],
//! [`signer`], [`reshare`], and [`addshare`] each build their own session
//! type on top of.

pub mod group;

pub mod curves;

pub mod share;

pub mod homomorphic;

pub mod zkp;

pub mod mta;

pub mod message;

pub mod ceremony;

pub mod config;

pub mod result;

pub mod dkg;

pub mod signer;

pub mod reshare;

pub mod addshare;
