//! Client-side protocol engine for Lattice hardware wallets.
//!
//! A Lattice device exposes its operations over an HTTP bridge; every
//! exchange is a single binary envelope. This crate implements the
//! client half of that protocol:
//!
//! - ECDH session establishment and the per-round-trip ephemeral key
//!   rotation that re-keys the channel after every response
//! - AES-256-CBC protection of request/response payloads with CRC-32
//!   framing checksums
//! - the fixed-offset binary codecs for each device operation
//!   (connect, pair, address derivation, signing, key/value records,
//!   encrypted data export)
//! - the multi-frame continuation protocol used when a signing payload
//!   exceeds a single request's capacity
//!
//! The HTTP call itself is behind the [`Transport`] trait; retry and
//! timeout policy belong to the transport implementation, never to
//! this engine. Chain-specific transaction building is likewise out of
//! scope: [`client::LatticeClient::sign`] consumes an opaque
//! schema-tagged payload and returns the device's generic signature
//! slots.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod codec;
pub mod commands;
pub mod constants;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod firmware;
pub mod frames;
pub mod session;
pub mod transport;
pub mod wallet;

pub use client::LatticeClient;
pub use commands::{
    AddressData, AddressFlag, ConnectResponse, Eip2335Bundle, EncDataSchema, EncryptedRequestCode,
    ExportEncDataRequest, GenericSignature, GetAddressesRequest, GetKvRecordsRequest, KvEntry,
    KvRecord, KvRecordsPage, SignRequest, SigningSchema,
};
pub use error::{DeviceError, Error, Result};
pub use firmware::{FirmwareConstants, FirmwareVersion};
pub use session::{PersistedSession, Session};
pub use transport::{Transport, TransportError};
pub use wallet::{ActiveWallets, Wallet};
