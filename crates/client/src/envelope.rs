//! The secure message envelope.
//!
//! Requests and responses share one outer frame:
//!
//! ```text
//! [version u8][type u8][message id u32 BE][payload len u16 BE]
//! [payload: fixed-size buffer, zero-padded][CRC-32 u32 BE]
//! ```
//!
//! A `connect` request carries the client's static public key in the
//! clear; every other request carries an AES-256-CBC frame of
//! `request code || payload` under the current shared secret. A
//! decrypted response always opens with the device's next ephemeral
//! public key, which the caller must persist before the next request.
//! Everything here is a pure function over byte buffers; session
//! mutation happens in the client after all checks pass.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::codec::{Reader, Writer};
use crate::commands::EncryptedRequestCode;
use crate::constants::{
    EC_POINT_LEN, ENC_MSG_LEN, HEADER_LEN, PROTOCOL_VERSION, REQUEST_MSG_LEN, REQUEST_PAYLOAD_LEN,
};
use crate::crypto;
use crate::error::{DeviceError, Error, Result};

/// Outer message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestType {
    /// Session establishment; payload is a public key in the clear.
    Connect = 0x01,
    /// Any other operation; payload is an encrypted frame.
    Encrypted = 0x02,
}

/// Frame a request envelope around an opaque payload.
///
/// The payload buffer on the wire is always [`REQUEST_PAYLOAD_LEN`]
/// bytes, zero-padded past the declared length; the CRC covers the
/// header and the full buffer.
pub fn frame_request(kind: RequestType, msg_id: u32, payload: &[u8]) -> Result<Bytes> {
    if payload.len() > REQUEST_PAYLOAD_LEN {
        return Err(Error::Codec("payload exceeds fixed envelope buffer"));
    }

    let mut buf = vec![0u8; REQUEST_MSG_LEN];
    let mut w = Writer::new(&mut buf);
    w.put_u8(PROTOCOL_VERSION)?;
    w.put_u8(kind as u8)?;
    w.put_u32_be(msg_id)?;
    w.put_u16_be(payload.len() as u16)?;
    w.put_bytes(payload)?;
    w.skip(REQUEST_PAYLOAD_LEN - payload.len())?;

    let crc = crypto::checksum(&buf[..HEADER_LEN + REQUEST_PAYLOAD_LEN]);
    let mut w = Writer::new(&mut buf[HEADER_LEN + REQUEST_PAYLOAD_LEN..]);
    w.put_u32_be(crc)?;

    trace!(msg_id, kind = ?kind, len = payload.len(), "framed request");
    Ok(buf.into())
}

/// Build the encrypted frame for a non-connect request:
/// `code || payload`, zero-padded to [`ENC_MSG_LEN`] and encrypted
/// under the session's current shared secret.
pub fn encrypt_request_payload(
    code: EncryptedRequestCode,
    payload: &[u8],
    shared_secret: &[u8; 32],
) -> Result<Vec<u8>> {
    if 1 + payload.len() > ENC_MSG_LEN {
        return Err(Error::Codec("payload exceeds encrypted frame capacity"));
    }

    let mut frame = vec![0u8; ENC_MSG_LEN];
    frame[0] = code as u8;
    frame[1..1 + payload.len()].copy_from_slice(payload);
    crypto::encrypt_frame(&mut frame, shared_secret)?;

    debug!(code = ?code, len = payload.len(), "encrypted request frame");
    Ok(frame)
}

/// Unframe a response envelope.
///
/// Verifies the protocol version, the message id echo and the CRC, then
/// surfaces any device-reported error code. Returns the payload bytes
/// that follow the response code (still encrypted for non-connect
/// exchanges).
pub fn parse_response(raw: &[u8], expected_msg_id: u32) -> Result<Bytes> {
    if raw.len() < HEADER_LEN + 1 + 4 {
        return Err(Error::Response("response shorter than envelope minimum"));
    }

    let mut r = Reader::new(raw);
    let version = r.take_u8()?;
    if version != PROTOCOL_VERSION {
        return Err(Error::Response("unexpected protocol version"));
    }
    let _kind = r.take_u8()?;
    let msg_id = r.take_u32_be()?;
    if msg_id != expected_msg_id {
        return Err(Error::Response("message id mismatch"));
    }
    let len = r.take_u16_be()? as usize;
    if len == 0 || raw.len() != HEADER_LEN + len + 4 {
        return Err(Error::Response("envelope length mismatch"));
    }

    let expected = u32::from_be_bytes(raw[HEADER_LEN + len..].try_into().unwrap());
    let actual = crypto::checksum(&raw[..HEADER_LEN + len]);
    if expected != actual {
        return Err(Error::Checksum { expected, actual });
    }

    let code = r.take_u8()?;
    if let Some(err) = DeviceError::from_code(code) {
        debug!(code, "device reported an error");
        return Err(Error::Device(err));
    }

    trace!(msg_id, len, "validated response envelope");
    Ok(Bytes::copy_from_slice(r.take(len - 1)?))
}

/// Decrypt and validate an encrypted response payload.
///
/// The decrypted block is
/// `[ephemeral pubkey 65][data][CRC-32 u32 BE][zero slack]`, where the
/// data length is a fixed per-operation constant and the firmware
/// allocates slack past the checksum — which is what makes the
/// trailing-zero padding check meaningful. Returns the device's next
/// ephemeral key (still raw; the caller validates and persists it) and
/// the data region.
pub fn decrypt_response(
    payload: &[u8],
    data_len: usize,
    shared_secret: &[u8; 32],
) -> Result<([u8; EC_POINT_LEN], Bytes)> {
    let needed = EC_POINT_LEN + data_len + 4;
    if payload.len() % 16 != 0 || payload.len() < needed + 2 {
        return Err(Error::Response("encrypted block has unexpected length"));
    }

    let mut block = payload.to_vec();
    crypto::decrypt_frame(&mut block, shared_secret)?;

    if block[block.len() - 2] != 0 || block[block.len() - 1] != 0 {
        return Err(Error::DecryptPadding);
    }

    let expected = u32::from_be_bytes(block[needed - 4..needed].try_into().unwrap());
    let actual = crypto::checksum(&block[..EC_POINT_LEN + data_len]);
    if expected != actual {
        return Err(Error::Checksum { expected, actual });
    }

    let ephemeral: [u8; EC_POINT_LEN] = block[..EC_POINT_LEN].try_into().unwrap();
    let data = Bytes::copy_from_slice(&block[EC_POINT_LEN..EC_POINT_LEN + data_len]);
    trace!(data_len, "decrypted response payload");
    Ok((ephemeral, data))
}
