//! `sign`: request signatures over a prebuilt payload.
//!
//! The payload itself comes from a chain-specific builder; this module
//! owns the generic envelope only. Requests that exceed the firmware's
//! single-frame capacity are split by [`frames`](crate::frames) and
//! driven by the client's continuation loop; each intermediate response
//! is decoded here as a [`SignResponseFrame`].

use crate::codec::{Reader, Writer};
use crate::constants::{
    DER_SIG_SLOT_LEN, EC_POINT_LEN, EMPTY_WALLET_UID, NEXT_CODE_LEN, SIGNER_SLOT_LEN,
    SIGN_RESULT_LEN, WALLET_UID_LEN,
};
use crate::crypto::unpack_der_signature;
use crate::error::{Error, Result};

/// Signing schemas understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SigningSchema {
    /// Bitcoin transaction inputs.
    Bitcoin = 0x00,
    /// Ethereum transaction.
    Ethereum = 0x01,
    /// Ethereum message (personal_sign or typed data).
    EthereumMsg = 0x02,
    /// Arbitrary payload under the general signing framework.
    Generic = 0x03,
    /// Continuation frame of a multi-frame request.
    ExtraData = 0xFF,
}

/// Parameters for a signing request.
#[derive(Debug, Clone)]
pub struct SignRequest {
    /// Schema the payload was built for.
    pub schema: SigningSchema,
    /// Wallet to sign with.
    pub wallet_uid: [u8; WALLET_UID_LEN],
    /// Prebuilt chain-specific payload.
    pub data: Vec<u8>,
}

/// One DER signature plus the 20-byte identifier of the key that
/// produced it (address or pubkey hash, schema-dependent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericSignature {
    /// DER-encoded ECDSA signature.
    pub der: Vec<u8>,
    /// Signer identifier slot.
    pub signer: [u8; SIGNER_SLOT_LEN],
}

/// One decrypted signing response, final or intermediate.
#[derive(Debug, Clone)]
pub(crate) struct SignResponseFrame {
    /// More frames expected before the result is valid.
    pub(crate) pending: bool,
    /// Continuation code the next extra frame must echo.
    pub(crate) next_code: [u8; NEXT_CODE_LEN],
    /// Fixed result slot, meaningful only once `pending` clears.
    pub(crate) result: Vec<u8>,
}

/// Primary frame payload: `[pending u8][schema u8][uid 32][chunk]`.
pub(crate) fn encode_request(
    req: &SignRequest,
    chunk: &[u8],
    pending: bool,
) -> Result<Vec<u8>> {
    if req.schema == SigningSchema::ExtraData {
        return Err(Error::validation(
            "the extra-data schema is reserved for continuation frames",
        ));
    }
    if req.wallet_uid == EMPTY_WALLET_UID {
        return Err(Error::validation("signing requires an active wallet"));
    }
    if chunk.is_empty() {
        return Err(Error::validation("signing payload must not be empty"));
    }

    let mut payload = vec![0u8; 2 + WALLET_UID_LEN + chunk.len()];
    let mut w = Writer::new(&mut payload);
    w.put_u8(pending as u8)?;
    w.put_u8(req.schema as u8)?;
    w.put_bytes(&req.wallet_uid)?;
    w.put_bytes(chunk)?;
    Ok(payload)
}

/// Decrypted response layout: `[pending u8][next_code 8][result slot]`.
pub(crate) fn decode_frame(data: &[u8]) -> Result<SignResponseFrame> {
    let mut r = Reader::new(data);
    let pending = match r.take_u8()? {
        0 => false,
        1 => true,
        _ => return Err(Error::Response("malformed pending flag")),
    };
    let next_code = r.take_array()?;
    let result = r.take(SIGN_RESULT_LEN)?.to_vec();
    Ok(SignResponseFrame {
        pending,
        next_code,
        result,
    })
}

/// Parse the generic signature envelope out of a final result slot:
/// skip the conventional 65-byte pubkey prefix, then read DER/signer
/// slot pairs while the next slot carries the DER marker. Multi-input
/// requests yield one pair per input.
pub fn parse_generic_signatures(result: &[u8]) -> Result<Vec<GenericSignature>> {
    let mut r = Reader::new(result);
    r.take(EC_POINT_LEN)?;

    let mut signatures = Vec::new();
    while r.remaining() >= DER_SIG_SLOT_LEN + SIGNER_SLOT_LEN {
        let slot = r.take(DER_SIG_SLOT_LEN)?;
        if slot[0] != 0x30 {
            break;
        }
        signatures.push(GenericSignature {
            der: unpack_der_signature(slot)?,
            signer: r.take_array()?,
        });
    }
    if signatures.is_empty() {
        return Err(Error::Response("response carries no signatures"));
    }
    Ok(signatures)
}
