//! Multi-frame continuation for oversized signing payloads.
//!
//! A payload larger than the firmware's single-frame capacity is split
//! into a primary chunk plus a FIFO of extra chunks. The client sends
//! the primary frame first, then one extra frame per response while the
//! device reports the request as pending, echoing each response's
//! continuation code. A failure anywhere in the sequence aborts the
//! whole operation; there is no partial state to resume from.

use std::collections::VecDeque;

use crate::codec::Writer;
use crate::commands::SigningSchema;
use crate::constants::NEXT_CODE_LEN;
use crate::error::{Error, Result};
use crate::firmware::FirmwareConstants;

/// A signing payload split for transmission: the primary chunk plus the
/// continuation queue, front first.
#[derive(Debug)]
pub(crate) struct FramedPayload {
    pub(crate) primary: Vec<u8>,
    pub(crate) extra: VecDeque<Vec<u8>>,
}

/// Split a payload against the firmware's frame limits. Payloads that
/// fit in one frame come back with an empty queue.
pub(crate) fn split_payload(data: &[u8], fw: &FirmwareConstants) -> Result<FramedPayload> {
    if data.len() <= fw.req_max_data_sz {
        return Ok(FramedPayload {
            primary: data.to_vec(),
            extra: VecDeque::new(),
        });
    }
    if fw.extra_data_frame_sz == 0 {
        return Err(Error::FirmwareUnsupported("multi-frame signing requests"));
    }

    let overflow = data.len() - fw.req_max_data_sz;
    let frames = overflow.div_ceil(fw.extra_data_frame_sz);
    if frames > fw.extra_data_max_frames {
        return Err(Error::validation(format!(
            "payload of {} bytes needs {frames} extra frames, firmware allows {}",
            data.len(),
            fw.extra_data_max_frames
        )));
    }

    let (primary, rest) = data.split_at(fw.req_max_data_sz);
    Ok(FramedPayload {
        primary: primary.to_vec(),
        extra: rest
            .chunks(fw.extra_data_frame_sz)
            .map(<[u8]>::to_vec)
            .collect(),
    })
}

/// Continuation frame payload:
/// `[pending u8][schema 0xFF][next_code 8][chunk]`.
pub(crate) fn encode_extra_frame(
    next_code: &[u8; NEXT_CODE_LEN],
    chunk: &[u8],
    pending: bool,
) -> Result<Vec<u8>> {
    let mut payload = vec![0u8; 2 + NEXT_CODE_LEN + chunk.len()];
    let mut w = Writer::new(&mut payload);
    w.put_u8(pending as u8)?;
    w.put_u8(SigningSchema::ExtraData as u8)?;
    w.put_bytes(next_code)?;
    w.put_bytes(chunk)?;
    Ok(payload)
}
