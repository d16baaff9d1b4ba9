//! `getWallets`: fetch the active wallet descriptors.
//!
//! The request has no parameters; the response is two fixed 71-byte
//! descriptors, internal wallet first, then the SafeCard slot.

use crate::codec::Reader;
use crate::error::Result;
use crate::wallet::{ActiveWallets, Wallet};

pub(crate) fn decode_response(data: &[u8]) -> Result<ActiveWallets> {
    let mut r = Reader::new(data);
    let internal = Wallet::decode(&mut r, false)?;
    let external = Wallet::decode(&mut r, true)?;
    Ok(ActiveWallets { internal, external })
}
