//! Request/response codecs, one module per device operation.
//!
//! Each codec validates its parameters against the session's
//! [`FirmwareConstants`](crate::firmware::FirmwareConstants) before
//! writing a fixed-offset payload, and decodes the matching decrypted
//! response at fixed offsets. The device would also reject out-of-range
//! requests, but rejecting locally avoids the round trip and produces
//! an actionable error.

pub mod add_kv_records;
pub use add_kv_records::*;
pub mod connect;
pub use connect::*;
pub mod export_enc_data;
pub use export_enc_data::*;
pub mod fetch_active_wallet;
pub use fetch_active_wallet::*;
pub mod get_addresses;
pub use get_addresses::*;
pub mod get_kv_records;
pub use get_kv_records::*;
pub mod pair;
pub use pair::*;
pub mod remove_kv_records;
pub use remove_kv_records::*;
pub mod sign;
pub use sign::*;

use crate::codec::Writer;
use crate::constants::MAX_PATH_DEPTH;
use crate::error::{Error, Result};
use crate::firmware::FirmwareConstants;

/// Logical request codes carried inside the encrypted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncryptedRequestCode {
    /// Complete a pairing started on the device.
    FinalizePairing = 0x00,
    /// Derive addresses or public keys.
    GetAddresses = 0x01,
    /// Sign a payload (also carries extra data frames).
    Sign = 0x03,
    /// Fetch the active wallet descriptors.
    GetWallets = 0x04,
    /// Enumerate key/value records.
    GetKvRecords = 0x07,
    /// Create key/value records.
    AddKvRecords = 0x08,
    /// Delete key/value records by id.
    RemoveKvRecords = 0x09,
    /// Export an encrypted data bundle.
    ExportEncData = 0x0A,
}

/// Check a derivation path against firmware expectations. Firmware
/// without variable-length path support requires exactly
/// [`MAX_PATH_DEPTH`] indices.
pub(crate) fn validate_start_path(path: &[u32], fw: &FirmwareConstants) -> Result<()> {
    if path.is_empty() || path.len() > MAX_PATH_DEPTH {
        return Err(Error::validation(format!(
            "derivation path depth must be 1..={MAX_PATH_DEPTH}, got {}",
            path.len()
        )));
    }
    if !fw.var_addr_path_sz_allowed && path.len() != MAX_PATH_DEPTH {
        return Err(Error::validation(format!(
            "firmware requires derivation paths of exactly {MAX_PATH_DEPTH} indices, got {}",
            path.len()
        )));
    }
    Ok(())
}

/// Write a derivation path into its five fixed big-endian u32 slots,
/// zero-padding unused slots.
pub(crate) fn put_path_slots(w: &mut Writer<'_>, path: &[u32]) -> Result<()> {
    for &index in path {
        w.put_u32_be(index)?;
    }
    for _ in path.len()..MAX_PATH_DEPTH {
        w.put_u32_be(0)?;
    }
    Ok(())
}
