//! `exportEncData`: export an encrypted data bundle.
//!
//! Schema-discriminated; the only schema today is the EIP-2335
//! keystore share. The binary unpacking of the bundle lives here;
//! turning it into portable keystore JSON is a thin external
//! formatter's job.

use crate::codec::{Reader, Writer};
use crate::constants::{MAX_PATH_DEPTH, WALLET_UID_LEN};
use crate::error::{Error, Result};
use crate::firmware::FirmwareConstants;

use super::put_path_slots;

/// Export schemas understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncDataSchema {
    /// EIP-2335 keystore share (BLS withdrawal/signing keys).
    Eip2335 = 0x00,
}

/// Parameters for an `exportEncData` request.
#[derive(Debug, Clone)]
pub struct ExportEncDataRequest {
    /// Bundle schema to export.
    pub schema: EncDataSchema,
    /// Wallet to export from.
    pub wallet_uid: [u8; WALLET_UID_LEN],
    /// Derivation path of the exported key.
    pub path: Vec<u32>,
    /// PBKDF2 iteration count; `None` uses the device default.
    pub kdf_iterations: Option<u32>,
}

/// Decrypted data size of an `exportEncData` response.
pub(crate) const RESP_DATA_LEN: usize = 4 + 32 + 16 + 32 + 32 + 48;

/// The fixed-layout EIP-2335 bundle returned by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip2335Bundle {
    /// PBKDF2 iteration count used by the device.
    pub iterations: u32,
    /// KDF salt.
    pub salt: [u8; 32],
    /// AES-128-CTR IV.
    pub iv: [u8; 16],
    /// Encrypted key material.
    pub ciphertext: [u8; 32],
    /// SHA-256 checksum per EIP-2335.
    pub checksum: [u8; 32],
    /// BLS public key of the exported share.
    pub pubkey: [u8; 48],
}

/// Payload: `[schema u8][uid 32][depth u8][path slots][iterations u32 LE]`,
/// with zero iterations meaning the device default.
pub(crate) fn encode_request(req: &ExportEncDataRequest, fw: &FirmwareConstants) -> Result<Vec<u8>> {
    if !fw.enc_data_allowed {
        return Err(Error::FirmwareUnsupported("encrypted data export"));
    }
    if req.path.is_empty() || req.path.len() > MAX_PATH_DEPTH {
        return Err(Error::validation(format!(
            "export path depth must be 1..={MAX_PATH_DEPTH}, got {}",
            req.path.len()
        )));
    }
    if req.kdf_iterations == Some(0) {
        return Err(Error::validation("KDF iteration count must be nonzero"));
    }

    let mut payload = vec![0u8; 1 + WALLET_UID_LEN + 1 + 4 * MAX_PATH_DEPTH + 4];
    let mut w = Writer::new(&mut payload);
    w.put_u8(req.schema as u8)?;
    w.put_bytes(&req.wallet_uid)?;
    w.put_u8(req.path.len() as u8)?;
    put_path_slots(&mut w, &req.path)?;
    w.put_u32_le(req.kdf_iterations.unwrap_or(0))?;
    Ok(payload)
}

pub(crate) fn decode_response(data: &[u8]) -> Result<Eip2335Bundle> {
    let mut r = Reader::new(data);
    Ok(Eip2335Bundle {
        iterations: r.take_u32_le()?,
        salt: r.take_array()?,
        iv: r.take_array()?,
        ciphertext: r.take_array()?,
        checksum: r.take_array()?,
        pubkey: r.take_array()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::FirmwareVersion;

    fn fw() -> FirmwareConstants {
        FirmwareConstants::for_version(FirmwareVersion::new(0, 15, 0))
    }

    fn request(path: &[u32], iterations: Option<u32>) -> ExportEncDataRequest {
        ExportEncDataRequest {
            schema: EncDataSchema::Eip2335,
            wallet_uid: [0xCD; WALLET_UID_LEN],
            path: path.to_vec(),
            kdf_iterations: iterations,
        }
    }

    #[test]
    fn payload_layout() {
        let payload =
            encode_request(&request(&[12381, 3600, 0, 0], Some(262144)), &fw()).unwrap();
        assert_eq!(payload.len(), 58);
        assert_eq!(payload[0], 0);
        assert_eq!(&payload[1..33], &[0xCD; 32]);
        assert_eq!(payload[33], 4);
        assert_eq!(&payload[34..38], &12381u32.to_be_bytes());
        assert_eq!(&payload[50..54], &[0, 0, 0, 0]); // unused fifth slot
        assert_eq!(&payload[54..58], &262144u32.to_le_bytes());
    }

    #[test]
    fn bounds_and_capability_fail_locally() {
        assert!(encode_request(&request(&[], None), &fw()).is_err());
        assert!(encode_request(&request(&[1, 2, 3, 4, 5, 6], None), &fw()).is_err());
        assert!(encode_request(&request(&[1], Some(0)), &fw()).is_err());

        let old = FirmwareConstants::for_version(FirmwareVersion::new(0, 14, 2));
        assert!(matches!(
            encode_request(&request(&[1], None), &old),
            Err(Error::FirmwareUnsupported(_))
        ));
    }

    #[test]
    fn bundle_round_trips() {
        let bundle = Eip2335Bundle {
            iterations: 262144,
            salt: [0x01; 32],
            iv: [0x02; 16],
            ciphertext: [0x03; 32],
            checksum: [0x04; 32],
            pubkey: [0x05; 48],
        };

        let mut data = Vec::with_capacity(RESP_DATA_LEN);
        data.extend_from_slice(&bundle.iterations.to_le_bytes());
        data.extend_from_slice(&bundle.salt);
        data.extend_from_slice(&bundle.iv);
        data.extend_from_slice(&bundle.ciphertext);
        data.extend_from_slice(&bundle.checksum);
        data.extend_from_slice(&bundle.pubkey);
        assert_eq!(data.len(), RESP_DATA_LEN);

        assert_eq!(decode_response(&data).unwrap(), bundle);
    }
}
