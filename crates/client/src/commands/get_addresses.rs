//! `getAddresses`: derive addresses or raw public keys.
//!
//! The payload is the wallet UID, the derivation path (five fixed
//! big-endian u32 slots, preceded by a depth byte on firmware that
//! allows variable-length paths) and a count byte. Firmware with
//! `addr_flags_allowed` packs a 4-bit pubkey-type flag into the high
//! nibble of that byte; older firmware uses the whole byte as a plain
//! count.

use crate::codec::{Reader, Writer};
use crate::constants::{ADDR_STR_LEN, EC_POINT_LEN, MAX_PATH_DEPTH, WALLET_UID_LEN};
use crate::error::{Error, Result};
use crate::firmware::FirmwareConstants;

use super::{put_path_slots, validate_start_path};

/// What `getAddresses` should return for each derived path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AddressFlag {
    /// Formatted address strings.
    #[default]
    None = 0,
    /// Raw ed25519 public keys (32 bytes).
    Ed25519Pubkey = 1,
    /// Raw BLS12-381 G1 public keys (48 bytes).
    Bls12381Pubkey = 2,
    /// Raw uncompressed secp256k1 public keys (65 bytes).
    Secp256k1Pubkey = 3,
}

impl AddressFlag {
    /// Meaningful bytes inside each fixed 65-byte response slot.
    pub const fn pubkey_len(&self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Ed25519Pubkey => Some(32),
            Self::Bls12381Pubkey => Some(48),
            Self::Secp256k1Pubkey => Some(65),
        }
    }
}

/// Parameters for a `getAddresses` request.
#[derive(Debug, Clone)]
pub struct GetAddressesRequest {
    /// Wallet to derive from.
    pub wallet_uid: [u8; WALLET_UID_LEN],
    /// Derivation path of the first address.
    pub start_path: Vec<u32>,
    /// Number of sequential addresses to derive.
    pub n: u8,
    /// Address strings or a raw public key type.
    pub flag: AddressFlag,
}

/// Decoded `getAddresses` response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressData {
    /// Formatted address strings.
    Strings(Vec<String>),
    /// Raw public keys, trimmed to the curve's length.
    PublicKeys(Vec<Vec<u8>>),
}

/// Fixed payload size: uid, optional depth byte, path slots, count byte.
pub(crate) fn request_payload_len(fw: &FirmwareConstants) -> usize {
    WALLET_UID_LEN + usize::from(fw.var_addr_path_sz_allowed) + 4 * MAX_PATH_DEPTH + 1
}

pub(crate) fn encode_request(req: &GetAddressesRequest, fw: &FirmwareConstants) -> Result<Vec<u8>> {
    validate_start_path(&req.start_path, fw)?;
    if req.n == 0 || usize::from(req.n) > fw.max_addresses {
        return Err(Error::validation(format!(
            "address count must be 1..={}, got {}",
            fw.max_addresses, req.n
        )));
    }
    if req.flag != AddressFlag::None && !fw.addr_flags_allowed {
        return Err(Error::FirmwareUnsupported("public key address flags"));
    }

    let mut payload = vec![0u8; request_payload_len(fw)];
    let mut w = Writer::new(&mut payload);
    w.put_bytes(&req.wallet_uid)?;
    if fw.var_addr_path_sz_allowed {
        w.put_u8(req.start_path.len() as u8)?;
    }
    put_path_slots(&mut w, &req.start_path)?;
    if fw.addr_flags_allowed {
        // Count fits a nibble: max_addresses never exceeds 15.
        w.put_u8(((req.flag as u8) << 4) | req.n)?;
    } else {
        w.put_u8(req.n)?;
    }
    Ok(payload)
}

pub(crate) fn decode_response(
    data: &[u8],
    req: &GetAddressesRequest,
    fw: &FirmwareConstants,
) -> Result<AddressData> {
    if data.len() < fw.addr_resp_data_len() {
        return Err(Error::Response("address response data too short"));
    }
    let mut r = Reader::new(data);

    match req.flag.pubkey_len() {
        None => {
            let mut addrs = Vec::with_capacity(usize::from(req.n));
            for _ in 0..req.n {
                let addr = r.take_str_slot(ADDR_STR_LEN)?;
                if addr.is_empty() {
                    return Err(Error::Response("empty address slot"));
                }
                addrs.push(addr);
            }
            Ok(AddressData::Strings(addrs))
        }
        Some(len) => {
            let mut keys = Vec::with_capacity(usize::from(req.n));
            for _ in 0..req.n {
                let slot = r.take(EC_POINT_LEN)?;
                keys.push(slot[..len].to_vec());
            }
            Ok(AddressData::PublicKeys(keys))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::FirmwareVersion;

    fn req(path: &[u32], n: u8, flag: AddressFlag) -> GetAddressesRequest {
        GetAddressesRequest {
            wallet_uid: [0xAB; WALLET_UID_LEN],
            start_path: path.to_vec(),
            n,
            flag,
        }
    }

    const BIP44: [u32; 5] = [0x8000002C, 0x8000003C, 0x80000000, 0, 0];

    #[test]
    fn modern_firmware_packs_flag_and_count() {
        let fw = FirmwareConstants::for_version(FirmwareVersion::new(0, 15, 0));
        let payload = encode_request(&req(&BIP44, 2, AddressFlag::Secp256k1Pubkey), &fw).unwrap();

        assert_eq!(payload.len(), 32 + 1 + 20 + 1);
        assert_eq!(payload[32], 5); // depth byte
        assert_eq!(&payload[33..37], &0x8000002Cu32.to_be_bytes());
        assert_eq!(payload[53], 0x32); // flag 3 in the high nibble, n = 2
    }

    #[test]
    fn legacy_firmware_uses_a_plain_count_byte() {
        let fw = FirmwareConstants::for_version(FirmwareVersion::new(0, 12, 0));
        let payload = encode_request(&req(&BIP44, 3, AddressFlag::None), &fw).unwrap();

        // No depth byte on fixed-path firmware.
        assert_eq!(payload.len(), 32 + 20 + 1);
        assert_eq!(payload[52], 3);
    }

    #[test]
    fn bounds_are_enforced_before_transmission() {
        let fw = FirmwareConstants::for_version(FirmwareVersion::new(0, 12, 0));

        // Short path on firmware without variable path support.
        assert!(matches!(
            encode_request(&req(&[0x80000000, 0], 1, AddressFlag::None), &fw),
            Err(Error::Validation(_))
        ));
        // Flags on firmware without flag support.
        assert!(matches!(
            encode_request(&req(&BIP44, 1, AddressFlag::Ed25519Pubkey), &fw),
            Err(Error::FirmwareUnsupported(_))
        ));
        // Count over the firmware maximum.
        assert!(encode_request(&req(&BIP44, 11, AddressFlag::None), &fw).is_err());
        assert!(encode_request(&req(&BIP44, 0, AddressFlag::None), &fw).is_err());

        let modern = FirmwareConstants::for_version(FirmwareVersion::new(0, 15, 0));
        assert!(encode_request(&req(&BIP44[..3], 1, AddressFlag::None), &modern).is_ok());
        assert!(encode_request(&req(&[], 1, AddressFlag::None), &modern).is_err());
    }

    #[test]
    fn decodes_address_strings() {
        let fw = FirmwareConstants::for_version(FirmwareVersion::new(0, 15, 0));
        let request = req(&BIP44, 2, AddressFlag::None);

        let mut data = vec![0u8; fw.addr_resp_data_len()];
        data[..4].copy_from_slice(b"addr");
        data[ADDR_STR_LEN..ADDR_STR_LEN + 5].copy_from_slice(b"addr2");

        let decoded = decode_response(&data, &request, &fw).unwrap();
        assert_eq!(
            decoded,
            AddressData::Strings(vec!["addr".into(), "addr2".into()])
        );
    }

    #[test]
    fn decodes_trimmed_public_keys() {
        let fw = FirmwareConstants::for_version(FirmwareVersion::new(0, 15, 0));
        let request = req(&BIP44, 2, AddressFlag::Ed25519Pubkey);

        let mut data = vec![0u8; fw.addr_resp_data_len()];
        data[..EC_POINT_LEN].copy_from_slice(&[0x11; EC_POINT_LEN]);
        data[EC_POINT_LEN..2 * EC_POINT_LEN].copy_from_slice(&[0x22; EC_POINT_LEN]);

        let decoded = decode_response(&data, &request, &fw).unwrap();
        assert_eq!(
            decoded,
            AddressData::PublicKeys(vec![vec![0x11; 32], vec![0x22; 32]])
        );
    }
}
