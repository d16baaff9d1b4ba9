//! Firmware version handling and the capability table derived from it.
//!
//! The device reports its firmware version during `connect`; everything
//! layout-dependent afterwards consults the [`FirmwareConstants`]
//! derived from that version. Codecs branch on named capability flags,
//! never on raw version comparisons.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A device firmware version, ordered `major.minor.fix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FirmwareVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Fix (patch) version.
    pub fix: u8,
}

impl FirmwareVersion {
    /// Shorthand constructor.
    pub const fn new(major: u8, minor: u8, fix: u8) -> Self {
        Self { major, minor, fix }
    }

    /// Parse the 4-byte version field of a `connect` response:
    /// `[major, minor, fix, reserved]`.
    pub const fn from_wire(bytes: [u8; 4]) -> Self {
        Self {
            major: bytes[0],
            minor: bytes[1],
            fix: bytes[2],
        }
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.fix)
    }
}

/// Device-reported limits and capability flags.
///
/// Every bound here is authoritative: requests violating one are
/// rejected client-side before any bytes go over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareConstants {
    /// Maximum data bytes in the primary frame of a signing request.
    pub req_max_data_sz: usize,
    /// Size of one extra data continuation frame (0 when unsupported).
    pub extra_data_frame_sz: usize,
    /// Maximum number of extra data frames per signing request.
    pub extra_data_max_frames: usize,
    /// Maximum addresses derivable per `getAddresses` request.
    pub max_addresses: usize,
    /// Maximum key string length for a KV record.
    pub kv_key_max_str_sz: usize,
    /// Maximum value string length for a KV record.
    pub kv_val_max_str_sz: usize,
    /// Maximum records per `addKvRecords`/`getKvRecords` call.
    pub kv_action_max_num: usize,
    /// Maximum record ids per `removeKvRecords` call.
    pub kv_remove_max_num: usize,
    /// Public-key flags may be packed into the `getAddresses` count byte.
    pub addr_flags_allowed: bool,
    /// Derivation paths may be shorter than five indices.
    pub var_addr_path_sz_allowed: bool,
    /// `connect` responses bundle the active wallet descriptors.
    pub wallet_on_connect: bool,
    /// The key/value record store is available.
    pub kv_allowed: bool,
    /// Encrypted data export is available.
    pub enc_data_allowed: bool,
}

impl FirmwareConstants {
    /// Build the capability table for a reported firmware version.
    pub fn for_version(version: FirmwareVersion) -> Self {
        Self {
            req_max_data_sz: 1678,
            extra_data_frame_sz: if version >= FirmwareVersion::new(0, 10, 4) {
                1500
            } else {
                0
            },
            extra_data_max_frames: if version >= FirmwareVersion::new(0, 10, 4) {
                4
            } else {
                0
            },
            max_addresses: 10,
            kv_key_max_str_sz: 63,
            kv_val_max_str_sz: 63,
            kv_action_max_num: 10,
            kv_remove_max_num: 100,
            addr_flags_allowed: version >= FirmwareVersion::new(0, 13, 0),
            var_addr_path_sz_allowed: version >= FirmwareVersion::new(0, 14, 0),
            wallet_on_connect: version >= FirmwareVersion::new(0, 14, 1),
            kv_allowed: version >= FirmwareVersion::new(0, 12, 0),
            enc_data_allowed: version >= FirmwareVersion::new(0, 15, 0),
        }
    }

    /// Sanity-check a capability table before trusting its bounds.
    pub fn validate(&self) -> Result<()> {
        if self.req_max_data_sz == 0 || self.max_addresses == 0 {
            return Err(Error::validation("firmware constants report zero capacity"));
        }
        if self.kv_allowed
            && (self.kv_key_max_str_sz == 0
                || self.kv_val_max_str_sz == 0
                || self.kv_action_max_num == 0)
        {
            return Err(Error::validation("firmware KV limits are inconsistent"));
        }
        if self.extra_data_max_frames > 0 && self.extra_data_frame_sz == 0 {
            return Err(Error::validation("firmware extra-frame limits are inconsistent"));
        }
        Ok(())
    }

    /// Fixed slot size of one KV record in a `getKvRecords` response:
    /// id, type, case-sensitivity flag, sized key slot, sized value slot.
    pub const fn kv_record_slot(&self) -> usize {
        4 + 4 + 1 + 1 + (self.kv_key_max_str_sz + 1) + 1 + (self.kv_val_max_str_sz + 1)
    }

    /// Fixed slot size of one KV record in an `addKvRecords` request.
    /// Record ids are assigned by the device and absent here.
    pub const fn kv_add_record_slot(&self) -> usize {
        4 + 1 + 1 + (self.kv_key_max_str_sz + 1) + 1 + (self.kv_val_max_str_sz + 1)
    }

    /// Decrypted data size of a `getKvRecords` response.
    pub const fn kv_resp_data_len(&self) -> usize {
        4 + 1 + self.kv_action_max_num * self.kv_record_slot()
    }

    /// Decrypted data size of a `getAddresses` response.
    pub const fn addr_resp_data_len(&self) -> usize {
        self.max_addresses * crate::constants::ADDR_STR_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_order_numerically() {
        assert!(FirmwareVersion::new(0, 14, 1) > FirmwareVersion::new(0, 14, 0));
        assert!(FirmwareVersion::new(1, 0, 0) > FirmwareVersion::new(0, 15, 9));
        assert!(FirmwareVersion::new(0, 9, 9) < FirmwareVersion::new(0, 10, 0));
    }

    #[test]
    fn capability_flags_gate_on_version() {
        let old = FirmwareConstants::for_version(FirmwareVersion::new(0, 11, 0));
        assert!(!old.kv_allowed);
        assert!(!old.addr_flags_allowed);
        assert!(!old.wallet_on_connect);
        assert!(old.extra_data_frame_sz > 0);

        let ancient = FirmwareConstants::for_version(FirmwareVersion::new(0, 10, 0));
        assert_eq!(ancient.extra_data_frame_sz, 0);
        assert_eq!(ancient.extra_data_max_frames, 0);

        let new = FirmwareConstants::for_version(FirmwareVersion::new(0, 15, 2));
        assert!(new.kv_allowed);
        assert!(new.addr_flags_allowed);
        assert!(new.var_addr_path_sz_allowed);
        assert!(new.wallet_on_connect);
        assert!(new.enc_data_allowed);
        new.validate().unwrap();
    }

    #[test]
    fn wire_version_layout() {
        let v = FirmwareVersion::from_wire([0, 14, 2, 0]);
        assert_eq!(v, FirmwareVersion::new(0, 14, 2));
    }

    #[test]
    fn kv_slot_sizes() {
        let fw = FirmwareConstants::for_version(FirmwareVersion::new(0, 15, 0));
        assert_eq!(fw.kv_record_slot(), 139);
        assert_eq!(fw.kv_add_record_slot(), 135);
        assert_eq!(fw.kv_resp_data_len(), 5 + 10 * 139);
    }
}
