//! `addKvRecords`: create key/value records.

use crate::codec::Writer;
use crate::error::{Error, Result};
use crate::firmware::FirmwareConstants;

/// A record to create. Ids are assigned by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    /// Record type namespace.
    pub record_type: u32,
    /// Whether key lookups are case sensitive.
    pub case_sensitive: bool,
    /// Record key, ASCII, never empty.
    pub key: String,
    /// Record value, ASCII, never empty.
    pub val: String,
}

fn validate_entry(entry: &KvEntry, fw: &FirmwareConstants) -> Result<()> {
    for (what, s, max) in [
        ("key", &entry.key, fw.kv_key_max_str_sz),
        ("value", &entry.val, fw.kv_val_max_str_sz),
    ] {
        if s.is_empty() {
            return Err(Error::validation(format!("KV {what} must not be empty")));
        }
        if !s.is_ascii() {
            return Err(Error::validation(format!("KV {what} must be ASCII")));
        }
        if s.len() > max {
            return Err(Error::validation(format!(
                "KV {what} exceeds firmware maximum of {max} characters"
            )));
        }
    }
    Ok(())
}

/// Payload: `[count u8]` followed by one fixed slot per record:
/// `[type u32 LE][case u8][key len u8][key slot][val len u8][val slot]`.
pub(crate) fn encode_request(entries: &[KvEntry], fw: &FirmwareConstants) -> Result<Vec<u8>> {
    if !fw.kv_allowed {
        return Err(Error::FirmwareUnsupported("key/value records"));
    }
    if entries.is_empty() || entries.len() > fw.kv_action_max_num {
        return Err(Error::validation(format!(
            "record batch must be 1..={} entries, got {}",
            fw.kv_action_max_num,
            entries.len()
        )));
    }

    let mut payload = vec![0u8; 1 + entries.len() * fw.kv_add_record_slot()];
    let mut w = Writer::new(&mut payload);
    w.put_u8(entries.len() as u8)?;
    for entry in entries {
        validate_entry(entry, fw)?;
        w.put_u32_le(entry.record_type)?;
        w.put_u8(entry.case_sensitive as u8)?;
        w.put_u8(entry.key.len() as u8)?;
        w.put_str_slot(&entry.key, fw.kv_key_max_str_sz + 1)?;
        w.put_u8(entry.val.len() as u8)?;
        w.put_str_slot(&entry.val, fw.kv_val_max_str_sz + 1)?;
    }
    Ok(payload)
}
