//! `getKvRecords`: enumerate key/value records, paginated.

use crate::codec::{Reader, Writer};
use crate::error::{Error, Result};
use crate::firmware::FirmwareConstants;

/// A key/value record stored on the device (address tags and the like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvRecord {
    /// Device-assigned record id.
    pub id: u32,
    /// Record type namespace.
    pub record_type: u32,
    /// Whether key lookups are case sensitive.
    pub case_sensitive: bool,
    /// Record key, ASCII, never empty.
    pub key: String,
    /// Record value, ASCII, never empty.
    pub val: String,
}

/// Parameters for a `getKvRecords` request.
#[derive(Debug, Clone, Copy)]
pub struct GetKvRecordsRequest {
    /// Record type namespace to enumerate.
    pub record_type: u32,
    /// Number of records to fetch.
    pub n: u8,
    /// Index of the first record to fetch.
    pub start: u32,
}

/// A page of records plus the total count on the device.
#[derive(Debug, Clone)]
pub struct KvRecordsPage {
    /// Total records of this type on the device.
    pub total: u32,
    /// The fetched window.
    pub records: Vec<KvRecord>,
}

/// Fixed 9-byte payload: `[type u32 LE][n u8][start u32 LE]`.
pub(crate) fn encode_request(req: &GetKvRecordsRequest, fw: &FirmwareConstants) -> Result<Vec<u8>> {
    if !fw.kv_allowed {
        return Err(Error::FirmwareUnsupported("key/value records"));
    }
    if req.n == 0 || usize::from(req.n) > fw.kv_action_max_num {
        return Err(Error::validation(format!(
            "record count must be 1..={}, got {}",
            fw.kv_action_max_num, req.n
        )));
    }

    let mut payload = vec![0u8; 9];
    let mut w = Writer::new(&mut payload);
    w.put_u32_le(req.record_type)?;
    w.put_u8(req.n)?;
    w.put_u32_le(req.start)?;
    Ok(payload)
}

pub(crate) fn decode_response(data: &[u8], fw: &FirmwareConstants) -> Result<KvRecordsPage> {
    let mut r = Reader::new(data);
    let total = r.take_u32_le()?;
    let fetched = usize::from(r.take_u8()?);
    if fetched > fw.kv_action_max_num {
        return Err(Error::Response(
            "device returned more records than its own advertised maximum",
        ));
    }

    let mut records = Vec::with_capacity(fetched);
    for _ in 0..fetched {
        records.push(decode_record(&mut r, fw)?);
    }
    Ok(KvRecordsPage { total, records })
}

/// One fixed record slot:
/// `[id u32 LE][type u32 LE][case u8][key len u8][key slot][val len u8][val slot]`.
fn decode_record(r: &mut Reader<'_>, fw: &FirmwareConstants) -> Result<KvRecord> {
    let id = r.take_u32_le()?;
    let record_type = r.take_u32_le()?;
    let case_sensitive = r.take_u8()? != 0;

    let key_len = usize::from(r.take_u8()?);
    let key = r.take_str_slot(fw.kv_key_max_str_sz + 1)?;
    let val_len = usize::from(r.take_u8()?);
    let val = r.take_str_slot(fw.kv_val_max_str_sz + 1)?;

    if key.is_empty() || key.len() != key_len || val.is_empty() || val.len() != val_len {
        return Err(Error::Response("KV record slot lengths are inconsistent"));
    }
    Ok(KvRecord {
        id,
        record_type,
        case_sensitive,
        key,
        val,
    })
}
