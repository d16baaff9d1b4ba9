//! `removeKvRecords`: delete key/value records by id.

use crate::codec::Writer;
use crate::error::{Error, Result};
use crate::firmware::FirmwareConstants;

/// Payload: `[type u32 LE][count u8][id u32 LE]...`.
pub(crate) fn encode_request(
    record_type: u32,
    ids: &[u32],
    fw: &FirmwareConstants,
) -> Result<Vec<u8>> {
    if !fw.kv_allowed {
        return Err(Error::FirmwareUnsupported("key/value records"));
    }
    if ids.is_empty() || ids.len() > fw.kv_remove_max_num {
        return Err(Error::validation(format!(
            "removal batch must be 1..={} ids, got {}",
            fw.kv_remove_max_num,
            ids.len()
        )));
    }

    let mut payload = vec![0u8; 4 + 1 + 4 * ids.len()];
    let mut w = Writer::new(&mut payload);
    w.put_u32_le(record_type)?;
    w.put_u8(ids.len() as u8)?;
    for &id in ids {
        w.put_u32_le(id)?;
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::FirmwareVersion;

    #[test]
    fn payload_layout() {
        let fw = FirmwareConstants::for_version(FirmwareVersion::new(0, 15, 0));
        let payload = encode_request(7, &[1, 0x0102], &fw).unwrap();
        assert_eq!(
            payload,
            vec![7, 0, 0, 0, 2, 1, 0, 0, 0, 0x02, 0x01, 0, 0]
        );
    }

    #[test]
    fn batch_bounds_fail_locally() {
        let fw = FirmwareConstants::for_version(FirmwareVersion::new(0, 15, 0));
        assert!(encode_request(0, &[], &fw).is_err());

        let too_many: Vec<u32> = (0..=fw.kv_remove_max_num as u32).collect();
        assert!(matches!(
            encode_request(0, &too_many, &fw),
            Err(Error::Validation(_))
        ));
    }
}
