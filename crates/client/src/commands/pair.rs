//! `finalizePairing`: prove knowledge of the secret shown on-device.
//!
//! The payload is a fixed 25-byte application name slot followed by a
//! 74-byte DER signature slot. The signature is made with the session's
//! static key over `static pubkey || name slot || pairing secret`, so
//! the device can bind the pairing to the key it saw during `connect`.

use k256::SecretKey;

use crate::codec::Writer;
use crate::constants::{APP_NAME_LEN, DER_SIG_SLOT_LEN};
use crate::crypto;
use crate::error::{Error, Result};

/// Wire size of the pairing payload.
pub(crate) const PAIR_PAYLOAD_LEN: usize = APP_NAME_LEN + DER_SIG_SLOT_LEN;

/// Encode the pairing payload.
pub(crate) fn encode_request(
    app_name: &str,
    pairing_secret: &str,
    static_key: &SecretKey,
) -> Result<[u8; PAIR_PAYLOAD_LEN]> {
    if app_name.is_empty() {
        return Err(Error::validation("app name must not be empty"));
    }
    if !app_name.is_ascii() || app_name.len() >= APP_NAME_LEN {
        return Err(Error::validation(format!(
            "app name must be ASCII and shorter than {APP_NAME_LEN} characters"
        )));
    }
    if pairing_secret.is_empty() {
        return Err(Error::validation("pairing secret must not be empty"));
    }

    let mut payload = [0u8; PAIR_PAYLOAD_LEN];
    Writer::new(&mut payload).put_str_slot(app_name, APP_NAME_LEN)?;

    let mut preimage = Vec::with_capacity(65 + APP_NAME_LEN + pairing_secret.len());
    preimage.extend_from_slice(&crypto::encode_point(&static_key.public_key()));
    preimage.extend_from_slice(&payload[..APP_NAME_LEN]);
    preimage.extend_from_slice(pairing_secret.as_bytes());

    let der = crypto::sign_message(static_key, &preimage)?;
    Writer::new(&mut payload[APP_NAME_LEN..]).put_bytes(&crypto::pack_der_signature(&der)?)?;
    Ok(payload)
}
