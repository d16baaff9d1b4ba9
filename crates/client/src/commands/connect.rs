//! `connect`: session establishment.
//!
//! The request carries the client's static public key in the clear.
//! The response reports the pairing state, the device's first ephemeral
//! key and the firmware version; firmware with `wallet_on_connect`
//! additionally bundles the active wallet descriptors, AES-encrypted
//! under ECDH of the static key and the newly received ephemeral key.
//! Older firmware requires a follow-up `fetchActiveWallet` call.

use k256::{PublicKey, SecretKey};
use tracing::debug;

use crate::codec::Reader;
use crate::constants::{EC_POINT_LEN, ENC_WALLET_DATA_LEN, WALLET_DATA_LEN};
use crate::crypto;
use crate::error::{Error, Result};
use crate::firmware::FirmwareVersion;
use crate::wallet::{ActiveWallets, Wallet};

/// Decoded `connect` response.
#[derive(Debug, Clone)]
pub struct ConnectResponse {
    /// Whether this client is already paired with the device.
    pub paired: bool,
    /// The device's ephemeral public key for the next request.
    pub ephemeral_key: [u8; EC_POINT_LEN],
    /// Firmware version reported by the device.
    pub version: FirmwareVersion,
    /// Active wallets, present when paired firmware bundles them.
    pub wallets: Option<ActiveWallets>,
}

/// The connect request payload is the static session public key.
pub(crate) fn encode_request(static_key: &SecretKey) -> [u8; EC_POINT_LEN] {
    crypto::encode_point(&static_key.public_key())
}

/// Decode a `connect` response payload (already unframed, never
/// encrypted at the envelope level).
pub(crate) fn decode_response(data: &[u8], static_key: &SecretKey) -> Result<ConnectResponse> {
    let mut r = Reader::new(data);
    let paired = match r.take_u8()? {
        0 => false,
        1 => true,
        _ => return Err(Error::Response("invalid pairing flag")),
    };
    let ephemeral_key = r.take_array::<EC_POINT_LEN>()?;
    let version = FirmwareVersion::from_wire(r.take_array::<4>()?);

    let wallets = if paired && r.remaining() >= ENC_WALLET_DATA_LEN {
        let blob = r.take(ENC_WALLET_DATA_LEN)?;
        Some(decrypt_wallet_data(blob, static_key, &ephemeral_key)?)
    } else {
        None
    };

    debug!(paired, %version, bundled_wallets = wallets.is_some(), "decoded connect response");
    Ok(ConnectResponse {
        paired,
        ephemeral_key,
        version,
        wallets,
    })
}

/// Decrypt the 160-byte wallet descriptor block bundled by newer
/// firmware: two 71-byte descriptors (internal then external) plus
/// zero slack, keyed by ECDH against the response's own ephemeral key.
fn decrypt_wallet_data(
    blob: &[u8],
    static_key: &SecretKey,
    ephemeral_key: &[u8; EC_POINT_LEN],
) -> Result<ActiveWallets> {
    let ephemeral = PublicKey::from_sec1_bytes(ephemeral_key)?;
    let secret = crypto::ecdh_shared_secret(static_key, &ephemeral);

    let mut block = blob.to_vec();
    crypto::decrypt_frame(&mut block, &secret)?;
    if block[block.len() - 2] != 0 || block[block.len() - 1] != 0 {
        return Err(Error::DecryptPadding);
    }

    let mut r = Reader::new(&block[..WALLET_DATA_LEN]);
    let internal = Wallet::decode(&mut r, false)?;
    let external = Wallet::decode(&mut r, true)?;
    Ok(ActiveWallets { internal, external })
}
