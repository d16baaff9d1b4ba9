//! Wire-contract constants.
//!
//! Every value here is parsed by deployed device firmware at a fixed
//! offset. The sizes are external protocol constants and must match the
//! device exactly, including the deliberately oversized encrypted
//! response buffers the firmware allocates. Do not "fix" them.

/// Protocol version byte carried in every envelope header.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Length of the outer envelope header: version, type, message id, payload length.
pub const HEADER_LEN: usize = 8;

/// Fixed capacity of the request payload buffer. Requests always carry
/// the full buffer on the wire, zero-padded past the declared length.
pub const REQUEST_PAYLOAD_LEN: usize = 1728;

/// Total wire size of a request: header, fixed payload buffer, CRC-32 trailer.
pub const REQUEST_MSG_LEN: usize = HEADER_LEN + REQUEST_PAYLOAD_LEN + 4;

/// Size of the AES frame holding an encrypted request
/// (`request code || payload`, zero-padded).
pub const ENC_MSG_LEN: usize = 1728;

/// Fixed IV used by the device for all CBC operations.
pub const AES_IV: [u8; 16] = *b"mysecretpassword";

/// Uncompressed SEC1 EC point length.
pub const EC_POINT_LEN: usize = 65;

/// Fixed slot size for device-returned DER ECDSA signatures. The
/// actual signature length is recovered from the DER length byte at
/// offset 1; the remainder of the slot is zero.
pub const DER_SIG_SLOT_LEN: usize = 74;

/// Signer identifier slot (pubkey hash) paired with each signature slot.
pub const SIGNER_SLOT_LEN: usize = 20;

/// Wallet UID length.
pub const WALLET_UID_LEN: usize = 32;

/// All-zero wallet UID: the device's "no wallet here" sentinel.
pub const EMPTY_WALLET_UID: [u8; WALLET_UID_LEN] = [0u8; WALLET_UID_LEN];

/// Fixed wallet name slot, NUL-padded ASCII.
pub const WALLET_NAME_LEN: usize = 35;

/// Encoded wallet descriptor: uid, capability bits, name slot.
pub const WALLET_DESCRIPTOR_LEN: usize = WALLET_UID_LEN + 4 + WALLET_NAME_LEN;

/// Plaintext size of the two-wallet descriptor block (internal then external).
pub const WALLET_DATA_LEN: usize = 2 * WALLET_DESCRIPTOR_LEN;

/// Encrypted size of the wallet descriptor block bundled into `connect`
/// responses on firmware that supports it.
pub const ENC_WALLET_DATA_LEN: usize = 160;

/// Fixed application name slot sent while pairing, NUL-padded ASCII.
pub const APP_NAME_LEN: usize = 25;

/// Fixed slot for one derived address string, NUL-terminated ASCII.
pub const ADDR_STR_LEN: usize = 129;

/// Maximum number of derivation path indices in a request.
pub const MAX_PATH_DEPTH: usize = 5;

/// Continuation code echoed back with every extra data frame.
pub const NEXT_CODE_LEN: usize = 8;

/// Size of the result slot inside a decrypted signing response.
pub const SIGN_RESULT_LEN: usize = 1024;

/// Decrypted data length of a signing response:
/// pending flag, continuation code, result slot.
pub const SIGN_RESP_DATA_LEN: usize = 1 + NEXT_CODE_LEN + SIGN_RESULT_LEN;
