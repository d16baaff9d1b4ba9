//! Cryptographic primitives for the secure channel.
//!
//! The channel key is an ECDH-then-hash shared secret between the
//! client's static session key and the device's current ephemeral key;
//! payloads are protected with AES-256-CBC over fixed-size zero-padded
//! frames under the protocol's fixed IV. The CRC-32 checksums layered
//! on top detect transport corruption only; confidentiality and
//! integrity come from the cipher layer.

use cipher::{BlockDecryptMut, BlockEncryptMut, Iv, Key, KeyIvInit, block_padding::NoPadding};
use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use sha2::{Digest, Sha256};

use crate::constants::{AES_IV, DER_SIG_SLOT_LEN, EC_POINT_LEN};
use crate::error::{Error, Result};

type Encryptor = cbc::Encryptor<aes::Aes256>;
type Decryptor = cbc::Decryptor<aes::Aes256>;

/// Derive the 32-byte channel secret: SHA-256 over the x-coordinate of
/// the peer point scaled by the local scalar.
pub fn ecdh_shared_secret(private: &SecretKey, peer: &PublicKey) -> [u8; 32] {
    let shared =
        k256::elliptic_curve::ecdh::diffie_hellman(private.to_nonzero_scalar(), peer.as_affine());
    Sha256::digest(shared.raw_secret_bytes()).into()
}

/// Encode a public key as an uncompressed 65-byte SEC1 point.
pub fn encode_point(key: &PublicKey) -> [u8; EC_POINT_LEN] {
    let point = key.to_encoded_point(false);
    // Uncompressed secp256k1 points are always 65 bytes.
    point.as_bytes().try_into().unwrap()
}

/// Encrypt a frame in place with AES-256-CBC under the protocol IV.
/// The buffer must already be zero-padded to a multiple of 16 bytes.
pub fn encrypt_frame(buf: &mut [u8], key: &[u8; 32]) -> Result<()> {
    let len = buf.len();
    Encryptor::new(Key::<Encryptor>::from_slice(key), Iv::<Encryptor>::from_slice(&AES_IV))
        .encrypt_padded_mut::<NoPadding>(buf, len)
        .map_err(|_| Error::Codec("encryption frame not block aligned"))?;
    Ok(())
}

/// Decrypt a frame in place. Fails on non-block-aligned input; the
/// trailing zero-padding sanity check belongs to the caller, which
/// knows the frame layout.
pub fn decrypt_frame(buf: &mut [u8], key: &[u8; 32]) -> Result<()> {
    Decryptor::new(Key::<Decryptor>::from_slice(key), Iv::<Decryptor>::from_slice(&AES_IV))
        .decrypt_padded_mut::<NoPadding>(buf)
        .map_err(|_| Error::DecryptPadding)?;
    Ok(())
}

/// CRC-32 (IEEE) over the given byte range.
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Sign a message with the session's static key: ECDSA over the
/// SHA-256 digest of `msg`, DER-encoded.
pub fn sign_message(private: &SecretKey, msg: &[u8]) -> Result<Vec<u8>> {
    let key = SigningKey::from(private);
    let signature: Signature = key.try_sign(msg)?;
    Ok(signature.to_der().as_bytes().to_vec())
}

/// Place a DER signature into a fixed 74-byte slot, right-zero-padded.
pub fn pack_der_signature(der: &[u8]) -> Result<[u8; DER_SIG_SLOT_LEN]> {
    if der.len() < 2 || der.len() > DER_SIG_SLOT_LEN {
        return Err(Error::validation("DER signature does not fit a 74-byte slot"));
    }
    if der[0] != 0x30 || der[1] as usize != der.len() - 2 {
        return Err(Error::validation("malformed DER signature"));
    }
    let mut slot = [0u8; DER_SIG_SLOT_LEN];
    slot[..der.len()].copy_from_slice(der);
    Ok(slot)
}

/// Recover a DER signature from a fixed slot. The true length comes
/// from the DER length byte at offset 1, never from the slot size.
pub fn unpack_der_signature(slot: &[u8]) -> Result<Vec<u8>> {
    if slot.len() < 2 || slot[0] != 0x30 {
        return Err(Error::Response("missing DER signature marker"));
    }
    let len = slot[1] as usize;
    if 2 + len > slot.len() {
        return Err(Error::Response("DER length exceeds signature slot"));
    }
    Ok(slot[..2 + len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::VerifyingKey;
    use k256::ecdsa::signature::Verifier;

    #[test]
    fn ecdh_is_symmetric() {
        let a = SecretKey::random(&mut rand_v8::thread_rng());
        let b = SecretKey::random(&mut rand_v8::thread_rng());

        let ab = ecdh_shared_secret(&a, &b.public_key());
        let ba = ecdh_shared_secret(&b, &a.public_key());
        assert_eq!(ab, ba);
    }

    #[test]
    fn frame_encryption_round_trips() {
        let key = [0x42u8; 32];
        let mut frame = vec![0u8; 64];
        frame[..11].copy_from_slice(b"hello world");

        let reference = frame.clone();
        encrypt_frame(&mut frame, &key).unwrap();
        assert_ne!(frame, reference);
        decrypt_frame(&mut frame, &key).unwrap();
        assert_eq!(frame, reference);
    }

    #[test]
    fn unaligned_frames_are_rejected() {
        let key = [0u8; 32];
        let mut frame = vec![0u8; 30];
        assert!(encrypt_frame(&mut frame, &key).is_err());
        assert!(matches!(
            decrypt_frame(&mut frame, &key),
            Err(Error::DecryptPadding)
        ));
    }

    #[test]
    fn der_slot_recovers_a_70_byte_signature() {
        // 0x30, len 68, then two 32-byte INTEGERs: 70 bytes total.
        let mut der = vec![0x30, 68, 0x02, 32];
        der.extend_from_slice(&[0x11; 32]);
        der.extend_from_slice(&[0x02, 32]);
        der.extend_from_slice(&[0x22; 32]);
        assert_eq!(der.len(), 70);

        let slot = pack_der_signature(&der).unwrap();
        assert_eq!(&slot[70..], &[0, 0, 0, 0]);
        assert_eq!(unpack_der_signature(&slot).unwrap(), der);
    }

    #[test]
    fn pairing_signatures_verify_and_survive_the_slot() {
        let key = SecretKey::random(&mut rand_v8::thread_rng());
        let msg = b"pairing digest preimage";

        let der = sign_message(&key, msg).unwrap();
        let slot = pack_der_signature(&der).unwrap();
        let recovered = unpack_der_signature(&slot).unwrap();
        assert_eq!(recovered, der);

        let sig = Signature::from_der(&recovered).unwrap();
        VerifyingKey::from(&key.public_key())
            .verify(msg, &sig)
            .unwrap();
    }
}
