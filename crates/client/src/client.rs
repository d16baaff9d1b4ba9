//! The device client.
//!
//! One method per device operation, all taking `&mut self`: the channel
//! re-keys after every response, so requests against one session are
//! strictly serialized. Every encrypted exchange runs the same
//! pipeline: encode, encrypt, frame, transmit, verify, decrypt, then
//! persist the device's next ephemeral key. Session fields are only
//! touched after a response has passed every integrity check.

use bytes::Bytes;
use tracing::{debug, info};

use crate::commands::{
    self, AddressData, ConnectResponse, Eip2335Bundle, EncryptedRequestCode, ExportEncDataRequest,
    GenericSignature, GetAddressesRequest, GetKvRecordsRequest, KvEntry, KvRecordsPage,
    SignRequest,
};
use crate::constants::{SIGN_RESP_DATA_LEN, WALLET_DATA_LEN};
use crate::envelope::{self, RequestType};
use crate::error::{Error, Result};
use crate::frames;
use crate::session::Session;
use crate::transport::Transport;
use crate::wallet::ActiveWallets;

/// A client for one Lattice device, driving a [`Session`] over a
/// [`Transport`].
#[derive(Debug)]
pub struct LatticeClient<T> {
    session: Session,
    transport: T,
}

impl<T: Transport> LatticeClient<T> {
    /// Pair a session with a transport.
    pub fn new(session: Session, transport: T) -> Self {
        Self { session, transport }
    }

    /// The underlying session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Tear down the client, keeping the session for persistence.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Establish (or resume) the session. Returns whether this client
    /// is already paired with the device; an unpaired client must call
    /// [`pair`](Self::pair) with the secret shown on the device screen
    /// before any other operation.
    pub fn connect(&mut self) -> Result<bool> {
        let msg_id = rand::random();
        let payload = commands::connect::encode_request(self.session.static_key());
        let request = envelope::frame_request(RequestType::Connect, msg_id, &payload)?;

        debug!(device_id = self.session.device_id(), "connecting");
        let raw = self.transport.request(&self.session.url(), &request)?;
        let data = envelope::parse_response(&raw, msg_id)?;
        let resp = commands::connect::decode_response(&data, self.session.static_key())?;

        self.apply_connect_response(&resp)?;
        if resp.paired && resp.wallets.is_none() {
            // Old firmware does not bundle wallet data into connect.
            self.fetch_active_wallet()?;
        }

        info!(
            device_id = self.session.device_id(),
            paired = resp.paired,
            version = %resp.version,
            "connected"
        );
        Ok(resp.paired)
    }

    fn apply_connect_response(&mut self, resp: &ConnectResponse) -> Result<()> {
        self.session.set_firmware(resp.version)?;
        self.session.update_ephemeral_key(&resp.ephemeral_key)?;
        self.session.set_paired(resp.paired);
        if let Some(wallets) = &resp.wallets {
            self.session.set_active_wallets(wallets.clone());
        }
        Ok(())
    }

    /// Finalize a pairing started on the device: the user has put the
    /// device into pairing mode and it is displaying `pairing_secret`.
    /// `app_name` is how this client will be listed in the device's
    /// permissions screen.
    pub fn pair(&mut self, app_name: &str, pairing_secret: &str) -> Result<()> {
        let payload =
            commands::pair::encode_request(app_name, pairing_secret, self.session.static_key())?;
        self.encrypted_request(EncryptedRequestCode::FinalizePairing, &payload, 0)?;
        self.session.set_paired(true);
        info!(device_id = self.session.device_id(), app_name, "paired");

        // The wallet state only becomes visible once paired.
        self.fetch_active_wallet()?;
        Ok(())
    }

    /// Derive addresses or raw public keys.
    pub fn get_addresses(&mut self, req: &GetAddressesRequest) -> Result<AddressData> {
        let fw = *self.session.firmware()?;
        let payload = commands::get_addresses::encode_request(req, &fw)?;
        let data = self.encrypted_request(
            EncryptedRequestCode::GetAddresses,
            &payload,
            fw.addr_resp_data_len(),
        )?;
        commands::get_addresses::decode_response(&data, req, &fw)
    }

    /// Request signatures over a prebuilt payload, driving the
    /// multi-frame continuation when the payload exceeds a single
    /// frame. A failure on any frame aborts the whole operation; the
    /// caller restarts from scratch.
    pub fn sign(&mut self, req: &SignRequest) -> Result<Vec<GenericSignature>> {
        let fw = *self.session.firmware()?;
        let framed = frames::split_payload(&req.data, &fw)?;
        let mut queue = framed.extra;
        debug!(
            schema = ?req.schema,
            payload_len = req.data.len(),
            extra_frames = queue.len(),
            "signing"
        );

        let payload = commands::sign::encode_request(req, &framed.primary, !queue.is_empty())?;
        let mut frame = commands::sign::decode_frame(&self.encrypted_request(
            EncryptedRequestCode::Sign,
            &payload,
            SIGN_RESP_DATA_LEN,
        )?)?;

        while frame.pending {
            let chunk = queue
                .pop_front()
                .ok_or(Error::Response("device expects more data than was queued"))?;
            let payload =
                frames::encode_extra_frame(&frame.next_code, &chunk, !queue.is_empty())?;
            frame = commands::sign::decode_frame(&self.encrypted_request(
                EncryptedRequestCode::Sign,
                &payload,
                SIGN_RESP_DATA_LEN,
            )?)?;
        }
        if !queue.is_empty() {
            return Err(Error::Response("device finished before consuming all frames"));
        }

        commands::sign::parse_generic_signatures(&frame.result)
    }

    /// Fetch the active wallet descriptors and cache them on the
    /// session. Called automatically after `connect` on firmware that
    /// does not bundle wallet data, and after `pair`.
    pub fn fetch_active_wallet(&mut self) -> Result<ActiveWallets> {
        let data =
            self.encrypted_request(EncryptedRequestCode::GetWallets, &[], WALLET_DATA_LEN)?;
        let wallets = commands::fetch_active_wallet::decode_response(&data)?;
        debug!(has_active = wallets.has_active(), "fetched active wallets");
        self.session.set_active_wallets(wallets.clone());
        Ok(wallets)
    }

    /// Enumerate key/value records.
    pub fn get_kv_records(&mut self, req: &GetKvRecordsRequest) -> Result<KvRecordsPage> {
        let fw = *self.session.firmware()?;
        let payload = commands::get_kv_records::encode_request(req, &fw)?;
        let data = self.encrypted_request(
            EncryptedRequestCode::GetKvRecords,
            &payload,
            fw.kv_resp_data_len(),
        )?;
        commands::get_kv_records::decode_response(&data, &fw)
    }

    /// Create key/value records. Ids are assigned by the device.
    pub fn add_kv_records(&mut self, entries: &[KvEntry]) -> Result<()> {
        let fw = *self.session.firmware()?;
        let payload = commands::add_kv_records::encode_request(entries, &fw)?;
        self.encrypted_request(EncryptedRequestCode::AddKvRecords, &payload, 0)?;
        Ok(())
    }

    /// Delete key/value records by id.
    pub fn remove_kv_records(&mut self, record_type: u32, ids: &[u32]) -> Result<()> {
        let fw = *self.session.firmware()?;
        let payload = commands::remove_kv_records::encode_request(record_type, ids, &fw)?;
        self.encrypted_request(EncryptedRequestCode::RemoveKvRecords, &payload, 0)?;
        Ok(())
    }

    /// Export an encrypted data bundle (EIP-2335 keystore share).
    pub fn export_enc_data(&mut self, req: &ExportEncDataRequest) -> Result<Eip2335Bundle> {
        let fw = *self.session.firmware()?;
        let payload = commands::export_enc_data::encode_request(req, &fw)?;
        let data = self.encrypted_request(
            EncryptedRequestCode::ExportEncData,
            &payload,
            commands::export_enc_data::RESP_DATA_LEN,
        )?;
        commands::export_enc_data::decode_response(&data)
    }

    /// One encrypted round trip. The session's ephemeral key advances
    /// only after the response passes its checksum and padding checks,
    /// so a failed exchange is retryable with the same shared secret.
    fn encrypted_request(
        &mut self,
        code: EncryptedRequestCode,
        payload: &[u8],
        data_len: usize,
    ) -> Result<Bytes> {
        let secret = self.session.shared_secret()?;
        let frame = envelope::encrypt_request_payload(code, payload, &secret)?;

        let msg_id = rand::random();
        let request = envelope::frame_request(RequestType::Encrypted, msg_id, &frame)?;
        let raw = self.transport.request(&self.session.url(), &request)?;

        let encrypted = envelope::parse_response(&raw, msg_id)?;
        let (ephemeral, data) = envelope::decrypt_response(&encrypted, data_len, &secret)?;
        self.session.update_ephemeral_key(&ephemeral)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WALLET_UID_LEN;

    struct NoTransport;

    impl Transport for NoTransport {
        fn request(&mut self, _url: &str, _payload: &[u8]) -> std::result::Result<Bytes, crate::transport::TransportError> {
            panic!("no request expected");
        }
    }

    #[test]
    fn operations_require_a_connected_session() {
        let session = Session::new("dev", "http://localhost:8080");
        let mut client = LatticeClient::new(session, NoTransport);

        let req = GetAddressesRequest {
            wallet_uid: [1; WALLET_UID_LEN],
            start_path: vec![0x80000000],
            n: 1,
            flag: Default::default(),
        };
        assert!(matches!(
            client.get_addresses(&req),
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            client.fetch_active_wallet(),
            Err(Error::NotConnected)
        ));
    }
}
