//! Session state for one device.
//!
//! A session owns the client's static secp256k1 key and tracks the
//! moving parts of the channel: the device's current ephemeral public
//! key, the firmware capability table, and the cached active wallets.
//! The shared secret is derived on demand from the static key and the
//! latest ephemeral key and rotates with every successful encrypted
//! exchange. The client mutates session fields only after a response
//! has passed every integrity check, so a failed request never
//! desynchronizes the channel.

use k256::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::constants::EC_POINT_LEN;
use crate::crypto;
use crate::error::{Error, Result};
use crate::firmware::{FirmwareConstants, FirmwareVersion};
use crate::wallet::ActiveWallets;

/// Live session state. Build one with [`Session::new`] and hand it to a
/// [`LatticeClient`](crate::client::LatticeClient), or rehydrate a
/// previous session from a [`PersistedSession`].
pub struct Session {
    static_key: SecretKey,
    device_id: String,
    base_url: String,
    paired: bool,
    ephemeral_key: Option<PublicKey>,
    fw_version: Option<FirmwareVersion>,
    fw_constants: Option<FirmwareConstants>,
    active_wallets: ActiveWallets,
}

impl Session {
    /// Start a fresh session with a newly generated static key.
    pub fn new(device_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_static_key(
            device_id,
            base_url,
            SecretKey::random(&mut rand_v8::thread_rng()),
        )
    }

    /// Start a session with a caller-provided static key. The same key
    /// always maps to the same pairing on the device.
    pub fn with_static_key(
        device_id: impl Into<String>,
        base_url: impl Into<String>,
        static_key: SecretKey,
    ) -> Self {
        Self {
            static_key,
            device_id: device_id.into(),
            base_url: base_url.into(),
            paired: false,
            ephemeral_key: None,
            fw_version: None,
            fw_constants: None,
            active_wallets: ActiveWallets::default(),
        }
    }

    /// The device identifier this session targets.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Endpoint URL for this device on the bridge.
    pub fn url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.device_id)
    }

    /// Whether the device reported this client as paired.
    pub fn is_paired(&self) -> bool {
        self.paired
    }

    pub(crate) fn set_paired(&mut self, paired: bool) {
        self.paired = paired;
    }

    /// The static session key.
    pub(crate) fn static_key(&self) -> &SecretKey {
        &self.static_key
    }

    /// The static session public key, as shared with the device.
    pub fn public_key(&self) -> PublicKey {
        self.static_key.public_key()
    }

    /// Firmware version reported by the last `connect`.
    pub fn firmware_version(&self) -> Option<FirmwareVersion> {
        self.fw_version
    }

    /// Capability table for the connected firmware.
    pub fn firmware(&self) -> Result<&FirmwareConstants> {
        self.fw_constants.as_ref().ok_or(Error::NotConnected)
    }

    /// Record the firmware version from a `connect` response and derive
    /// its capability table.
    pub(crate) fn set_firmware(&mut self, version: FirmwareVersion) -> Result<()> {
        let constants = FirmwareConstants::for_version(version);
        constants.validate()?;
        self.fw_version = Some(version);
        self.fw_constants = Some(constants);
        Ok(())
    }

    /// The cached active wallets.
    pub fn active_wallets(&self) -> &ActiveWallets {
        &self.active_wallets
    }

    pub(crate) fn set_active_wallets(&mut self, wallets: ActiveWallets) {
        self.active_wallets = wallets;
    }

    /// Derive the current channel secret. Fails before the first
    /// `connect` delivers an ephemeral key.
    pub(crate) fn shared_secret(&self) -> Result<Zeroizing<[u8; 32]>> {
        let ephemeral = self.ephemeral_key.as_ref().ok_or(Error::NotConnected)?;
        Ok(Zeroizing::new(crypto::ecdh_shared_secret(
            &self.static_key,
            ephemeral,
        )))
    }

    /// Persist the device's next ephemeral key. Called once per
    /// validated response; the previous key is gone for good, which is
    /// what makes replaying an old request fail.
    pub(crate) fn update_ephemeral_key(&mut self, raw: &[u8; EC_POINT_LEN]) -> Result<()> {
        self.ephemeral_key = Some(PublicKey::from_sec1_bytes(raw)?);
        Ok(())
    }

    /// Snapshot this session for storage. The snapshot contains the
    /// static private key; treat it like one.
    pub fn persist(&self) -> PersistedSession {
        PersistedSession {
            device_id: self.device_id.clone(),
            base_url: self.base_url.clone(),
            paired: self.paired,
            static_key: self.static_key.to_bytes().to_vec(),
            ephemeral_key: self
                .ephemeral_key
                .as_ref()
                .map(|key| crypto::encode_point(key).to_vec()),
            fw_version: self.fw_version,
            active_wallets: self.active_wallets.clone(),
        }
    }

    /// Rehydrate a session from a snapshot without re-pairing. Two
    /// sessions restored from the same snapshot derive identical
    /// addresses and signatures.
    pub fn restore(persisted: PersistedSession) -> Result<Self> {
        let static_key = SecretKey::from_slice(&persisted.static_key)?;
        let ephemeral_key = persisted
            .ephemeral_key
            .as_deref()
            .map(PublicKey::from_sec1_bytes)
            .transpose()?;

        let mut session = Self::with_static_key(persisted.device_id, persisted.base_url, static_key);
        session.paired = persisted.paired;
        session.ephemeral_key = ephemeral_key;
        if let Some(version) = persisted.fw_version {
            session.set_firmware(version)?;
        }
        session.active_wallets = persisted.active_wallets;
        Ok(session)
    }
}

// Keys never appear in logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("device_id", &self.device_id)
            .field("base_url", &self.base_url)
            .field("paired", &self.paired)
            .field("has_ephemeral_key", &self.ephemeral_key.is_some())
            .field("fw_version", &self.fw_version)
            .field("active_wallets", &self.active_wallets)
            .finish_non_exhaustive()
    }
}

/// Serializable session snapshot: everything needed to resume a paired
/// session, including the static private key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Device identifier.
    pub device_id: String,
    /// Bridge base URL.
    pub base_url: String,
    /// Pairing state at snapshot time.
    pub paired: bool,
    /// Static private key scalar, 32 bytes.
    pub static_key: Vec<u8>,
    /// Last ephemeral public key, uncompressed SEC1, if connected.
    pub ephemeral_key: Option<Vec<u8>>,
    /// Firmware version, if connected.
    pub fw_version: Option<FirmwareVersion>,
    /// Cached wallet descriptors.
    pub active_wallets: ActiveWallets,
}
