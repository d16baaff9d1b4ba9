//! Error types for Lattice client operations.

use crate::transport::TransportError;

/// Result type for Lattice client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Lattice client operations.
///
/// The variants map onto the recovery the caller has available:
/// [`Error::Validation`] and [`Error::FirmwareUnsupported`] are raised
/// locally before any bytes are sent, [`Error::Transport`] comes from
/// the HTTP collaborator unchanged, the integrity variants
/// ([`Error::Checksum`], [`Error::DecryptPadding`], [`Error::Response`])
/// reject a single exchange without advancing session state, and
/// [`Error::Device`] carries an explicit failure code from the device.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure, propagated as-is. Retry policy belongs
    /// to the transport, not to this layer.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Request parameters rejected locally, before transmission.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The connected firmware does not support the requested feature.
    #[error("firmware does not support {0}")]
    FirmwareUnsupported(&'static str),

    /// Explicit error code reported by the device.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Envelope or payload checksum mismatch.
    #[error("checksum mismatch (expected {expected:#010x}, got {actual:#010x})")]
    Checksum {
        /// Checksum carried by the message.
        expected: u32,
        /// Checksum recomputed over the received bytes.
        actual: u32,
    },

    /// Decrypted block failed the trailing zero-padding sanity check.
    #[error("failed to decrypt response: malformed padding")]
    DecryptPadding,

    /// Structurally malformed response.
    #[error("malformed response: {0}")]
    Response(&'static str),

    /// Fixed-buffer codec contract violation.
    #[error("codec error: {0}")]
    Codec(&'static str),

    /// Operation requires an established session (successful `connect`).
    #[error("no session: connect to the device first")]
    NotConnected,

    /// Invalid EC point or scalar.
    #[error(transparent)]
    EllipticCurve(#[from] k256::elliptic_curve::Error),

    /// ECDSA signing or signature parsing failure.
    #[error(transparent)]
    Ecdsa(#[from] k256::ecdsa::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with a formatted message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Error codes reported by the device inside the response envelope.
///
/// These are distinct from transport and integrity failures: the
/// exchange itself succeeded and the device answered with a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The device rejected the request as malformed.
    #[error("device rejected the request as invalid")]
    InvalidRequest,
    /// The device does not speak this protocol version.
    #[error("device does not support this protocol version")]
    UnsupportedVersion,
    /// Another request is being serviced.
    #[error("device is busy")]
    DeviceBusy,
    /// The user did not respond to the on-device prompt in time.
    #[error("timed out waiting for user approval")]
    UserTimeout,
    /// The user declined the request on the device.
    #[error("user declined the request")]
    UserDeclined,
    /// Pairing secret verification failed.
    #[error("pairing failed")]
    PairingFailed,
    /// The device is not accepting new pairings.
    #[error("pairing is disabled on the device")]
    PairingDisabled,
    /// The request requires automated signing permissions.
    #[error("automated signing is disabled")]
    AutomatedSigningDisabled,
    /// The device is locked and must be unlocked on-device.
    #[error("device is locked")]
    DeviceLocked,
    /// The requested wallet is not present on the device.
    #[error("requested wallet not found on device")]
    WrongWallet,
    /// The addressed record does not exist.
    #[error("record not found on device")]
    RecordNotFound,
    /// Unrecognised device error code.
    #[error("unknown device error code {0:#04x}")]
    Unknown(u8),
}

impl DeviceError {
    /// Map a response code byte to a device error. Zero is success.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => None,
            0x80 => Some(Self::InvalidRequest),
            0x81 => Some(Self::UnsupportedVersion),
            0x82 => Some(Self::DeviceBusy),
            0x83 => Some(Self::UserTimeout),
            0x84 => Some(Self::UserDeclined),
            0x85 => Some(Self::PairingFailed),
            0x86 => Some(Self::PairingDisabled),
            0x87 => Some(Self::AutomatedSigningDisabled),
            0x88 => Some(Self::DeviceLocked),
            0x89 => Some(Self::WrongWallet),
            0x8A => Some(Self::RecordNotFound),
            other => Some(Self::Unknown(other)),
        }
    }

    /// The wire code for this error.
    pub const fn code(&self) -> u8 {
        match self {
            Self::InvalidRequest => 0x80,
            Self::UnsupportedVersion => 0x81,
            Self::DeviceBusy => 0x82,
            Self::UserTimeout => 0x83,
            Self::UserDeclined => 0x84,
            Self::PairingFailed => 0x85,
            Self::PairingDisabled => 0x86,
            Self::AutomatedSigningDisabled => 0x87,
            Self::DeviceLocked => 0x88,
            Self::WrongWallet => 0x89,
            Self::RecordNotFound => 0x8A,
            Self::Unknown(code) => *code,
        }
    }
}
