//! Wallet descriptors reported by the device.

use serde::{Deserialize, Serialize};

use crate::codec::Reader;
#[cfg(test)]
use crate::codec::Writer;
use crate::constants::{EMPTY_WALLET_UID, WALLET_NAME_LEN, WALLET_UID_LEN};
use crate::error::Result;

/// A logical wallet on the device: the built-in wallet or a SafeCard.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// 32-byte wallet identity. All zeros means "no wallet".
    pub uid: [u8; WALLET_UID_LEN],
    /// Human-readable name, ASCII, at most 34 characters on the wire.
    pub name: String,
    /// Capability bitflags reported by the device.
    pub capabilities: u32,
    /// Whether this wallet lives on an external SafeCard.
    pub external: bool,
}

impl Wallet {
    /// The absent-wallet sentinel.
    pub const fn empty(external: bool) -> Self {
        Self {
            uid: EMPTY_WALLET_UID,
            name: String::new(),
            capabilities: 0,
            external,
        }
    }

    /// A wallet with the all-zero UID is treated as not present.
    pub fn is_empty(&self) -> bool {
        self.uid == EMPTY_WALLET_UID
    }

    /// Decode one fixed-size wallet descriptor:
    /// `[uid 32][capabilities u32 LE][name 35]`.
    pub(crate) fn decode(r: &mut Reader<'_>, external: bool) -> Result<Self> {
        let uid = r.take_array::<WALLET_UID_LEN>()?;
        let capabilities = r.take_u32_le()?;
        let name = r.take_str_slot(WALLET_NAME_LEN)?;
        Ok(Self {
            uid,
            name,
            capabilities,
            external,
        })
    }

    #[cfg(test)]
    pub(crate) fn encode(&self, w: &mut Writer<'_>) -> Result<()> {
        w.put_bytes(&self.uid)?;
        w.put_u32_le(self.capabilities)?;
        w.put_str_slot(&self.name, WALLET_NAME_LEN)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("uid", &hex::encode(self.uid))
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("external", &self.external)
            .finish()
    }
}

/// The device's current wallets, cached from `connect` or
/// `fetchActiveWallet` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWallets {
    /// The built-in device wallet.
    pub internal: Wallet,
    /// The SafeCard wallet, if one is inserted.
    pub external: Wallet,
}

impl Default for ActiveWallets {
    fn default() -> Self {
        Self {
            internal: Wallet::empty(false),
            external: Wallet::empty(true),
        }
    }
}

impl ActiveWallets {
    /// The wallet requests should target. An inserted SafeCard takes
    /// precedence over the internal wallet.
    pub fn active(&self) -> Option<&Wallet> {
        if !self.external.is_empty() {
            Some(&self.external)
        } else if !self.internal.is_empty() {
            Some(&self.internal)
        } else {
            None
        }
    }

    /// Whether any wallet is present at all.
    pub fn has_active(&self) -> bool {
        self.active().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(fill: u8, name: &str, external: bool) -> Wallet {
        Wallet {
            uid: [fill; WALLET_UID_LEN],
            name: name.into(),
            capabilities: 3,
            external,
        }
    }

    #[test]
    fn zero_uid_means_absent() {
        assert!(Wallet::empty(false).is_empty());
        assert!(!wallet(1, "w", false).is_empty());

        let none = ActiveWallets::default();
        assert!(!none.has_active());
        assert!(none.active().is_none());
    }

    #[test]
    fn safecard_takes_precedence() {
        let both = ActiveWallets {
            internal: wallet(1, "internal", false),
            external: wallet(2, "card", true),
        };
        assert_eq!(both.active().unwrap().name, "card");

        let internal_only = ActiveWallets {
            internal: wallet(1, "internal", false),
            external: Wallet::empty(true),
        };
        assert_eq!(internal_only.active().unwrap().name, "internal");
    }

    #[test]
    fn descriptor_round_trip() {
        let w = wallet(7, "Main Wallet", true);
        let mut buf = [0u8; 71];
        w.encode(&mut Writer::new(&mut buf)).unwrap();

        let decoded = Wallet::decode(&mut Reader::new(&buf), true).unwrap();
        assert_eq!(decoded, w);
    }
}
