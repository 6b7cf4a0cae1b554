//! Account identity handle
//!
//! Identities are 20-byte, ledger-address shaped handles. They are rendered
//! as `0x`-prefixed lowercase hex so that handles minted by the original
//! wallet tooling keep round-tripping through the API unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AccessError;

/// Number of bytes in an identity handle
pub const IDENTITY_LEN: usize = 20;

/// An opaque account handle (owner or requester)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// The null handle. Never a valid requester.
    pub const ZERO: Identity = Identity([0u8; IDENTITY_LEN]);

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a handle from public key material (trailing 20 bytes of its Blake3 hash)
    pub fn from_public_key(pubkey_bytes: &[u8]) -> Self {
        let hash = blake3::hash(pubkey_bytes);
        let mut bytes = [0u8; IDENTITY_LEN];
        bytes.copy_from_slice(&hash.as_bytes()[32 - IDENTITY_LEN..]);
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Encode as `0x`-prefixed lowercase hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Decode from hex, with or without the `0x` prefix
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != IDENTITY_LEN * 2 {
            return None;
        }
        let bytes = hex::decode(digits).ok()?;
        let arr: [u8; IDENTITY_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", &self.to_hex()[..10])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Identity {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AccessError::InvalidIdentity(s.to_string()))
    }
}

impl From<[u8; IDENTITY_LEN]> for Identity {
    fn from(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Identity::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid identity: {s}")))
    }
}
