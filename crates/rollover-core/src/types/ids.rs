//! # Identifiers and Time
//!
//! Fixed-width identifiers for accounts, series and vaults, and the injected
//! clock every time-dependent operation reads from.

use std::fmt;

use crate::constants::{ADDRESS_SIZE, SERIES_ID_SIZE, VAULT_ID_SIZE};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Unix timestamp in seconds
pub type Timestamp = i64;

/// Current time handed to an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct Clock {
    pub unix_timestamp: Timestamp,
}

impl Clock {
    pub const fn at(unix_timestamp: Timestamp) -> Self {
        Self { unix_timestamp }
    }
}

/// 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct Address(pub [u8; ADDRESS_SIZE]);

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_SIZE]);

    /// Build an address whose trailing eight bytes hold `value` (big-endian)
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[ADDRESS_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Series identifier (bytes6)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct SeriesId(pub [u8; SERIES_ID_SIZE]);

impl SeriesId {
    pub const ZERO: Self = Self([0u8; SERIES_ID_SIZE]);

    pub fn from_low_u32(value: u32) -> Self {
        let mut bytes = [0u8; SERIES_ID_SIZE];
        bytes[SERIES_ID_SIZE - 4..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Vault identifier (bytes12)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct VaultId(pub [u8; VAULT_ID_SIZE]);

impl VaultId {
    pub const ZERO: Self = Self([0u8; VAULT_ID_SIZE]);

    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; VAULT_ID_SIZE];
        bytes[VAULT_ID_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Rewards scheme identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct SchemeId(pub u32);

impl SchemeId {
    /// Scheme used by single-schedule deployments
    pub const DEFAULT: Self = Self(0);
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    write!(f, "0x")?;
    for byte in bytes {
        write!(f, "{:02x}", byte)?;
    }
    Ok(())
}

macro_rules! hex_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write_hex(f, &self.0)
                }
            }

            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write_hex(f, &self.0)
                }
            }
        )*
    };
}

hex_display!(Address, SeriesId, VaultId);
