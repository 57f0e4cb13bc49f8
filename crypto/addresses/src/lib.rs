use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

pub const KEY_SIZE: usize = 20;
pub const CHECKSUM_SIZE: usize = 4;
/// Length of the decoded base58 payload: key, version and checksum
pub const ADDRESS_SIZE: usize = KEY_SIZE + 1 + CHECKSUM_SIZE;
/// Length of [`Address::to_storage_bytes`]
pub const STORAGE_KEY_SIZE: usize = KEY_SIZE + 1;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("invalid base58 character in address")]
    DecodingError,

    #[error("invalid address length {0}")]
    InvalidLength(usize),

    #[error("invalid address version {0}")]
    InvalidVersion(u8),

    #[error("invalid address checksum")]
    BadChecksum,
}

///
/// Address `version`. Only [`Version::PubKey`] addresses are valid on the ledger.
///
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
#[repr(u8)]
pub enum Version {
    PubKey = 0,
}

impl TryFrom<u8> for Version {
    type Error = AddressError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Version::PubKey),
            _ => Err(AddressError::InvalidVersion(value)),
        }
    }
}

/// A coin owner: a 20-byte key hash plus a version byte.
///
/// The textual form is base58 over `key ++ version ++ checksum`, where the
/// checksum is the first four bytes of `sha256(key ++ version)`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default)]
pub struct Address {
    pub version: u8,
    pub key: [u8; KEY_SIZE],
}

impl Address {
    pub const fn new(version: Version, key: [u8; KEY_SIZE]) -> Self {
        Self { version: version as u8, key }
    }

    fn checksum(&self) -> [u8; CHECKSUM_SIZE] {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update([self.version]);
        let digest = hasher.finalize();
        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&digest[..CHECKSUM_SIZE]);
        checksum
    }

    /// `key ++ version ++ checksum`
    pub fn to_bytes(&self) -> [u8; ADDRESS_SIZE] {
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[..KEY_SIZE].copy_from_slice(&self.key);
        bytes[KEY_SIZE] = self.version;
        bytes[KEY_SIZE + 1..].copy_from_slice(&self.checksum());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != ADDRESS_SIZE {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let address = Self::from_storage_bytes(&bytes[..STORAGE_KEY_SIZE])?;
        if address.checksum() != bytes[STORAGE_KEY_SIZE..] {
            return Err(AddressError::BadChecksum);
        }
        Version::try_from(address.version)?;
        Ok(address)
    }

    /// Compact `key ++ version` form used as a database key
    pub fn to_storage_bytes(&self) -> [u8; STORAGE_KEY_SIZE] {
        let mut bytes = [0u8; STORAGE_KEY_SIZE];
        bytes[..KEY_SIZE].copy_from_slice(&self.key);
        bytes[KEY_SIZE] = self.version;
        bytes
    }

    pub fn from_storage_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != STORAGE_KEY_SIZE {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes[..KEY_SIZE]);
        Ok(Self { version: bytes[KEY_SIZE], key })
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&bs58::encode(self.to_bytes()).into_string())
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let bytes = bs58::decode(s).into_vec().map_err(|_| AddressError::DecodingError)?;
        Self::from_bytes(&bytes)
    }
}

impl TryFrom<&str> for Address {
    type Error = AddressError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() { serializer.collect_str(self) } else { (self.version, self.key).serialize(serializer) }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
            Address::from_str(&s).map_err(D::Error::custom)
        } else {
            let (version, key) = <(u8, [u8; KEY_SIZE])>::deserialize(deserializer)?;
            Ok(Address { version, key })
        }
    }
}
