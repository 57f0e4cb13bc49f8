use smallvec::SmallVec;
use std::fmt::{Debug, Display};

use crate::errors::{StoreError, StoreResult};

/// Bytes of the bucket prefix byte string plus a 32 byte hash key fit inline
const INLINE_KEY_CAPACITY: usize = 48;

/// A full database key: the bucket prefix followed by the user key
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DbKey {
    path: SmallVec<[u8; INLINE_KEY_CAPACITY]>,
    prefix_len: usize,
}

impl DbKey {
    pub fn new<TKey: AsRef<[u8]>>(prefix: &[u8], key: TKey) -> Self {
        Self { path: prefix.iter().chain(key.as_ref().iter()).copied().collect(), prefix_len: prefix.len() }
    }

    pub fn prefix_only(prefix: &[u8]) -> Self {
        Self::new(prefix, [])
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// The user key, without the bucket prefix
    pub fn key(&self) -> &[u8] {
        &self.path[self.prefix_len..]
    }
}

impl AsRef<[u8]> for DbKey {
    fn as_ref(&self) -> &[u8] {
        &self.path
    }
}

impl Display for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // bucket prefixes are a length byte followed by the bucket name
        let name = self.path.get(1..self.prefix_len).unwrap_or_default();
        write!(f, "{}/{}", String::from_utf8_lossy(name), hex::encode(self.key()))
    }
}

impl Debug for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Encodes `v` as 8 big-endian bytes, so that numeric order matches key order
pub fn itob(v: u64) -> [u8; 8] {
    v.to_be_bytes()
}

/// Decodes a value produced by [`itob`]
pub fn btoi(bytes: &[u8]) -> StoreResult<u64> {
    let bytes: [u8; 8] =
        bytes.try_into().map_err(|_| StoreError::DataInconsistency(format!("expected 8 bytes integer, got {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(bytes))
}
