use serde::{Deserialize, Serialize};
use visor_hashes::Hash;

use crate::hashing;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Cached hash
    pub hash: Hash,
    pub version: u32,
    pub time: u64,
    /// Block height, starting at 0 for genesis
    pub seq: u64,
    pub fee: u64,
    pub prev_hash: Hash,
    pub body_hash: Hash,
    /// Commitment to the unspent output set after applying this block
    pub ux_hash: Hash,
}

impl Header {
    pub fn new(version: u32, time: u64, seq: u64, fee: u64, prev_hash: Hash, body_hash: Hash, ux_hash: Hash) -> Self {
        let mut header = Self { hash: Default::default(), version, time, seq, fee, prev_hash, body_hash, ux_hash };
        header.finalize();
        header
    }

    /// Recomputes the cached hash. Must be called after any field modification.
    pub fn finalize(&mut self) {
        self.hash = hashing::header::hash(self);
    }
}
