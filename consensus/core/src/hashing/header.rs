use super::HasherExtensions;
use crate::{header::Header, tx::Transaction};
use visor_hashes::{Hash, Hasher, Sha256};

/// Returns the header hash, which is also the block hash
pub fn hash(header: &Header) -> Hash {
    let mut hasher = Sha256::default();
    hasher
        .update(header.version.to_le_bytes())
        .write_u64(header.time)
        .write_u64(header.seq)
        .write_u64(header.fee)
        .update(header.prev_hash)
        .update(header.body_hash)
        .update(header.ux_hash);
    hasher.finalize()
}

/// Commitment to the ordered transaction ids of a block body
pub fn body_hash(transactions: &[Transaction]) -> Hash {
    let ids = transactions.iter().map(|tx| tx.id()).collect::<Vec<_>>();
    let mut hasher = Sha256::default();
    hasher.write_hashes(&ids);
    hasher.finalize()
}
