use visor_addresses::Address;
use visor_consensus_core::{
    Block,
    tx::{TransactionId, UxOutId},
};
use visor_hashes::Hash;

use crate::{
    errors::HistoryResult,
    model::{Richlist, TransactionRecord, TransactionResult, UxOutRecord},
};

/// Read-only queries over the history index.
///
/// Methods combining several stores read from a single snapshot, so a
/// concurrently committed block is either fully visible or not at all.
pub trait HistoryIndexRetrievalApi: Send + Sync {
    /// Height of the highest fully indexed block, -1 if none
    fn parsed_height(&self) -> HistoryResult<i64>;

    fn get_uxout(&self, id: &UxOutId) -> HistoryResult<Option<UxOutRecord>>;

    fn get_transaction(&self, id: &TransactionId) -> HistoryResult<Option<TransactionRecord>>;

    /// Transactions in which `address` owns an input or an output, in confirmation order
    fn get_address_txns(&self, address: &Address) -> HistoryResult<Vec<TransactionResult>>;

    /// Every output `address` ever owned, spent or not
    fn get_address_uxouts(&self, address: &Address) -> HistoryResult<Vec<UxOutRecord>>;

    /// Number of distinct addresses which ever owned an output
    fn get_address_count(&self) -> HistoryResult<usize>;

    /// Addresses with a non-zero unspent balance, richest first.
    /// `distribution` addresses are dropped unless `include_distribution` is set, in which
    /// case they are flagged as locked.
    fn get_richlist(&self, distribution: &[Address], include_distribution: bool) -> HistoryResult<Richlist>;

    fn get_block_by_hash(&self, hash: &Hash) -> HistoryResult<Option<Block>>;

    fn get_block_by_seq(&self, seq: u64) -> HistoryResult<Option<Block>>;

    /// Indexed blocks with heights in `start..=end`. Heights above the indexed head are skipped.
    fn get_blocks(&self, start: u64, end: u64) -> HistoryResult<Vec<Block>>;
}

/// Mutations of the history index. Only a single writer may drive these.
pub trait HistoryIndexControlApi: Send + Sync {
    /// Applies the block at height `parsed_height() + 1`
    fn index_block(&self, block: &Block) -> HistoryResult<()>;

    /// Reverts every indexed block above `height`, highest first
    fn rollback_to(&self, height: i64) -> HistoryResult<()>;

    /// Removes every history entry, so the index can be rebuilt from genesis
    fn reset(&self) -> HistoryResult<()>;
}
