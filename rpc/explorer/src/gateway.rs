use std::sync::Arc;

use visor_addresses::Address;
use visor_consensus_core::{Block, tx::UxOutId};
use visor_hashes::Hash;
use visor_historydb::{
    HistoryIndexRetrievalApi,
    model::{Richlist, TransactionResult, UxOutRecord},
};

use crate::error::GatewayResult;

/// Read access to the history database used by the HTTP handlers.
///
/// Implementations block on storage, callers run them on the blocking pool.
pub trait Gatewayer: Send + Sync {
    fn get_address_txns(&self, address: &Address) -> GatewayResult<Vec<TransactionResult>>;

    fn get_uxout_by_id(&self, id: &UxOutId) -> GatewayResult<Option<UxOutRecord>>;

    /// Every non-zero balance, richest first
    fn get_richlist(&self, include_distribution: bool) -> GatewayResult<Richlist>;

    fn get_address_count(&self) -> GatewayResult<u64>;

    fn get_block_by_hash(&self, hash: &Hash) -> GatewayResult<Option<Block>>;

    fn get_block_by_seq(&self, seq: u64) -> GatewayResult<Option<Block>>;

    fn get_blocks(&self, start: u64, end: u64) -> GatewayResult<Vec<Block>>;

    /// Height of the highest indexed block, `None` before genesis is indexed
    fn head_seq(&self) -> GatewayResult<Option<u64>>;
}

pub struct Gateway {
    index: Arc<dyn HistoryIndexRetrievalApi>,
    distribution_addresses: Vec<Address>,
}

impl Gateway {
    pub fn new(index: Arc<dyn HistoryIndexRetrievalApi>, distribution_addresses: Vec<Address>) -> Self {
        Self { index, distribution_addresses }
    }
}

impl Gatewayer for Gateway {
    fn get_address_txns(&self, address: &Address) -> GatewayResult<Vec<TransactionResult>> {
        Ok(self.index.get_address_txns(address)?)
    }

    fn get_uxout_by_id(&self, id: &UxOutId) -> GatewayResult<Option<UxOutRecord>> {
        Ok(self.index.get_uxout(id)?)
    }

    fn get_richlist(&self, include_distribution: bool) -> GatewayResult<Richlist> {
        Ok(self.index.get_richlist(&self.distribution_addresses, include_distribution)?)
    }

    fn get_address_count(&self) -> GatewayResult<u64> {
        Ok(self.index.get_address_count()? as u64)
    }

    fn get_block_by_hash(&self, hash: &Hash) -> GatewayResult<Option<Block>> {
        Ok(self.index.get_block_by_hash(hash)?)
    }

    fn get_block_by_seq(&self, seq: u64) -> GatewayResult<Option<Block>> {
        Ok(self.index.get_block_by_seq(seq)?)
    }

    fn get_blocks(&self, start: u64, end: u64) -> GatewayResult<Vec<Block>> {
        Ok(self.index.get_blocks(start, end)?)
    }

    fn head_seq(&self) -> GatewayResult<Option<u64>> {
        Ok(u64::try_from(self.index.parsed_height()?).ok())
    }
}
