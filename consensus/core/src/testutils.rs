//! Helpers for building small, internally consistent chains in tests

use std::sync::Arc;

use visor_addresses::{Address, KEY_SIZE, Version};
use visor_hashes::Hash;

use crate::{
    api::ChainSource,
    block::Block,
    hashing,
    header::Header,
    tx::{Transaction, TransactionOutput, UxOut},
};

pub const GENESIS_TIME: u64 = 1_426_562_704;
pub const BLOCK_INTERVAL: u64 = 10;

/// A deterministic address whose key bytes are all `b`
pub fn test_address(b: u8) -> Address {
    Address::new(Version::PubKey, [b; KEY_SIZE])
}

/// A transaction creating coins out of nothing, as the genesis block does
pub fn mint_tx(outputs: Vec<TransactionOutput>) -> Transaction {
    Transaction::new(vec![], outputs)
}

/// A transaction spending `inputs` into `outputs`
pub fn spend_tx(inputs: &[UxOut], outputs: Vec<TransactionOutput>) -> Transaction {
    Transaction::new(inputs.iter().map(|ux| ux.hash()).collect(), outputs)
}

/// Builds a linear chain of blocks with consecutive heights and linked hashes
#[derive(Debug, Clone, Default)]
pub struct ChainBuilder {
    blocks: Vec<Arc<Block>>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block holding `transactions` and returns it
    pub fn push(&mut self, transactions: Vec<Transaction>) -> Arc<Block> {
        let (seq, prev_hash) = match self.blocks.last() {
            Some(tip) => (tip.seq() + 1, tip.hash()),
            None => (0, Hash::ZERO),
        };
        let header = Header::new(
            0,
            GENESIS_TIME + seq * BLOCK_INTERVAL,
            seq,
            0,
            prev_hash,
            hashing::header::body_hash(&transactions),
            Hash::ZERO,
        );
        let block = Arc::new(Block::new(header, transactions));
        self.blocks.push(block.clone());
        block
    }

    /// A copy of this chain truncated to heights `0..=fork_height`, used to build competing forks
    pub fn fork_at(&self, fork_height: i64) -> Self {
        let keep = (fork_height + 1).max(0) as usize;
        Self { blocks: self.blocks.iter().take(keep).cloned().collect() }
    }

    pub fn blocks(&self) -> &[Arc<Block>] {
        &self.blocks
    }

    pub fn tip(&self) -> Option<Arc<Block>> {
        self.blocks.last().cloned()
    }
}

impl ChainSource for ChainBuilder {
    fn head_seq(&self) -> Option<u64> {
        self.blocks.last().map(|b| b.seq())
    }

    fn block_by_seq(&self, seq: u64) -> Option<Arc<Block>> {
        self.blocks.get(seq as usize).cloned()
    }
}
