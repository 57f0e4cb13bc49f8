use std::sync::Arc;

use crate::block::Block;

/// Ledger changes emitted by consensus, consumed by derived indexes
#[derive(Debug, Clone)]
pub enum ChainEvent {
    /// A block was accepted on top of the current chain tip
    BlockConfirmed(Arc<Block>),

    /// Blocks above `fork_height` were discarded in favor of another fork.
    /// A `fork_height` of -1 discards everything down to and including genesis.
    Reorg { fork_height: i64 },
}

impl ChainEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ChainEvent::BlockConfirmed(_) => "block-confirmed",
            ChainEvent::Reorg { .. } => "reorg",
        }
    }
}
