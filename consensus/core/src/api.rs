use std::sync::Arc;

use crate::block::Block;

/// Read access to the confirmed chain, used by derived indexes to catch up
/// with blocks they have missed.
pub trait ChainSource: Send + Sync {
    /// Height of the chain tip, `None` if the chain is empty
    fn head_seq(&self) -> Option<u64>;

    fn block_by_seq(&self, seq: u64) -> Option<Arc<Block>>;
}
