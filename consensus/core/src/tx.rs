use serde::{Deserialize, Serialize};
use visor_addresses::Address;
use visor_hashes::Hash;

use crate::hashing;

/// Represents the ID of a transaction
pub type TransactionId = Hash;

/// Represents the ID of a transaction output (see [`UxOut::hash`])
pub type UxOutId = Hash;

/// An output created by a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub address: Address,
    pub coins: u64,
    pub hours: u64,
}

impl TransactionOutput {
    pub fn new(address: Address, coins: u64, hours: u64) -> Self {
        Self { address, coins, hours }
    }
}

/// A transaction spends previously created outputs (referenced by [`UxOutId`])
/// and creates new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub length: u32,
    pub tx_type: u8,
    pub inner_hash: Hash,
    pub inputs: Vec<UxOutId>,
    pub outputs: Vec<TransactionOutput>,
}

impl Transaction {
    pub fn new(inputs: Vec<UxOutId>, outputs: Vec<TransactionOutput>) -> Self {
        let mut tx = Self { length: 0, tx_type: 0, inner_hash: Default::default(), inputs, outputs };
        tx.finalize();
        tx
    }

    /// Recomputes `inner_hash` and `length` from inputs and outputs
    pub fn finalize(&mut self) {
        self.inner_hash = hashing::tx::inner_hash(self);
        self.length = hashing::tx::encoded_len(self) as u32;
    }

    pub fn id(&self) -> TransactionId {
        hashing::tx::id(self)
    }

    /// Output records created by this transaction, in output order
    pub fn ux_outs(&self, block_time: u64, block_seq: u64) -> Vec<UxOut> {
        let src_transaction = self.id();
        self.outputs
            .iter()
            .map(|output| UxOut {
                head: UxHead { time: block_time, bk_seq: block_seq },
                body: UxBody { src_transaction, address: output.address, coins: output.coins, hours: output.hours },
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxHead {
    pub time: u64,
    pub bk_seq: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxBody {
    pub src_transaction: TransactionId,
    pub address: Address,
    pub coins: u64,
    pub hours: u64,
}

/// A transaction output as recorded in the ledger. Its identity only depends on the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxOut {
    pub head: UxHead,
    pub body: UxBody,
}

impl UxOut {
    pub fn hash(&self) -> UxOutId {
        hashing::tx::ux_body_hash(&self.body)
    }
}
