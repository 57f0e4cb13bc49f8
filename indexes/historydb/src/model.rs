use serde::{Deserialize, Serialize};
use visor_addresses::Address;
use visor_consensus_core::tx::{Transaction, TransactionId, UxOut};

/// History of a single output: the output itself and, once spent, where it was spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxOutRecord {
    pub out: UxOut,
    pub spent_tx_id: Option<TransactionId>,
    pub spent_block_seq: Option<u64>,
}

impl UxOutRecord {
    pub fn unspent(out: UxOut) -> Self {
        Self { out, spent_tx_id: None, spent_block_seq: None }
    }

    pub fn is_spent(&self) -> bool {
        self.spent_tx_id.is_some()
    }

    pub fn owner(&self) -> Address {
        self.out.body.address
    }

    pub fn coins(&self) -> u64 {
        self.out.body.coins
    }
}

/// A confirmed transaction and the height of its block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txn: Transaction,
    pub block_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub confirmed: bool,
    /// Number of blocks on top of and including the transaction's block
    pub height: u64,
    pub block_seq: u64,
}

/// A transaction as returned by history queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub txn: Transaction,
    pub status: TransactionStatus,
    /// Timestamp of the confirming block
    pub time: u64,
    /// Owner of each spent input, in input order
    pub input_owners: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub address: Address,
    pub coins: u64,
    /// Set for distribution addresses, whose coins are not in circulation
    pub locked: bool,
}

/// Addresses ordered by balance, descending
pub type Richlist = Vec<AccountBalance>;
