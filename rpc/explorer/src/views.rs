//! JSON representations returned by the explorer API

use serde::{Deserialize, Serialize};
use visor_consensus_core::{
    Block,
    tx::{Transaction, TransactionOutput, UxOut},
};
use visor_historydb::model::{AccountBalance, TransactionResult, UxOutRecord};

/// Number of droplets in one coin
pub const DROPLETS_PER_COIN: u64 = 1_000_000;

/// Formats a droplet amount as a decimal coin string, e.g. `1500000` as `"1.500000"`
pub fn coins_to_string(droplets: u64) -> String {
    format!("{}.{:06}", droplets / DROPLETS_PER_COIN, droplets % DROPLETS_PER_COIN)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatusView {
    pub confirmed: bool,
    pub unconfirmed: bool,
    /// Depth of the confirming block, 1 for the chain tip
    pub height: u64,
    pub block_seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInputView {
    pub uxid: String,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutputView {
    pub uxid: String,
    pub dst: String,
    pub coins: String,
    pub hours: u64,
}

impl TransactionOutputView {
    fn new(ux: &UxOut, output: &TransactionOutput) -> Self {
        Self { uxid: ux.hash().to_string(), dst: output.address.to_string(), coins: coins_to_string(output.coins), hours: output.hours }
    }

    fn from_transaction(txn: &Transaction, block_time: u64, block_seq: u64) -> Vec<Self> {
        txn.ux_outs(block_time, block_seq).iter().zip(txn.outputs.iter()).map(|(ux, output)| Self::new(ux, output)).collect()
    }
}

/// A confirmed transaction with the owners of the outputs it spends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub status: TransactionStatusView,
    pub length: u32,
    #[serde(rename = "type")]
    pub tx_type: u8,
    pub txid: String,
    pub inner_hash: String,
    pub timestamp: u64,
    pub inputs: Vec<TransactionInputView>,
    pub outputs: Vec<TransactionOutputView>,
}

impl From<&TransactionResult> for TransactionView {
    fn from(result: &TransactionResult) -> Self {
        let txn = &result.txn;
        let inputs = txn
            .inputs
            .iter()
            .zip(result.input_owners.iter())
            .map(|(id, owner)| TransactionInputView { uxid: id.to_string(), owner: owner.to_string() })
            .collect();
        Self {
            status: TransactionStatusView {
                confirmed: result.status.confirmed,
                unconfirmed: !result.status.confirmed,
                height: result.status.height,
                block_seq: result.status.block_seq,
            },
            length: txn.length,
            tx_type: txn.tx_type,
            txid: txn.id().to_string(),
            inner_hash: txn.inner_hash.to_string(),
            timestamp: result.time,
            inputs,
            outputs: TransactionOutputView::from_transaction(txn, result.time, result.status.block_seq),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTransactionView {
    pub length: u32,
    #[serde(rename = "type")]
    pub tx_type: u8,
    pub txid: String,
    pub inner_hash: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<TransactionOutputView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderView {
    pub seq: u64,
    pub block_hash: String,
    pub previous_block_hash: String,
    pub timestamp: u64,
    pub fee: u64,
    pub version: u32,
    pub tx_body_hash: String,
    pub ux_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBodyView {
    pub txns: Vec<BlockTransactionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    pub header: BlockHeaderView,
    pub body: BlockBodyView,
}

impl From<&Block> for BlockView {
    fn from(block: &Block) -> Self {
        let header = &block.header;
        let txns = block
            .transactions
            .iter()
            .map(|txn| BlockTransactionView {
                length: txn.length,
                tx_type: txn.tx_type,
                txid: txn.id().to_string(),
                inner_hash: txn.inner_hash.to_string(),
                inputs: txn.inputs.iter().map(|id| id.to_string()).collect(),
                outputs: TransactionOutputView::from_transaction(txn, header.time, header.seq),
            })
            .collect();
        Self {
            header: BlockHeaderView {
                seq: header.seq,
                block_hash: header.hash.to_string(),
                previous_block_hash: header.prev_hash.to_string(),
                timestamp: header.time,
                fee: header.fee,
                version: header.version,
                tx_body_hash: header.body_hash.to_string(),
                ux_hash: header.ux_hash.to_string(),
            },
            body: BlockBodyView { txns },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocksView {
    pub blocks: Vec<BlockView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxOutView {
    pub uxid: String,
    pub time: u64,
    pub src_block_seq: u64,
    pub src_tx: String,
    pub owner_address: String,
    pub coins: String,
    pub hours: u64,
    pub spent_block_seq: Option<u64>,
    pub spent_tx: Option<String>,
}

impl From<&UxOutRecord> for UxOutView {
    fn from(record: &UxOutRecord) -> Self {
        let UxOut { head, body } = &record.out;
        Self {
            uxid: record.out.hash().to_string(),
            time: head.time,
            src_block_seq: head.bk_seq,
            src_tx: body.src_transaction.to_string(),
            owner_address: body.address.to_string(),
            coins: coins_to_string(body.coins),
            hours: body.hours,
            spent_block_seq: record.spent_block_seq,
            spent_tx: record.spent_tx_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceView {
    pub address: String,
    pub coins: String,
    pub locked: bool,
}

impl From<&AccountBalance> for AccountBalanceView {
    fn from(balance: &AccountBalance) -> Self {
        Self { address: balance.address.to_string(), coins: coins_to_string(balance.coins), locked: balance.locked }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCountView {
    #[serde(rename = "Count")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfTokenView {
    pub csrf_token: String,
}
