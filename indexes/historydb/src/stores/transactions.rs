use std::sync::Arc;

use visor_consensus_core::tx::TransactionId;
use visor_database::{
    prelude::{Bucket, DB, DbReader, DbWriter, StoreResult},
    registry::DatabaseStoreBuckets,
};

use crate::model::TransactionRecord;

/// Reader API for `TransactionStore`.
pub trait TransactionStoreReader {
    fn get(&self, reader: &impl DbReader, id: &TransactionId) -> StoreResult<Option<TransactionRecord>>;
}

pub trait TransactionStore: TransactionStoreReader {
    fn write(&self, writer: impl DbWriter, id: &TransactionId, record: &TransactionRecord) -> StoreResult<()>;

    fn delete(&self, writer: impl DbWriter, id: &TransactionId) -> StoreResult<()>;
}

/// Confirmed transactions by transaction id
#[derive(Clone)]
pub struct DbTransactionStore {
    bucket: Bucket,
}

impl DbTransactionStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { bucket: Bucket::registered(db, DatabaseStoreBuckets::Transactions) }
    }

    pub fn delete_all(&self, writer: impl DbWriter) -> StoreResult<()> {
        self.bucket.stage_reset(writer)
    }
}

impl TransactionStoreReader for DbTransactionStore {
    fn get(&self, reader: &impl DbReader, id: &TransactionId) -> StoreResult<Option<TransactionRecord>> {
        self.bucket.read_in(reader, id)
    }
}

impl TransactionStore for DbTransactionStore {
    fn write(&self, writer: impl DbWriter, id: &TransactionId, record: &TransactionRecord) -> StoreResult<()> {
        self.bucket.stage_write(writer, id, record)
    }

    fn delete(&self, writer: impl DbWriter, id: &TransactionId) -> StoreResult<()> {
        self.bucket.stage_delete(writer, id)
    }
}
