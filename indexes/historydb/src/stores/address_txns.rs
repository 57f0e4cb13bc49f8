use std::sync::Arc;

use visor_addresses::Address;
use visor_consensus_core::tx::TransactionId;
use visor_database::{
    prelude::{Bucket, DB, DbReader, DbWriter, StoreResult},
    registry::DatabaseStoreBuckets,
};

/// Reader API for `AddressTransactionsStore`.
pub trait AddressTransactionsStoreReader {
    /// Ids of the transactions involving `address`, in confirmation order.
    /// Unknown addresses yield an empty list.
    fn get(&self, reader: &impl DbReader, address: &Address) -> StoreResult<Vec<TransactionId>>;
}

pub trait AddressTransactionsStore: AddressTransactionsStoreReader {
    /// Replaces the list of `address`. An empty list removes the address.
    fn write(&self, writer: impl DbWriter, address: &Address, txs: &[TransactionId]) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct DbAddressTransactionsStore {
    bucket: Bucket,
}

impl DbAddressTransactionsStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { bucket: Bucket::registered(db, DatabaseStoreBuckets::AddressTransactions) }
    }

    pub fn delete_all(&self, writer: impl DbWriter) -> StoreResult<()> {
        self.bucket.stage_reset(writer)
    }
}

impl AddressTransactionsStoreReader for DbAddressTransactionsStore {
    fn get(&self, reader: &impl DbReader, address: &Address) -> StoreResult<Vec<TransactionId>> {
        Ok(self.bucket.read_in(reader, address.to_storage_bytes())?.unwrap_or_default())
    }
}

impl AddressTransactionsStore for DbAddressTransactionsStore {
    fn write(&self, writer: impl DbWriter, address: &Address, txs: &[TransactionId]) -> StoreResult<()> {
        if txs.is_empty() {
            self.bucket.stage_delete(writer, address.to_storage_bytes())
        } else {
            self.bucket.stage_write(writer, address.to_storage_bytes(), &txs)
        }
    }
}
