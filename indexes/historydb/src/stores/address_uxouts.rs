use std::sync::Arc;

use visor_addresses::Address;
use visor_consensus_core::tx::UxOutId;
use visor_database::{
    prelude::{Bucket, DB, DbReader, DbWriter, StoreError, StoreResult},
    registry::DatabaseStoreBuckets,
};

/// Reader API for `AddressUxOutsStore`.
pub trait AddressUxOutsStoreReader {
    /// Ids of every output `address` ever owned. Unknown addresses yield an empty list.
    fn get(&self, reader: &impl DbReader, address: &Address) -> StoreResult<Vec<UxOutId>>;

    /// Number of distinct addresses which ever owned an output
    fn count(&self, reader: &impl DbReader) -> StoreResult<usize>;

    /// Visits every address with its output ids, in address key order
    fn for_each<F>(&self, reader: &impl DbReader, visitor: F) -> StoreResult<()>
    where
        F: FnMut(Address, Vec<UxOutId>) -> StoreResult<()>;
}

pub trait AddressUxOutsStore: AddressUxOutsStoreReader {
    /// Replaces the list of `address`. An empty list removes the address.
    fn write(&self, writer: impl DbWriter, address: &Address, uxouts: &[UxOutId]) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct DbAddressUxOutsStore {
    bucket: Bucket,
}

impl DbAddressUxOutsStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { bucket: Bucket::registered(db, DatabaseStoreBuckets::AddressUxOuts) }
    }

    pub fn delete_all(&self, writer: impl DbWriter) -> StoreResult<()> {
        self.bucket.stage_reset(writer)
    }
}

impl AddressUxOutsStoreReader for DbAddressUxOutsStore {
    fn get(&self, reader: &impl DbReader, address: &Address) -> StoreResult<Vec<UxOutId>> {
        Ok(self.bucket.read_in(reader, address.to_storage_bytes())?.unwrap_or_default())
    }

    fn count(&self, reader: &impl DbReader) -> StoreResult<usize> {
        self.bucket.len_in(reader)
    }

    fn for_each<F>(&self, reader: &impl DbReader, mut visitor: F) -> StoreResult<()>
    where
        F: FnMut(Address, Vec<UxOutId>) -> StoreResult<()>,
    {
        self.bucket.for_each_in(reader, |key, value| {
            let address = Address::from_storage_bytes(key).map_err(|err| StoreError::DataInconsistency(err.to_string()))?;
            visitor(address, bincode::deserialize(value)?)
        })
    }
}

impl AddressUxOutsStore for DbAddressUxOutsStore {
    fn write(&self, writer: impl DbWriter, address: &Address, uxouts: &[UxOutId]) -> StoreResult<()> {
        if uxouts.is_empty() {
            self.bucket.stage_delete(writer, address.to_storage_bytes())
        } else {
            self.bucket.stage_write(writer, address.to_storage_bytes(), &uxouts)
        }
    }
}
