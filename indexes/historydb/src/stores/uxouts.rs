use std::sync::Arc;

use visor_consensus_core::tx::UxOutId;
use visor_database::{
    prelude::{Bucket, DB, DbReader, DbWriter, StoreResult},
    registry::DatabaseStoreBuckets,
};

use crate::model::UxOutRecord;

/// Reader API for `UxOutStore`.
pub trait UxOutStoreReader {
    fn get(&self, reader: &impl DbReader, id: &UxOutId) -> StoreResult<Option<UxOutRecord>>;
}

pub trait UxOutStore: UxOutStoreReader {
    fn write(&self, writer: impl DbWriter, id: &UxOutId, record: &UxOutRecord) -> StoreResult<()>;

    fn delete(&self, writer: impl DbWriter, id: &UxOutId) -> StoreResult<()>;
}

/// Output records by output id
#[derive(Clone)]
pub struct DbUxOutStore {
    bucket: Bucket,
}

impl DbUxOutStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { bucket: Bucket::registered(db, DatabaseStoreBuckets::UxOuts) }
    }

    pub fn delete_all(&self, writer: impl DbWriter) -> StoreResult<()> {
        self.bucket.stage_reset(writer)
    }
}

impl UxOutStoreReader for DbUxOutStore {
    fn get(&self, reader: &impl DbReader, id: &UxOutId) -> StoreResult<Option<UxOutRecord>> {
        self.bucket.read_in(reader, id)
    }
}

impl UxOutStore for DbUxOutStore {
    fn write(&self, writer: impl DbWriter, id: &UxOutId, record: &UxOutRecord) -> StoreResult<()> {
        self.bucket.stage_write(writer, id, record)
    }

    fn delete(&self, writer: impl DbWriter, id: &UxOutId) -> StoreResult<()> {
        self.bucket.stage_delete(writer, id)
    }
}
