use std::sync::Arc;

use visor_database::{
    prelude::{Bucket, DB, DbReader, DbWriter, StoreError, StoreResult, btoi, itob},
    registry::DatabaseStoreBuckets,
};

/// Key of the parsed height within the history meta bucket
pub const PARSED_HEIGHT_KEY: &[u8] = b"parsed_height";

/// Reader API for `HistoryMetaStore`.
pub trait HistoryMetaStoreReader {
    /// Height of the highest fully indexed block, -1 if nothing was indexed yet
    fn parsed_height(&self, reader: &impl DbReader) -> StoreResult<i64>;
}

pub trait HistoryMetaStore: HistoryMetaStoreReader {
    /// Overwrites the parsed height. A height of -1 removes the key.
    fn set_parsed_height(&self, writer: impl DbWriter, height: i64) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct DbHistoryMetaStore {
    bucket: Bucket,
}

impl DbHistoryMetaStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { bucket: Bucket::registered(db, DatabaseStoreBuckets::HistoryMeta) }
    }

    pub fn delete_all(&self, writer: impl DbWriter) -> StoreResult<()> {
        self.bucket.stage_reset(writer)
    }
}

impl HistoryMetaStoreReader for DbHistoryMetaStore {
    fn parsed_height(&self, reader: &impl DbReader) -> StoreResult<i64> {
        match self.bucket.get_in(reader, PARSED_HEIGHT_KEY)? {
            Some(bytes) => {
                let height = btoi(&bytes)?;
                i64::try_from(height).map_err(|_| StoreError::DataInconsistency(format!("parsed height {height} out of range")))
            }
            None => Ok(-1),
        }
    }
}

impl HistoryMetaStore for DbHistoryMetaStore {
    fn set_parsed_height(&self, writer: impl DbWriter, height: i64) -> StoreResult<()> {
        match u64::try_from(height) {
            Ok(height) => self.bucket.stage_put(writer, PARSED_HEIGHT_KEY, itob(height)),
            Err(_) => self.bucket.stage_delete(writer, PARSED_HEIGHT_KEY),
        }
    }
}
