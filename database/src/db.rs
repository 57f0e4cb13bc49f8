use parking_lot::Mutex;
use rocksdb::{DBWithThreadMode, IteratorMode, MultiThreaded, ReadOptions, SnapshotWithThreadMode, WriteBatch};
use std::ops::Deref;
use std::path::Path;

use crate::errors::{StoreError, StoreResult};
use crate::writer::BatchDbWriter;

pub use conn_builder::ConnBuilder;

mod conn_builder;

type Inner = DBWithThreadMode<MultiThreaded>;

/// A consistent point-in-time view of the whole database
pub type DbSnapshot<'a> = SnapshotWithThreadMode<'a, Inner>;

/// The DB type used for visor stores.
///
/// All mutations performed through [`DB::transaction`] (and therefore all bucket
/// mutations) are serialized by a single writer lock. Readers never take the lock.
pub struct DB {
    inner: Inner,
    write_lock: Mutex<()>,
}

impl DB {
    pub fn new(inner: Inner) -> Self {
        Self { inner, write_lock: Mutex::new(()) }
    }

    /// Runs `op` with exclusive write access, staging its writes into a single batch
    /// which is committed atomically only if `op` succeeds.
    ///
    /// Reads performed by `op` observe the committed state, not the staged writes.
    /// The lock is not reentrant: `op` must stage its writes through the provided
    /// writer and never call back into direct bucket mutations.
    pub fn transaction<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut BatchDbWriter) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock();
        let mut batch = WriteBatch::default();
        let result = op(&mut BatchDbWriter::new(&mut batch))?;
        self.commit_batch(batch)?;
        Ok(result)
    }

    fn commit_batch(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        Ok(self.inner.write(batch)?)
    }
}

impl Deref for DB {
    type Target = Inner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Read access shared by the live DB and its snapshots
pub trait DbReader {
    fn get_raw(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Iterates, in key order, over every entry whose key starts with `prefix`
    fn prefix_iter(&self, prefix: Vec<u8>) -> impl Iterator<Item = StoreResult<(Box<[u8]>, Box<[u8]>)>> + '_;
}

fn prefix_read_opts(prefix: Vec<u8>) -> ReadOptions {
    let mut read_opts = ReadOptions::default();
    read_opts.set_iterate_range(rocksdb::PrefixRange(prefix));
    read_opts
}

impl DbReader for DB {
    fn get_raw(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.inner.get_pinned(key)?.map(|slice| slice.to_vec()))
    }

    fn prefix_iter(&self, prefix: Vec<u8>) -> impl Iterator<Item = StoreResult<(Box<[u8]>, Box<[u8]>)>> + '_ {
        self.inner.iterator_opt(IteratorMode::Start, prefix_read_opts(prefix)).map(|item| item.map_err(StoreError::from))
    }
}

impl DbReader for DbSnapshot<'_> {
    fn get_raw(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.get(key)?)
    }

    fn prefix_iter(&self, prefix: Vec<u8>) -> impl Iterator<Item = StoreResult<(Box<[u8]>, Box<[u8]>)>> + '_ {
        self.iterator_opt(IteratorMode::Start, prefix_read_opts(prefix)).map(|item| item.map_err(StoreError::from))
    }
}

/// Deletes an existing DB if it exists
pub fn delete_db(db_dir: &Path) -> StoreResult<()> {
    if !db_dir.exists() {
        return Ok(());
    }
    let options = rocksdb::Options::default();
    Ok(Inner::destroy(&options, db_dir)?)
}
