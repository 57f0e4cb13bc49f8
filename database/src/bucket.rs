use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::prelude::{DB, DbKey, DbReader, DbWriter, DirectDbWriter, StoreError, StoreResult};
use crate::registry::DatabaseStoreBuckets;

/// A named key-value namespace inside the database.
///
/// Every entry of a bucket is stored under `[name.len()] ++ name ++ key`. The
/// leading length byte makes bucket prefixes prefix-free, so two buckets never
/// observe each other's keys. Iteration follows the native (lexicographic) key order.
///
/// Direct mutations (`put`, `delete`, `update`, `range_update`, `reset`) each run
/// as one [`DB::transaction`]. The `stage_*` variants write through a caller
/// provided writer so several buckets can be changed in a single atomic batch.
#[derive(Clone)]
pub struct Bucket {
    db: Arc<DB>,
    name: String,
    prefix: Vec<u8>,
}

impl Bucket {
    pub const MAX_NAME_LEN: usize = 254;

    pub fn new(db: Arc<DB>, name: &str) -> StoreResult<Self> {
        if name.is_empty() || name.len() > Self::MAX_NAME_LEN {
            return Err(StoreError::InvalidBucketName(name.to_string()));
        }
        let mut prefix = Vec::with_capacity(name.len() + 1);
        prefix.push(name.len() as u8);
        prefix.extend_from_slice(name.as_bytes());
        Ok(Self { db, name: name.to_string(), prefix })
    }

    pub fn registered(db: Arc<DB>, bucket: DatabaseStoreBuckets) -> Self {
        let name = bucket.name();
        let mut prefix = vec![name.len() as u8];
        prefix.extend_from_slice(name.as_bytes());
        Self { db, name: name.to_string(), prefix }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db_key<K: AsRef<[u8]>>(&self, key: K) -> DbKey {
        DbKey::new(&self.prefix, key)
    }

    // ---- reads ----

    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> StoreResult<Option<Vec<u8>>> {
        self.get_in(&*self.db, key)
    }

    pub fn get_in<K: AsRef<[u8]>>(&self, reader: &impl DbReader, key: K) -> StoreResult<Option<Vec<u8>>> {
        reader.get_raw(self.db_key(key).as_ref())
    }

    /// Reads and bincode-decodes the value stored under `key`
    pub fn read<K: AsRef<[u8]>, T: DeserializeOwned>(&self, key: K) -> StoreResult<Option<T>> {
        self.read_in(&*self.db, key)
    }

    pub fn read_in<K: AsRef<[u8]>, T: DeserializeOwned>(&self, reader: &impl DbReader, key: K) -> StoreResult<Option<T>> {
        match self.get_in(reader, key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn is_exist<K: AsRef<[u8]>>(&self, key: K) -> StoreResult<bool> {
        Ok(self.db.get_pinned(self.db_key(key))?.is_some())
    }

    /// Iterates the bucket entries as seen by `reader`. Yielded keys are stripped of the bucket prefix.
    pub fn iter_in<'a>(&self, reader: &'a impl DbReader) -> impl Iterator<Item = StoreResult<(Box<[u8]>, Box<[u8]>)>> + 'a {
        let prefix_len = self.prefix.len();
        reader.prefix_iter(self.prefix.clone()).map(move |item| item.map(|(key, value)| (key[prefix_len..].into(), value)))
    }

    /// Visits every pair in key order over a consistent snapshot. The first visitor
    /// error aborts the iteration and is returned.
    pub fn for_each<E, F>(&self, visitor: F) -> Result<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> Result<(), E>,
        E: From<StoreError>,
    {
        let snapshot = self.db.snapshot();
        self.for_each_in(&snapshot, visitor)
    }

    pub fn for_each_in<E, F>(&self, reader: &impl DbReader, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> Result<(), E>,
        E: From<StoreError>,
    {
        for item in self.iter_in(reader) {
            let (key, value) = item?;
            visitor(&key, &value)?;
        }
        Ok(())
    }

    pub fn get_all(&self) -> StoreResult<BTreeMap<Vec<u8>, Vec<u8>>> {
        let snapshot = self.db.snapshot();
        self.iter_in(&snapshot).map(|item| item.map(|(key, value)| (key.into_vec(), value.into_vec()))).collect()
    }

    pub fn len(&self) -> StoreResult<usize> {
        self.len_in(&*self.db)
    }

    pub fn len_in(&self, reader: &impl DbReader) -> StoreResult<usize> {
        let mut count = 0;
        for item in self.iter_in(reader) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.iter_in(&*self.db).next().transpose()?.is_none())
    }

    // ---- direct mutations ----

    pub fn put<K: AsRef<[u8]>, V: AsRef<[u8]>>(&self, key: K, value: V) -> StoreResult<()> {
        self.db.transaction(|writer| self.stage_put(writer, key, value))
    }

    /// Removes `key`. Deleting an absent key is not an error.
    pub fn delete<K: AsRef<[u8]>>(&self, key: K) -> StoreResult<()> {
        self.db.transaction(|writer| self.stage_delete(writer, key))
    }

    /// Atomic read-modify-write of a single key.
    ///
    /// The mutator receives the current value (or `None`) and returns the value to store.
    /// No other writer runs between the read and the write. If the mutator fails nothing
    /// is written and its error is returned as is.
    pub fn update<K, E, F>(&self, key: K, mutator: F) -> Result<(), E>
    where
        K: AsRef<[u8]>,
        F: FnOnce(Option<&[u8]>) -> Result<Vec<u8>, E>,
        E: From<StoreError>,
    {
        self.db.transaction(|writer| {
            let current = self.get(&key)?;
            let value = mutator(current.as_deref())?;
            self.stage_put(writer, &key, value)?;
            Ok(())
        })
    }

    /// Rewrites every pair of the bucket with the value returned by the mutator,
    /// committing all results as one batch. If the mutator fails on any pair the
    /// bucket is left unchanged.
    pub fn range_update<E, F>(&self, mut mutator: F) -> Result<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> Result<Vec<u8>, E>,
        E: From<StoreError>,
    {
        self.db.transaction(|writer| {
            for item in self.iter_in(&*self.db) {
                let (key, value) = item?;
                let updated = mutator(&key, &value)?;
                self.stage_put(&mut *writer, &key, updated)?;
            }
            Ok(())
        })
    }

    /// Atomically removes every entry of the bucket
    pub fn reset(&self) -> StoreResult<()> {
        self.db.transaction(|writer| self.stage_reset(writer))
    }

    // ---- staged mutations ----

    pub fn stage_put<K: AsRef<[u8]>, V: AsRef<[u8]>>(&self, mut writer: impl DbWriter, key: K, value: V) -> StoreResult<()> {
        writer.put(self.db_key(key), value)?;
        Ok(())
    }

    /// Bincode-encodes `value` and stages it under `key`
    pub fn stage_write<K: AsRef<[u8]>, T: Serialize>(&self, writer: impl DbWriter, key: K, value: &T) -> StoreResult<()> {
        let bytes = bincode::serialize(value)?;
        self.stage_put(writer, key, bytes)
    }

    pub fn stage_delete<K: AsRef<[u8]>>(&self, mut writer: impl DbWriter, key: K) -> StoreResult<()> {
        writer.delete(self.db_key(key))?;
        Ok(())
    }

    pub fn stage_reset(&self, mut writer: impl DbWriter) -> StoreResult<()> {
        let (from, to) = rocksdb::IterateBounds::into_bounds(rocksdb::PrefixRange(self.prefix.as_slice()));
        match (from, to) {
            (Some(from), Some(to)) => writer.delete_range(from, to)?,
            // the length byte is at most 254 so a prefix always has an upper bound
            _ => return Err(StoreError::DataInconsistency(format!("bucket {} has an unbounded prefix", self.name))),
        }
        Ok(())
    }

    /// A writer bypassing the transaction lock, for test setup only
    pub fn direct_writer(&self) -> DirectDbWriter<'_> {
        DirectDbWriter::new(&self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_temp_db, prelude::ConnBuilder};
    use std::thread;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum TestError {
        #[error(transparent)]
        Store(#[from] StoreError),

        #[error("rejected value {0}")]
        Rejected(u64),
    }

    fn u64_value(bytes: &[u8]) -> u64 {
        u64::from_be_bytes(bytes.try_into().unwrap())
    }

    #[test]
    fn test_put_get_delete() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let bucket = Bucket::new(db.clone(), "test").unwrap();

        assert_eq!(bucket.get(b"k1").unwrap(), None);
        bucket.put(b"k1", b"v1").unwrap();
        bucket.put(b"k1", b"v2").unwrap();
        assert_eq!(bucket.get(b"k1").unwrap(), Some(b"v2".to_vec()));
        assert!(bucket.is_exist(b"k1").unwrap());

        bucket.delete(b"k1").unwrap();
        assert_eq!(bucket.get(b"k1").unwrap(), None);
        assert!(!bucket.is_exist(b"k1").unwrap());

        // deleting an absent key is fine
        bucket.delete(b"k1").unwrap();
        bucket.delete(b"never").unwrap();
    }

    #[test]
    fn test_update() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let bucket = Bucket::new(db.clone(), "test").unwrap();

        bucket
            .update::<_, StoreError, _>(b"counter", |current| {
                assert!(current.is_none());
                Ok(1u64.to_be_bytes().to_vec())
            })
            .unwrap();
        bucket.update::<_, StoreError, _>(b"counter", |current| Ok((u64_value(current.unwrap()) + 1).to_be_bytes().to_vec())).unwrap();
        assert_eq!(u64_value(&bucket.get(b"counter").unwrap().unwrap()), 2);

        // a failing mutator writes nothing and its error comes back verbatim
        let err = bucket.update(b"counter", |current| Err(TestError::Rejected(u64_value(current.unwrap())))).unwrap_err();
        assert!(matches!(err, TestError::Rejected(2)));
        assert_eq!(u64_value(&bucket.get(b"counter").unwrap().unwrap()), 2);
    }

    #[test]
    fn test_concurrent_updates() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let bucket = Bucket::new(db.clone(), "test").unwrap();
        bucket.put(b"counter", 0u64.to_be_bytes()).unwrap();

        let handles = (0..4)
            .map(|_| {
                let bucket = bucket.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        bucket
                            .update::<_, StoreError, _>(b"counter", |current| {
                                Ok((u64_value(current.unwrap()) + 1).to_be_bytes().to_vec())
                            })
                            .unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();

        // a concurrent reader only ever observes committed values
        let mut last = 0;
        while last < 200 {
            let value = u64_value(&bucket.get(b"counter").unwrap().unwrap());
            assert!(value >= last);
            last = value;
            if handles.iter().all(|h| h.is_finished()) {
                break;
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(u64_value(&bucket.get(b"counter").unwrap().unwrap()), 200);
        drop(bucket);
    }

    #[test]
    fn test_range_update() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let bucket = Bucket::new(db.clone(), "test").unwrap();
        for i in 0u64..5 {
            bucket.put(i.to_be_bytes(), i.to_be_bytes()).unwrap();
        }

        bucket.range_update::<StoreError, _>(|_, value| Ok((u64_value(value) * 10).to_be_bytes().to_vec())).unwrap();
        let values = bucket.get_all().unwrap().values().map(|v| u64_value(v)).collect::<Vec<_>>();
        assert_eq!(values, vec![0, 10, 20, 30, 40]);

        // failing on the third pair leaves every pair untouched
        let mut seen = 0;
        let err = bucket
            .range_update(|_, value| {
                seen += 1;
                if seen == 3 { Err(TestError::Rejected(u64_value(value))) } else { Ok(vec![0]) }
            })
            .unwrap_err();
        assert!(matches!(err, TestError::Rejected(20)));
        let values = bucket.get_all().unwrap().values().map(|v| u64_value(v)).collect::<Vec<_>>();
        assert_eq!(values, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn test_iteration_and_reset() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let bucket = Bucket::new(db.clone(), "ab").unwrap();
        // shares the leading name bytes, must stay isolated
        let other = Bucket::new(db.clone(), "abc").unwrap();

        assert!(bucket.is_empty().unwrap());
        bucket.put(b"b", b"2").unwrap();
        bucket.put(b"a", b"1").unwrap();
        bucket.put(b"c", b"3").unwrap();
        other.put(b"a", b"x").unwrap();

        assert_eq!(bucket.len().unwrap(), 3);
        assert_eq!(other.len().unwrap(), 1);
        let all = bucket.get_all().unwrap();
        assert_eq!(all.keys().cloned().collect::<Vec<_>>(), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        let mut visited = vec![];
        bucket
            .for_each::<StoreError, _>(|key, value| {
                visited.push((key.to_vec(), value.to_vec()));
                Ok(())
            })
            .unwrap();
        assert_eq!(visited, vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec()), (b"c".to_vec(), b"3".to_vec())]);

        // visitor failure aborts the iteration
        let mut count = 0;
        let err = bucket
            .for_each(|_, _| {
                count += 1;
                if count == 2 { Err(TestError::Rejected(2)) } else { Ok(()) }
            })
            .unwrap_err();
        assert!(matches!(err, TestError::Rejected(2)));
        assert_eq!(count, 2);

        bucket.reset().unwrap();
        assert!(bucket.is_empty().unwrap());
        assert_eq!(bucket.len().unwrap(), 0);
        assert_eq!(other.get(b"a").unwrap(), Some(b"x".to_vec()));

        bucket.put(b"z", b"26").unwrap();
        assert_eq!(bucket.len().unwrap(), 1);
    }

    #[test]
    fn test_get_all_after_mixed_writes() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let bucket = Bucket::new(db.clone(), "test").unwrap();
        let mut expected = BTreeMap::new();

        for i in 0u8..8 {
            let key = vec![b'k', i];
            match i % 4 {
                0 => {
                    bucket.put(&key, [i]).unwrap();
                    expected.insert(key, vec![i]);
                }
                1 => {
                    bucket.put(&key, [i]).unwrap();
                    bucket.put(&key, [i, i]).unwrap();
                    expected.insert(key, vec![i, i]);
                }
                2 => {
                    bucket.put(&key, [i]).unwrap();
                    bucket.delete(&key).unwrap();
                }
                _ => {
                    bucket.put(&key, [i]).unwrap();
                    bucket.delete(&key).unwrap();
                    bucket.put(&key, [0xff]).unwrap();
                    expected.insert(key, vec![0xff]);
                }
            }
        }
        // later writes to earlier keys
        bucket.delete([b'k', 0]).unwrap();
        expected.remove(&vec![b'k', 0]);
        bucket.put([b'k', 2], b"back").unwrap();
        expected.insert(vec![b'k', 2], b"back".to_vec());

        assert_eq!(bucket.get_all().unwrap(), expected);
        assert_eq!(bucket.len().unwrap(), expected.len());
    }

    #[test]
    fn test_reset_empty_bucket() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let bucket = Bucket::new(db.clone(), "fresh").unwrap();
        let other = Bucket::new(db.clone(), "other").unwrap();
        other.put(b"a", b"1").unwrap();

        bucket.reset().unwrap();
        assert!(bucket.is_empty().unwrap());
        assert!(bucket.get_all().unwrap().is_empty());
        assert_eq!(other.get_all().unwrap(), BTreeMap::from([(b"a".to_vec(), b"1".to_vec())]));

        // a second reset is a no-op as well
        bucket.reset().unwrap();
        assert!(bucket.is_empty().unwrap());
        assert_eq!(other.len().unwrap(), 1);
    }

    #[test]
    fn test_invalid_bucket_name() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        assert!(matches!(Bucket::new(db.clone(), ""), Err(StoreError::InvalidBucketName(_))));
        let long = "x".repeat(Bucket::MAX_NAME_LEN + 1);
        assert!(matches!(Bucket::new(db.clone(), &long), Err(StoreError::InvalidBucketName(_))));
        assert!(Bucket::new(db.clone(), &"x".repeat(Bucket::MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_cross_bucket_transaction() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let first = Bucket::new(db.clone(), "first").unwrap();
        let second = Bucket::registered(db.clone(), DatabaseStoreBuckets::HistoryMeta);
        second.put(b"stale", b"1").unwrap();

        db.transaction::<_, StoreError, _>(|writer| {
            first.stage_put(&mut *writer, b"k", b"v")?;
            second.stage_write(&mut *writer, b"n", &7u64)?;
            second.stage_delete(&mut *writer, b"stale")?;
            // staged writes are not visible before commit
            assert_eq!(first.get(b"k")?, None);
            Ok(())
        })
        .unwrap();
        assert_eq!(first.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(second.read::<_, u64>(b"n").unwrap(), Some(7));
        assert_eq!(second.get(b"stale").unwrap(), None);

        // an error anywhere discards every staged write
        let err = db
            .transaction(|writer| {
                first.stage_reset(&mut *writer)?;
                second.stage_put(&mut *writer, b"n", b"garbage")?;
                Err::<(), _>(TestError::Rejected(0))
            })
            .unwrap_err();
        assert!(matches!(err, TestError::Rejected(0)));
        assert_eq!(first.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(second.read::<_, u64>(b"n").unwrap(), Some(7));
    }

    #[test]
    fn test_snapshot_reads() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let bucket = Bucket::new(db.clone(), "test").unwrap();
        bucket.put(b"a", b"1").unwrap();

        let snapshot = db.snapshot();
        bucket.put(b"a", b"2").unwrap();
        bucket.put(b"b", b"3").unwrap();

        assert_eq!(bucket.get_in(&snapshot, b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(bucket.len_in(&snapshot).unwrap(), 1);
        assert_eq!(bucket.get(b"a").unwrap(), Some(b"2".to_vec()));
        drop(snapshot);

        let mut writer = bucket.direct_writer();
        bucket.stage_put(&mut writer, b"c", b"4").unwrap();
        assert_eq!(bucket.len().unwrap(), 3);
    }
}
