use std::sync::Arc;

use visor_consensus_core::Block;
use visor_database::{
    prelude::{Bucket, DB, DbReader, DbWriter, StoreResult, itob},
    registry::DatabaseStoreBuckets,
};
use visor_hashes::Hash;

/// Reader API for `BlockStore`.
pub trait BlockStoreReader {
    fn get(&self, reader: &impl DbReader, hash: &Hash) -> StoreResult<Option<Block>>;

    fn hash_by_seq(&self, reader: &impl DbReader, seq: u64) -> StoreResult<Option<Hash>>;

    fn get_by_seq(&self, reader: &impl DbReader, seq: u64) -> StoreResult<Option<Block>> {
        match self.hash_by_seq(reader, seq)? {
            Some(hash) => self.get(reader, &hash),
            None => Ok(None),
        }
    }
}

pub trait BlockStore: BlockStoreReader {
    fn insert(&self, writer: impl DbWriter, block: &Block) -> StoreResult<()>;

    fn delete(&self, writer: impl DbWriter, hash: &Hash, seq: u64) -> StoreResult<()>;
}

/// Indexed blocks by hash, plus a height to hash mapping
#[derive(Clone)]
pub struct DbBlockStore {
    blocks: Bucket,
    hash_by_seq: Bucket,
}

impl DbBlockStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self {
            blocks: Bucket::registered(db.clone(), DatabaseStoreBuckets::Blocks),
            hash_by_seq: Bucket::registered(db, DatabaseStoreBuckets::BlockHashBySeq),
        }
    }

    pub fn delete_all(&self, mut writer: impl DbWriter) -> StoreResult<()> {
        self.blocks.stage_reset(&mut writer)?;
        self.hash_by_seq.stage_reset(&mut writer)
    }
}

impl BlockStoreReader for DbBlockStore {
    fn get(&self, reader: &impl DbReader, hash: &Hash) -> StoreResult<Option<Block>> {
        self.blocks.read_in(reader, hash)
    }

    fn hash_by_seq(&self, reader: &impl DbReader, seq: u64) -> StoreResult<Option<Hash>> {
        self.hash_by_seq.read_in(reader, itob(seq))
    }
}

impl BlockStore for DbBlockStore {
    fn insert(&self, mut writer: impl DbWriter, block: &Block) -> StoreResult<()> {
        self.blocks.stage_write(&mut writer, block.hash(), block)?;
        self.hash_by_seq.stage_write(&mut writer, itob(block.seq()), &block.hash())
    }

    fn delete(&self, mut writer: impl DbWriter, hash: &Hash, seq: u64) -> StoreResult<()> {
        self.blocks.stage_delete(&mut writer, hash)?;
        self.hash_by_seq.stage_delete(&mut writer, itob(seq))
    }
}
