use indexmap::{IndexMap, map::Entry};
use visor_addresses::Address;
use visor_consensus_core::{
    Block,
    tx::{TransactionId, UxOutId},
};
use visor_database::prelude::{BatchDbWriter, DbReader, StoreResult};
use visor_hashes::Hash;

use crate::{
    model::{TransactionRecord, UxOutRecord},
    stores::{
        address_txns::{AddressTransactionsStore, AddressTransactionsStoreReader},
        address_uxouts::{AddressUxOutsStore, AddressUxOutsStoreReader},
        blocks::BlockStore,
        meta::HistoryMetaStore,
        store_manager::Store,
        transactions::{TransactionStore, TransactionStoreReader},
        uxouts::{UxOutStore, UxOutStoreReader},
    },
};

enum BlockChange {
    Insert(Block),
    Delete { hash: Hash, seq: u64 },
}

/// Changes to the history stores caused by applying or reverting one block.
///
/// Reads go through the staged changes first and fall back to the committed
/// store state, so a transaction observes the effects of the transactions
/// before it in the same block. Nothing reaches the database before [`commit`](Self::commit).
pub(crate) struct HistoryChanges<'a, R: DbReader> {
    store: &'a Store,
    reader: &'a R,
    /// `None` marks a deleted output
    uxouts: IndexMap<UxOutId, Option<UxOutRecord>>,
    /// `None` marks a deleted transaction
    transactions: IndexMap<TransactionId, Option<TransactionRecord>>,
    address_txns: IndexMap<Address, Vec<TransactionId>>,
    address_uxouts: IndexMap<Address, Vec<UxOutId>>,
    block: Option<BlockChange>,
    parsed_height: Option<i64>,
}

impl<'a, R: DbReader> HistoryChanges<'a, R> {
    pub fn new(store: &'a Store, reader: &'a R) -> Self {
        Self {
            store,
            reader,
            uxouts: IndexMap::new(),
            transactions: IndexMap::new(),
            address_txns: IndexMap::new(),
            address_uxouts: IndexMap::new(),
            block: None,
            parsed_height: None,
        }
    }

    pub fn uxout(&self, id: &UxOutId) -> StoreResult<Option<UxOutRecord>> {
        match self.uxouts.get(id) {
            Some(staged) => Ok(*staged),
            None => self.store.uxouts.get(self.reader, id),
        }
    }

    pub fn put_uxout(&mut self, id: UxOutId, record: UxOutRecord) {
        self.uxouts.insert(id, Some(record));
    }

    pub fn delete_uxout(&mut self, id: UxOutId) {
        self.uxouts.insert(id, None);
    }

    pub fn has_transaction(&self, id: &TransactionId) -> StoreResult<bool> {
        match self.transactions.get(id) {
            Some(staged) => Ok(staged.is_some()),
            None => Ok(self.store.transactions.get(self.reader, id)?.is_some()),
        }
    }

    pub fn insert_transaction(&mut self, id: TransactionId, record: TransactionRecord) {
        self.transactions.insert(id, Some(record));
    }

    pub fn delete_transaction(&mut self, id: TransactionId) {
        self.transactions.insert(id, None);
    }

    /// Transaction ids of `address`, loaded from the store on first access
    pub fn address_txns_mut(&mut self, address: Address) -> StoreResult<&mut Vec<TransactionId>> {
        match self.address_txns.entry(address) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let current = self.store.address_txns.get(self.reader, &address)?;
                Ok(entry.insert(current))
            }
        }
    }

    /// Output ids of `address`, loaded from the store on first access
    pub fn address_uxouts_mut(&mut self, address: Address) -> StoreResult<&mut Vec<UxOutId>> {
        match self.address_uxouts.entry(address) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let current = self.store.address_uxouts.get(self.reader, &address)?;
                Ok(entry.insert(current))
            }
        }
    }

    pub fn insert_block(&mut self, block: Block) {
        self.block = Some(BlockChange::Insert(block));
    }

    pub fn delete_block(&mut self, hash: Hash, seq: u64) {
        self.block = Some(BlockChange::Delete { hash, seq });
    }

    pub fn set_parsed_height(&mut self, height: i64) {
        self.parsed_height = Some(height);
    }

    /// Stages every change into `writer`, the parsed height last
    pub fn commit(self, writer: &mut BatchDbWriter) -> StoreResult<()> {
        let store = self.store;
        for (id, record) in self.uxouts.iter() {
            match record {
                Some(record) => store.uxouts.write(&mut *writer, id, record)?,
                None => store.uxouts.delete(&mut *writer, id)?,
            }
        }
        for (id, record) in self.transactions.iter() {
            match record {
                Some(record) => store.transactions.write(&mut *writer, id, record)?,
                None => store.transactions.delete(&mut *writer, id)?,
            }
        }
        for (address, txs) in self.address_txns.iter() {
            store.address_txns.write(&mut *writer, address, txs)?;
        }
        for (address, uxouts) in self.address_uxouts.iter() {
            store.address_uxouts.write(&mut *writer, address, uxouts)?;
        }
        match &self.block {
            Some(BlockChange::Insert(block)) => store.blocks.insert(&mut *writer, block)?,
            Some(BlockChange::Delete { hash, seq }) => store.blocks.delete(&mut *writer, hash, *seq)?,
            None => {}
        }
        if let Some(height) = self.parsed_height {
            store.meta.set_parsed_height(&mut *writer, height)?;
        }
        Ok(())
    }
}
