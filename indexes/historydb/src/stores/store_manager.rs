use std::sync::Arc;

use visor_database::prelude::{DB, DbWriter, StoreResult};
use visor_core::trace;

use crate::{
    IDENT,
    stores::{
        address_txns::DbAddressTransactionsStore, address_uxouts::DbAddressUxOutsStore, blocks::DbBlockStore,
        meta::DbHistoryMetaStore, transactions::DbTransactionStore, uxouts::DbUxOutStore,
    },
};

/// All history stores, sharing one database
#[derive(Clone)]
pub struct Store {
    pub meta: DbHistoryMetaStore,
    pub uxouts: DbUxOutStore,
    pub transactions: DbTransactionStore,
    pub address_txns: DbAddressTransactionsStore,
    pub address_uxouts: DbAddressUxOutsStore,
    pub blocks: DbBlockStore,
}

impl Store {
    pub fn new(db: Arc<DB>) -> Self {
        Self {
            meta: DbHistoryMetaStore::new(db.clone()),
            uxouts: DbUxOutStore::new(db.clone()),
            transactions: DbTransactionStore::new(db.clone()),
            address_txns: DbAddressTransactionsStore::new(db.clone()),
            address_uxouts: DbAddressUxOutsStore::new(db.clone()),
            blocks: DbBlockStore::new(db),
        }
    }

    /// Stages the removal of every history entry, including the parsed height
    pub fn delete_all(&self, mut writer: impl DbWriter) -> StoreResult<()> {
        trace!("[{0}] clearing all history stores", IDENT);
        self.uxouts.delete_all(&mut writer)?;
        self.transactions.delete_all(&mut writer)?;
        self.address_txns.delete_all(&mut writer)?;
        self.address_uxouts.delete_all(&mut writer)?;
        self.blocks.delete_all(&mut writer)?;
        self.meta.delete_all(&mut writer)
    }
}
