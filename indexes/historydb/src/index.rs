use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use indexmap::IndexSet;
use itertools::Itertools;
use visor_addresses::Address;
use visor_consensus_core::{
    Block,
    tx::{TransactionId, UxOutId},
};
use visor_core::{debug, info, trace};
use visor_database::prelude::{DB, DbReader, StoreError};
use visor_hashes::Hash;

use crate::{
    IDENT,
    api::{HistoryIndexControlApi, HistoryIndexRetrievalApi},
    errors::{HistoryError, HistoryResult},
    model::{AccountBalance, Richlist, TransactionRecord, TransactionResult, TransactionStatus, UxOutRecord},
    stores::{
        address_txns::AddressTransactionsStoreReader, address_uxouts::AddressUxOutsStoreReader, blocks::BlockStoreReader,
        meta::HistoryMetaStoreReader, store_manager::Store, transactions::TransactionStoreReader, uxouts::UxOutStoreReader,
    },
    update_container::HistoryChanges,
};

fn corruption(msg: String) -> HistoryError {
    HistoryError::IndexCorruption(msg)
}

/// Derives per-address transaction and output history from confirmed blocks.
///
/// Every block is applied (or reverted) in a single database transaction which
/// also moves the parsed height, so after a crash the stores always reflect
/// exactly the blocks up to the persisted parsed height.
#[derive(Clone)]
pub struct HistoryIndex {
    db: Arc<DB>,
    store: Store,
}

impl HistoryIndex {
    pub fn new(db: Arc<DB>) -> Self {
        Self { store: Store::new(db.clone()), db }
    }

    /// Hash of the block indexed at height `seq`
    pub fn indexed_hash(&self, seq: u64) -> HistoryResult<Option<Hash>> {
        Ok(self.store.blocks.hash_by_seq(&*self.db, seq)?)
    }

    fn apply_block<R: DbReader>(&self, changes: &mut HistoryChanges<R>, block: &Block) -> HistoryResult<()> {
        let (seq, time) = (block.seq(), block.time());
        for tx in block.transactions.iter() {
            let txid = tx.id();
            if changes.has_transaction(&txid)? {
                return Err(corruption(format!("transaction {txid} in block {seq} is already indexed")));
            }
            let mut touched = IndexSet::new();

            for input in tx.inputs.iter() {
                let mut record = changes
                    .uxout(input)?
                    .ok_or_else(|| corruption(format!("transaction {txid} spends unknown output {input}")))?;
                if let Some(spender) = record.spent_tx_id {
                    return Err(corruption(format!("transaction {txid} spends output {input} already spent by {spender}")));
                }
                record.spent_tx_id = Some(txid);
                record.spent_block_seq = Some(seq);
                let owner = record.owner();
                let owned = changes.address_uxouts_mut(owner)?;
                if !owned.contains(input) {
                    owned.push(*input);
                }
                changes.put_uxout(*input, record);
                touched.insert(owner);
            }

            for ux in tx.ux_outs(time, seq) {
                let id = ux.hash();
                if changes.uxout(&id)?.is_some() {
                    return Err(corruption(format!("output {id} created by transaction {txid} already exists")));
                }
                changes.put_uxout(id, UxOutRecord::unspent(ux));
                changes.address_uxouts_mut(ux.body.address)?.push(id);
                touched.insert(ux.body.address);
            }

            for address in touched {
                let txs = changes.address_txns_mut(address)?;
                if txs.last() != Some(&txid) {
                    txs.push(txid);
                }
            }
            changes.insert_transaction(txid, TransactionRecord { txn: tx.clone(), block_seq: seq });
        }
        changes.insert_block(block.clone());
        changes.set_parsed_height(seq as i64);
        Ok(())
    }

    fn revert_block<R: DbReader>(&self, changes: &mut HistoryChanges<R>, block: &Block) -> HistoryResult<()> {
        let (seq, time) = (block.seq(), block.time());
        for tx in block.transactions.iter().rev() {
            let txid = tx.id();
            let mut touched = IndexSet::new();

            for ux in tx.ux_outs(time, seq).iter().rev() {
                let id = ux.hash();
                let record =
                    changes.uxout(&id)?.ok_or_else(|| corruption(format!("output {id} of reverted transaction {txid} is missing")))?;
                if let Some(spender) = record.spent_tx_id {
                    return Err(corruption(format!("output {id} of reverted transaction {txid} is still spent by {spender}")));
                }
                changes.delete_uxout(id);
                changes.address_uxouts_mut(record.owner())?.retain(|x| *x != id);
                touched.insert(record.owner());
            }

            for input in tx.inputs.iter().rev() {
                let mut record = changes
                    .uxout(input)?
                    .ok_or_else(|| corruption(format!("input {input} of reverted transaction {txid} is missing")))?;
                if record.spent_tx_id != Some(txid) {
                    return Err(corruption(format!("input {input} is not spent by reverted transaction {txid}")));
                }
                record.spent_tx_id = None;
                record.spent_block_seq = None;
                touched.insert(record.owner());
                changes.put_uxout(*input, record);
            }

            for address in touched {
                changes.address_txns_mut(address)?.retain(|x| *x != txid);
            }
            changes.delete_transaction(txid);
        }
        changes.delete_block(block.hash(), seq);
        changes.set_parsed_height(seq as i64 - 1);
        Ok(())
    }

    /// Reverts the highest indexed block unless the parsed height is already at or
    /// below `height`. Returns the parsed height after the step.
    fn rollback_step(&self, height: i64) -> HistoryResult<i64> {
        self.db.transaction(|writer| {
            let parsed = self.store.meta.parsed_height(&*self.db)?;
            if parsed <= height {
                return Ok(parsed);
            }
            let block = self
                .store
                .blocks
                .get_by_seq(&*self.db, parsed as u64)?
                .ok_or_else(|| corruption(format!("indexed block at height {parsed} is missing")))?;
            let mut changes = HistoryChanges::new(&self.store, &*self.db);
            self.revert_block(&mut changes, &block)?;
            changes.commit(writer)?;
            debug!("[{0}] reverted block {1} at height {2}", IDENT, block.hash(), parsed);
            Ok(parsed - 1)
        })
    }
}

impl HistoryIndexControlApi for HistoryIndex {
    fn index_block(&self, block: &Block) -> HistoryResult<()> {
        trace!("[{0}] indexing block {1} at height {2} with {3} transactions", IDENT, block.hash(), block.seq(), block.transactions.len());
        self.db.transaction(|writer| {
            let parsed = self.store.meta.parsed_height(&*self.db)?;
            let expected = parsed + 1;
            if i64::try_from(block.seq()).ok() != Some(expected) {
                return Err(HistoryError::UnexpectedHeight { expected, got: block.seq() });
            }
            if parsed >= 0 {
                let head = self
                    .store
                    .blocks
                    .hash_by_seq(&*self.db, parsed as u64)?
                    .ok_or_else(|| corruption(format!("indexed head block at height {parsed} is missing")))?;
                if head != block.header.prev_hash {
                    return Err(corruption(format!(
                        "block {} at height {} does not extend the indexed head {}",
                        block.hash(),
                        block.seq(),
                        head
                    )));
                }
            }
            let mut changes = HistoryChanges::new(&self.store, &*self.db);
            self.apply_block(&mut changes, block)?;
            changes.commit(writer)?;
            Ok(())
        })
    }

    fn rollback_to(&self, height: i64) -> HistoryResult<()> {
        if height < -1 {
            return Err(HistoryError::InvalidRollbackHeight(height));
        }
        let start = self.parsed_height()?;
        if start <= height {
            return Ok(());
        }
        info!("[{0}] rolling back from height {1} to height {2}", IDENT, start, height);
        while self.rollback_step(height)? > height {}
        Ok(())
    }

    fn reset(&self) -> HistoryResult<()> {
        info!("[{0}] resetting history index", IDENT);
        self.db.transaction(|writer| Ok(self.store.delete_all(writer)?))
    }
}

impl HistoryIndexRetrievalApi for HistoryIndex {
    fn parsed_height(&self) -> HistoryResult<i64> {
        Ok(self.store.meta.parsed_height(&*self.db)?)
    }

    fn get_uxout(&self, id: &UxOutId) -> HistoryResult<Option<UxOutRecord>> {
        trace!("[{0}] retrieving output {1}", IDENT, id);
        Ok(self.store.uxouts.get(&*self.db, id)?)
    }

    fn get_transaction(&self, id: &TransactionId) -> HistoryResult<Option<TransactionRecord>> {
        trace!("[{0}] retrieving transaction {1}", IDENT, id);
        Ok(self.store.transactions.get(&*self.db, id)?)
    }

    fn get_address_txns(&self, address: &Address) -> HistoryResult<Vec<TransactionResult>> {
        trace!("[{0}] retrieving transactions of {1}", IDENT, address);
        let snapshot = self.db.snapshot();
        let head = u64::try_from(self.store.meta.parsed_height(&snapshot)?).unwrap_or_default();
        let mut block_times = HashMap::new();
        let mut results = vec![];
        for id in self.store.address_txns.get(&snapshot, address)? {
            let record = self
                .store
                .transactions
                .get(&snapshot, &id)?
                .ok_or_else(|| corruption(format!("transaction {id} of address {address} is missing")))?;
            let seq = record.block_seq;
            let time = match block_times.get(&seq) {
                Some(time) => *time,
                None => {
                    let block = self
                        .store
                        .blocks
                        .get_by_seq(&snapshot, seq)?
                        .ok_or_else(|| corruption(format!("block at height {seq} of transaction {id} is missing")))?;
                    *block_times.entry(seq).or_insert(block.time())
                }
            };
            let input_owners = record
                .txn
                .inputs
                .iter()
                .map(|input| match self.store.uxouts.get(&snapshot, input)? {
                    Some(spent) => Ok(spent.owner()),
                    None => Err(corruption(format!("output {input} spent by transaction {id} is missing"))),
                })
                .collect::<HistoryResult<Vec<_>>>()?;
            let status = TransactionStatus { confirmed: true, height: head.saturating_sub(seq) + 1, block_seq: seq };
            results.push(TransactionResult { txn: record.txn, status, time, input_owners });
        }
        Ok(results)
    }

    fn get_address_uxouts(&self, address: &Address) -> HistoryResult<Vec<UxOutRecord>> {
        trace!("[{0}] retrieving outputs of {1}", IDENT, address);
        let snapshot = self.db.snapshot();
        self.store
            .address_uxouts
            .get(&snapshot, address)?
            .into_iter()
            .map(|id| {
                self.store.uxouts.get(&snapshot, &id)?.ok_or_else(|| corruption(format!("output {id} of address {address} is missing")))
            })
            .collect()
    }

    fn get_address_count(&self) -> HistoryResult<usize> {
        Ok(self.store.address_uxouts.count(&*self.db)?)
    }

    fn get_richlist(&self, distribution: &[Address], include_distribution: bool) -> HistoryResult<Richlist> {
        trace!("[{0}] computing richlist", IDENT);
        let snapshot = self.db.snapshot();
        let mut balances = vec![];
        self.store.address_uxouts.for_each(&snapshot, |address, ids| {
            let locked = distribution.contains(&address);
            if locked && !include_distribution {
                return Ok(());
            }
            let mut coins = 0u64;
            for id in ids {
                let record = self
                    .store
                    .uxouts
                    .get(&snapshot, &id)?
                    .ok_or_else(|| StoreError::DataInconsistency(format!("output {id} of address {address} is missing")))?;
                if !record.is_spent() {
                    coins = coins
                        .checked_add(record.coins())
                        .ok_or_else(|| StoreError::DataInconsistency(format!("balance of address {address} overflows")))?;
                }
            }
            if coins > 0 {
                balances.push(AccountBalance { address, coins, locked });
            }
            Ok(())
        })?;
        Ok(balances.into_iter().sorted_by_cached_key(|balance| (Reverse(balance.coins), balance.address.to_string())).collect())
    }

    fn get_block_by_hash(&self, hash: &Hash) -> HistoryResult<Option<Block>> {
        Ok(self.store.blocks.get(&*self.db, hash)?)
    }

    fn get_block_by_seq(&self, seq: u64) -> HistoryResult<Option<Block>> {
        let snapshot = self.db.snapshot();
        Ok(self.store.blocks.get_by_seq(&snapshot, seq)?)
    }

    fn get_blocks(&self, start: u64, end: u64) -> HistoryResult<Vec<Block>> {
        let snapshot = self.db.snapshot();
        let Ok(head) = u64::try_from(self.store.meta.parsed_height(&snapshot)?) else {
            return Ok(vec![]);
        };
        (start..=end.min(head))
            .map(|seq| {
                self.store.blocks.get_by_seq(&snapshot, seq)?.ok_or_else(|| corruption(format!("indexed block at height {seq} is missing")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use visor_consensus_core::{
        testutils::{ChainBuilder, GENESIS_TIME, mint_tx, spend_tx, test_address},
        tx::{TransactionOutput, UxOut},
    };
    use visor_database::{
        create_permanent_db, create_temp_db,
        prelude::{Bucket, ConnBuilder},
        registry::DatabaseStoreBuckets,
    };

    /// Raw contents of every history bucket
    fn dump(db: &Arc<DB>) -> Vec<BTreeMap<Vec<u8>, Vec<u8>>> {
        DatabaseStoreBuckets::HISTORY.iter().map(|bucket| Bucket::registered(db.clone(), *bucket).get_all().unwrap()).collect()
    }

    fn outputs_of(block: &Block, tx_index: usize) -> Vec<UxOut> {
        block.transactions[tx_index].ux_outs(block.time(), block.seq())
    }

    /// Genesis mints O1 (100 coins) to A, block 1 spends O1 into O2 (100 coins) owned by B
    fn two_block_chain() -> ChainBuilder {
        let mut chain = ChainBuilder::new();
        let genesis = chain.push(vec![mint_tx(vec![TransactionOutput::new(test_address(1), 100, 10)])]);
        let o1 = outputs_of(&genesis, 0)[0];
        chain.push(vec![spend_tx(&[o1], vec![TransactionOutput::new(test_address(2), 100, 5)])]);
        chain
    }

    #[test]
    fn test_index_spend() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let chain = two_block_chain();
        let (a, b) = (test_address(1), test_address(2));
        let (genesis, block1) = (chain.blocks()[0].clone(), chain.blocks()[1].clone());
        let (t1, t2) = (genesis.transactions[0].id(), block1.transactions[0].id());
        let o1 = outputs_of(&genesis, 0)[0];
        let o2 = outputs_of(&block1, 0)[0];

        assert_eq!(index.parsed_height().unwrap(), -1);
        index.index_block(&genesis).unwrap();
        assert_eq!(index.parsed_height().unwrap(), 0);
        assert!(!index.get_uxout(&o1.hash()).unwrap().unwrap().is_spent());

        index.index_block(&block1).unwrap();
        assert_eq!(index.parsed_height().unwrap(), 1);

        let spent = index.get_uxout(&o1.hash()).unwrap().unwrap();
        assert_eq!(spent.spent_tx_id, Some(t2));
        assert_eq!(spent.spent_block_seq, Some(1));
        assert_eq!(index.get_uxout(&o2.hash()).unwrap().unwrap(), UxOutRecord::unspent(o2));

        let a_txns = index.get_address_txns(&a).unwrap();
        assert_eq!(a_txns.iter().map(|x| x.txn.id()).collect::<Vec<_>>(), vec![t1, t2]);
        assert_eq!(a_txns[0].status, TransactionStatus { confirmed: true, height: 2, block_seq: 0 });
        assert_eq!(a_txns[1].status, TransactionStatus { confirmed: true, height: 1, block_seq: 1 });
        assert_eq!(a_txns[1].time, block1.time());
        assert!(a_txns[0].input_owners.is_empty());
        assert_eq!(a_txns[1].input_owners, vec![a]);
        assert_eq!(index.get_address_txns(&b).unwrap().iter().map(|x| x.txn.id()).collect::<Vec<_>>(), vec![t2]);
        assert!(index.get_address_txns(&test_address(9)).unwrap().is_empty());

        assert_eq!(index.get_address_uxouts(&a).unwrap(), vec![spent]);
        assert_eq!(index.get_address_uxouts(&b).unwrap(), vec![UxOutRecord::unspent(o2)]);
        assert_eq!(index.get_address_count().unwrap(), 2);
        assert_eq!(index.get_transaction(&t2).unwrap().unwrap().block_seq, 1);

        assert_eq!(index.get_richlist(&[], false).unwrap(), vec![AccountBalance { address: b, coins: 100, locked: false }]);

        assert_eq!(index.get_block_by_seq(1).unwrap().unwrap(), *block1);
        assert_eq!(index.get_block_by_hash(&genesis.hash()).unwrap().unwrap(), *genesis);
        assert_eq!(index.get_blocks(0, 10).unwrap().len(), 2);
        assert_eq!(index.get_blocks(1, 1).unwrap()[0].hash(), block1.hash());
        assert!(index.get_blocks(2, 1).unwrap().is_empty());
        assert!(index.get_block_by_seq(2).unwrap().is_none());
    }

    #[test]
    fn test_spend_within_block() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let mut chain = ChainBuilder::new();
        let mint = mint_tx(vec![TransactionOutput::new(test_address(1), 50, 0)]);
        let minted = mint.ux_outs(GENESIS_TIME, 0)[0];
        let spend = spend_tx(&[minted], vec![TransactionOutput::new(test_address(2), 50, 0)]);
        let genesis = chain.push(vec![mint, spend.clone()]);

        index.index_block(&genesis).unwrap();
        assert_eq!(index.get_uxout(&minted.hash()).unwrap().unwrap().spent_tx_id, Some(spend.id()));
        assert_eq!(index.get_address_txns(&test_address(1)).unwrap().len(), 2);
        assert_eq!(index.get_richlist(&[], false).unwrap(), vec![AccountBalance { address: test_address(2), coins: 50, locked: false }]);
    }

    #[test]
    fn test_unexpected_height() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let chain = two_block_chain();

        let err = index.index_block(&chain.blocks()[1]).unwrap_err();
        assert!(matches!(err, HistoryError::UnexpectedHeight { expected: 0, got: 1 }));
        assert_eq!(index.parsed_height().unwrap(), -1);

        index.index_block(&chain.blocks()[0]).unwrap();
        // the same block again is rejected as well
        assert!(matches!(index.index_block(&chain.blocks()[0]).unwrap_err(), HistoryError::UnexpectedHeight { expected: 1, got: 0 }));
    }

    #[test]
    fn test_index_corruption_leaves_no_trace() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let mut chain = ChainBuilder::new();
        let genesis = chain.push(vec![mint_tx(vec![TransactionOutput::new(test_address(1), 100, 10)])]);
        index.index_block(&genesis).unwrap();
        let before = dump(&db);

        // a valid spend followed by a spend of an unknown output in the same block
        let o1 = outputs_of(&genesis, 0)[0];
        let mut bogus = o1;
        bogus.body.coins = 1;
        let block = chain.push(vec![
            spend_tx(&[o1], vec![TransactionOutput::new(test_address(2), 100, 0)]),
            spend_tx(&[bogus], vec![TransactionOutput::new(test_address(3), 1, 0)]),
        ]);
        let err = index.index_block(&block).unwrap_err();
        assert!(matches!(err, HistoryError::IndexCorruption(_)));
        assert!(err.is_fatal());
        assert_eq!(dump(&db), before);
        assert_eq!(index.parsed_height().unwrap(), 0);
    }

    #[test]
    fn test_double_spend_is_corruption() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let mut chain = ChainBuilder::new();
        let genesis = chain.push(vec![mint_tx(vec![TransactionOutput::new(test_address(1), 100, 10)])]);
        let o1 = outputs_of(&genesis, 0)[0];
        let block = chain.push(vec![
            spend_tx(&[o1], vec![TransactionOutput::new(test_address(2), 100, 0)]),
            spend_tx(&[o1], vec![TransactionOutput::new(test_address(3), 100, 0)]),
        ]);
        index.index_block(&genesis).unwrap();
        assert!(matches!(index.index_block(&block).unwrap_err(), HistoryError::IndexCorruption(_)));
        assert_eq!(index.parsed_height().unwrap(), 0);
    }

    #[test]
    fn test_block_not_extending_head() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let chain = two_block_chain();
        index.index_block(&chain.blocks()[0]).unwrap();

        let mut unlinked = (*chain.blocks()[1]).clone();
        unlinked.header.prev_hash = Hash::from_u64_word(7);
        unlinked.header.finalize();
        assert!(matches!(index.index_block(&unlinked).unwrap_err(), HistoryError::IndexCorruption(_)));
    }

    #[test]
    fn test_rollback_and_reapply() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let mut chain = two_block_chain();
        let o2 = outputs_of(&chain.blocks()[1], 0)[0];
        // block 2 splits O2 between A and C, block 3 moves A's part to B
        let block2 = chain.push(vec![spend_tx(
            &[o2],
            vec![TransactionOutput::new(test_address(1), 60, 1), TransactionOutput::new(test_address(3), 40, 1)],
        )]);
        let a_part = outputs_of(&block2, 0)[0];
        chain.push(vec![spend_tx(&[a_part], vec![TransactionOutput::new(test_address(2), 60, 0)])]);

        let mut states = vec![];
        for block in chain.blocks() {
            index.index_block(block).unwrap();
            states.push(dump(&db));
        }
        assert_eq!(index.parsed_height().unwrap(), 3);

        index.rollback_to(1).unwrap();
        assert_eq!(index.parsed_height().unwrap(), 1);
        assert_eq!(dump(&db), states[1]);
        assert!(index.get_block_by_seq(2).unwrap().is_none());
        assert!(!index.get_uxout(&o2.hash()).unwrap().unwrap().is_spent());

        // rolling back to the current height or above changes nothing
        index.rollback_to(1).unwrap();
        index.rollback_to(5).unwrap();
        assert_eq!(dump(&db), states[1]);

        for block in &chain.blocks()[2..] {
            index.index_block(block).unwrap();
        }
        assert_eq!(dump(&db), states[3]);

        index.rollback_to(-1).unwrap();
        assert_eq!(index.parsed_height().unwrap(), -1);
        assert!(dump(&db).iter().all(|bucket| bucket.is_empty()));

        assert!(matches!(index.rollback_to(-2).unwrap_err(), HistoryError::InvalidRollbackHeight(-2)));
    }

    #[test]
    fn test_reorg_to_competing_fork() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let chain = two_block_chain();
        for block in chain.blocks() {
            index.index_block(block).unwrap();
        }

        // the fork spends O1 to C instead of B
        let mut fork = chain.fork_at(0);
        let o1 = outputs_of(&chain.blocks()[0], 0)[0];
        let fork_block = fork.push(vec![spend_tx(&[o1], vec![TransactionOutput::new(test_address(3), 100, 0)])]);

        index.rollback_to(0).unwrap();
        index.index_block(&fork_block).unwrap();

        assert!(index.get_address_txns(&test_address(2)).unwrap().is_empty());
        assert_eq!(index.get_address_txns(&test_address(3)).unwrap().len(), 1);
        assert_eq!(
            index.get_richlist(&[], false).unwrap(),
            vec![AccountBalance { address: test_address(3), coins: 100, locked: false }]
        );
        assert_eq!(index.get_address_count().unwrap(), 2);
    }

    #[test]
    fn test_richlist() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let (a, b, c, d) = (test_address(1), test_address(2), test_address(3), test_address(4));
        let mut chain = ChainBuilder::new();
        let genesis = chain.push(vec![mint_tx(vec![
            TransactionOutput::new(a, 500, 0),
            TransactionOutput::new(b, 300, 0),
            TransactionOutput::new(c, 200, 0),
            TransactionOutput::new(b, 100, 0),
        ])]);
        // C spends everything it owns to D
        let c_out = outputs_of(&genesis, 0)[2];
        chain.push(vec![spend_tx(&[c_out], vec![TransactionOutput::new(d, 200, 0)])]);
        for block in chain.blocks() {
            index.index_block(block).unwrap();
        }

        let richlist = index.get_richlist(&[a], false).unwrap();
        assert_eq!(
            richlist,
            vec![AccountBalance { address: b, coins: 400, locked: false }, AccountBalance { address: d, coins: 200, locked: false }]
        );

        let richlist = index.get_richlist(&[a], true).unwrap();
        assert_eq!(richlist[0], AccountBalance { address: a, coins: 500, locked: true });
        assert_eq!(richlist.len(), 3);

        // C still counts as an address even with a zero balance
        assert_eq!(index.get_address_count().unwrap(), 4);
    }

    #[test]
    fn test_reset() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        for block in two_block_chain().blocks() {
            index.index_block(block).unwrap();
        }
        index.reset().unwrap();
        assert_eq!(index.parsed_height().unwrap(), -1);
        assert!(dump(&db).iter().all(|bucket| bucket.is_empty()));

        // rebuilding from genesis works after a reset
        index.index_block(&two_block_chain().blocks()[0]).unwrap();
        assert_eq!(index.parsed_height().unwrap(), 0);
    }

    #[test]
    fn test_parsed_height_survives_reopen() {
        let tempdir = visor_database::utils::get_visor_tempdir();
        let chain = two_block_chain();
        {
            let (_lifetime, db) = create_permanent_db!(tempdir.path(), ConnBuilder::default().with_files_limit(10));
            let index = HistoryIndex::new(db.clone());
            index.index_block(&chain.blocks()[0]).unwrap();
            index.index_block(&chain.blocks()[1]).unwrap();
        }
        let (_lifetime, db) = create_permanent_db!(tempdir.path(), ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        assert_eq!(index.parsed_height().unwrap(), 1);
        assert_eq!(index.get_address_count().unwrap(), 2);
        assert!(matches!(index.index_block(&chain.blocks()[1]).unwrap_err(), HistoryError::UnexpectedHeight { .. }));
    }
}
