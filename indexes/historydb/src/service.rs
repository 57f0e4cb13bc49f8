use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_channel::Receiver;
use triggered::{Listener, Trigger};
use visor_consensus_core::{api::ChainSource, notify::ChainEvent};
use visor_core::{debug, error, info, trace, warn};

use crate::{
    IDENT,
    api::{HistoryIndexControlApi, HistoryIndexRetrievalApi},
    errors::{HistoryError, HistoryResult},
    index::HistoryIndex,
};

/// Bounded exponential backoff for storage faults hit while indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self { max_retries, initial_backoff, max_backoff: Duration::from_secs(30) }
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(attempt)).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(200))
    }
}

/// Feeds chain events into the [`HistoryIndex`], one at a time.
///
/// Confirmed blocks at or below the parsed height are skipped. When a block arrives
/// ahead of the index, the missing heights are first fetched from the chain source.
/// A fatal error halts the service, the index then keeps serving queries at its
/// last parsed height.
pub struct HistoryIndexService {
    index: HistoryIndex,
    source: Option<Arc<dyn ChainSource>>,
    events: Receiver<ChainEvent>,
    retry: RetryPolicy,
    shutdown_trigger: Trigger,
    shutdown_listener: Listener,
    halted: AtomicBool,
}

impl HistoryIndexService {
    pub fn new(index: HistoryIndex, source: Option<Arc<dyn ChainSource>>, events: Receiver<ChainEvent>, retry: RetryPolicy) -> Self {
        let (shutdown_trigger, shutdown_listener) = triggered::trigger();
        Self { index, source, events, retry, shutdown_trigger, shutdown_listener, halted: AtomicBool::new(false) }
    }

    pub fn index(&self) -> &HistoryIndex {
        &self.index
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    pub fn signal_exit(&self) {
        trace!("[{0}] sending an exit signal", IDENT);
        self.shutdown_trigger.trigger();
    }

    /// Runs until the event channel closes or an exit is signalled.
    /// Returns the error which halted the service, if any.
    pub async fn start(self: Arc<Self>) -> HistoryResult<()> {
        info!("[{0}] history index service starting at height {1}", IDENT, self.index.parsed_height()?);

        if let Some(tip) = self.source.as_ref().and_then(|source| source.head_seq().and_then(|seq| source.block_by_seq(seq))) {
            debug!("[{0}] catching up with chain tip {1}", IDENT, tip.seq());
            self.process(ChainEvent::BlockConfirmed(tip)).await?;
        }

        let shutdown = self.shutdown_listener.clone();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("[{0}] exit signal received", IDENT);
                    break;
                }
                event = self.events.recv() => match event {
                    Ok(event) => self.process(event).await?,
                    Err(_) => {
                        debug!("[{0}] chain event stream ended", IDENT);
                        break;
                    }
                }
            }
        }
        info!("[{0}] history index service stopped at height {1}", IDENT, self.index.parsed_height()?);
        Ok(())
    }

    async fn process(&self, event: ChainEvent) -> HistoryResult<()> {
        let mut attempt = 0;
        loop {
            match self.apply(event.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    attempt += 1;
                    warn!("[{0}] {1} event failed ({2}), retry {3}/{4} in {5:?}", IDENT, event.kind(), err, attempt, self.retry.max_retries, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(err) if err.is_fatal() || err.is_retryable() => {
                    self.halted.store(true, Ordering::SeqCst);
                    error!("[{0}] halting history indexing: {1}", IDENT, err);
                    return Err(err);
                }
                Err(err) => {
                    warn!("[{0}] ignoring {1} event: {2}", IDENT, event.kind(), err);
                    return Ok(());
                }
            }
        }
    }

    async fn apply(&self, event: ChainEvent) -> HistoryResult<()> {
        let index = self.index.clone();
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || apply_event(&index, source.as_deref(), event))
            .await
            .map_err(|err| HistoryError::TaskError(err.to_string()))?
    }
}

fn apply_event(index: &HistoryIndex, source: Option<&dyn ChainSource>, event: ChainEvent) -> HistoryResult<()> {
    trace!("[{0}] processing {1} event", IDENT, event.kind());
    match event {
        ChainEvent::BlockConfirmed(block) => {
            let parsed = index.parsed_height()?;
            let seq = block.seq() as i64;
            if seq <= parsed {
                // a different block at an indexed height is a fork that arrived without its reorg
                return match index.indexed_hash(block.seq())? {
                    Some(hash) if hash == block.hash() => {
                        trace!("[{0}] block {1} at height {2} is already indexed", IDENT, hash, seq);
                        Ok(())
                    }
                    Some(hash) => Err(HistoryError::IndexCorruption(format!(
                        "block {} at height {} conflicts with indexed block {} and no reorg was received",
                        block.hash(),
                        seq,
                        hash
                    ))),
                    None => Err(HistoryError::IndexCorruption(format!("no block is indexed at parsed height {seq}"))),
                };
            }
            for missing in (parsed + 1) as u64..block.seq() {
                let block = source.and_then(|source| source.block_by_seq(missing)).ok_or(HistoryError::MissingBlock(missing))?;
                index.index_block(&block)?;
            }
            index.index_block(&block)
        }
        ChainEvent::Reorg { fork_height } => index.rollback_to(fork_height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visor_consensus_core::{
        Block,
        testutils::{ChainBuilder, mint_tx, spend_tx, test_address},
        tx::TransactionOutput,
    };
    use visor_database::{create_temp_db, prelude::ConnBuilder};

    fn chain_of(len: usize) -> ChainBuilder {
        let mut chain = ChainBuilder::new();
        let genesis = chain.push(vec![mint_tx(vec![TransactionOutput::new(test_address(0), 1_000, 0)])]);
        let mut coins = genesis.transactions[0].ux_outs(genesis.time(), 0)[0];
        for i in 1..len {
            let tx = spend_tx(&[coins], vec![TransactionOutput::new(test_address(i as u8), 1_000, 0)]);
            let block = chain.push(vec![tx]);
            coins = block.transactions[0].ux_outs(block.time(), block.seq())[0];
        }
        chain
    }

    fn confirmed(block: &Arc<Block>) -> ChainEvent {
        ChainEvent::BlockConfirmed(block.clone())
    }

    #[test]
    fn test_backoff() {
        let policy = RetryPolicy { max_retries: 10, initial_backoff: Duration::from_millis(100), max_backoff: Duration::from_secs(1) };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_secs(1));
        assert_eq!(policy.backoff(40), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_service_follows_chain_events() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let chain = chain_of(3);
        let (sender, receiver) = async_channel::unbounded();
        let service = Arc::new(HistoryIndexService::new(index.clone(), None, receiver, RetryPolicy::default()));
        let task = tokio::spawn(service.clone().start());

        for block in chain.blocks() {
            sender.send(confirmed(block)).await.unwrap();
        }
        // duplicates are skipped
        sender.send(confirmed(&chain.blocks()[1])).await.unwrap();

        // a reorg replacing the tip with a block paying address 9
        let mut fork = chain.fork_at(1);
        let coins = chain.blocks()[1].transactions[0].ux_outs(chain.blocks()[1].time(), 1)[0];
        let fork_tip = fork.push(vec![spend_tx(&[coins], vec![TransactionOutput::new(test_address(9), 1_000, 0)])]);
        sender.send(ChainEvent::Reorg { fork_height: 1 }).await.unwrap();
        sender.send(confirmed(&fork_tip)).await.unwrap();
        drop(sender);

        task.await.unwrap().unwrap();
        assert!(!service.is_halted());
        assert_eq!(index.parsed_height().unwrap(), 2);
        assert_eq!(index.get_block_by_seq(2).unwrap().unwrap().hash(), fork_tip.hash());
        assert!(index.get_address_txns(&test_address(2)).unwrap().is_empty());
        assert_eq!(index.get_address_txns(&test_address(9)).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_service_catches_up_from_source() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let chain = chain_of(4);
        let (sender, receiver) = async_channel::unbounded();
        let service = Arc::new(HistoryIndexService::new(index.clone(), Some(Arc::new(chain.fork_at(1))), receiver, RetryPolicy::default()));
        let task = tokio::spawn(service.clone().start());

        // the source only holds heights 0 and 1
        sender.send(confirmed(&chain.blocks()[2])).await.unwrap();
        sender.send(confirmed(&chain.blocks()[3])).await.unwrap();
        drop(sender);

        task.await.unwrap().unwrap();
        assert_eq!(index.parsed_height().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_service_halts_on_missing_block() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let chain = chain_of(3);
        let (sender, receiver) = async_channel::unbounded();
        let service = Arc::new(HistoryIndexService::new(index.clone(), None, receiver, RetryPolicy::default()));
        let task = tokio::spawn(service.clone().start());

        sender.send(confirmed(&chain.blocks()[0])).await.unwrap();
        sender.send(confirmed(&chain.blocks()[2])).await.unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, HistoryError::MissingBlock(1)));
        assert!(service.is_halted());
        assert_eq!(index.parsed_height().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_service_halts_on_corruption() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let mut chain = chain_of(1);
        let mut unknown = chain.blocks()[0].transactions[0].ux_outs(chain.blocks()[0].time(), 0)[0];
        unknown.body.coins += 1;
        chain.push(vec![spend_tx(&[unknown], vec![TransactionOutput::new(test_address(5), 1_001, 0)])]);

        let (sender, receiver) = async_channel::unbounded();
        let service = Arc::new(HistoryIndexService::new(index.clone(), None, receiver, RetryPolicy::default()));
        for block in chain.blocks() {
            sender.send(confirmed(block)).await.unwrap();
        }

        assert!(matches!(service.clone().start().await.unwrap_err(), HistoryError::IndexCorruption(_)));
        assert!(service.is_halted());
        assert_eq!(index.parsed_height().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_service_halts_on_fork_without_reorg() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let chain = chain_of(2);
        let (sender, receiver) = async_channel::unbounded();
        let service = Arc::new(HistoryIndexService::new(index.clone(), None, receiver, RetryPolicy::default()));
        let task = tokio::spawn(service.clone().start());

        for block in chain.blocks() {
            sender.send(confirmed(block)).await.unwrap();
        }
        // a competing block at height 1 paying address 9
        let mut fork = chain.fork_at(0);
        let coins = chain.blocks()[0].transactions[0].ux_outs(chain.blocks()[0].time(), 0)[0];
        let competing = fork.push(vec![spend_tx(&[coins], vec![TransactionOutput::new(test_address(9), 1_000, 0)])]);
        assert_ne!(competing.hash(), chain.blocks()[1].hash());
        sender.send(confirmed(&competing)).await.unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, HistoryError::IndexCorruption(_)));
        assert!(service.is_halted());
        assert_eq!(index.parsed_height().unwrap(), 1);
        assert_eq!(index.indexed_hash(1).unwrap(), Some(chain.blocks()[1].hash()));
        assert!(index.get_address_txns(&test_address(9)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_exit_signal() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default().with_files_limit(10));
        let index = HistoryIndex::new(db.clone());
        let (_sender, receiver) = async_channel::unbounded();
        let service = Arc::new(HistoryIndexService::new(index, Some(Arc::new(chain_of(2))), receiver, RetryPolicy::default()));
        let task = tokio::spawn(service.clone().start());
        service.signal_exit();
        task.await.unwrap().unwrap();
        // the initial catch up ran before the exit signal was observed
        assert_eq!(service.index().parsed_height().unwrap(), 1);
    }
}
