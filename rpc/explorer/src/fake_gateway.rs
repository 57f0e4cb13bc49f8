//! Scripted [`Gatewayer`] for handler tests

use parking_lot::Mutex;
use visor_addresses::Address;
use visor_consensus_core::{Block, tx::UxOutId};
use visor_hashes::Hash;
use visor_historydb::model::{Richlist, TransactionResult, UxOutRecord};

use crate::{error::GatewayResult, gateway::Gatewayer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetAddressTxns(Address),
    GetUxOutById(UxOutId),
    GetRichlist(bool),
    GetAddressCount,
    GetBlockByHash(Hash),
    GetBlockBySeq(u64),
    GetBlocks(u64, u64),
    HeadSeq,
}

pub enum Return {
    AddressTxns(GatewayResult<Vec<TransactionResult>>),
    UxOut(GatewayResult<Option<UxOutRecord>>),
    Richlist(GatewayResult<Richlist>),
    AddressCount(GatewayResult<u64>),
    Block(GatewayResult<Option<Block>>),
    Blocks(GatewayResult<Vec<Block>>),
    HeadSeq(GatewayResult<Option<u64>>),
}

/// Answers each expected call once with its canned result. Unexpected calls panic.
#[derive(Default)]
pub struct FakeGateway {
    expectations: Mutex<Vec<(Call, Return)>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, call: Call, ret: Return) -> Self {
        self.expectations.lock().push((call, ret));
        self
    }

    fn take(&self, call: Call) -> Return {
        let mut expectations = self.expectations.lock();
        match expectations.iter().position(|(expected, _)| *expected == call) {
            Some(index) => expectations.remove(index).1,
            None => panic!("unexpected gateway call {call:?}"),
        }
    }
}

macro_rules! expect_return {
    ($self:ident, $call:expr, $variant:ident) => {{
        let call = $call;
        match $self.take(call.clone()) {
            Return::$variant(result) => result,
            _ => panic!("mismatched canned result for {call:?}"),
        }
    }};
}

impl Gatewayer for FakeGateway {
    fn get_address_txns(&self, address: &Address) -> GatewayResult<Vec<TransactionResult>> {
        expect_return!(self, Call::GetAddressTxns(*address), AddressTxns)
    }

    fn get_uxout_by_id(&self, id: &UxOutId) -> GatewayResult<Option<UxOutRecord>> {
        expect_return!(self, Call::GetUxOutById(*id), UxOut)
    }

    fn get_richlist(&self, include_distribution: bool) -> GatewayResult<Richlist> {
        expect_return!(self, Call::GetRichlist(include_distribution), Richlist)
    }

    fn get_address_count(&self) -> GatewayResult<u64> {
        expect_return!(self, Call::GetAddressCount, AddressCount)
    }

    fn get_block_by_hash(&self, hash: &Hash) -> GatewayResult<Option<Block>> {
        expect_return!(self, Call::GetBlockByHash(*hash), Block)
    }

    fn get_block_by_seq(&self, seq: u64) -> GatewayResult<Option<Block>> {
        expect_return!(self, Call::GetBlockBySeq(seq), Block)
    }

    fn get_blocks(&self, start: u64, end: u64) -> GatewayResult<Vec<Block>> {
        expect_return!(self, Call::GetBlocks(start, end), Blocks)
    }

    fn head_seq(&self) -> GatewayResult<Option<u64>> {
        expect_return!(self, Call::HeadSeq, HeadSeq)
    }
}
