use std::sync::Arc;

use crate::{header::Header, tx::Transaction};
use serde::{Deserialize, Serialize};
use visor_hashes::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Arc<Vec<Transaction>>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions: Arc::new(transactions) }
    }

    pub fn from_header(header: Header) -> Self {
        Self { header, transactions: Arc::new(Vec::new()) }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn seq(&self) -> u64 {
        self.header.seq
    }

    pub fn time(&self) -> u64 {
        self.header.time
    }
}
