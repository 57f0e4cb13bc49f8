//! Names of every bucket persisted by visor components

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseStoreBuckets {
    // ---- History ----
    HistoryMeta,
    UxOuts,
    Transactions,
    AddressTransactions,
    AddressUxOuts,
    Blocks,
    BlockHashBySeq,
}

impl DatabaseStoreBuckets {
    pub const HISTORY: [DatabaseStoreBuckets; 7] = [
        Self::HistoryMeta,
        Self::UxOuts,
        Self::Transactions,
        Self::AddressTransactions,
        Self::AddressUxOuts,
        Self::Blocks,
        Self::BlockHashBySeq,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::HistoryMeta => "history_meta",
            Self::UxOuts => "uxouts",
            Self::Transactions => "txns",
            Self::AddressTransactions => "address_txns",
            Self::AddressUxOuts => "address_in",
            Self::Blocks => "blocks",
            Self::BlockHashBySeq => "block_seqs",
        }
    }
}

impl AsRef<[u8]> for DatabaseStoreBuckets {
    fn as_ref(&self) -> &[u8] {
        self.name().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bucket_names_are_unique() {
        let names = DatabaseStoreBuckets::HISTORY.iter().map(|x| x.name()).collect::<HashSet<_>>();
        assert_eq!(names.len(), DatabaseStoreBuckets::HISTORY.len());
    }
}
