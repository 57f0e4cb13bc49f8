mod bucket;
mod db;
mod errors;
mod key;
mod writer;

pub mod registry;
pub mod utils;

pub mod prelude {
    use crate::{db, errors};

    pub use super::bucket::Bucket;
    pub use super::key::{DbKey, btoi, itob};
    pub use super::writer::{BatchDbWriter, DbWriter, DirectDbWriter};
    pub use db::{ConnBuilder, DB, DbReader, DbSnapshot, delete_db};
    pub use errors::{StoreError, StoreErrorPredicates, StoreResult};
}
