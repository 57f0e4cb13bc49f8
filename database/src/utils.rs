use std::sync::Weak;
use tempfile::TempDir;

use crate::prelude::DB;

/// Keeps a temporary DB directory alive for as long as the DB handle is in use.
/// On drop, asserts that no strong reference to the DB remains before the
/// directory is removed.
#[derive(Default)]
pub struct DbLifetime {
    weak_db_ref: Weak<DB>,
    optional_tempdir: Option<TempDir>,
}

impl DbLifetime {
    pub fn new(tempdir: TempDir, weak_db_ref: Weak<DB>) -> Self {
        Self { optional_tempdir: Some(tempdir), weak_db_ref }
    }

    /// Tracks the DB reference and makes sure all strong refs are cleaned up
    /// but does not remove the DB from disk when dropped.
    pub fn without_destroy(weak_db_ref: Weak<DB>) -> Self {
        Self { optional_tempdir: None, weak_db_ref }
    }
}

impl Drop for DbLifetime {
    fn drop(&mut self) {
        for _ in 0..16 {
            if self.weak_db_ref.strong_count() > 0 {
                // Sometimes another thread is shuting-down and cleaning resources
                std::thread::sleep(std::time::Duration::from_millis(1000));
            } else {
                break;
            }
        }
        assert_eq!(self.weak_db_ref.strong_count(), 0, "DB is expected to have no strong references when lifetime is dropped");
        if let Some(dir) = self.optional_tempdir.take() {
            let options = rocksdb::Options::default();
            let path_buf = dir.path().to_owned();
            if let Err(err) = <rocksdb::DBWithThreadMode<rocksdb::MultiThreaded>>::destroy(&options, &path_buf) {
                visor_core::warn!("failed destroying temp db at {}: {}", path_buf.display(), err);
            }
        }
    }
}

pub fn get_visor_tempdir() -> TempDir {
    let global_tempdir = std::env::temp_dir();
    let visor_tempdir = global_tempdir.join("visor-rust");
    std::fs::create_dir_all(visor_tempdir.as_path()).unwrap();
    tempfile::tempdir_in(visor_tempdir.as_path()).unwrap()
}

/// Creates a DB within a temp directory under `<OS SPECIFIC TEMP DIR>/visor-rust`
/// Callers must keep the `TempDbLifetime` guard for as long as they wish the DB to exist.
#[macro_export]
macro_rules! create_temp_db {
    ($conn_builder: expr) => {{
        let db_tempdir = $crate::utils::get_visor_tempdir();
        let db_path = db_tempdir.path().to_owned();
        let db = $conn_builder.with_db_path(db_path).build().unwrap();
        ($crate::utils::DbLifetime::new(db_tempdir, std::sync::Arc::downgrade(&db)), db)
    }};
}

/// Opens a DB at a permanent location, returning a lifetime which does not destroy
/// it on drop. Used by tests that reopen the same directory.
#[macro_export]
macro_rules! create_permanent_db {
    ($db_path: expr, $conn_builder: expr) => {{
        let db_dir = std::path::PathBuf::from($db_path);
        if let Err(e) = std::fs::create_dir_all(db_dir.as_path()) {
            match e.kind() {
                std::io::ErrorKind::AlreadyExists => {}
                _ => panic!("{e}"),
            }
        }
        let db = $conn_builder.with_db_path(db_dir).build().unwrap();
        ($crate::utils::DbLifetime::without_destroy(std::sync::Arc::downgrade(&db)), db)
    }};
}
