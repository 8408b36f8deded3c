pub mod ledger_service;
pub mod storage;

pub use ledger_service::{Ledger, Removal, Totals};
pub use storage::{FileBackend, LedgerBackend, MemoryBackend, StoreError};
