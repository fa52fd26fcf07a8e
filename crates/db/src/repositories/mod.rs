//! Repository implementations of the core storage ports.

pub mod account;
pub mod history;
pub mod ledger;
pub mod member;
pub mod savings;

pub use account::{AccountRepository, AccountTxn};
pub use history::HistoryRepository;
pub use ledger::{LedgerRepository, PostingTxn};
pub use member::MemberRepository;
pub use savings::SavingsBatchRepository;
