//! Read-side requests: receipt and record polling, plain queries.

mod balance;
mod receipt;
mod record;

pub use balance::AccountBalanceQuery;
pub use receipt::TransactionReceiptQuery;
pub use record::TransactionRecordQuery;
