pub mod enums;
pub mod error;
pub mod money;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{SortDirection, TransactionStatus, TransactionType, UserStatus};
pub use error::CoreError;
pub use money::{format_currency, round_for_display};
pub use structs::{parse_timestamp, DateWindow, Movie, Transaction, User};
