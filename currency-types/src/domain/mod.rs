//! Pure domain types for the currency service.

mod rate;
mod wallet;

pub use rate::Rate;
pub use wallet::{MutationOutcome, Wallet, WalletNumber};
