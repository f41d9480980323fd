//! Wallet identity, state, and mutation outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Validated wallet identifier: exactly 7 ASCII decimal digits.
///
/// Construction is only possible through [`WalletNumber::parse`], so every
/// value of this type is known to be well-formed. The identifier is the
/// wallet's primary key and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WalletNumber(String);

impl WalletNumber {
    /// Parses a raw string into a wallet number.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.len() == 7 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(DomainError::InvalidWalletNumber {
                got: raw.to_owned(),
            })
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wallet number, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for WalletNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A wallet row: balance plus bookkeeping timestamps.
///
/// Invariant: `balance >= 0` at all times, enforced by the mutation engine
/// under a row lock and backed by a CHECK constraint in storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub number: WalletNumber,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Classified result of a balance mutation attempt.
///
/// The HTTP boundary switches on the variant tag to pick a status code;
/// every variant carries the wallet number and the balance the caller
/// should see (for `InsufficientFunds`, the *unchanged* current balance).
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Created { number: WalletNumber, balance: f64 },
    Deposited { number: WalletNumber, balance: f64 },
    Withdrawn { number: WalletNumber, balance: f64 },
    InsufficientFunds { number: WalletNumber, balance: f64 },
}

impl MutationOutcome {
    /// The wallet the outcome refers to.
    pub fn number(&self) -> &WalletNumber {
        match self {
            MutationOutcome::Created { number, .. }
            | MutationOutcome::Deposited { number, .. }
            | MutationOutcome::Withdrawn { number, .. }
            | MutationOutcome::InsufficientFunds { number, .. } => number,
        }
    }

    /// The balance to report: the new balance on success, the unchanged
    /// current balance on an insufficient-funds rejection.
    pub fn balance(&self) -> f64 {
        match self {
            MutationOutcome::Created { balance, .. }
            | MutationOutcome::Deposited { balance, .. }
            | MutationOutcome::Withdrawn { balance, .. }
            | MutationOutcome::InsufficientFunds { balance, .. } => *balance,
        }
    }
}
