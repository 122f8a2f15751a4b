//! Security and exchange identifiers.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Permanent security identifier (integral, as in the source panel).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
pub struct SecurityId(pub i64);

impl SecurityId {
    /// Create a new security ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Listing exchange code.
///
/// Negative codes mark halted or suspended listings in the source data.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
pub struct ExchangeCode(pub i64);

impl ExchangeCode {
    /// New York Stock Exchange.
    pub const NYSE: Self = Self(1);
    /// American Stock Exchange.
    pub const AMEX: Self = Self(2);
    /// Nasdaq.
    pub const NASDAQ: Self = Self(3);

    /// Create a new exchange code.
    #[must_use]
    pub const fn new(code: i64) -> Self {
        Self(code)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}
