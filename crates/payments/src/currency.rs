use core::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize};

use paylane_core::{DomainError, ValueObject};

/// Supported settlement currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usdt,
    Usdc,
    Btc,
    Eth,
    Cad,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Usdt,
        Currency::Usdc,
        Currency::Btc,
        Currency::Eth,
        Currency::Cad,
        Currency::Inr,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usdt => "USDT",
            Currency::Usdc => "USDC",
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Cad => "CAD",
            Currency::Inr => "INR",
        }
    }

    pub fn is_fiat(self) -> bool {
        matches!(self, Currency::Cad | Currency::Inr)
    }

    /// How long a payment request in this currency stays payable.
    ///
    /// Fiat quotes are short-lived (1h); crypto quotes last a day.
    pub fn request_ttl(self) -> Duration {
        if self.is_fiat() {
            Duration::hours(1)
        } else {
            Duration::hours(24)
        }
    }
}

impl ValueObject for Currency {}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| DomainError::invalid_input(format!("unsupported currency '{code}'")))
    }
}

// Case-insensitive so config sources that fold key case still resolve.
impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
