//! Deposit amount and currency validation.
//!
//! The gateway accepts almost anything; these checks exist so the
//! application rejects bad input before a network round trip.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Validation failures for user-supplied deposit parameters.
#[derive(Debug, thiserror::Error)]
pub enum LimitError {
    #[error("amount must be at least {0}")]
    BelowMinimum(Decimal),
    #[error("amount cannot exceed {0}")]
    AboveMaximum(Decimal),
    #[error("cryptocurrency must be selected")]
    EmptyCurrency,
    #[error("unsupported cryptocurrency: {0}")]
    UnsupportedCurrency(CompactString),
}

/// Configured deposit bounds in the price currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountLimits {
    pub min: Decimal,
    pub max: Decimal,
}

impl AmountLimits {
    /// Check `amount` against the configured bounds.
    pub fn validate(&self, amount: Decimal) -> Result<Decimal, LimitError> {
        if amount < self.min {
            return Err(LimitError::BelowMinimum(self.min));
        }
        if amount > self.max {
            return Err(LimitError::AboveMaximum(self.max));
        }
        Ok(amount)
    }
}

impl Default for AmountLimits {
    fn default() -> Self {
        Self {
            min: Decimal::new(10, 0),
            max: Decimal::new(100_000, 0),
        }
    }
}

/// A single payable cryptocurrency entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDetails {
    /// Display name shown to the user ("Bitcoin").
    pub name: String,
    /// Network label shown next to the address ("BTC mainnet").
    #[serde(default)]
    pub network: Option<String>,
    /// Identifier to send to the gateway when it differs from the key
    /// used for validation (e.g. `usdttrc20` for key `usdt`).
    #[serde(default)]
    pub pay_currency: Option<CompactString>,
}

/// The set of cryptocurrencies this deployment accepts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportedCurrencies {
    entries: Vec<(CompactString, CurrencyDetails)>,
}

impl SupportedCurrencies {
    pub fn new(entries: Vec<(CompactString, CurrencyDetails)>) -> Self {
        Self { entries }
    }

    /// Lower-case and trim a user-supplied code, rejecting anything
    /// that is not configured.
    pub fn normalize(&self, code: &str) -> Result<CompactString, LimitError> {
        let code = code.trim().to_lowercase();
        if code.is_empty() {
            return Err(LimitError::EmptyCurrency);
        }
        let code = CompactString::from(code);
        if self.get(&code).is_none() {
            return Err(LimitError::UnsupportedCurrency(code));
        }
        Ok(code)
    }

    /// Look up a configured currency by its normalized code.
    pub fn get(&self, code: &str) -> Option<&CurrencyDetails> {
        // Small configured set, linear scan beats a map here.
        self.entries
            .iter()
            .find(|(key, _)| key == code)
            .map(|(_, details)| details)
    }

    /// The identifier to hand to the gateway for a normalized code.
    pub fn pay_currency(&self, code: &CompactString) -> CompactString {
        self.get(code)
            .and_then(|details| details.pay_currency.clone())
            .unwrap_or_else(|| code.clone())
    }

    pub fn codes(&self) -> impl Iterator<Item = &CompactString> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
