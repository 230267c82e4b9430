// Currency kind value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EconomyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyKind {
    Coin,
    Diamond,
}

impl CurrencyKind {
    pub const ALL: [CurrencyKind; 2] = [CurrencyKind::Coin, CurrencyKind::Diamond];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyKind::Coin => "coin",
            CurrencyKind::Diamond => "diamond",
        }
    }

    /// Balance every new wallet of this kind starts with.
    pub fn seed_balance(&self) -> i64 {
        match self {
            CurrencyKind::Coin => 1000,
            CurrencyKind::Diamond => 200,
        }
    }

    /// Experience granted for spending `amount` of this currency.
    pub fn experience_for(&self, amount: i64) -> i64 {
        match self {
            CurrencyKind::Coin => amount / 2,
            CurrencyKind::Diamond => amount,
        }
    }
}

impl fmt::Display for CurrencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyKind {
    type Err = EconomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coin" => Ok(CurrencyKind::Coin),
            "diamond" => Ok(CurrencyKind::Diamond),
            other => Err(EconomyError::InvalidInput(format!(
                "unknown currency kind '{}'",
                other
            ))),
        }
    }
}
