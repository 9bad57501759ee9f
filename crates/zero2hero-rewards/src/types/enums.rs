/*
[INPUT]:  Data layer schema and gateway lifecycle
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Domain types - tags stored in SQLite and gateway status
[UPDATE]: When new transaction kinds or gateway states are added
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of a ledger transaction. Earned kinds add to the balance, `Redeemed` subtracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    EarnedReport,
    EarnedCollect,
    Redeemed,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::EarnedReport => "earned_report",
            TransactionKind::EarnedCollect => "earned_collect",
            TransactionKind::Redeemed => "redeemed",
        }
    }

    pub fn is_earned(&self) -> bool {
        !matches!(self, TransactionKind::Redeemed)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "earned_report" => Ok(TransactionKind::EarnedReport),
            "earned_collect" => Ok(TransactionKind::EarnedCollect),
            "redeemed" => Ok(TransactionKind::Redeemed),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

/// Lifecycle of the auth gateway.
///
/// Transitions:
/// - Uninitialized -> Initializing (startup)
/// - Initializing -> Ready | Failed
/// - Failed -> Initializing (explicit retry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl AuthStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, AuthStatus::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_kind_parses_stored_tags() {
        for kind in [
            TransactionKind::EarnedReport,
            TransactionKind::EarnedCollect,
            TransactionKind::Redeemed,
        ] {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!("earned".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn only_redeemed_is_a_debit() {
        assert!(TransactionKind::EarnedReport.is_earned());
        assert!(TransactionKind::EarnedCollect.is_earned());
        assert!(!TransactionKind::Redeemed.is_earned());
    }
}
