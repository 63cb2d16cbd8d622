use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CardId, Cents};

pub type TransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::TransferOut => "transfer_out",
            TransactionKind::TransferIn => "transfer_in",
        }
    }

    /// Returns true if this kind increases the card balance.
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionKind::Deposit | TransactionKind::TransferIn)
    }

    /// Returns true if this kind is one leg of a transfer and therefore
    /// carries a counterpart card reference.
    pub fn is_transfer_leg(&self) -> bool {
        matches!(
            self,
            TransactionKind::TransferOut | TransactionKind::TransferIn
        )
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            "transfer_out" => Ok(TransactionKind::TransferOut),
            "transfer_in" => Ok(TransactionKind::TransferIn),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable record per balance-affecting event. Transactions are never
/// edited or deleted; corrections are new, compensating operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Monotonically increasing insertion order, assigned by the repository.
    /// Breaks `created_at` ties.
    pub sequence: i64,
    pub card_id: CardId,
    pub kind: TransactionKind,
    /// Magnitude of the movement in cents, always positive, never signed.
    pub amount: Cents,
    pub description: Option<String>,
    /// The card's balance immediately after this transaction. A snapshot,
    /// never recomputed later.
    pub balance_after: Cents,
    /// The other leg's card, present only for transfer legs.
    pub counterpart_card_id: Option<CardId>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction record. Sequence is assigned by the repository.
    pub fn new(card_id: CardId, kind: TransactionKind, amount: Cents, balance_after: Cents) -> Self {
        assert!(amount > 0, "Transaction amount must be positive");
        assert!(
            balance_after >= 0,
            "Transaction cannot leave a negative balance"
        );
        Self {
            id: Uuid::new_v4(),
            sequence: 0, // Will be set by repository
            card_id,
            kind,
            amount,
            description: None,
            balance_after,
            counterpart_card_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_counterpart(mut self, counterpart: CardId) -> Self {
        assert!(
            self.kind.is_transfer_leg(),
            "Only transfer legs carry a counterpart card"
        );
        self.counterpart_card_id = Some(counterpart);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_deposit_record() {
        let card = Uuid::new_v4();
        let tx = Transaction::new(card, TransactionKind::Deposit, 5000, 5000)
            .with_description("Top up");

        assert_eq!(tx.card_id, card);
        assert_eq!(tx.amount, 5000);
        assert_eq!(tx.balance_after, 5000);
        assert_eq!(tx.description, Some("Top up".to_string()));
        assert!(tx.counterpart_card_id.is_none());
    }

    #[test]
    fn test_transfer_leg_carries_counterpart() {
        let source = Uuid::new_v4();
        let dest = Uuid::new_v4();
        let leg =
            Transaction::new(source, TransactionKind::TransferOut, 2000, 3000).with_counterpart(dest);

        assert_eq!(leg.counterpart_card_id, Some(dest));
        assert!(leg.kind.is_transfer_leg());
    }

    #[test]
    #[should_panic(expected = "Transaction amount must be positive")]
    fn test_transaction_requires_positive_amount() {
        Transaction::new(Uuid::new_v4(), TransactionKind::Deposit, 0, 0);
    }

    #[test]
    #[should_panic(expected = "Only transfer legs carry a counterpart card")]
    fn test_counterpart_rejected_on_plain_deposit() {
        Transaction::new(Uuid::new_v4(), TransactionKind::Deposit, 100, 100)
            .with_counterpart(Uuid::new_v4());
    }

    #[test]
    fn test_kind_credit_direction() {
        assert!(TransactionKind::Deposit.is_credit());
        assert!(TransactionKind::TransferIn.is_credit());
        assert!(!TransactionKind::Withdrawal.is_credit());
        assert!(!TransactionKind::TransferOut.is_credit());
    }
}
