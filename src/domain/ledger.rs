use super::{Cents, Transaction};

/// Signed effect of a transaction on its card's balance.
pub fn signed_amount(transaction: &Transaction) -> Cents {
    if transaction.kind.is_credit() {
        transaction.amount
    } else {
        -transaction.amount
    }
}

/// Replay a card's history in creation order against its opening balance.
/// For a consistent ledger this reproduces the stored balance exactly, and
/// every intermediate value matches that transaction's `balance_after`.
pub fn replay_balance(opening_balance: Cents, history: &[Transaction]) -> Cents {
    history
        .iter()
        .fold(opening_balance, |balance, tx| balance + signed_amount(tx))
}

/// Check every `balance_after` snapshot against a replay of the history
/// (creation order). Returns the sequence numbers of mismatching records.
pub fn snapshot_mismatches(opening_balance: Cents, history: &[Transaction]) -> Vec<i64> {
    let mut balance = opening_balance;
    let mut mismatches = Vec::new();

    for tx in history {
        balance += signed_amount(tx);
        if tx.balance_after != balance {
            mismatches.push(tx.sequence);
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::TransactionKind;

    fn record(kind: TransactionKind, amount: Cents, balance_after: Cents) -> Transaction {
        Transaction::new(Uuid::new_v4(), kind, amount, balance_after)
    }

    #[test]
    fn test_replay_empty_history() {
        assert_eq!(replay_balance(0, &[]), 0);
        assert_eq!(replay_balance(2500, &[]), 2500);
    }

    #[test]
    fn test_replay_mixed_history() {
        let history = vec![
            record(TransactionKind::Deposit, 50000, 50000),
            record(TransactionKind::Withdrawal, 12000, 38000),
            record(TransactionKind::TransferOut, 20000, 18000),
            record(TransactionKind::TransferIn, 5000, 23000),
        ];

        assert_eq!(replay_balance(0, &history), 23000);
    }

    #[test]
    fn test_snapshot_mismatches_clean() {
        let history = vec![
            record(TransactionKind::Deposit, 10000, 10000),
            record(TransactionKind::Withdrawal, 4000, 6000),
        ];

        assert!(snapshot_mismatches(0, &history).is_empty());
    }

    #[test]
    fn test_snapshot_mismatches_flags_bad_record() {
        let mut bad = record(TransactionKind::Deposit, 10000, 9999);
        bad.sequence = 7;

        assert_eq!(snapshot_mismatches(0, &[bad]), vec![7]);
    }
}
