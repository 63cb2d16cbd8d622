use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction as SqlTransaction};
use uuid::Uuid;

use crate::domain::{
    Card, CardCategory, CardId, CardStatus, Cents, Transaction, TransactionKind,
};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying cards and their transaction log.
///
/// Balance-affecting operations run as single SQLite transactions: the
/// balance update and the transaction record(s) commit together or not at
/// all. The balance update itself is guarded in SQL, so a result below zero
/// is rejected by the database no matter what the caller read beforehand.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Card registry
    // ========================

    /// Save a new card to the database.
    pub async fn save_card(&self, card: &Card) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cards (id, name, category, status, balance, linked_to_fees, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(card.id.to_string())
        .bind(&card.name)
        .bind(card.category.as_str())
        .bind(card.status.as_str())
        .bind(card.balance)
        .bind(card.linked_to_fees)
        .bind(&card.notes)
        .bind(card.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save card")?;
        Ok(())
    }

    /// Get a card by ID.
    pub async fn get_card(&self, id: CardId) -> Result<Option<Card>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, category, status, balance, linked_to_fees, notes, created_at
            FROM cards
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch card")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_card(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a card by name.
    pub async fn get_card_by_name(&self, name: &str) -> Result<Option<Card>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, category, status, balance, linked_to_fees, notes, created_at
            FROM cards
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch card by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_card(&row)?)),
            None => Ok(None),
        }
    }

    /// List all cards in creation order (stable).
    pub async fn list_cards(&self) -> Result<Vec<Card>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category, status, balance, linked_to_fees, notes, created_at
            FROM cards
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list cards")?;

        rows.iter().map(Self::row_to_card).collect()
    }

    /// Update a card's display metadata. The balance column is deliberately
    /// not touched here; only the ledger operations may change it.
    pub async fn update_card_metadata(&self, card: &Card) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE cards
            SET name = ?, category = ?, status = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(&card.name)
        .bind(card.category.as_str())
        .bind(card.status.as_str())
        .bind(&card.notes)
        .bind(card.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update card metadata")?;
        Ok(())
    }

    /// Set the fee-module link flag on a card.
    pub async fn set_linked(&self, id: CardId, linked: bool) -> Result<()> {
        sqlx::query("UPDATE cards SET linked_to_fees = ? WHERE id = ?")
            .bind(linked)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to set card link flag")?;
        Ok(())
    }

    fn row_to_card(row: &sqlx::sqlite::SqliteRow) -> Result<Card> {
        let id_str: String = row.get("id");
        let category_str: String = row.get("category");
        let status_str: String = row.get("status");
        let created_at_str: String = row.get("created_at");

        Ok(Card {
            id: Uuid::parse_str(&id_str).context("Invalid card ID")?,
            name: row.get("name"),
            category: category_str
                .parse::<CardCategory>()
                .map_err(anyhow::Error::msg)?,
            status: status_str
                .parse::<CardStatus>()
                .map_err(anyhow::Error::msg)?,
            balance: row.get("balance"),
            linked_to_fees: row.get::<i32, _>("linked_to_fees") != 0,
            notes: row.get("notes"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Ledger operations
    // ========================

    /// Record a deposit: credit the card and append one Deposit record, as a
    /// single unit of work. Returns the new record, or `None` if the balance
    /// guard rejected the update.
    pub async fn record_deposit(
        &self,
        card_id: CardId,
        amount: Cents,
        description: Option<String>,
    ) -> Result<Option<Transaction>> {
        let mut tx = self.pool.begin().await.context("Failed to begin deposit")?;

        let entry = self
            .append_entry(
                &mut tx,
                card_id,
                TransactionKind::Deposit,
                amount,
                description,
                None,
            )
            .await?;

        match entry {
            Some(entry) => {
                tx.commit().await.context("Failed to commit deposit")?;
                Ok(Some(entry))
            }
            None => {
                tx.rollback().await.context("Failed to roll back deposit")?;
                Ok(None)
            }
        }
    }

    /// Record a withdrawal: debit the card and append one Withdrawal record,
    /// as a single unit of work. Returns `None` if the guarded update would
    /// leave the balance negative.
    pub async fn record_withdrawal(
        &self,
        card_id: CardId,
        amount: Cents,
        description: Option<String>,
    ) -> Result<Option<Transaction>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin withdrawal")?;

        let entry = self
            .append_entry(
                &mut tx,
                card_id,
                TransactionKind::Withdrawal,
                amount,
                description,
                None,
            )
            .await?;

        match entry {
            Some(entry) => {
                tx.commit().await.context("Failed to commit withdrawal")?;
                Ok(Some(entry))
            }
            None => {
                tx.rollback()
                    .await
                    .context("Failed to roll back withdrawal")?;
                Ok(None)
            }
        }
    }

    /// Record a transfer: debit the source, credit the destination and append
    /// the two cross-referencing legs. Both balance updates and both records
    /// commit together or not at all; a rejected source debit rolls the whole
    /// unit back and returns `None`.
    pub async fn record_transfer(
        &self,
        source_id: CardId,
        dest_id: CardId,
        amount: Cents,
        source_description: Option<String>,
        dest_description: Option<String>,
    ) -> Result<Option<(Transaction, Transaction)>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transfer")?;

        let outgoing = self
            .append_entry(
                &mut tx,
                source_id,
                TransactionKind::TransferOut,
                amount,
                source_description,
                Some(dest_id),
            )
            .await?;

        let Some(outgoing) = outgoing else {
            tx.rollback().await.context("Failed to roll back transfer")?;
            return Ok(None);
        };

        let incoming = self
            .append_entry(
                &mut tx,
                dest_id,
                TransactionKind::TransferIn,
                amount,
                dest_description,
                Some(source_id),
            )
            .await?
            .context("Transfer credit leg rejected")?;

        tx.commit().await.context("Failed to commit transfer")?;
        Ok(Some((outgoing, incoming)))
    }

    /// List a card's transactions, newest first. The `sequence` column is
    /// assigned at insert, so descending sequence is descending creation
    /// time with ties broken by insertion order.
    pub async fn list_transactions_for_card(&self, card_id: CardId) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sequence, card_id, kind, amount, description, balance_after, counterpart_card_id, created_at
            FROM transactions
            WHERE card_id = ?
            ORDER BY sequence DESC
            "#,
        )
        .bind(card_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Apply a signed delta to a card's balance, rejecting any result below
    /// zero. Runs inside the caller's SQL transaction; returns the new
    /// balance, or `None` if the guard rejected the update.
    async fn apply_balance_delta(
        tx: &mut SqlTransaction<'_, Sqlite>,
        card_id: CardId,
        delta: Cents,
    ) -> Result<Option<Cents>> {
        let row = sqlx::query(
            r#"
            UPDATE cards
            SET balance = balance + ?1
            WHERE id = ?2 AND balance + ?1 >= 0
            RETURNING balance
            "#,
        )
        .bind(delta)
        .bind(card_id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .context("Failed to apply balance delta")?;

        Ok(row.map(|r| r.get("balance")))
    }

    /// Apply one balance movement and append its transaction record inside
    /// an open SQL transaction.
    async fn append_entry(
        &self,
        tx: &mut SqlTransaction<'_, Sqlite>,
        card_id: CardId,
        kind: TransactionKind,
        amount: Cents,
        description: Option<String>,
        counterpart: Option<CardId>,
    ) -> Result<Option<Transaction>> {
        let delta = if kind.is_credit() { amount } else { -amount };

        let Some(balance_after) = Self::apply_balance_delta(tx, card_id, delta).await? else {
            return Ok(None);
        };

        let mut entry = Transaction::new(card_id, kind, amount, balance_after);
        entry.sequence = Self::next_sequence(tx).await?;
        if let Some(description) = description {
            entry = entry.with_description(description);
        }
        if let Some(counterpart) = counterpart {
            entry = entry.with_counterpart(counterpart);
        }

        sqlx::query(
            r#"
            INSERT INTO transactions (id, sequence, card_id, kind, amount, description, balance_after, counterpart_card_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.sequence)
        .bind(entry.card_id.to_string())
        .bind(entry.kind.as_str())
        .bind(entry.amount)
        .bind(&entry.description)
        .bind(entry.balance_after)
        .bind(entry.counterpart_card_id.map(|id| id.to_string()))
        .bind(entry.created_at.to_rfc3339())
        .execute(&mut **tx)
        .await
        .context("Failed to save transaction")?;

        Ok(Some(entry))
    }

    /// Get the next sequence number and increment the counter.
    async fn next_sequence(tx: &mut SqlTransaction<'_, Sqlite>) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'transaction_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(&mut **tx)
        .await
        .context("Failed to get next sequence number")?;

        Ok(row.get("value"))
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let card_id_str: String = row.get("card_id");
        let kind_str: String = row.get("kind");
        let counterpart_str: Option<String> = row.get("counterpart_card_id");
        let created_at_str: String = row.get("created_at");

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            sequence: row.get("sequence"),
            card_id: Uuid::parse_str(&card_id_str).context("Invalid card ID")?,
            kind: kind_str
                .parse::<TransactionKind>()
                .map_err(anyhow::Error::msg)?,
            amount: row.get("amount"),
            description: row.get("description"),
            balance_after: row.get("balance_after"),
            counterpart_card_id: counterpart_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid counterpart card ID")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
