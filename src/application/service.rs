use anyhow::anyhow;

use crate::domain::{Card, CardCategory, CardId, CardStatus, Cents, Transaction};
use crate::storage::Repository;

use super::{CardLocks, LedgerError};

/// Application service providing the ledger operations over the card
/// registry. This is the only path by which balances change, and the
/// primary interface for any client (CLI, API, UI, ...).
pub struct LedgerService {
    repo: Repository,
    locks: CardLocks,
}

/// Result of a deposit or withdrawal: the card with its authoritative
/// post-operation balance, plus the record that was appended.
#[derive(Debug)]
pub struct MutationResult {
    pub card: Card,
    pub transaction: Transaction,
}

/// Result of a transfer: both cards with post-operation balances and the
/// two legs that were appended together.
#[derive(Debug)]
pub struct TransferResult {
    pub source: Card,
    pub dest: Card,
    pub outgoing: Transaction,
    pub incoming: Transaction,
}

/// Metadata fields that may be edited on a card. `None` leaves the field
/// unchanged; the balance is not part of this set by design.
#[derive(Default)]
pub struct CardUpdate {
    pub name: Option<String>,
    pub category: Option<CardCategory>,
    pub status: Option<CardStatus>,
    pub notes: Option<String>,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            locks: CardLocks::new(),
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Card registry
    // ========================

    /// Create a new card. The balance starts at `initial_balance`, which is
    /// the only moment a balance is set outside a ledger operation.
    pub async fn create_card(
        &self,
        name: String,
        category: CardCategory,
        status: CardStatus,
        initial_balance: Cents,
        notes: Option<String>,
    ) -> Result<Card, LedgerError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::Validation("card name cannot be empty".into()));
        }
        if initial_balance < 0 {
            return Err(LedgerError::Validation(
                "initial balance cannot be negative".into(),
            ));
        }
        if self.repo.get_card_by_name(&name).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "a card named '{}' already exists",
                name
            )));
        }

        let mut card = Card::new(name, category, status).with_balance(initial_balance);
        if let Some(notes) = notes {
            card = card.with_notes(notes);
        }

        self.repo.save_card(&card).await?;
        Ok(card)
    }

    /// Get a card by ID.
    pub async fn get_card(&self, card_id: CardId) -> Result<Card, LedgerError> {
        self.repo
            .get_card(card_id)
            .await?
            .ok_or_else(|| LedgerError::CardNotFound(card_id.to_string()))
    }

    /// Get a card by name. A convenience for callers (the CLI) that address
    /// cards by their display label.
    pub async fn find_card_by_name(&self, name: &str) -> Result<Card, LedgerError> {
        self.repo
            .get_card_by_name(name)
            .await?
            .ok_or_else(|| LedgerError::CardNotFound(name.to_string()))
    }

    /// List all cards in creation order.
    pub async fn list_cards(&self) -> Result<Vec<Card>, LedgerError> {
        Ok(self.repo.list_cards().await?)
    }

    /// Update a card's display metadata. Never touches the balance.
    pub async fn update_card_metadata(
        &self,
        card_id: CardId,
        update: CardUpdate,
    ) -> Result<Card, LedgerError> {
        let mut card = self.get_card(card_id).await?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(LedgerError::Validation("card name cannot be empty".into()));
            }
            if name != card.name && self.repo.get_card_by_name(&name).await?.is_some() {
                return Err(LedgerError::Validation(format!(
                    "a card named '{}' already exists",
                    name
                )));
            }
            card.name = name;
        }
        if let Some(category) = update.category {
            card.category = category;
        }
        if let Some(status) = update.status {
            card.status = status;
        }
        if let Some(notes) = update.notes {
            card.notes = Some(notes);
        }

        self.repo.update_card_metadata(&card).await?;
        Ok(card)
    }

    /// Set the fee-module link flag. Idempotent; no monetary effect and no
    /// transaction record.
    pub async fn set_linked(&self, card_id: CardId, linked: bool) -> Result<Card, LedgerError> {
        let mut card = self.get_card(card_id).await?;
        if card.linked_to_fees == linked {
            return Ok(card);
        }

        self.repo.set_linked(card_id, linked).await?;
        card.linked_to_fees = linked;
        Ok(card)
    }

    // ========================
    // Ledger operations
    // ========================

    /// Deposit funds onto an active card.
    pub async fn deposit(
        &self,
        card_id: CardId,
        amount: Cents,
        description: Option<String>,
    ) -> Result<MutationResult, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let _guard = self.locks.lock_card(card_id).await?;

        let mut card = self.get_card(card_id).await?;
        if !card.is_active() {
            return Err(LedgerError::CardNotActive {
                name: card.name,
                status: card.status,
            });
        }

        let description = description.unwrap_or_else(|| "Deposit".to_string());
        let transaction = self
            .repo
            .record_deposit(card_id, amount, Some(description))
            .await?
            .ok_or_else(|| LedgerError::Storage(anyhow!("deposit rejected by balance guard")))?;

        card.balance = transaction.balance_after;
        Ok(MutationResult { card, transaction })
    }

    /// Withdraw funds from an active card. The balance check happens against
    /// the balance read under this card's lock, and the storage layer guards
    /// it again inside the same unit of work.
    pub async fn withdraw(
        &self,
        card_id: CardId,
        amount: Cents,
        description: Option<String>,
    ) -> Result<MutationResult, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let _guard = self.locks.lock_card(card_id).await?;

        let mut card = self.get_card(card_id).await?;
        if !card.is_active() {
            return Err(LedgerError::CardNotActive {
                name: card.name,
                status: card.status,
            });
        }
        if amount > card.balance {
            return Err(LedgerError::InsufficientBalance {
                name: card.name,
                balance: card.balance,
                requested: amount,
            });
        }

        let description = description.unwrap_or_else(|| "Withdrawal".to_string());
        let transaction = self
            .repo
            .record_withdrawal(card_id, amount, Some(description))
            .await?
            .ok_or(LedgerError::InsufficientBalance {
                name: card.name.clone(),
                balance: card.balance,
                requested: amount,
            })?;

        card.balance = transaction.balance_after;
        Ok(MutationResult { card, transaction })
    }

    /// Move funds between two distinct cards as one atomic unit: both
    /// balance updates and both transaction legs, or nothing.
    ///
    /// The source must be active; the destination need not be. Pre-funding
    /// an inactive card before activation is allowed by policy.
    pub async fn transfer(
        &self,
        source_id: CardId,
        dest_id: CardId,
        amount: Cents,
        description: Option<String>,
    ) -> Result<TransferResult, LedgerError> {
        if source_id == dest_id {
            return Err(LedgerError::SameCard);
        }
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let _guard = self.locks.lock_pair(source_id, dest_id).await?;

        let mut source = self.get_card(source_id).await?;
        let mut dest = self.get_card(dest_id).await?;
        if !source.is_active() {
            return Err(LedgerError::CardNotActive {
                name: source.name,
                status: source.status,
            });
        }
        if amount > source.balance {
            return Err(LedgerError::InsufficientBalance {
                name: source.name,
                balance: source.balance,
                requested: amount,
            });
        }

        let outgoing_description = description
            .clone()
            .unwrap_or_else(|| format!("Transfer to {}", dest.name));
        let incoming_description =
            description.unwrap_or_else(|| format!("Transfer from {}", source.name));

        let (outgoing, incoming) = self
            .repo
            .record_transfer(
                source_id,
                dest_id,
                amount,
                Some(outgoing_description),
                Some(incoming_description),
            )
            .await?
            .ok_or(LedgerError::InsufficientBalance {
                name: source.name.clone(),
                balance: source.balance,
                requested: amount,
            })?;

        source.balance = outgoing.balance_after;
        dest.balance = incoming.balance_after;
        Ok(TransferResult {
            source,
            dest,
            outgoing,
            incoming,
        })
    }

    /// List a card's transactions, newest first. Read-only.
    pub async fn list_transactions(&self, card_id: CardId) -> Result<Vec<Transaction>, LedgerError> {
        // Existence check so an unknown card is an error, not an empty list.
        self.get_card(card_id).await?;
        Ok(self.repo.list_transactions_for_card(card_id).await?)
    }
}
