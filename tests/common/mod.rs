// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use feecard::application::LedgerService;
use feecard::domain::{Card, CardCategory, CardStatus, Cents};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test fixture: standard card setup
pub struct StandardCards;

impl StandardCards {
    /// Create two active cards: "ICP Main" and "MOHRE Ops", both at zero.
    pub async fn create_basic(service: &LedgerService) -> Result<(Card, Card)> {
        let icp = service
            .create_card(
                "ICP Main".into(),
                CardCategory::Icp,
                CardStatus::Active,
                0,
                None,
            )
            .await?;
        let mohre = service
            .create_card(
                "MOHRE Ops".into(),
                CardCategory::Mohre,
                CardStatus::Active,
                0,
                None,
            )
            .await?;
        Ok((icp, mohre))
    }

    /// Create an active card with the given name and opening balance.
    pub async fn funded(service: &LedgerService, name: &str, balance: Cents) -> Result<Card> {
        Ok(service
            .create_card(
                name.into(),
                CardCategory::General,
                CardStatus::Active,
                balance,
                None,
            )
            .await?)
    }

    /// Create an inactive card holding the given balance.
    pub async fn parked(service: &LedgerService, name: &str, balance: Cents) -> Result<Card> {
        Ok(service
            .create_card(
                name.into(),
                CardCategory::General,
                CardStatus::Inactive,
                balance,
                None,
            )
            .await?)
    }
}

/// Sum of all card balances, for conservation checks.
pub async fn total_balance(service: &LedgerService) -> Result<Cents> {
    Ok(service.list_cards().await?.iter().map(|c| c.balance).sum())
}
