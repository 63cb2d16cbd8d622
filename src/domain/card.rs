use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type CardId = Uuid;

/// Government portal a card is earmarked for. Informational only:
/// it drives grouping and display, never balance arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardCategory {
    /// Federal Authority for Identity and Citizenship portal
    Icp,
    /// Ministry of Human Resources and Emiratisation portal
    Mohre,
    /// Dubai residency and foreigners affairs portal
    Gdrfa,
    /// Dubai Economy (licensing) portal
    Ded,
    /// Anything else
    General,
}

impl CardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardCategory::Icp => "icp",
            CardCategory::Mohre => "mohre",
            CardCategory::Gdrfa => "gdrfa",
            CardCategory::Ded => "ded",
            CardCategory::General => "general",
        }
    }
}

impl FromStr for CardCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "icp" => Ok(CardCategory::Icp),
            "mohre" => Ok(CardCategory::Mohre),
            "gdrfa" => Ok(CardCategory::Gdrfa),
            "ded" => Ok(CardCategory::Ded),
            "general" => Ok(CardCategory::General),
            other => Err(format!("unknown card category: {}", other)),
        }
    }
}

impl std::fmt::Display for CardCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// Card accepts deposits, withdrawals and may source transfers
    Active,
    /// Card is parked; it holds balance and may still receive transfers
    Inactive,
    /// Card is blocked pending review; same monetary rules as Inactive
    Suspended,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "active",
            CardStatus::Inactive => "inactive",
            CardStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for CardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(CardStatus::Active),
            "inactive" => Ok(CardStatus::Inactive),
            "suspended" => Ok(CardStatus::Suspended),
            other => Err(format!("unknown card status: {}", other)),
        }
    }
}

impl std::fmt::Display for CardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named prepaid balance used to pay government portal fees.
/// `balance` is the authoritative current value and never goes below zero;
/// only the ledger operations may change it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub category: CardCategory,
    pub status: CardStatus,
    pub balance: Cents,
    /// Marks this card as the default funding source for the fee-payment
    /// feature. A label, not a balance relationship.
    pub linked_to_fees: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(name: String, category: CardCategory, status: CardStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            category,
            status,
            balance: 0,
            linked_to_fees: false,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_balance(mut self, balance: Cents) -> Self {
        assert!(balance >= 0, "Card balance cannot be negative");
        self.balance = balance;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == CardStatus::Active
    }
}
