use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{CardUpdate, LedgerService};
use crate::domain::{format_cents, parse_cents, Card, CardCategory, CardStatus, Transaction};

/// Feecard - Prepaid Government-Fee Card Ledger
#[derive(Parser)]
#[command(name = "feecard")]
#[command(about = "A prepaid card ledger for government portal fees")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "feecard.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Card management commands
    #[command(subcommand)]
    Card(CardCommands),

    /// Deposit funds onto a card
    Deposit {
        /// Amount to deposit (e.g., "500.00" or "500")
        amount: String,

        /// Card name
        #[arg(long)]
        card: String,

        /// Description of the deposit
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Withdraw funds from a card
    Withdraw {
        /// Amount to withdraw (e.g., "50.00" or "50")
        amount: String,

        /// Card name
        #[arg(long)]
        card: String,

        /// Description of the withdrawal
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Move funds between two cards
    Transfer {
        /// Amount to transfer (e.g., "200.00" or "200")
        amount: String,

        /// Source card name
        #[arg(long)]
        from: String,

        /// Destination card name
        #[arg(long)]
        to: String,

        /// Description of the transfer
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show a card's transaction history, newest first
    History {
        /// Card name
        card: String,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum CardCommands {
    /// Create a new card
    Create {
        /// Card name (must be unique)
        name: String,

        /// Portal category: icp, mohre, gdrfa, ded, general
        #[arg(short, long, default_value = "general")]
        category: String,

        /// Initial status: active, inactive, suspended
        #[arg(short, long, default_value = "active")]
        status: String,

        /// Opening balance (e.g., "100.00", defaults to 0)
        #[arg(short, long)]
        balance: Option<String>,

        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List all cards
    List {
        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show detailed card information
    Show {
        /// Card name
        name: String,

        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Update a card's display metadata (never its balance)
    Update {
        /// Card name
        name: String,

        /// New name
        #[arg(long)]
        rename: Option<String>,

        /// New category: icp, mohre, gdrfa, ded, general
        #[arg(short, long)]
        category: Option<String>,

        /// New status: active, inactive, suspended
        #[arg(short, long)]
        status: Option<String>,

        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Mark a card as the default source for fee payments
    Link {
        /// Card name
        name: String,
    },

    /// Clear the fee-payment link flag
    Unlink {
        /// Card name
        name: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Card(card_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_card_command(&service, card_cmd).await?;
            }

            Commands::Deposit {
                amount,
                card,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents = parse_cents(&amount)
                    .context("Invalid amount format. Use '500.00' or '500'")?;

                let target = service.find_card_by_name(&card).await?;
                let result = service.deposit(target.id, amount_cents, description).await?;

                println!(
                    "Deposited {} onto {} (balance: {})",
                    format_cents(result.transaction.amount),
                    result.card.name,
                    format_cents(result.card.balance)
                );
            }

            Commands::Withdraw {
                amount,
                card,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let target = service.find_card_by_name(&card).await?;
                let result = service.withdraw(target.id, amount_cents, description).await?;

                println!(
                    "Withdrew {} from {} (balance: {})",
                    format_cents(result.transaction.amount),
                    result.card.name,
                    format_cents(result.card.balance)
                );
            }

            Commands::Transfer {
                amount,
                from,
                to,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents = parse_cents(&amount)
                    .context("Invalid amount format. Use '200.00' or '200'")?;

                let source = service.find_card_by_name(&from).await?;
                let dest = service.find_card_by_name(&to).await?;
                let result = service
                    .transfer(source.id, dest.id, amount_cents, description)
                    .await?;

                println!(
                    "Transferred {} from {} (balance: {}) to {} (balance: {})",
                    format_cents(result.outgoing.amount),
                    result.source.name,
                    format_cents(result.source.balance),
                    result.dest.name,
                    format_cents(result.dest.balance)
                );
            }

            Commands::History { card, limit, json } => {
                let service = LedgerService::connect(&self.database).await?;
                let target = service.find_card_by_name(&card).await?;
                let transactions = service.list_transactions(target.id).await?;

                let shown: Vec<Transaction> = match limit {
                    Some(limit) => transactions.into_iter().take(limit).collect(),
                    None => transactions,
                };

                if json {
                    println!("{}", serde_json::to_string_pretty(&shown)?);
                } else {
                    print_history(&target, &shown);
                }
            }
        }

        Ok(())
    }
}

async fn run_card_command(service: &LedgerService, cmd: CardCommands) -> Result<()> {
    match cmd {
        CardCommands::Create {
            name,
            category,
            status,
            balance,
            notes,
        } => {
            let category: CardCategory = category
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid category. {}", e))?;
            let status: CardStatus = status
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid status. {}", e))?;
            let initial_balance = balance
                .map(|b| parse_cents(&b))
                .transpose()
                .context("Invalid balance format. Use '100.00' or '100'")?
                .unwrap_or(0);

            let card = service
                .create_card(name, category, status, initial_balance, notes)
                .await?;

            println!(
                "Created card: {} ({}, balance {})",
                card.name,
                card.category,
                format_cents(card.balance)
            );
        }

        CardCommands::List { json } => {
            let cards = service.list_cards().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
            } else if cards.is_empty() {
                println!("No cards found.");
            } else {
                println!(
                    "{:<20} {:<10} {:<10} {:>12} {:<6}",
                    "NAME", "CATEGORY", "STATUS", "BALANCE", "LINKED"
                );
                println!("{}", "-".repeat(62));
                for card in cards {
                    println!(
                        "{:<20} {:<10} {:<10} {:>12} {:<6}",
                        card.name,
                        card.category.to_string(),
                        card.status.to_string(),
                        format_cents(card.balance),
                        if card.linked_to_fees { "yes" } else { "" }
                    );
                }
            }
        }

        CardCommands::Show { name, json } => {
            let card = service.find_card_by_name(&name).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&card)?);
            } else {
                println!("Card:     {}", card.name);
                println!("Id:       {}", card.id);
                println!("Category: {}", card.category);
                println!("Status:   {}", card.status);
                println!("Balance:  {}", format_cents(card.balance));
                println!(
                    "Linked:   {}",
                    if card.linked_to_fees { "yes" } else { "no" }
                );
                if let Some(notes) = &card.notes {
                    println!("Notes:    {}", notes);
                }
                println!("Created:  {}", card.created_at.format("%Y-%m-%d %H:%M"));
            }
        }

        CardCommands::Update {
            name,
            rename,
            category,
            status,
            notes,
        } => {
            let card = service.find_card_by_name(&name).await?;

            let update = CardUpdate {
                name: rename,
                category: category
                    .map(|c| c.parse())
                    .transpose()
                    .map_err(|e| anyhow::anyhow!("Invalid category. {}", e))?,
                status: status
                    .map(|s| s.parse())
                    .transpose()
                    .map_err(|e| anyhow::anyhow!("Invalid status. {}", e))?,
                notes,
            };

            let card = service.update_card_metadata(card.id, update).await?;
            println!("Updated card: {} ({}, {})", card.name, card.category, card.status);
        }

        CardCommands::Link { name } => {
            let card = service.find_card_by_name(&name).await?;
            let card = service.set_linked(card.id, true).await?;
            println!("Linked {} as the default fee-payment card", card.name);
        }

        CardCommands::Unlink { name } => {
            let card = service.find_card_by_name(&name).await?;
            let card = service.set_linked(card.id, false).await?;
            println!("Unlinked {}", card.name);
        }
    }

    Ok(())
}

fn print_history(card: &Card, transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("No transactions for {}.", card.name);
        return;
    }

    println!("History for {} (newest first):", card.name);
    println!(
        "{:<17} {:<13} {:>12} {:>12}  {}",
        "DATE", "KIND", "AMOUNT", "BALANCE", "DESCRIPTION"
    );
    println!("{}", "-".repeat(80));
    for tx in transactions {
        println!(
            "{:<17} {:<13} {:>12} {:>12}  {}",
            tx.created_at.format("%Y-%m-%d %H:%M"),
            tx.kind.to_string(),
            format_cents(tx.amount),
            format_cents(tx.balance_after),
            tx.description.as_deref().unwrap_or("")
        );
    }
}
