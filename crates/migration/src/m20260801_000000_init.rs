//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for the economy engine:
//!
//! - `accounts`: per-actor pocket balances
//! - `ledger_transactions`: immutable audit trail of every balance mutation
//! - `bank_accounts`: interest-bearing balances, separate from the pocket
//! - `loans`: short-term loans, at most one active per owner
//! - `listings`: fixed-price auction-house entries with expiry

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    OwnerId,
    Balance,
}

#[derive(Iden)]
enum LedgerTransactions {
    Table,
    Id,
    FromOwnerId,
    ToOwnerId,
    Amount,
    Kind,
    Reason,
    IdempotencyKey,
    RecordedAt,
}

#[derive(Iden)]
enum BankAccounts {
    Table,
    OwnerId,
    BankBalance,
    InterestRate,
    LastInterestAt,
}

#[derive(Iden)]
enum Loans {
    Table,
    Id,
    OwnerId,
    Principal,
    InterestRate,
    RemainingAmount,
    CreatedAt,
    DueAt,
    Status,
}

#[derive(Iden)]
enum Listings {
    Table,
    Id,
    SellerId,
    ItemDescriptor,
    Price,
    CreatedAt,
    ExpiresAt,
    Status,
    BuyerId,
    ResolvedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::OwnerId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Balance).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Ledger transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerTransactions::FromOwnerId).string())
                    .col(ColumnDef::new(LedgerTransactions::ToOwnerId).string())
                    .col(
                        ColumnDef::new(LedgerTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(LedgerTransactions::Reason)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerTransactions::IdempotencyKey).string())
                    .col(
                        ColumnDef::new(LedgerTransactions::RecordedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_transactions-from_owner_id")
                    .table(LedgerTransactions::Table)
                    .col(LedgerTransactions::FromOwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_transactions-to_owner_id")
                    .table(LedgerTransactions::Table)
                    .col(LedgerTransactions::ToOwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_transactions-recorded_at")
                    .table(LedgerTransactions::Table)
                    .col(LedgerTransactions::RecordedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_transactions-idempotency_key")
                    .table(LedgerTransactions::Table)
                    .col(LedgerTransactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Bank accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankAccounts::OwnerId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BankAccounts::BankBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankAccounts::InterestRate)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankAccounts::LastInterestAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Loans
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Loans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Loans::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Loans::OwnerId).string().not_null())
                    .col(ColumnDef::new(Loans::Principal).big_integer().not_null())
                    .col(ColumnDef::new(Loans::InterestRate).double().not_null())
                    .col(
                        ColumnDef::new(Loans::RemainingAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Loans::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Loans::DueAt).timestamp().not_null())
                    .col(ColumnDef::new(Loans::Status).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-loans-owner_id-status")
                    .table(Loans::Table)
                    .col(Loans::OwnerId)
                    .col(Loans::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Listings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Listings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Listings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Listings::SellerId).string().not_null())
                    .col(
                        ColumnDef::new(Listings::ItemDescriptor)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Listings::Price).big_integer().not_null())
                    .col(ColumnDef::new(Listings::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Listings::ExpiresAt).timestamp().not_null())
                    .col(ColumnDef::new(Listings::Status).string().not_null())
                    .col(ColumnDef::new(Listings::BuyerId).string())
                    .col(ColumnDef::new(Listings::ResolvedAt).timestamp())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-listings-status-expires_at")
                    .table(Listings::Table)
                    .col(Listings::Status)
                    .col(Listings::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-listings-seller_id")
                    .table(Listings::Table)
                    .col(Listings::SellerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Listings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Loans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
