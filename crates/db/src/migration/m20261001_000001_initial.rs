//! Initial database migration.
//!
//! Creates the ledger tables and enums. The CHECK constraints on
//! `transactions` restate the sign and transfer rules so a buggy writer
//! cannot commit a row the engine would reject.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: GROUPS & MEMBERSHIP
        // ============================================================
        db.execute_unprepared(GROUPS_SQL).await?;
        db.execute_unprepared(GROUP_MEMBERS_SQL).await?;

        // ============================================================
        // PART 3: CURRENCY MANAGEMENT
        // ============================================================
        db.execute_unprepared(CURRENCIES_SQL).await?;
        db.execute_unprepared(EXCHANGE_RATES_SQL).await?;

        // ============================================================
        // PART 4: ACCOUNTS, CATEGORIES & LEDGER
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 5: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_CURRENCIES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Entry kind
CREATE TYPE transaction_type AS ENUM ('EXPENSE', 'INCOME', 'TRANSFER');

-- Money direction relative to the entry's account
CREATE TYPE direction AS ENUM ('MONEY_IN', 'MONEY_OUT');
";

const GROUPS_SQL: &str = r"
CREATE TABLE groups (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const GROUP_MEMBERS_SQL: &str = r"
CREATE TABLE group_members (
    group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    user_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (group_id, user_id)
);

CREATE INDEX idx_group_members_user ON group_members(user_id);
";

const CURRENCIES_SQL: &str = r"
CREATE TABLE currencies (
    code CHAR(3) PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    symbol VARCHAR(10) NOT NULL,
    decimal_places SMALLINT NOT NULL DEFAULT 2,
    CONSTRAINT chk_currency_code CHECK (code ~ '^[A-Z]{3}$'),
    CONSTRAINT chk_decimal_places CHECK (decimal_places BETWEEN 0 AND 4)
);
";

const EXCHANGE_RATES_SQL: &str = r"
CREATE TABLE exchange_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    from_currency CHAR(3) NOT NULL REFERENCES currencies(code),
    to_currency CHAR(3) NOT NULL REFERENCES currencies(code),
    rate NUMERIC(19, 10) NOT NULL,
    effective_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,
    CONSTRAINT chk_rate_positive CHECK (rate > 0),
    CONSTRAINT chk_different_currencies CHECK (from_currency <> to_currency)
);

CREATE UNIQUE INDEX uq_exchange_rates_live
    ON exchange_rates(from_currency, to_currency, effective_date)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_exchange_rates_lookup
    ON exchange_rates(from_currency, to_currency, effective_date DESC);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    currency CHAR(3) NOT NULL REFERENCES currencies(code),
    name VARCHAR(255) NOT NULL,
    starting_balance BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE INDEX idx_accounts_group ON accounts(group_id);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE INDEX idx_categories_group ON categories(group_id);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    category_id UUID REFERENCES categories(id),
    transaction_type transaction_type NOT NULL,
    direction direction NOT NULL,
    amount BIGINT NOT NULL,
    link_code VARCHAR(64),
    original_currency CHAR(3) REFERENCES currencies(code),
    original_amount BIGINT,
    memo TEXT,
    occurred_at TIMESTAMPTZ NOT NULL,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_amount_nonzero CHECK (amount <> 0),
    CONSTRAINT chk_amount_sign CHECK (
        (direction = 'MONEY_IN' AND amount > 0) OR
        (direction = 'MONEY_OUT' AND amount < 0)
    ),
    CONSTRAINT chk_transfer_uncategorised CHECK (
        link_code IS NULL OR category_id IS NULL
    ),
    CONSTRAINT chk_original_pair CHECK (
        (original_currency IS NULL) = (original_amount IS NULL)
    )
);

CREATE INDEX idx_transactions_account ON transactions(account_id);
CREATE INDEX idx_transactions_group ON transactions(group_id, occurred_at DESC);
CREATE INDEX idx_transactions_link ON transactions(link_code) WHERE link_code IS NOT NULL;
";

const SEED_CURRENCIES_SQL: &str = r"
INSERT INTO currencies (code, name, symbol, decimal_places) VALUES
('USD', 'US Dollar', '$', 2),
('EUR', 'Euro', '€', 2),
('GBP', 'British Pound', '£', 2),
('JPY', 'Japanese Yen', '¥', 0),
('CHF', 'Swiss Franc', 'CHF', 2),
('CAD', 'Canadian Dollar', 'C$', 2),
('AUD', 'Australian Dollar', 'A$', 2),
('SGD', 'Singapore Dollar', 'S$', 2),
('IDR', 'Indonesian Rupiah', 'Rp', 0),
('INR', 'Indian Rupee', '₹', 2);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS exchange_rates CASCADE;
DROP TABLE IF EXISTS currencies CASCADE;
DROP TABLE IF EXISTS group_members CASCADE;
DROP TABLE IF EXISTS groups CASCADE;

DROP TYPE IF EXISTS direction;
DROP TYPE IF EXISTS transaction_type;
";
