use rusqlite::{params, types::Type, Connection, ErrorCode, OptionalExtension, Row};
use crate::{
    error::{Result, TreasuryError},
    storage::models::{Changeset, DatabaseStats, TransactionKind, TransactionRecord},
    storage::TreasuryStore,
    territory::{Rank, Territory},
    treasury::{TaxRates, TreasuryBalance},
};
use chrono::{DateTime, Utc};
use tracing::debug;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS territories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                balance REAL NOT NULL,
                base_tax REAL NOT NULL,
                rent_tax REAL NOT NULL,
                buy_tax REAL NOT NULL,
                create_tax REAL NOT NULL,
                claimed_chunks INTEGER NOT NULL,
                ranks TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                territory_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                amount REAL NOT NULL,
                counterparty TEXT,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (territory_id) REFERENCES territories(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_territory ON transactions(territory_id)",
            [],
        )?;

        Ok(())
    }

    fn territory_from_row(row: &Row<'_>) -> rusqlite::Result<Territory> {
        let ranks_json: String = row.get(8)?;
        let ranks: Vec<Rank> = serde_json::from_str(&ranks_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

        Ok(Territory {
            id: row.get(0)?,
            name: row.get(1)?,
            treasury: TreasuryBalance::new(row.get(2)?),
            taxes: TaxRates::new(row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?),
            claimed_chunks: row.get(7)?,
            ranks,
        })
    }

    fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
        let kind: String = row.get(2)?;
        let kind: TransactionKind = kind.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into())
        })?;
        let timestamp: String = row.get(5)?;
        let timestamp: DateTime<Utc> = timestamp
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(TransactionRecord {
            id: row.get(0)?,
            territory_id: row.get(1)?,
            kind,
            amount: row.get(3)?,
            counterparty: row.get(4)?,
            timestamp,
        })
    }

    pub fn list_territories(&self) -> Result<Vec<Territory>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, balance, base_tax, rent_tax, buy_tax, create_tax, claimed_chunks, ranks
             FROM territories
             ORDER BY id"
        )?;

        let territories = stmt
            .query_map([], Self::territory_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(territories)
    }

    pub fn delete_territory(&self, id: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM transactions WHERE territory_id = ?1", [id])?;
        let removed = tx.execute("DELETE FROM territories WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let total_territories: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM territories",
            [],
            |row| row.get(0),
        )?;

        let total_balance: Option<f64> = self.conn.query_row(
            "SELECT SUM(balance) FROM territories",
            [],
            |row| row.get(0),
        )?;

        let indebted_territories: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM territories WHERE balance < 0",
            [],
            |row| row.get(0),
        )?;

        let total_transactions: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transactions",
            [],
            |row| row.get(0),
        )?;

        Ok(DatabaseStats {
            total_territories: total_territories as usize,
            total_balance: total_balance.unwrap_or(0.0),
            indebted_territories: indebted_territories as usize,
            total_transactions: total_transactions as usize,
        })
    }
}

fn insert_territory(conn: &Connection, territory: &Territory) -> Result<()> {
    let ranks = serde_json::to_string(&territory.ranks)?;
    let inserted = conn.execute(
        "INSERT INTO territories
         (id, name, balance, base_tax, rent_tax, buy_tax, create_tax, claimed_chunks, ranks)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            territory.id,
            territory.name,
            territory.treasury.balance(),
            territory.taxes.base_tax(),
            territory.taxes.property_rent_tax(),
            territory.taxes.property_buy_tax(),
            territory.taxes.property_create_tax(),
            territory.claimed_chunks,
            ranks,
        ],
    );

    match inserted {
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(TreasuryError::TerritoryExists(territory.id.clone()))
        }
        other => {
            other?;
            Ok(())
        }
    }
}

fn update_territory(conn: &Connection, territory: &Territory) -> Result<()> {
    let ranks = serde_json::to_string(&territory.ranks)?;
    let updated = conn.execute(
        "UPDATE territories
         SET name = ?2, balance = ?3, base_tax = ?4, rent_tax = ?5, buy_tax = ?6,
             create_tax = ?7, claimed_chunks = ?8, ranks = ?9
         WHERE id = ?1",
        params![
            territory.id,
            territory.name,
            territory.treasury.balance(),
            territory.taxes.base_tax(),
            territory.taxes.property_rent_tax(),
            territory.taxes.property_buy_tax(),
            territory.taxes.property_create_tax(),
            territory.claimed_chunks,
            ranks,
        ],
    )?;
    if updated == 0 {
        return Err(TreasuryError::TerritoryNotFound(territory.id.clone()));
    }
    Ok(())
}

fn update_balance(conn: &Connection, id: &str, treasury: &TreasuryBalance) -> Result<()> {
    let updated = conn.execute(
        "UPDATE territories SET balance = ?1 WHERE id = ?2",
        params![treasury.balance(), id],
    )?;
    if updated == 0 {
        return Err(TreasuryError::TerritoryNotFound(id.to_string()));
    }
    Ok(())
}

fn insert_transaction(conn: &Connection, record: &TransactionRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO transactions
         (territory_id, kind, amount, counterparty, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.territory_id,
            record.kind.to_string(),
            record.amount,
            record.counterparty,
            record.timestamp.to_rfc3339(),
        ],
    )?;
    Ok(())
}

impl TreasuryStore for Database {
    fn get_territory(&self, id: &str) -> Result<Option<Territory>> {
        let territory = self
            .conn
            .query_row(
                "SELECT id, name, balance, base_tax, rent_tax, buy_tax, create_tax, claimed_chunks, ranks
                 FROM territories
                 WHERE id = ?1",
                [id],
                Self::territory_from_row,
            )
            .optional()?;
        Ok(territory)
    }

    fn apply(&self, changes: &Changeset) -> Result<()> {
        // Rolled back on drop unless committed
        let tx = self.conn.unchecked_transaction()?;

        if let Some(territory) = &changes.created {
            insert_territory(&tx, territory)?;
        }
        for territory in &changes.updated {
            update_territory(&tx, territory)?;
        }
        for (id, treasury) in &changes.balances {
            update_balance(&tx, id, treasury)?;
        }
        for record in &changes.records {
            insert_transaction(&tx, record)?;
        }

        tx.commit()?;
        debug!(
            "Applied {} balance(s) and {} record(s)",
            changes.balances.len(),
            changes.records.len()
        );
        Ok(())
    }

    fn get_transaction_history(&self, id: &str, limit: Option<usize>) -> Result<Vec<TransactionRecord>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT id, territory_id, kind, amount, counterparty, timestamp
             FROM transactions
             WHERE territory_id = ?1
             ORDER BY id DESC
             LIMIT ?2"
        )?;

        let records = stmt
            .query_map(params![id, limit], Self::transaction_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
