//! SQLite purchase ledger.
//!
//! RULE: Only this file talks to the database.
//! The ledger stores raw purchase records only; derived features,
//! thresholds and factor models are recomputed every run.

use super::TransactionStore;
use crate::{
    error::InsightResult,
    transaction::{parse_purchase_date, Transaction},
};
use rusqlite::{params, Connection};

pub struct PurchaseLedger {
    conn: Connection,
}

impl PurchaseLedger {
    /// Open (or create) the ledger database at `path`.
    pub fn open(path: &str) -> InsightResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; in-memory ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> InsightResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> InsightResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_purchases.sql"))?;
        Ok(())
    }

    // ── Purchases ──────────────────────────────────────────────

    /// Append records in a single SQL transaction. Returns rows written.
    pub fn insert_transactions(&mut self, txns: &[Transaction]) -> InsightResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO purchase (customer_id, product_id, category, amount, purchase_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for t in txns {
                stmt.execute(params![
                    t.customer_id,
                    t.product_id,
                    t.category,
                    t.amount,
                    t.purchase_date.format("%Y-%m-%d").to_string(),
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("ledger: inserted {} purchase rows", txns.len());
        Ok(txns.len())
    }

    pub fn transaction_count(&self) -> InsightResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM purchase", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Read every record back in insertion order.
    pub fn load_transactions(&self) -> InsightResult<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, customer_id, product_id, category, amount, purchase_date
             FROM purchase ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, customer_id, product_id, category, amount, date)| {
                let line = id as u64;
                let purchase_date = parse_purchase_date(&date, line)?;
                Transaction::new(customer_id, product_id, category, amount, purchase_date, line)
            })
            .collect()
    }

    /// Load the ledger into a Transaction Store for one run.
    pub fn load_store(&self) -> InsightResult<TransactionStore> {
        let txns = self.load_transactions()?;
        log::info!("loaded {} purchase records from ledger", txns.len());
        TransactionStore::non_empty(txns)
    }
}
