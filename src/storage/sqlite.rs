use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::models::PriceRecord;
use crate::storage::Storage;

pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open SQLite database")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS prices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_name TEXT NOT NULL,
                country_code TEXT NOT NULL,
                value REAL NOT NULL,
                currency TEXT NOT NULL,
                value_usd_blue REAL,
                source_type TEXT NOT NULL,
                description TEXT,
                recorded_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS dollar_rates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                casa TEXT NOT NULL,
                venta REAL NOT NULL,
                recorded_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_prices_product ON prices(product_name, country_code)",
            [],
        )?;

        info!("Database migration completed");
        Ok(())
    }

    async fn insert_price(&self, record: &PriceRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO prices (product_name, country_code, value, currency,
                                 value_usd_blue, source_type, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &record.product_name,
                record.country.code(),
                record.value,
                &record.currency,
                record.value_usd_blue,
                &record.source_type,
                &record.description,
            ],
        )?;

        Ok(())
    }

    async fn insert_rate(&self, casa: &str, venta: f64) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO dollar_rates (casa, venta) VALUES (?1, ?2)",
            params![casa, venta],
        )?;

        Ok(())
    }

    async fn latest_rate(&self, casa: &str) -> Result<Option<f64>> {
        let conn = self.conn.lock().unwrap();

        let venta: Option<f64> = conn
            .query_row(
                "SELECT venta FROM dollar_rates WHERE casa = ?1
                 ORDER BY recorded_at DESC, id DESC LIMIT 1",
                params![casa],
                |row| row.get(0),
            )
            .optional()?;

        Ok(venta)
    }
}
