use anyhow::Result;
use async_trait::async_trait;

use crate::models::PriceRecord;

mod sqlite;
pub use sqlite::SqliteStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn migrate(&self) -> Result<()>;
    async fn insert_price(&self, record: &PriceRecord) -> Result<()>;
    async fn insert_rate(&self, casa: &str, venta: f64) -> Result<()>;
    async fn latest_rate(&self, casa: &str) -> Result<Option<f64>>;
}
