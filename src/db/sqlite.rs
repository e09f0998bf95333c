// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{CategoryInfo, CategoryWeight, Dataset, ImportSummary, ItemRecord};
use super::traits::Database;
use crate::config::DataSource;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        let conn = self.conn.lock().await;
        super::queries::table_counts(&conn)
    }

    async fn get_app_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_app_state(&conn, key)
    }

    async fn set_app_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_app_state(&conn, key, value)
    }

    async fn load_items(&self, source: DataSource, model_id: Option<i64>) -> Result<Vec<ItemRecord>> {
        let conn = self.conn.lock().await;
        super::queries::load_items(&conn, source, model_id)
    }

    async fn load_category_weights(&self, source: DataSource) -> Result<Vec<CategoryWeight>> {
        let conn = self.conn.lock().await;
        super::queries::load_category_weights(&conn, source)
    }

    async fn load_category_info(&self) -> Result<Vec<CategoryInfo>> {
        let conn = self.conn.lock().await;
        super::queries::load_category_info(&conn)
    }

    async fn import_dataset(
        &self,
        dataset: &Dataset,
        progress: &(dyn Fn(u64) + Send + Sync),
    ) -> Result<ImportSummary> {
        let mut conn = self.conn.lock().await;
        super::queries::import_dataset(&mut conn, dataset, progress)
    }
}
