// Database trait: async interface over the analysis store.
//
// The web server and CLI hold an `Arc<dyn Database>`; the rusqlite backend
// wraps its connection in a mutex so the trait can be Send + Sync.
//
// The trait mirrors the queries.rs function signatures, so tests can keep
// exercising the free functions against a bare Connection.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{CategoryInfo, CategoryWeight, Dataset, ImportSummary, ItemRecord};
use crate::config::DataSource;

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    /// Row counts for the main analysis and transcript tables.
    async fn table_counts(&self) -> Result<Vec<(&'static str, i64)>>;

    // --- App state ---

    /// Get an app state value by key (e.g., "last_import_at").
    async fn get_app_state(&self, key: &str) -> Result<Option<String>>;

    /// Set an app state value (upsert).
    async fn set_app_state(&self, key: &str, value: &str) -> Result<()>;

    // --- Analysis tables ---

    /// Load every item of a source, optionally for a single model run.
    async fn load_items(&self, source: DataSource, model_id: Option<i64>) -> Result<Vec<ItemRecord>>;

    /// Load per-country item weights (empty for sources without a weights view).
    async fn load_category_weights(&self, source: DataSource) -> Result<Vec<CategoryWeight>>;

    /// Load country names and voting communities.
    async fn load_category_info(&self) -> Result<Vec<CategoryInfo>>;

    // --- Import ---

    /// Bulk-insert a dataset in one transaction, ticking `progress` per row.
    async fn import_dataset(
        &self,
        dataset: &Dataset,
        progress: &(dyn Fn(u64) + Send + Sync),
    ) -> Result<ImportSummary>;
}
