use std::sync::Arc;

use sqlx::SqlitePool;

use crate::admin::AdminCredentials;
use crate::storage::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub files: Arc<dyn FileStore>,
    pub admin: AdminCredentials,
}
