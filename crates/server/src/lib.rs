pub mod authz;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod settings;
pub mod stream;

use config::Config;
use std::sync::Arc;

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub bus: Arc<stream::bus::EventBus>,
}
