use crate::config::AppConfig;
use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub http: reqwest::Client,
    pub config: AppConfig,
}
