//! Shared setup for commands: open the store and hydrate the core components.

use crate::config::Config;
use crate::core::{AttendanceRecorder, ZoneRegistry};
use crate::db::pool::DbPool;
use crate::db::queries::{load_records, load_zones, zone_id_high_water};
use crate::errors::{AppError, AppResult};
use crate::models::coordinate::Coordinate;
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;

pub struct AppContext {
    pub pool: DbPool,
    pub registry: Arc<ZoneRegistry>,
}

impl AppContext {
    pub fn open(cfg: &Config) -> AppResult<Self> {
        let pool = DbPool::open_initialized(&cfg.database)?;
        let registry = Arc::new(ZoneRegistry::new());
        registry.load(load_zones(&pool.conn)?, zone_id_high_water(&pool.conn)?)?;
        Ok(Self { pool, registry })
    }

    /// Build a recorder over the stored records; the connection becomes its sink.
    pub fn into_recorder(
        self,
        cfg: &Config,
        as_of: NaiveDateTime,
    ) -> AppResult<AttendanceRecorder> {
        let recorder = AttendanceRecorder::new(self.registry, cfg.stats_policy()?);
        recorder.load(load_records(&self.pool.conn)?, as_of);
        Ok(recorder.with_sink(Box::new(self.pool)))
    }
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn parse_coordinate(s: &str) -> AppResult<Coordinate> {
    Coordinate::parse(s).ok_or_else(|| AppError::InvalidCoordinate(s.to_string()))
}

pub fn resolve_user(user: &Option<String>, cfg: &Config) -> String {
    user.clone().unwrap_or_else(|| cfg.default_user.clone())
}
