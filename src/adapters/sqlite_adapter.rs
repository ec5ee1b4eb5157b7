//! SQLite price cache.
//!
//! Stores daily bars in a single `prices` table keyed by instrument and date.
//! The `import` command fills it from a CSV directory so later runs avoid
//! re-parsing text files.

use crate::domain::error::SimError;
use crate::domain::price::PriceBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::info;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> SimError {
    SimError::Data {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> SimError {
    SimError::DataQuery {
        reason: e.to_string(),
    }
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate, SimError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| SimError::Data {
        reason: format!("bad stored date '{}': {}", raw, e),
    })
}

impl SqliteAdapter {
    /// Open the database named by `[data] path`, creating the schema if needed.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SimError> {
        let db_path =
            config
                .get_non_empty("data", "path")
                .ok_or_else(|| SimError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                })?;
        let pool_size = config.get_int("data", "pool_size", 4).max(1) as u32;

        let pool = Pool::builder()
            .max_size(pool_size)
            .build(SqliteConnectionManager::file(&db_path))
            .map_err(pool_error)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, SimError> {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .map_err(pool_error)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, SimError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), SimError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS prices (
                    instrument TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    PRIMARY KEY (instrument, date)
                );
                CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(date);",
            )
            .map_err(query_error)
    }

    /// Upsert bars in one transaction. Returns the number of rows written.
    pub fn insert_bars(&self, bars: &[PriceBar]) -> Result<usize, SimError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO prices (instrument, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.instrument,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        info!("cached {} bars", bars.len());
        Ok(bars.len())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_ohlcv(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, SimError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM prices
                 WHERE instrument = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![
                    instrument,
                    start_date.format(DATE_FORMAT).to_string(),
                    end_date.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .map_err(query_error)?;

        let mut bars = Vec::new();
        for row in rows {
            let (date, open, high, low, close, volume) = row.map_err(query_error)?;
            bars.push(PriceBar {
                instrument: instrument.to_string(),
                date: parse_stored_date(&date)?,
                open,
                high,
                low,
                close,
                volume,
            });
        }
        Ok(bars)
    }

    fn list_instruments(&self) -> Result<Vec<String>, SimError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT instrument FROM prices ORDER BY instrument")
            .map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(query_error)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_error)
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SimError> {
        let (min, max, count): (Option<String>, Option<String>, i64) = self
            .conn()?
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM prices WHERE instrument = ?1",
                params![instrument],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => Ok(Some((
                parse_stored_date(&min)?,
                parse_stored_date(&max)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}
