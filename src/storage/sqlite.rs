use crate::analyzer::alert::PriceAlert;
use crate::model::{StockSymbol, StorageError};
use crate::utils::normalize_symbol;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use rusqlite::{Connection, Row, params};

pub const IN_MEMORY: &str = ":memory:";

/// Minimum gap between two notifications of the same alert.
const ALERT_COOLDOWN_HOURS: i64 = 24;

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database (`:memory:` keeps everything for this session only) and runs migrations.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = if db_path == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(db_path)?
        };

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS watchlist (
                symbol TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                added_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS alert_log (
                symbol TEXT PRIMARY KEY,
                target REAL NOT NULL,
                live_price REAL NOT NULL,
                notified_at TEXT NOT NULL
            );
            "
        )?;

        Self::migrate_add_column_if_missing(&conn, "watchlist", "sector", "TEXT NOT NULL DEFAULT ''")?;
        Self::migrate_add_column_if_missing(&conn, "watchlist", "alert_price", "REAL")?;

        Ok(Self { conn })
    }

    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    /// Inserts a symbol or updates its name, sector and alert target. Keeps the original position.
    pub fn upsert_symbol(&self, stock: &StockSymbol) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO watchlist (symbol, name, sector, alert_price, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(symbol) DO UPDATE SET
                name = excluded.name,
                sector = excluded.sector,
                alert_price = excluded.alert_price",
            params![
                normalize_symbol(&stock.symbol),
                &stock.name,
                &stock.sector,
                &stock.alert_price,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Removes a symbol and its alert history. Returns false if it was not tracked.
    pub fn remove_symbol(&self, symbol: &str) -> Result<bool, StorageError> {
        let symbol = normalize_symbol(symbol);
        let removed = self
            .conn
            .execute("DELETE FROM watchlist WHERE symbol = ?1", params![&symbol])?;
        self.conn
            .execute("DELETE FROM alert_log WHERE symbol = ?1", params![&symbol])?;
        Ok(removed > 0)
    }

    /// Watchlist, most recently added first.
    pub fn list_symbols(&self) -> Result<Vec<StockSymbol>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, name, sector, alert_price FROM watchlist ORDER BY rowid DESC",
        )?;

        let rows = stmt.query_map([], |row| Self::map_symbol(row))?;
        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row?);
        }

        Ok(symbols)
    }

    pub fn get_symbol(&self, symbol: &str) -> Result<Option<StockSymbol>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, name, sector, alert_price FROM watchlist WHERE symbol = ?1",
        )?;

        let mut rows = stmt.query(params![normalize_symbol(symbol)])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::map_symbol(row)?))
        } else {
            Ok(None)
        }
    }

    /// Matches the ticker case-insensitively, or any name containing the query.
    pub fn find_symbol(&self, query: &str) -> Result<Option<StockSymbol>, StorageError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        let lowered = query.to_lowercase();

        Ok(self.list_symbols()?.into_iter().find(|s| {
            s.symbol.eq_ignore_ascii_case(query) || s.name.to_lowercase().contains(&lowered)
        }))
    }

    /// True if the alert was never sent or the last one is older than 24 hours.
    pub fn should_notify_alert(&self, symbol: &str) -> Result<bool, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT notified_at FROM alert_log WHERE symbol = ?1")?;
        let mut rows = stmt.query(params![normalize_symbol(symbol)])?;

        if let Some(row) = rows.next()? {
            let notified_at_str: String = row.get(0)?;
            if notified_at_str.trim().is_empty() {
                return Ok(true);
            }

            // Stored by datetime('now') as "%Y-%m-%d %H:%M:%S"
            let notified_at_naive = NaiveDateTime::parse_from_str(&notified_at_str, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| StorageError::InvalidData(format!("Invalid datetime: {}", e)))?;
            let notified_at: DateTime<Utc> = Utc.from_utc_datetime(&notified_at_naive);

            Ok(Utc::now().signed_duration_since(notified_at) > Duration::hours(ALERT_COOLDOWN_HOURS))
        } else {
            Ok(true)
        }
    }

    pub fn mark_alert_notified(&self, alert: &PriceAlert) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO alert_log (symbol, target, live_price, notified_at)
             VALUES (?1, ?2, ?3, datetime('now'))",
            params![normalize_symbol(&alert.symbol), &alert.target, &alert.live_price],
        )?;
        Ok(())
    }

    fn map_symbol(row: &Row) -> Result<StockSymbol, rusqlite::Error> {
        Ok(StockSymbol {
            symbol: row.get(0)?,
            name: row.get(1)?,
            sector: row.get(2)?,
            alert_price: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SqliteStorage {
        SqliteStorage::new(IN_MEMORY).expect("in-memory db")
    }

    fn stock(symbol: &str, name: &str, alert_price: Option<f64>) -> StockSymbol {
        StockSymbol {
            symbol: symbol.into(),
            name: name.into(),
            sector: "Technology".into(),
            alert_price,
        }
    }

    fn alert(symbol: &str) -> PriceAlert {
        PriceAlert {
            symbol: symbol.into(),
            target: 100.0,
            live_price: 102.0,
        }
    }

    #[test]
    fn lists_newest_first() {
        let db = storage();
        db.upsert_symbol(&stock("AAPL", "Apple", None)).unwrap();
        db.upsert_symbol(&stock("NVDA", "NVIDIA", Some(140.0))).unwrap();

        let symbols: Vec<String> = db.list_symbols().unwrap().into_iter().map(|s| s.symbol).collect();
        assert_eq!(symbols, vec!["NVDA", "AAPL"]);
    }

    #[test]
    fn upsert_updates_in_place() {
        let db = storage();
        db.upsert_symbol(&stock("AAPL", "Apple", None)).unwrap();
        db.upsert_symbol(&stock("MSFT", "Microsoft", None)).unwrap();
        db.upsert_symbol(&stock("aapl", "Apple Inc.", Some(250.0))).unwrap();

        let list = db.list_symbols().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].symbol, "AAPL");
        assert_eq!(list[1].name, "Apple Inc.");
        assert_eq!(list[1].alert_price, Some(250.0));
    }

    #[test]
    fn get_and_remove() {
        let db = storage();
        db.upsert_symbol(&stock("TSLA", "Tesla", Some(300.0))).unwrap();

        let found = db.get_symbol("tsla").unwrap().expect("tracked");
        assert_eq!(found.alert_price, Some(300.0));

        assert!(db.remove_symbol("TSLA").unwrap());
        assert!(!db.remove_symbol("TSLA").unwrap());
        assert_eq!(db.get_symbol("TSLA").unwrap(), None);
    }

    #[test]
    fn find_matches_symbol_or_name() {
        let db = storage();
        db.upsert_symbol(&stock("TSM", "Taiwan Semiconductor", None)).unwrap();

        assert_eq!(db.find_symbol("tsm").unwrap().unwrap().symbol, "TSM");
        assert_eq!(db.find_symbol("semicon").unwrap().unwrap().symbol, "TSM");
        assert_eq!(db.find_symbol("apple").unwrap(), None);
        assert_eq!(db.find_symbol("  ").unwrap(), None);
    }

    #[test]
    fn alert_cooldown() {
        let db = storage();
        assert!(db.should_notify_alert("AAPL").unwrap());

        db.mark_alert_notified(&alert("AAPL")).unwrap();
        assert!(!db.should_notify_alert("AAPL").unwrap());
        assert!(db.should_notify_alert("MSFT").unwrap());

        db.conn
            .execute(
                "UPDATE alert_log SET notified_at = datetime('now', '-25 hours') WHERE symbol = 'AAPL'",
                [],
            )
            .unwrap();
        assert!(db.should_notify_alert("AAPL").unwrap());
    }

    #[test]
    fn removing_symbol_clears_alert_history() {
        let db = storage();
        db.upsert_symbol(&stock("AMD", "AMD", Some(150.0))).unwrap();
        db.mark_alert_notified(&alert("AMD")).unwrap();
        db.remove_symbol("AMD").unwrap();
        assert!(db.should_notify_alert("AMD").unwrap());
    }

    #[test]
    fn migration_is_idempotent() {
        let db = storage();
        SqliteStorage::migrate_add_column_if_missing(&db.conn, "watchlist", "alert_price", "REAL").unwrap();
        db.upsert_symbol(&stock("AMZN", "Amazon", Some(200.0))).unwrap();
        assert_eq!(db.get_symbol("AMZN").unwrap().unwrap().alert_price, Some(200.0));
    }
}
