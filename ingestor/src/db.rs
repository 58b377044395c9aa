use crate::errors::{Error, Result};
use crate::metrics::DB_FAILURES_TOTAL;
use crate::model::{Axes, Reading};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub async fn make_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening database...");
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    info!("Database connection established");
    migrate(&pool).await?;

    Ok(pool)
}

/// Pool over a private in-memory database. The single connection never
/// expires, otherwise the database would vanish with it.
#[cfg(test)]
pub async fn memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Migrations completed");
    Ok(())
}

pub async fn create_device(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO devices (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await;

    match result {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(Error::DuplicateName(name.to_string())),
        Err(e) => Err(storage_failure(e)),
    }
}

pub async fn device_exists(conn: &mut SqliteConnection, device_id: i64) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM devices WHERE id = ?")
        .bind(device_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage_failure)?;

    Ok(row.is_some())
}

/// Appends one reading. The foreign key is the real guard against unknown
/// devices; a violation surfaces as `DeviceNotFound`.
pub async fn insert_reading(
    conn: &mut SqliteConnection,
    device_id: i64,
    timestamp: &str,
    x: f64,
    y: f64,
    z: f64,
) -> Result<Reading> {
    let result = sqlx::query_as::<_, Reading>(
        r#"
        INSERT INTO device_data (device_id, timestamp, x, y, z)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, device_id, timestamp, x, y, z
        "#,
    )
    .bind(device_id)
    .bind(timestamp)
    .bind(x)
    .bind(y)
    .bind(z)
    .fetch_one(&mut *conn)
    .await;

    match result {
        Ok(reading) => Ok(reading),
        Err(e) if is_foreign_key_violation(&e) => Err(Error::DeviceNotFound(device_id)),
        Err(e) => Err(storage_failure(e)),
    }
}

/// Loads every reading of a device, optionally bounded (inclusive) by
/// ISO-8601 timestamps. Bounds compare as strings.
pub async fn query_readings(
    conn: &mut SqliteConnection,
    device_id: i64,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<Axes>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT x, y, z FROM device_data WHERE device_id = ");
    query.push_bind(device_id);

    if let Some(start) = start {
        query.push(" AND timestamp >= ").push_bind(start);
    }
    if let Some(end) = end {
        query.push(" AND timestamp <= ").push_bind(end);
    }
    query.push(" ORDER BY timestamp, id");

    let rows = query
        .build_query_as::<Axes>()
        .fetch_all(&mut *conn)
        .await
        .map_err(storage_failure)?;

    debug!(
        "Loaded {} readings for device {} (start={:?}, end={:?})",
        rows.len(),
        device_id,
        start,
        end
    );

    Ok(rows)
}

#[cfg(test)]
pub async fn count_readings(conn: &mut SqliteConnection, device_id: i64) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM device_data WHERE device_id = ?")
        .bind(device_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(storage_failure)?;

    Ok(count)
}

fn storage_failure(err: sqlx::Error) -> Error {
    DB_FAILURES_TOTAL.inc();
    Error::Database(err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
        _ => false,
    }
}
