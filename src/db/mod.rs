use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};

pub mod licenses;
pub mod role_store;
pub mod row_parsers;
pub mod users;

pub use role_store::SqliteRoleStore;

pub async fn init() -> anyhow::Result<SqlitePool> {
	let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
	let pool = connect(&database_url).await?;

	sqlx::migrate!()
		.run(&pool)
		.await
		.context("failed to run migrations")?;

	Ok(pool)
}

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
	let options: SqliteConnectOptions = database_url
		.parse()
		.with_context(|| format!("invalid DATABASE_URL: {database_url}"))?;

	SqlitePoolOptions::new()
		.max_connections(10)
		.min_connections(1)
		.acquire_timeout(Duration::from_secs(10))
		.connect_with(options.create_if_missing(true))
		.await
		.context("failed to connect to database")
}

/// Turns the "no row" outcome of a single-row lookup into `Ok(None)`.
///
/// Any other error stays an error so callers can tell a missing record from
/// a failing backend.
pub fn optional_row<T>(result: Result<T, sqlx::Error>) -> AppResult<Option<T>> {
	match result {
		Ok(value) => Ok(Some(value)),
		Err(sqlx::Error::RowNotFound) => Ok(None),
		Err(err) => Err(AppError::from(err)),
	}
}
