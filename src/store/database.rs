//! Database-backed token store
//!
//! Persists access tokens in a `public_access_tokens` table, supporting
//! PostgreSQL, MySQL, and SQLite through `sqlx`'s Any driver with SQL
//! rendered per backend by `sea-query`. Timestamps are Unix milliseconds in
//! BIGINT columns.
//!
//! The one-time-use race is closed here: [`DatabaseTokenStore::mark_used`]
//! issues a single `UPDATE ... WHERE token = ? AND used_at IS NULL` and
//! reports whether any row was affected. Concurrent consumers of the same
//! token contend on that predicate inside the database, so exactly one of
//! them observes an affected row.
//!
//! ## Example
//!
//! ```rust,no_run
//! use printworks_tokens::store::DatabaseTokenStore;
//!
//! # async fn example() {
//! // Supported URLs: postgres://..., mysql://..., sqlite::memory:
//! let store = DatabaseTokenStore::connect("sqlite::memory:").await.unwrap();
//! store.create_table().await.unwrap();
//! # }
//! ```

use async_trait::async_trait;
use sea_query::{
	Alias, ColumnDef, Expr, ExprTrait, Index, MysqlQueryBuilder, PostgresQueryBuilder, Query,
	SqliteQueryBuilder, Table,
};
use sqlx::{AnyPool, Row};

use crate::error::StoreError;
use crate::model::{AccessToken, ResourceType};
use crate::store::TokenStore;

const TABLE: &str = "public_access_tokens";

/// Database flavor behind the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
	Postgres,
	MySql,
	Sqlite,
}

impl DatabaseBackend {
	fn from_url(url: &str) -> Result<Self, StoreError> {
		if url.starts_with("postgres://") || url.starts_with("postgresql://") {
			Ok(Self::Postgres)
		} else if url.starts_with("mysql://") {
			Ok(Self::MySql)
		} else if url.starts_with("sqlite:") {
			Ok(Self::Sqlite)
		} else {
			Err(StoreError::Backend(format!(
				"unsupported database URL: {}",
				url
			)))
		}
	}
}

/// Database-backed [`TokenStore`] implementation
#[derive(Clone)]
pub struct DatabaseTokenStore {
	pool: AnyPool,
	backend: DatabaseBackend,
}

impl DatabaseTokenStore {
	/// Connect to the given database URL
	pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
		sqlx::any::install_default_drivers();
		let backend = DatabaseBackend::from_url(database_url)?;
		let pool = AnyPool::connect(database_url)
			.await
			.map_err(|e| StoreError::Backend(format!("database connection error: {}", e)))?;

		Ok(Self { pool, backend })
	}

	/// Wrap an existing connection pool
	pub fn from_pool(pool: AnyPool, backend: DatabaseBackend) -> Self {
		Self { pool, backend }
	}

	/// Render a query statement for the active backend
	fn build_sql<T>(&self, statement: T) -> String
	where
		T: sea_query::QueryStatementWriter,
	{
		match self.backend {
			DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
			DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
			DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	/// Render a schema statement for the active backend
	fn build_table_sql<T>(&self, statement: T) -> String
	where
		T: sea_query::SchemaStatementBuilder,
	{
		match self.backend {
			DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
			DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
			DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	fn build_index_sql(&self, statement: &sea_query::IndexCreateStatement) -> String {
		match self.backend {
			DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
			DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
			DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
		}
	}

	async fn execute(&self, sql: &str) -> Result<u64, StoreError> {
		let result = sqlx::query(sql)
			.execute(&self.pool)
			.await
			.map_err(|e| StoreError::Backend(format!("query failed: {}", e)))?;
		Ok(result.rows_affected())
	}

	/// Create the `public_access_tokens` table and its indexes
	///
	/// Primarily intended for tests; production deployments create the
	/// table through migrations.
	pub async fn create_table(&self) -> Result<(), StoreError> {
		let stmt = Table::create()
			.table(Alias::new(TABLE))
			.if_not_exists()
			.col(
				ColumnDef::new(Alias::new("token"))
					.string_len(64)
					.not_null()
					.primary_key(),
			)
			.col(
				ColumnDef::new(Alias::new("resource_type"))
					.string_len(32)
					.not_null(),
			)
			.col(
				ColumnDef::new(Alias::new("resource_id"))
					.string_len(255)
					.not_null(),
			)
			.col(
				ColumnDef::new(Alias::new("expires_at"))
					.big_integer()
					.not_null(),
			)
			.col(
				ColumnDef::new(Alias::new("one_time_use"))
					.boolean()
					.not_null(),
			)
			.col(ColumnDef::new(Alias::new("used_at")).big_integer())
			.col(ColumnDef::new(Alias::new("created_by")).string_len(255))
			.col(ColumnDef::new(Alias::new("metadata")).text())
			.to_owned();

		let sql = self.build_table_sql(stmt);
		self.execute(&sql).await?;

		let expiry_index = Index::create()
			.if_not_exists()
			.name("idx_public_access_tokens_expires_at")
			.table(Alias::new(TABLE))
			.col(Alias::new("expires_at"))
			.to_owned();
		let _ = self.execute(&self.build_index_sql(&expiry_index)).await;

		let resource_index = Index::create()
			.if_not_exists()
			.name("idx_public_access_tokens_resource")
			.table(Alias::new(TABLE))
			.col(Alias::new("resource_type"))
			.col(Alias::new("resource_id"))
			.to_owned();
		let _ = self.execute(&self.build_index_sql(&resource_index)).await;

		Ok(())
	}

	fn record_from_row(row: &sqlx::any::AnyRow) -> Result<AccessToken, StoreError> {
		let read = |e: sqlx::Error| StoreError::Backend(format!("row decode failed: {}", e));

		let resource_type: String = row.try_get("resource_type").map_err(read)?;
		let resource_type = resource_type
			.parse::<ResourceType>()
			.map_err(|e| StoreError::Serialization(e.to_string()))?;

		let metadata: Option<String> = row
			.try_get("metadata")
			.map_err(|e: sqlx::Error| StoreError::Backend(format!("row decode failed: {}", e)))?;
		let metadata = metadata
			.map(|raw| serde_json::from_str(&raw))
			.transpose()
			.map_err(|e| StoreError::Serialization(format!("metadata decode failed: {}", e)))?;

		Ok(AccessToken {
			token: row.try_get("token").map_err(read)?,
			resource_type,
			resource_id: row.try_get("resource_id").map_err(read)?,
			expires_at: row.try_get("expires_at").map_err(read)?,
			one_time_use: row.try_get("one_time_use").map_err(read)?,
			used_at: row.try_get("used_at").map_err(read)?,
			created_by: row.try_get("created_by").map_err(read)?,
			metadata,
		})
	}
}

#[async_trait]
impl TokenStore for DatabaseTokenStore {
	async fn insert(&self, record: AccessToken) -> Result<(), StoreError> {
		let metadata = record
			.metadata
			.as_ref()
			.map(serde_json::to_string)
			.transpose()
			.map_err(|e| StoreError::Serialization(format!("metadata encode failed: {}", e)))?;

		let stmt = Query::insert()
			.into_table(Alias::new(TABLE))
			.columns([
				Alias::new("token"),
				Alias::new("resource_type"),
				Alias::new("resource_id"),
				Alias::new("expires_at"),
				Alias::new("one_time_use"),
				Alias::new("used_at"),
				Alias::new("created_by"),
				Alias::new("metadata"),
			])
			.values_panic([
				record.token.into(),
				record.resource_type.as_str().into(),
				record.resource_id.into(),
				record.expires_at.into(),
				record.one_time_use.into(),
				record.used_at.into(),
				record.created_by.into(),
				metadata.into(),
			])
			.to_owned();

		self.execute(&self.build_sql(stmt)).await?;
		Ok(())
	}

	async fn get(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
		let stmt = Query::select()
			.columns([
				Alias::new("token"),
				Alias::new("resource_type"),
				Alias::new("resource_id"),
				Alias::new("expires_at"),
				Alias::new("one_time_use"),
				Alias::new("used_at"),
				Alias::new("created_by"),
				Alias::new("metadata"),
			])
			.from(Alias::new(TABLE))
			.and_where(Expr::col(Alias::new("token")).eq(token))
			.to_owned();

		let sql = self.build_sql(stmt);
		let row = sqlx::query(&sql)
			.fetch_optional(&self.pool)
			.await
			.map_err(|e| StoreError::Backend(format!("query failed: {}", e)))?;

		row.as_ref().map(Self::record_from_row).transpose()
	}

	async fn mark_used(&self, token: &str, used_at_ms: i64) -> Result<bool, StoreError> {
		// Single conditional write; the database serializes concurrent
		// consumers on the used_at IS NULL predicate
		let stmt = Query::update()
			.table(Alias::new(TABLE))
			.value(Alias::new("used_at"), used_at_ms)
			.and_where(Expr::col(Alias::new("token")).eq(token))
			.and_where(Expr::col(Alias::new("used_at")).is_null())
			.to_owned();

		let affected = self.execute(&self.build_sql(stmt)).await?;
		Ok(affected == 1)
	}

	async fn delete(&self, token: &str) -> Result<u64, StoreError> {
		let stmt = Query::delete()
			.from_table(Alias::new(TABLE))
			.and_where(Expr::col(Alias::new("token")).eq(token))
			.to_owned();

		self.execute(&self.build_sql(stmt)).await
	}

	async fn delete_for_resource(
		&self,
		resource_type: ResourceType,
		resource_id: &str,
	) -> Result<u64, StoreError> {
		let stmt = Query::delete()
			.from_table(Alias::new(TABLE))
			.and_where(Expr::col(Alias::new("resource_type")).eq(resource_type.as_str()))
			.and_where(Expr::col(Alias::new("resource_id")).eq(resource_id))
			.to_owned();

		self.execute(&self.build_sql(stmt)).await
	}

	async fn delete_expired_used(&self, now_ms: i64) -> Result<u64, StoreError> {
		// Conjunction is deliberate: expired-but-never-used rows stay
		let stmt = Query::delete()
			.from_table(Alias::new(TABLE))
			.and_where(Expr::col(Alias::new("expires_at")).lt(now_ms))
			.and_where(Expr::col(Alias::new("used_at")).is_not_null())
			.to_owned();

		self.execute(&self.build_sql(stmt)).await
	}
}
