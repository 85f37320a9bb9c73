//! RedditorStore - executes built queries and exposes the resource operations
//!
//! This module provides the `RedditorStore` struct that owns the connection
//! pool, bootstraps the tables, and runs the statements produced by
//! [`QueryBuilder`] for redditors and their subreddits.

use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::models::QueryOptions;
use crate::query::{QueryBuilder, QueryRequest, SqlQuery};
use crate::schema::{EntitySchema, SchemaRegistry};
use crate::sql::ddl::DdlGenerator;
use crate::types::{
    Command, CREATE_DATE_FIELD, DELETE_DATE_FIELD, EntityKind, FieldType, ID_FIELD, Record,
    UPDATE_DATE_FIELD,
};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Soft-delete CRUD store for redditors and subreddits
///
/// Every statement is produced by the [`QueryBuilder`] against the store's
/// [`SchemaRegistry`]; the store only binds values and decodes rows.
pub struct RedditorStore {
    /// Database connection pool
    pool: PgPool,
    /// Store configuration
    config: StoreConfig,
    /// Entity schemas used for building and binding
    registry: SchemaRegistry,
}

impl RedditorStore {
    /// Create a new RedditorStore from configuration
    ///
    /// This will:
    /// 1. Connect to the database
    /// 2. Create the tables and triggers if `create_tables` is enabled
    pub async fn new(config: StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("Database connection failed: {}", e)))?;

        Self::from_pool(pool, config).await
    }

    /// Create a new RedditorStore from an existing pool
    pub async fn from_pool(pool: PgPool, config: StoreConfig) -> Result<Self> {
        Self::from_pool_with_registry(pool, config, SchemaRegistry::standard()).await
    }

    /// Create a new RedditorStore from an existing pool and schema registry
    ///
    /// The registry drives statement building, value binding and the
    /// bootstrap DDL.
    pub async fn from_pool_with_registry(
        pool: PgPool,
        config: StoreConfig,
        registry: SchemaRegistry,
    ) -> Result<Self> {
        let store = Self {
            pool,
            config,
            registry,
        };

        if store.config.create_tables {
            store.initialize().await?;
        }

        Ok(store)
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get a reference to the schema registry
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Query builder bound to this store's registry
    pub fn query_builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.registry)
    }

    /// Create the trigger functions, tables and triggers
    ///
    /// Safe to run repeatedly: tables are created only if missing and the
    /// functions and triggers are replaced.
    pub async fn initialize(&self) -> Result<()> {
        let ddl = DdlGenerator::new(&self.config);
        let statements = ddl.generate_bootstrap(&self.registry);

        for statement in &statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::info!(statements = statements.len(), "initialized redditor store tables");

        Ok(())
    }

    /// Execute a built statement and return its rows
    ///
    /// Each value is bound with the SQL type of the column it was built
    /// against, and each returned column is decoded by its declared type.
    pub async fn execute(&self, query: &SqlQuery) -> Result<Vec<Record>> {
        let schema = self.registry.schema_for(query.entity);

        tracing::debug!(text = %query.text, values = ?query.values, "executing query");

        let mut statement = sqlx::query(&query.text);
        for (value, column) in query.values.iter().zip(&query.value_columns) {
            statement = Self::bind_value(statement, schema, column, value)?;
        }

        let rows = statement.fetch_all(&self.pool).await?;

        tracing::debug!(rows = rows.len(), entity = %query.entity, "query returned");

        Ok(rows
            .iter()
            .map(|row| Self::row_to_record(row, schema))
            .collect())
    }

    // =========================================================================
    // Redditor Operations
    // =========================================================================

    /// List redditors
    pub async fn list_redditors(&self, options: &QueryOptions) -> Result<Vec<Record>> {
        self.list(EntityKind::Redditors, options).await
    }

    /// Get a redditor by id
    pub async fn get_redditor(&self, id: &str, options: &QueryOptions) -> Result<Option<Record>> {
        self.get(EntityKind::Redditors, id, options).await
    }

    /// Create a redditor from a JSON object body
    pub async fn create_redditor(
        &self,
        body: serde_json::Value,
        options: &QueryOptions,
    ) -> Result<Record> {
        self.create(EntityKind::Redditors, Self::body_object(body)?, options)
            .await
    }

    /// Update a redditor with the fields present in `body`
    pub async fn update_redditor(
        &self,
        id: &str,
        body: serde_json::Value,
        options: &QueryOptions,
    ) -> Result<Record> {
        self.update(EntityKind::Redditors, id, Self::body_object(body)?, options)
            .await
    }

    /// Soft-delete a redditor and every subreddit they bookmarked
    ///
    /// The subreddits are stamped first. The two statements are independent,
    /// so a failure of the second leaves the subreddits deleted.
    pub async fn delete_redditor(&self, id: &str, options: &QueryOptions) -> Result<Record> {
        let cascade = QueryRequest::new()
            .command(Command::Delete)
            .entity(EntityKind::Subreddits)
            .base_object(Record::new())
            .patch_object(Record::new())
            .columns(Some(ID_FIELD))
            .filter("redditor_id", id);
        let deleted = self.run(cascade).await?;

        tracing::debug!(redditor_id = %id, subreddits = deleted.len(), "cascaded soft delete");

        self.soft_delete(EntityKind::Redditors, id, options).await
    }

    /// List the subreddits bookmarked by a redditor
    pub async fn list_redditor_subreddits(
        &self,
        redditor_id: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Record>> {
        let request =
            Self::read_request(EntityKind::Subreddits, options).filter("redditor_id", redditor_id);
        self.run(request).await
    }

    /// Bookmark a subreddit for a redditor
    ///
    /// `redditor_id` overrides any owner given in the body.
    pub async fn create_redditor_subreddit(
        &self,
        redditor_id: &str,
        body: serde_json::Value,
        options: &QueryOptions,
    ) -> Result<Record> {
        let mut patch = Self::body_object(body)?;
        patch.insert("redditor_id".to_string(), redditor_id.into());
        self.create(EntityKind::Subreddits, patch, options).await
    }

    // =========================================================================
    // Subreddit Operations
    // =========================================================================

    /// List subreddits
    pub async fn list_subreddits(&self, options: &QueryOptions) -> Result<Vec<Record>> {
        self.list(EntityKind::Subreddits, options).await
    }

    /// Get a subreddit by id
    pub async fn get_subreddit(&self, id: &str, options: &QueryOptions) -> Result<Option<Record>> {
        self.get(EntityKind::Subreddits, id, options).await
    }

    /// Create a subreddit from a JSON object body
    pub async fn create_subreddit(
        &self,
        body: serde_json::Value,
        options: &QueryOptions,
    ) -> Result<Record> {
        self.create(EntityKind::Subreddits, Self::body_object(body)?, options)
            .await
    }

    /// Update a subreddit with the fields present in `body`
    pub async fn update_subreddit(
        &self,
        id: &str,
        body: serde_json::Value,
        options: &QueryOptions,
    ) -> Result<Record> {
        self.update(EntityKind::Subreddits, id, Self::body_object(body)?, options)
            .await
    }

    /// Soft-delete a subreddit
    pub async fn delete_subreddit(&self, id: &str, options: &QueryOptions) -> Result<Record> {
        self.soft_delete(EntityKind::Subreddits, id, options).await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    async fn run(&self, request: QueryRequest) -> Result<Vec<Record>> {
        let query = self.query_builder().try_build(request)?;
        self.execute(&query).await
    }

    async fn list(&self, entity: EntityKind, options: &QueryOptions) -> Result<Vec<Record>> {
        self.run(Self::read_request(entity, options)).await
    }

    async fn get(
        &self,
        entity: EntityKind,
        id: &str,
        options: &QueryOptions,
    ) -> Result<Option<Record>> {
        let rows = self
            .run(Self::read_request(entity, options).filter(ID_FIELD, id))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn create(
        &self,
        entity: EntityKind,
        patch: Record,
        options: &QueryOptions,
    ) -> Result<Record> {
        let schema = self.schema(entity)?;
        Self::check_required(schema, &patch)?;

        let request = QueryRequest::new()
            .command(Command::Insert)
            .entity(entity)
            .base_object(schema.default_object())
            .patch_object(patch)
            .columns(options.columns.as_deref());

        self.run(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::database(format!("INSERT into {} returned no row", entity)))
    }

    async fn update(
        &self,
        entity: EntityKind,
        id: &str,
        patch: Record,
        options: &QueryOptions,
    ) -> Result<Record> {
        let mut base = self.schema(entity)?.default_object();
        base.insert(ID_FIELD.to_string(), id.into());

        let request = Self::write_request(Command::Update, entity, id, base, patch, options);

        self.run(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(format!("{} '{}'", entity, id)))
    }

    async fn soft_delete(
        &self,
        entity: EntityKind,
        id: &str,
        options: &QueryOptions,
    ) -> Result<Record> {
        let mut base = Record::new();
        base.insert(ID_FIELD.to_string(), id.into());

        let request =
            Self::write_request(Command::Delete, entity, id, base, Record::new(), options);

        self.run(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(format!("{} '{}'", entity, id)))
    }

    fn read_request(entity: EntityKind, options: &QueryOptions) -> QueryRequest {
        QueryRequest::new()
            .command(Command::Select)
            .entity(entity)
            .columns(options.columns.as_deref())
            .show_deleted(options.deleted.as_deref())
    }

    fn write_request(
        command: Command,
        entity: EntityKind,
        id: &str,
        base: Record,
        patch: Record,
        options: &QueryOptions,
    ) -> QueryRequest {
        QueryRequest::new()
            .command(command)
            .entity(entity)
            .base_object(base)
            .patch_object(patch)
            .filter(ID_FIELD, id)
            .columns(options.columns.as_deref())
            .show_deleted(options.deleted.as_deref())
    }

    fn schema(&self, entity: EntityKind) -> Result<&EntitySchema> {
        self.registry
            .schema_for(entity)
            .ok_or_else(|| StoreError::not_found(format!("No schema registered for '{}'", entity)))
    }

    fn body_object(body: serde_json::Value) -> Result<Record> {
        match body {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(StoreError::validation("Request body must be a JSON object")),
        }
    }

    /// Non-nullable fields the client must supply on create
    fn check_required(schema: &EntitySchema, patch: &Record) -> Result<()> {
        for field in &schema.fields {
            let server_assigned = field.primary_key
                || [CREATE_DATE_FIELD, UPDATE_DATE_FIELD, DELETE_DATE_FIELD]
                    .contains(&field.name.as_str());
            if field.nullable || server_assigned {
                continue;
            }

            match patch.get(&field.name) {
                None => {
                    return Err(StoreError::validation(format!(
                        "Required column '{}' is missing",
                        field.name
                    )));
                }
                Some(value) if value.is_null() => {
                    return Err(StoreError::validation(format!(
                        "Column '{}' does not allow NULL values",
                        field.name
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn row_to_record(row: &PgRow, schema: Option<&EntitySchema>) -> Record {
        row.columns()
            .iter()
            .map(|column| {
                let name = column.name();
                let field_type = schema.and_then(|s| s.field(name)).map(|f| f.field_type);
                let value = Self::extract_column_value(row, name, field_type)
                    .unwrap_or(serde_json::Value::Null);
                (name.to_string(), value)
            })
            .collect()
    }

    fn extract_column_value(
        row: &PgRow,
        name: &str,
        field_type: Option<FieldType>,
    ) -> Option<serde_json::Value> {
        match field_type {
            Some(FieldType::Text { .. }) => row
                .try_get::<Option<String>, _>(name)
                .ok()
                .flatten()
                .map(serde_json::Value::String),
            Some(FieldType::Boolean) => row
                .try_get::<Option<bool>, _>(name)
                .ok()
                .flatten()
                .map(serde_json::Value::Bool),
            Some(FieldType::EpochSeconds) => row
                .try_get::<Option<f64>, _>(name)
                .ok()
                .flatten()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number),
            // Undeclared column: try the shapes the tables actually use
            None => row
                .try_get::<Option<String>, _>(name)
                .ok()
                .flatten()
                .map(serde_json::Value::String)
                .or_else(|| {
                    row.try_get::<Option<bool>, _>(name)
                        .ok()
                        .flatten()
                        .map(serde_json::Value::Bool)
                })
                .or_else(|| {
                    row.try_get::<Option<f64>, _>(name)
                        .ok()
                        .flatten()
                        .and_then(serde_json::Number::from_f64)
                        .map(serde_json::Value::Number)
                }),
        }
    }

    fn bind_value<'q>(
        query: PgQuery<'q>,
        schema: Option<&EntitySchema>,
        column_name: &str,
        value: &'q serde_json::Value,
    ) -> Result<PgQuery<'q>> {
        let Some(field) = schema.and_then(|s| s.field(column_name)) else {
            return Ok(Self::bind_untyped(query, value));
        };

        if let Err(e) = field.field_type.validate_value(value) {
            return Err(StoreError::validation(format!(
                "Invalid value for column '{}': {}",
                column_name, e
            )));
        }

        if !field.nullable && value.is_null() {
            return Err(StoreError::validation(format!(
                "Column '{}' does not allow NULL values",
                column_name
            )));
        }

        Ok(match field.field_type {
            FieldType::Text { .. } => {
                if value.is_null() {
                    query.bind(None::<String>)
                } else {
                    query.bind(value.as_str().ok_or_else(|| {
                        StoreError::validation(format!(
                            "Column '{}' expected string",
                            column_name
                        ))
                    })?)
                }
            }
            FieldType::Boolean => {
                if value.is_null() {
                    query.bind(None::<bool>)
                } else {
                    let bool_val = value
                        .as_bool()
                        .or_else(|| {
                            value
                                .as_str()
                                .and_then(|s| match s.to_lowercase().as_str() {
                                    "true" | "1" | "yes" => Some(true),
                                    "false" | "0" | "no" => Some(false),
                                    _ => None,
                                })
                        })
                        .ok_or_else(|| {
                            StoreError::validation(format!(
                                "Column '{}' expected boolean",
                                column_name
                            ))
                        })?;
                    query.bind(bool_val)
                }
            }
            FieldType::EpochSeconds => {
                if value.is_null() {
                    query.bind(None::<f64>)
                } else {
                    let seconds = value
                        .as_f64()
                        .or_else(|| value.as_str().and_then(|s| s.parse::<f64>().ok()))
                        .ok_or_else(|| {
                            StoreError::validation(format!(
                                "Column '{}' expected epoch seconds",
                                column_name
                            ))
                        })?;
                    query.bind(seconds)
                }
            }
        })
    }

    fn bind_untyped<'q>(query: PgQuery<'q>, value: &'q serde_json::Value) -> PgQuery<'q> {
        match value {
            serde_json::Value::Null => query.bind(None::<String>),
            serde_json::Value::Bool(b) => query.bind(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            serde_json::Value::String(s) => query.bind(s.as_str()),
            other => query.bind(other),
        }
    }
}
