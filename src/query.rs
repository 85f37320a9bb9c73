//! Schema-aware statement construction
//!
//! A [`QueryRequest`] is assembled by chaining setters, then handed by value
//! to [`QueryBuilder::build`], which renders one parameterized statement and
//! its values without touching the database.
//!
//! ```
//! use redditor_store::{Command, EntityKind, QueryBuilder, QueryRequest, SchemaRegistry};
//!
//! let registry = SchemaRegistry::standard();
//! let builder = QueryBuilder::new(&registry);
//!
//! let query = builder
//!     .build(
//!         QueryRequest::new()
//!             .command(Command::Select)
//!             .entity(EntityKind::Subreddits)
//!             .columns(Some("id,subreddit"))
//!             .filter("redditor_id", "8d0f"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     query.text,
//!     "SELECT id,subreddit FROM subreddits WHERE redditor_id=$1 AND delete_date IS NULL"
//! );
//! assert_eq!(query.values, vec![serde_json::json!("8d0f")]);
//! ```

use serde::Serialize;

use crate::error::BuildError;
use crate::schema::{EntitySchema, SchemaRegistry};
use crate::sql::params::SqlWriter;
use crate::types::{
    Command, Condition, CREATE_DATE_FIELD, DELETE_DATE_FIELD, EntityKind, ID_FIELD, Record,
    UPDATE_DATE_FIELD,
};

/// Fields the database assigns; never taken from a base object
const SERVER_ASSIGNED_FIELDS: [&str; 3] = [CREATE_DATE_FIELD, UPDATE_DATE_FIELD, DELETE_DATE_FIELD];

/// Server clock in epoch seconds, used to stamp soft deletes
const EPOCH_NOW: &str = "EXTRACT(epoch FROM NOW())";

/// Value of the show-deleted flag that includes soft-deleted rows
const SHOW_DELETED: &str = "true";

/// Accumulated configuration for one statement
///
/// Every setter consumes the request and returns it, so a request is built
/// once per logical operation and cannot be shared half-configured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    command: Option<Command>,
    entity: Option<EntityKind>,
    base_object: Option<Record>,
    patch_object: Option<Record>,
    columns: Option<String>,
    condition: Option<Condition>,
    show_deleted: Option<String>,
}

impl QueryRequest {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the statement kind
    pub fn command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Set the entity the statement targets
    pub fn entity(mut self, entity: EntityKind) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Comma-separated column whitelist for the projection / `RETURNING` list
    pub fn columns(mut self, columns: Option<&str>) -> Self {
        self.columns = columns.map(str::to_string);
        self
    }

    /// Soft-delete visibility; exactly `"true"` includes deleted rows
    pub fn show_deleted(mut self, flag: Option<&str>) -> Self {
        self.show_deleted = flag.map(str::to_string);
        self
    }

    /// Record the write is merged into (usually a schema default object)
    pub fn base_object(mut self, base: Record) -> Self {
        self.base_object = Some(base);
        self
    }

    /// Caller-supplied values that override the base object
    pub fn patch_object(mut self, patch: Record) -> Self {
        self.patch_object = Some(patch);
        self
    }

    /// Set or clear the equality filter
    pub fn condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition;
        self
    }

    /// Filter on `column = value`
    pub fn filter(self, column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.condition(Some(Condition::eq(column, value)))
    }

    /// Clear every setting
    pub fn reset(self) -> Self {
        Self::default()
    }
}

/// A rendered statement ready for execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    /// Statement text with `$1..$n` placeholders
    pub text: String,
    /// Values in placeholder order
    pub values: Vec<serde_json::Value>,
    /// Column each value is bound against, parallel to `values`
    #[serde(skip)]
    pub value_columns: Vec<String>,
    /// Entity the statement targets
    #[serde(skip)]
    pub entity: EntityKind,
}

/// Renders [`QueryRequest`]s against a schema registry
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> QueryBuilder<'a> {
    /// Create a builder that resolves schemas through `registry`
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Build the statement, or `None` when the request is incomplete
    ///
    /// Returns `None` when the command or entity is unset, or when a write
    /// command lacks its base or patch object.
    pub fn build(&self, request: QueryRequest) -> Option<SqlQuery> {
        match self.try_build(request) {
            Ok(query) => Some(query),
            Err(e) => {
                tracing::debug!(reason = %e, "query request produced no statement");
                None
            }
        }
    }

    /// Build the statement, reporting why an incomplete request failed
    pub fn try_build(&self, request: QueryRequest) -> Result<SqlQuery, BuildError> {
        let command = request
            .command
            .ok_or(BuildError::ConfigurationIncomplete("command"))?;
        let entity = request
            .entity
            .ok_or(BuildError::ConfigurationIncomplete("entity"))?;

        let schema = self.registry.schema_for(entity);
        let columns = resolve_columns(schema, request.columns.as_deref());
        let table = entity.table_name();

        let mut sql = SqlWriter::new();
        sql.push_str(command.as_sql());

        match command {
            Command::Select => {
                sql.push_str(" ").push_str(&columns).push_str(" FROM ").push_str(table);
            }
            Command::Insert | Command::Update | Command::Delete => {
                let (Some(base), Some(patch)) = (request.base_object, request.patch_object)
                else {
                    return Err(BuildError::MissingOperands(command));
                };

                let merged = merge_objects(base, patch);

                if command == Command::Insert {
                    if merged.is_empty() {
                        return Err(BuildError::MissingOperands(command));
                    }
                    sql.push_str(" INTO ").push_str(table).push_str(" (");
                    push_field_list(&mut sql, &merged, None);
                    sql.push_str(") VALUES (");
                    push_value_list(&mut sql, merged, None);
                    sql.push_str(")");
                } else {
                    let stamp = (command == Command::Delete).then_some(EPOCH_NOW);
                    let set_len = merged.len() + usize::from(stamp.is_some());
                    if set_len == 0 {
                        return Err(BuildError::MissingOperands(command));
                    }

                    sql.push_str(" ").push_str(table).push_str(" SET (");
                    push_field_list(&mut sql, &merged, stamp.map(|_| DELETE_DATE_FIELD));
                    // PostgreSQL only accepts a one-element list as an explicit ROW
                    sql.push_str(if set_len == 1 { ") = ROW(" } else { ") = (" });
                    push_value_list(&mut sql, merged, stamp);
                    sql.push_str(")");
                }
            }
        }

        if command != Command::Insert {
            let filter = request.condition.filter(|c| {
                let known = schema.is_some_and(|s| s.has_field(&c.column));
                if !known {
                    tracing::debug!(
                        entity = %entity,
                        column = %c.column,
                        "ignoring filter on undeclared column"
                    );
                }
                known
            });
            let hide_deleted = request.show_deleted.as_deref() != Some(SHOW_DELETED);

            match (filter, hide_deleted) {
                (Some(c), true) => {
                    sql.push_str(" WHERE ")
                        .push_str(&c.column)
                        .push_str("=")
                        .push_param(&c.column, c.value)
                        .push_str(" AND ")
                        .push_str(DELETE_DATE_FIELD)
                        .push_str(" IS NULL");
                }
                (Some(c), false) => {
                    sql.push_str(" WHERE ")
                        .push_str(&c.column)
                        .push_str("=")
                        .push_param(&c.column, c.value);
                }
                (None, true) => {
                    sql.push_str(" WHERE ")
                        .push_str(DELETE_DATE_FIELD)
                        .push_str(" IS NULL");
                }
                (None, false) => {}
            }
        }

        if command.is_mutation() {
            sql.push_str(" RETURNING ").push_str(&columns);
        }

        let rendered = sql.render();
        let query = SqlQuery {
            text: rendered.text,
            values: rendered.values,
            value_columns: rendered.value_columns,
            entity,
        };

        tracing::debug!(text = %query.text, values = ?query.values, "built query");

        Ok(query)
    }

    /// Whitelist a comma-separated column list against `entity`'s schema
    pub fn resolve_columns(&self, entity: EntityKind, columns: Option<&str>) -> String {
        resolve_columns(self.registry.schema_for(entity), columns)
    }
}

/// Keep requested names that the schema declares, in schema order
///
/// Anything that leaves no usable column (no list, no schema, no matches)
/// selects every column.
fn resolve_columns(schema: Option<&EntitySchema>, columns: Option<&str>) -> String {
    let (Some(schema), Some(columns)) = (schema, columns) else {
        return "*".to_string();
    };

    let requested: Vec<&str> = columns.split(',').map(str::trim).collect();
    let selected: Vec<&str> = schema
        .field_names()
        .filter(|name| requested.contains(name))
        .collect();

    if selected.is_empty() {
        "*".to_string()
    } else {
        selected.join(",")
    }
}

/// Overlay `patch` on `base`
///
/// The patch cannot supply `id`, and the base loses its server-assigned
/// timestamps. Remaining base fields take the patch value when the patch has
/// one; otherwise they are dropped, except `id`, which keeps the base value.
fn merge_objects(base: Record, mut patch: Record) -> Record {
    patch.remove(ID_FIELD);

    base.into_iter()
        .filter(|(key, _)| !SERVER_ASSIGNED_FIELDS.contains(&key.as_str()))
        .filter_map(|(key, base_value)| match patch.remove(&key) {
            Some(value) => Some((key, value)),
            None if key == ID_FIELD => Some((key, base_value)),
            None => None,
        })
        .collect()
}

fn push_field_list(sql: &mut SqlWriter, fields: &Record, extra: Option<&str>) {
    let mut names: Vec<&str> = fields.keys().map(String::as_str).collect();
    names.extend(extra);
    sql.push_str(&names.join(","));
}

fn push_value_list(sql: &mut SqlWriter, fields: Record, extra: Option<&str>) {
    let mut first = true;
    for (column, value) in fields {
        if !first {
            sql.push_str(",");
        }
        sql.push_param(&column, value);
        first = false;
    }
    if let Some(expr) = extra {
        if !first {
            sql.push_str(",");
        }
        sql.push_str(expr);
    }
}
