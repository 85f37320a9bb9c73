//! Core type definitions
//!
//! Includes entity kinds, commands, field types and field definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A record as seen by the query builder and returned by the store
///
/// Field order is preserved, so a schema default object keeps the schema's
/// declared order through merging.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Primary key field present on every entity
pub const ID_FIELD: &str = "id";
/// Epoch seconds at insert, maintained by a database trigger
pub const CREATE_DATE_FIELD: &str = "create_date";
/// Epoch seconds at last update, maintained by a database trigger
pub const UPDATE_DATE_FIELD: &str = "update_date";
/// Epoch seconds of the soft delete, `NULL` while the row is live
pub const DELETE_DATE_FIELD: &str = "delete_date";

/// Bookkeeping fields every entity schema must declare
pub const BOOKKEEPING_FIELDS: [&str; 4] = [
    ID_FIELD,
    CREATE_DATE_FIELD,
    UPDATE_DATE_FIELD,
    DELETE_DATE_FIELD,
];

// ============================================================================
// Entity Kinds and Commands
// ============================================================================

/// Resource kinds backed by a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Users who bookmark feeds
    Redditors,
    /// Feeds bookmarked by a redditor
    Subreddits,
}

impl EntityKind {
    /// All known kinds, in bootstrap order (referenced tables first)
    pub const ALL: [EntityKind; 2] = [EntityKind::Redditors, EntityKind::Subreddits];

    /// Database table name for this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Redditors => "redditors",
            EntityKind::Subreddits => "subreddits",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redditors" => Ok(EntityKind::Redditors),
            "subreddits" => Ok(EntityKind::Subreddits),
            other => Err(format!("Unknown entity '{}'", other)),
        }
    }
}

/// Abstract statement kinds understood by the query builder
///
/// `Delete` never removes rows. It is rendered as an `UPDATE` that stamps
/// `delete_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    Select,
    Insert,
    Update,
    Delete,
}

impl Command {
    /// Keyword as it appears in the statement text
    pub fn as_sql(&self) -> &'static str {
        match self {
            Command::Select => "SELECT",
            Command::Insert => "INSERT",
            Command::Update | Command::Delete => "UPDATE",
        }
    }

    /// Whether the command writes rows and therefore needs base and patch objects
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Command::Select)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Select => "SELECT",
            Command::Insert => "INSERT",
            Command::Update => "UPDATE",
            Command::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Single-column equality filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub value: serde_json::Value,
}

impl Condition {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Field Definitions
// ============================================================================

/// SQL type of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// Bounded text (maps to `character varying(n)`)
    Text { max_length: u16 },

    /// Boolean flag (maps to `boolean`)
    Boolean,

    /// Seconds since the Unix epoch (maps to `double precision`)
    EpochSeconds,
}

impl FieldType {
    /// PostgreSQL type name
    pub fn to_sql_type(&self) -> String {
        match self {
            FieldType::Text { max_length } => format!("character varying({})", max_length),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::EpochSeconds => "double precision".to_string(),
        }
    }

    /// Check that a JSON value can be bound to this field
    pub fn validate_value(&self, value: &serde_json::Value) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }

        match (self, value) {
            (FieldType::Text { max_length }, serde_json::Value::String(s)) => {
                if s.chars().count() > usize::from(*max_length) {
                    Err(format!(
                        "Value is {} characters long, limit is {}",
                        s.chars().count(),
                        max_length
                    ))
                } else {
                    Ok(())
                }
            }
            (FieldType::Boolean, serde_json::Value::Bool(_)) => Ok(()),
            (FieldType::Boolean, serde_json::Value::String(s)) => {
                match s.to_lowercase().as_str() {
                    "true" | "false" | "1" | "0" | "yes" | "no" => Ok(()),
                    _ => Err(format!("Cannot convert '{}' to boolean", s)),
                }
            }
            (FieldType::EpochSeconds, serde_json::Value::Number(_)) => Ok(()),
            (FieldType::EpochSeconds, serde_json::Value::String(s)) => s
                .parse::<f64>()
                .map(|_| ())
                .map_err(|_| format!("Cannot convert '{}' to epoch seconds", s)),
            _ => Err(format!("Type mismatch: expected {:?}, got {}", self, value)),
        }
    }
}

/// Value a field takes in a fresh default object
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    /// A fixed JSON value
    Value(serde_json::Value),
    /// A newly generated UUID v4 string, different on every call
    GeneratedId,
}

impl FieldDefault {
    /// Produce the default value
    pub fn generate(&self) -> serde_json::Value {
        match self {
            FieldDefault::Value(value) => value.clone(),
            FieldDefault::GeneratedId => {
                serde_json::Value::String(uuid::Uuid::new_v4().to_string())
            }
        }
    }
}

/// Foreign key target of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// Declared field of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Column name (must be a valid PostgreSQL identifier)
    pub name: String,

    /// SQL type
    pub field_type: FieldType,

    /// Whether the column allows NULL values (default: true)
    pub nullable: bool,

    /// Whether the column is the table's primary key (default: false)
    pub primary_key: bool,

    /// Value in a fresh default object (default: null)
    pub default: FieldDefault,

    /// Referenced table and column, if any
    pub references: Option<ForeignKey>,
}

impl FieldDefinition {
    /// Create a nullable field with a `null` default
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
            primary_key: false,
            default: FieldDefault::Value(serde_json::Value::Null),
            references: None,
        }
    }

    /// Bounded text field
    pub fn text(name: impl Into<String>, max_length: u16) -> Self {
        Self::new(name, FieldType::Text { max_length })
    }

    /// Boolean field
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Epoch-seconds timestamp field
    pub fn epoch_seconds(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::EpochSeconds)
    }

    /// Set the field as non-nullable
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the field as the primary key (implies non-nullable)
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Set a fixed default value
    pub fn default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Default to a freshly generated UUID
    pub fn generated_id(mut self) -> Self {
        self.default = FieldDefault::GeneratedId;
        self
    }

    /// Reference a column of another table
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}
