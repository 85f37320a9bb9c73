//! Entity schemas and the registry that maps entity kinds to them
//!
//! A schema lists an entity's fields in declared order together with the
//! values a fresh record starts from. The registry is an ordinary value that
//! is handed to the query builder and the store, not a global.

use std::collections::HashMap;

use crate::error::{Result, StoreError};
use crate::sql::sanitize::validate_identifier;
use crate::types::{
    BOOKKEEPING_FIELDS, CREATE_DATE_FIELD, DELETE_DATE_FIELD, EntityKind, FieldDefinition,
    ID_FIELD, Record, UPDATE_DATE_FIELD,
};

/// Canonical shape of an entity's table
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    /// Entity this schema describes
    pub kind: EntityKind,
    /// Fields in declared order
    pub fields: Vec<FieldDefinition>,
}

impl EntitySchema {
    /// Create a schema from its fields
    pub fn new(kind: EntityKind, fields: Vec<FieldDefinition>) -> Self {
        Self { kind, fields }
    }

    /// Table the entity is stored in
    pub fn table_name(&self) -> &'static str {
        self.kind.table_name()
    }

    /// Look up a declared field
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is a declared field
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Declared field names, in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// A fresh record holding every field's default value
    ///
    /// Each call generates a new `id`, and the returned map is owned by the
    /// caller, so it can be used as a merge target directly.
    pub fn default_object(&self) -> Record {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default.generate()))
            .collect()
    }

    /// Schema of the `redditors` table
    pub fn redditors() -> Self {
        Self::new(
            EntityKind::Redditors,
            vec![
                FieldDefinition::text("email_address", 30).not_null(),
                FieldDefinition::text("first_name", 40),
                FieldDefinition::text(ID_FIELD, 36)
                    .primary_key()
                    .generated_id(),
                FieldDefinition::text("last_name", 30),
                FieldDefinition::text("time_zone_identifier", 30),
                FieldDefinition::boolean("email_enabled").default(false),
                FieldDefinition::epoch_seconds(CREATE_DATE_FIELD)
                    .not_null()
                    .default(0),
                FieldDefinition::epoch_seconds(UPDATE_DATE_FIELD)
                    .not_null()
                    .default(0),
                FieldDefinition::epoch_seconds(DELETE_DATE_FIELD),
            ],
        )
    }

    /// Schema of the `subreddits` table
    pub fn subreddits() -> Self {
        Self::new(
            EntityKind::Subreddits,
            vec![
                FieldDefinition::text("description", 100),
                FieldDefinition::boolean("favorite").default(false),
                FieldDefinition::text(ID_FIELD, 36)
                    .primary_key()
                    .generated_id(),
                FieldDefinition::text("name", 50),
                FieldDefinition::text("redditor_id", 36)
                    .not_null()
                    .default("")
                    .references(EntityKind::Redditors.table_name(), ID_FIELD),
                FieldDefinition::text("subreddit", 50).not_null().default(""),
                FieldDefinition::epoch_seconds(CREATE_DATE_FIELD)
                    .not_null()
                    .default(0),
                FieldDefinition::epoch_seconds(UPDATE_DATE_FIELD)
                    .not_null()
                    .default(0),
                FieldDefinition::epoch_seconds(DELETE_DATE_FIELD),
            ],
        )
    }
}

/// Mapping from entity kind to schema
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<EntityKind, EntitySchema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Registry holding the built-in `redditors` and `subreddits` schemas
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for schema in [EntitySchema::redditors(), EntitySchema::subreddits()] {
            registry.schemas.insert(schema.kind, schema);
        }
        registry
    }

    /// Add or replace the schema for its kind
    ///
    /// Fails when a name is not a usable identifier, a field is declared
    /// twice, or a bookkeeping field is missing.
    pub fn register(&mut self, schema: EntitySchema) -> Result<()> {
        validate_identifier(schema.table_name()).map_err(StoreError::validation)?;

        for (i, field) in schema.fields.iter().enumerate() {
            validate_identifier(&field.name).map_err(StoreError::validation)?;

            if schema.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(StoreError::validation(format!(
                    "Field '{}' is declared more than once on '{}'",
                    field.name,
                    schema.table_name()
                )));
            }
        }

        for required in BOOKKEEPING_FIELDS {
            if !schema.has_field(required) {
                return Err(StoreError::validation(format!(
                    "Schema '{}' is missing bookkeeping field '{}'",
                    schema.table_name(),
                    required
                )));
            }
        }

        self.schemas.insert(schema.kind, schema);
        Ok(())
    }

    /// Schema for `kind`, if registered
    pub fn schema_for(&self, kind: EntityKind) -> Option<&EntitySchema> {
        self.schemas.get(&kind)
    }

    /// Fresh default record for `kind`, if registered
    pub fn default_object(&self, kind: EntityKind) -> Option<Record> {
        self.schema_for(kind).map(EntitySchema::default_object)
    }

    /// Registered schemas in bootstrap order
    pub fn schemas(&self) -> impl Iterator<Item = &EntitySchema> {
        EntityKind::ALL
            .into_iter()
            .filter_map(|kind| self.schemas.get(&kind))
    }
}
