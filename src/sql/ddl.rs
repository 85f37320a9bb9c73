//! DDL generation for entity tables
//!
//! Generates the PostgreSQL statements that bootstrap the tables declared in
//! a [`SchemaRegistry`], including the trigger functions that maintain the
//! `create_date` / `update_date` bookkeeping columns in epoch seconds.

use crate::config::StoreConfig;
use crate::schema::{EntitySchema, SchemaRegistry};
use crate::types::{CREATE_DATE_FIELD, FieldDefinition, UPDATE_DATE_FIELD};

/// Trigger function stamping both timestamps on insert
pub const INSERT_TIMESTAMP_FUNCTION: &str = "dates_on_insert";
/// Trigger function refreshing `update_date` on update
pub const UPDATE_TIMESTAMP_FUNCTION: &str = "dates_on_update";

/// DDL generator for entity tables
pub struct DdlGenerator<'a> {
    config: &'a StoreConfig,
}

impl<'a> DdlGenerator<'a> {
    /// Create a new DDL generator with the given configuration
    pub fn new(config: &'a StoreConfig) -> Self {
        Self { config }
    }

    /// Every statement needed to bootstrap the registry's tables, in order
    pub fn generate_bootstrap(&self, registry: &SchemaRegistry) -> Vec<String> {
        let mut statements = self.generate_timestamp_functions();

        for schema in registry.schemas() {
            statements.push(self.generate_create_table(schema));
            statements.extend(self.generate_owner("TABLE", schema.table_name()));
            statements.extend(self.generate_triggers(schema));
        }

        statements
    }

    /// `CREATE OR REPLACE FUNCTION` statements for the timestamp triggers
    pub fn generate_timestamp_functions(&self) -> Vec<String> {
        let mut statements = vec![
            format!(
                "CREATE OR REPLACE FUNCTION {}() RETURNS trigger LANGUAGE plpgsql AS $BODY$\n\
                 BEGIN\n\
                 \tNEW.{} := EXTRACT(epoch FROM now());\n\
                 \tNEW.{} := EXTRACT(epoch FROM now());\n\
                 \tRETURN NEW;\n\
                 END;\n\
                 $BODY$",
                INSERT_TIMESTAMP_FUNCTION, CREATE_DATE_FIELD, UPDATE_DATE_FIELD
            ),
            format!(
                "CREATE OR REPLACE FUNCTION {}() RETURNS trigger LANGUAGE plpgsql AS $BODY$\n\
                 BEGIN\n\
                 \tNEW.{} := EXTRACT(epoch FROM now());\n\
                 \tRETURN NEW;\n\
                 END;\n\
                 $BODY$",
                UPDATE_TIMESTAMP_FUNCTION, UPDATE_DATE_FIELD
            ),
        ];

        statements.extend(
            self.generate_owner("FUNCTION", &format!("{}()", INSERT_TIMESTAMP_FUNCTION)),
        );
        statements.extend(
            self.generate_owner("FUNCTION", &format!("{}()", UPDATE_TIMESTAMP_FUNCTION)),
        );

        statements
    }

    /// `CREATE TABLE IF NOT EXISTS` with primary and foreign key constraints
    pub fn generate_create_table(&self, schema: &EntitySchema) -> String {
        let table = schema.table_name();

        let mut parts: Vec<String> = schema
            .fields
            .iter()
            .map(Self::format_field_definition)
            .collect();

        let primary_key: Vec<&str> = schema
            .fields
            .iter()
            .filter(|f| f.primary_key)
            .map(|f| f.name.as_str())
            .collect();
        if !primary_key.is_empty() {
            parts.push(format!(
                "CONSTRAINT {}_pkey PRIMARY KEY ({})",
                table,
                primary_key.join(", ")
            ));
        }

        for field in &schema.fields {
            if let Some(fk) = &field.references {
                parts.push(format!(
                    "CONSTRAINT {}_{}_fkey FOREIGN KEY ({}) REFERENCES {} ({})",
                    table, field.name, field.name, fk.table, fk.column
                ));
            }
        }

        format!("CREATE TABLE IF NOT EXISTS {} ({})", table, parts.join(", "))
    }

    /// Drop-and-create statements for the two timestamp triggers on a table
    pub fn generate_triggers(&self, schema: &EntitySchema) -> Vec<String> {
        let table = schema.table_name();

        [
            ("INSERT", INSERT_TIMESTAMP_FUNCTION),
            ("UPDATE", UPDATE_TIMESTAMP_FUNCTION),
        ]
        .into_iter()
        .flat_map(|(event, function)| {
            [
                format!("DROP TRIGGER IF EXISTS {} ON {}", function, table),
                format!(
                    "CREATE TRIGGER {} BEFORE {} ON {} FOR EACH ROW EXECUTE PROCEDURE {}()",
                    function, event, table, function
                ),
            ]
        })
        .collect()
    }

    /// `ALTER ... OWNER TO` when a table owner is configured
    fn generate_owner(&self, object_kind: &str, object_name: &str) -> Option<String> {
        self.config.table_owner.as_ref().map(|owner| {
            format!(
                "ALTER {} {} OWNER TO \"{}\"",
                object_kind,
                object_name,
                owner.replace('"', "\"\"")
            )
        })
    }

    /// Format a single field for CREATE TABLE
    pub fn format_field_definition(field: &FieldDefinition) -> String {
        let mut parts = vec![field.name.clone(), field.field_type.to_sql_type()];

        if !field.nullable {
            parts.push("NOT NULL".to_string());
        }

        parts.join(" ")
    }
}
