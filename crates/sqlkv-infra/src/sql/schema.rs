//! Per-namespace table descriptor.
//!
//! Every namespace table has the same two columns; only the table name
//! differs. A `TableSchema` renders the statements for one namespace once so
//! handles never format SQL on the hot path.

use sqlkv_types::storage::Namespace;

use super::dialect::Dialect;

/// Rendered SQL for one namespace table.
#[derive(Debug)]
pub struct TableSchema {
    namespace: Namespace,
    dialect: Dialect,
    table: String,
    pub(crate) create_sql: String,
    pub(crate) select_value_sql: String,
    pub(crate) upsert_sql: String,
    pub(crate) count_key_sql: String,
    pub(crate) delete_sql: String,
    pub(crate) count_sql: String,
    pub(crate) keys_sql: String,
}

impl TableSchema {
    pub fn new(namespace: Namespace, dialect: Dialect) -> Self {
        let table = dialect.quote_ident(namespace.as_str());
        let key = dialect.quote_ident("key");
        let value = dialect.quote_ident("value");
        let p1 = dialect.placeholder(1);

        Self {
            create_sql: dialect.create_table_sql(&table),
            select_value_sql: format!("SELECT {value} FROM {table} WHERE {key} = {p1}"),
            upsert_sql: dialect.upsert_sql(&table),
            count_key_sql: format!("SELECT COUNT(*) FROM {table} WHERE {key} = {p1}"),
            delete_sql: format!("DELETE FROM {table} WHERE {key} = {p1}"),
            count_sql: format!("SELECT COUNT(*) FROM {table}"),
            keys_sql: format!("SELECT {key} FROM {table} ORDER BY {key}"),
            namespace,
            dialect,
            table,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Quoted table name.
    pub fn table(&self) -> &str {
        &self.table
    }
}
