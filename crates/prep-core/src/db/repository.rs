//! Entity repositories
//!
//! Every entity table stores the record's JSON snapshot in `data` next to a
//! handful of plain columns that back the secondary indexes.

use std::marker::PhantomData;

use libsql::params::Params;
use libsql::{Connection, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Bookmark, CompanyNote, Interview, Question};

/// An entity that can be stored in its own table
pub trait Record: Serialize + DeserializeOwned {
    /// Table name
    const TABLE: &'static str;
    /// Primary key column
    const KEY_COLUMN: &'static str;
    /// Index columns, in the order returned by [`Record::index_values`]
    const INDEX_COLUMNS: &'static [&'static str];
    /// Default `ORDER BY` clause for listings
    const ORDER_BY: &'static str;

    /// Primary key value
    fn key(&self) -> &str;

    /// Values for [`Record::INDEX_COLUMNS`]
    fn index_values(&self) -> Vec<Value>;
}

fn optional_text(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.clone()))
}

impl Record for Question {
    const TABLE: &'static str = "questions";
    const KEY_COLUMN: &'static str = "id";
    const INDEX_COLUMNS: &'static [&'static str] = &["kind", "company", "is_favorite", "created_at"];
    const ORDER_BY: &'static str = "created_at DESC";

    fn key(&self) -> &str {
        &self.id
    }

    fn index_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.kind.as_str().to_string()),
            optional_text(self.company.as_ref()),
            Value::Integer(i64::from(self.is_favorite)),
            Value::Integer(self.created_at),
        ]
    }
}

impl Record for Bookmark {
    const TABLE: &'static str = "bookmarks";
    const KEY_COLUMN: &'static str = "id";
    const INDEX_COLUMNS: &'static [&'static str] =
        &["resource_type", "category", "status", "created_at"];
    const ORDER_BY: &'static str = "created_at DESC";

    fn key(&self) -> &str {
        &self.id
    }

    fn index_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.resource_type.clone()),
            optional_text(self.category.as_ref()),
            Value::Text(self.status.as_str().to_string()),
            Value::Integer(self.created_at),
        ]
    }
}

impl Record for Interview {
    const TABLE: &'static str = "interviews";
    const KEY_COLUMN: &'static str = "id";
    const INDEX_COLUMNS: &'static [&'static str] = &["company", "date_time", "status", "created_at"];
    const ORDER_BY: &'static str = "date_time ASC";

    fn key(&self) -> &str {
        &self.id
    }

    fn index_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.company.clone()),
            Value::Integer(self.date_time),
            Value::Text(self.status.as_str().to_string()),
            Value::Integer(self.created_at),
        ]
    }
}

impl Record for CompanyNote {
    const TABLE: &'static str = "company_notes";
    const KEY_COLUMN: &'static str = "company";
    const INDEX_COLUMNS: &'static [&'static str] = &["updated_at"];
    const ORDER_BY: &'static str = "company ASC";

    fn key(&self) -> &str {
        &self.company
    }

    fn index_values(&self) -> Vec<Value> {
        vec![Value::Integer(self.updated_at)]
    }
}

/// libSQL-backed table of one record type
pub struct LibSqlTable<'a, T> {
    conn: &'a Connection,
    _record: PhantomData<T>,
}

impl<'a, T: Record> LibSqlTable<'a, T> {
    /// Create a table handle over the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    /// Insert or replace a record by key
    pub async fn put(&self, record: &T) -> Result<()> {
        let columns = T::INDEX_COLUMNS.join(", ");
        let placeholders = vec!["?"; T::INDEX_COLUMNS.len() + 2].join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}, {columns}, data) VALUES ({placeholders})",
            T::TABLE,
            T::KEY_COLUMN,
        );

        let mut values = Vec::with_capacity(T::INDEX_COLUMNS.len() + 2);
        values.push(Value::Text(record.key().to_string()));
        values.extend(record.index_values());
        values.push(Value::Text(serde_json::to_string(record)?));

        self.conn.execute(&sql, Params::Positional(values)).await?;
        Ok(())
    }

    /// Get a record by key
    pub async fn get(&self, key: &str) -> Result<Option<T>> {
        let mut records = self
            .select(
                &format!("WHERE {} = ?", T::KEY_COLUMN),
                vec![Value::Text(key.to_string())],
            )
            .await?;
        Ok(records.pop())
    }

    /// List every record in the table's default order
    pub async fn list(&self) -> Result<Vec<T>> {
        self.select(&format!("ORDER BY {}", T::ORDER_BY), Vec::new())
            .await
    }

    /// List records whose index `column` equals `value`
    ///
    /// `column` must be one of the table's own columns, never user input.
    pub async fn list_where(&self, column: &str, value: Value) -> Result<Vec<T>> {
        self.select(
            &format!("WHERE {column} = ? ORDER BY {}", T::ORDER_BY),
            vec![value],
        )
        .await
    }

    /// Delete a record by key, returning whether a row was removed
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", T::TABLE, T::KEY_COLUMN);
        let rows = self.conn.execute(&sql, [key]).await?;
        Ok(rows > 0)
    }

    /// Count rows in the table
    pub async fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let mut rows = self.conn.query(&sql, ()).await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Run `SELECT data FROM <table> <clause>` and decode each row
    pub async fn select(&self, clause: &str, params: Vec<Value>) -> Result<Vec<T>> {
        let sql = format!("SELECT data FROM {} {clause}", T::TABLE);
        let mut rows = self.conn.query(&sql, Params::Positional(params)).await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            let data: String = row.get(0)?;
            records.push(serde_json::from_str(&data)?);
        }
        Ok(records)
    }

    /// Distinct non-null values of an index column, sorted ascending
    pub async fn distinct(&self, column: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {column} FROM {} WHERE {column} IS NOT NULL ORDER BY {column} ASC",
            T::TABLE
        );
        let mut rows = self.conn.query(&sql, ()).await?;

        let mut values = Vec::new();
        while let Some(row) = rows.next().await? {
            values.push(row.get::<String>(0)?);
        }
        Ok(values)
    }
}
