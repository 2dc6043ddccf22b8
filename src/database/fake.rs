//! Scripted in-memory session used by unit tests.

use super::core::*;
use super::error::{DatabaseError, DatabaseResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
pub struct FakeState {
    pub role: String,
    pub roles: Vec<String>,
    pub databases: Vec<String>,
    pub schemas: HashMap<String, Vec<String>>,
    pub tables: HashMap<(String, String), Vec<String>>,
    pub data: HashMap<TableRef, (Vec<ColumnInfo>, Vec<Vec<CellValue>>)>,
    /// Every catalog query in the order it reached the session
    pub calls: Vec<String>,
    /// Operations that fail with a query error, by trait method name
    pub failing: HashSet<&'static str>,
    /// Roles the session refuses to switch to
    pub forbidden_roles: HashSet<String>,
    snapshot: Option<HashMap<TableRef, (Vec<ColumnInfo>, Vec<Vec<CellValue>>)>>,
}

impl FakeState {
    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(operation)).count()
    }

    pub fn rows(&self, target: &TableRef) -> Vec<Vec<CellValue>> {
        self.data
            .get(target)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default()
    }
}

#[derive(Clone, Default)]
pub struct FakeConnection {
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnection {
    /// A small catalog: roles ACCOUNTADMIN and ANALYST, databases ANALYTICS and
    /// SNOWFLAKE, schemas PUBLIC/STAGING/INFORMATION_SCHEMA, one ORDERS table.
    pub fn analytics() -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state();
            state.role = "ACCOUNTADMIN".to_string();
            state.roles = vec!["ACCOUNTADMIN".to_string(), "ANALYST".to_string()];
            state.databases = vec!["ANALYTICS".to_string(), "SNOWFLAKE".to_string()];
            state.schemas.insert(
                "ANALYTICS".to_string(),
                vec![
                    "PUBLIC".to_string(),
                    "STAGING".to_string(),
                    "INFORMATION_SCHEMA".to_string(),
                ],
            );
            state.tables.insert(
                ("ANALYTICS".to_string(), "PUBLIC".to_string()),
                vec!["ORDERS".to_string(), "CUSTOMERS".to_string()],
            );
            state.tables.insert(
                ("ANALYTICS".to_string(), "STAGING".to_string()),
                vec!["RAW_ORDERS".to_string()],
            );
            state.data.insert(
                TableRef::new("ANALYTICS", "PUBLIC", "ORDERS"),
                (
                    vec![
                        ColumnInfo::new("ID", "NUMBER", false),
                        ColumnInfo::new("ITEM", "VARCHAR", false),
                        ColumnInfo::new("NOTE", "VARCHAR", true),
                    ],
                    vec![
                        vec![Some("1".into()), Some("lamp".into()), None],
                        vec![Some("2".into()), Some("desk".into()), Some("oak".into())],
                        vec![Some("3".into()), Some("chair".into()), None],
                    ],
                ),
            );
        }
        fake
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }

    fn check(&self, operation: &'static str) -> DatabaseResult<()> {
        if self.state().failing.contains(operation) {
            Err(DatabaseError::QueryError(format!("{} failed", operation)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DatabaseConnection for FakeConnection {
    async fn connect(&mut self) -> DatabaseResult<()> {
        Ok(())
    }

    async fn disconnect(&mut self) -> DatabaseResult<()> {
        Ok(())
    }

    async fn current_role(&self) -> DatabaseResult<String> {
        Ok(self.state().role.clone())
    }

    async fn use_role(&self, role: &str) -> DatabaseResult<()> {
        let mut state = self.state();
        if state.forbidden_roles.contains(role) || !state.roles.iter().any(|r| r == role) {
            return Err(DatabaseError::PermissionError(format!(
                "role {} is not granted",
                role
            )));
        }
        state.role = role.to_string();
        Ok(())
    }

    async fn list_roles(&self) -> DatabaseResult<Vec<String>> {
        self.record("list_roles".to_string());
        self.check("list_roles")?;
        Ok(self.state().roles.clone())
    }

    async fn list_databases(&self) -> DatabaseResult<Vec<String>> {
        self.record("list_databases".to_string());
        self.check("list_databases")?;
        Ok(self.state().databases.clone())
    }

    async fn list_schemas(&self, database: &str) -> DatabaseResult<Vec<String>> {
        self.record(format!("list_schemas {}", database));
        self.check("list_schemas")?;
        Ok(self
            .state()
            .schemas
            .get(database)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_tables(&self, database: &str, schema: &str) -> DatabaseResult<Vec<String>> {
        self.record(format!("list_tables {}.{}", database, schema));
        self.check("list_tables")?;
        Ok(self
            .state()
            .tables
            .get(&(database.to_string(), schema.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_columns(&self, target: &TableRef) -> DatabaseResult<Vec<ColumnInfo>> {
        self.check("get_columns")?;
        Ok(self
            .state()
            .data
            .get(target)
            .map(|(columns, _)| columns.clone())
            .unwrap_or_default())
    }

    async fn fetch_table_data(&self, target: &TableRef) -> DatabaseResult<QueryResult> {
        self.check("fetch_table_data")?;
        let state = self.state();
        let (columns, rows) = state
            .data
            .get(target)
            .ok_or_else(|| DatabaseError::NotFound(target.to_string()))?;
        Ok(QueryResult {
            columns: columns.iter().map(|c| c.name.clone()).collect(),
            rows: rows.clone(),
            kinds: Vec::new(),
            affected_rows: rows.len() as u64,
        })
    }

    async fn truncate_table(&self, target: &TableRef) -> DatabaseResult<()> {
        self.check("truncate_table")?;
        if let Some((_, rows)) = self.state().data.get_mut(target) {
            rows.clear();
        }
        Ok(())
    }

    async fn insert_rows(&self, target: &TableRef, batch: &RowBatch) -> DatabaseResult<u64> {
        self.check("insert_rows")?;
        let mut state = self.state();
        let (columns, existing) = state
            .data
            .get_mut(target)
            .ok_or_else(|| DatabaseError::NotFound(target.to_string()))?;

        if let Some(column) = columns
            .iter()
            .find(|c| c.is_generated && batch.columns.contains(&c.name))
        {
            return Err(DatabaseError::QueryError(format!(
                "cannot insert into generated column {}",
                column.name
            )));
        }

        let mut stored = Vec::with_capacity(batch.len());
        for row in &batch.rows {
            let full: Vec<CellValue> = columns
                .iter()
                .map(|column| {
                    batch
                        .columns
                        .iter()
                        .position(|name| name == &column.name)
                        .and_then(|i| row.get(i).cloned())
                        .flatten()
                })
                .collect();
            let violates = columns
                .iter()
                .zip(full.iter())
                .any(|(column, cell)| !column.is_nullable && !column.is_generated && cell.is_none());
            if violates {
                return Err(DatabaseError::QueryError(
                    "NULL result in a non-nullable column".to_string(),
                ));
            }
            stored.push(full);
        }
        existing.extend(stored);
        Ok(batch.len() as u64)
    }

    async fn execute_batch(&self, _database: &str, sql: &str) -> DatabaseResult<()> {
        let mut state = self.state();
        match sql.trim() {
            "BEGIN" => state.snapshot = Some(state.data.clone()),
            "COMMIT" => state.snapshot = None,
            "ROLLBACK" => {
                if let Some(snapshot) = state.snapshot.take() {
                    state.data = snapshot;
                }
            }
            other => {
                return Err(DatabaseError::ValidationError(format!(
                    "unsupported statement: {}",
                    other
                )))
            }
        }
        Ok(())
    }
}
