use super::core::*;
use super::error::{DatabaseError, DatabaseResult};
use crate::logging;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls};

const FALLBACK_DATABASE: &str = "postgres";

/// A Postgres session is bound to one database, so browsing another database
/// opens a second client with the same credentials. The active role is applied
/// to every client, including ones opened after the switch.
pub struct PostgresConnection {
    config: super::ConnectionConfig,
    clients: Mutex<HashMap<String, Arc<Client>>>,
    active_role: Mutex<Option<String>>,
}

impl PostgresConnection {
    pub fn new(config: super::ConnectionConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
            active_role: Mutex::new(None),
        }
    }

    fn default_database(&self) -> &str {
        self.config
            .default_database
            .as_deref()
            .unwrap_or(FALLBACK_DATABASE)
    }

    async fn open_client(&self, database: &str) -> DatabaseResult<Client> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.config.host)
            .port(self.config.port)
            .user(&self.config.username)
            .password(self.config.password.as_deref().unwrap_or(""))
            .dbname(database);

        let (client, connection) = config.connect(NoTls).await?;

        let label = format!("{}/{}", self.config.name, database);
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                logging::error(&format!("Connection error on {}: {}", label, e));
            }
        });
        Ok(client)
    }

    async fn client_for(&self, database: &str) -> DatabaseResult<Arc<Client>> {
        let mut clients = self.clients.lock().await;
        if clients.is_empty() {
            return Err(DatabaseError::not_connected());
        }
        if let Some(client) = clients.get(database) {
            return Ok(Arc::clone(client));
        }

        logging::debug(&format!("Opening session for database {}", database));
        let client = self.open_client(database).await?;
        if let Some(role) = self.active_role.lock().await.as_deref() {
            client
                .batch_execute(&format!("SET ROLE {}", quote_identifier(role)))
                .await?;
        }
        let client = Arc::new(client);
        clients.insert(database.to_string(), Arc::clone(&client));
        Ok(client)
    }

    async fn default_client(&self) -> DatabaseResult<Arc<Client>> {
        self.client_for(self.default_database()).await
    }

    async fn query_names(
        client: &Client,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> DatabaseResult<Vec<String>> {
        let rows = client.query(sql, params).await?;
        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }
}

fn qualified_name(target: &TableRef) -> String {
    format!(
        "{}.{}",
        quote_identifier(&target.schema),
        quote_identifier(&target.table)
    )
}

#[async_trait]
impl DatabaseConnection for PostgresConnection {
    async fn connect(&mut self) -> DatabaseResult<()> {
        let database = self.default_database().to_string();
        let client = self.open_client(&database).await?;
        self.clients
            .lock()
            .await
            .insert(database, Arc::new(client));
        Ok(())
    }

    async fn disconnect(&mut self) -> DatabaseResult<()> {
        self.clients.lock().await.clear();
        *self.active_role.lock().await = None;
        Ok(())
    }

    async fn current_role(&self) -> DatabaseResult<String> {
        let client = self.default_client().await?;
        let row = client.query_one("SELECT current_user::text", &[]).await?;
        Ok(row.get::<_, String>(0))
    }

    async fn use_role(&self, role: &str) -> DatabaseResult<()> {
        let statement = format!("SET ROLE {}", quote_identifier(role));

        // The default session decides success; the others follow it.
        let default = self.default_client().await?;
        default.batch_execute(&statement).await?;

        let others: Vec<(String, Arc<Client>)> = self
            .clients
            .lock()
            .await
            .iter()
            .filter(|(name, _)| name.as_str() != self.default_database())
            .map(|(name, client)| (name.clone(), Arc::clone(client)))
            .collect();
        for (name, client) in others {
            if let Err(e) = client.batch_execute(&statement).await {
                logging::warn(&format!(
                    "Dropping session for {} after failed role switch: {}",
                    name, e
                ));
                self.clients.lock().await.remove(&name);
            }
        }

        *self.active_role.lock().await = Some(role.to_string());
        Ok(())
    }

    async fn list_roles(&self) -> DatabaseResult<Vec<String>> {
        let client = self.default_client().await?;
        Self::query_names(
            &client,
            "SELECT rolname::text FROM pg_roles
             WHERE rolname NOT LIKE 'pg\\_%'
             ORDER BY rolname",
            &[],
        )
        .await
    }

    async fn list_databases(&self) -> DatabaseResult<Vec<String>> {
        let client = self.default_client().await?;
        Self::query_names(
            &client,
            "SELECT datname::text FROM pg_database
             WHERE datistemplate = false AND datallowconn
             ORDER BY datname",
            &[],
        )
        .await
    }

    async fn list_schemas(&self, database: &str) -> DatabaseResult<Vec<String>> {
        let client = self.client_for(database).await?;
        Self::query_names(
            &client,
            "SELECT schema_name::text
             FROM information_schema.schemata
             WHERE schema_name NOT LIKE 'pg\\_%'
             ORDER BY schema_name",
            &[],
        )
        .await
    }

    async fn list_tables(&self, database: &str, schema: &str) -> DatabaseResult<Vec<String>> {
        let client = self.client_for(database).await?;
        Self::query_names(
            &client,
            "SELECT table_name::text
             FROM information_schema.tables
             WHERE table_schema = $1
             AND table_type = 'BASE TABLE'
             ORDER BY table_name",
            &[&schema],
        )
        .await
    }

    async fn get_columns(&self, target: &TableRef) -> DatabaseResult<Vec<ColumnInfo>> {
        let client = self.client_for(&target.database).await?;
        let rows = client
            .query(
                "SELECT column_name::text, data_type::text, (is_nullable = 'YES'),
                        (is_generated = 'ALWAYS')
                 FROM information_schema.columns
                 WHERE table_schema = $1 AND table_name = $2
                 ORDER BY ordinal_position",
                &[&target.schema, &target.table],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| ColumnInfo {
                name: row.get(0),
                data_type: row.get(1),
                is_nullable: row.get(2),
                is_generated: row.get(3),
            })
            .collect())
    }

    async fn fetch_table_data(&self, target: &TableRef) -> DatabaseResult<QueryResult> {
        let columns = self.get_columns(target).await?;
        if columns.is_empty() {
            return Err(DatabaseError::NotFound(format!(
                "table {} does not exist or has no visible columns",
                target
            )));
        }

        // Every column is read as text so enums, numerics, json and uuids survive
        // a load/save round trip unchanged.
        let select_list = columns
            .iter()
            .map(|c| {
                let ident = quote_identifier(&c.name);
                format!("({})::text AS {}", ident, ident)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!("SELECT {} FROM {}", select_list, qualified_name(target));
        logging::debug(&format!("Executing query: {}", query));

        let client = self.client_for(&target.database).await?;
        let rows = client.query(&query, &[]).await?;
        let result_rows: Vec<Vec<CellValue>> = rows
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| row.get::<_, Option<String>>(i))
                    .collect()
            })
            .collect();

        Ok(QueryResult {
            columns: columns.into_iter().map(|c| c.name).collect(),
            kinds: Vec::new(),
            affected_rows: result_rows.len() as u64,
            rows: result_rows,
        })
    }

    async fn truncate_table(&self, target: &TableRef) -> DatabaseResult<()> {
        let client = self.client_for(&target.database).await?;
        let statement = format!("TRUNCATE TABLE {}", qualified_name(target));
        logging::debug(&format!("Executing: {}", statement));
        client.batch_execute(&statement).await?;
        Ok(())
    }

    async fn insert_rows(&self, target: &TableRef, batch: &RowBatch) -> DatabaseResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let client = self.client_for(&target.database).await?;
        // Identity columns declared GENERATED ALWAYS keep their saved values.
        let statement = build_insert_statement(
            &qualified_name(target),
            batch,
            Some("OVERRIDING SYSTEM VALUE"),
            |_, cell| render_text_literal(cell),
        );
        Ok(client.execute(statement.as_str(), &[]).await?)
    }

    async fn execute_batch(&self, database: &str, sql: &str) -> DatabaseResult<()> {
        let client = self.client_for(database).await?;
        client.batch_execute(sql).await?;
        Ok(())
    }
}
