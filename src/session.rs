//! The one live session of a running instance.
//!
//! `SessionContext` owns the connection handed over by the host, remembers the
//! active role and holds the catalog cache. It is built once at startup and
//! passed by reference to every component that needs the database.

use crate::catalog::{CatalogCache, CatalogFilter};
use crate::database::{DatabaseConnection, DatabaseResult};
use crate::logging;
use crate::notice::Notices;

pub struct SessionContext {
    connection: Box<dyn DatabaseConnection>,
    current_role: String,
    catalog: CatalogCache,
}

impl SessionContext {
    /// Takes ownership of an already connected session and reads its role.
    pub async fn attach(
        connection: Box<dyn DatabaseConnection>,
        filter: CatalogFilter,
    ) -> DatabaseResult<Self> {
        let current_role = connection.current_role().await?;
        logging::info(&format!("Session attached as role {}", current_role));
        Ok(Self {
            connection,
            current_role,
            catalog: CatalogCache::new(filter),
        })
    }

    pub fn current_role(&self) -> &str {
        &self.current_role
    }

    pub fn connection(&self) -> &dyn DatabaseConnection {
        self.connection.as_ref()
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    /// On failure the role and the catalog cache are left exactly as they were.
    pub async fn switch_role(&mut self, role: &str) -> DatabaseResult<()> {
        logging::info(&format!(
            "Switching role from {} to {}",
            self.current_role, role
        ));
        self.connection.use_role(role).await?;
        self.current_role = role.to_string();
        self.catalog.invalidate_all();
        Ok(())
    }

    pub async fn list_roles(&mut self, notices: &mut Notices) -> Vec<String> {
        self.catalog
            .list_roles(self.connection.as_ref(), notices)
            .await
    }

    pub async fn list_databases(&mut self, notices: &mut Notices) -> Vec<String> {
        self.catalog
            .list_databases(self.connection.as_ref(), notices)
            .await
    }

    pub async fn list_schemas(&mut self, database: &str, notices: &mut Notices) -> Vec<String> {
        self.catalog
            .list_schemas(self.connection.as_ref(), database, notices)
            .await
    }

    pub async fn list_tables(
        &mut self,
        database: &str,
        schema: &str,
        notices: &mut Notices,
    ) -> Vec<String> {
        self.catalog
            .list_tables(self.connection.as_ref(), database, schema, notices)
            .await
    }

    pub async fn close(mut self) -> DatabaseResult<()> {
        logging::info("Closing session");
        self.connection.disconnect().await
    }
}
