//! Memoised catalog listings.
//!
//! Each listing is cached under its `CatalogKey` until `invalidate_all` runs.
//! Nothing else expires an entry, so objects created by another session stay
//! invisible until the next role switch.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::database::{DatabaseConnection, DatabaseResult};
use crate::logging;
use crate::notice::Notices;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogKey {
    Roles,
    Databases,
    Schemas { database: String },
    Tables { database: String, schema: String },
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKey::Roles => write!(f, "roles"),
            CatalogKey::Databases => write!(f, "databases"),
            CatalogKey::Schemas { database } => write!(f, "schemas of {}", database),
            CatalogKey::Tables { database, schema } => {
                write!(f, "tables of {}.{}", database, schema)
            }
        }
    }
}

/// Reserved names hidden from the selectors. Matching ignores ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogFilter {
    #[serde(default = "default_hidden_database")]
    pub hidden_database: Option<String>,
    #[serde(default = "default_hidden_schema")]
    pub hidden_schema: Option<String>,
}

fn default_hidden_database() -> Option<String> {
    Some("SNOWFLAKE".to_string())
}

fn default_hidden_schema() -> Option<String> {
    Some("INFORMATION_SCHEMA".to_string())
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            hidden_database: default_hidden_database(),
            hidden_schema: default_hidden_schema(),
        }
    }
}

impl CatalogFilter {
    fn apply(&self, key: &CatalogKey, names: Vec<String>) -> Vec<String> {
        let hidden = match key {
            CatalogKey::Databases => self.hidden_database.as_deref(),
            CatalogKey::Schemas { .. } => self.hidden_schema.as_deref(),
            CatalogKey::Roles | CatalogKey::Tables { .. } => None,
        };
        match hidden {
            Some(hidden) => names
                .into_iter()
                .filter(|name| !name.eq_ignore_ascii_case(hidden))
                .collect(),
            None => names,
        }
    }
}

#[derive(Debug, Default)]
pub struct CatalogCache {
    filter: CatalogFilter,
    entries: HashMap<CatalogKey, Vec<String>>,
}

impl CatalogCache {
    pub fn new(filter: CatalogFilter) -> Self {
        Self {
            filter,
            entries: HashMap::new(),
        }
    }

    pub async fn list_roles(
        &mut self,
        conn: &dyn DatabaseConnection,
        notices: &mut Notices,
    ) -> Vec<String> {
        self.lookup(conn, CatalogKey::Roles, notices).await
    }

    pub async fn list_databases(
        &mut self,
        conn: &dyn DatabaseConnection,
        notices: &mut Notices,
    ) -> Vec<String> {
        self.lookup(conn, CatalogKey::Databases, notices).await
    }

    pub async fn list_schemas(
        &mut self,
        conn: &dyn DatabaseConnection,
        database: &str,
        notices: &mut Notices,
    ) -> Vec<String> {
        let key = CatalogKey::Schemas {
            database: database.to_string(),
        };
        self.lookup(conn, key, notices).await
    }

    pub async fn list_tables(
        &mut self,
        conn: &dyn DatabaseConnection,
        database: &str,
        schema: &str,
        notices: &mut Notices,
    ) -> Vec<String> {
        let key = CatalogKey::Tables {
            database: database.to_string(),
            schema: schema.to_string(),
        };
        self.lookup(conn, key, notices).await
    }

    /// Failures are reported and come back as an empty list. They are not
    /// cached, so the next lookup asks the database again.
    async fn lookup(
        &mut self,
        conn: &dyn DatabaseConnection,
        key: CatalogKey,
        notices: &mut Notices,
    ) -> Vec<String> {
        if let Some(hit) = self.entries.get(&key) {
            return hit.clone();
        }

        match Self::query(conn, &key).await {
            Ok(names) => {
                let names = self.filter.apply(&key, names);
                logging::debug(&format!("Cached {} {}", names.len(), key));
                self.entries.insert(key, names.clone());
                names
            }
            Err(e) => {
                notices.error(format!("Error fetching {}: {}", key, e));
                Vec::new()
            }
        }
    }

    async fn query(conn: &dyn DatabaseConnection, key: &CatalogKey) -> DatabaseResult<Vec<String>> {
        match key {
            CatalogKey::Roles => conn.list_roles().await,
            CatalogKey::Databases => conn.list_databases().await,
            CatalogKey::Schemas { database } => conn.list_schemas(database).await,
            CatalogKey::Tables { database, schema } => conn.list_tables(database, schema).await,
        }
    }

    pub fn is_cached(&self, key: &CatalogKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn invalidate_all(&mut self) {
        logging::debug(&format!(
            "Invalidating {} cached catalog listings",
            self.entries.len()
        ));
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fake::FakeConnection;

    #[tokio::test]
    async fn reserved_database_is_hidden() {
        let conn = FakeConnection::analytics();
        let mut cache = CatalogCache::new(CatalogFilter::default());
        let mut notices = Notices::default();

        let databases = cache.list_databases(&conn, &mut notices).await;
        assert_eq!(databases, vec!["ANALYTICS".to_string()]);
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn information_schema_is_hidden_from_schema_lists() {
        let conn = FakeConnection::analytics();
        let mut cache = CatalogCache::new(CatalogFilter::default());
        let mut notices = Notices::default();

        let schemas = cache.list_schemas(&conn, "ANALYTICS", &mut notices).await;
        assert_eq!(schemas, vec!["PUBLIC".to_string(), "STAGING".to_string()]);
    }

    #[tokio::test]
    async fn hidden_names_match_case_insensitively() {
        let conn = FakeConnection::analytics();
        conn.state()
            .schemas
            .insert("ANALYTICS".to_string(), vec!["information_schema".to_string(), "public".to_string()]);
        let mut cache = CatalogCache::new(CatalogFilter::default());
        let mut notices = Notices::default();

        let schemas = cache.list_schemas(&conn, "ANALYTICS", &mut notices).await;
        assert_eq!(schemas, vec!["public".to_string()]);
    }

    #[tokio::test]
    async fn repeated_lookups_hit_the_cache() {
        let conn = FakeConnection::analytics();
        let mut cache = CatalogCache::new(CatalogFilter::default());
        let mut notices = Notices::default();

        cache.list_tables(&conn, "ANALYTICS", "PUBLIC", &mut notices).await;
        conn.state()
            .tables
            .get_mut(&("ANALYTICS".to_string(), "PUBLIC".to_string()))
            .unwrap()
            .push("CREATED_ELSEWHERE".to_string());
        let tables = cache.list_tables(&conn, "ANALYTICS", "PUBLIC", &mut notices).await;

        assert_eq!(conn.state().calls_to("list_tables"), 1);
        assert!(!tables.contains(&"CREATED_ELSEWHERE".to_string()));

        cache.invalidate_all();
        let tables = cache.list_tables(&conn, "ANALYTICS", "PUBLIC", &mut notices).await;
        assert_eq!(conn.state().calls_to("list_tables"), 2);
        assert!(tables.contains(&"CREATED_ELSEWHERE".to_string()));
    }

    #[tokio::test]
    async fn keys_with_different_parameters_are_cached_separately() {
        let conn = FakeConnection::analytics();
        let mut cache = CatalogCache::new(CatalogFilter::default());
        let mut notices = Notices::default();

        let public = cache.list_tables(&conn, "ANALYTICS", "PUBLIC", &mut notices).await;
        let staging = cache.list_tables(&conn, "ANALYTICS", "STAGING", &mut notices).await;
        assert_ne!(public, staging);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn failures_report_and_return_empty_without_caching() {
        let conn = FakeConnection::analytics();
        conn.state().failing.insert("list_schemas");
        let mut cache = CatalogCache::new(CatalogFilter::default());
        let mut notices = Notices::default();

        let schemas = cache.list_schemas(&conn, "ANALYTICS", &mut notices).await;
        assert!(schemas.is_empty());
        assert_eq!(notices.errors().count(), 1);
        assert!(notices
            .latest()
            .unwrap()
            .message
            .starts_with("Error fetching schemas of ANALYTICS"));
        assert!(!cache.is_cached(&CatalogKey::Schemas {
            database: "ANALYTICS".to_string()
        }));

        conn.state().failing.clear();
        let schemas = cache.list_schemas(&conn, "ANALYTICS", &mut notices).await;
        assert_eq!(schemas.len(), 2);
    }
}
