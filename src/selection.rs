//! Cascading role → database → schema → table selection.
//!
//! Changing a level clears every level below it and refills only the candidate
//! list directly underneath; lists further down become empty. All catalog
//! caching lives in the session's `CatalogCache`.

use std::fmt;

use crate::database::{DatabaseError, TableRef};
use crate::logging;
use crate::notice::Notices;
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Role,
    Database,
    Schema,
    Table,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Role, Level::Database, Level::Schema, Level::Table];

    pub fn index(self) -> usize {
        match self {
            Level::Role => 0,
            Level::Database => 1,
            Level::Schema => 2,
            Level::Table => 3,
        }
    }

    pub fn below(self) -> Option<Level> {
        Level::ALL.get(self.index() + 1).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Role => "Role",
            Level::Database => "Database",
            Level::Schema => "Schema",
            Level::Table => "Table",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub role: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
}

impl SelectionState {
    pub fn get(&self, level: Level) -> Option<&str> {
        match level {
            Level::Role => self.role.as_deref(),
            Level::Database => self.database.as_deref(),
            Level::Schema => self.schema.as_deref(),
            Level::Table => self.table.as_deref(),
        }
    }

    fn slot_mut(&mut self, level: Level) -> &mut Option<String> {
        match level {
            Level::Role => &mut self.role,
            Level::Database => &mut self.database,
            Level::Schema => &mut self.schema,
            Level::Table => &mut self.table,
        }
    }

    fn clear_from(&mut self, level: Level) {
        for l in Level::ALL.iter().skip(level.index()) {
            *self.slot_mut(*l) = None;
        }
    }

    /// The fully selected table, if every level is set.
    pub fn table_ref(&self) -> Option<TableRef> {
        match (&self.database, &self.schema, &self.table) {
            (Some(d), Some(s), Some(t)) => Some(TableRef::new(d, s, t)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub roles: Vec<String>,
    pub databases: Vec<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<String>,
}

impl Candidates {
    pub fn get(&self, level: Level) -> &[String] {
        match level {
            Level::Role => &self.roles,
            Level::Database => &self.databases,
            Level::Schema => &self.schemas,
            Level::Table => &self.tables,
        }
    }

    fn slot_mut(&mut self, level: Level) -> &mut Vec<String> {
        match level {
            Level::Role => &mut self.roles,
            Level::Database => &mut self.databases,
            Level::Schema => &mut self.schemas,
            Level::Table => &mut self.tables,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionError {
    /// This higher level has no value yet
    UpstreamUnset(Level),
    /// The value is not among the level's current candidates
    NotACandidate { level: Level, value: String },
    /// The session refused the role switch
    RoleSwitch(DatabaseError),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::UpstreamUnset(level) => {
                write!(f, "Select a {} first", level.label().to_lowercase())
            }
            SelectionError::NotACandidate { level, value } => {
                write!(f, "{} is not an available {}", value, level.label().to_lowercase())
            }
            SelectionError::RoleSwitch(e) => write!(f, "Error switching role: {}", e),
        }
    }
}

impl std::error::Error for SelectionError {}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
    candidates: Candidates,
}

impl SelectionController {
    /// Seeds the role with the session's role and loads role and database lists.
    pub async fn initialize(session: &mut SessionContext, notices: &mut Notices) -> Self {
        let mut controller = Self::default();
        controller.state.role = Some(session.current_role().to_string());
        controller.candidates.roles = session.list_roles(notices).await;
        controller.candidates.databases = session.list_databases(notices).await;
        controller
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }

    /// Applies a new value (or clears with `None`) for one level. On error the
    /// state and candidate lists are unchanged.
    pub async fn select(
        &mut self,
        session: &mut SessionContext,
        level: Level,
        value: Option<String>,
        notices: &mut Notices,
    ) -> Result<(), SelectionError> {
        let value = match value {
            Some(value) => value,
            None => {
                self.clear(level);
                return Ok(());
            }
        };

        if let Some(missing) = Level::ALL[..level.index()]
            .iter()
            .find(|l| self.state.get(**l).is_none())
        {
            return Err(SelectionError::UpstreamUnset(*missing));
        }
        if !self.candidates.get(level).iter().any(|c| c == &value) {
            return Err(SelectionError::NotACandidate { level, value });
        }

        if level == Level::Role && session.current_role() != value {
            session
                .switch_role(&value)
                .await
                .map_err(SelectionError::RoleSwitch)?;
            // Role-scoped listings were just invalidated.
            self.candidates.roles = session.list_roles(notices).await;
            notices.success(format!("Switched to role: {}", value));
        }

        logging::debug(&format!("Selected {} {}", level, value));
        self.state.clear_from(level);
        *self.state.slot_mut(level) = Some(value);
        self.refill_below(session, level, notices).await;
        Ok(())
    }

    fn clear(&mut self, level: Level) {
        self.state.clear_from(level);
        for l in Level::ALL.iter().skip(level.index() + 1) {
            self.candidates.slot_mut(*l).clear();
        }
    }

    async fn refill_below(&mut self, session: &mut SessionContext, level: Level, notices: &mut Notices) {
        let Some(next) = level.below() else {
            return;
        };
        for l in Level::ALL.iter().skip(next.index()) {
            self.candidates.slot_mut(*l).clear();
        }

        let listing = match next {
            Level::Role => Vec::new(),
            Level::Database => session.list_databases(notices).await,
            Level::Schema => match self.state.database.clone() {
                Some(database) => session.list_schemas(&database, notices).await,
                None => Vec::new(),
            },
            Level::Table => match (self.state.database.clone(), self.state.schema.clone()) {
                (Some(database), Some(schema)) => {
                    session.list_tables(&database, &schema, notices).await
                }
                _ => Vec::new(),
            },
        };
        *self.candidates.slot_mut(next) = listing;
    }
}
