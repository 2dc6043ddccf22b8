//! Terminal editor for one database table at a time.
//!
//! A role, database, schema and table are picked through cascading selectors;
//! the table is loaded into an in-memory buffer, edited, and written back by
//! replacing every row.

pub mod app;
pub mod catalog;
pub mod config;
pub mod database;
pub mod editor;
pub mod input;
pub mod logging;
pub mod notice;
pub mod runtime;
pub mod selection;
pub mod session;
pub mod terminal;
pub mod theme;
pub mod ui;
