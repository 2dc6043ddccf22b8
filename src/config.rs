use crate::catalog::CatalogFilter;
use crate::database::ConnectionConfig;
use crate::editor::writer::{SaveOptions, SaveStrategy, DEFAULT_BATCH_SIZE};
use crate::input::KeyConfig;
use crate::theme::Theme;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "lazyedit";

#[derive(Debug, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub default_connection: Option<String>,
    #[serde(default)]
    pub catalog: CatalogFilter,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub keymap: KeyConfig,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

fn default_theme() -> String {
    String::from("default")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            default_connection: None,
            catalog: CatalogFilter::default(),
            editor: EditorConfig::default(),
            keymap: KeyConfig::default(),
            connections: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    #[serde(default)]
    pub save_strategy: SaveStrategy,
    #[serde(default = "default_batch_size")]
    pub insert_batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_strategy: SaveStrategy::default(),
            insert_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl EditorConfig {
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            strategy: self.save_strategy,
            batch_size: self.insert_batch_size.max(1),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub theme_name: String,
    pub theme: Theme,
    pub default_connection: Option<String>,
    pub catalog: CatalogFilter,
    pub editor: EditorConfig,
    pub keymap: KeyConfig,
    pub connections: Vec<ConnectionConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let file = ConfigFile::default();
        Self {
            theme_name: file.theme,
            theme: Theme::default(),
            default_connection: file.default_connection,
            catalog: file.catalog,
            editor: file.editor,
            keymap: file.keymap,
            connections: file.connections,
        }
    }
}

/// `<config dir>/lazyedit`, falling back to `~/.config/lazyedit`.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    fn load_theme(dir: &Path, theme_name: &str) -> Result<Theme> {
        let theme_path = dir.join("themes").join(format!("{}.toml", theme_name));

        if theme_path.exists() {
            let content =
                std::fs::read_to_string(&theme_path).context("Failed to read theme file")?;
            toml::from_str(&content).context("Failed to parse theme file")
        } else {
            Ok(Theme::default())
        }
    }

    /// Reads `config.toml` from `dir`, writing a default one when it is missing.
    fn load_config(dir: &Path) -> Result<ConfigFile> {
        let config_path = dir.join("config.toml");

        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            std::fs::create_dir_all(dir).context("Failed to create config directory")?;

            let default_config = ConfigFile::default();
            let toml_string = toml::to_string_pretty(&default_config)
                .context("Failed to serialize default config")?;

            std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

            Ok(default_config)
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir())
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let config_file = Self::load_config(dir)?;

        let theme = Self::load_theme(dir, &config_file.theme).unwrap_or_else(|err| {
            crate::logging::warn(&format!("Error loading theme: {}", err));
            Theme::default()
        });

        Ok(Self {
            theme,
            theme_name: config_file.theme,
            default_connection: config_file.default_connection,
            catalog: config_file.catalog,
            editor: config_file.editor,
            keymap: config_file.keymap,
            connections: config_file.connections,
        })
    }

    /// The named connection, else `default_connection`, else the first entry.
    pub fn pick_connection(&self, name: Option<&str>) -> Result<ConnectionConfig> {
        let wanted = name.or(self.default_connection.as_deref());
        match wanted {
            Some(wanted) => self
                .connections
                .iter()
                .find(|c| c.name == wanted)
                .cloned()
                .ok_or_else(|| anyhow!("No connection named '{}' in config.toml", wanted)),
            None => self.connections.first().cloned().ok_or_else(|| {
                anyhow!(
                    "No connections configured. Add a [[connections]] entry to {}",
                    config_dir().join("config.toml").display()
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseType;

    const SAMPLE: &str = r#"
theme = "dark"
default_connection = "warehouse"

[catalog]
hidden_database = "SYSTEM"

[editor]
save_strategy = "transactional"

[[connections]]
name = "local"
db_type = "Sqlite"
default_database = "./data.db"

[[connections]]
name = "warehouse"
db_type = "Postgres"
host = "db.internal"
port = 5432
username = "editor"
"#;

    fn write_sample() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), SAMPLE).unwrap();
        dir
    }

    #[test]
    fn parses_sections_and_fills_defaults() {
        let dir = write_sample();
        let config = Config::load_from(dir.path()).unwrap();

        assert_eq!(config.theme_name, "dark");
        assert_eq!(config.catalog.hidden_database.as_deref(), Some("SYSTEM"));
        assert_eq!(
            config.catalog.hidden_schema.as_deref(),
            Some("INFORMATION_SCHEMA")
        );
        assert_eq!(config.editor.save_strategy, SaveStrategy::Transactional);
        assert_eq!(config.editor.insert_batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.keymap, KeyConfig::default());
        assert_eq!(config.connections[0].db_type, DatabaseType::Sqlite);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();

        assert!(dir.path().join("config.toml").exists());
        assert!(config.connections.is_empty());
        assert_eq!(config.editor.save_strategy, SaveStrategy::TruncateThenInsert);
        assert_eq!(config.catalog, CatalogFilter::default());

        let again = Config::load_from(dir.path()).unwrap();
        assert_eq!(again.theme_name, "default");
    }

    #[test]
    fn connection_is_picked_by_name_then_default_then_first() {
        let dir = write_sample();
        let mut config = Config::load_from(dir.path()).unwrap();

        assert_eq!(config.pick_connection(Some("local")).unwrap().name, "local");
        assert_eq!(config.pick_connection(None).unwrap().name, "warehouse");
        assert!(config.pick_connection(Some("missing")).is_err());

        config.default_connection = None;
        assert_eq!(config.pick_connection(None).unwrap().name, "local");

        config.connections.clear();
        assert!(config.pick_connection(None).is_err());
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let editor = EditorConfig {
            save_strategy: SaveStrategy::TruncateThenInsert,
            insert_batch_size: 0,
        };
        assert_eq!(editor.save_options().batch_size, 1);
    }
}
