use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;

use crate::database::core::ConnectionSettings;

pub struct DbwrapperConfig {
    /// Directory holding the named database files
    pub data_dir: String,

    /// SQLite journal mode applied on open (default: WAL)
    pub journal_mode: String,

    /// SQLite synchronous mode applied on open (default: NORMAL)
    pub synchronous: String,

    /// Whether foreign key enforcement is enabled (default: true)
    pub foreign_keys: bool,

    /// How long a connection waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
}

const EMPTY_CONFIG: &str = r#"### dbwrapper configuration file

### directory holding the database files
# data_dir = "~/.dbwrapper"

### connection settings applied when a database is opened
# journal_mode = "WAL"          # DELETE, TRUNCATE, PERSIST, MEMORY, WAL, OFF
# synchronous = "NORMAL"        # OFF, NORMAL, FULL, EXTRA
# foreign_keys = true
# busy_timeout_ms = 5000
"#;

impl Default for DbwrapperConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        let settings = ConnectionSettings::default();

        Self {
            data_dir: format!("{}/.dbwrapper", home_dir),
            journal_mode: settings.journal_mode,
            synchronous: settings.synchronous,
            foreign_keys: settings.foreign_keys,
            busy_timeout_ms: settings.busy_timeout_ms,
        }
    }
}

impl DbwrapperConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<DbwrapperConfig> {
        let mut builder = Config::builder();

        // Add in toml configuration file
        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                // By default use $HOME/.dbwrapper/dbwrapper.toml as the configuration file path
                let dbwrapper_dir = default_dir()?;
                std::fs::create_dir_all(dbwrapper_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create dbwrapper directory: {}", e))?;
                let p = format!("{}/dbwrapper.toml", dbwrapper_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // Add in settings from the environment (with a prefix of DBWRAPPER)
        // E.g., `DBWRAPPER_DATA_DIR=/var/lib/app` would set the data directory
        builder = builder.add_source(config::Environment::with_prefix("DBWRAPPER"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config)
    }

    fn from_map(config: &HashMap<String, String>) -> Result<DbwrapperConfig> {
        let defaults = DbwrapperConfig::default();

        let data_dir = match config.get("data_dir") {
            Some(p) => expand_home(p)?,
            None => defaults.data_dir,
        };

        let foreign_keys = match config.get("foreign_keys") {
            Some(v) => parse_bool(v)
                .ok_or_else(|| anyhow!("Invalid foreign_keys value '{}'", v))?,
            None => defaults.foreign_keys,
        };

        let busy_timeout_ms = match config.get("busy_timeout_ms") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid busy_timeout_ms value '{}': {}", v, e))?,
            None => defaults.busy_timeout_ms,
        };

        let config = DbwrapperConfig {
            data_dir,
            journal_mode: config
                .get("journal_mode")
                .cloned()
                .unwrap_or(defaults.journal_mode),
            synchronous: config
                .get("synchronous")
                .cloned()
                .unwrap_or(defaults.synchronous),
            foreign_keys,
            busy_timeout_ms,
        };
        config.connection_settings().validate()?;
        Ok(config)
    }

    /// Connection pragmas described by this configuration
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            journal_mode: self.journal_mode.clone(),
            synchronous: self.synchronous.clone(),
            foreign_keys: self.foreign_keys,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let lines = [
            format!("Data Directory:     {}", self.data_dir),
            format!("Journal Mode:       {}", self.journal_mode),
            format!("Synchronous:        {}", self.synchronous),
            format!("Foreign Keys:       {}", self.foreign_keys),
            format!("Busy Timeout:       {} ms", self.busy_timeout_ms),
        ];
        lines.join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.dbwrapper/dbwrapper.toml", home_dir)
    }
}

fn default_dir() -> Result<String> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not find home directory"))?
        .to_str()
        .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
        .to_owned();
    Ok(format!("{}/.dbwrapper", home_dir))
}

fn expand_home(path: &str) -> Result<String> {
    match path.strip_prefix("~") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
            let home_str = home
                .to_str()
                .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?;
            Ok(format!("{}{}", home_str, rest))
        }
        _ => Ok(path.to_string()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbwrapper.toml");
        let path_str = path.to_string_lossy().to_string();

        let config = DbwrapperConfig::new(&Some(path_str)).unwrap();
        assert!(path.exists());
        assert_eq!(config.journal_mode, "WAL");
        assert!(config.foreign_keys);
    }

    #[test]
    fn test_file_values_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "data_dir = \"/srv/db\"\njournal_mode = \"DELETE\"\nforeign_keys = false\nbusy_timeout_ms = 250\n",
        )
        .unwrap();

        let config = DbwrapperConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        assert_eq!(config.data_dir, "/srv/db");
        assert_eq!(config.journal_mode, "DELETE");
        assert_eq!(config.synchronous, "NORMAL");
        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, 250);

        let settings = config.connection_settings();
        assert_eq!(settings.busy_timeout_ms, 250);
        assert!(config.summary().contains("/srv/db"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut map = HashMap::new();
        map.insert("journal_mode".to_string(), "SOMETIMES".to_string());
        assert!(DbwrapperConfig::from_map(&map).is_err());

        let mut map = HashMap::new();
        map.insert("foreign_keys".to_string(), "maybe".to_string());
        assert!(DbwrapperConfig::from_map(&map).is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path").unwrap(), "/abs/path");
        assert_eq!(expand_home("~user/x").unwrap(), "~user/x");
        if let Some(home) = dirs::home_dir() {
            let expected = format!("{}/data", home.to_string_lossy());
            assert_eq!(expand_home("~/data").unwrap(), expected);
        }
    }
}
