//! TOML configuration.
//!
//! The config file carries the keybinding table and a list of startup
//! commands. Anything missing falls back to defaults, and a config
//! that fails to parse falls back to defaults with a warning, so the
//! window manager always starts.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cairn_core::input::{Command, KeyBinding, Keybindings};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key bindings
    pub bindings: Vec<BindingConfig>,

    /// Commands launched as detached children at startup
    pub startup: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
            startup: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(Self::find_config_file);

        match config_path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {:?}", path);
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {path:?}"))?;

                let config: Self = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {path:?}"))?;

                Ok(config)
            },
            Some(path) => {
                warn!("Config file not found at {:?}, using defaults", path);
                Ok(Self::default())
            },
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            },
        }
    }

    /// Find the configuration file
    fn find_config_file() -> Option<PathBuf> {
        // Check in order of preference
        let candidates = [
            // XDG config
            dirs::config_dir().map(|p| p.join("cairn/config.toml")),
            // Home directory
            dirs::home_dir().map(|p| p.join(".config/cairn/config.toml")),
            // System-wide
            Some(PathBuf::from("/etc/cairn/config.toml")),
        ];

        candidates.into_iter().flatten().find(|p| p.exists())
    }

    /// Generate default configuration as a string
    pub fn default_config_string() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }

    /// Builds the router table from the configured bindings.
    /// Unparseable entries are skipped with a warning.
    pub fn keybindings(&self) -> Keybindings {
        let mut table = Keybindings::new();
        for binding in &self.bindings {
            let chord = match KeyBinding::parse(&binding.keys) {
                Ok(chord) => chord,
                Err(e) => {
                    warn!("Skipping binding {:?}: {}", binding.keys, e);
                    continue;
                },
            };
            let command = match Command::parse(&binding.command) {
                Ok(command) => command,
                Err(e) => {
                    warn!("Skipping binding {:?}: {}", binding.keys, e);
                    continue;
                },
            };
            table.insert(chord, command);
        }
        table
    }
}

/// One keybinding entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Key combination (e.g., "Alt+F1")
    pub keys: String,
    /// Command to execute
    pub command: String,
}

/// The stock table: quit and cycle-focus on Alt chords.
fn default_bindings() -> Vec<BindingConfig> {
    vec![
        BindingConfig {
            keys: "Alt+Escape".to_string(),
            command: "quit".to_string(),
        },
        BindingConfig {
            keys: "Alt+F1".to_string(),
            command: "cycle-focus".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use cairn_core::input::{Keysym, Modifiers};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bindings.len(), 2);
        assert!(config.startup.is_empty());

        let table = config.keybindings();
        assert_eq!(
            table.resolve(Modifiers::ALT, Keysym::Escape),
            Some(&Command::Quit),
        );
        assert_eq!(
            table.resolve(Modifiers::ALT, Keysym::F1),
            Some(&Command::CycleFocus),
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.bindings.len(), config.bindings.len());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            startup = ["foot"]

            [[bindings]]
            keys = "Super+Return"
            command = "spawn foot"
            "#
        )
        .unwrap();

        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.startup, vec!["foot".to_string()]);
        assert_eq!(
            config.keybindings().resolve(Modifiers::SUPER, Keysym::Return),
            Some(&Command::Spawn("foot".to_string())),
        );
    }

    #[test]
    fn test_load_missing_path_falls_back() {
        let config = Config::load(Some("/nonexistent/cairn.toml")).unwrap();
        assert_eq!(config.bindings.len(), 2);
    }

    #[test]
    fn test_load_malformed_explicit_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "bindings = 5").unwrap();

        // An existing-but-broken file must surface the error to the
        // caller; the binary exits on it instead of running with
        // defaults the user did not ask for.
        let err = Config::load(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_bad_bindings_are_skipped() {
        let config: Config = toml::from_str(
            r#"
            [[bindings]]
            keys = "Alt+NoSuchKey"
            command = "quit"

            [[bindings]]
            keys = "Alt+Q"
            command = "frobnicate"

            [[bindings]]
            keys = "Alt+X"
            command = "quit"
            "#,
        )
        .unwrap();

        let table = config.keybindings();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.resolve(Modifiers::ALT, Keysym::X),
            Some(&Command::Quit),
        );
    }
}
