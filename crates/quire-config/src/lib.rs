use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Editor configuration. Every section falls back to its defaults, so an
/// empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub markup: MarkupConfig,
    pub history: HistoryConfig,
    pub todo: TodoConfig,
    pub classes: ClassConfig,
    pub document: DocumentConfig,
    pub startup: StartupConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Tag loose text is wrapped in: `p` or `div`.
    pub default_tag: String,
    /// Keep loose runs in one block, rendering blank lines as `<br><br>`.
    pub breakline: bool,
    /// Segment loose top-level content into blocks on load.
    pub paragraphize: bool,
    /// Tags the paragraphizer never looks inside.
    pub nonparse: Vec<String>,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            default_tag: "p".to_string(),
            breakline: false,
            paragraphize: true,
            nonparse: vec!["script".into(), "style".into(), "template".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo entries kept; the oldest are evicted first.
    pub limit: usize,
    /// Edits closer together than this merge into one entry. 0 disables.
    pub burst_window_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            burst_window_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoConfig {
    pub template_item: String,
    pub template_item_done: String,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            template_item: "[ ]".to_string(),
            template_item_done: "[x]".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassConfig {
    pub grid: String,
    pub column: String,
    pub noneditable: String,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            grid: "grid".to_string(),
            column: "column".to_string(),
            noneditable: "noneditable".to_string(),
        }
    }
}

/// Global document attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub lang: Option<String>,
    pub dir: Option<String>,
    pub classname: Option<String>,
}

/// Readiness polling while the host surface comes up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            max_attempts: 50,
        }
    }
}

impl EditorConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        // Expand shell variables and tilde in the given path
        let config_path = Self::expand_path(config_path).unwrap_or(config_path.to_path_buf());
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.clone(),
                source,
            }
        })?;

        let config: EditorConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.clone(),
                source,
            })?;
        config.validate()?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/quire");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.markup.default_tag.as_str(), "p" | "div") {
            return Err(ConfigError::Invalid {
                field: "markup.default_tag",
                reason: format!("expected \"p\" or \"div\", got {:?}", self.markup.default_tag),
            });
        }
        if self.history.limit == 0 {
            return Err(ConfigError::Invalid {
                field: "history.limit",
                reason: "must keep at least one entry".to_string(),
            });
        }
        let todo = &self.todo;
        if todo.template_item.trim().is_empty() || todo.template_item_done.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "todo",
                reason: "templates must not be blank".to_string(),
            });
        }
        if todo.template_item == todo.template_item_done {
            return Err(ConfigError::Invalid {
                field: "todo",
                reason: "checked and unchecked templates must differ".to_string(),
            });
        }
        if self.classes.grid.is_empty() || self.classes.column.is_empty() {
            return Err(ConfigError::Invalid {
                field: "classes",
                reason: "layout class names must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = EditorConfig::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/quire/config.toml"));
    }

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.markup.default_tag, "p");
        assert!(config.markup.paragraphize);
        assert!(!config.markup.breakline);
        assert_eq!(config.history.limit, 100);
        assert_eq!(config.history.burst_window_ms, 0);
        assert_eq!(config.todo.template_item, "[ ]");
        assert_eq!(config.todo.template_item_done, "[x]");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EditorConfig = toml::from_str(
            r#"
[history]
limit = 3

[markup]
breakline = true
"#,
        )
        .unwrap();

        assert_eq!(config.history.limit, 3);
        assert_eq!(config.history.burst_window_ms, 0);
        assert!(config.markup.breakline);
        assert_eq!(config.markup.default_tag, "p");
        assert_eq!(config.classes, ClassConfig::default());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut original = EditorConfig::default();
        original.document.lang = Some("en".to_string());
        original.todo.template_item_done = "[X]".to_string();

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: EditorConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[rstest]
    #[case::bad_tag("[markup]\ndefault_tag = \"span\"", "markup.default_tag")]
    #[case::zero_limit("[history]\nlimit = 0", "history.limit")]
    #[case::same_templates(
        "[todo]\ntemplate_item = \"[ ]\"\ntemplate_item_done = \"[ ]\"",
        "todo"
    )]
    #[case::blank_template("[todo]\ntemplate_item = \"  \"", "todo")]
    #[case::empty_grid("[classes]\ngrid = \"\"", "classes")]
    fn test_validate_rejects(#[case] toml_str: &str, #[case] expected_field: &str) {
        let config: EditorConfig = toml::from_str(toml_str).unwrap();
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid {expected_field}, got {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[history]\nlimit = 0\n").unwrap();

        let result = EditorConfig::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[history\nlimit = ").unwrap();

        let result = EditorConfig::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = EditorConfig::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_load_from_path_expands_env_var() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        EditorConfig::default().save_to_path(&config_file).unwrap();

        unsafe {
            env::set_var("QUIRE_TEST_CONFIG_DIR", temp_dir.path());
        }

        let loaded = EditorConfig::load_from_path("$QUIRE_TEST_CONFIG_DIR/config.toml").unwrap();

        assert_eq!(loaded, Some(EditorConfig::default()));

        unsafe {
            env::remove_var("QUIRE_TEST_CONFIG_DIR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = EditorConfig::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/dir/config.toml");
        let mut test_config = EditorConfig::default();
        test_config.history.limit = 25;
        test_config.markup.default_tag = "div".to_string();

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = EditorConfig::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
