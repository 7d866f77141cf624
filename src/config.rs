use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use toml::Value;
use log::{debug, info};

use crate::cleaning::DEFAULT_MIN_LAST_COMMIT_YEAR;
use crate::sampling::FilterConfig;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "MSR_SAMPLER_CONFIG";

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Configuration manager
#[derive(Debug, Default)]
pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
    selected_section: Option<String>,
}

impl ConfigManager {
    /// Create a new ConfigManager from a Configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            config_file_path: None,
            selected_section: None,
        }
    }

    /// Load configuration using discovery hierarchy
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        debug!("Loading configuration from file: {}", path.display());

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from: {}", path.display());
        Ok(Self {
            config,
            config_file_path: Some(path),
            selected_section: None,
        })
    }

    /// File the configuration was read from, if any
    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Get value from configuration with section fallback
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        // Priority: selected_section -> specified section -> base
        if let Some(selected) = &self.selected_section {
            if let Some(value) = self.config.get(selected).and_then(|s| s.get(key)) {
                return Some(value);
            }
        }

        if let Some(value) = self.config.get(section).and_then(|s| s.get(key)) {
            return Some(value);
        }

        self.config.get("base").and_then(|s| s.get(key))
    }

    /// Select configuration section for --config-name
    pub fn select_section(&mut self, section: String) {
        debug!("Selecting configuration section: {}", section);
        self.selected_section = Some(section);
    }

    /// Get boolean value with type conversion
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.get_value(section, key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(anyhow::anyhow!("Invalid boolean value for {}.{}: {}", section, key, value)),
            },
            None => Ok(None),
        }
    }

    /// Parse a value with `FromStr`, naming the key on failure
    pub fn get_parsed<T>(&self, section: &str, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_value(section, key) {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|e| anyhow::anyhow!("Invalid value for {}.{}: {} ({})", section, key, value, e)),
            None => Ok(None),
        }
    }

    /// Get log level value with type conversion
    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Get path value with type conversion
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    /// Filter parameters from the `[sampling]` section over the defaults
    pub fn get_filter_config(&self) -> Result<FilterConfig> {
        let mut config = FilterConfig::default();

        if let Some(years) = self.get_parsed::<u32>("sampling", "min-span-years")? {
            config.min_span_years = years;
        }
        if let Some(months) = self.get_parsed::<u32>("sampling", "bucket-months")? {
            config.bucket_months = months;
        }
        if let Some(divisor) = self.get_parsed::<f64>("sampling", "threshold-divisor")? {
            config.threshold_divisor = divisor;
        }
        if let Some(policy) = self.get_parsed("sampling", "partial-bucket")? {
            config.partial_bucket = policy;
        }

        config.validate()
            .context("Sampling configuration validation failed")?;
        Ok(config)
    }

    /// Cutoff date from `[sampling] cutoff`, absolute or relative
    pub fn get_cutoff(&self) -> Result<Option<DateTime<Utc>>> {
        match self.get_value("sampling", "cutoff") {
            Some(value) => crate::cli::date_parser::parse_cutoff(value)
                .map(Some)
                .with_context(|| format!("Invalid cutoff value in config: {}", value)),
            None => Ok(None),
        }
    }

    /// Inactivity threshold from `[cleaning] min-last-commit-year`
    pub fn get_min_last_commit_year(&self) -> Result<i32> {
        Ok(self
            .get_parsed::<i32>("cleaning", "min-last-commit-year")?
            .unwrap_or(DEFAULT_MIN_LAST_COMMIT_YEAR))
    }
}

/// Discover configuration files in order of precedence
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        paths.push(PathBuf::from(env_path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("msr-sampler").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".msr-sampler.toml"));
    }

    paths.push(PathBuf::from("./.msr-sampler.toml"));

    debug!("Config discovery paths: {:?}", paths);
    paths
}

/// Parse TOML content to string-based configuration
fn parse_toml_config(content: &str) -> Result<Configuration> {
    let toml_value: Value = content.parse()
        .context("Failed to parse TOML content")?;

    let mut config = Configuration::new();

    if let Value::Table(table) = toml_value {
        flatten_toml_table(&table, String::new(), &mut config);
    }

    debug!("Parsed configuration: {:?}", config);
    Ok(config)
}

/// Recursively flatten TOML tables into section.subsection format
fn flatten_toml_table(table: &toml::Table, prefix: String, config: &mut Configuration) {
    for (key, value) in table {
        let section_name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Table(subtable) if subtable.values().all(|v| !v.is_table()) => {
                let section_map = subtable
                    .iter()
                    .map(|(subkey, subvalue)| (subkey.clone(), toml_value_to_string(subvalue)))
                    .collect();
                config.insert(section_name, section_map);
            }
            Value::Table(subtable) => flatten_toml_table(subtable, section_name, config),
            _ => {
                // Top-level keys belong to [base]
                config
                    .entry("base".to_string())
                    .or_default()
                    .insert(section_name, toml_value_to_string(value));
            }
        }
    }
}

/// Convert TOML Value to string representation
fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        Value::Array(_) | Value::Table(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::PartialBucketPolicy;
    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    fn manager_from(toml_content: &str) -> ConfigManager {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(&temp_file, toml_content).unwrap();
        ConfigManager::load_from_file(temp_file.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_toml_value_to_string_conversion() {
        assert_eq!(toml_value_to_string(&Value::String("test".to_string())), "test");
        assert_eq!(toml_value_to_string(&Value::Integer(42)), "42");
        assert_eq!(toml_value_to_string(&Value::Float(2.5)), "2.5");
        assert_eq!(toml_value_to_string(&Value::Boolean(false)), "false");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_content = r#"
quiet = true

[base]
log-format = "json"

[sampling]
min-span-years = 15
partial-bucket = "scaled"

[profile.strict]
threshold-divisor = 3.0
"#;

        let config = parse_toml_config(toml_content).unwrap();

        assert_eq!(config["base"]["quiet"], "true");
        assert_eq!(config["base"]["log-format"], "json");
        assert_eq!(config["sampling"]["min-span-years"], "15");
        assert_eq!(config["sampling"]["partial-bucket"], "scaled");
        assert_eq!(config["profile.strict"]["threshold-divisor"], "3");
    }

    #[test]
    fn test_config_manager_value_retrieval() {
        let mut config = Configuration::new();
        config.insert(
            "base".to_string(),
            HashMap::from([
                ("quiet".to_string(), "true".to_string()),
                ("log-format".to_string(), "text".to_string()),
            ]),
        );
        config.insert(
            "sampling".to_string(),
            HashMap::from([("log-format".to_string(), "json".to_string())]),
        );

        let manager = ConfigManager::from_config(config);

        assert_eq!(manager.get_value("sampling", "quiet").unwrap(), "true");
        assert_eq!(manager.get_value("sampling", "log-format").unwrap(), "json");
        assert!(manager.get_value("sampling", "missing").is_none());
    }

    #[test]
    fn test_config_manager_section_selection() {
        let mut manager = manager_from(
            r#"
[sampling]
bucket-months = 6

[quarterly]
bucket-months = 3
"#,
        );
        assert_eq!(manager.get_filter_config().unwrap().bucket_months, 6);

        manager.select_section("quarterly".to_string());
        assert_eq!(manager.get_filter_config().unwrap().bucket_months, 3);
    }

    #[test]
    fn test_config_manager_type_conversion() {
        let manager = manager_from(
            r#"
[base]
debug = true
invalid-bool = "maybe"
log-level = "info"
invalid-level = "loud"
clones = "/data/clones"
"#,
        );

        assert_eq!(manager.get_bool("base", "debug").unwrap(), Some(true));
        assert!(manager.get_bool("base", "invalid-bool").is_err());
        assert!(manager.get_bool("base", "missing").unwrap().is_none());

        assert_eq!(manager.get_log_level("base", "log-level").unwrap(), Some(log::LevelFilter::Info));
        assert!(manager.get_log_level("base", "invalid-level").is_err());

        assert_eq!(manager.get_path("base", "clones").unwrap(), PathBuf::from("/data/clones"));
        assert!(manager.get_path("base", "missing").is_none());
    }

    #[test]
    fn test_config_file_path_recorded() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(&temp_file, "[sampling]\n").unwrap();
        let manager = ConfigManager::load_from_file(temp_file.path().to_path_buf()).unwrap();
        assert_eq!(manager.config_file_path(), Some(temp_file.path()));
        assert!(ConfigManager::default().config_file_path().is_none());
    }

    #[test]
    fn test_filter_config_defaults() {
        let config = ConfigManager::default().get_filter_config().unwrap();
        assert_eq!(config, FilterConfig::default());
        assert_eq!(ConfigManager::default().get_min_last_commit_year().unwrap(), 2015);
        assert!(ConfigManager::default().get_cutoff().unwrap().is_none());
    }

    #[test]
    fn test_filter_config_from_toml() {
        let manager = manager_from(
            r#"
[sampling]
min-span-years = 10
bucket-months = 12
threshold-divisor = 4.5
partial-bucket = "scaled"
cutoff = "2024-01-01"

[cleaning]
min-last-commit-year = 2018
"#,
        );
        let config = manager.get_filter_config().unwrap();

        assert_eq!(config.min_span_years, 10);
        assert_eq!(config.bucket_months, 12);
        assert_eq!(config.threshold_divisor, 4.5);
        assert_eq!(config.partial_bucket, PartialBucketPolicy::Scaled);
        assert_eq!(
            manager.get_cutoff().unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(manager.get_min_last_commit_year().unwrap(), 2018);
    }

    #[test]
    fn test_filter_config_invalid_values() {
        let manager = manager_from("[sampling]\nbucket-months = \"six\"\n");
        let err = manager.get_filter_config().unwrap_err();
        assert!(err.to_string().contains("sampling.bucket-months"));

        let manager = manager_from("[sampling]\nbucket-months = 0\n");
        assert!(manager.get_filter_config().is_err());

        let manager = manager_from("[sampling]\npartial-bucket = \"rounded\"\n");
        assert!(manager.get_filter_config().is_err());

        let manager = manager_from("[sampling]\ncutoff = \"last tuesday\"\n");
        assert!(manager.get_cutoff().is_err());
    }
}
