use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub file_layer: FileLayerConfig,
}

/// Settings for a file-backed store layer.
#[derive(Debug, Clone, Deserialize)]
pub struct FileLayerConfig {
    pub data_dir: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

impl Default for FileLayerConfig {
    fn default() -> Self {
        Self { data_dir: String::new(), file_name: default_file_name() }
    }
}

fn default_file_name() -> String {
    "store.json".to_string()
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.file_layer.normalize_from_env();
        self.file_layer.validate()?;
        Ok(())
    }
}

impl FileLayerConfig {
    /// Fill a missing data dir from the environment.
    pub fn normalize_from_env(&mut self) {
        if self.data_dir.trim().is_empty() {
            if let Ok(dir) = std::env::var("STORE_DATA_DIR") {
                self.data_dir = dir;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(anyhow!(
                "file_layer.data_dir is empty; set it in config.toml or via STORE_DATA_DIR"
            ));
        }
        if self.file_name.trim().is_empty() {
            return Err(anyhow!("file_layer.file_name must not be empty"));
        }
        if self.file_name.contains('/') || self.file_name.contains('\\') {
            return Err(anyhow!("file_layer.file_name must be a bare file name, not a path"));
        }
        Ok(())
    }

    /// Full path of the store file: `data_dir/file_name`.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.file_name)
    }
}
