pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 設定ディレクトリを上書きする環境変数
pub const HOME_ENV: &str = "CLOUDKIT_HOME";

const SETTINGS_FILE: &str = "settings.yaml";
const DEFAULT_LOG_DIR: &str = "logs";

/// cloudkit の設定ディレクトリを取得（存在しなければ作成）
///
/// 以下の優先順位:
/// 1. 環境変数 CLOUDKIT_HOME
/// 2. ~/.config/cloudkit
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = match std::env::var(HOME_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join("cloudkit"),
    };

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// settings.yaml の内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 結果ファイルの出力先（相対パスは設定ディレクトリ基準）
    pub log_dir: PathBuf,

    /// cloudlist の結果を常にファイルへ保存する
    pub save_output: bool,

    /// cloudlist でデフォルトで列挙するリソース種別
    pub kinds: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            save_output: false,
            kinds: [
                "balance",
                "compute",
                "storage",
                "identity",
                "database",
                "dns",
                "messaging",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Settings {
    /// 設定ディレクトリから settings.yaml を読み込む（無ければデフォルト）
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// ログ出力先を絶対パスで返す
    pub fn resolve_log_dir(&self, config_dir: &Path) -> PathBuf {
        if self.log_dir.is_absolute() {
            self.log_dir.clone()
        } else {
            config_dir.join(&self.log_dir)
        }
    }
}
